//! sendero - route-pattern compiler and request dispatch engine
//!
//! The core of an MVC-style request pipeline: declarative route expressions
//! compiled into anchored matching rules, symbolic handler resolution with a
//! documented candidate order, and a linear dispatch sequence with guaranteed
//! finalization.
//!
//! # Architecture
//!
//! - [`Directive`] — the `group|handler|action` routing decision, one per
//!   request
//! - [`RouteExpression`] — declarative path template with typed placeholders,
//!   attached to one action
//! - [`CompiledRule`] — anchored matching pattern plus ordered placeholder
//!   list, compiled once per expression
//! - [`Resolver`] — symbolic name to [`HandlerSpec`], first hit wins across
//!   ordered mounts, with an append-only registration ledger
//! - [`Dispatcher`] — executes one request to completion through a fixed
//!   linear sequence; output flushes exactly once
//! - [`RewriteLog`] — dev-mode persistence of compiled rules for external
//!   matching
//!
//! # Key Design Points
//!
//! 1. **Routes are data, not reflection**: each action is declared as a
//!    `{name, route}` record on its handler spec at startup. Nothing is
//!    discovered by inspecting code at request time.
//!
//! 2. **"No route" equals "no match"**: an action without a route carries the
//!    empty rule. Both cases surface as empty parameters, never as errors.
//!
//! 3. **Finalization is scoped, not lifetime-bound**: the dispatcher renders
//!    queued views and flushes the buffer in a guaranteed step at the end of
//!    dispatch, however invocation ended.
//!
//! # Example
//!
//! ```
//! use sendero::prelude::*;
//!
//! struct Blog;
//!
//! impl Handler for Blog {
//!     fn call(
//!         &mut self,
//!         action: &str,
//!         params: &[String],
//!         scope: &mut RequestScope,
//!     ) -> Result<(), DispatchError> {
//!         match action {
//!             "show" => scope.write(&format!("post {}", params[0])),
//!             _ => scope.write("blog index"),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = HandlerSpec::builder("blog")
//!     .route("show", "blog/{string:slug}")?
//!     .action("index")
//!     .build(|| Blog);
//!
//! let resolver = Resolver::builder().library(spec).build();
//! let dispatcher = Dispatcher::builder(resolver).build();
//!
//! let mut out = Vec::new();
//! let report = dispatcher.dispatch(&Request::new("site|blog|show", "blog/my-post"), &mut out)?;
//!
//! assert_eq!(out, b"post my-post");
//! assert_eq!(report.parameters, vec!["my-post".to_string()]);
//! # Ok(())
//! # }
//! ```
//!
//! # Config loading
//!
//! With the `config` feature, a route table deserialized from JSON or YAML
//! compiles into a [`Resolver`] via a frozen
//! [`HandlerCatalog`](crate::HandlerCatalog) of name-to-constructor
//! registrations.

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod collab;
mod directive;
mod dispatcher;
mod handler;
mod resolver;
mod rewrite;
mod route_expr;
mod rule;
mod scope;

#[cfg(feature = "config")]
mod config;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Core types
pub use directive::Directive;
pub use dispatcher::{DispatchReport, Dispatcher, DispatcherBuilder, Request};
pub use handler::{ActionSpec, Handler, HandlerFactory, HandlerSpec, HandlerSpecBuilder};
pub use resolver::{Registration, Resolver, ResolverBuilder};
pub use rewrite::{RewriteLog, RewriteRule};
pub use route_expr::{Bound, ParamKind, Placeholder, RouteExpression, Segment};
pub use rule::CompiledRule;
pub use scope::RequestScope;

// Collaborator seams
pub use collab::{
    MapSettings, Minifier, NullMinifier, NullRenderer, Renderer, Scaffolder, Settings,
};

// Config loading (feature-gated)
#[cfg(feature = "config")]
pub use config::{
    load_resolver, ActionConfig, ConfigError, HandlerCatalog, HandlerCatalogBuilder,
    HandlerConfig, MountPoint, SiteConfig,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use sendero::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CompiledRule,
        Directive,
        DispatchError,
        DispatchReport,
        Dispatcher,
        Handler,
        HandlerSpec,
        MapSettings,
        Minifier,
        Renderer,
        Request,
        RequestScope,
        Resolver,
        RewriteLog,
        RouteExpression,
        Scaffolder,
        Settings,
        TemplateError,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Handler identifier used when the directive's handler segment is empty.
pub const DEFAULT_HANDLER: &str = "default";

/// The conventional fallback action: invoked when the requested action is
/// not declared on the resolved handler.
pub const DEFAULT_ACTION: &str = "index";

/// Reserved handler-group value denoting an asset-minify request.
pub const MINIFY_GROUP: &str = "minify";

/// Namespacing separator in symbolic handler names.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// The fixed set of framework-internal helper names the helpers mount is
/// consulted for.
pub const HELPER_NAMES: &[&str] = &["view", "request", "session", "language", "minify"];

/// Settings key holding the not-found resource path.
pub const SETTING_NOT_FOUND: &str = "error.not_found";

/// Maximum length of a route template.
///
/// Validated at parse time. Templates are authored configuration, but the
/// limit keeps a pathological table from compiling pathological patterns.
pub const MAX_TEMPLATE_LENGTH: usize = 2048;

/// Maximum number of placeholders in a single route template.
pub const MAX_PLACEHOLDERS: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from route-template parsing and rule compilation.
///
/// These are caught at registration time, not dispatch time. Fix the
/// template and rebuild the spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// The template exceeds [`MAX_TEMPLATE_LENGTH`].
    TooLong {
        /// Actual template length.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// The template has more placeholders than [`MAX_PLACEHOLDERS`].
    TooManyPlaceholders {
        /// Actual placeholder count.
        count: usize,
        /// Maximum allowed.
        max: usize,
    },
    /// A segment opens a placeholder it never closes, or mixes literal text
    /// with a placeholder.
    UnclosedBrace {
        /// The offending segment.
        segment: String,
    },
    /// A segment contains more than one placeholder or stray braces.
    MixedSegment {
        /// The offending segment.
        segment: String,
    },
    /// A placeholder has no name.
    EmptyName {
        /// The offending segment.
        segment: String,
    },
    /// A placeholder kind keyword is not `number` or `string`.
    UnknownKind {
        /// The keyword that was found.
        found: String,
    },
    /// A placeholder bound is not a positive count or ascending range.
    BadBound {
        /// The bound text that was found.
        found: String,
    },
    /// The generated pattern failed to compile.
    Pattern {
        /// The pattern that failed.
        pattern: String,
        /// The underlying error message.
        source: String,
    },
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooLong { len, max } => {
                write!(f, "template length is {len}, but maximum allowed is {max}")
            }
            Self::TooManyPlaceholders { count, max } => {
                write!(
                    f,
                    "template has {count} placeholders, but maximum allowed is {max}"
                )
            }
            Self::UnclosedBrace { segment } => {
                write!(
                    f,
                    "segment \"{segment}\" does not close its placeholder \
                     — a segment is either literal text or one {{...}} placeholder"
                )
            }
            Self::MixedSegment { segment } => {
                write!(
                    f,
                    "segment \"{segment}\" mixes placeholders and literal braces"
                )
            }
            Self::EmptyName { segment } => {
                write!(f, "placeholder in \"{segment}\" has no name")
            }
            Self::UnknownKind { found } => {
                write!(
                    f,
                    "unknown placeholder kind \"{found}\" — expected \"number\" or \"string\""
                )
            }
            Self::BadBound { found } => {
                write!(
                    f,
                    "bad placeholder bound \"{found}\" — expected a positive count or \
                     ascending min-max range"
                )
            }
            Self::Pattern { pattern, source } => {
                write!(f, "generated pattern \"{pattern}\" failed to compile: {source}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Fatal per-request dispatch errors.
///
/// All of these abort the remaining dispatch states; finalization still runs
/// and flushes whatever was buffered. The topmost entry point
/// ([`Dispatcher::serve`]) catches them and silently stops. Non-fatal
/// conditions — no match, empty directive segments — are absorbed into
/// defaults and never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// A symbolic handler name could not be resolved.
    Resolution {
        /// The name that failed to resolve.
        name: String,
        /// The conventional candidate path that was attempted.
        attempted: String,
    },
    /// Neither the requested action nor the default fallback is declared on
    /// the resolved handler.
    HandlerMissing {
        /// The requested action.
        action: String,
        /// The handler it was requested on.
        handler: String,
    },
    /// A required static resource is configured but absent.
    ///
    /// Unrecoverable by design: there is no fallback for the fallback.
    ResourceMissing {
        /// The settings key that was consulted.
        key: String,
        /// The configured path, empty when the key itself is unset.
        path: String,
    },
    /// A handler action failed.
    Action {
        /// The underlying failure message.
        message: String,
    },
    /// The output sink rejected the flushed buffer.
    Output {
        /// The underlying failure message.
        message: String,
    },
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resolution { name, attempted } => {
                write!(
                    f,
                    "handler \"{name}\" could not be resolved (attempted \"{attempted}\")"
                )
            }
            Self::HandlerMissing { action, handler } => {
                write!(
                    f,
                    "action \"{action}\" is not declared on handler \"{handler}\" \
                     and no default action exists"
                )
            }
            Self::ResourceMissing { key, path } => {
                if path.is_empty() {
                    write!(f, "resource setting \"{key}\" is not configured")
                } else {
                    write!(f, "resource \"{path}\" (setting \"{key}\") is absent")
                }
            }
            Self::Action { message } => write!(f, "handler action failed: {message}"),
            Self::Output { message } => write!(f, "output flush failed: {message}"),
        }
    }
}

impl std::error::Error for DispatchError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_error_messages_name_the_problem() {
        let err = TemplateError::UnknownKind {
            found: "uuid".into(),
        };
        assert!(err.to_string().contains("uuid"));
        assert!(err.to_string().contains("number"));

        let err = TemplateError::TooLong { len: 5000, max: 2048 };
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn dispatch_error_messages_name_both_sides() {
        let err = DispatchError::HandlerMissing {
            action: "show".into(),
            handler: "blog".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("show"));
        assert!(msg.contains("blog"));
    }

    #[test]
    fn resource_missing_distinguishes_unset_key() {
        let unset = DispatchError::ResourceMissing {
            key: SETTING_NOT_FOUND.into(),
            path: String::new(),
        };
        assert!(unset.to_string().contains("not configured"));

        let absent = DispatchError::ResourceMissing {
            key: SETTING_NOT_FOUND.into(),
            path: "static/404.html".into(),
        };
        assert!(absent.to_string().contains("static/404.html"));
    }

    #[test]
    fn helper_names_is_a_small_fixed_set() {
        assert!(HELPER_NAMES.contains(&"view"));
        assert!(!HELPER_NAMES.contains(&"blog"));
    }
}
