//! Config types for route-table-driven resolver construction.
//!
//! These types mirror the runtime registration API but are
//! serde-deserializable, enabling a route table loaded from JSON or YAML at
//! startup:
//!
//! | Config type | Runtime type | Loader |
//! |-------------|--------------|--------|
//! | [`SiteConfig`] | [`Resolver`](crate::Resolver) | [`load_resolver()`] |
//! | [`HandlerConfig`] | [`HandlerSpec`](crate::HandlerSpec) | per handler entry |
//! | [`ActionConfig`] | [`ActionSpec`](crate::ActionSpec) | per action entry |
//!
//! Handler construction stays in code: a [`HandlerCatalog`] maps each
//! configured handler name to its factory, registered once and frozen. The
//! concrete handler type is erased at registration time; the loader only
//! pairs names with factories.

use crate::handler::{Handler, HandlerFactory, HandlerSpec, HandlerSpecBuilder};
use crate::resolver::Resolver;
use crate::TemplateError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A complete route table: every handler the site dispatches to.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Handler entries, each carrying its declared actions.
    pub handlers: Vec<HandlerConfig>,
}

/// One handler entry in the route table.
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    /// Symbolic handler name (may contain the `::` namespacing separator).
    pub name: String,

    /// Which resolver mount the handler registers into.
    #[serde(default)]
    pub mount: MountPoint,

    /// Declared actions, in declaration order.
    pub actions: Vec<ActionConfig>,
}

/// Resolver mount selection for a configured handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountPoint {
    /// The app mount (namespaced names).
    App,
    /// The library mount — the default.
    Library,
    /// The system mount.
    System,
    /// The helpers mount (fixed-name gate applies at resolution).
    Helper,
}

impl Default for MountPoint {
    fn default() -> Self {
        Self::Library
    }
}

/// One action entry: a name and an optional route template.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    /// The action name.
    pub name: String,

    /// Optional route template, e.g. `"blog/{string:slug}"`.
    #[serde(default)]
    pub route: Option<String>,
}

/// Errors from loading a route table.
#[derive(Debug)]
pub enum ConfigError {
    /// A configured handler name has no registered factory.
    UnknownHandler {
        /// The unregistered name.
        name: String,
        /// Names that ARE registered (for self-correcting error messages).
        available: Vec<String>,
    },
    /// A route template failed to parse or compile.
    Template {
        /// The handler the template belongs to.
        handler: String,
        /// The action the template belongs to.
        action: String,
        /// The underlying template error.
        source: TemplateError,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHandler { name, available } => {
                write!(f, "unknown handler \"{name}\"")?;
                if available.is_empty() {
                    write!(f, " — no factories are registered")
                } else {
                    write!(f, " — registered: {}", available.join(", "))
                }
            }
            Self::Template {
                handler,
                action,
                source,
            } => {
                write!(f, "bad route template on {handler}::{action}: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Template { source, .. } => Some(source),
            Self::UnknownHandler { .. } => None,
        }
    }
}

/// Immutable map from handler name to constructor.
///
/// Built via [`HandlerCatalog::builder`]; factories are `Arc`-shared so the
/// same catalog can serve repeated loads.
pub struct HandlerCatalog {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerCatalog {
    /// Start building a catalog.
    #[must_use]
    pub fn builder() -> HandlerCatalogBuilder {
        HandlerCatalogBuilder {
            factories: HashMap::new(),
        }
    }

    /// Returns `true` if a factory is registered for the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered handler names (sorted).
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no factories are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn factory(&self, name: &str) -> Result<HandlerFactory, ConfigError> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownHandler {
                name: name.to_owned(),
                available: self.names().iter().map(|s| (*s).to_owned()).collect(),
            })
    }
}

impl fmt::Debug for HandlerCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerCatalog")
            .field("names", &self.names())
            .finish()
    }
}

/// Builder for [`HandlerCatalog`].
pub struct HandlerCatalogBuilder {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerCatalogBuilder {
    /// Register a handler constructor under a name.
    ///
    /// The concrete type is monomorphized here and erased behind the
    /// factory closure.
    #[must_use]
    pub fn handler<H, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        H: Handler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.factories
            .insert(name.into(), Arc::new(move || Box::new(factory())));
        self
    }

    /// Freeze the catalog. No further registration is possible.
    #[must_use]
    pub fn build(self) -> HandlerCatalog {
        HandlerCatalog {
            factories: self.factories,
        }
    }
}

/// Compile a route table into a frozen [`Resolver`].
///
/// Walks the config, pairs each handler entry with its catalog factory,
/// parses and validates every route template, and registers the resulting
/// specs into the configured mounts.
///
/// # Errors
///
/// - [`ConfigError::UnknownHandler`] — a configured name has no factory
/// - [`ConfigError::Template`] — a route template is malformed
pub fn load_resolver(
    config: SiteConfig,
    catalog: &HandlerCatalog,
) -> Result<Resolver, ConfigError> {
    let mut builder = Resolver::builder();
    for handler in config.handlers {
        let factory = catalog.factory(&handler.name)?;
        let spec = build_spec(&handler, factory)?;
        builder = match handler.mount {
            MountPoint::App => builder.app(spec),
            MountPoint::Library => builder.library(spec),
            MountPoint::System => builder.system(spec),
            MountPoint::Helper => builder.helper(spec),
        };
    }
    Ok(builder.build())
}

fn build_spec(
    handler: &HandlerConfig,
    factory: HandlerFactory,
) -> Result<HandlerSpec, ConfigError> {
    let mut spec: HandlerSpecBuilder = HandlerSpec::builder(&handler.name);
    for action in &handler.actions {
        spec = match &action.route {
            Some(template) => {
                spec.route(&action.name, template)
                    .map_err(|source| ConfigError::Template {
                        handler: handler.name.clone(),
                        action: action.name.clone(),
                        source,
                    })?
            }
            None => spec.action(&action.name),
        };
    }
    Ok(spec.build_with_factory(factory))
}
