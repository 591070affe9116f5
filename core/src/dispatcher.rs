//! Dispatcher — executes exactly one request to completion.
//!
//! Dispatch walks a fixed linear sequence with no backtracking:
//!
//! 1. Read the directive from the request context (defaults applied).
//! 2. Minify short-circuit: the reserved group delegates to the minifier and
//!    terminates; the resolver and pattern compiler are never touched.
//! 3. Ensure the target is loadable; dev-mode offers unknown names to the
//!    scaffolder. Absence is not fatal here.
//! 4. Empty handler group routes to the configured not-found resource and
//!    terminates; a configured-but-absent resource is fatal with no further
//!    fallback.
//! 5. Resolve the handler spec; fatal on failure.
//! 6. Instantiate the handler, choose the action (requested, else the
//!    default fallback), compile its route, and extract parameters from the
//!    request path.
//! 7. Invoke the chosen action with the parameters in declaration order.
//! 8. Finalize: render queued views, then flush the buffer — exactly once,
//!    regardless of how invocation ended.
//!
//! Fatal errors abort the remaining states but still proceed through
//! finalization with whatever was buffered. [`Dispatcher::serve`] is the
//! topmost entry point: it catches every dispatch error and silently stops,
//! logging instead of leaking details.

use crate::collab::{Minifier, NullMinifier, NullRenderer, Renderer, Scaffolder, Settings};
use crate::directive::Directive;
use crate::handler::ActionSpec;
use crate::resolver::Resolver;
use crate::rewrite::RewriteLog;
use crate::scope::RequestScope;
use crate::{collab::MapSettings, DispatchError, DEFAULT_ACTION, SETTING_NOT_FOUND};
use std::io::Write;
use tracing::{debug, error, warn};

/// The process-wide request context, constructed by the host: the raw
/// routing directive and the current request path.
#[derive(Debug, Clone)]
pub struct Request {
    directive: String,
    path: String,
}

impl Request {
    /// Build a request context.
    #[must_use]
    pub fn new(directive: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            path: path.into(),
        }
    }

    /// The raw `group|handler|action` directive string.
    #[must_use]
    pub fn directive(&self) -> &str {
        &self.directive
    }

    /// The current request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// What one dispatch did, for diagnostics and tests.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    /// The parsed directive, defaults applied.
    pub directive: Directive,
    /// The minify short-circuit was taken.
    pub short_circuit: bool,
    /// The not-found resource was served instead of a handler.
    pub not_found: bool,
    /// Origin the handler resolved to, when resolution happened.
    pub origin: Option<String>,
    /// The chosen action's rule matched the request path.
    pub matched: bool,
    /// Parameters extracted from the path, in declaration order.
    pub parameters: Vec<String>,
    /// The action that was invoked.
    pub invoked: Option<String>,
    /// The default fallback action was invoked instead of the requested one.
    pub fallback_used: bool,
}

impl DispatchReport {
    fn new(directive: Directive) -> Self {
        Self {
            directive,
            short_circuit: false,
            not_found: false,
            origin: None,
            matched: false,
            parameters: Vec::new(),
            invoked: None,
            fallback_used: false,
        }
    }
}

/// Orchestrates one request end-to-end.
///
/// Built via [`Dispatcher::builder`]; immutable afterwards and shareable
/// across threads.
///
/// # Example
///
/// ```
/// use sendero::prelude::*;
///
/// struct Hello;
///
/// impl Handler for Hello {
///     fn call(
///         &mut self,
///         _action: &str,
///         params: &[String],
///         scope: &mut RequestScope,
///     ) -> Result<(), DispatchError> {
///         scope.write(&format!("hello {}", params[0]));
///         Ok(())
///     }
/// }
///
/// let spec = HandlerSpec::builder("hello")
///     .route("greet", "hello/{string:name}")
///     .unwrap()
///     .build(|| Hello);
/// let resolver = Resolver::builder().library(spec).build();
/// let dispatcher = Dispatcher::builder(resolver).build();
///
/// let mut out = Vec::new();
/// let report = dispatcher
///     .dispatch(&Request::new("site|hello|greet", "hello/world"), &mut out)
///     .unwrap();
/// assert_eq!(out, b"hello world");
/// assert_eq!(report.parameters, vec!["world".to_string()]);
/// ```
pub struct Dispatcher {
    resolver: Resolver,
    settings: Box<dyn Settings>,
    minifier: Box<dyn Minifier>,
    renderer: Box<dyn Renderer>,
    scaffolder: Option<Box<dyn Scaffolder>>,
    rewrite: Option<RewriteLog>,
    dev_mode: bool,
}

impl Dispatcher {
    /// Start building a dispatcher around a resolver.
    #[must_use]
    pub fn builder(resolver: Resolver) -> DispatcherBuilder {
        DispatcherBuilder {
            resolver,
            settings: Box::new(MapSettings::new()),
            minifier: Box::new(NullMinifier),
            renderer: Box::new(NullRenderer),
            scaffolder: None,
            rewrite: None,
            dev_mode: false,
        }
    }

    /// The resolver backing this dispatcher.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Execute one request, writing the finalized output to `sink`.
    ///
    /// Output is flushed exactly once: at the very end, or immediately upon
    /// the minify short-circuit. On a fatal error, whatever was buffered is
    /// flushed before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns the fatal [`DispatchError`] that aborted the request.
    pub fn dispatch(
        &self,
        request: &Request,
        sink: &mut dyn Write,
    ) -> Result<DispatchReport, DispatchError> {
        let directive = Directive::parse(request.directive());
        debug!(directive = %directive, path = request.path(), "dispatching");

        let mut scope = RequestScope::new();
        let mut report = DispatchReport::new(directive.clone());

        // Minify always wins over the remaining states, whatever else the
        // directive carries.
        if directive.is_minify() {
            report.short_circuit = true;
            let outcome = self.minifier.minify(&directive, &mut scope);
            flush(&scope, sink)?;
            outcome?;
            return Ok(report);
        }

        if !self.resolver.probe(directive.handler()) && self.dev_mode {
            if let Some(scaffolder) = &self.scaffolder {
                if let Some(spec) = scaffolder.scaffold(directive.handler()) {
                    self.resolver.register_scaffolded(spec);
                }
            }
        }

        // The emptiness check is on the group identifier only.
        if !directive.has_group() {
            report.not_found = true;
            let outcome = self.serve_not_found(&mut scope);
            flush(&scope, sink)?;
            outcome?;
            return Ok(report);
        }

        let outcome = self.run_handler(&directive, request.path(), &mut scope, &mut report);

        // Finalization runs however invocation ended: render what was
        // queued, then flush the single time.
        let rendered = scope.render_with(self.renderer.as_ref());
        flush(&scope, sink)?;
        outcome?;
        rendered?;
        Ok(report)
    }

    /// Topmost entry point: dispatch and swallow fatal errors.
    ///
    /// Production posture — a failed request logs and emits nothing further.
    pub fn serve(&self, request: &Request, sink: &mut dyn Write) {
        match self.dispatch(request, sink) {
            Ok(report) => {
                debug!(invoked = report.invoked.as_deref(), "request complete");
            }
            Err(e) => {
                error!(error = %e, "dispatch failed");
            }
        }
    }

    fn run_handler(
        &self,
        directive: &Directive,
        path: &str,
        scope: &mut RequestScope,
        report: &mut DispatchReport,
    ) -> Result<(), DispatchError> {
        let spec = self.resolver.resolve(directive.handler())?;
        report.origin = self
            .resolver
            .registration(directive.handler())
            .map(|r| r.origin().to_owned());

        // Choose the action: the requested one, else the conventional
        // fallback. A missing handler was already fatal above — the fallback
        // never applies to that.
        let chosen: &ActionSpec = match spec.action(directive.action()) {
            Some(action) => action,
            None => match spec.action(DEFAULT_ACTION) {
                Some(fallback) => {
                    warn!(
                        handler = directive.handler(),
                        action = directive.action(),
                        "action not declared, falling back to default"
                    );
                    report.fallback_used = true;
                    fallback
                }
                None => {
                    return Err(DispatchError::HandlerMissing {
                        action: directive.action().to_owned(),
                        handler: directive.handler().to_owned(),
                    })
                }
            },
        };

        let rule = chosen.rule();
        if self.dev_mode && !rule.is_empty() {
            if let Some(log) = &self.rewrite {
                // Dev tooling only: a failed append must not fail the request.
                if let Err(e) = log.ensure(path, rule, directive) {
                    warn!(error = %e, "rewrite rule append failed");
                }
            }
        }

        let params = match rule.extract(path) {
            Some(params) => {
                report.matched = true;
                params
            }
            // No match and no route look identical: empty parameters.
            None => Vec::new(),
        };
        report.parameters.clone_from(&params);
        report.invoked = Some(chosen.name().to_owned());

        let mut handler = spec.instantiate();
        handler.call(chosen.name(), &params, scope)
    }

    fn serve_not_found(&self, scope: &mut RequestScope) -> Result<(), DispatchError> {
        let Some(path) = self.settings.get(SETTING_NOT_FOUND) else {
            return Err(DispatchError::ResourceMissing {
                key: SETTING_NOT_FOUND.to_owned(),
                path: String::new(),
            });
        };
        let content =
            std::fs::read_to_string(&path).map_err(|_| DispatchError::ResourceMissing {
                key: SETTING_NOT_FOUND.to_owned(),
                path: path.clone(),
            })?;
        scope.write(&content);
        Ok(())
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("resolver", &self.resolver)
            .field("dev_mode", &self.dev_mode)
            .field("rewrite", &self.rewrite)
            .finish_non_exhaustive()
    }
}

fn flush(scope: &RequestScope, sink: &mut dyn Write) -> Result<(), DispatchError> {
    sink.write_all(scope.body().as_bytes())
        .map_err(|e| DispatchError::Output {
            message: e.to_string(),
        })
}

/// Builder for [`Dispatcher`]. Collaborators default to inert
/// implementations; dev-mode tooling is off unless enabled.
pub struct DispatcherBuilder {
    resolver: Resolver,
    settings: Box<dyn Settings>,
    minifier: Box<dyn Minifier>,
    renderer: Box<dyn Renderer>,
    scaffolder: Option<Box<dyn Scaffolder>>,
    rewrite: Option<RewriteLog>,
    dev_mode: bool,
}

impl DispatcherBuilder {
    /// Use the given settings source.
    #[must_use]
    pub fn settings(mut self, settings: impl Settings + 'static) -> Self {
        self.settings = Box::new(settings);
        self
    }

    /// Use the given minification collaborator.
    #[must_use]
    pub fn minifier(mut self, minifier: impl Minifier + 'static) -> Self {
        self.minifier = Box::new(minifier);
        self
    }

    /// Use the given view renderer.
    #[must_use]
    pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Use the given dev-mode scaffolder.
    #[must_use]
    pub fn scaffolder(mut self, scaffolder: impl Scaffolder + 'static) -> Self {
        self.scaffolder = Some(Box::new(scaffolder));
        self
    }

    /// Persist rewrite rules to the given log (dev-mode only).
    #[must_use]
    pub fn rewrite_log(mut self, log: RewriteLog) -> Self {
        self.rewrite = Some(log);
        self
    }

    /// Enable dev-mode behavior (scaffolding, rewrite-rule persistence).
    #[must_use]
    pub fn dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Freeze the dispatcher.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            resolver: self.resolver,
            settings: self.settings,
            minifier: self.minifier,
            renderer: self.renderer,
            scaffolder: self.scaffolder,
            rewrite: self.rewrite,
            dev_mode: self.dev_mode,
        }
    }
}
