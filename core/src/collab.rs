//! Collaborator seams — the external concerns the dispatcher calls into.
//!
//! The engine treats rendering, minification, settings lookup, and dev-mode
//! scaffolding as collaborators behind small object-safe traits. All
//! implementations must be `Send + Sync` so a dispatcher can be shared
//! across threads.

use crate::directive::Directive;
use crate::handler::HandlerSpec;
use crate::scope::RequestScope;
use crate::DispatchError;
use std::collections::{BTreeMap, HashMap};

/// Asset-minification collaborator.
///
/// Invoked with the full directive triple when the handler group is the
/// reserved minify value. The minifier writes response headers and body into
/// the scope itself; the dispatcher only manages buffer flushing around it.
pub trait Minifier: Send + Sync {
    /// Serve a minified asset for the given directive.
    ///
    /// # Errors
    ///
    /// A failure aborts the request; whatever was buffered is still flushed.
    fn minify(&self, directive: &Directive, scope: &mut RequestScope)
        -> Result<(), DispatchError>;
}

impl Minifier for Box<dyn Minifier> {
    fn minify(
        &self,
        directive: &Directive,
        scope: &mut RequestScope,
    ) -> Result<(), DispatchError> {
        (**self).minify(directive, scope)
    }
}

/// View-rendering collaborator, run at the end of a handler's lifetime.
///
/// Consumes the queued view locations and the flat data set, appending
/// rendered output to the body. The dispatcher guarantees output is not
/// flushed before this has had a chance to run.
pub trait Renderer: Send + Sync {
    /// Render the queued views into the body buffer.
    ///
    /// # Errors
    ///
    /// A failure aborts the request; whatever was buffered is still flushed.
    fn render(
        &self,
        views: &[String],
        data: &BTreeMap<String, String>,
        body: &mut String,
    ) -> Result<(), DispatchError>;
}

impl Renderer for Box<dyn Renderer> {
    fn render(
        &self,
        views: &[String],
        data: &BTreeMap<String, String>,
        body: &mut String,
    ) -> Result<(), DispatchError> {
        (**self).render(views, data, body)
    }
}

/// Configuration lookup collaborator (`get(key)` semantics).
pub trait Settings: Send + Sync {
    /// Look up a configuration value.
    fn get(&self, key: &str) -> Option<String>;
}

impl Settings for Box<dyn Settings> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Dev-mode scaffolding collaborator.
///
/// Consulted when a dispatched handler name is unknown; may produce a spec
/// to register on the fly. Production deployments simply do not configure
/// one.
pub trait Scaffolder: Send + Sync {
    /// Produce a spec for the unknown handler name, if this scaffolder can.
    fn scaffold(&self, handler: &str) -> Option<HandlerSpec>;
}

/// In-memory [`Settings`] backed by a map.
///
/// # Example
///
/// ```
/// use sendero::{MapSettings, Settings};
///
/// let settings = MapSettings::new().with("error.not_found", "static/404.html");
/// assert_eq!(settings.get("error.not_found").as_deref(), Some("static/404.html"));
/// assert_eq!(settings.get("missing"), None);
/// ```
#[derive(Debug, Default, Clone)]
pub struct MapSettings {
    entries: HashMap<String, String>,
}

impl MapSettings {
    /// Create an empty settings map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl Settings for MapSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// A renderer that renders nothing. The default when no view layer is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(
        &self,
        _views: &[String],
        _data: &BTreeMap<String, String>,
        _body: &mut String,
    ) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// A minifier that serves nothing. The default when no asset pipeline is
/// wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMinifier;

impl Minifier for NullMinifier {
    fn minify(
        &self,
        _directive: &Directive,
        _scope: &mut RequestScope,
    ) -> Result<(), DispatchError> {
        Ok(())
    }
}
