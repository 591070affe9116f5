//! `RequestScope` — the per-request response scope.
//!
//! Owned by one in-flight dispatch. Actions queue view locations, set flat
//! key-value data, and may write directly to the body buffer. Nothing leaves
//! the scope until the dispatcher finalizes: the renderer consumes the
//! queued views and data into the body, and the buffer is flushed exactly
//! once at the very end of the request.

use crate::collab::Renderer;
use crate::DispatchError;
use std::collections::BTreeMap;

/// Buffered response state for one request.
#[derive(Debug, Default)]
pub struct RequestScope {
    views: Vec<String>,
    data: BTreeMap<String, String>,
    headers: Vec<(String, String)>,
    status: Option<u16>,
    body: String,
}

impl RequestScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a view location for rendering at end of request.
    pub fn view(&mut self, location: impl Into<String>) {
        self.views.push(location.into());
    }

    /// Set a data value made available to the renderer.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key.into(), value.into());
    }

    /// Append a response header.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Set an explicit response status.
    pub fn set_status(&mut self, code: u16) {
        self.status = Some(code);
    }

    /// Append text to the body buffer.
    pub fn write(&mut self, text: &str) {
        self.body.push_str(text);
    }

    /// Queued view locations, in queue order.
    #[must_use]
    pub fn views(&self) -> &[String] {
        &self.views
    }

    /// The flat key-value data set.
    #[must_use]
    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    /// Response headers, in append order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The explicit status, if a handler set one. This engine never maps
    /// dispatch failures to a status itself.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// The buffered body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Run the renderer over the queued views and data, appending its output
    /// to the body buffer.
    ///
    /// # Errors
    ///
    /// Propagates the renderer's failure.
    pub fn render_with(&mut self, renderer: &dyn Renderer) -> Result<(), DispatchError> {
        let Self {
            views, data, body, ..
        } = self;
        renderer.render(views, data, body)
    }
}
