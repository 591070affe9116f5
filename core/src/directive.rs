//! `Directive` — the three-part routing decision carried per request.
//!
//! A directive is derived from a single pipe-delimited string in the request
//! context (`group|handler|action`). All three fields are always present after
//! parsing: missing or empty segments fall back to the fixed default triple
//! (empty group, [`DEFAULT_HANDLER`], [`DEFAULT_ACTION`]).
//!
//! Constructed once per request, read-only afterward.

use crate::{DEFAULT_ACTION, DEFAULT_HANDLER, MINIFY_GROUP};
use std::fmt;

/// The (group, handler, action) triple that drives one dispatch.
///
/// # Example
///
/// ```
/// use sendero::Directive;
///
/// let d = Directive::parse("site|blog|show");
/// assert_eq!(d.group(), "site");
/// assert_eq!(d.handler(), "blog");
/// assert_eq!(d.action(), "show");
///
/// // Empty segments take the fixed defaults; an empty group stays empty.
/// let d = Directive::parse("||");
/// assert_eq!((d.group(), d.handler(), d.action()), ("", "default", "index"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    group: String,
    handler: String,
    action: String,
}

impl Directive {
    /// Parse a raw `group|handler|action` string.
    ///
    /// Empty or missing segments default per field: the group stays empty
    /// (emptiness is meaningful — it denotes "no route determined"), the
    /// handler defaults to [`DEFAULT_HANDLER`], the action to
    /// [`DEFAULT_ACTION`]. Segments beyond the third are ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split('|');
        let group = parts.next().unwrap_or("");
        let handler = parts.next().unwrap_or("");
        let action = parts.next().unwrap_or("");

        Self::new(group, handler, action)
    }

    /// Build a directive from explicit segments, applying the same per-field
    /// defaults as [`parse`](Self::parse).
    #[must_use]
    pub fn new(group: &str, handler: &str, action: &str) -> Self {
        Self {
            group: group.to_owned(),
            handler: if handler.is_empty() {
                DEFAULT_HANDLER.to_owned()
            } else {
                handler.to_owned()
            },
            action: if action.is_empty() {
                DEFAULT_ACTION.to_owned()
            } else {
                action.to_owned()
            },
        }
    }

    /// The handler-group identifier. Empty means no route was determined.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The handler identifier.
    #[must_use]
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// The action identifier.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns `true` if this directive denotes an asset-minify request.
    #[must_use]
    pub fn is_minify(&self) -> bool {
        self.group == MINIFY_GROUP
    }

    /// Returns `true` if a handler group was determined for this request.
    ///
    /// The check is on the group identifier only — handler and action may be
    /// non-empty while the group is not.
    #[must_use]
    pub fn has_group(&self) -> bool {
        !self.group.is_empty()
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.group, self.handler, self.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_triple() {
        let d = Directive::parse("site|blog|show");
        assert_eq!(d.group(), "site");
        assert_eq!(d.handler(), "blog");
        assert_eq!(d.action(), "show");
    }

    #[test]
    fn fully_empty_takes_default_triple() {
        let d = Directive::parse("||");
        assert_eq!(d.group(), "");
        assert_eq!(d.handler(), "default");
        assert_eq!(d.action(), "index");
    }

    #[test]
    fn bare_string_takes_default_triple() {
        let d = Directive::parse("");
        assert_eq!(d.group(), "");
        assert_eq!(d.handler(), "default");
        assert_eq!(d.action(), "index");
    }

    #[test]
    fn empty_group_keeps_other_segments() {
        let d = Directive::parse("|blog|show");
        assert_eq!(d.group(), "");
        assert_eq!(d.handler(), "blog");
        assert_eq!(d.action(), "show");
        assert!(!d.has_group());
    }

    #[test]
    fn missing_action_defaults() {
        let d = Directive::parse("site|blog");
        assert_eq!(d.action(), "index");
    }

    #[test]
    fn minify_group_is_detected() {
        assert!(Directive::parse("minify|css|all").is_minify());
        assert!(!Directive::parse("site|css|all").is_minify());
    }

    #[test]
    fn extra_segments_are_ignored() {
        let d = Directive::parse("a|b|c|d|e");
        assert_eq!((d.group(), d.handler(), d.action()), ("a", "b", "c"));
    }

    #[test]
    fn display_round_trips() {
        let d = Directive::parse("site|blog|show");
        assert_eq!(d.to_string(), "site|blog|show");
        assert_eq!(Directive::parse(&d.to_string()), d);
    }

    #[test]
    fn display_shows_applied_defaults() {
        assert_eq!(Directive::parse("||").to_string(), "|default|index");
    }
}
