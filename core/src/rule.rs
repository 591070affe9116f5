//! Compiled rules — anchored matching patterns with ordered extraction.
//!
//! A [`CompiledRule`] is derived from a [`RouteExpression`] exactly once and
//! is safe to cache indefinitely, since expressions are immutable after
//! declaration. Compilation is deterministic and side-effect free: compiling
//! the same expression twice yields pattern-equivalent rules.
//!
//! The **empty rule** represents "no route declared". It matches nothing, so
//! callers observe the same outcome ("no parameters") for an action without a
//! route and for a path that fails to match a declared route.

use crate::route_expr::{ParamKind, Placeholder, RouteExpression, Segment};
use crate::TemplateError;
use regex::Regex;

/// An anchored matching pattern plus the placeholder list in declaration
/// order.
///
/// # Example
///
/// ```
/// use sendero::{CompiledRule, RouteExpression};
///
/// let expr = RouteExpression::parse("user/{number(1-11):id}/profile").unwrap();
/// let rule = CompiledRule::compile(&expr).unwrap();
///
/// assert_eq!(rule.extract("user/42/profile"), Some(vec!["42".to_string()]));
/// assert_eq!(rule.extract("user/42/settings"), None);
/// ```
#[derive(Debug, Clone)]
pub struct CompiledRule {
    inner: Option<Inner>,
}

#[derive(Debug, Clone)]
struct Inner {
    regex: Regex,
    pattern: String,
    placeholders: Vec<Placeholder>,
}

impl CompiledRule {
    /// Compile a route expression into an anchored matching rule.
    ///
    /// Placeholder mapping: `number` → one or more decimal digits, `string`
    /// and the untyped shorthand → one or more non-separator characters. A
    /// repetition bound becomes a `{min,max}` quantifier on the class, so
    /// bounds are enforced by matching. Literal segments are escaped and
    /// matched verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Pattern`] if the generated pattern fails to
    /// compile. Expressions that came out of
    /// [`RouteExpression::parse`](crate::RouteExpression::parse) always
    /// produce valid patterns.
    pub fn compile(expr: &RouteExpression) -> Result<Self, TemplateError> {
        let mut pattern = String::from("^");
        for (i, segment) in expr.segments().iter().enumerate() {
            if i > 0 {
                pattern.push('/');
            }
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Placeholder(ph) => {
                    let class = match ph.kind {
                        ParamKind::Number => "[0-9]",
                        ParamKind::String => "[^/]",
                    };
                    match ph.bound {
                        Some(bound) => {
                            pattern.push_str(&format!(
                                "({class}{{{},{}}})",
                                bound.min, bound.max
                            ));
                        }
                        None => pattern.push_str(&format!("({class}+)")),
                    }
                }
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| TemplateError::Pattern {
            pattern: pattern.clone(),
            source: e.to_string(),
        })?;

        Ok(Self {
            inner: Some(Inner {
                regex,
                pattern,
                placeholders: expr.placeholders().cloned().collect(),
            }),
        })
    }

    /// The empty rule: "no route declared". Matches nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self { inner: None }
    }

    /// Returns `true` if this is the empty ("no route") rule.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    /// The anchored pattern text, or `None` for the empty rule.
    ///
    /// This is the exact text the rewrite-rule generator persists, so cached
    /// and live matching cannot diverge.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.inner.as_ref().map(|i| i.pattern.as_str())
    }

    /// The placeholders in declaration order (empty for the empty rule).
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        self.inner.as_ref().map_or(&[], |i| &i.placeholders)
    }

    /// Match a request path and extract positional parameters.
    ///
    /// A single leading `/` on the path is stripped before matching. Returns
    /// `None` when the path does not match — or when this is the empty rule;
    /// the two cases are deliberately indistinguishable. On a match, the
    /// returned vector's length equals the placeholder count.
    #[must_use]
    pub fn extract(&self, path: &str) -> Option<Vec<String>> {
        let inner = self.inner.as_ref()?;
        let path = path.strip_prefix('/').unwrap_or(path);
        let captures = inner.regex.captures(path)?;
        Some(
            (1..captures.len())
                .map(|i| captures.get(i).map_or("", |m| m.as_str()).to_owned())
                .collect(),
        )
    }

    /// Returns `true` if the path matches this rule.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.extract(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(template: &str) -> CompiledRule {
        let expr = RouteExpression::parse(template).unwrap();
        CompiledRule::compile(&expr).unwrap()
    }

    #[test]
    fn bounded_number_extracts_value() {
        let r = rule("user/{number(1-11):id}/profile");
        assert_eq!(r.extract("user/42/profile"), Some(vec!["42".to_string()]));
    }

    #[test]
    fn string_placeholder_extracts_segment() {
        let r = rule("blog/{string:slug}");
        assert_eq!(r.extract("blog/my-post"), Some(vec!["my-post".to_string()]));
        assert_eq!(r.extract("blog/"), None);
    }

    #[test]
    fn missing_literal_segment_never_matches() {
        let r = rule("user/{number:id}/profile");
        assert_eq!(r.extract("user/42"), None);
        assert_eq!(r.extract("user/42/settings"), None);
        assert_eq!(r.extract("account/42/profile"), None);
    }

    #[test]
    fn number_rejects_non_digits() {
        let r = rule("user/{number:id}");
        assert_eq!(r.extract("user/42"), Some(vec!["42".to_string()]));
        assert_eq!(r.extract("user/abc"), None);
        assert_eq!(r.extract("user/4x2"), None);
    }

    #[test]
    fn bound_is_enforced_by_matching() {
        let r = rule("user/{number(1-11):id}/profile");
        assert!(r.matches(&format!("user/{}/profile", "9".repeat(11))));
        assert!(!r.matches(&format!("user/{}/profile", "9".repeat(12))));

        let r = rule("year/{number(4):y}");
        assert!(r.matches("year/2026"));
        assert!(!r.matches("year/26"));
        assert!(!r.matches("year/20260"));
    }

    #[test]
    fn string_placeholder_stops_at_separator() {
        let r = rule("blog/{slug}");
        assert_eq!(r.extract("blog/a/b"), None);
    }

    #[test]
    fn parameters_bind_in_declaration_order() {
        let r = rule("{string:section}/{number:id}/{string:tab}");
        assert_eq!(
            r.extract("user/42/profile"),
            Some(vec![
                "user".to_string(),
                "42".to_string(),
                "profile".to_string()
            ])
        );
        assert_eq!(r.placeholders().len(), 3);
    }

    #[test]
    fn extraction_length_equals_placeholder_count() {
        let r = rule("a/{x}/b/{y}/c/{z}");
        let params = r.extract("a/1/b/2/c/3").unwrap();
        assert_eq!(params.len(), r.placeholders().len());
    }

    #[test]
    fn anchoring_rejects_prefix_and_suffix_garbage() {
        let r = rule("blog/{slug}");
        assert_eq!(r.extract("blog/my-post/extra"), None);
        assert_eq!(r.extract("prefix/blog/my-post"), None);
    }

    #[test]
    fn literal_metacharacters_match_verbatim() {
        let r = rule("api+v1.0/{name}");
        assert_eq!(r.extract("api+v1.0/x"), Some(vec!["x".to_string()]));
        assert_eq!(r.extract("apiXv100/x"), None);
    }

    #[test]
    fn leading_slash_on_path_is_stripped() {
        let r = rule("blog/{slug}");
        assert_eq!(r.extract("/blog/my-post"), Some(vec!["my-post".to_string()]));
    }

    #[test]
    fn static_template_extracts_empty_vec() {
        let r = rule("about/contact");
        assert_eq!(r.extract("about/contact"), Some(vec![]));
        assert_eq!(r.extract("about"), None);
    }

    #[test]
    fn compilation_is_idempotent() {
        let expr = RouteExpression::parse("user/{number(1-11):id}/profile").unwrap();
        let a = CompiledRule::compile(&expr).unwrap();
        let b = CompiledRule::compile(&expr).unwrap();
        assert_eq!(a.pattern(), b.pattern());
        assert_eq!(a.placeholders(), b.placeholders());
    }

    #[test]
    fn empty_rule_matches_nothing() {
        let r = CompiledRule::empty();
        assert!(r.is_empty());
        assert_eq!(r.pattern(), None);
        assert_eq!(r.extract(""), None);
        assert_eq!(r.extract("anything"), None);
        assert!(r.placeholders().is_empty());
    }

    #[test]
    fn pattern_text_is_fully_anchored() {
        let r = rule("user/{number(1-11):id}/profile");
        let pattern = r.pattern().unwrap();
        assert!(pattern.starts_with('^'));
        assert!(pattern.ends_with('$'));
        assert_eq!(pattern, "^user/([0-9]{1,11})/profile$");
    }
}
