//! Route expressions — declarative path templates with typed placeholders.
//!
//! A route expression is the text attached to a single action, e.g.
//! `user/{number(1-11):id}/profile`. It is slash-delimited; each segment is
//! either literal text or exactly one placeholder:
//!
//! - `{number(1-11):id}` — typed placeholder with a repetition bound
//! - `{string:slug}` — typed placeholder, unbounded
//! - `{slug}` — untyped shorthand, equivalent to `{string:slug}`
//!
//! Placeholder names need not be unique; their left-to-right order defines
//! the binding order of extracted values.
//!
//! # Naming: expression vs rule
//!
//! - [`RouteExpression`] = declarative intent (what the author wrote)
//! - [`CompiledRule`](crate::CompiledRule) = runtime engine (what matches
//!   paths at dispatch time)
//!
//! Parsing validates the template eagerly so that rule compilation later on
//! cannot fail; all malformed templates are rejected here with a
//! [`TemplateError`].

use crate::{TemplateError, MAX_PLACEHOLDERS, MAX_TEMPLATE_LENGTH};
use std::fmt;

/// The kind of value a placeholder binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// One or more decimal digits.
    Number,
    /// One or more characters excluding the path separator.
    String,
}

impl ParamKind {
    fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    /// The template keyword for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
        }
    }
}

/// A repetition bound on a placeholder: how many characters (digits, for
/// numeric placeholders) the value may span.
///
/// Written `(min-max)` or `(n)` for an exact count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    /// Minimum repetition count (at least 1).
    pub min: u32,
    /// Maximum repetition count (at least `min`).
    pub max: u32,
}

impl Bound {
    fn parse(text: &str) -> Option<Self> {
        let (min, max) = match text.split_once('-') {
            Some((lo, hi)) => (lo.parse().ok()?, hi.parse().ok()?),
            None => {
                let n = text.parse().ok()?;
                (n, n)
            }
        };
        if min == 0 || max < min {
            return None;
        }
        Some(Self { min, max })
    }
}

/// One placeholder descriptor from a route expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The placeholder name. Used for diagnostics only — binding is
    /// positional, in declaration order.
    pub name: String,
    /// What the placeholder accepts.
    pub kind: ParamKind,
    /// Optional repetition bound, enforced by the compiled rule.
    pub bound: Option<Bound>,
}

/// One parsed segment of a route expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal path text, matched verbatim.
    Literal(String),
    /// A placeholder capturing one path segment.
    Placeholder(Placeholder),
}

/// A parsed, validated route expression.
///
/// # Example
///
/// ```
/// use sendero::{ParamKind, RouteExpression};
///
/// let expr = RouteExpression::parse("user/{number(1-11):id}/profile").unwrap();
/// assert_eq!(expr.placeholder_count(), 1);
///
/// let ph = expr.placeholders().next().unwrap();
/// assert_eq!(ph.name, "id");
/// assert_eq!(ph.kind, ParamKind::Number);
/// ```
#[derive(Debug, Clone)]
pub struct RouteExpression {
    template: String,
    segments: Vec<Segment>,
}

impl RouteExpression {
    /// Parse and validate a path template.
    ///
    /// A single leading `/` is tolerated and stripped; trailing separators
    /// are significant.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] describing the first malformed construct.
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if template.len() > MAX_TEMPLATE_LENGTH {
            return Err(TemplateError::TooLong {
                len: template.len(),
                max: MAX_TEMPLATE_LENGTH,
            });
        }

        let trimmed = template.strip_prefix('/').unwrap_or(template);
        let mut segments = Vec::new();
        let mut placeholders = 0usize;

        for raw in trimmed.split('/') {
            let segment = Self::parse_segment(raw)?;
            if matches!(segment, Segment::Placeholder(_)) {
                placeholders += 1;
                if placeholders > MAX_PLACEHOLDERS {
                    return Err(TemplateError::TooManyPlaceholders {
                        count: placeholders,
                        max: MAX_PLACEHOLDERS,
                    });
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            template: trimmed.to_owned(),
            segments,
        })
    }

    fn parse_segment(raw: &str) -> Result<Segment, TemplateError> {
        if !raw.contains(['{', '}']) {
            return Ok(Segment::Literal(raw.to_owned()));
        }

        // A segment containing a brace must be exactly one placeholder.
        let inner = raw
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'))
            .ok_or_else(|| TemplateError::UnclosedBrace {
                segment: raw.to_owned(),
            })?;
        if inner.contains(['{', '}']) {
            return Err(TemplateError::MixedSegment {
                segment: raw.to_owned(),
            });
        }

        let placeholder = match inner.split_once(':') {
            None => {
                // Untyped shorthand `{name}`.
                if inner.is_empty() {
                    return Err(TemplateError::EmptyName {
                        segment: raw.to_owned(),
                    });
                }
                Placeholder {
                    name: inner.to_owned(),
                    kind: ParamKind::String,
                    bound: None,
                }
            }
            Some((spec, name)) => {
                if name.is_empty() {
                    return Err(TemplateError::EmptyName {
                        segment: raw.to_owned(),
                    });
                }
                let (keyword, bound) = match spec.split_once('(') {
                    None => (spec, None),
                    Some((keyword, rest)) => {
                        let text = rest.strip_suffix(')').ok_or_else(|| {
                            TemplateError::BadBound {
                                found: rest.to_owned(),
                            }
                        })?;
                        let bound =
                            Bound::parse(text).ok_or_else(|| TemplateError::BadBound {
                                found: text.to_owned(),
                            })?;
                        (keyword, Some(bound))
                    }
                };
                let kind = ParamKind::parse(keyword).ok_or_else(|| {
                    TemplateError::UnknownKind {
                        found: keyword.to_owned(),
                    }
                })?;
                Placeholder {
                    name: name.to_owned(),
                    kind,
                    bound,
                }
            }
        };

        Ok(Segment::Placeholder(placeholder))
    }

    /// The normalized template text (leading separator stripped).
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The parsed segments, in path order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The placeholders in declaration order.
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(p) => Some(p),
            Segment::Literal(_) => None,
        })
    }

    /// Number of placeholders in the template.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders().count()
    }

    /// Returns `true` if the template contains no placeholders.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.placeholder_count() == 0
    }
}

impl fmt::Display for RouteExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
