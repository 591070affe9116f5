//! Persisted rewrite rules — the dev-mode route registry.
//!
//! When enabled, the dispatcher records one externally matchable rule per
//! distinct request path, so a front proxy can install the same routing
//! decision without consulting the engine. The persisted pattern is taken
//! verbatim from [`CompiledRule::pattern`], which keeps cached and live
//! matching equivalent by construction.
//!
//! File format, one rule per line, tab-delimited:
//!
//! ```text
//! blog/my-post<TAB>^blog/([^/]+)$<TAB>site|blog|show
//! ```
//!
//! Appends are idempotent (keyed by the literal path) and written as a whole
//! line in a single call on an append-mode file, so concurrent first-time
//! compilations of the same path cannot interleave partial lines.

use crate::directive::Directive;
use crate::rule::CompiledRule;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One parsed line from the rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    /// The literal request path the rule is keyed by.
    pub path: String,
    /// The anchored matching pattern.
    pub pattern: String,
    /// The directive triple to install when the pattern matches.
    pub directive: String,
}

/// Append-only rule file keyed by literal request path.
#[derive(Debug, Clone)]
pub struct RewriteLog {
    path: PathBuf,
}

impl RewriteLog {
    /// Use the rule file at the given location. The file is created on the
    /// first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the rule file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a rule for this literal request path is already
    /// persisted. A missing file means no rules.
    ///
    /// # Errors
    ///
    /// Propagates read failures other than the file being absent.
    pub fn contains(&self, request_path: &str) -> io::Result<bool> {
        let key = normalize(request_path);
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        Ok(content
            .lines()
            .filter_map(|line| line.split('\t').next())
            .any(|path| path == key))
    }

    /// Persist a rule for the literal request path unless one exists.
    ///
    /// Returns `true` if a line was appended. The empty rule has nothing to
    /// persist and is skipped.
    ///
    /// # Errors
    ///
    /// Propagates filesystem failures.
    pub fn ensure(
        &self,
        request_path: &str,
        rule: &CompiledRule,
        directive: &Directive,
    ) -> io::Result<bool> {
        let Some(pattern) = rule.pattern() else {
            return Ok(false);
        };
        if self.contains(request_path)? {
            return Ok(false);
        }

        let key = normalize(request_path);
        let line = format!("{key}\t{pattern}\t{directive}\n");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // Whole line in one write: append mode keeps concurrent writers from
        // interleaving within a line.
        file.write_all(line.as_bytes())?;
        debug!(path = key, pattern, "persisted rewrite rule");
        Ok(true)
    }

    /// Parse all persisted rules. Malformed lines are skipped.
    ///
    /// # Errors
    ///
    /// Propagates read failures other than the file being absent.
    pub fn entries(&self) -> io::Result<Vec<RewriteRule>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(content
            .lines()
            .filter_map(|line| {
                let mut fields = line.splitn(3, '\t');
                Some(RewriteRule {
                    path: fields.next()?.to_owned(),
                    pattern: fields.next()?.to_owned(),
                    directive: fields.next()?.to_owned(),
                })
            })
            .collect())
    }
}

fn normalize(request_path: &str) -> &str {
    request_path.strip_prefix('/').unwrap_or(request_path)
}
