//! Handler resolution — symbolic name to registered spec, first hit wins.
//!
//! The resolver replaces convention-based file loading with an explicit
//! registry: handler specs are registered into ordered mounts at startup and
//! looked up by symbolic name at dispatch time. The documented candidate
//! order is fixed:
//!
//! 1. A name containing the `::` namespacing separator resolves against the
//!    **app** mount only.
//! 2. Plain names try the **library** mount, then dev-scaffolded entries,
//!    then the **system** mount.
//! 3. Otherwise, names in the fixed [`HELPER_NAMES`](crate::HELPER_NAMES)
//!    set resolve against the **helpers** mount.
//!
//! Every successful resolution records a [`Registration`] exactly once per
//! name — an append-only, process-lifetime ledger for diagnostics. Failure
//! is fatal for the request and reports the conventional candidate path; no
//! further locations are scanned.

use crate::handler::HandlerSpec;
use crate::{DispatchError, HELPER_NAMES, NAMESPACE_SEPARATOR};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// A resolution record: name, resolved origin, and a monotonic discovery
/// sequence number. Never mutated, never removed within a process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    name: String,
    origin: String,
    sequence: u64,
}

impl Registration {
    /// The symbolic name that was resolved.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The conventional origin path the name resolved to.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Monotonic discovery sequence (lower = discovered earlier).
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Immutable registry of handler specs with an append-only resolution
/// ledger.
///
/// Constructed via [`Resolver::builder`]; the only post-build mutation is
/// dev-mode scaffold registration, which is additive.
pub struct Resolver {
    app: HashMap<String, Arc<HandlerSpec>>,
    library: HashMap<String, Arc<HandlerSpec>>,
    system: HashMap<String, Arc<HandlerSpec>>,
    helpers: HashMap<String, Arc<HandlerSpec>>,
    scaffolded: Mutex<HashMap<String, Arc<HandlerSpec>>>,
    ledger: Mutex<HashMap<String, Registration>>,
    sequence: AtomicU64,
}

impl Resolver {
    /// Start building a resolver.
    #[must_use]
    pub fn builder() -> ResolverBuilder {
        ResolverBuilder::default()
    }

    /// Resolve a symbolic name, recording the registration on first hit.
    ///
    /// Resolution is idempotent: a name already in the ledger is served from
    /// the same mounts without recording a second entry.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Resolution`] with the conventional candidate
    /// path when no mount holds the name.
    pub fn resolve(&self, name: &str) -> Result<Arc<HandlerSpec>, DispatchError> {
        match self.lookup(name) {
            Some((spec, origin)) => {
                self.record(name, &origin);
                debug!(handler = name, origin = %origin, "resolved handler");
                Ok(spec)
            }
            None => Err(DispatchError::Resolution {
                name: name.to_owned(),
                attempted: Self::primary_candidate(name),
            }),
        }
    }

    /// Returns `true` if the name would resolve. Records nothing.
    #[must_use]
    pub fn probe(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Register a dev-scaffolded spec. Additive only; resolved after the
    /// static library mount so startup registrations keep precedence.
    pub fn register_scaffolded(&self, spec: HandlerSpec) {
        let name = spec.name().to_owned();
        debug!(handler = %name, "registering scaffolded handler");
        self.scaffolded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(name, Arc::new(spec));
    }

    /// The registration for a name, if it has been resolved.
    #[must_use]
    pub fn registration(&self, name: &str) -> Option<Registration> {
        self.ledger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Snapshot of all registrations, ordered by discovery sequence.
    #[must_use]
    pub fn registrations(&self) -> Vec<Registration> {
        let mut all: Vec<Registration> = self
            .ledger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by_key(Registration::sequence);
        all
    }

    fn lookup(&self, name: &str) -> Option<(Arc<HandlerSpec>, String)> {
        if name.contains(NAMESPACE_SEPARATOR) {
            let origin = format!("app/{}", name.replace(NAMESPACE_SEPARATOR, "/"));
            return self.app.get(name).map(|s| (Arc::clone(s), origin));
        }

        if let Some(spec) = self.library.get(name) {
            return Some((Arc::clone(spec), format!("library/{name}")));
        }
        if let Some(spec) = self
            .scaffolded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(name)
        {
            return Some((Arc::clone(spec), format!("site/{name}")));
        }
        if let Some(spec) = self.system.get(name) {
            return Some((Arc::clone(spec), format!("system/{name}")));
        }
        if HELPER_NAMES.contains(&name) {
            if let Some(spec) = self.helpers.get(name) {
                return Some((Arc::clone(spec), format!("system/helpers/{name}")));
            }
        }
        None
    }

    fn primary_candidate(name: &str) -> String {
        if name.contains(NAMESPACE_SEPARATOR) {
            format!("app/{}", name.replace(NAMESPACE_SEPARATOR, "/"))
        } else {
            format!("library/{name}")
        }
    }

    fn record(&self, name: &str, origin: &str) {
        let mut ledger = self
            .ledger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if !ledger.contains_key(name) {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            ledger.insert(
                name.to_owned(),
                Registration {
                    name: name.to_owned(),
                    origin: origin.to_owned(),
                    sequence,
                },
            );
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("app", &self.app.len())
            .field("library", &self.library.len())
            .field("system", &self.system.len())
            .field("helpers", &self.helpers.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Resolver`]. Register specs into mounts, then freeze.
#[derive(Default)]
pub struct ResolverBuilder {
    app: HashMap<String, Arc<HandlerSpec>>,
    library: HashMap<String, Arc<HandlerSpec>>,
    system: HashMap<String, Arc<HandlerSpec>>,
    helpers: HashMap<String, Arc<HandlerSpec>>,
}

impl ResolverBuilder {
    /// Register a spec into the app mount (namespaced names).
    #[must_use]
    pub fn app(mut self, spec: HandlerSpec) -> Self {
        self.app.insert(spec.name().to_owned(), Arc::new(spec));
        self
    }

    /// Register a spec into the library mount.
    #[must_use]
    pub fn library(mut self, spec: HandlerSpec) -> Self {
        self.library.insert(spec.name().to_owned(), Arc::new(spec));
        self
    }

    /// Register a spec into the system mount.
    #[must_use]
    pub fn system(mut self, spec: HandlerSpec) -> Self {
        self.system.insert(spec.name().to_owned(), Arc::new(spec));
        self
    }

    /// Register a spec into the helpers mount.
    ///
    /// The mount accepts any name, but resolution consults it only for names
    /// in the fixed [`HELPER_NAMES`](crate::HELPER_NAMES) set.
    #[must_use]
    pub fn helper(mut self, spec: HandlerSpec) -> Self {
        self.helpers.insert(spec.name().to_owned(), Arc::new(spec));
        self
    }

    /// Freeze the resolver.
    #[must_use]
    pub fn build(self) -> Resolver {
        Resolver {
            app: self.app,
            library: self.library,
            system: self.system,
            helpers: self.helpers,
            scaffolded: Mutex::new(HashMap::new()),
            ledger: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::scope::RequestScope;

    struct Noop;

    impl Handler for Noop {
        fn call(
            &mut self,
            _action: &str,
            _params: &[String],
            _scope: &mut RequestScope,
        ) -> Result<(), DispatchError> {
            Ok(())
        }
    }

    fn spec(name: &str) -> HandlerSpec {
        HandlerSpec::builder(name).action("index").build(|| Noop)
    }

    #[test]
    fn library_resolves_plain_names() {
        let resolver = Resolver::builder().library(spec("blog")).build();
        let resolved = resolver.resolve("blog").unwrap();
        assert_eq!(resolved.name(), "blog");
        assert_eq!(
            resolver.registration("blog").unwrap().origin(),
            "library/blog"
        );
    }

    #[test]
    fn library_shadows_system() {
        let resolver = Resolver::builder()
            .library(spec("blog"))
            .system(spec("blog"))
            .build();
        resolver.resolve("blog").unwrap();
        assert_eq!(
            resolver.registration("blog").unwrap().origin(),
            "library/blog"
        );
    }

    #[test]
    fn namespaced_names_consult_app_only() {
        let resolver = Resolver::builder()
            .app(spec("admin::users"))
            .library(spec("plain"))
            .build();

        let resolved = resolver.resolve("admin::users").unwrap();
        assert_eq!(resolved.name(), "admin::users");
        assert_eq!(
            resolver.registration("admin::users").unwrap().origin(),
            "app/admin/users"
        );

        // A namespaced name registered only in the library mount is not
        // found: step one never falls through.
        let resolver = Resolver::builder().library(spec("admin::users")).build();
        let err = resolver.resolve("admin::users").unwrap_err();
        match err {
            DispatchError::Resolution { name, attempted } => {
                assert_eq!(name, "admin::users");
                assert_eq!(attempted, "app/admin/users");
            }
            other => panic!("expected Resolution, got {other:?}"),
        }
    }

    #[test]
    fn helpers_resolve_only_fixed_names() {
        let resolver = Resolver::builder()
            .helper(spec("view"))
            .helper(spec("notahelper"))
            .build();

        assert!(resolver.probe("view"));
        assert!(!resolver.probe("notahelper"));
        assert_eq!(
            resolver.resolve("view").map(|s| s.name().to_owned()).ok(),
            Some("view".to_owned())
        );
        assert_eq!(
            resolver.registration("view").unwrap().origin(),
            "system/helpers/view"
        );
    }

    #[test]
    fn unknown_name_reports_primary_candidate() {
        let resolver = Resolver::builder().build();
        let err = resolver.resolve("ghost").unwrap_err();
        match err {
            DispatchError::Resolution { name, attempted } => {
                assert_eq!(name, "ghost");
                assert_eq!(attempted, "library/ghost");
            }
            other => panic!("expected Resolution, got {other:?}"),
        }
    }

    #[test]
    fn repeated_resolution_records_once() {
        let resolver = Resolver::builder().library(spec("blog")).build();
        resolver.resolve("blog").unwrap();
        resolver.resolve("blog").unwrap();
        resolver.resolve("blog").unwrap();
        assert_eq!(resolver.registrations().len(), 1);
    }

    #[test]
    fn sequences_increase_across_names() {
        let resolver = Resolver::builder()
            .library(spec("alpha"))
            .library(spec("beta"))
            .build();
        resolver.resolve("alpha").unwrap();
        resolver.resolve("beta").unwrap();

        let all = resolver.registrations();
        assert_eq!(all.len(), 2);
        assert!(all[0].sequence() < all[1].sequence());
        assert_eq!(all[0].name(), "alpha");
    }

    #[test]
    fn probe_does_not_record() {
        let resolver = Resolver::builder().library(spec("blog")).build();
        assert!(resolver.probe("blog"));
        assert!(!resolver.probe("ghost"));
        assert!(resolver.registrations().is_empty());
    }

    #[test]
    fn scaffolded_specs_resolve_after_library() {
        let resolver = Resolver::builder().build();
        assert!(!resolver.probe("fresh"));

        resolver.register_scaffolded(spec("fresh"));
        assert!(resolver.probe("fresh"));
        resolver.resolve("fresh").unwrap();
        assert_eq!(
            resolver.registration("fresh").unwrap().origin(),
            "site/fresh"
        );
    }

    #[test]
    fn resolver_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Resolver>();
    }
}
