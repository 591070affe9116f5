//! Handlers — the resolved units containing invocable actions.
//!
//! Routing metadata is attached to actions as data records rather than
//! discovered by inspecting code at request time: each action is declared as
//! `{name, route expression}` on a [`HandlerSpec`] built once at startup.
//! The concrete handler type is erased at registration time behind a factory
//! closure, so the resolver and dispatcher work with uniform specs.

use crate::route_expr::RouteExpression;
use crate::rule::CompiledRule;
use crate::scope::RequestScope;
use crate::{DispatchError, TemplateError};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// An invocable handler instance.
///
/// One instance is constructed per dispatched request and dropped when the
/// request ends. The dispatcher only invokes actions it has verified against
/// the handler's [`ActionSpec`] table, so implementations may treat unknown
/// action names as unreachable.
///
/// # Example
///
/// ```
/// use sendero::{DispatchError, Handler, RequestScope};
///
/// struct Blog;
///
/// impl Handler for Blog {
///     fn call(
///         &mut self,
///         action: &str,
///         params: &[String],
///         scope: &mut RequestScope,
///     ) -> Result<(), DispatchError> {
///         match action {
///             "show" => scope.write(&format!("showing {}", params[0])),
///             _ => scope.write("blog index"),
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Handler: Send {
    /// Invoke the named action with positional parameters.
    ///
    /// # Errors
    ///
    /// An error aborts the remaining dispatch states; finalization still
    /// runs and flushes whatever the action buffered.
    fn call(
        &mut self,
        action: &str,
        params: &[String],
        scope: &mut RequestScope,
    ) -> Result<(), DispatchError>;
}

// Blanket implementation for boxed handlers
impl Handler for Box<dyn Handler> {
    fn call(
        &mut self,
        action: &str,
        params: &[String],
        scope: &mut RequestScope,
    ) -> Result<(), DispatchError> {
        (**self).call(action, params, scope)
    }
}

/// Type-erased handler constructor.
///
/// `Arc` rather than `Box` so a catalog can hand the same factory to several
/// specs (config-driven loading constructs specs repeatedly).
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>;

/// One action declared on a handler: a name plus an optional route
/// expression.
///
/// The matching rule is compiled from the expression on first use and cached
/// for the life of the spec. An action without a route carries the empty
/// rule, which matches nothing — "no route" and "no match" look identical to
/// callers.
#[derive(Debug)]
pub struct ActionSpec {
    name: String,
    route: Option<RouteExpression>,
    rule: OnceLock<CompiledRule>,
}

impl ActionSpec {
    /// Declare an action with no route expression.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route: None,
            rule: OnceLock::new(),
        }
    }

    /// Declare an action with a route expression.
    #[must_use]
    pub fn with_route(name: impl Into<String>, route: RouteExpression) -> Self {
        Self {
            name: name.into(),
            route: Some(route),
            rule: OnceLock::new(),
        }
    }

    /// The action name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared route expression, if any.
    #[must_use]
    pub fn route(&self) -> Option<&RouteExpression> {
        self.route.as_ref()
    }

    /// The compiled matching rule, built on first access.
    ///
    /// Actions without a route yield the empty rule. Expressions are
    /// validated at declaration time, so compilation here cannot fail; the
    /// unreachable failure arm degrades to the empty rule rather than
    /// panicking.
    pub fn rule(&self) -> &CompiledRule {
        self.rule.get_or_init(|| match &self.route {
            Some(expr) => {
                CompiledRule::compile(expr).unwrap_or_else(|_| CompiledRule::empty())
            }
            None => CompiledRule::empty(),
        })
    }
}

/// A registered handler: symbolic name, declared actions, and the factory
/// that constructs instances.
///
/// Built via [`HandlerSpec::builder`]; immutable afterwards.
pub struct HandlerSpec {
    name: String,
    actions: Vec<ActionSpec>,
    factory: HandlerFactory,
}

impl HandlerSpec {
    /// Start building a spec for the given symbolic name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> HandlerSpecBuilder {
        HandlerSpecBuilder {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    /// The symbolic handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared actions, in declaration order.
    #[must_use]
    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    /// Look up a declared action by name.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Construct a fresh handler instance.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn Handler> {
        (self.factory)()
    }
}

impl fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("name", &self.name)
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HandlerSpec`].
///
/// Route expressions are parsed (and thereby validated) as they are added,
/// so a spec that builds successfully can never fail rule compilation later.
#[derive(Debug)]
pub struct HandlerSpecBuilder {
    name: String,
    actions: Vec<ActionSpec>,
}

impl HandlerSpecBuilder {
    /// Declare an action with no route expression.
    #[must_use]
    pub fn action(mut self, name: impl Into<String>) -> Self {
        self.actions.push(ActionSpec::new(name));
        self
    }

    /// Declare an action with a route template.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] if the template is malformed.
    pub fn route(
        mut self,
        name: impl Into<String>,
        template: &str,
    ) -> Result<Self, TemplateError> {
        let expr = RouteExpression::parse(template)?;
        // Surface pattern problems at build time, not at first dispatch.
        CompiledRule::compile(&expr)?;
        self.actions.push(ActionSpec::with_route(name, expr));
        Ok(self)
    }

    /// Declare a pre-built action spec.
    #[must_use]
    pub fn action_spec(mut self, spec: ActionSpec) -> Self {
        self.actions.push(spec);
        self
    }

    /// Freeze the spec with the given handler constructor.
    ///
    /// The concrete handler type is erased here, at registration time.
    #[must_use]
    pub fn build<H, F>(self, factory: F) -> HandlerSpec
    where
        H: Handler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        HandlerSpec {
            name: self.name,
            actions: self.actions,
            factory: Arc::new(move || Box::new(factory())),
        }
    }

    /// Freeze the spec with an already-erased factory.
    #[must_use]
    pub fn build_with_factory(self, factory: HandlerFactory) -> HandlerSpec {
        HandlerSpec {
            name: self.name,
            actions: self.actions,
            factory,
        }
    }
}
