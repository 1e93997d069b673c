//! Route table and the dispatch loop.
//!
//! The router owns an ordered table of `(pattern, target)` entries plus the
//! global middleware that wraps every matched target. Registration happens
//! before serving starts; afterwards the router is read-only and can be
//! shared across threads behind an `Arc`.
//!
//! Dispatch scans the table in registration order. The first structural
//! match binds its parameters and runs the chain; a [`Flow::Continue`]
//! coming back voids the attempt and the scan moves on, anything else ends
//! the dispatch. An exhausted table reports `false` and the caller owns the
//! not-found response.

use crate::chain::{unit_fn, ChainUnit, MiddlewareChain, Next};
use crate::config::Config;
use crate::error::RouteError;
use crate::flow::{BoxError, Flow, FlowResult};
use crate::handler::{HandlerUnit, RouteHandler};
use crate::matcher::PathMatcher;
use crate::request::RequestContext;
use crate::response::ResponseContext;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

type HandlerFactory = Box<dyn Fn() -> Arc<dyn RouteHandler> + Send + Sync>;

/// What a route entry runs when its pattern matches.
///
/// Resolution to executable chain units is lazy: it happens per dispatch,
/// so registration cost does not depend on chain complexity.
#[derive(Clone)]
pub enum Target {
    /// A closure (or any chain unit) invoked directly.
    Unit(Arc<dyn ChainUnit>),
    /// An already-instantiated handler.
    Handler(Arc<dyn RouteHandler>),
    /// A name resolved through the router's handler registry at dispatch
    /// time.
    Named(String),
    /// An ordered sub-chain: each sub-target's `next` is the following
    /// one, and running off the final sub-target declines the route back
    /// to the dispatch loop.
    List(Vec<Target>),
}

impl Target {
    /// Wraps a closure as a target.
    pub fn closure<F>(f: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext, Next<'_>) -> FlowResult + Send + Sync + 'static,
    {
        Target::Unit(Arc::new(unit_fn(f)))
    }

    /// Wraps a handler instance as a target.
    pub fn handler<H: RouteHandler + 'static>(handler: H) -> Self {
        Target::Handler(Arc::new(handler))
    }

    /// References a handler registered by name.
    pub fn named(name: impl Into<String>) -> Self {
        Target::Named(name.into())
    }

    /// Chains several targets under one pattern.
    pub fn list(targets: impl IntoIterator<Item = Target>) -> Self {
        Target::List(targets.into_iter().collect())
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Unit(_) => f.write_str("Target::Unit"),
            Target::Handler(_) => f.write_str("Target::Handler"),
            Target::Named(name) => write!(f, "Target::Named({name})"),
            Target::List(targets) => f.debug_tuple("Target::List").field(targets).finish(),
        }
    }
}

struct RouteEntry {
    pattern: String,
    /// `None` for an empty-string pattern: a placeholder entry that never
    /// matches.
    matcher: Option<PathMatcher>,
    target: Target,
}

/// The request-dispatch engine.
pub struct Router {
    table: Vec<RouteEntry>,
    middleware: Vec<Arc<dyn ChainUnit>>,
    factories: HashMap<String, HandlerFactory>,
    config: Arc<Config>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_config(Config::new())
    }

    pub fn with_config(config: Config) -> Self {
        Self { table: Vec::new(), middleware: Vec::new(), factories: HashMap::new(), config: Arc::new(config) }
    }

    /// The process-wide configuration, read-only during dispatch.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// A shareable handle to the configuration, for closures and handlers
    /// built at registration time.
    pub fn config_handle(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Appends an entry to the route table.
    ///
    /// Insertion order is match order. Uniqueness is not enforced: a
    /// duplicate pattern coexists with the earlier entry and is only
    /// reached when the earlier one declines. An empty pattern registers a
    /// never-matching placeholder.
    ///
    /// # Errors
    ///
    /// Fails fast with [`RouteError::InvalidPattern`] when the pattern
    /// does not compile; nothing is appended in that case.
    pub fn register(&mut self, pattern: impl Into<String>, target: impl Into<Target>) -> Result<&mut Self, RouteError> {
        let pattern = pattern.into();
        let matcher = if pattern.is_empty() { None } else { Some(PathMatcher::compile(&pattern)?) };
        self.table.push(RouteEntry { pattern, matcher, target: target.into() });
        Ok(self)
    }

    /// Appends a global middleware unit; it wraps every matched target in
    /// registration order.
    pub fn middleware<U: ChainUnit + 'static>(&mut self, unit: U) -> &mut Self {
        self.middleware.push(Arc::new(unit));
        self
    }

    /// Registers a factory under `name` for [`Target::Named`] resolution.
    ///
    /// The explicit map replacing lookup-by-qualified-type-name: a named
    /// target is instantiated through its factory lazily, per dispatch.
    pub fn register_handler<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Arc<dyn RouteHandler> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Resolves `(method, path)` to a handler chain and runs it.
    ///
    /// Returns `Ok(true)` when some target completed or halted, `Ok(false)`
    /// when the table was exhausted (the caller produces the 404), and
    /// `Err` with the original fault when handler logic failed — the engine
    /// never swallows handler errors.
    pub fn dispatch(&self, req: &mut RequestContext, res: &mut ResponseContext) -> Result<bool, BoxError> {
        let path = req.path().to_owned();
        trace!(method = %req.method(), %path, "dispatch start");

        for entry in &self.table {
            let Some(matcher) = &entry.matcher else { continue };
            let Some(params) = matcher.matches(&path) else { continue };

            trace!(pattern = %entry.pattern, "route matched");
            req.bind_params(params);

            let (units, tail) = self.resolve(&entry.target)?;
            let mut chain = MiddlewareChain::with_tail(tail);
            chain.extend(self.middleware.iter().cloned());
            chain.extend(units);

            match chain.execute(req, res)? {
                Flow::Continue => {
                    debug!(pattern = %entry.pattern, "route declined, falling through");
                    req.clear_params();
                }
                flow => {
                    trace!(pattern = %entry.pattern, ?flow, "dispatch finished");
                    return Ok(true);
                }
            }
        }

        debug!(%path, "no route matched");
        Ok(false)
    }

    /// Turns a target into executable units plus the tail flow of its
    /// chain.
    fn resolve(&self, target: &Target) -> Result<(Vec<Arc<dyn ChainUnit>>, Flow), RouteError> {
        match target {
            Target::Unit(unit) => Ok((vec![unit.clone()], Flow::Complete)),
            Target::Handler(handler) => Ok((vec![handler_unit(handler.clone())], Flow::Complete)),
            Target::Named(name) => {
                let factory =
                    self.factories.get(name).ok_or_else(|| RouteError::UnknownHandler(name.clone()))?;
                Ok((vec![handler_unit(factory())], Flow::Complete))
            }
            Target::List(targets) => {
                let mut units = Vec::with_capacity(targets.len());
                for sub in targets {
                    let (resolved, _) = self.resolve(sub)?;
                    units.extend(resolved);
                }
                // exhausting a sub-target list declines the route
                Ok((units, Flow::Continue))
            }
        }
    }
}

fn handler_unit(handler: Arc<dyn RouteHandler>) -> Arc<dyn ChainUnit> {
    Arc::new(HandlerUnit::new(handler))
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table.iter().map(|entry| entry.pattern.as_str()).collect::<Vec<_>>())
            .field("middleware", &self.middleware.len())
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl From<Vec<Target>> for Target {
    fn from(targets: Vec<Target>) -> Self {
        Target::List(targets)
    }
}
