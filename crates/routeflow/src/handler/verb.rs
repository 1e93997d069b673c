//! Verb-dispatch handler: HTTP method -> bound function.
//!
//! The dispatch table is an explicit map built at construction time, with
//! an optional fallback entry; no name-based lookup happens at dispatch
//! time. An unmatched verb defers to the next chain unit when there is
//! one, otherwise the route attempt declines.

use super::{BoundFn, RouteHandler};
use crate::chain::Next;
use crate::flow::{Flow, FlowResult};
use crate::request::RequestContext;
use crate::response::ResponseContext;
use http::Method;
use std::collections::HashMap;
use tracing::trace;

/// Dispatches on the request method.
pub struct VerbHandler {
    methods: HashMap<Method, BoundFn>,
    fallback: Option<BoundFn>,
    before: Option<BoundFn>,
    after: Option<BoundFn>,
}

impl Default for VerbHandler {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! verb_method {
    ($name:ident, $upper_case_method:ident) => {
        pub fn $name<F>(self, f: F) -> Self
        where
            F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
        {
            self.method(Method::$upper_case_method, f)
        }
    };
}

impl VerbHandler {
    pub fn new() -> Self {
        Self { methods: HashMap::new(), fallback: None, before: None, after: None }
    }

    /// Binds `f` to `method`.
    pub fn method<F>(mut self, method: Method, f: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
    {
        self.methods.insert(method, Box::new(f));
        self
    }

    verb_method!(get, GET);
    verb_method!(post, POST);
    verb_method!(put, PUT);
    verb_method!(delete, DELETE);
    verb_method!(head, HEAD);
    verb_method!(options, OPTIONS);
    verb_method!(patch, PATCH);
    verb_method!(trace, TRACE);

    /// Declared default entry, used when no verb matches.
    pub fn fallback<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(f));
        self
    }

    pub fn on_before<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    pub fn on_after<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }
}

impl RouteHandler for VerbHandler {
    fn before(&self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        match &self.before {
            Some(hook) => hook(req, res),
            None => Ok(Flow::Complete),
        }
    }

    fn handle(&self, req: &mut RequestContext, res: &mut ResponseContext, next: Next<'_>) -> FlowResult {
        if let Some(bound) = self.methods.get(req.method()).or_else(|| self.fallback.as_ref()) {
            return bound(req, res);
        }
        trace!(method = %req.method(), "no verb entry");
        if next.has_remaining() {
            next.run(req, res)
        } else {
            Ok(Flow::Continue)
        }
    }

    fn after(&self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        match &self.after {
            Some(hook) => hook(req, res),
            None => Ok(Flow::Complete),
        }
    }
}

impl std::fmt::Debug for VerbHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerbHandler")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
