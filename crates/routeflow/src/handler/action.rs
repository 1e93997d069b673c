//! Action-dispatch handler: `action` route parameter -> bound function.
//!
//! The matched route supplies an `action` parameter (e.g. from a pattern
//! like `/admin/:action`); the handler looks it up in an explicit action
//! map built at construction time. A missing or unknown action defers to
//! the next chain unit, or declines the route when the chain is exhausted.

use super::{BoundFn, RouteHandler};
use crate::chain::Next;
use crate::flow::{Flow, FlowResult};
use crate::request::RequestContext;
use crate::response::ResponseContext;
use std::collections::HashMap;
use tracing::trace;

/// Name of the route parameter consulted for dispatch.
pub const ACTION_PARAM: &str = "action";

/// Dispatches on the matched `action` route parameter.
pub struct ActionHandler {
    actions: HashMap<String, BoundFn>,
    fallback: Option<BoundFn>,
    before: Option<BoundFn>,
    after: Option<BoundFn>,
}

impl Default for ActionHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionHandler {
    pub fn new() -> Self {
        Self { actions: HashMap::new(), fallback: None, before: None, after: None }
    }

    /// Binds `f` to the action named `name`.
    pub fn action<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync + 'static,
    {
        self.actions.insert(name.into(), Box::new(f));
        self
    }

    /// Declared default entry, used when the action is missing or unknown.
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

impl RouteHandler for ActionHandler {
    fn before(&self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        match &self.before {
            Some(hook) => hook(req, res),
            None => Ok(Flow::Complete),
        }
    }

    fn handle(&self, req: &mut RequestContext, res: &mut ResponseContext, next: Next<'_>) -> FlowResult {
        let bound = req
            .param(ACTION_PARAM)
            .and_then(|action| self.actions.get(action))
            .or_else(|| self.fallback.as_ref());

        if let Some(bound) = bound {
            return bound(req, res);
        }
        trace!(action = req.param(ACTION_PARAM), "no action entry");
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

impl std::fmt::Debug for ActionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionHandler")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::ActionHandler;
    use crate::chain::Next;
    use crate::flow::Flow;
    use crate::handler::RouteHandler;
    use crate::matcher::PathMatcher;
    use crate::request::RequestContext;
    use crate::response::ResponseContext;

    fn request_for(path: &str) -> RequestContext {
        let matcher = PathMatcher::compile("/admin/:action").unwrap();
        let mut req = RequestContext::builder().path(path).build();
        if let Some(params) = matcher.matches(path) {
            req.bind_params(params);
        }
        req
    }

    #[test]
    fn dispatches_on_action_param() {
        let handler = ActionHandler::new().action("list", |_req, res| {
            res.write("listing");
            Ok(Flow::Complete)
        });

        let mut req = request_for("/admin/list");
        let mut res = ResponseContext::new();
        let flow = handler.handle(&mut req, &mut res, Next::terminal(Flow::Complete)).unwrap();
        assert_eq!(flow, Flow::Complete);
        assert_eq!(res.body(), "listing");
    }

    #[test]
    fn unknown_action_declines() {
        let handler = ActionHandler::new().action("list", |_req, res| {
            res.write("listing");
            Ok(Flow::Complete)
        });

        let mut req = request_for("/admin/purge");
        let mut res = ResponseContext::new();
        let flow = handler.handle(&mut req, &mut res, Next::terminal(Flow::Complete)).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(res.body(), "");
    }

    #[test]
    fn fallback_covers_unknown_actions() {
        let handler = ActionHandler::new().fallback(|req, res| {
            res.write(req.param("action").unwrap_or("?"));
            Ok(Flow::Complete)
        });

        let mut req = request_for("/admin/purge");
        let mut res = ResponseContext::new();
        let flow = handler.handle(&mut req, &mut res, Next::terminal(Flow::Complete)).unwrap();
        assert_eq!(flow, Flow::Complete);
        assert_eq!(res.body(), "purge");
    }
}
