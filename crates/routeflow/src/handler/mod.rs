//! The polymorphic route-handler contract and its strategy variants.
//!
//! Every variant implements the same capability trait — a `before` hook, a
//! dispatch step, an `after` hook — and is selected at registration time by
//! composition rather than subclassing: [`VerbHandler`](verb::VerbHandler)
//! dispatches on the HTTP method, [`ActionHandler`](action::ActionHandler)
//! on an `action` route parameter, [`CliHandler`](cli::CliHandler) parses
//! positional tokens, and [`DaemonLoop`](daemon::DaemonLoop) wraps another
//! handler in a stoppable loop.

pub mod action;
pub mod cli;
pub mod daemon;
pub mod verb;

use crate::chain::{ChainUnit, Next};
use crate::flow::{Flow, FlowResult};
use crate::request::RequestContext;
use crate::response::ResponseContext;
use std::sync::Arc;

/// A work function bound to one verb, action or command.
pub type BoundFn = Box<dyn Fn(&mut RequestContext, &mut ResponseContext) -> FlowResult + Send + Sync>;

/// The route-handler contract.
///
/// `before` runs first and can short-circuit the unit by returning a
/// non-`Complete` flow; `handle` performs the actual dispatch; `after`
/// runs only when `handle` completed — a halt or continue coming out of
/// `handle` (its own or a downstream unit's) skips it.
pub trait RouteHandler: Send + Sync {
    fn before(&self, _req: &mut RequestContext, _res: &mut ResponseContext) -> FlowResult {
        Ok(Flow::Complete)
    }

    fn handle(&self, req: &mut RequestContext, res: &mut ResponseContext, next: Next<'_>) -> FlowResult;

    fn after(&self, _req: &mut RequestContext, _res: &mut ResponseContext) -> FlowResult {
        Ok(Flow::Complete)
    }
}

/// Adapter running a [`RouteHandler`] as one chain unit with the
/// before/handle/after ordering contract applied.
pub(crate) struct HandlerUnit {
    handler: Arc<dyn RouteHandler>,
}

impl HandlerUnit {
    pub(crate) fn new(handler: Arc<dyn RouteHandler>) -> Self {
        Self { handler }
    }
}

impl ChainUnit for HandlerUnit {
    fn call(&self, req: &mut RequestContext, res: &mut ResponseContext, next: Next<'_>) -> FlowResult {
        match self.handler.before(req, res)? {
            Flow::Complete => {}
            flow => return Ok(flow),
        }
        match self.handler.handle(req, res, next)? {
            Flow::Complete => {}
            flow => return Ok(flow),
        }
        self.handler.after(req, res)
    }
}

#[cfg(test)]
mod tests {
    use super::{HandlerUnit, RouteHandler};
    use crate::chain::{ChainUnit, Next};
    use crate::flow::{Flow, FlowResult};
    use crate::request::RequestContext;
    use crate::response::ResponseContext;
    use std::sync::Arc;

    struct Recorder {
        halt_in_handle: bool,
        continue_in_before: bool,
    }

    impl RouteHandler for Recorder {
        fn before(&self, _req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
            res.write("before ");
            if self.continue_in_before { Ok(Flow::Continue) } else { Ok(Flow::Complete) }
        }

        fn handle(&self, _req: &mut RequestContext, res: &mut ResponseContext, _next: Next<'_>) -> FlowResult {
            res.write("handle ");
            if self.halt_in_handle { Ok(res.end()) } else { Ok(Flow::Complete) }
        }

        fn after(&self, _req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
            res.write("after");
            Ok(Flow::Complete)
        }
    }

    fn run(handler: Recorder) -> (Flow, String) {
        let unit = HandlerUnit::new(Arc::new(handler));
        let mut req = RequestContext::builder().build();
        let mut res = ResponseContext::new();
        let flow = unit.call(&mut req, &mut res, Next::terminal(Flow::Complete)).unwrap();
        let body = res.body().to_owned();
        (flow, body)
    }

    #[test]
    fn full_lifecycle_runs_in_order() {
        let (flow, body) = run(Recorder { halt_in_handle: false, continue_in_before: false });
        assert_eq!(flow, Flow::Complete);
        assert_eq!(body, "before handle after");
    }

    #[test]
    fn halt_from_handle_skips_after() {
        let (flow, body) = run(Recorder { halt_in_handle: true, continue_in_before: false });
        assert_eq!(flow, Flow::Halt);
        assert_eq!(body, "before handle ");
    }

    #[test]
    fn continue_from_before_skips_handle_and_after() {
        let (flow, body) = run(Recorder { halt_in_handle: false, continue_in_before: true });
        assert_eq!(flow, Flow::Continue);
        assert_eq!(body, "before ");
    }
}
