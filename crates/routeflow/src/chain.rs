//! Ordered middleware-chain execution.
//!
//! A chain is a sequence of units; each unit receives the request and
//! response contexts and a [`Next`] continuation that runs the remainder of
//! the chain. Pre-`next` work nests outside-in and post-`next` work unwinds
//! inside-out (onion ordering); [`Flow::Continue`] and [`Flow::Halt`]
//! returned by a downstream unit propagate through intervening units
//! untouched unless a unit deliberately replaces them.
//!
//! Chains are assembled per dispatch from `Arc` clones of the units stored
//! at registration time and discarded when the dispatch completes.

use crate::flow::{Flow, FlowResult};
use crate::request::RequestContext;
use crate::response::ResponseContext;
use std::sync::Arc;

/// One step of a middleware chain.
///
/// A unit may:
/// - do work and call `next.run(..)` exactly once to continue the chain;
/// - skip `next` entirely, which ends the chain silently (a completed
///   dispatch);
/// - return `Ok(res.end())` to halt the whole dispatch;
/// - return `Ok(Flow::Continue)` to void the current route attempt.
pub trait ChainUnit: Send + Sync {
    fn call(&self, req: &mut RequestContext, res: &mut ResponseContext, next: Next<'_>) -> FlowResult;
}

/// Continuation over the remaining units of a chain.
///
/// Consumed by value, so a unit can invoke the remainder at most once.
/// When the chain runs off its end the configured *tail flow* is returned:
/// `Complete` for an ordinary chain, `Continue` when the chain is a
/// sub-target list whose exhaustion declines the route back to the
/// dispatch loop.
#[derive(Debug)]
pub struct Next<'c> {
    rest: &'c [Arc<dyn ChainUnit>],
    tail: Flow,
}

impl<'c> Next<'c> {
    pub(crate) fn new(rest: &'c [Arc<dyn ChainUnit>], tail: Flow) -> Self {
        Self { rest, tail }
    }

    /// A continuation with nothing left to run that yields `flow`.
    pub fn terminal(flow: Flow) -> Next<'static> {
        Next { rest: &[], tail: flow }
    }

    /// True when at least one unit remains downstream.
    pub fn has_remaining(&self) -> bool {
        !self.rest.is_empty()
    }

    /// Runs the remainder of the chain.
    pub fn run(self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        match self.rest.split_first() {
            None => Ok(self.tail),
            Some((unit, rest)) => unit.call(req, res, Next { rest, tail: self.tail }),
        }
    }
}

impl std::fmt::Debug for dyn ChainUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChainUnit")
    }
}

/// An executable chain: the per-dispatch pairing of units and tail flow.
#[derive(Debug)]
pub struct MiddlewareChain {
    units: Vec<Arc<dyn ChainUnit>>,
    tail: Flow,
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self { units: Vec::new(), tail: Flow::Complete }
    }

    /// A chain whose exhaustion yields `tail` instead of `Complete`.
    pub fn with_tail(tail: Flow) -> Self {
        Self { units: Vec::new(), tail }
    }

    pub fn push(&mut self, unit: Arc<dyn ChainUnit>) {
        self.units.push(unit);
    }

    pub fn extend(&mut self, units: impl IntoIterator<Item = Arc<dyn ChainUnit>>) {
        self.units.extend(units);
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Executes the chain front to back.
    pub fn execute(&self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        Next::new(&self.units, self.tail).run(req, res)
    }
}

/// Holder adapting a plain closure into a [`ChainUnit`].
pub struct FnUnit<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnUnit<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnUnit")
    }
}

impl<F> ChainUnit for FnUnit<F>
where
    F: Fn(&mut RequestContext, &mut ResponseContext, Next<'_>) -> FlowResult + Send + Sync,
{
    fn call(&self, req: &mut RequestContext, res: &mut ResponseContext, next: Next<'_>) -> FlowResult {
        (self.f)(req, res, next)
    }
}

/// Wraps a closure as a chain unit.
pub fn unit_fn<F>(f: F) -> FnUnit<F>
where
    F: Fn(&mut RequestContext, &mut ResponseContext, Next<'_>) -> FlowResult + Send + Sync,
{
    FnUnit { f }
}

#[cfg(test)]
mod tests {
    use super::{unit_fn, MiddlewareChain, Next};
    use crate::flow::Flow;
    use crate::request::RequestContext;
    use crate::response::ResponseContext;
    use std::sync::Arc;

    fn contexts() -> (RequestContext, ResponseContext) {
        (RequestContext::builder().build(), ResponseContext::new())
    }

    fn appending(tag: &'static str) -> Arc<dyn super::ChainUnit> {
        Arc::new(unit_fn(move |req, res, next| {
            res.write(tag);
            next.run(req, res)
        }))
    }

    #[test]
    fn units_run_in_chained_order() {
        let mut chain = MiddlewareChain::new();
        chain.extend([appending("a"), appending("b"), appending("c")]);

        let (mut req, mut res) = contexts();
        assert_eq!(chain.execute(&mut req, &mut res).unwrap(), Flow::Complete);
        assert_eq!(res.body(), "abc");
    }

    #[test]
    fn onion_ordering_with_after_work() {
        let mut chain = MiddlewareChain::new();
        for tag in ["a", "b"] {
            chain.push(Arc::new(unit_fn(move |req, res, next| {
                res.write(tag);
                let flow = next.run(req, res)?;
                if flow.interrupts() {
                    return Ok(flow);
                }
                res.write(tag);
                Ok(Flow::Complete)
            })));
        }

        let (mut req, mut res) = contexts();
        assert_eq!(chain.execute(&mut req, &mut res).unwrap(), Flow::Complete);
        assert_eq!(res.body(), "abba");
    }

    #[test]
    fn skipping_next_stops_chain_silently() {
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(unit_fn(|_req, res, _next| {
            res.write("only");
            Ok(Flow::Complete)
        })));
        chain.push(appending("never"));

        let (mut req, mut res) = contexts();
        assert_eq!(chain.execute(&mut req, &mut res).unwrap(), Flow::Complete);
        assert_eq!(res.body(), "only");
    }

    #[test]
    fn continue_propagates_through_intervening_units() {
        let mut chain = MiddlewareChain::new();
        chain.extend([appending("a"), appending("b")]);
        chain.push(Arc::new(unit_fn(|_req, _res, _next| Ok(Flow::Continue))));

        let (mut req, mut res) = contexts();
        assert_eq!(chain.execute(&mut req, &mut res).unwrap(), Flow::Continue);
        assert_eq!(res.body(), "ab");
    }

    #[test]
    fn halt_skips_upstream_after_work() {
        let mut chain = MiddlewareChain::new();
        chain.push(Arc::new(unit_fn(|req, res, next| {
            res.write("before ");
            let flow = next.run(req, res)?;
            if flow.interrupts() {
                return Ok(flow);
            }
            res.write(" after");
            Ok(Flow::Complete)
        })));
        chain.push(Arc::new(unit_fn(|_req, res, _next| {
            res.write("final");
            Ok(res.end())
        })));

        let (mut req, mut res) = contexts();
        assert_eq!(chain.execute(&mut req, &mut res).unwrap(), Flow::Halt);
        assert_eq!(res.body(), "before final");
    }

    #[test]
    fn empty_chain_yields_tail() {
        let chain = MiddlewareChain::with_tail(Flow::Continue);
        let (mut req, mut res) = contexts();
        assert_eq!(chain.execute(&mut req, &mut res).unwrap(), Flow::Continue);
    }

    #[test]
    fn terminal_next_reports_no_remaining() {
        let next = Next::terminal(Flow::Complete);
        assert!(!next.has_remaining());
    }

    #[test]
    fn errors_pass_through_untouched() {
        let mut chain = MiddlewareChain::new();
        chain.push(appending("a"));
        chain.push(Arc::new(unit_fn(|_req, _res, _next| Err("boom".into()))));

        let (mut req, mut res) = contexts();
        let err = chain.execute(&mut req, &mut res).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
