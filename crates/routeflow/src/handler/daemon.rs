//! Long-lived handler wrapper.
//!
//! [`DaemonLoop`] repeats an inner handler's dispatch step with a
//! configurable inter-iteration delay until told to stop. It blocks the
//! calling thread for its whole lifetime, so it must run on a dedicated
//! worker thread, never inline with request-serving dispatch.

use super::RouteHandler;
use crate::chain::Next;
use crate::flow::{Flow, FlowResult};
use crate::request::RequestContext;
use crate::response::ResponseContext;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Shared stop switch for a running [`DaemonLoop`].
///
/// Clones observe the same flag; `stop()` breaks the loop at the next
/// iteration boundary. This is the engine's stop signal (a halt that the
/// loop consumes so the inner `after` hook still runs).
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the loop to stop before its next iteration.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Runs an inner handler's `handle` in an unbounded loop.
///
/// The loop ends when the [`StopToken`] fires or the inner handler halts;
/// either way the inner `after` hook runs exactly once afterwards (the
/// wrapper completes, letting the chain adapter call it). An inner
/// `Continue` propagates out unchanged and voids the route attempt.
pub struct DaemonLoop<H> {
    inner: H,
    interval: Duration,
    stop: StopToken,
}

impl<H: RouteHandler> DaemonLoop<H> {
    pub fn new(inner: H) -> Self {
        Self { inner, interval: Duration::ZERO, stop: StopToken::new() }
    }

    /// Delay between iterations. Defaults to none.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Uses an externally held token so another thread can stop the loop.
    pub fn stop_token(mut self, token: StopToken) -> Self {
        self.stop = token;
        self
    }

    /// The token controlling this loop.
    pub fn token(&self) -> StopToken {
        self.stop.clone()
    }
}

impl<H: RouteHandler> RouteHandler for DaemonLoop<H> {
    fn before(&self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        self.inner.before(req, res)
    }

    fn handle(&self, req: &mut RequestContext, res: &mut ResponseContext, _next: Next<'_>) -> FlowResult {
        let mut iterations: u64 = 0;
        loop {
            if self.stop.is_stopped() {
                debug!(iterations, "daemon loop stopped");
                break;
            }
            // each iteration is terminal: the loop owns the rest of the chain
            match self.inner.handle(req, res, Next::terminal(Flow::Complete))? {
                Flow::Complete => {}
                Flow::Halt => {
                    debug!(iterations, "daemon loop halted by inner handler");
                    break;
                }
                Flow::Continue => return Ok(Flow::Continue),
            }
            iterations += 1;
            if !self.interval.is_zero() {
                std::thread::sleep(self.interval);
            }
        }
        Ok(Flow::Complete)
    }

    fn after(&self, req: &mut RequestContext, res: &mut ResponseContext) -> FlowResult {
        self.inner.after(req, res)
    }
}

impl<H> std::fmt::Debug for DaemonLoop<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonLoop").field("interval", &self.interval).field("stop", &self.stop).finish()
    }
}
