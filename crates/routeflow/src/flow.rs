//! Control-flow signals passed between chain units and the dispatch loop.
//!
//! The engine models its two routing signals as a tagged result returned
//! from every chain step instead of unwinding the stack: the dispatch loop
//! and the chain executor both switch on the [`Flow`] tag, which makes the
//! propagation rules explicit and testable.

use std::error::Error;

/// Opaque fault type for errors raised by handler logic.
///
/// The engine is error-transparent: it never catches these, it only
/// propagates them out of `dispatch` for an outer recovery layer.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// The outcome of one chain step.
pub type FlowResult = Result<Flow, BoxError>;

/// Control signal produced by a chain unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// The unit (and everything downstream of it) finished normally;
    /// the buffered response stands and the dispatch counts as handled.
    Complete,
    /// This whole route attempt declines to handle the request; the
    /// dispatch loop discards its bound parameters and tries the next
    /// table entry. Propagates transparently through intervening units.
    Continue,
    /// The response is final. No further unit runs and upstream
    /// post-`next` work is skipped all the way to the dispatch boundary.
    Halt,
}

impl Flow {
    /// Returns true for the signals that cut a chain short.
    ///
    /// Units with post-`next` work check this on the flow returned by
    /// `next` and propagate it untouched instead of running their
    /// after-step.
    #[inline]
    pub fn interrupts(self) -> bool {
        !matches!(self, Flow::Complete)
    }

    #[inline]
    pub fn is_complete(self) -> bool {
        matches!(self, Flow::Complete)
    }

    #[inline]
    pub fn is_continue(self) -> bool {
        matches!(self, Flow::Continue)
    }

    #[inline]
    pub fn is_halt(self) -> bool {
        matches!(self, Flow::Halt)
    }
}
