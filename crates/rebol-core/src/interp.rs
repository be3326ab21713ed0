//! Interpreter state: the single value threaded explicitly through every
//! internal call (spec.md §9 "Global mutable state ... put it behind a
//! single 'interpreter state' value passed explicitly to every internal
//! call. This makes re-entrancy tests trivial.").
//!
//! Bundles the symbol interner, the call-frame arena and its "current
//! frame" register, the argument stack, the signal mask/counter, the GC
//! guard stacks, and the tracer. Every public entry point in `eval.rs`,
//! `fulfill.rs`, `path.rs`, and `apply.rs` takes `&mut Interp` as its first
//! argument rather than reaching for statics.
//!
//! The tracker and tracer are boxed trait objects rather than generic
//! parameters on `Interp` itself: `FunctionValue::body`'s native handler
//! type (`function.rs::NativeFn`) is `Rc<dyn Fn(&mut Interp, ...)>`, and a
//! generic `Interp<Tracker, Tracer>` would have to infect every native
//! signature and every natives-module file with the same two type
//! parameters. The teacher's own `VM<'a, T, P, Tr>` pays that cost for a
//! hot bytecode-dispatch loop; this evaluator's dispatch is already
//! recursive-descent (not a tight opcode loop), so the dynamic-dispatch
//! overhead here is not on a path the teacher would have monomorphized
//! either.

use std::{cell::Cell, rc::Rc};

use crate::{
    argstack::ArgStack,
    callframe::CallFrameArena,
    error::EvalError,
    frame::{Frame, FrameRef},
    gc::GcGuards,
    resource::{NoLimitTracker, ResourceTracker},
    signal::SignalState,
    symbol::Symbols,
    tracer::{EvalTracer, NoopTracer},
};

/// The interpreter's process-wide state (spec.md §5 "Shared resources").
pub struct Interp {
    pub symbols: Symbols,
    pub frames: CallFrameArena,
    pub argstack: ArgStack,
    pub gc: GcGuards,
    pub signals: SignalState,
    pub tracker: Box<dyn ResourceTracker>,
    pub tracer: Box<dyn EvalTracer>,
    /// The top-level/global context. Not part of spec.md's core contract
    /// directly, but every demo native and the reader need *some* starting
    /// context to bind top-level words into.
    pub global: FrameRef,
    /// Current Rust-level reentrant call depth, checked against
    /// `tracker.check_recursion_depth` on every `eval_step` entry (spec.md
    /// §4.1 "Stack-overflow check"). `Rc<Cell<_>>` rather than a plain
    /// `usize` so [`DepthGuard`] can hold its own handle on the counter
    /// instead of borrowing `&mut Interp` for its whole lifetime — every
    /// call site needs `interp` usable again immediately after `enter()`.
    depth: Rc<Cell<usize>>,
}

impl Interp {
    /// An interpreter with no recursion limit and a no-op tracer — the
    /// default for embedding and for most tests.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tracker_and_tracer(Box::new(NoLimitTracker::new()), Box::new(NoopTracer))
    }

    #[must_use]
    pub fn with_tracker_and_tracer(tracker: Box<dyn ResourceTracker>, tracer: Box<dyn EvalTracer>) -> Self {
        let dose = tracker.eval_dose();
        Self {
            symbols: Symbols::new(),
            frames: CallFrameArena::new(),
            argstack: ArgStack::new(),
            gc: GcGuards::new(),
            signals: SignalState::new(dose),
            tracker,
            tracer,
            global: Frame::new_ref(),
            depth: Rc::new(Cell::new(0)),
        }
    }

    /// Checked recursion-depth increment for the duration of one recursive
    /// `eval_step`/`fulfill`/`path` call. Returns `Err` without
    /// incrementing if the configured limit would be exceeded. The
    /// returned guard holds its own `Rc` on the counter rather than `&mut
    /// Interp`, so `interp` is free to be borrowed again by the caller
    /// while the guard is still alive (fulfillment and apply both need
    /// `interp` for the rest of the call after entering).
    pub fn enter(&mut self) -> Result<DepthGuard, EvalError> {
        self.tracker
            .check_recursion_depth(self.depth.get())
            .map_err(|_| EvalError::StackOverflow)?;
        self.depth.set(self.depth.get() + 1);
        Ok(DepthGuard { depth: Rc::clone(&self.depth) })
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Polls the signal mask (spec.md §4.1 "Signal polling"), consulting
    /// the tracker's evaluation-limit hook and notifying the tracer either
    /// way, since the instrumentation point is fixed regardless of whether
    /// anything was actually pending.
    pub fn poll_signals(&mut self) -> Result<(), EvalError> {
        let pending = self.signals.pending();
        self.tracer.on_signal_poll(pending);
        let tracker = &mut self.tracker;
        self.signals.poll(|| tracker.check_evaluation_limit())
    }
}

impl Default for Interp {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard decrementing [`Interp`]'s recursion counter on drop, so a
/// `?`-propagated error still restores the depth for the next sibling call
/// (spec.md §9's stack-discipline note, generalized from the argument
/// stack's `StackMark` to the recursion counter). Holds its own `Rc` on the
/// counter rather than `&mut Interp` — unlike a lifetime-bound guard, this
/// does not keep `interp` borrowed, so callers can keep using `interp`
/// normally for the rest of the function while `_guard` sits in scope.
pub struct DepthGuard {
    depth: Rc<Cell<usize>>,
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_increments_and_drop_restores_depth() {
        let mut interp = Interp::new();
        assert_eq!(interp.depth(), 0);
        {
            let _guard = interp.enter().unwrap();
            assert_eq!(interp.depth(), 1);
        }
        assert_eq!(interp.depth(), 0);
    }
}
