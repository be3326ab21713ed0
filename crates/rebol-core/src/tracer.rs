//! Evaluator instrumentation.
//!
//! A zero-cost trait, mirroring the teacher's `VmTracer`: `NoopTracer`
//! compiles away entirely (monomorphization elides every call), while
//! `StderrTracer` and `RecordingTracer` exist for interactive debugging and
//! deterministic post-mortem inspection. SPEC_FULL.md §10.1 calls for the
//! same three-tracer shape, instrumented at the points `eval.rs`/
//! `fulfill.rs`/`path.rs` actually reach: step dispatch, call push/pop,
//! throw, and signal poll — the teacher's opcode-dispatch and frame
//! push/pop points, generalized to this core's evaluator.

use crate::{symbol::Symbol, value::Value};

/// One recorded instrumentation event (used by [`RecordingTracer`]).
#[derive(Debug, Clone)]
pub enum TraceEvent {
    /// `eval_step` classified and advanced past a source position.
    Step { index: usize },
    /// A call frame was pushed and is being fulfilled.
    CallPush { label: Option<Symbol>, frame_id: usize },
    /// A call frame finished and was released.
    CallPop { frame_id: usize },
    /// A value is propagating as a throw.
    Thrown { payload_kind: String },
    /// A signal poll fired (fixed instrumentation point, not necessarily
    /// one that serviced anything).
    SignalPoll { pending_mask: u8 },
}

/// Evaluator instrumentation hooks (SPEC_FULL.md §10.1).
///
/// Every method has a default no-op body so an implementation only needs to
/// override the events it cares about.
pub trait EvalTracer {
    #[inline]
    fn on_step(&mut self, _index: usize) {}

    #[inline]
    fn on_call_push(&mut self, _label: Option<Symbol>, _frame_id: usize) {}

    #[inline]
    fn on_call_pop(&mut self, _frame_id: usize) {}

    #[inline]
    fn on_thrown(&mut self, _payload: &Value) {}

    #[inline]
    fn on_signal_poll(&mut self, _pending_mask: u8) {}
}

/// Default tracer: every hook is an empty inlined body, so the compiler
/// elides the calls entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl EvalTracer for NoopTracer {}

/// Prints one line per event to stderr, for interactive debugging.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrTracer;

impl EvalTracer for StderrTracer {
    fn on_step(&mut self, index: usize) {
        eprintln!("step @ {index}");
    }

    fn on_call_push(&mut self, label: Option<Symbol>, frame_id: usize) {
        match label {
            Some(sym) => eprintln!("call #{frame_id} -> symbol#{}", sym.index()),
            None => eprintln!("call #{frame_id} -> (anonymous)"),
        }
    }

    fn on_call_pop(&mut self, frame_id: usize) {
        eprintln!("return #{frame_id}");
    }

    fn on_thrown(&mut self, payload: &Value) {
        eprintln!("throw: {payload}");
    }

    fn on_signal_poll(&mut self, pending_mask: u8) {
        if pending_mask != 0 {
            eprintln!("signal poll: mask={pending_mask:#04b}");
        }
    }
}

/// Appends every event to a `Vec`, for deterministic assertions in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    pub events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvalTracer for RecordingTracer {
    fn on_step(&mut self, index: usize) {
        self.events.push(TraceEvent::Step { index });
    }

    fn on_call_push(&mut self, label: Option<Symbol>, frame_id: usize) {
        self.events.push(TraceEvent::CallPush { label, frame_id });
    }

    fn on_call_pop(&mut self, frame_id: usize) {
        self.events.push(TraceEvent::CallPop { frame_id });
    }

    fn on_thrown(&mut self, payload: &Value) {
        self.events.push(TraceEvent::Thrown {
            payload_kind: payload.kind().to_string(),
        });
    }

    fn on_signal_poll(&mut self, pending_mask: u8) {
        self.events.push(TraceEvent::SignalPoll { pending_mask });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_tracer_captures_events_in_order() {
        let mut tracer = RecordingTracer::new();
        tracer.on_step(0);
        tracer.on_call_push(None, 0);
        tracer.on_call_pop(0);
        assert_eq!(tracer.events.len(), 3);
        assert!(matches!(tracer.events[0], TraceEvent::Step { index: 0 }));
    }
}
