//! Call frames and the frame arena (spec.md §3 "Call frame", §9 "Cyclic
//! frame links").
//!
//! spec.md §9 prescribes the mapping directly: "model frames as
//! arena-allocated with integer indices; the 'current frame' register is
//! an index, not a pointer. Arena is drained on top-level return." Frames
//! have a strictly stack-like lifetime tied to a call's dynamic extent
//! (spec.md §3 "Lifecycle"), so the arena is a plain growable `Vec` pushed
//! on call entry and popped on return — never a free-list or generational
//! arena, since nothing outlives its creating call.
//!
//! Grounded on the teacher's `object.rs`/`run.rs` frame-as-arena-index
//! design notes; the slot-per-parameter argument vector is new (the
//! teacher's namespaces are built by a compiler pass this core doesn't
//! have).

use std::rc::Rc;

use smallvec::SmallVec;

use crate::{function::FunctionValue, symbol::Symbol, value::{Series, Value}};

pub type FrameId = usize;

/// Argument storage sized for the common case of a handful of parameters,
/// spilling to the heap past that — the same small-inline-vector shape the
/// teacher's `args.rs` uses for call argument scratch space.
type ArgsVec = SmallVec<[Value; 8]>;

/// A single invocation's state (spec.md §3 "Call frame").
#[derive(Debug)]
pub struct CallFrame {
    /// Stable copy of the function being invoked — the word or path that
    /// named it might be rebound to something else while the call runs.
    pub function: Rc<FunctionValue>,
    /// The symbol used at the call site to name this call, for backtraces
    /// and for `redo_call`'s by-name refinement matching. `None` for a
    /// function-valued literal invoked directly (spec.md §4.1
    /// "Function-valued literal").
    pub label: Option<Symbol>,
    /// Backtrace context: the source array and index of the call site.
    pub source: Series,
    pub call_index: usize,
    /// One cell per formal parameter, pre-initialized to `Unset` and
    /// filled in declaration order by the fulfiller.
    pub args: ArgsVec,
    pub caller: Option<FrameId>,
}

impl CallFrame {
    #[must_use]
    pub fn new(function: Rc<FunctionValue>, label: Option<Symbol>, source: Series, call_index: usize, caller: Option<FrameId>) -> Self {
        let args = ArgsVec::from_elem(Value::Unset, function.param_count());
        Self {
            function,
            label,
            source,
            call_index,
            args,
            caller,
        }
    }

    #[must_use]
    pub fn arg(&self, index: usize) -> &Value {
        &self.args[index]
    }

    pub fn set_arg(&mut self, index: usize, value: Value) {
        self.args[index] = value;
    }

    /// Looks up an argument slot by the parameter's symbol — used by
    /// `redo_call` (spec.md §4.5) to copy arguments across differently-
    /// shaped parameter lists, and by interpreted bodies to read their own
    /// parameters before a `Frame` binding context is built around them.
    #[must_use]
    pub fn index_of(&self, sym: Symbol) -> Option<usize> {
        self.function.params.iter().position(|p| p.sym == sym)
    }
}

/// Owns every live [`CallFrame`] and the "current frame" register
/// (spec.md §3, §9).
///
/// "Current" is distinct from "top of the arena": a frame only becomes
/// current once every argument has been fulfilled (spec.md §3's "A call
/// frame is only 'in effect' ... after every argument has been
/// fulfilled"), and dispatch saves/restores the *previous* current frame
/// rather than unconditionally tracking the arena's top, since that
/// previous frame may itself be mid-fulfillment one level up the Rust call
/// stack (spec.md §4.2 "Dispatch").
#[derive(Debug, Default)]
pub struct CallFrameArena {
    frames: Vec<CallFrame>,
    current: Option<FrameId>,
}

impl CallFrameArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new frame at the top of the arena. Does not make it
    /// current — see [`Self::make_current`].
    pub fn push(&mut self, frame: CallFrame) -> FrameId {
        self.frames.push(frame);
        self.frames.len() - 1
    }

    /// Releases the top frame. Frames are strictly stack-like: releasing
    /// anything but the arena's current top is an invariant violation.
    pub fn pop(&mut self, id: FrameId) {
        assert_eq!(id, self.frames.len() - 1, "call frame arena: frames released out of order");
        self.frames.pop();
    }

    #[must_use]
    pub fn current(&self) -> Option<FrameId> {
        self.current
    }

    /// Installs `id` as current, returning the previous current frame so
    /// the caller can restore it on return (spec.md §4.2 "saved and
    /// restored on return").
    pub fn make_current(&mut self, id: FrameId) -> Option<FrameId> {
        std::mem::replace(&mut self.current, Some(id))
    }

    pub fn restore_current(&mut self, previous: Option<FrameId>) {
        self.current = previous;
    }

    #[must_use]
    pub fn get(&self, id: FrameId) -> &CallFrame {
        &self.frames[id]
    }

    pub fn get_mut(&mut self, id: FrameId) -> &mut CallFrame {
        &mut self.frames[id]
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drains the arena to `depth`, for top-level return or a trap
    /// boundary unwinding several call frames at once (spec.md §9 "Arena
    /// is drained on top-level return").
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
        if self.current.is_some_and(|c| c >= depth) {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{FunctionBody, FunctionKind};

    fn dummy_function() -> Rc<FunctionValue> {
        Rc::new(FunctionValue {
            kind: FunctionKind::Function,
            name: None,
            params: Vec::new(),
            body: FunctionBody::Interpreted(Series::empty()),
            infix: false,
            has_definitional_return: false,
        })
    }

    #[test]
    fn current_frame_restores_previous_on_return() {
        let mut arena = CallFrameArena::new();
        let f = dummy_function();
        let a = arena.push(CallFrame::new(Rc::clone(&f), None, Series::empty(), 0, None));
        let prev = arena.make_current(a);
        assert_eq!(prev, None);
        let b = arena.push(CallFrame::new(Rc::clone(&f), None, Series::empty(), 0, Some(a)));
        let prev2 = arena.make_current(b);
        assert_eq!(prev2, Some(a));
        arena.restore_current(prev2);
        assert_eq!(arena.current(), Some(a));
        arena.pop(b);
        arena.restore_current(prev);
        assert_eq!(arena.current(), None);
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn popping_out_of_order_panics() {
        let mut arena = CallFrameArena::new();
        let f = dummy_function();
        let a = arena.push(CallFrame::new(Rc::clone(&f), None, Series::empty(), 0, None));
        let _b = arena.push(CallFrame::new(f, None, Series::empty(), 0, Some(a)));
        arena.pop(a);
    }
}
