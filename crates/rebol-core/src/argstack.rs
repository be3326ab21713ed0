//! The process-wide argument stack (spec.md §3 "Argument stack").
//!
//! A grow-only scratch stack used while gathering refinement words during
//! path evaluation (§4.3 "Call-preparing mode"). Every caller that pushes
//! onto it must restore the depth it observed on entry; an imbalance on
//! return is a fatal invariant violation (spec.md §8 invariant 1 "Stack
//! balance").
//!
//! Grounded on the teacher's `heap.rs` guard-stack idiom: a depth mark
//! obtained on entry, with a scope guard whose `Drop` rebalances even on
//! an early return or a `?`-propagated error (spec.md §9 "a lightweight
//! `StackMark` value ... whose drop rebalances").

use crate::value::Value;

/// A recorded depth, returned by [`ArgStack::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackMark(usize);

/// Scratch stack for refinement-word gathering (spec.md §3, §4.3).
#[derive(Debug, Default)]
pub struct ArgStack {
    values: Vec<Value>,
}

impl ArgStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mark(&self) -> StackMark {
        StackMark(self.values.len())
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    #[must_use]
    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }

    /// Resets the stack to a previously recorded mark, discarding anything
    /// pushed since. Used on both the ordinary post-call cleanup path and
    /// the throw-unwind path (spec.md §4.2 "Cancellation and throws during
    /// fulfillment").
    pub fn reset_to(&mut self, mark: StackMark) {
        debug_assert!(self.values.len() >= mark.0, "argument stack: reset below recorded mark");
        self.values.truncate(mark.0);
    }

    /// Checks that the stack sits at exactly `mark`, the assertion every
    /// call boundary must satisfy (spec.md §8 invariant 1).
    pub fn assert_balanced(&self, mark: StackMark) {
        assert_eq!(self.values.len(), mark.0, "argument stack unbalanced across call boundary");
    }

    /// The slice pushed since `mark`, in push order — what the fulfiller's
    /// `Scanning` mode case-folds and matches against (spec.md §4.2 rule
    /// 2). Reversed first by the path walker (§4.3 "Call-preparing mode")
    /// so this reads back in source order.
    #[must_use]
    pub fn since(&self, mark: StackMark) -> &[Value] {
        &self.values[mark.0..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_to_discards_pushes_since_mark() {
        let mut stack = ArgStack::new();
        stack.push(Value::Integer(1));
        let mark = stack.mark();
        stack.push(Value::Integer(2));
        stack.push(Value::Integer(3));
        assert_eq!(stack.depth(), 3);
        stack.reset_to(mark);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    #[should_panic(expected = "unbalanced")]
    fn assert_balanced_panics_on_mismatch() {
        let mut stack = ArgStack::new();
        let mark = stack.mark();
        stack.push(Value::Integer(1));
        stack.assert_balanced(mark);
    }
}
