//! The single-step evaluator core (spec.md §4.1).
//!
//! Grounded on the teacher's `run.rs` (the interpreter's main dispatch
//! loop) and `expressions.rs` (per-node-kind classification), generalized
//! from a fixed Python grammar's statement/expression split to spec.md's
//! flat per-value-kind dispatch table over one shared array of values.
//!
//! # Simplification from the reference design
//!
//! spec.md's infix lookahead calls for memoizing a peeked word's lookup so
//! that, in run-to-end mode, re-classifying the *next* position doesn't
//! redo the same lookup. This implementation always re-resolves the word
//! at that position instead of threading a memoized value back out of
//! `eval_step`. It is a documented performance simplification, not a
//! semantic one: the threading would only save one extra `Frame::get`
//! call per non-infix lookahead miss, at the cost of a second return path
//! out of every call site. Binding lookups here are cheap (an `IndexMap`
//! hit), so the simplification does not change any observable behavior.

use std::rc::Rc;

use crate::{
    bind, error::EvalError, fulfill, interp::Interp, path,
    symbol::Symbol,
    value::{Cell, Series, Value},
};

/// Step-mode and lookahead flags (spec.md §4.1 "two independent flag
/// pairs").
#[derive(Debug, Clone, Copy)]
pub struct EvalFlags {
    /// `true` runs the source array to completion (spec.md's "run-to-end");
    /// `false` consumes exactly one expression ("step").
    pub run_to_end: bool,
    /// Whether an infix function immediately following the produced value
    /// may be dispatched. Always effectively `true` when `run_to_end` is
    /// set (spec.md "When step-mode is run-to-end or the caller allows
    /// lookahead").
    pub allow_lookahead: bool,
}

impl EvalFlags {
    #[must_use]
    pub fn step() -> Self {
        Self {
            run_to_end: false,
            allow_lookahead: true,
        }
    }

    #[must_use]
    pub fn run_to_end() -> Self {
        Self {
            run_to_end: true,
            allow_lookahead: true,
        }
    }

    #[must_use]
    pub fn suppress_lookahead(mut self) -> Self {
        self.allow_lookahead = false;
        self
    }

    fn lookahead_active(self) -> bool {
        self.run_to_end || self.allow_lookahead
    }
}

/// What one `eval_step` call produced (spec.md §4.1 "The evaluator
/// either...").
#[derive(Debug)]
pub enum StepOutcome {
    /// The position in `source` just past the last value consumed.
    Index(usize),
    /// The index was already past the array end; `out` was set to `Unset`.
    End,
    /// `out`'s `thrown` bit is set to the unwinding payload.
    Thrown,
}

fn value_at(source: &Series, index: usize) -> Value {
    source.data.borrow().get(index).cloned().unwrap_or(Value::End)
}

fn source_len(source: &Series) -> usize {
    source.data.borrow().len()
}

/// Runs `source` (starting at `source.index`) to completion, re-entering
/// `eval_step` in run-to-end mode until it reports `End` or `Thrown`
/// (spec.md §6 `eval_to_end`; used directly by `Paren` evaluation and by
/// interpreted function bodies).
pub fn eval_to_end(interp: &mut Interp, out: &mut Cell, source: &Series) -> Result<StepOutcome, EvalError> {
    let mut index = source.index;
    let flags = EvalFlags::run_to_end();
    loop {
        match eval_step(interp, out, source, index, flags)? {
            StepOutcome::Thrown => return Ok(StepOutcome::Thrown),
            StepOutcome::End => return Ok(StepOutcome::End),
            StepOutcome::Index(next) => {
                if next >= source_len(source) {
                    return Ok(StepOutcome::End);
                }
                index = next;
            }
        }
    }
}

/// Classifies and reduces (or dispatches) one expression starting at
/// `index` (spec.md §4.1's dispatch table), chaining infix lookahead while
/// `flags` allow it.
pub fn eval_step(interp: &mut Interp, out: &mut Cell, source: &Series, index: usize, flags: EvalFlags) -> Result<StepOutcome, EvalError> {
    interp.poll_signals()?;

    let len = source_len(source);
    if index >= len {
        *out = Cell::unset();
        return Ok(StepOutcome::End);
    }
    interp.tracer.on_step(index);

    let value = value_at(source, index);
    let mut next = match classify(interp, out, source, index, &value, flags)? {
        StepOutcome::Thrown => return Ok(StepOutcome::Thrown),
        StepOutcome::End => return Ok(StepOutcome::End),
        StepOutcome::Index(next) => next,
    };

    // Re-evaluate bit: treat the produced value as if it had appeared
    // inline (spec.md §4.1, end of "Dispatch table").
    while out.reevaluate {
        out.reevaluate = false;
        let scratch = Series::new(vec![out.take()]);
        match eval_step(interp, out, &scratch, 0, flags)? {
            StepOutcome::Thrown => return Ok(StepOutcome::Thrown),
            StepOutcome::End | StepOutcome::Index(_) => {}
        }
    }

    if flags.lookahead_active() {
        loop {
            let peeked = value_at(source, next);
            let Value::Word(w) = &peeked else { break };
            let Some(binding) = w.binding.as_ref() else { break };
            let Ok(looked_up) = binding.borrow().get(w.sym).cloned() else {
                break;
            };
            let Some(function) = looked_up.as_function().cloned() else {
                break;
            };
            if !function.infix {
                break;
            }
            let lhs = out.take();
            let mark = interp.argstack.mark();
            match fulfill::fulfill_and_call(interp, out, function, Some(w.sym), source, next + 1, Some(lhs), mark)? {
                fulfill::CallOutcome::Thrown => return Ok(StepOutcome::Thrown),
                fulfill::CallOutcome::Value { next_index } => next = next_index,
            }
        }
    }

    Ok(StepOutcome::Index(next))
}

fn classify(
    interp: &mut Interp,
    out: &mut Cell,
    source: &Series,
    index: usize,
    value: &Value,
    flags: EvalFlags,
) -> Result<StepOutcome, EvalError> {
    match value {
        Value::End => {
            *out = Cell::unset();
            Ok(StepOutcome::End)
        }

        Value::Word(w) => {
            let binding = w.binding.as_ref().ok_or(EvalError::NotBound(w.sym))?;
            let looked_up = binding.borrow().get(w.sym)?.clone();
            if let Some(function) = looked_up.as_function().cloned() {
                if function.infix {
                    return Err(EvalError::NoOperatorArgument);
                }
                let mark = interp.argstack.mark();
                return call(interp, out, function, Some(w.sym), source, index + 1, mark);
            }
            out.value = looked_up;
            Ok(StepOutcome::Index(index + 1))
        }

        Value::GetWord(w) => {
            let binding = w.binding.as_ref().ok_or(EvalError::NotBound(w.sym))?;
            out.value = binding.borrow().get_raw(w.sym)?.clone();
            Ok(StepOutcome::Index(index + 1))
        }

        Value::LitWord(w) => {
            out.value = Value::Word(w.clone());
            Ok(StepOutcome::Index(index + 1))
        }

        Value::SetWord(w) => {
            let mut rhs = Cell::unset();
            match eval_step(interp, &mut rhs, source, index + 1, flags)? {
                StepOutcome::Thrown => {
                    out.set_thrown(rhs.value);
                    Ok(StepOutcome::Thrown)
                }
                StepOutcome::End => Err(EvalError::NeedValue),
                StepOutcome::Index(next) => {
                    let binding = w.binding.as_ref().ok_or(EvalError::NotBound(w.sym))?;
                    // Unset is accepted as a deliberate unsetting (spec.md
                    // §12 "preserve current behavior"); a top-level
                    // assignment is allowed to introduce a new global, so
                    // the target frame slot is created if absent rather
                    // than requiring a pre-declared binding.
                    binding.borrow_mut().declare_or_set(w.sym, rhs.value.clone());
                    out.value = rhs.value;
                    Ok(StepOutcome::Index(next))
                }
            }
        }

        Value::Function(f) | Value::Native(f) | Value::Action(f) | Value::Closure(f) | Value::Command(f) | Value::Routine(f) => {
            if f.infix {
                return Err(EvalError::NoOperatorArgument);
            }
            let mark = interp.argstack.mark();
            call(interp, out, Rc::clone(f), None, source, index + 1, mark)
        }

        Value::Path(elems) => {
            // Recorded *before* `do_path` runs: call-preparing mode pushes
            // requested refinement words onto `interp.argstack` as part of
            // the walk (spec.md §4.3), so this is the depth the fulfiller
            // must treat as "nothing requested yet" — taking the mark after
            // `do_path` returns would see only the pushes it just made.
            let mark = interp.argstack.mark();
            match path::do_path(interp, elems, None, true)? {
                path::PathOutcome::Thrown(payload) => {
                    out.set_thrown(payload);
                    Ok(StepOutcome::Thrown)
                }
                path::PathOutcome::Value(result) => {
                    if let Some(function) = result.value.as_function().cloned() {
                        call(interp, out, function, result.label, source, index + 1, mark)
                    } else {
                        out.value = result.value;
                        Ok(StepOutcome::Index(index + 1))
                    }
                }
            }
        }

        Value::GetPath(elems) => match path::do_path(interp, elems, None, false)? {
            path::PathOutcome::Thrown(payload) => {
                out.set_thrown(payload);
                Ok(StepOutcome::Thrown)
            }
            path::PathOutcome::Value(result) => {
                out.value = result.value;
                Ok(StepOutcome::Index(index + 1))
            }
        },

        Value::SetPath(elems) => {
            let mut rhs = Cell::unset();
            match eval_step(interp, &mut rhs, source, index + 1, flags)? {
                StepOutcome::Thrown => {
                    out.set_thrown(rhs.value);
                    return Ok(StepOutcome::Thrown);
                }
                StepOutcome::End => return Err(EvalError::NeedValue),
                StepOutcome::Index(next) => {
                    match path::do_path(interp, elems, Some(rhs.value.clone()), false)? {
                        path::PathOutcome::Thrown(payload) => {
                            out.set_thrown(payload);
                            return Ok(StepOutcome::Thrown);
                        }
                        path::PathOutcome::Value(_) => {
                            out.value = rhs.value;
                        }
                    }
                    Ok(StepOutcome::Index(next))
                }
            }
        }

        Value::Paren(inner) => match eval_to_end(interp, out, inner)? {
            StepOutcome::Thrown => Ok(StepOutcome::Thrown),
            StepOutcome::End | StepOutcome::Index(_) => Ok(StepOutcome::Index(index + 1)),
        },

        Value::LitPath(s) => {
            out.value = Value::Path(s.clone());
            Ok(StepOutcome::Index(index + 1))
        }

        Value::InternalFrame | Value::ReturnSignal(..) => {
            panic!("eval_step: internal-only value kind reached the dispatcher")
        }

        // Self-evaluating (spec.md §4.1 "Any other kind"): None, Unset,
        // Logic, Integer, Decimal, Character, String, Binary, Image,
        // Bitset, Time, Date, Money, Pair, Tuple, Block, Error, Object,
        // Module, Port.
        other => {
            out.value = other.clone();
            Ok(StepOutcome::Index(index + 1))
        }
    }
}

/// Shared helper for every call site that has just resolved a function
/// value: enters argument fulfillment and folds its outcome back into
/// `eval_step`'s own `StepOutcome` contract. Argument-fill lookahead is
/// `fulfill.rs`'s own concern (suppressed only when the callee itself is
/// infix, spec.md §4.2 rule 5) and is independent of the `flags` governing
/// *this* call site's own post-call lookahead chaining.
fn call(
    interp: &mut Interp,
    out: &mut Cell,
    function: Rc<crate::function::FunctionValue>,
    label: Option<Symbol>,
    source: &Series,
    start_index: usize,
    mark: crate::argstack::StackMark,
) -> Result<StepOutcome, EvalError> {
    match fulfill::fulfill_and_call(interp, out, function, label, source, start_index, None, mark)? {
        fulfill::CallOutcome::Thrown => Ok(StepOutcome::Thrown),
        fulfill::CallOutcome::Value { next_index } => Ok(StepOutcome::Index(next_index)),
    }
}

/// Deep-binds and runs an interpreted function body against a fresh call
/// frame's locals, used by `fulfill.rs`'s dispatch step. Exposed here
/// (rather than in `fulfill.rs`) because it is squarely `eval_to_end`
/// plumbing: rebind once, then run to completion.
pub fn run_interpreted_body(
    interp: &mut Interp,
    out: &mut Cell,
    body: &Series,
    locals: &std::collections::HashSet<Symbol>,
    frame: &crate::frame::FrameRef,
) -> Result<StepOutcome, EvalError> {
    let rebound = bind::rebind_block(body, locals, frame);
    eval_to_end(interp, out, &rebound)
}
