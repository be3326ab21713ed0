//! Apply entry (spec.md §4.4) and redo/tail-retargetting (spec.md §4.5).
//!
//! Both bypass the argument-stack refinement protocol `fulfill.rs` uses for
//! an ordinary call: a path/word call site gathers refinement *words* onto
//! `interp.argstack` before fulfillment ever starts, but `apply` and `redo`
//! are handed their inputs already lined up one-per-parameter-slot (a
//! variadic list, a block, or an old call frame's own argument vector), so
//! there is nothing to scan for. Both still finish through
//! `fulfill::dispatch`, the one place a fulfilled frame is actually run.
//!
//! Grounded on the teacher's `function.rs` `call_with_args` path (building a
//! frame directly from a pre-evaluated argument vector rather than walking
//! expression syntax) for the "no scanning, just positional fill" shape.
//!
//! # Resolved ambiguity: do skipped refinement dependents still consume an input?
//!
//! spec.md §4.4 says a disabled refinement's dependent "is left `Unset`
//! while in skipping mode" but does not say whether the input meant for
//! that slot is consumed or left for the next parameter. Apply's inputs are
//! strictly positional (one slot, one input, pure locals excepted) in every
//! REBOL apply implementation this crate's authors are aware of, so a
//! skipped dependent still consumes — and discards — one input. Treating it
//! as "doesn't consume" would desynchronize every later refinement/argument
//! by one position whenever an earlier refinement is disabled, which no
//! sane calling convention would do.

use std::rc::Rc;

use crate::{
    callframe::{CallFrame, FrameId},
    error::EvalError,
    eval::{self, EvalFlags, StepOutcome},
    fulfill::{self, CallOutcome},
    function::{FunctionBody, FunctionValue, ParamKind},
    interp::Interp,
    value::{Cell, Series, Value, WordValue},
};

fn value_at(source: &Series, index: usize) -> Value {
    source.data.borrow().get(index).cloned().unwrap_or(Value::End)
}

fn source_len(source: &Series) -> usize {
    source.data.borrow().len()
}

/// One input slot's value, plus whether fetching it threw.
enum NextInput {
    Value(Value),
    End,
    Thrown(Value),
}

/// Where `apply_function_*` draws its positional inputs from.
enum Inputs<'a> {
    Variadic(std::slice::Iter<'a, Value>),
    Block { source: &'a Series, index: usize, reduce: bool },
}

impl Inputs<'_> {
    fn next(&mut self, interp: &mut Interp) -> Result<NextInput, EvalError> {
        match self {
            Self::Variadic(iter) => Ok(iter.next().cloned().map_or(NextInput::End, NextInput::Value)),
            Self::Block { source, index, reduce } => {
                if *index >= source_len(source) {
                    return Ok(NextInput::End);
                }
                if *reduce {
                    let mut cell = Cell::unset();
                    match eval::eval_step(interp, &mut cell, source, *index, EvalFlags::step())? {
                        StepOutcome::Thrown => Ok(NextInput::Thrown(cell.value)),
                        StepOutcome::End => Ok(NextInput::End),
                        StepOutcome::Index(next) => {
                            *index = next;
                            Ok(NextInput::Value(cell.value))
                        }
                    }
                } else {
                    let value = value_at(source, *index);
                    *index += 1;
                    Ok(NextInput::Value(value))
                }
            }
        }
    }

    /// Consumes and discards every remaining input, reducing it if this is
    /// the reducing block form — spec.md §4.4's "evaluation of surplus
    /// inputs still proceeds for side-effect correctness before the error
    /// is raised".
    fn drain_for_side_effects(&mut self, interp: &mut Interp) -> Result<Option<Value>, EvalError> {
        loop {
            match self.next(interp)? {
                NextInput::End => return Ok(None),
                NextInput::Thrown(payload) => return Ok(Some(payload)),
                NextInput::Value(_) => {}
            }
        }
    }
}

/// Shared walk used by both apply entry points (spec.md §4.4).
fn fulfill_positionally(interp: &mut Interp, frame: &mut CallFrame, function: &FunctionValue, predicted_frame_id: FrameId, inputs: &mut Inputs<'_>) -> Result<Option<Value>, EvalError> {
    let return_sym = interp.symbols.intern("return");
    let mut skipping = false;

    for (i, param) in function.params.iter().enumerate() {
        if param.hidden {
            if function.has_definitional_return && param.sym == return_sym {
                frame.set_arg(i, fulfill::make_return_native(interp, predicted_frame_id));
            }
            continue;
        }

        match param.kind {
            ParamKind::Refinement => match inputs.next(interp)? {
                NextInput::End => return Err(EvalError::NoArgument),
                NextInput::Thrown(payload) => return Ok(Some(payload)),
                NextInput::Value(value) => {
                    if value.is_conditionally_true() {
                        frame.set_arg(i, Value::Word(WordValue::unbound(param.sym)));
                        skipping = false;
                    } else {
                        frame.set_arg(i, Value::None);
                        skipping = true;
                    }
                }
            },
            ParamKind::Normal => match inputs.next(interp)? {
                NextInput::End => return Err(EvalError::NoArgument),
                NextInput::Thrown(payload) => return Ok(Some(payload)),
                NextInput::Value(value) => {
                    if skipping {
                        frame.set_arg(i, Value::Unset);
                    } else {
                        fulfill::check_type(param, &value)?;
                        frame.set_arg(i, value);
                    }
                }
            },
        }
    }

    Ok(None)
}

/// `apply_function_variadic` (spec.md §4.4, §6): fulfill from an
/// already-evaluated, `nullptr`-terminated argument list.
pub fn apply_function_variadic(interp: &mut Interp, out: &mut Cell, function: Rc<FunctionValue>, args: &[Value]) -> Result<CallOutcome, EvalError> {
    let _guard = interp.enter()?;
    let mark = interp.argstack.mark();
    let caller = interp.frames.current();
    let predicted_frame_id = interp.frames.depth();
    let mut frame = CallFrame::new(Rc::clone(&function), None, Series::empty(), 0, caller);

    let mut inputs = Inputs::Variadic(args.iter());
    if let Some(payload) = fulfill_positionally(interp, &mut frame, &function, predicted_frame_id, &mut inputs)? {
        interp.argstack.reset_to(mark);
        out.set_thrown(payload);
        return Ok(CallOutcome::Thrown);
    }
    if !matches!(inputs.next(interp)?, NextInput::End) {
        return Err(EvalError::ApplyTooMany);
    }

    fulfill::dispatch(interp, out, function, frame, predicted_frame_id, mark, 0)
}

/// `apply_function_block` (spec.md §4.4, §6): fulfill from `block` starting
/// at `index`, optionally reducing (evaluating) each element rather than
/// taking it verbatim.
pub fn apply_function_block(interp: &mut Interp, out: &mut Cell, function: Rc<FunctionValue>, block: &Series, index: usize, reduce: bool) -> Result<CallOutcome, EvalError> {
    let _guard = interp.enter()?;
    let mark = interp.argstack.mark();
    let caller = interp.frames.current();
    let predicted_frame_id = interp.frames.depth();
    let mut frame = CallFrame::new(Rc::clone(&function), None, block.clone(), index, caller);

    let mut inputs = Inputs::Block { source: block, index, reduce };
    if let Some(payload) = fulfill_positionally(interp, &mut frame, &function, predicted_frame_id, &mut inputs)? {
        interp.argstack.reset_to(mark);
        out.set_thrown(payload);
        return Ok(CallOutcome::Thrown);
    }

    let next_index = match &inputs {
        Inputs::Block { index, .. } => *index,
        Inputs::Variadic(_) => unreachable!("constructed as Block above"),
    };
    if !matches!(inputs.next(interp)?, NextInput::End) {
        if let Some(payload) = inputs.drain_for_side_effects(interp)? {
            interp.argstack.reset_to(mark);
            out.set_thrown(payload);
            return Ok(CallOutcome::Thrown);
        }
        return Err(EvalError::ApplyTooMany);
    }

    fulfill::dispatch(interp, out, function, frame, predicted_frame_id, mark, next_index)
}

/// `redo_call` (spec.md §4.5): re-uses the *current* call frame's already-
/// fulfilled arguments to invoke a different function, mapping parameters
/// by position and by refinement symbol match.
pub fn redo_call(interp: &mut Interp, out: &mut Cell, new_function: Rc<FunctionValue>) -> Result<CallOutcome, EvalError> {
    let old_id = interp.frames.current().ok_or(EvalError::BadSystemFunction(Value::Native(Rc::clone(&new_function))))?;
    let old_source = interp.frames.get(old_id).source.clone();
    let old_call_index = interp.frames.get(old_id).call_index;
    let old_caller = interp.frames.get(old_id).caller;
    let old_function = Rc::clone(&interp.frames.get(old_id).function);

    let _guard = interp.enter()?;
    let mark = interp.argstack.mark();
    let predicted_frame_id = interp.frames.depth();
    let mut frame = CallFrame::new(Rc::clone(&new_function), None, old_source, old_call_index, old_caller);

    let return_sym = interp.symbols.intern("return");
    for (i, param) in new_function.params.iter().enumerate() {
        if param.hidden {
            if new_function.has_definitional_return && param.sym == return_sym {
                frame.set_arg(i, fulfill::make_return_native(interp, predicted_frame_id));
            }
            continue;
        }

        match param.kind {
            ParamKind::Refinement => {
                let old_slot = old_function
                    .params
                    .get(i)
                    .filter(|p| p.kind == ParamKind::Refinement && p.sym == param.sym)
                    .map(|_| i)
                    .or_else(|| old_function.refinement_index(param.sym));
                if let Some(old_slot) = old_slot {
                    frame.set_arg(i, interp.frames.get(old_id).arg(old_slot).clone());
                }
            }
            ParamKind::Normal => {
                let matches_shape = old_function
                    .params
                    .get(i)
                    .is_some_and(|old_param| old_param.kind == ParamKind::Normal && old_param.quoted == param.quoted && old_param.evaluates_gets_and_parens == param.evaluates_gets_and_parens);
                if matches_shape {
                    frame.set_arg(i, interp.frames.get(old_id).arg(i).clone());
                }
            }
        }
    }

    fulfill::dispatch(interp, out, new_function, frame, predicted_frame_id, mark, old_call_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{FunctionKind, ParamDesc};
    use crate::types::{TypeSet, ValueKind};

    fn add_function(interp: &mut Interp) -> Rc<FunctionValue> {
        let a = interp.symbols.intern("a");
        let b = interp.symbols.intern("b");
        let handler: crate::function::NativeFn = Rc::new(|_interp, frame, out| {
            let (Value::Integer(a), Value::Integer(b)) = (frame.arg(0).clone(), frame.arg(1).clone()) else {
                return Err(EvalError::BadEvaluationType);
            };
            out.value = Value::Integer(a + b);
            Ok(())
        });
        Rc::new(FunctionValue {
            kind: FunctionKind::Native,
            name: None,
            params: vec![
                ParamDesc::normal(a).with_types(TypeSet::single(ValueKind::Integer)),
                ParamDesc::normal(b).with_types(TypeSet::single(ValueKind::Integer)),
            ],
            body: FunctionBody::Host(handler),
            infix: false,
            has_definitional_return: false,
        })
    }

    #[test]
    fn apply_variadic_matches_direct_call() {
        let mut it = Interp::new();
        let f = add_function(&mut it);
        let mut out = Cell::unset();
        let outcome = apply_function_variadic(&mut it, &mut out, f, &[Value::Integer(2), Value::Integer(3)]).unwrap();
        assert!(matches!(outcome, CallOutcome::Value { .. }));
        assert_eq!(out.value, Value::Integer(5));
    }

    #[test]
    fn apply_variadic_too_few_inputs_fails() {
        let mut it = Interp::new();
        let f = add_function(&mut it);
        let mut out = Cell::unset();
        let err = apply_function_variadic(&mut it, &mut out, f, &[Value::Integer(2)]).unwrap_err();
        assert!(matches!(err, EvalError::NoArgument));
    }

    #[test]
    fn apply_variadic_too_many_inputs_fails() {
        let mut it = Interp::new();
        let f = add_function(&mut it);
        let mut out = Cell::unset();
        let err = apply_function_variadic(&mut it, &mut out, f, &[Value::Integer(2), Value::Integer(3), Value::Integer(4)]).unwrap_err();
        assert!(matches!(err, EvalError::ApplyTooMany));
    }

    #[test]
    fn apply_block_form_reduces_each_element() {
        let mut it = Interp::new();
        let f = add_function(&mut it);
        let x = it.symbols.intern("x");
        it.global.borrow_mut().declare(x, Value::Integer(10));
        let block = Series::new(vec![Value::Word(WordValue::bound(x, it.global.clone())), Value::Integer(1)]);
        let mut out = Cell::unset();
        let outcome = apply_function_block(&mut it, &mut out, f, &block, 0, true).unwrap();
        assert!(matches!(outcome, CallOutcome::Value { .. }));
        assert_eq!(out.value, Value::Integer(11));
    }
}
