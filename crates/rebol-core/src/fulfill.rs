//! The argument fulfiller (spec.md §4.2): the per-call state machine that
//! walks a function's formal parameter list in definition order while
//! servicing refinements requested (via the argument stack) in any order,
//! then dispatches the call.
//!
//! Grounded on the teacher's `signature.rs` (`Signature::bind`'s fast/slow
//! path split between a purely-positional walk and a named-parameter
//! rescan) for the overall "walk forward, restart-scan on a late match"
//! shape; the refinement vocabulary itself (enabled/dependent/revoke) has
//! no counterpart in the teacher and is built directly from spec.md §4.2's
//! mode table.

use std::{collections::HashSet, rc::Rc};

use crate::{
    argstack::StackMark,
    callframe::{CallFrame, FrameId},
    error::EvalError,
    eval::{self, EvalFlags, StepOutcome},
    frame::Frame,
    function::{FunctionBody, FunctionKind, FunctionValue, ParamDesc, ParamKind},
    interp::Interp,
    symbol::Symbol,
    value::{Cell, Series, Value, WordValue},
};

/// The fulfiller's phase register (spec.md §4.2's mode table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    RefinePending,
    RefineArgs,
    Scanning,
    Skipping,
    Revoking,
}

/// Outcome of a completed call (spec.md §6 `eval_step`'s contract, folded
/// into the fulfiller's own return type since it owns both argument
/// consumption and dispatch).
pub enum CallOutcome {
    /// `out` holds the result; evaluation should resume at `next_index`.
    Value { next_index: usize },
    /// `out`'s `thrown` bit is set.
    Thrown,
}

fn value_at(source: &Series, index: usize) -> Value {
    source.data.borrow().get(index).cloned().unwrap_or(Value::End)
}

fn source_len(source: &Series) -> usize {
    source.data.borrow().len()
}

pub(crate) fn check_type(param: &ParamDesc, value: &Value) -> Result<(), EvalError> {
    if param.types.accepts_any() || param.types.contains(value.kind()) {
        Ok(())
    } else {
        Err(EvalError::TypeMismatch {
            expected: param.types,
            found: value.clone(),
        })
    }
}

fn matches_refinement(top: Option<&Value>, sym: Symbol) -> bool {
    matches!(top, Some(Value::Word(w)) if w.sym == sym)
}

/// Builds the synthetic `return` native bound to `target_frame` (spec.md
/// §4.2 rule 1, §9 "Magic definitional return"): calling it throws a
/// [`Value::ReturnSignal`] that only the dispatch step running
/// `target_frame` will unwrap back into a plain value; every intermediate
/// frame forwards it untouched.
pub(crate) fn make_return_native(interp: &mut Interp, target_frame: FrameId) -> Value {
    let value_sym = interp.symbols.intern("value");
    let return_sym = interp.symbols.intern("return");
    let handler: crate::function::NativeFn = Rc::new(move |_interp: &mut Interp, frame: &mut CallFrame, out: &mut Cell| {
        let value = frame.arg(0).clone();
        out.set_thrown(Value::ReturnSignal(target_frame, Box::new(value)));
        Ok(())
    });
    Value::Native(Rc::new(FunctionValue {
        kind: FunctionKind::Native,
        name: Some(return_sym),
        params: vec![ParamDesc::normal(value_sym)],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    }))
}

/// Fulfills `function`'s parameter list from `source` starting at
/// `start_index`, reading any requested refinements off `interp.argstack`,
/// then dispatches the call (spec.md §4.2 in full).
///
/// `infix_lhs`, when present, is the value already produced immediately to
/// the left of the call site (spec.md's "Pre-pass for infix"): it fills
/// parameter 0 directly rather than being read from `source`.
///
/// `mark` must be the argument-stack depth recorded by the *caller* before
/// any refinement words for this call were pushed (the path walker's
/// call-preparing mode pushes them onto `interp.argstack` before this
/// function is ever reached — spec.md §4.3). Taking `interp.argstack.mark()`
/// in here, after those pushes, would make `since(mark)` see an empty slice
/// on every call and silently drop every requested refinement.
pub fn fulfill_and_call(
    interp: &mut Interp,
    out: &mut Cell,
    function: Rc<FunctionValue>,
    label: Option<Symbol>,
    source: &Series,
    start_index: usize,
    infix_lhs: Option<Value>,
    mark: StackMark,
) -> Result<CallOutcome, EvalError> {
    let _guard = interp.enter()?;
    let caller = interp.frames.current();
    let predicted_frame_id: FrameId = interp.frames.depth();

    let mut frame = CallFrame::new(Rc::clone(&function), label, source.clone(), start_index, caller);
    let mut index = start_index;

    let mut start_param = 0usize;
    if let Some(lhs) = infix_lhs {
        let p0 = function.params.first().ok_or_else(|| EvalError::BadSystemFunction(Value::Native(Rc::clone(&function))))?;
        check_type(p0, &lhs)?;
        frame.set_arg(0, lhs);
        start_param = 1;
    }

    let return_sym = interp.symbols.intern("return");

    let mut first_pass = true;
    'restart: loop {
        // The first walk fills normal parameters as it goes; a restart
        // (spec.md §4.2 "Post-walk") exists only to locate a refinement
        // listed earlier in the spec than one already serviced, so it must
        // begin in `Scanning` — starting it in `Normal` would re-run
        // `fill_evaluated` over already-filled slots and re-consume source.
        let mut mode = if first_pass { Mode::Normal } else { Mode::Scanning };
        first_pass = false;
        let mut refinement_slot: Option<usize> = None;
        let mut param_i = start_param;

        while param_i < function.params.len() {
            let param = function.params[param_i].clone();

            if param.hidden {
                if function.has_definitional_return && param.sym == return_sym {
                    let return_native = make_return_native(interp, predicted_frame_id);
                    frame.set_arg(param_i, return_native);
                }
                param_i += 1;
                continue;
            }

            match param.kind {
                ParamKind::Refinement => {
                    if mode == Mode::Scanning {
                        if matches_refinement(interp.argstack.peek(), param.sym) {
                            interp.argstack.pop();
                            frame.set_arg(param_i, Value::Word(WordValue::unbound(param.sym)));
                            mode = Mode::RefinePending;
                            refinement_slot = Some(param_i);
                        }
                        // Otherwise keep scanning; dependents under a
                        // not-yet-matched refinement are left untouched
                        // (rule 4) until this loop reaches the match.
                    } else if interp.argstack.since(mark).is_empty() {
                        mode = Mode::Skipping;
                    } else if matches_refinement(interp.argstack.peek(), param.sym) {
                        interp.argstack.pop();
                        frame.set_arg(param_i, Value::Word(WordValue::unbound(param.sym)));
                        mode = Mode::RefinePending;
                        refinement_slot = Some(param_i);
                    } else {
                        mode = Mode::Scanning;
                        param_i = start_param;
                        continue;
                    }
                }

                ParamKind::Normal => match mode {
                    Mode::Skipping | Mode::Scanning => {}
                    _ => {
                        let value = if param.quoted {
                            fill_quoted(interp, &param, source, &mut index)?
                        } else {
                            fill_evaluated(interp, &function, source, &mut index)?
                        };
                        let value = match value {
                            FillResult::Value(v) => v,
                            FillResult::Thrown(payload) => {
                                interp.argstack.reset_to(mark);
                                out.set_thrown(payload);
                                return Ok(CallOutcome::Thrown);
                            }
                        };

                        if matches!(value, Value::Unset) {
                            match mode {
                                Mode::RefineArgs => return Err(EvalError::BadRefineRevoke),
                                Mode::RefinePending => {
                                    mode = Mode::Revoking;
                                    if let Some(slot) = refinement_slot {
                                        frame.set_arg(slot, Value::None);
                                    }
                                }
                                Mode::Revoking => {}
                                _ => {}
                            }
                            frame.set_arg(param_i, value);
                        } else {
                            match mode {
                                Mode::RefinePending => mode = Mode::RefineArgs,
                                Mode::Revoking => return Err(EvalError::BadRefineRevoke),
                                _ => {}
                            }
                            check_type(&param, &value)?;
                            frame.set_arg(param_i, value);
                        }
                    }
                },
            }

            param_i += 1;
        }

        if mode == Mode::Scanning {
            let sym = match interp.argstack.peek() {
                Some(Value::Word(w)) => w.sym,
                _ => panic!("fulfiller: scanning ended with no pending refinement word on the argument stack"),
            };
            interp.argstack.reset_to(mark);
            return Err(EvalError::BadRefinement(sym));
        }

        if !interp.argstack.since(mark).is_empty() {
            continue 'restart;
        }

        break;
    }

    // A refinement that was never matched against the argument stack is
    // left at its pre-initialized `Unset` by the walk above — but spec.md
    // §3 and its own worked scenario (§8 #5: `foo: func [a /b c] [reduce
    // [a b c]] foo 1` => `[1 #[none] #[unset]]`) both settle on a
    // disabled refinement's *own* slot reading as `None`, not `Unset`
    // (reserving `Unset` for its never-filled dependents). A slot can only
    // be known "never serviced" once the whole walk is done and the
    // argument stack is back to its pre-call depth, so this is a final
    // pass rather than something the per-parameter walk above can decide
    // in place.
    for (i, param) in function.params.iter().enumerate() {
        if param.kind == ParamKind::Refinement && matches!(frame.arg(i), Value::Unset) {
            frame.set_arg(i, Value::None);
        }
    }

    dispatch(interp, out, function, frame, predicted_frame_id, mark, index)
}

enum FillResult {
    Value(Value),
    Thrown(Value),
}

fn fill_quoted(interp: &mut Interp, param: &ParamDesc, source: &Series, index: &mut usize) -> Result<FillResult, EvalError> {
    if *index >= source_len(source) {
        return Ok(FillResult::Value(Value::Unset));
    }
    let next_value = value_at(source, *index);
    let evaluate_anyway = param.evaluates_gets_and_parens && matches!(next_value, Value::Paren(_) | Value::GetWord(_) | Value::GetPath(_));
    if evaluate_anyway {
        let mut cell = Cell::unset();
        match eval::eval_step(interp, &mut cell, source, *index, EvalFlags::step())? {
            StepOutcome::Thrown => Ok(FillResult::Thrown(cell.value)),
            StepOutcome::End => Ok(FillResult::Value(Value::Unset)),
            StepOutcome::Index(next) => {
                *index = next;
                Ok(FillResult::Value(cell.value))
            }
        }
    } else {
        *index += 1;
        Ok(FillResult::Value(next_value))
    }
}

fn fill_evaluated(interp: &mut Interp, function: &FunctionValue, source: &Series, index: &mut usize) -> Result<FillResult, EvalError> {
    let flags = if function.infix { EvalFlags::step().suppress_lookahead() } else { EvalFlags::step() };
    let mut cell = Cell::unset();
    match eval::eval_step(interp, &mut cell, source, *index, flags)? {
        StepOutcome::Thrown => Ok(FillResult::Thrown(cell.value)),
        StepOutcome::End => Ok(FillResult::Value(Value::Unset)),
        StepOutcome::Index(next) => {
            *index = next;
            Ok(FillResult::Value(cell.value))
        }
    }
}

/// Installs the fulfilled frame as current and invokes the body (spec.md
/// §4.2 "Dispatch"). Shared with `apply.rs`, whose two entry points and
/// `redo_call` fulfill their frames by an entirely different protocol but
/// dispatch identically once every slot is set.
pub(crate) fn dispatch(
    interp: &mut Interp,
    out: &mut Cell,
    function: Rc<FunctionValue>,
    frame: CallFrame,
    predicted_frame_id: FrameId,
    mark: crate::argstack::StackMark,
    next_index: usize,
) -> Result<CallOutcome, EvalError> {
    match &function.body {
        FunctionBody::Interpreted(body) => {
            let body = body.clone();
            let frame_id = interp.frames.push(frame);
            debug_assert_eq!(frame_id, predicted_frame_id, "call frame arena depth drifted between fulfillment and dispatch");
            let previous_current = interp.frames.make_current(frame_id);
            interp.tracer.on_call_push(function.name, frame_id);

            let args = interp.frames.get(frame_id).args.clone();
            let locals = Frame::new_ref();
            let mut local_syms: HashSet<Symbol> = HashSet::new();
            for (param, value) in function.params.iter().zip(args) {
                locals.borrow_mut().declare(param.sym, value);
                local_syms.insert(param.sym);
            }
            for sym in crate::bind::collect_implicit_locals(&body, &local_syms) {
                locals.borrow_mut().declare(sym, Value::Unset);
                local_syms.insert(sym);
            }

            let mut body_out = Cell::unset();
            let step_result = eval::run_interpreted_body(interp, &mut body_out, &body, &local_syms, &locals);

            interp.frames.restore_current(previous_current);
            interp.tracer.on_call_pop(frame_id);
            interp.frames.pop(frame_id);

            match step_result? {
                StepOutcome::Thrown => {
                    if let Value::ReturnSignal(target, payload) = &body_out.value {
                        if *target == frame_id {
                            interp.argstack.reset_to(mark);
                            out.value = (**payload).clone();
                            return Ok(CallOutcome::Value { next_index });
                        }
                    }
                    interp.tracer.on_thrown(&body_out.value);
                    interp.argstack.reset_to(mark);
                    out.set_thrown(body_out.value);
                    Ok(CallOutcome::Thrown)
                }
                StepOutcome::End | StepOutcome::Index(_) => {
                    interp.argstack.assert_balanced(mark);
                    out.value = body_out.value;
                    Ok(CallOutcome::Value { next_index })
                }
            }
        }

        FunctionBody::Host(native) => {
            let native = Rc::clone(native);
            let mut frame = frame;
            let mut body_out = Cell::unset();
            native(interp, &mut frame, &mut body_out)?;
            if body_out.thrown {
                interp.tracer.on_thrown(&body_out.value);
                interp.argstack.reset_to(mark);
                out.set_thrown(body_out.value);
                Ok(CallOutcome::Thrown)
            } else {
                interp.argstack.assert_balanced(mark);
                out.value = body_out.value;
                Ok(CallOutcome::Value { next_index })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        frame::Frame,
        types::{TypeSet, ValueKind},
        value::WordValue,
    };

    fn plus_native(interp: &mut Interp) -> Rc<FunctionValue> {
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
            name: Some(interp.symbols.intern("+")),
            params: vec![
                ParamDesc::normal(a).with_types(TypeSet::single(ValueKind::Integer)),
                ParamDesc::normal(b).with_types(TypeSet::single(ValueKind::Integer)),
            ],
            body: FunctionBody::Host(handler),
            infix: true,
            has_definitional_return: false,
        })
    }

    #[test]
    fn infix_prepass_fills_slot_zero_from_lhs() {
        let mut it = Interp::new();
        let function = plus_native(&mut it);
        let source = Series::new(vec![Value::Integer(2)]);
        let mark = it.argstack.mark();
        let mut out = Cell::unset();
        let outcome = fulfill_and_call(&mut it, &mut out, function, None, &source, 0, Some(Value::Integer(1)), mark).unwrap();
        let CallOutcome::Value { next_index } = outcome else { panic!("expected value") };
        assert_eq!(next_index, 1);
        assert_eq!(out.value, Value::Integer(3));
    }

    #[test]
    fn out_of_order_refinement_is_found_by_restart_scan() {
        let mut it = Interp::new();
        let a = it.symbols.intern("a");
        let b_ref = it.symbols.intern("b");
        let c = it.symbols.intern("c");
        let d_ref = it.symbols.intern("d");
        let e = it.symbols.intern("e");
        let handler: crate::function::NativeFn = Rc::new(|_interp, frame, out| {
            out.value = frame.arg(2).clone(); // report /d's dependent
            Ok(())
        });
        let function = Rc::new(FunctionValue {
            kind: FunctionKind::Native,
            name: None,
            params: vec![
                ParamDesc::normal(a),
                ParamDesc::refinement(b_ref),
                ParamDesc::normal(c),
                ParamDesc::refinement(d_ref),
                ParamDesc::normal(e),
            ],
            body: FunctionBody::Host(handler),
            infix: false,
            has_definitional_return: false,
        });
        // request /d only, pushed as the path walker would (reversed to
        // source order beforehand — a single refinement needs no reversal).
        // The mark must be recorded *before* this push, the same way
        // `eval.rs`'s `Path` case records it before calling `do_path`.
        let mark = it.argstack.mark();
        it.argstack.push(Value::Word(WordValue::unbound(d_ref)));
        let source = Series::new(vec![Value::Integer(1), Value::Integer(99)]);
        let mut out = Cell::unset();
        let outcome = fulfill_and_call(&mut it, &mut out, function, None, &source, 0, None, mark).unwrap();
        let CallOutcome::Value { .. } = outcome else { panic!("expected value") };
        assert_eq!(out.value, Value::Integer(99));
    }
}
