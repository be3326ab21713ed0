//! Path evaluation (spec.md §4.3): multi-step navigation and assignment
//! through composite values, including nested expression-in-path and
//! refinement gathering for function dispatch.
//!
//! Grounded on the teacher's `object.rs` (per-kind attribute dispatch
//! table idea) and `expressions.rs` (subscript evaluation), generalized
//! from Python's fixed attribute/subscript protocol to spec.md's per-kind
//! dispatcher table plus the "Ok/Set/None/Bad*" outcome contract.
//!
//! # Simplification from the reference design
//!
//! spec.md's dispatcher contract includes a `UseStore` outcome ("the
//! dispatcher has written the selected value into a caller-provided
//! scratch cell; continue from there") — a cache-avoidance trick for the
//! reference C implementation's cell-reuse allocator. Every value here is
//! already `Clone`-cheap (`Rc`-backed heap payloads), so there is no
//! scratch cell to avoid allocating into; dispatchers just return the next
//! subject by value. This is noted as a deliberate simplification, not a
//! missing feature.

use crate::{
    error::EvalError,
    eval::{self, StepOutcome},
    interp::Interp,
    symbol::Symbol,
    types::ValueKind,
    value::{Cell, Series, Value},
};

/// What a per-kind path dispatcher decided for one step (spec.md §4.3
/// "The dispatcher returns one of").
enum PathStep {
    /// Continue the walk with this value as the new subject.
    Next(Value),
    /// The assignment was performed; the walk ends.
    Set,
    /// The selected sub-value is absent; the walk's result is `None`.
    Absent,
    BadSelect,
    BadSet,
    BadRange,
    BadSetType,
}

/// The outcome of a full path walk (spec.md §6 "`do_path` ... returning an
/// optional label symbol").
pub struct PathResult {
    pub value: Value,
    /// The symbol of the path's first element, if it was a word — used by
    /// `eval.rs` as the call-site label when the result is dispatched.
    pub label: Option<Symbol>,
}

pub enum PathOutcome {
    Value(PathResult),
    Thrown(Value),
}

/// Evaluates `path` (spec.md §4.3).
///
/// - `rhs`: `Some(value)` only for `SetPath` evaluation — assignment is
///   only handed to the *last* step's dispatcher (spec.md "Assigning mode.
///   Only the last-step dispatcher is handed the RHS; earlier steps pass
///   `nil`").
/// - `want_refinements`: true for a plain `Path` evaluated as a
///   call-preparing site (spec.md §4.3 "Call-preparing mode"); false for
///   `GetPath`/`SetPath` (spec.md "non-call mode").
pub fn do_path(
    interp: &mut Interp,
    elems: &Series,
    rhs: Option<Value>,
    want_refinements: bool,
) -> Result<PathOutcome, EvalError> {
    let len = elems.remaining();
    if len == 0 {
        return Err(EvalError::InvalidPath);
    }

    let first = elems.peek(0).expect("checked len above");
    let label = match &first {
        Value::Word(w) => Some(w.sym),
        Value::Paren(_) | Value::GetWord(_) | Value::GetPath(_) => {
            return Err(EvalError::InvalidPath);
        }
        _ => None,
    };

    let mut subject = match &first {
        Value::Word(w) => {
            let binding = w.binding.as_ref().ok_or(EvalError::NotBound(w.sym))?;
            binding.borrow().get(w.sym)?.clone()
        }
        other => other.clone(),
    };

    if len == 1 {
        return Ok(PathOutcome::Value(PathResult { value: subject, label }));
    }

    let mut step = 1usize;
    while step < len {
        if want_refinements && subject.is_function_like() {
            break;
        }

        let element = elems.peek(step).expect("step < len");
        let selector = match &element {
            Value::GetWord(w) => {
                let binding = w.binding.as_ref().ok_or(EvalError::NotBound(w.sym))?;
                binding.borrow().get_raw(w.sym)?.clone()
            }
            Value::Paren(inner) => {
                let mut out = Cell::unset();
                match eval::eval_to_end(interp, &mut out, inner)? {
                    StepOutcome::Thrown => return Ok(PathOutcome::Thrown(out.value)),
                    StepOutcome::Index(_) | StepOutcome::End => out.value,
                }
            }
            other => other.clone(),
        };

        let is_last = step == len - 1;
        let rhs_for_step = if is_last { rhs.as_ref() } else { None };

        if subject.is_function_like() {
            // A non-empty tail reaching here means call-preparing mode was
            // off, or the subject became callable mid-walk in assigning
            // mode — both reserved/erroring per spec.md §4.3 and §12.
            return Err(EvalError::InvalidPath);
        }

        match dispatch(&subject, &selector, rhs_for_step)? {
            PathStep::Next(value) => subject = value,
            PathStep::Set => return Ok(PathOutcome::Value(PathResult { value: rhs.expect("Set implies rhs"), label })),
            PathStep::Absent => return Ok(PathOutcome::Value(PathResult { value: Value::None, label })),
            PathStep::BadSelect => return Err(EvalError::BadPathSelect),
            PathStep::BadSet => return Err(EvalError::BadPathSet),
            PathStep::BadRange => return Err(EvalError::BadRange),
            PathStep::BadSetType => return Err(EvalError::BadFieldSet),
        }
        step += 1;
    }

    if want_refinements && subject.is_function_like() {
        if let GatherOutcome::Thrown(value) = gather_refinements(interp, elems, step)? {
            return Ok(PathOutcome::Thrown(value));
        }
    } else if subject.is_function_like() && step < len {
        // Non-call mode (get-path) ending on a function with tail left:
        // reserved, spec.md §9/§12 — preserve the error behavior.
        return Err(EvalError::InvalidPath);
    }

    Ok(PathOutcome::Value(PathResult { value: subject, label }))
}

/// Looks up the per-kind path dispatcher and invokes it (spec.md §4.3
/// "look up a per-kind 'path dispatcher' in a static table").
fn dispatch(subject: &Value, selector: &Value, rhs: Option<&Value>) -> Result<PathStep, EvalError> {
    match subject.kind() {
        ValueKind::Block | ValueKind::Paren => block_dispatch(subject, selector, rhs),
        ValueKind::Object | ValueKind::Module | ValueKind::Port => object_dispatch(subject, selector, rhs),
        _ => Err(EvalError::BadPathType),
    }
}

/// 1-based indexing into a block/paren series (spec.md's path scenario
/// `p: [a b c] do [p/2]` → `b`).
fn block_dispatch(subject: &Value, selector: &Value, rhs: Option<&Value>) -> Result<PathStep, EvalError> {
    let series = subject.as_series().expect("caller matched Block/Paren");
    let Value::Integer(i) = selector else {
        return Ok(PathStep::BadSelect);
    };
    if *i < 1 {
        return Ok(PathStep::BadRange);
    }
    let offset = (*i - 1) as usize;
    let absolute = series.index + offset;
    let mut data = series.data.borrow_mut();
    if let Some(rhs) = rhs {
        if absolute >= data.len() {
            return Ok(PathStep::BadRange);
        }
        data[absolute] = rhs.clone();
        return Ok(PathStep::Set);
    }
    match data.get(absolute) {
        Some(value) => Ok(PathStep::Next(value.clone())),
        None => Ok(PathStep::Absent),
    }
}

/// Field access/assignment on an object/module/port context (spec.md's
/// path scenario `o: make object! [f: 42] do [o/f]` → `42`).
fn object_dispatch(subject: &Value, selector: &Value, rhs: Option<&Value>) -> Result<PathStep, EvalError> {
    let frame = match subject {
        Value::Object(f) | Value::Module(f) | Value::Port(f) => f,
        _ => unreachable!("caller matched Object/Module/Port"),
    };
    let sym = match selector {
        Value::Word(w) | Value::GetWord(w) | Value::LitWord(w) | Value::SetWord(w) => w.sym,
        _ => return Ok(PathStep::BadSelect),
    };
    if let Some(rhs) = rhs {
        return match frame.borrow_mut().set(sym, rhs.clone()) {
            Ok(()) => Ok(PathStep::Set),
            Err(_) => Ok(PathStep::BadSetType),
        };
    }
    match frame.borrow().get_raw(sym) {
        Ok(value) => Ok(PathStep::Next(value.clone())),
        Err(_) => Ok(PathStep::Absent),
    }
}

/// Whether [`gather_refinements`] ran to completion or a `Paren` selector
/// threw partway through. A throw here must flow back out through
/// [`PathOutcome::Thrown`], never as an [`EvalError`] — throws are never
/// modeled as `Result::Err` anywhere in this crate (SPEC_FULL.md §10.2).
enum GatherOutcome {
    Done,
    Thrown(Value),
}

/// Call-preparing mode's refinement tail (spec.md §4.3).
///
/// Each remaining path element is resolved to a `Word` (case-folding is
/// implicit — symbols are already interned case-insensitively) and pushed
/// onto the argument stack; the accumulated words are then reversed so the
/// fulfiller pops them back in source order.
fn gather_refinements(interp: &mut Interp, elems: &Series, mut step: usize) -> Result<GatherOutcome, EvalError> {
    let len = elems.remaining();
    let mark = interp.argstack.mark();
    while step < len {
        let element = elems.peek(step).expect("step < len");
        let resolved = match element {
            Value::None => {
                step += 1;
                continue;
            }
            Value::Paren(inner) => {
                let mut out = Cell::unset();
                match eval::eval_to_end(interp, &mut out, &inner)? {
                    StepOutcome::Thrown => {
                        interp.argstack.reset_to(mark);
                        return Ok(GatherOutcome::Thrown(out.value));
                    }
                    StepOutcome::Index(_) | StepOutcome::End => out.value,
                }
            }
            Value::GetWord(w) => {
                let binding = w.binding.as_ref().ok_or(EvalError::NotBound(w.sym))?;
                binding.borrow().get_raw(w.sym)?.clone()
            }
            other => other,
        };
        let Value::Word(w) = resolved else {
            interp.argstack.reset_to(mark);
            return Err(EvalError::InvalidPath);
        };
        interp.argstack.push(Value::Word(w));
        step += 1;
    }
    // Reverse in place so the fulfiller's Scanning mode pops refinements
    // back in the order they appeared in the path (spec.md §4.3
    // "the accumulated words on the stack are reversed").
    let mut pushed = interp.argstack.since(mark).to_vec();
    for _ in 0..pushed.len() {
        interp.argstack.pop();
    }
    pushed.reverse();
    for value in pushed {
        interp.argstack.push(value);
    }
    Ok(GatherOutcome::Done)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::WordValue;

    fn interp() -> Interp {
        Interp::new()
    }

    #[test]
    fn block_path_indexes_one_based() {
        let mut it = interp();
        let a = it.symbols.intern("a");
        let b = it.symbols.intern("b");
        let c = it.symbols.intern("c");
        let block = Value::Block(Series::new(vec![Value::Word(WordValue::unbound(a)), Value::Word(WordValue::unbound(b)), Value::Word(WordValue::unbound(c))]));
        let p = it.symbols.intern("p");
        it.global.borrow_mut().declare(p, block);
        let path = Series::new(vec![Value::Word(WordValue::bound(p, it.global.clone())), Value::Integer(2)]);
        let outcome = do_path(&mut it, &path, None, false).unwrap();
        let PathOutcome::Value(result) = outcome else { panic!("expected value") };
        assert_eq!(result.value, Value::Word(WordValue::unbound(b)));
    }

    #[test]
    fn object_field_get_and_set() {
        let mut it = interp();
        let f = it.symbols.intern("f");
        let obj_frame = crate::frame::Frame::new_ref();
        obj_frame.borrow_mut().declare(f, Value::Integer(42));
        let o = it.symbols.intern("o");
        it.global.borrow_mut().declare(o, Value::Object(obj_frame.clone()));
        let path = Series::new(vec![Value::Word(WordValue::bound(o, it.global.clone())), Value::Word(WordValue::unbound(f))]);
        let outcome = do_path(&mut it, &path, None, false).unwrap();
        let PathOutcome::Value(result) = outcome else { panic!("expected value") };
        assert_eq!(result.value, Value::Integer(42));

        let set_path = Series::new(vec![Value::Word(WordValue::bound(o, it.global.clone())), Value::Word(WordValue::unbound(f))]);
        let outcome = do_path(&mut it, &set_path, Some(Value::Integer(7)), false).unwrap();
        let PathOutcome::Value(result) = outcome else { panic!("expected value") };
        assert_eq!(result.value, Value::Integer(7));
        assert_eq!(obj_frame.borrow().get(f).unwrap(), &Value::Integer(7));
    }
}
