//! `reduce` and `compose` (spec.md §6 `reduce_block`/`compose_block`).
//!
//! Both walk a source array left to right, evaluating pieces of it and
//! collecting results into a fresh (or caller-supplied, `/into`-style)
//! block. Grounded on `eval.rs`'s own `eval_to_end` loop shape, generalized
//! from "discard every intermediate value but the last" to "collect every
//! intermediate value".
//!
//! # Set-word-preserving variant
//!
//! Ordinary `reduce` evaluates a bare set-word like any other expression —
//! `reduce [a: 1]` performs the assignment and collects `1`. The
//! preserving variant instead copies a set-word element verbatim without
//! evaluating it as an assignment, while still evaluating everything else
//! the normal way. This is what a parameter-spec block walker needs: a
//! function spec like `[a b: "doc"]` (a refinement-free, annotated spec
//! form) must see `b:` as data describing the next parameter, never as an
//! assignment to perform.

use std::{cell::RefCell, rc::Rc};

use crate::{
    error::EvalError,
    eval::{self, EvalFlags, StepOutcome},
    interp::Interp,
    value::{Cell, Series, Value},
};

fn value_at(source: &Series, index: usize) -> Value {
    source.data.borrow().get(index).cloned().unwrap_or(Value::End)
}

fn source_len(source: &Series) -> usize {
    source.data.borrow().len()
}

/// Outcome of a `reduce`/`compose` pass: both always run their source to
/// completion or stop at a throw (spec.md §6 "THROWN | ok" — there is no
/// partial-index resumption for either).
pub enum ReduceOutcome {
    Done,
    Thrown,
}

/// `reduce_block` (spec.md §6), evaluating every element.
pub fn reduce_block(interp: &mut Interp, out: &mut Cell, source: &Series, index: usize, into: Option<Series>) -> Result<ReduceOutcome, EvalError> {
    reduce_impl(interp, out, source, index, into, false)
}

/// The set-word-preserving variant (see module docs).
pub fn reduce_block_preserving_set_words(interp: &mut Interp, out: &mut Cell, source: &Series, index: usize, into: Option<Series>) -> Result<ReduceOutcome, EvalError> {
    reduce_impl(interp, out, source, index, into, true)
}

fn reduce_impl(interp: &mut Interp, out: &mut Cell, source: &Series, mut index: usize, into: Option<Series>, preserve_set_words: bool) -> Result<ReduceOutcome, EvalError> {
    let results = into.map_or_else(|| Rc::new(RefCell::new(Vec::new())), |s| s.data);
    let len = source_len(source);

    while index < len {
        if preserve_set_words {
            let value = value_at(source, index);
            if matches!(value, Value::SetWord(_)) {
                results.borrow_mut().push(value);
                index += 1;
                continue;
            }
        }

        let mut cell = Cell::unset();
        match eval::eval_step(interp, &mut cell, source, index, EvalFlags::run_to_end())? {
            StepOutcome::Thrown => {
                out.set_thrown(cell.value);
                return Ok(ReduceOutcome::Thrown);
            }
            StepOutcome::End => break,
            StepOutcome::Index(next) => {
                results.borrow_mut().push(cell.value);
                index = next;
            }
        }
    }

    out.value = Value::Block(Series { data: results, index: 0 });
    Ok(ReduceOutcome::Done)
}

/// `compose_block` (spec.md §6, law "`compose [(x)]` with `x` bound to a
/// block equals that block's contents spliced; `compose/only [(x)]`
/// equals a one-element block containing the value of `x`").
///
/// - `deep`: recurse into nested (non-paren) blocks, composing them too,
///   rather than copying them untouched.
/// - `only`: a paren's block-valued result is inserted as a single element
///   rather than spliced.
pub fn compose_block(interp: &mut Interp, out: &mut Cell, source: &Series, deep: bool, only: bool, into: Option<Series>) -> Result<ReduceOutcome, EvalError> {
    let results = into.map_or_else(|| Rc::new(RefCell::new(Vec::new())), |s| s.data);
    if let Some(payload) = compose_into(interp, source, deep, only, &results)? {
        out.set_thrown(payload);
        return Ok(ReduceOutcome::Thrown);
    }
    out.value = Value::Block(Series { data: results, index: 0 });
    Ok(ReduceOutcome::Done)
}

fn compose_into(interp: &mut Interp, source: &Series, deep: bool, only: bool, results: &Rc<RefCell<Vec<Value>>>) -> Result<Option<Value>, EvalError> {
    let len = source_len(source);
    for i in 0..len {
        match value_at(source, i) {
            Value::Paren(inner) => {
                let mut cell = Cell::unset();
                match eval::eval_to_end(interp, &mut cell, &inner)? {
                    StepOutcome::Thrown => return Ok(Some(cell.value)),
                    StepOutcome::End | StepOutcome::Index(_) => {}
                }
                if !only {
                    if let Value::Block(spliced) = &cell.value {
                        results.borrow_mut().extend(spliced.data.borrow().iter().cloned());
                        continue;
                    }
                }
                results.borrow_mut().push(cell.value);
            }
            Value::Block(inner) if deep => {
                let nested = Rc::new(RefCell::new(Vec::new()));
                if let Some(payload) = compose_into(interp, &inner, deep, only, &nested)? {
                    return Ok(Some(payload));
                }
                results.borrow_mut().push(Value::Block(Series { data: nested, index: 0 }));
            }
            other => results.borrow_mut().push(other),
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::WordValue;

    fn block_values(out: &Cell) -> Vec<Value> {
        let Value::Block(s) = &out.value else { panic!("expected block") };
        s.data.borrow().clone()
    }

    #[test]
    fn reduce_of_literals_is_identity() {
        let mut it = Interp::new();
        let source = Series::new(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let mut out = Cell::unset();
        reduce_block(&mut it, &mut out, &source, 0, None).unwrap();
        assert_eq!(block_values(&out), vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
    }

    #[test]
    fn reduce_preserving_set_words_copies_them_verbatim() {
        let mut it = Interp::new();
        let a = it.symbols.intern("a");
        let source = Series::new(vec![Value::SetWord(WordValue::unbound(a)), Value::Integer(1)]);
        let mut out = Cell::unset();
        reduce_block_preserving_set_words(&mut it, &mut out, &source, 0, None).unwrap();
        assert_eq!(block_values(&out), vec![Value::SetWord(WordValue::unbound(a)), Value::Integer(1)]);
        assert!(!it.global.borrow().contains(a));
    }

    #[test]
    fn compose_splices_paren_block_result() {
        let mut it = Interp::new();
        let x = it.symbols.intern("x");
        let inner = Series::new(vec![Value::Integer(1), Value::Integer(2)]);
        it.global.borrow_mut().declare(x, Value::Block(inner));
        let paren_body = Series::new(vec![Value::Word(WordValue::bound(x, it.global.clone()))]);
        let source = Series::new(vec![Value::Paren(paren_body)]);
        let mut out = Cell::unset();
        compose_block(&mut it, &mut out, &source, false, false, None).unwrap();
        assert_eq!(block_values(&out), vec![Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn compose_only_keeps_block_result_as_one_element() {
        let mut it = Interp::new();
        let x = it.symbols.intern("x");
        let inner = Series::new(vec![Value::Integer(1), Value::Integer(2)]);
        it.global.borrow_mut().declare(x, Value::Block(inner.clone()));
        let paren_body = Series::new(vec![Value::Word(WordValue::bound(x, it.global.clone()))]);
        let source = Series::new(vec![Value::Paren(paren_body)]);
        let mut out = Cell::unset();
        compose_block(&mut it, &mut out, &source, false, true, None).unwrap();
        let values = block_values(&out);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0], Value::Block(inner));
    }
}
