//! Deep binding: rewriting word occurrences in a block to point at a
//! specific [`Frame`], and collecting the implicit locals a function body
//! introduces via bare set-words.
//!
//! spec.md treats the scanner/loader and the binder it implies as external
//! collaborators (§1); it only specifies the *result* a binder must
//! produce — a `Word`'s `binding` field (§3). This crate has no separate
//! compile/bind pass, so `natives::func` (SPEC_FULL.md §11) performs one
//! here, at call time: each invocation gets a fresh [`Frame`] for its
//! locals, and the body block is deep-cloned with every word matching a
//! local symbol rebound to that frame. Words that aren't local symbols keep
//! whatever binding the reader already gave them (typically the global
//! frame), exactly as a real REBOL bind would leave a free word pointing at
//! its enclosing context.
//!
//! Cloning the block per call (rather than mutating a single shared
//! template) is what makes recursive calls safe: each activation's locals
//! live in their own `Frame`, so nested calls to the same function don't
//! clobber each other's slots.

use std::collections::HashSet;

use crate::{
    frame::FrameRef,
    symbol::Symbol,
    value::{Series, Value, WordValue},
};

/// Walks `body` (recursing into nested blocks and parens) collecting every
/// set-word symbol that is not already in `known`. This is how
/// `natives::func` derives a function's implicit locals: any set-word
/// target in the body that isn't a declared parameter becomes a hidden
/// local (spec.md §3 "Pure local").
pub fn collect_implicit_locals(body: &Series, known: &HashSet<Symbol>) -> Vec<Symbol> {
    let mut found = Vec::new();
    let mut seen: HashSet<Symbol> = known.clone();
    collect_into(body, &mut seen, &mut found);
    found
}

fn collect_into(series: &Series, seen: &mut HashSet<Symbol>, found: &mut Vec<Symbol>) {
    let data = series.data.borrow();
    for value in data.iter() {
        match value {
            Value::SetWord(w) => {
                if seen.insert(w.sym) {
                    found.push(w.sym);
                }
            }
            Value::Block(inner) | Value::Paren(inner) => collect_into(inner, seen, found),
            _ => {}
        }
    }
}

/// Deep-clones `body`, rebinding every `Word`/`GetWord`/`SetWord`/`LitWord`
/// whose symbol is in `locals` to `frame`. Nested blocks and parens are
/// cloned recursively (with fresh backing storage); values of any other
/// kind are cloned shallowly (`Value::clone` is cheap — heap payloads are
/// `Rc`).
///
/// Paths are rebound element-by-element the same way, since a path's first
/// element can itself be a bare word referring to a local (e.g. a
/// recursive call reading its own argument through a path).
#[must_use]
pub fn rebind_block(body: &Series, locals: &HashSet<Symbol>, frame: &FrameRef) -> Series {
    let data = body.data.borrow();
    let rebound: Vec<Value> = data.iter().map(|v| rebind_value(v, locals, frame)).collect();
    drop(data);
    Series {
        data: std::rc::Rc::new(std::cell::RefCell::new(rebound)),
        index: body.index,
    }
}

fn rebind_value(value: &Value, locals: &HashSet<Symbol>, frame: &FrameRef) -> Value {
    match value {
        Value::Word(w) => Value::Word(rebind_word(w, locals, frame)),
        Value::GetWord(w) => Value::GetWord(rebind_word(w, locals, frame)),
        Value::SetWord(w) => Value::SetWord(rebind_word(w, locals, frame)),
        Value::LitWord(w) => Value::LitWord(rebind_word(w, locals, frame)),
        Value::Block(s) => Value::Block(rebind_block(s, locals, frame)),
        Value::Paren(s) => Value::Paren(rebind_block(s, locals, frame)),
        Value::Path(s) => Value::Path(rebind_block(s, locals, frame)),
        Value::GetPath(s) => Value::GetPath(rebind_block(s, locals, frame)),
        Value::SetPath(s) => Value::SetPath(rebind_block(s, locals, frame)),
        Value::LitPath(s) => Value::LitPath(rebind_block(s, locals, frame)),
        other => other.clone(),
    }
}

fn rebind_word(word: &WordValue, locals: &HashSet<Symbol>, frame: &FrameRef) -> WordValue {
    if locals.contains(&word.sym) {
        WordValue::bound(word.sym, FrameRef::clone(frame))
    } else {
        word.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{frame::Frame, symbol::Symbols};

    #[test]
    fn collects_bare_set_words_not_already_known() {
        let mut syms = Symbols::new();
        let a = syms.intern("a");
        let total = syms.intern("total");
        let body = Series::new(vec![
            Value::SetWord(WordValue::unbound(total)),
            Value::Integer(0),
            Value::Word(WordValue::unbound(a)),
        ]);
        let known: HashSet<Symbol> = [a].into_iter().collect();
        let locals = collect_implicit_locals(&body, &known);
        assert_eq!(locals, vec![total]);
    }

    #[test]
    fn rebinds_only_local_symbols() {
        let mut syms = Symbols::new();
        let a = syms.intern("a");
        let other = syms.intern("print");
        let body = Series::new(vec![
            Value::Word(WordValue::unbound(a)),
            Value::Word(WordValue::unbound(other)),
        ]);
        let locals: HashSet<Symbol> = [a].into_iter().collect();
        let frame = Frame::new_ref();
        let rebound = rebind_block(&body, &locals, &frame);
        let data = rebound.data.borrow();
        let Value::Word(w0) = &data[0] else { panic!("expected word") };
        assert!(w0.binding.is_some());
        let Value::Word(w1) = &data[1] else { panic!("expected word") };
        assert!(w1.binding.is_none());
    }
}
