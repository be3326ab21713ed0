//! `make object!` (SPEC_FULL.md §11, spec.md §8 scenario: `o: make object!
//! [f: 42]` then `o/f` / `o/f: 7`).
//!
//! The only `make` form this crate implements — general datatype
//! construction is out of scope (spec.md §1). The type argument is taken
//! quoted (a bare word, never evaluated) since this core has no real
//! `object!` datatype value to bind it to; `make` itself only recognizes
//! the literal spelling `object!` and fails on anything else.
//!
//! Grounded on `path.rs`'s `object_dispatch` (field read/write through an
//! already-built [`Frame`]) for what an object *is*; building one here is
//! new, since spec.md leaves object construction itself unspecified beyond
//! "an object's fields are settable through a path" (§4.3).

use std::collections::HashSet;
use std::rc::Rc;

use super::declare;
use crate::{
    bind,
    error::EvalError,
    eval::{self, StepOutcome},
    frame::Frame,
    function::{FunctionBody, FunctionKind, FunctionValue, ParamDesc},
    symbol::Symbol,
    value::{Cell, Series, Value},
};

/// Every top-level set-word in `spec` becomes a field, declared `Unset`
/// before the spec runs (so later fields can reference earlier ones, and
/// self-reference is at least legal to write, if not yet meaningful).
/// Unlike `bind::collect_implicit_locals`, this does not recurse into
/// nested blocks: a literal sub-block in an object spec is data, not a
/// further set of fields.
fn collect_object_fields(spec: &Series) -> Vec<Symbol> {
    let mut fields = Vec::new();
    let mut seen = HashSet::new();
    for value in spec.data.borrow().iter() {
        if let Value::SetWord(w) = value {
            if seen.insert(w.sym) {
                fields.push(w.sym);
            }
        }
    }
    fields
}

pub fn install(interp: &mut crate::interp::Interp) {
    let type_sym = super::sym(interp, "type");
    let spec_sym = super::sym(interp, "spec");
    let object_bang = interp.symbols.intern("object!");

    let handler: crate::function::NativeFn = Rc::new(move |interp, frame, out| {
        let Value::Word(w) = frame.arg(0).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        if w.sym != object_bang {
            return Err(EvalError::BadEvaluationType);
        }
        let Value::Block(spec) = frame.arg(1).clone() else {
            return Err(EvalError::BadEvaluationType);
        };

        let fields = collect_object_fields(&spec);
        let object = Frame::new_ref();
        for sym in &fields {
            object.borrow_mut().declare(*sym, Value::Unset);
        }
        let locals: HashSet<Symbol> = fields.into_iter().collect();
        let rebound = bind::rebind_block(&spec, &locals, &object);

        let mut body_out = Cell::unset();
        match eval::eval_to_end(interp, &mut body_out, &rebound)? {
            StepOutcome::Thrown => {
                out.set_thrown(body_out.value);
                return Ok(());
            }
            StepOutcome::End | StepOutcome::Index(_) => {}
        }

        out.value = Value::Object(object);
        Ok(())
    });

    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("make")),
        params: vec![
            ParamDesc::normal(type_sym).quoted(),
            ParamDesc::normal(spec_sym),
        ],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "make", function);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        fulfill::{self, CallOutcome},
        interp::Interp,
        path,
        value::WordValue,
    };

    #[test]
    fn make_object_declares_fields_and_runs_spec() {
        // make object! [f: 42] => an object whose `f` field reads 42
        let mut it = Interp::new();
        install(&mut it);
        let make_sym = it.symbols.intern("make");
        let object_bang = it.symbols.intern("object!");
        let f = it.symbols.intern("f");

        let spec_block = Series::new(vec![Value::SetWord(WordValue::unbound(f)), Value::Integer(42)]);
        let call_source = Series::new(vec![Value::Word(WordValue::unbound(object_bang)), Value::Block(spec_block)]);

        let make_function = it.global.borrow().get(make_sym).unwrap().as_function().unwrap().clone();
        let mark = it.argstack.mark();
        let mut out = Cell::unset();
        let outcome = fulfill::fulfill_and_call(&mut it, &mut out, make_function, Some(make_sym), &call_source, 0, None, mark).unwrap();
        assert!(matches!(outcome, CallOutcome::Value { .. }));

        let Value::Object(obj) = out.value else { panic!("expected object") };
        assert_eq!(obj.borrow().get(f).unwrap(), &Value::Integer(42));
    }

    #[test]
    fn object_field_is_reachable_through_a_path() {
        // o: make object! [f: 42], then a path `o/f` reads 42 through
        // path.rs's own object dispatcher.
        let mut it = Interp::new();
        install(&mut it);
        let make_sym = it.symbols.intern("make");
        let object_bang = it.symbols.intern("object!");
        let f = it.symbols.intern("f");
        let o = it.symbols.intern("o");

        let spec_block = Series::new(vec![Value::SetWord(WordValue::unbound(f)), Value::Integer(42)]);
        let call_source = Series::new(vec![Value::Word(WordValue::unbound(object_bang)), Value::Block(spec_block)]);
        let make_function = it.global.borrow().get(make_sym).unwrap().as_function().unwrap().clone();
        let mark = it.argstack.mark();
        let mut made = Cell::unset();
        fulfill::fulfill_and_call(&mut it, &mut made, make_function, Some(make_sym), &call_source, 0, None, mark).unwrap();
        it.global.borrow_mut().declare(o, made.value);

        let path_elems = Series::new(vec![Value::Word(WordValue::bound(o, it.global.clone())), Value::Word(WordValue::unbound(f))]);
        match path::do_path(&mut it, &path_elems, None, false).unwrap() {
            path::PathOutcome::Value(result) => assert_eq!(result.value, Value::Integer(42)),
            path::PathOutcome::Thrown(_) => panic!("unexpected throw"),
        }
    }
}
