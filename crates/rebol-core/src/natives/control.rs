//! Control-flow and function-construction natives (SPEC_FULL.md §11):
//! `func`, `closure`, `if`, `either`, `catch`, `throw`, `apply`, `do`,
//! `reduce`, `compose`.
//!
//! `func`/`closure` only build a [`FunctionValue`] from a spec block and a
//! body block; they do not themselves bind anything. Every activation's
//! deep bind happens later, once per call, in `fulfill::dispatch` (see
//! `bind.rs`'s module doc) — so a recursive function's nested calls never
//! share locals.
//!
//! Grounded on the teacher's `builtins/*.rs` one-native-per-file shape for
//! the overall layout; the refinement-spec parsing convention (a bare
//! slash-prefixed word in a spec block marks a refinement — see the demo
//! reader) has no teacher counterpart, since the teacher's own function
//! specs are compiled from Python's own grammar, not REBOL's.

use std::rc::Rc;

use super::declare;
use crate::{
    error::EvalError,
    eval::{self, StepOutcome},
    function::{FunctionBody, FunctionKind, FunctionValue, ParamDesc},
    interp::Interp,
    types::{TypeSet, ValueKind},
    value::{Cell, Value},
};

/// Parses a spec block (SPEC_FULL.md §11's minimal form: a flat list of
/// plain words for normal parameters and slash-words for refinements — no
/// type blocks or string doc lines) into a parameter list, appending the
/// synthetic hidden `return` local every `func`/`closure` body gets.
fn parse_spec(interp: &mut Interp, spec: &crate::value::Series) -> Result<Vec<ParamDesc>, EvalError> {
    let mut params = Vec::new();

    for value in spec.data.borrow().iter() {
        let Value::Word(w) = value else {
            return Err(EvalError::BadEvaluationType);
        };
        let text = interp.symbols.name(w.sym).to_string();
        if let Some(name) = text.strip_prefix('/') {
            let refinement_sym = interp.symbols.intern(name);
            params.push(ParamDesc::refinement(refinement_sym));
        } else {
            params.push(ParamDesc::normal(w.sym));
        }
    }

    let return_sym = interp.symbols.intern("return");
    params.push(ParamDesc::local(return_sym));
    Ok(params)
}

fn make_function(interp: &mut Interp, kind: FunctionKind, frame: &mut crate::callframe::CallFrame, out: &mut Cell) -> Result<(), EvalError> {
    let Value::Block(spec) = frame.arg(0).clone() else {
        return Err(EvalError::BadEvaluationType);
    };
    let Value::Block(body) = frame.arg(1).clone() else {
        return Err(EvalError::BadEvaluationType);
    };
    let params = parse_spec(interp, &spec)?;
    out.value = Value::Function(Rc::new(FunctionValue {
        kind,
        name: None,
        params,
        body: FunctionBody::Interpreted(body),
        infix: false,
        has_definitional_return: true,
    }));
    Ok(())
}

fn install_func_like(interp: &mut Interp, name: &str, kind: FunctionKind) {
    let spec_sym = super::sym(interp, "spec");
    let body_sym = super::sym(interp, "body");
    let handler: crate::function::NativeFn = Rc::new(move |interp, frame, out| make_function(interp, kind, frame, out));
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern(name)),
        params: vec![
            ParamDesc::normal(spec_sym).with_types(TypeSet::single(ValueKind::Block)),
            ParamDesc::normal(body_sym).with_types(TypeSet::single(ValueKind::Block)),
        ],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, name, function);
}

pub fn install(interp: &mut Interp) {
    install_func_like(interp, "func", FunctionKind::Function);
    install_func_like(interp, "closure", FunctionKind::Closure);
    install_if(interp);
    install_either(interp);
    install_catch(interp);
    install_throw(interp);
    install_apply(interp);
    install_do(interp);
    install_reduce(interp);
    install_compose(interp);
}

fn install_if(interp: &mut Interp) {
    let condition_sym = super::sym(interp, "condition");
    let body_sym = super::sym(interp, "body");
    let handler: crate::function::NativeFn = Rc::new(|interp, frame, out| {
        let condition = frame.arg(0).clone();
        let Value::Block(body) = frame.arg(1).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        if !condition.is_conditionally_true() {
            out.value = Value::None;
            return Ok(());
        }
        eval::eval_to_end(interp, out, &body)?;
        Ok(())
    });
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("if")),
        params: vec![
            ParamDesc::normal(condition_sym),
            ParamDesc::normal(body_sym).with_types(TypeSet::single(ValueKind::Block)),
        ],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "if", function);
}

fn install_either(interp: &mut Interp) {
    let condition_sym = super::sym(interp, "condition");
    let true_body_sym = super::sym(interp, "true-body");
    let false_body_sym = super::sym(interp, "false-body");
    let handler: crate::function::NativeFn = Rc::new(|interp, frame, out| {
        let condition = frame.arg(0).clone();
        let Value::Block(true_body) = frame.arg(1).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        let Value::Block(false_body) = frame.arg(2).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        let chosen = if condition.is_conditionally_true() { &true_body } else { &false_body };
        eval::eval_to_end(interp, out, chosen)?;
        Ok(())
    });
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("either")),
        params: vec![
            ParamDesc::normal(condition_sym),
            ParamDesc::normal(true_body_sym).with_types(TypeSet::single(ValueKind::Block)),
            ParamDesc::normal(false_body_sym).with_types(TypeSet::single(ValueKind::Block)),
        ],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "either", function);
}

/// `catch` (SPEC_FULL.md §11): runs `body` and, if it unwinds via any
/// throw at all, returns the thrown payload as an ordinary value instead
/// of propagating it further. There is no `/name` filter here — every
/// throw this body produces is caught, a deliberate minimal simplification
/// since spec.md itself only specifies throw *propagation*, never a
/// particular catch's selectivity.
fn install_catch(interp: &mut Interp) {
    let body_sym = super::sym(interp, "body");
    let handler: crate::function::NativeFn = Rc::new(|interp, frame, out| {
        let Value::Block(body) = frame.arg(0).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        match eval::eval_to_end(interp, out, &body)? {
            StepOutcome::Thrown => {
                out.thrown = false;
            }
            StepOutcome::End | StepOutcome::Index(_) => {}
        }
        Ok(())
    });
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("catch")),
        params: vec![ParamDesc::normal(body_sym).with_types(TypeSet::single(ValueKind::Block))],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "catch", function);
}

fn install_throw(interp: &mut Interp) {
    let value_sym = super::sym(interp, "value");
    let handler: crate::function::NativeFn = Rc::new(|_interp, frame, out| {
        out.set_thrown(frame.arg(0).clone());
        Ok(())
    });
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("throw")),
        params: vec![ParamDesc::normal(value_sym)],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "throw", function);
}

fn install_apply(interp: &mut Interp) {
    let fn_sym = super::sym(interp, "fn");
    let args_sym = super::sym(interp, "args");
    let handler: crate::function::NativeFn = Rc::new(|interp, frame, out| {
        let Some(function) = frame.arg(0).as_function().cloned() else {
            return Err(EvalError::BadSystemFunction(frame.arg(0).clone()));
        };
        let Value::Block(args) = frame.arg(1).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        crate::apply::apply_function_block(interp, out, function, &args, 0, true)?;
        Ok(())
    });
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("apply")),
        params: vec![ParamDesc::normal(fn_sym), ParamDesc::normal(args_sym).with_types(TypeSet::single(ValueKind::Block))],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "apply", function);
}

fn install_do(interp: &mut Interp) {
    let body_sym = super::sym(interp, "body");
    let handler: crate::function::NativeFn = Rc::new(|interp, frame, out| {
        let Value::Block(body) = frame.arg(0).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        eval::eval_to_end(interp, out, &body)?;
        Ok(())
    });
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("do")),
        params: vec![ParamDesc::normal(body_sym).with_types(TypeSet::single(ValueKind::Block))],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "do", function);
}

fn install_reduce(interp: &mut Interp) {
    let body_sym = super::sym(interp, "body");
    let handler: crate::function::NativeFn = Rc::new(|interp, frame, out| {
        let Value::Block(body) = frame.arg(0).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        crate::reduce::reduce_block(interp, out, &body, 0, None)?;
        Ok(())
    });
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("reduce")),
        params: vec![ParamDesc::normal(body_sym).with_types(TypeSet::single(ValueKind::Block))],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "reduce", function);
}

fn install_compose(interp: &mut Interp) {
    let body_sym = super::sym(interp, "body");
    let handler: crate::function::NativeFn = Rc::new(|interp, frame, out| {
        let Value::Block(body) = frame.arg(0).clone() else {
            return Err(EvalError::BadEvaluationType);
        };
        crate::reduce::compose_block(interp, out, &body, false, false, None)?;
        Ok(())
    });
    let function = FunctionValue {
        kind: FunctionKind::Native,
        name: Some(interp.symbols.intern("compose")),
        params: vec![ParamDesc::normal(body_sym).with_types(TypeSet::single(ValueKind::Block))],
        body: FunctionBody::Host(handler),
        infix: false,
        has_definitional_return: false,
    };
    declare(interp, "compose", function);
}
