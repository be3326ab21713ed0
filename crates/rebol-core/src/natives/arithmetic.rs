//! Infix arithmetic: `+ - * /` (SPEC_FULL.md §11).
//!
//! Grounded on the teacher's `builtins/*.rs` one-native-per-operation shape;
//! the numeric-promotion rule (integer unless either side is decimal) is the
//! ordinary REBOL arithmetic rule, not a teacher borrowing.

use std::rc::Rc;

use super::declare;
use crate::{
    error::EvalError,
    function::{FunctionBody, FunctionKind, FunctionValue, ParamDesc},
    interp::Interp,
    types::{TypeSet, ValueKind},
    value::Value,
};

fn numeric_types() -> TypeSet {
    TypeSet::single(ValueKind::Integer).with(ValueKind::Decimal)
}

/// Applies `int_op`/`float_op` to a pair of numeric actuals, promoting both
/// to `Decimal` if either side is one.
fn numeric_binop(a: &Value, b: &Value, int_op: impl Fn(i64, i64) -> Option<i64>, float_op: impl Fn(f64, f64) -> f64) -> Result<Value, EvalError> {
    match (a, b) {
        (Value::Integer(a), Value::Integer(b)) => match int_op(*a, *b) {
            Some(result) => Ok(Value::Integer(result)),
            None => Ok(Value::Decimal(float_op(*a as f64, *b as f64))),
        },
        (Value::Integer(a), Value::Decimal(b)) => Ok(Value::Decimal(float_op(*a as f64, *b))),
        (Value::Decimal(a), Value::Integer(b)) => Ok(Value::Decimal(float_op(*a, *b as f64))),
        (Value::Decimal(a), Value::Decimal(b)) => Ok(Value::Decimal(float_op(*a, *b))),
        _ => Err(EvalError::BadEvaluationType),
    }
}

macro_rules! infix_numeric {
    ($interp:expr, $name:expr, $int_op:expr, $float_op:expr) => {{
        let a = super::sym($interp, "a");
        let b = super::sym($interp, "b");
        let handler: crate::function::NativeFn = Rc::new(move |_interp, frame, out| {
            out.value = numeric_binop(frame.arg(0), frame.arg(1), $int_op, $float_op)?;
            Ok(())
        });
        let function = FunctionValue {
            kind: FunctionKind::Native,
            name: None,
            params: vec![ParamDesc::normal(a).with_types(numeric_types()), ParamDesc::normal(b).with_types(numeric_types())],
            body: FunctionBody::Host(handler),
            infix: true,
            has_definitional_return: false,
        };
        declare($interp, $name, function);
    }};
}

pub fn install(interp: &mut Interp) {
    infix_numeric!(interp, "+", |a: i64, b: i64| a.checked_add(b), |a: f64, b: f64| a + b);
    infix_numeric!(interp, "-", |a: i64, b: i64| a.checked_sub(b), |a: f64, b: f64| a - b);
    infix_numeric!(interp, "*", |a: i64, b: i64| a.checked_mul(b), |a: f64, b: f64| a * b);
    infix_numeric!(interp, "/", |a: i64, b: i64| if b == 0 { None } else if a % b == 0 { a.checked_div(b) } else { None }, |a: f64, b: f64| a / b);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        eval::{self, EvalFlags},
        value::{Cell, Series, WordValue},
    };

    #[test]
    fn strict_left_to_right_infix_chaining() {
        // `1 + 2 * 3` => 9: `1 + 2` binds first, then its result feeds `* 3`.
        let mut it = Interp::new();
        install(&mut it);
        let plus = it.symbols.intern("+");
        let star = it.symbols.intern("*");
        let source = Series::new(vec![
            Value::Integer(1),
            Value::Word(WordValue::bound(plus, it.global.clone())),
            Value::Integer(2),
            Value::Word(WordValue::bound(star, it.global.clone())),
            Value::Integer(3),
        ]);
        let mut out = Cell::unset();
        eval::eval_step(&mut it, &mut out, &source, 0, EvalFlags::run_to_end()).unwrap();
        assert_eq!(out.value, Value::Integer(9));
    }
}
