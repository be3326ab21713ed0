//! Evaluation failures.
//!
//! `spec.md` §7 draws three lines this module has to respect:
//!
//! - A **fail** (bad-path, arity mismatch, unbound word, wrong type, ...)
//!   is recoverable control flow: it propagates as a normal `Result::Err`
//!   through `?`, same as the teacher's `RunError`.
//! - A **throw** (`catch`/`throw`, `break`, `return`, `exit`) is not a
//!   `Result::Err` at all — it rides the output [`crate::value::Cell`]'s
//!   `thrown` bit, because unlike a fail it carries a value that keeps
//!   flowing through ordinary data positions (a caller can catch it,
//!   inspect the payload, and hand it right back to the caller above).
//!   Modeling it as `Err` would mean every throw site allocates an
//!   `EvalError` variant just to immediately unwrap it back into a value.
//! - An invariant violation (call-frame arena corruption, the argument
//!   stack unbalanced on return, an internal `Frame` value reaching value
//!   dispatch) is a bug in this crate, not a reportable condition: it
//!   panics, per spec.md §7's "must panic, not return an error".
//!
//! Grounded on the teacher's `exception_private.rs`/`repl_error.rs`: a
//! hand-written enum with manual `Display`/`std::error::Error`, no
//! `thiserror`/`anyhow` — the teacher carries neither crate, and nothing
//! else in the transform needs them either.

use std::fmt;

use crate::{symbol::Symbol, types::TypeSet, value::Value};

/// A recoverable evaluation failure (spec.md §7's error-kind list; names
/// there are explicitly "semantic, not identifiers", so this enum's
/// variant names are chosen for clarity rather than copied verbatim).
#[derive(Debug, Clone)]
pub enum EvalError {
    /// *unbound word* / *not bound*: a word has no binding in scope, or a
    /// set-word's target was never declared in the frame it resolves to.
    NotBound(Symbol),
    /// *no value*: a word is bound, but its slot currently holds `Unset`.
    NoValue(Symbol),
    /// *need value*: the right-hand side of an assignment evaluated to
    /// `Unset` because evaluation ran off the end of the array.
    NeedValue,
    /// *no operator argument*: an infix-marked function was met outside
    /// lookahead position.
    NoOperatorArgument,
    /// *invalid path*: a path is malformed at position 0 (a `Paren`,
    /// `GetWord`, or `GetPath` first element), or a set-path's walk ended
    /// somewhere that cannot accept assignment, or a get-path with a
    /// non-empty refinement tail ended on a function (spec.md §12 / §4.3
    /// "Non-call mode for get-path").
    InvalidPath,
    /// *bad path type*: the current subject's kind has no registered path
    /// dispatcher.
    BadPathType,
    /// *bad path set* / *bad field set* / *bad range*: the dispatcher
    /// rejected the selector or the assignment at this step.
    BadPathSelect,
    BadPathSet,
    BadFieldSet,
    BadRange,
    /// *bad refinement*: a path or direct call named a refinement the
    /// callee's signature does not declare, or the fulfiller's post-walk
    /// scan never found the requested refinement.
    BadRefinement(Symbol),
    /// *bad refine revoke*: an enabled refinement's dependent arrived as
    /// `Unset` after a later dependent had already been filled, or a
    /// non-`Unset` value arrived after revocation began.
    BadRefineRevoke,
    /// *no refinement*: reserved for a dispatcher-level "refinement named
    /// but argument slot missing" condition distinct from `BadRefinement`.
    NoRefinement(Symbol),
    /// *too many refinements*: more refinement words were pushed for a
    /// call than the callee declares.
    TooManyRefinements,
    /// *wrong argument type*: an actual argument's runtime kind is not in
    /// its parameter's accepted-types set.
    TypeMismatch { expected: TypeSet, found: Value },
    /// *no argument*: an `apply` input ran out before a required
    /// parameter was filled.
    NoArgument,
    /// *apply too many*: more inputs were supplied to `apply` than the
    /// function's parameter list has room for.
    ApplyTooMany,
    /// *bad system function*: `redo_call`/apply targeted something that
    /// isn't a function-like value.
    BadSystemFunction(Value),
    /// *bad evaluation type*: the evaluator's dispatcher reached an
    /// internal-only kind (`Frame`) that must never appear in source.
    ///
    /// This is listed in spec.md §7 alongside the other raisable kinds,
    /// but spec.md §4.1 also calls the same condition "a fatal invariant
    /// violation" — this crate treats genuinely internal-kind leakage as
    /// a `panic!` (see `eval.rs`) and reserves this variant for the
    /// user-reachable case: a native explicitly handed a non-evaluable
    /// value where it expected something classifiable.
    BadEvaluationType,
    /// *halt*: an asynchronous halt/escape signal was serviced at a
    /// signal-poll point (spec.md §4.1 "Signal polling").
    Halt,
    /// *stack overflow*: recursion depth reached its configured limit on
    /// entry to `eval_step` (spec.md §4.1 "Stack-overflow check").
    StackOverflow,
    /// A first-class error value (spec.md §3 "Error(record)") raised
    /// directly by a native via `make error!` or similar, rather than by
    /// one of the structured kinds above.
    User(Value),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotBound(sym) => write!(f, "word is not bound: symbol #{}", sym.index()),
            Self::NoValue(sym) => write!(f, "word has no value: symbol #{}", sym.index()),
            Self::NeedValue => write!(f, "right-hand side of assignment needs a value"),
            Self::NoOperatorArgument => write!(f, "infix operator used without a left argument"),
            Self::InvalidPath => write!(f, "invalid path"),
            Self::BadPathType => write!(f, "cannot use path on this value type"),
            Self::BadPathSelect => write!(f, "cannot select from path"),
            Self::BadPathSet => write!(f, "cannot set path"),
            Self::BadFieldSet => write!(f, "cannot set this field"),
            Self::BadRange => write!(f, "path index out of range"),
            Self::BadRefinement(sym) => write!(f, "no such refinement: symbol #{}", sym.index()),
            Self::BadRefineRevoke => write!(f, "bad refinement revocation"),
            Self::NoRefinement(sym) => write!(f, "refinement not found: symbol #{}", sym.index()),
            Self::TooManyRefinements => write!(f, "too many refinements"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "expected type in [{expected}], found {}", found.kind())
            }
            Self::NoArgument => write!(f, "missing required argument"),
            Self::ApplyTooMany => write!(f, "too many arguments to apply"),
            Self::BadSystemFunction(value) => write!(f, "not a function: {}", value.kind()),
            Self::BadEvaluationType => write!(f, "internal value reached evaluation"),
            Self::Halt => write!(f, "halted"),
            Self::StackOverflow => write!(f, "stack overflow"),
            Self::User(value) => write!(f, "{value}"),
        }
    }
}

impl std::error::Error for EvalError {}

/// A first-class error value (spec.md §3's `Error(record)`), the payload
/// carried by `Value::Error` and by a throw whose `catch` asked for
/// `/name error!`.
///
/// Kept deliberately small: the full REBOL error object (id/type/arg1..3/
/// near/where) is part of the out-of-scope native/datatype layer (spec.md
/// §1); this crate only needs enough structure to round-trip an
/// `EvalError` through `catch`/`try` and to let a native raise one.
#[derive(Debug)]
pub struct ErrorValue {
    pub category: &'static str,
    pub message: String,
}

impl ErrorValue {
    #[must_use]
    pub fn from_eval_error(err: &EvalError) -> Self {
        let category = match err {
            EvalError::Halt => "halt",
            EvalError::StackOverflow => "internal",
            EvalError::User(_) => "user",
            _ => "script",
        };
        Self {
            category,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "** {} error: {}", self.category, self.message)
    }
}
