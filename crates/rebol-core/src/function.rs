//! Function values: parameter lists, refinement descriptors, and bodies
//! (spec.md §3 "Function value").
//!
//! Grounded on the teacher's `function.rs` (a function value as metadata +
//! a body reference) and `signature.rs` (the shape of a parameter
//! descriptor, doc style for per-field invariants). The teacher's version
//! carries namespace-slot layout and closure-cell bookkeeping for a
//! compiled bytecode VM; none of that survives here, since this core has
//! no compilation pass — a call frame's locals are built straight from the
//! parameter list at fulfillment time (see `fulfill.rs`).

use std::rc::Rc;

use crate::{callframe::CallFrame, error::EvalError, interp::Interp, symbol::Symbol, types::TypeSet, value::{Cell, Series}};

/// Whether a parameter descriptor names an ordinary argument or a
/// refinement (spec.md §3: "refinement descriptors interleaved with
/// normal parameters").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Normal,
    /// A named option group. Its own slot holds `Unset` (absent) or a
    /// word-value naming itself (enabled); the parameters immediately
    /// following it in the list, up to the next refinement or the list's
    /// end, are its dependents.
    Refinement,
}

/// One formal parameter (spec.md §3's parameter descriptor).
#[derive(Debug, Clone)]
pub struct ParamDesc {
    pub sym: Symbol,
    pub kind: ParamKind,
    /// Accepted-types set; `TypeSet::EMPTY` means "any type" (spec.md §3
    /// calls this an "accepted-types set" without mandating non-empty).
    pub types: TypeSet,
    /// *quoted*: don't evaluate the actual argument, take it from the
    /// source array verbatim (spec.md §4.2 rule 5).
    pub quoted: bool,
    /// *evaluates-parens-and-gets*: when `quoted` is set, still evaluate a
    /// `Paren`, `GetWord`, or `GetPath` actual rather than taking it
    /// literally.
    pub evaluates_gets_and_parens: bool,
    /// *hidden*: a pure local — never filled from caller input, always
    /// starts `Unset` (spec.md §4.2 rule 1), except the synthetic `RETURN`
    /// slot on a function with definitional return.
    pub hidden: bool,
}

impl ParamDesc {
    #[must_use]
    pub fn normal(sym: Symbol) -> Self {
        Self {
            sym,
            kind: ParamKind::Normal,
            types: TypeSet::EMPTY,
            quoted: false,
            evaluates_gets_and_parens: false,
            hidden: false,
        }
    }

    #[must_use]
    pub fn refinement(sym: Symbol) -> Self {
        Self {
            sym,
            kind: ParamKind::Refinement,
            types: TypeSet::EMPTY,
            quoted: false,
            evaluates_gets_and_parens: false,
            hidden: false,
        }
    }

    #[must_use]
    pub fn local(sym: Symbol) -> Self {
        Self {
            hidden: true,
            ..Self::normal(sym)
        }
    }

    #[must_use]
    pub fn with_types(mut self, types: TypeSet) -> Self {
        self.types = types;
        self
    }

    #[must_use]
    pub fn quoted(mut self) -> Self {
        self.quoted = true;
        self
    }

    #[must_use]
    pub fn evaluating_gets_and_parens(mut self) -> Self {
        self.evaluates_gets_and_parens = true;
        self
    }
}

/// Which of the function-like kinds this value is (spec.md §3's `Function`
/// / `Native` / `Action` / `Closure` / `Command` / `Routine` family — all
/// dispatched identically at the fulfillment level, per §4.2 "Dispatch").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Function,
    Native,
    Action,
    Closure,
    Command,
    Routine,
}

/// Handler invoked once a native-family call frame is fully fulfilled.
///
/// Writes its result into `out` and returns `Ok(())`, setting `out.thrown`
/// itself for a throw (`throw`, `return`, `break`, ...); returns `Err` for
/// a recoverable fail. Mirrors spec.md §4.2's "the handler writes the
/// return value into the output cell" plus §6's "a handler taking the
/// current call frame and returning `bool` thrown", folded into a single
/// `Result` + `Cell::thrown` rather than a second out-parameter.
pub type NativeFn = Rc<dyn Fn(&mut Interp, &mut CallFrame, &mut Cell) -> Result<(), EvalError>>;

/// Where a function's body lives (spec.md §3: "a body reference ... or a
/// handler reference").
#[derive(Clone)]
pub enum FunctionBody {
    /// An interpreted body: a block to walk with `eval_to_end` against the
    /// call frame's locals as the binding context. Present for
    /// `Function`/`Closure` kinds.
    Interpreted(Series),
    /// A host handler. Present for `Native`/`Action`/`Command`/`Routine`
    /// kinds (the spec treats them as dispatched identically; this crate
    /// does not distinguish a C-entry-point from an action's per-type
    /// table from a routine's foreign-call descriptor — all are "ask the
    /// environment to run this").
    Host(NativeFn),
}

impl std::fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interpreted(body) => f.debug_tuple("Interpreted").field(&body.len()).finish(),
            Self::Host(_) => f.write_str("Host(..)"),
        }
    }
}

/// A function value (spec.md §3).
#[derive(Debug, Clone)]
pub struct FunctionValue {
    pub kind: FunctionKind,
    /// Name used only for error messages and trace output; the call
    /// site's label (the word or path used to invoke it) is captured
    /// separately at call time (spec.md §4.1 "capture the word's symbol
    /// as the label") and does not have to match this.
    pub name: Option<Symbol>,
    pub params: Vec<ParamDesc>,
    pub body: FunctionBody,
    /// *infix*: first argument comes from the value immediately preceding
    /// the call in source order (spec.md §4.1 "Infix lookahead").
    pub infix: bool,
    /// *has-definitional-return*: a magic `RETURN` local is injected
    /// (spec.md §4.2 rule 1, §9 "Magic definitional return").
    pub has_definitional_return: bool,
}

impl FunctionValue {
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Index of a named refinement among `params`, if this function
    /// declares one by that symbol.
    #[must_use]
    pub fn refinement_index(&self, sym: Symbol) -> Option<usize> {
        self.params
            .iter()
            .position(|p| p.kind == ParamKind::Refinement && p.sym == sym)
    }
}
