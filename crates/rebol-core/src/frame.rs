//! Binding lookup: resolving a symbol to a mutable cell in some frame.
//!
//! `spec.md` §2 lists "Binding lookup" as its own component ("resolve a
//! symbol to a mutable cell in some frame; fail if unbound or unset") and
//! §6 calls out `get`/`get_mut` as the external contract. Here a `Frame` is
//! the concrete thing a `Word`'s binding points at: the global context, an
//! object's fields, or a function call's locals (module-level objects and
//! function locals are the same kind of thing in REBOL — both are just
//! contexts).
//!
//! Grounded on the teacher's `namespace.rs` (`Namespace`/`Namespaces`,
//! slot-based binding), generalized from compile-time slot indices to a
//! symbol-keyed map: the core has no separate compilation pass, so a word's
//! binding is resolved by symbol rather than by a precomputed slot number.

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{error::EvalError, symbol::Symbol, value::Value};

/// Shared handle to a [`Frame`]. Cloning a `FrameRef` clones the handle, not
/// the frame: every `Word` bound to the same context shares the same
/// underlying storage, so a `SetWord` through one handle is visible through
/// every other.
pub type FrameRef = Rc<RefCell<Frame>>;

/// A context: an ordered, symbol-addressed set of variable slots.
///
/// Used for the global context, `object!`/`module!`/`port!` bodies, and a
/// function call's locals. `IndexMap` keeps insertion order (REBOL objects
/// preserve field declaration order when traversed) while still giving
/// O(1)-ish lookup by symbol.
#[derive(Debug, Default)]
pub struct Frame {
    vars: IndexMap<Symbol, Value>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_ref() -> FrameRef {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Declares `sym` in this frame with an initial value, whether or not
    /// it was already present. Used when building a call frame's locals or
    /// an object's fields, where every slot is freshly created.
    pub fn declare(&mut self, sym: Symbol, value: Value) {
        self.vars.insert(sym, value);
    }

    /// Resolves `sym` for reading. Fails "not bound" if the frame has no
    /// such slot at all, "no value" if the slot holds `Unset`.
    pub fn get(&self, sym: Symbol) -> Result<&Value, EvalError> {
        match self.vars.get(&sym) {
            None => Err(EvalError::NotBound(sym)),
            Some(Value::Unset) => Err(EvalError::NoValue(sym)),
            Some(value) => Ok(value),
        }
    }

    /// Resolves `sym` for a `get-word`/`get-path` fetch, which — unlike a
    /// plain read — is allowed to return `Unset` itself (it never invokes a
    /// function value and never trips the "no value" check).
    pub fn get_raw(&self, sym: Symbol) -> Result<&Value, EvalError> {
        self.vars.get(&sym).ok_or(EvalError::NotBound(sym))
    }

    /// Resolves `sym` for writing. Fails "not bound" if the frame has no
    /// such slot — REBOL `set-word`s can only assign to a symbol that the
    /// context already declared (by function parameter, object field, or an
    /// earlier top-level set-word at the same context).
    pub fn set(&mut self, sym: Symbol, value: Value) -> Result<(), EvalError> {
        match self.vars.get_mut(&sym) {
            None => Err(EvalError::NotBound(sym)),
            Some(slot) => {
                *slot = value;
                Ok(())
            }
        }
    }

    /// Declares `sym` if absent, or overwrites it if present. Top-level
    /// `set-word`s at the global context behave this way (REBOL programs
    /// may introduce new globals by assignment); object/function contexts
    /// use [`Frame::set`] instead, since their slots are fixed at creation.
    pub fn declare_or_set(&mut self, sym: Symbol, value: Value) {
        self.vars.insert(sym, value);
    }

    pub fn contains(&self, sym: Symbol) -> bool {
        self.vars.contains_key(&sym)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Value)> {
        self.vars.iter().map(|(&k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
