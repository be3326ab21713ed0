//! A small native prelude (SPEC_FULL.md §11).
//!
//! spec.md §1 places "native function bodies" and "a general stdlib" out of
//! scope for the core — the core only specifies *how* a native-family call
//! is fulfilled and dispatched (§4.2), never what any particular native
//! does. But spec.md's own §8 end-to-end table exercises `append/dup`,
//! `func`, `reduce`, `catch`/`throw`, and `apply` by name, and a core with
//! zero dispatchable functions cannot be run at all. This module supplies
//! exactly those names (plus the handful of control-flow words any non-
//! trivial script needs) as thin [`crate::function::FunctionValue::Native`]
//! wrappers, grounded in the teacher's `builtins/*.rs` one-native-per-file
//! layout.
//!
//! None of this is a general standard library: no string/series natives
//! beyond `append`, no datatype constructors beyond `make object!`, no I/O.
//! [`install`] declares every native directly into `interp.global`, the way
//! a real boot sequence would populate the lib context before running user
//! code.

mod arithmetic;
mod control;
mod object;
mod series;

use crate::{function::FunctionValue, interp::Interp, symbol::Symbol, value::Value};

/// Declares a native under `name` in `interp.global`. Shared by every
/// natives submodule so each only has to build a [`FunctionValue`].
fn declare(interp: &mut Interp, name: &str, function: FunctionValue) {
    let sym = interp.symbols.intern(name);
    interp.global.borrow_mut().declare(sym, Value::Native(std::rc::Rc::new(function)));
}

/// Interns `name` and returns the [`Symbol`] — a small convenience used by
/// every native builder to name its own parameters.
fn sym(interp: &mut Interp, name: &str) -> Symbol {
    interp.symbols.intern(name)
}

/// Populates `interp.global` with the native prelude. Call once per
/// [`Interp`] before running any script that uses these names.
pub fn install(interp: &mut Interp) {
    arithmetic::install(interp);
    series::install(interp);
    control::install(interp);
    object::install(interp);

    // `none`/`true`/`false` are ordinary words bound to values, not literal
    // syntax (REBOL has no token for them) — the demo reader leans on this
    // exactly like a real boot does for its `system`-context words.
    let none_sym = sym(interp, "none");
    interp.global.borrow_mut().declare(none_sym, Value::None);
    let true_sym = sym(interp, "true");
    interp.global.borrow_mut().declare(true_sym, Value::Logic(true));
    let false_sym = sym(interp, "false");
    interp.global.borrow_mut().declare(false_sym, Value::Logic(false));
}
