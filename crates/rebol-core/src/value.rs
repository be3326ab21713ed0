//! The runtime value model (spec.md §3).
//!
//! Grounded on the teacher's `value.rs`: a single tagged enum mixing
//! immediate payloads (integers, characters, logic) with heap-backed
//! payloads (series, functions, contexts) behind `Rc`. Unlike the teacher,
//! this crate has no arena/refcount-checked heap of its own — spec.md §6
//! treats the GC as an external collaborator the core only pushes/pops
//! guards against (see `gc.rs`) — so shared, mutable payloads here are
//! ordinary `Rc<RefCell<_>>`, which is the idiomatic stand-in for "owned by
//! the GC, mutably aliased" in a crate that doesn't implement its own
//! collector.
//!
//! Two out-of-band bits spec.md §3 calls out — *thrown* and *re-evaluate* —
//! are deliberately kept off this enum (see the design notes in spec.md §9:
//! "model ... as a sum type with an inline header word; the bits are
//! separate flag fields, not crammed into the type tag"). They live on
//! [`Cell`], the wrapper the evaluator actually passes around as its output
//! parameter.

use std::{cell::RefCell, fmt, rc::Rc};

use crate::{error::ErrorValue, frame::FrameRef, function::FunctionValue, symbol::Symbol, types::ValueKind};

/// A mutable, shared backing store for `Block`/`Paren`/`Path`-family
/// values, plus an independent read position.
///
/// Two `Series` values can share the same `data` (e.g. after `copy/deep` is
/// *not* taken) while each tracks its own `index` — exactly how REBOL
/// series work: `at`, `next`, and friends produce a new value sharing the
/// same underlying data with a different position.
#[derive(Debug, Clone)]
pub struct Series {
    pub data: Rc<RefCell<Vec<Value>>>,
    pub index: usize,
}

impl Series {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            data: Rc::new(RefCell::new(values)),
            index: 0,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Length of the *remaining* tail from `index` onward — what the
    /// evaluator and path walker mean by "past the array end".
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.borrow().len().saturating_sub(self.index)
    }

    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.index >= self.data.borrow().len()
    }

    /// Reads the value at `index + offset` without advancing, or `None`
    /// past the end. Used by the evaluator's infix lookahead (spec.md
    /// §4.1) and the fulfiller's quoted-parameter peek (spec.md §4.2).
    #[must_use]
    pub fn peek(&self, offset: usize) -> Option<Value> {
        self.data.borrow().get(self.index + offset).cloned()
    }

    /// Returns a `Series` advanced by `n` positions, sharing the same data.
    #[must_use]
    pub fn advanced(&self, n: usize) -> Self {
        Self {
            data: Rc::clone(&self.data),
            index: self.index + n,
        }
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Shares the same backing data as `other` (pointer identity), the test
    /// a `reduce`/`compose` implementation uses to decide whether to copy.
    #[must_use]
    pub fn shares_data_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data) && self.index == other.index
    }
}

/// A word value's resolved (or not-yet-resolved) context.
///
/// `spec.md` §3: `Word(sym, binding?)`. Binding is attached when a block is
/// bound into a context (by `func`, `object`'s field-gathering pass, or the
/// demo reader's default top-level bind); a word with no binding is legal
/// to hold but fails "not bound" the moment it is evaluated or looked up.
#[derive(Debug, Clone)]
pub struct WordValue {
    pub sym: Symbol,
    pub binding: Option<FrameRef>,
}

impl WordValue {
    #[must_use]
    pub fn unbound(sym: Symbol) -> Self {
        Self { sym, binding: None }
    }

    #[must_use]
    pub fn bound(sym: Symbol, frame: FrameRef) -> Self {
        Self {
            sym,
            binding: Some(frame),
        }
    }
}

impl PartialEq for WordValue {
    fn eq(&self, other: &Self) -> bool {
        self.sym == other.sym
    }
}

/// The runtime value model (spec.md §3).
#[derive(Debug, Clone)]
pub enum Value {
    /// Sentinel marking the end of an array of values. Never stored inside
    /// a series; only produced by the evaluator when its index runs past
    /// the array end (spec.md §4.1 "End sentinel").
    End,
    /// "No value" — legal in most slots, rejected by assignment targets and
    /// most argument positions.
    Unset,
    /// A definite "absent" value, conditionally false.
    None,
    Logic(bool),
    Integer(i64),
    Decimal(f64),
    Character(char),
    String(Rc<RefCell<String>>),
    Binary(Rc<RefCell<Vec<u8>>>),
    /// Opaque to the core (spec.md §3): image payloads are never inspected
    /// by the evaluator, only moved around and passed to natives.
    Image(Rc<RefCell<Vec<u8>>>),
    Bitset(Rc<RefCell<Vec<u8>>>),
    /// Opaque time-of-day payload: nanoseconds since midnight.
    Time(i64),
    /// Opaque date payload: days since the REBOL epoch.
    Date(i32),
    /// Opaque money payload: fixed-point amount, hundredths of a unit.
    Money(i64),
    Pair(f64, f64),
    Tuple(Vec<u8>),

    Word(WordValue),
    GetWord(WordValue),
    LitWord(WordValue),
    SetWord(WordValue),

    Path(Series),
    GetPath(Series),
    LitPath(Series),
    SetPath(Series),

    Block(Series),
    Paren(Series),

    Function(Rc<FunctionValue>),
    Native(Rc<FunctionValue>),
    Action(Rc<FunctionValue>),
    Closure(Rc<FunctionValue>),
    Command(Rc<FunctionValue>),
    Routine(Rc<FunctionValue>),

    /// A first-class error value; may also be the payload carried by a
    /// thrown [`Cell`] (spec.md §3 "Error(record)").
    Error(Rc<ErrorValue>),

    Object(FrameRef),
    Module(FrameRef),
    Port(FrameRef),

    /// Internal call-frame representation (spec.md §3's `Frame`). Never
    /// user-visible; only exists so `ValueKind::Frame` has a value to
    /// correspond to in debug assertions. Reaching the evaluator's
    /// dispatcher with this kind is a fatal invariant violation.
    InternalFrame,

    /// A definitional return's thrown payload (spec.md §9 "Magic
    /// definitional return": "a distinguished synthetic value whose payload
    /// references the target frame by index"). Rides the `Cell::thrown`
    /// channel like any other throw; `fulfill.rs`'s dispatch step unwraps it
    /// when the targeted frame id matches the frame it just ran, and
    /// re-throws it unchanged otherwise so it passes transparently through
    /// any frames nested between the `return` call and its target. Never
    /// user-visible — a program can never hold one of these in a variable.
    ReturnSignal(crate::callframe::FrameId, Box<Value>),
}

impl Value {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::End => ValueKind::End,
            Self::Unset => ValueKind::Unset,
            Self::None => ValueKind::None,
            Self::Logic(_) => ValueKind::Logic,
            Self::Integer(_) => ValueKind::Integer,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Character(_) => ValueKind::Character,
            Self::String(_) => ValueKind::String,
            Self::Binary(_) => ValueKind::Binary,
            Self::Image(_) => ValueKind::Image,
            Self::Bitset(_) => ValueKind::Bitset,
            Self::Time(_) => ValueKind::Time,
            Self::Date(_) => ValueKind::Date,
            Self::Money(_) => ValueKind::Money,
            Self::Pair(..) => ValueKind::Pair,
            Self::Tuple(_) => ValueKind::Tuple,
            Self::Word(_) => ValueKind::Word,
            Self::GetWord(_) => ValueKind::GetWord,
            Self::LitWord(_) => ValueKind::LitWord,
            Self::SetWord(_) => ValueKind::SetWord,
            Self::Path(_) => ValueKind::Path,
            Self::GetPath(_) => ValueKind::GetPath,
            Self::LitPath(_) => ValueKind::LitPath,
            Self::SetPath(_) => ValueKind::SetPath,
            Self::Block(_) => ValueKind::Block,
            Self::Paren(_) => ValueKind::Paren,
            Self::Function(_) => ValueKind::Function,
            Self::Native(_) => ValueKind::Native,
            Self::Action(_) => ValueKind::Action,
            Self::Closure(_) => ValueKind::Closure,
            Self::Command(_) => ValueKind::Command,
            Self::Routine(_) => ValueKind::Routine,
            Self::Error(_) => ValueKind::Error,
            Self::Object(_) => ValueKind::Object,
            Self::Module(_) => ValueKind::Module,
            Self::Port(_) => ValueKind::Port,
            Self::InternalFrame => ValueKind::Frame,
            Self::ReturnSignal(..) => ValueKind::ReturnSignal,
        }
    }

    /// Whether this value, used as a condition, is "true": everything
    /// except `none` and `false` (REBOL's conditional-truth rule; `unset`
    /// reaching a condition is a caller bug, not handled specially here).
    #[must_use]
    pub fn is_conditionally_true(&self) -> bool {
        !matches!(self, Self::None | Self::Logic(false))
    }

    #[must_use]
    pub fn is_function_like(&self) -> bool {
        self.kind().is_callable()
    }

    /// The function payload, if this value is one of the callable kinds.
    #[must_use]
    pub fn as_function(&self) -> Option<&Rc<FunctionValue>> {
        match self {
            Self::Function(f) | Self::Native(f) | Self::Action(f) | Self::Closure(f) | Self::Command(f) | Self::Routine(f) => {
                Some(f)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn as_word(&self) -> Option<&WordValue> {
        match self {
            Self::Word(w) | Self::GetWord(w) | Self::LitWord(w) | Self::SetWord(w) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_series(&self) -> Option<&Series> {
        match self {
            Self::Path(s) | Self::GetPath(s) | Self::LitPath(s) | Self::SetPath(s) | Self::Block(s) | Self::Paren(s) => {
                Some(s)
            }
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::End, Self::End) | (Self::Unset, Self::Unset) | (Self::None, Self::None) => true,
            (Self::Logic(a), Self::Logic(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::Character(a), Self::Character(b)) => a == b,
            (Self::String(a), Self::String(b)) => *a.borrow() == *b.borrow(),
            (Self::Binary(a), Self::Binary(b)) | (Self::Image(a), Self::Image(b)) | (Self::Bitset(a), Self::Bitset(b)) => {
                *a.borrow() == *b.borrow()
            }
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Money(a), Self::Money(b)) => a == b,
            (Self::Pair(a1, a2), Self::Pair(b1, b2)) => a1 == b1 && a2 == b2,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Word(a), Self::Word(b))
            | (Self::GetWord(a), Self::GetWord(b))
            | (Self::LitWord(a), Self::LitWord(b))
            | (Self::SetWord(a), Self::SetWord(b)) => a == b,
            (Self::Path(a), Self::Path(b))
            | (Self::GetPath(a), Self::GetPath(b))
            | (Self::LitPath(a), Self::LitPath(b))
            | (Self::SetPath(a), Self::SetPath(b))
            | (Self::Block(a), Self::Block(b))
            | (Self::Paren(a), Self::Paren(b)) => a == b,
            (Self::Function(a), Self::Function(b))
            | (Self::Native(a), Self::Native(b))
            | (Self::Action(a), Self::Action(b))
            | (Self::Closure(a), Self::Closure(b))
            | (Self::Command(a), Self::Command(b))
            | (Self::Routine(a), Self::Routine(b)) => Rc::ptr_eq(a, b),
            (Self::Error(a), Self::Error(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) | (Self::Module(a), Self::Module(b)) | (Self::Port(a), Self::Port(b)) => {
                Rc::ptr_eq(a, b)
            }
            (Self::InternalFrame, Self::InternalFrame) => true,
            (Self::ReturnSignal(a, av), Self::ReturnSignal(b, bv)) => a == b && av == bv,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Printing is explicitly out of scope (spec.md §1); this exists
        // only so `EvalError` messages and test failure output can show a
        // value without pulling in a real molder.
        match self {
            Self::End => write!(f, "#[end]"),
            Self::Unset => write!(f, "#[unset]"),
            Self::None => write!(f, "none"),
            Self::Logic(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Character(c) => write!(f, "#\"{c}\""),
            Self::String(s) => write!(f, "{:?}", s.borrow()),
            Self::Word(w) | Self::GetWord(w) | Self::LitWord(w) | Self::SetWord(w) => write!(f, "word#{}", w.sym.index()),
            _ => write!(f, "#[{}]", self.kind()),
        }
    }
}

/// The evaluator's output parameter: a value plus the two out-of-band bits
/// spec.md §3 calls out.
///
/// - `thrown`: set on the output of a call that is unwinding (spec.md
///   §4.1/§7); every recursive caller must test and forward it.
/// - `reevaluate`: set by the (native, not yet implemented here) `EVAL`
///   primitive to ask the loop to treat `value` as if it had appeared
///   inline in the source (spec.md §4.1, end of "Dispatch table").
#[derive(Debug, Clone)]
pub struct Cell {
    pub value: Value,
    pub thrown: bool,
    pub reevaluate: bool,
}

impl Cell {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self {
            value,
            thrown: false,
            reevaluate: false,
        }
    }

    #[must_use]
    pub fn unset() -> Self {
        Self::new(Value::Unset)
    }

    /// Marks this cell as carrying a thrown payload, per spec.md §4.1's
    /// "A 'thrown' return sentinel ... with the output's thrown bit set to
    /// the unwinding payload."
    pub fn set_thrown(&mut self, payload: Value) {
        self.value = payload;
        self.thrown = true;
    }

    pub fn take(&mut self) -> Value {
        std::mem::replace(&mut self.value, Value::Unset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_shares_data_across_clones_with_independent_index() {
        let s = Series::new(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let advanced = s.advanced(1);
        assert!(s.shares_data_with(&advanced));
        assert_eq!(s.index, 0);
        assert_eq!(advanced.index, 1);
        assert_eq!(advanced.peek(0), Some(Value::Integer(2)));
    }

    #[test]
    fn mutating_through_one_handle_is_visible_through_another() {
        let s = Series::new(vec![Value::Integer(1)]);
        let s2 = s.clone();
        s.data.borrow_mut().push(Value::Integer(2));
        assert_eq!(s2.len(), 2);
    }

    #[test]
    fn none_and_false_are_conditionally_false_everything_else_true() {
        assert!(!Value::None.is_conditionally_true());
        assert!(!Value::Logic(false).is_conditionally_true());
        assert!(Value::Logic(true).is_conditionally_true());
        assert!(Value::Integer(0).is_conditionally_true());
        assert!(Value::Unset.is_conditionally_true());
    }
}
