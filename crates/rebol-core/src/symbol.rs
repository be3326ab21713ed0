//! Interning of word symbols.
//!
//! REBOL words are case-insensitive: `foo`, `Foo` and `FOO` name the same
//! binding. The interner stores the case-folded spelling and hands back a
//! small `Copy` id, so every `Word`/`SetWord`/... value can carry a `Symbol`
//! instead of an owned `String`.
//!
//! Mirrors the teacher's `intern.rs` (`StringId` as a small index into a
//! table owned by the interpreter), minus the static-string/offset scheme
//! that table used for Python's fixed attribute names — REBOL has no
//! equivalent fixed vocabulary baked into the core.

use ahash::AHashMap;

/// Index into a [`Symbols`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns the canonical spelling of every word seen so far.
///
/// One `Symbols` table is shared (via the interpreter state) across every
/// frame and value in a run; `Symbol` equality is then just integer
/// equality, which is what lets the evaluator compare refinement names and
/// parameter names without re-folding case on every lookup.
#[derive(Debug, Default)]
pub struct Symbols {
    by_name: AHashMap<Box<str>, Symbol>,
    names: Vec<Box<str>>,
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `text`, case-folding it first. Returns the same `Symbol` for
    /// any spelling that case-folds identically.
    pub fn intern(&mut self, text: &str) -> Symbol {
        let folded = text.to_lowercase();
        if let Some(&sym) = self.by_name.get(folded.as_str()) {
            return sym;
        }
        let sym = Symbol(self.names.len() as u32);
        let boxed: Box<str> = folded.into_boxed_str();
        self.names.push(boxed.clone());
        self.by_name.insert(boxed, sym);
        sym
    }

    /// Returns the canonical (case-folded) spelling of `sym`.
    ///
    /// Panics if `sym` was not produced by this table — an internal
    /// invariant violation, not a recoverable evaluation error.
    pub fn name(&self, sym: Symbol) -> &str {
        &self.names[sym.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_case_insensitive() {
        let mut syms = Symbols::new();
        let a = syms.intern("Append");
        let b = syms.intern("append");
        let c = syms.intern("APPEND");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(syms.name(a), "append");
    }

    #[test]
    fn distinct_words_get_distinct_symbols() {
        let mut syms = Symbols::new();
        let a = syms.intern("foo");
        let b = syms.intern("bar");
        assert_ne!(a, b);
    }
}
