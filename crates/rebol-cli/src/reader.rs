//! A minimal textual reader: hand-rolled tokenizer plus a recursive-descent
//! parser that turns source text into the `Value` tree `rebol-core`'s
//! evaluator consumes.
//!
//! `rebol-core` itself has no reader — spec.md places lexing and parsing out
//! of scope, describing only the value model a "Load" step must hand the
//! evaluator. This is the CLI's own stand-in, just enough to drive the demo
//! scripts the native prelude (`rebol_core::natives`) exercises: integers,
//! decimals, strings, the four word kinds, the four path kinds, blocks,
//! parens, and the leading-`/` refinement-marker convention `func`'s spec
//! parser expects.
//!
//! Grounded on the teacher's `repl.rs` line-reading loop for the overall
//! "read a chunk, hand it to the evaluator" shape; the tokenizer itself has
//! no teacher analogue, since the teacher reads Python source through a
//! real lexer crate rather than hand-rolling one — there is no equivalent
//! off-the-shelf REBOL lexer in this stack to reach for instead.

use rebol_core::{Interp, Series, Value, WordValue};

/// A malformed source chunk the reader refuses to parse further.
#[derive(Debug, Clone)]
pub struct ReadError(pub String);

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "read error: {}", self.0)
    }
}

impl std::error::Error for ReadError {}

/// Reads `source` as a top-level block of values, binding every word-kind
/// value (in a block, a paren, or a path) to `interp`'s global context as
/// it goes — the same one-shot bind a real boot performs for top-level
/// script text before the evaluator ever sees it.
pub fn read_block(interp: &mut Interp, source: &str) -> Result<Series, ReadError> {
    let mut reader = Reader {
        chars: source.chars().collect(),
        pos: 0,
        interp,
    };
    let values = reader.read_values_until(None)?;
    Ok(Series::new(values))
}

struct Reader<'a> {
    chars: Vec<char>,
    pos: usize,
    interp: &'a mut Interp,
}

impl Reader<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Skips whitespace and `;`-to-end-of-line comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.pos += 1;
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    /// Reads values up to (and consuming) `closing`, or to end of input if
    /// `closing` is `None` (the top-level call).
    fn read_values_until(&mut self, closing: Option<char>) -> Result<Vec<Value>, ReadError> {
        let mut values = Vec::new();
        loop {
            self.skip_trivia();
            match (self.peek(), closing) {
                (None, None) => break,
                (None, Some(c)) => return Err(ReadError(format!("unterminated block, expected '{c}'"))),
                (Some(c), Some(expected)) if c == expected => {
                    self.pos += 1;
                    break;
                }
                (Some(')' | ']'), _) => return Err(ReadError("unexpected closing bracket".to_owned())),
                _ => values.push(self.read_value()?),
            }
        }
        Ok(values)
    }

    fn read_value(&mut self) -> Result<Value, ReadError> {
        match self.peek() {
            Some('[') => {
                self.pos += 1;
                let values = self.read_values_until(Some(']'))?;
                Ok(Value::Block(Series::new(values)))
            }
            Some('(') => {
                self.pos += 1;
                let values = self.read_values_until(Some(')'))?;
                Ok(Value::Paren(Series::new(values)))
            }
            Some('"') => self.read_string(),
            Some(_) => self.read_token(),
            None => Err(ReadError("unexpected end of input".to_owned())),
        }
    }

    fn read_string(&mut self) -> Result<Value, ReadError> {
        self.pos += 1; // opening quote
        let mut text = String::new();
        loop {
            match self.bump() {
                None => return Err(ReadError("unterminated string".to_owned())),
                Some('"') => break,
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => return Err(ReadError("unterminated string escape".to_owned())),
                },
                Some(c) => text.push(c),
            }
        }
        Ok(Value::String(std::rc::Rc::new(std::cell::RefCell::new(text))))
    }

    /// A contiguous run of non-trivia, non-bracket, non-quote characters —
    /// a word, a set/get/lit-word, a number, a path, or a refinement
    /// marker, classified once the whole run is in hand.
    fn read_token(&mut self) -> Result<Value, ReadError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '"' | ';') {
                break;
            }
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();
        if token.is_empty() {
            return Err(ReadError("empty token".to_owned()));
        }

        // A leading slash with no further slash is `func`'s refinement
        // marker (e.g. `/part`), kept as a single word whose own spelling
        // carries the slash; a slash anywhere else splits the token into a
        // path.
        if let Some(rest) = token.strip_prefix('/') {
            if !rest.is_empty() && !rest.contains('/') {
                return Ok(self.word_value(&token));
            }
        }
        if token != "/" && token.contains('/') {
            let segments: Vec<&str> = token.split('/').collect();
            let values: Vec<Value> = segments.iter().map(|segment| self.atom_value(segment)).collect();
            return Ok(Value::Path(Series::new(values)));
        }

        Ok(self.atom_value(&token))
    }

    /// Classifies a single non-path token: set-word, get-word, lit-word,
    /// number, or plain word.
    fn atom_value(&mut self, token: &str) -> Value {
        if let Some(name) = token.strip_suffix(':') {
            if !name.is_empty() {
                return Value::SetWord(self.bound_word(name));
            }
        }
        if let Some(name) = token.strip_prefix(':') {
            if !name.is_empty() {
                return Value::GetWord(self.bound_word(name));
            }
        }
        if let Some(name) = token.strip_prefix('\'') {
            if !name.is_empty() {
                return Value::LitWord(self.bound_word(name));
            }
        }
        if let Some(value) = parse_number(token) {
            return value;
        }
        Value::Word(self.bound_word(token))
    }

    /// A plain `Word`, used only for the `/refinement` marker spelling
    /// (kept verbatim, slash included).
    fn word_value(&mut self, token: &str) -> Value {
        Value::Word(self.bound_word(token))
    }

    fn bound_word(&mut self, name: &str) -> WordValue {
        let sym = self.interp.symbols.intern(name);
        WordValue::bound(sym, self.interp.global.clone())
    }
}

/// Parses `token` as an `Integer` or a `Decimal`, or `None` if it isn't a
/// number at all (falls through to being read as a word).
fn parse_number(token: &str) -> Option<Value> {
    let body = token.strip_prefix('-').unwrap_or(token);
    if body.is_empty() || !body.chars().next().unwrap().is_ascii_digit() {
        return None;
    }
    if body.chars().all(|c| c.is_ascii_digit()) {
        return token.parse::<i64>().ok().map(Value::Integer);
    }
    if let Some((whole, frac)) = body.split_once('.') {
        if !whole.is_empty() && !frac.is_empty() && whole.chars().all(|c| c.is_ascii_digit()) && frac.chars().all(|c| c.is_ascii_digit()) {
            return token.parse::<f64>().ok().map(Value::Decimal);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_block_of_mixed_atoms() {
        let mut it = Interp::new();
        let block = read_block(&mut it, "[1 2.5 \"hi\" word set: :gw 'lit]").unwrap();
        let values = block.data.borrow();
        assert_eq!(values.len(), 1);
        let Value::Block(inner) = &values[0] else { panic!("expected block") };
        let inner = inner.data.borrow();
        assert_eq!(inner[0], Value::Integer(1));
        assert_eq!(inner[1], Value::Decimal(2.5));
        assert!(matches!(inner[2], Value::String(_)));
        assert!(matches!(inner[3], Value::Word(_)));
        assert!(matches!(inner[4], Value::SetWord(_)));
        assert!(matches!(inner[5], Value::GetWord(_)));
        assert!(matches!(inner[6], Value::LitWord(_)));
    }

    #[test]
    fn splits_a_path_token_on_interior_slashes() {
        let mut it = Interp::new();
        let block = read_block(&mut it, "append/dup/part").unwrap();
        let values = block.data.borrow();
        let Value::Path(segments) = &values[0] else { panic!("expected path") };
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn leading_slash_token_is_a_refinement_marker_word() {
        let mut it = Interp::new();
        let block = read_block(&mut it, "[series value /part length]").unwrap();
        let values = block.data.borrow();
        let Value::Block(inner) = &values[0] else { panic!("expected block") };
        let inner = inner.data.borrow();
        let Value::Word(w) = &inner[2] else { panic!("expected word") };
        assert_eq!(it.symbols.name(w.sym), "/part");
    }

    #[test]
    fn negative_integer_is_not_mistaken_for_a_word() {
        let mut it = Interp::new();
        let block = read_block(&mut it, "[-5]").unwrap();
        let values = block.data.borrow();
        let Value::Block(inner) = &values[0] else { panic!("expected block") };
        assert_eq!(inner.data.borrow()[0], Value::Integer(-5));
    }
}
