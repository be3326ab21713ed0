//! End-to-end scenarios straight out of spec.md §8's literal-input table,
//! plus its throw-propagation and path scenarios, driven through
//! `eval_to_end`/`fulfill_and_call` against hand-built `Value` trees (this
//! crate has no reader of its own; `rebol-cli`'s is a separate crate — see
//! SPEC_FULL.md §10.4's note that the core's own tests build value trees
//! directly rather than parsing source text).

use rebol_core::{Cell, Interp, PathOutcome, Series, Value, WordValue, do_path, eval_to_end, fulfill_and_call, natives};

fn bound_word(interp: &Interp, sym: rebol_core::Symbol) -> Value {
    Value::Word(WordValue::bound(sym, interp.global.clone()))
}

#[test]
fn scenario_1_strict_left_to_right_infix() {
    // do [1 + 2 * 3] => 9
    let mut it = Interp::new();
    natives::install(&mut it);
    let plus = it.symbols.intern("+");
    let star = it.symbols.intern("*");
    let source = Series::new(vec![
        Value::Integer(1),
        bound_word(&it, plus),
        Value::Integer(2),
        bound_word(&it, star),
        Value::Integer(3),
    ]);
    let mut out = Cell::unset();
    eval_to_end(&mut it, &mut out, &source).unwrap();
    assert_eq!(out.value, Value::Integer(9));
}

#[test]
fn scenario_2_set_word_then_read_back() {
    // do [x: 10 x + 5] => 15, with x now bound to 10
    let mut it = Interp::new();
    natives::install(&mut it);
    let x = it.symbols.intern("x");
    let plus = it.symbols.intern("+");
    let source = Series::new(vec![
        Value::SetWord(WordValue::bound(x, it.global.clone())),
        Value::Integer(10),
        bound_word(&it, x),
        bound_word(&it, plus),
        Value::Integer(5),
    ]);
    let mut out = Cell::unset();
    eval_to_end(&mut it, &mut out, &source).unwrap();
    assert_eq!(out.value, Value::Integer(15));
    assert_eq!(it.global.borrow().get(x).unwrap(), &Value::Integer(10));
}

#[test]
fn scenario_3_append_dup_via_real_path_dispatch() {
    // do [append/dup [a] 'b 3] => [a b b b], dispatched through a live
    // `Path` value (eval.rs's own Path case), not a pre-seeded arg stack.
    let mut it = Interp::new();
    natives::install(&mut it);
    let append = it.symbols.intern("append");
    let dup = it.symbols.intern("dup");
    let a = it.symbols.intern("a");
    let b = it.symbols.intern("b");

    let path = Series::new(vec![bound_word(&it, append), Value::Word(WordValue::unbound(dup))]);
    let source = Series::new(vec![
        Value::Path(path),
        Value::Block(Series::new(vec![Value::Word(WordValue::unbound(a))])),
        Value::LitWord(WordValue::unbound(b)),
        Value::Integer(3),
    ]);
    let mut out = Cell::unset();
    eval_to_end(&mut it, &mut out, &source).unwrap();
    let Value::Block(result) = out.value else { panic!("expected block") };
    assert_eq!(result.len(), 4);
    assert_eq!(result.data.borrow()[0], Value::Word(WordValue::unbound(a)));
    for slot in &result.data.borrow()[1..] {
        assert_eq!(*slot, Value::Word(WordValue::unbound(b)));
    }
}

#[test]
fn scenario_4_out_of_order_refinements_via_real_path_dispatch() {
    // do [append/dup/part [a] 'b 3 1] => [a b] ; /part is declared in
    // append's signature before /dup, so the fulfiller's restart-scan
    // (spec.md §4.2 "Post-walk") has to find it on a second pass.
    let mut it = Interp::new();
    natives::install(&mut it);
    let append = it.symbols.intern("append");
    let dup = it.symbols.intern("dup");
    let part = it.symbols.intern("part");
    let a = it.symbols.intern("a");
    let b = it.symbols.intern("b");

    let path = Series::new(vec![
        bound_word(&it, append),
        Value::Word(WordValue::unbound(dup)),
        Value::Word(WordValue::unbound(part)),
    ]);
    let source = Series::new(vec![
        Value::Path(path),
        Value::Block(Series::new(vec![Value::Word(WordValue::unbound(a))])),
        Value::LitWord(WordValue::unbound(b)),
        Value::Integer(3),
        Value::Integer(1),
    ]);
    let mut out = Cell::unset();
    eval_to_end(&mut it, &mut out, &source).unwrap();
    let Value::Block(result) = out.value else { panic!("expected block") };
    assert_eq!(result.len(), 2);
}

/// Builds `foo: func [a /b c] [reduce [a b c]]` and returns the resulting
/// `Value::Function` without invoking it, for scenarios 5 and 6.
fn build_refinement_fixture(it: &mut Interp) -> Value {
    let func_sym = it.symbols.intern("func");
    let a = it.symbols.intern("a");
    let slash_b = it.symbols.intern("/b");
    let b = it.symbols.intern("b");
    let c = it.symbols.intern("c");
    let reduce_sym = it.symbols.intern("reduce");

    let spec = Series::new(vec![
        Value::Word(WordValue::unbound(a)),
        Value::Word(WordValue::unbound(slash_b)),
        Value::Word(WordValue::unbound(c)),
    ]);
    let reduce_arg = Series::new(vec![
        Value::Word(WordValue::unbound(a)),
        Value::Word(WordValue::unbound(b)),
        Value::Word(WordValue::unbound(c)),
    ]);
    let body = Series::new(vec![bound_word(it, reduce_sym), Value::Block(reduce_arg)]);
    let make_source = Series::new(vec![Value::Block(spec), Value::Block(body)]);

    let func_function = it.global.borrow().get(func_sym).unwrap().as_function().unwrap().clone();
    let mark = it.argstack.mark();
    let mut made = Cell::unset();
    fulfill_and_call(it, &mut made, func_function, Some(func_sym), &make_source, 0, None, mark).unwrap();
    made.value
}

#[test]
fn scenario_5_absent_refinement_reads_none_dependent_reads_unset() {
    // foo 1 => [1 #[none] #[unset]]
    let mut it = Interp::new();
    natives::install(&mut it);
    let foo = build_refinement_fixture(&mut it).as_function().unwrap().clone();

    let call_source = Series::new(vec![Value::Integer(1)]);
    let mark = it.argstack.mark();
    let mut out = Cell::unset();
    fulfill_and_call(&mut it, &mut out, foo, None, &call_source, 0, None, mark).unwrap();
    let Value::Block(result) = out.value else { panic!("expected block") };
    let result = result.data.borrow();
    assert_eq!(result[0], Value::Integer(1));
    assert_eq!(result[1], Value::None);
    assert_eq!(result[2], Value::Unset);
}

#[test]
fn scenario_6_unset_dependent_revokes_the_refinement() {
    // foo/b 1 #[unset] => [1 #[none] #[unset]] — the dependent arriving
    // unset (here via an empty paren, which evaluates to `Unset`) revokes
    // the refinement it was requested under.
    let mut it = Interp::new();
    natives::install(&mut it);
    let foo_value = build_refinement_fixture(&mut it);
    let foo = foo_value.as_function().unwrap().clone();
    let b = it.symbols.intern("b");

    // Recorded before the refinement-word push below, the same way
    // `eval.rs`'s `Path` case records it before calling `do_path`.
    let mark = it.argstack.mark();
    it.argstack.push(Value::Word(WordValue::unbound(b)));
    let call_source = Series::new(vec![Value::Integer(1), Value::Paren(Series::empty())]);
    let mut out = Cell::unset();
    fulfill_and_call(&mut it, &mut out, foo, None, &call_source, 0, None, mark).unwrap();
    let Value::Block(result) = out.value else { panic!("expected block") };
    let result = result.data.borrow();
    assert_eq!(result[0], Value::Integer(1));
    assert_eq!(result[1], Value::None);
    assert_eq!(result[2], Value::Unset);
}

#[test]
fn throw_from_a_called_function_unwinds_through_catch() {
    // foo: func [x] [throw 10] catch [foo 1 + 2] => 10, argument stack
    // back at its pre-call depth.
    let mut it = Interp::new();
    natives::install(&mut it);
    let func_sym = it.symbols.intern("func");
    let x = it.symbols.intern("x");
    let throw_sym = it.symbols.intern("throw");
    let plus = it.symbols.intern("+");
    let catch_sym = it.symbols.intern("catch");
    let foo_sym = it.symbols.intern("foo");

    let spec = Series::new(vec![Value::Word(WordValue::unbound(x))]);
    let body = Series::new(vec![bound_word(&it, throw_sym), Value::Integer(10)]);
    let make_source = Series::new(vec![Value::Block(spec), Value::Block(body)]);
    let func_function = it.global.borrow().get(func_sym).unwrap().as_function().unwrap().clone();
    let mark = it.argstack.mark();
    let mut made = Cell::unset();
    fulfill_and_call(&mut it, &mut made, func_function, Some(func_sym), &make_source, 0, None, mark).unwrap();
    it.global.borrow_mut().declare(foo_sym, made.value);

    let depth_before = it.argstack.depth();
    let catch_body = Series::new(vec![
        bound_word(&it, foo_sym),
        Value::Integer(1),
        bound_word(&it, plus),
        Value::Integer(2),
    ]);
    let catch_source = Series::new(vec![Value::Block(catch_body)]);
    let catch_function = it.global.borrow().get(catch_sym).unwrap().as_function().unwrap().clone();
    let mark = it.argstack.mark();
    let mut out = Cell::unset();
    fulfill_and_call(&mut it, &mut out, catch_function, Some(catch_sym), &catch_source, 0, None, mark).unwrap();
    assert!(!out.thrown);
    assert_eq!(out.value, Value::Integer(10));
    assert_eq!(it.argstack.depth(), depth_before);
}

#[test]
fn throw_from_a_paren_inside_an_infix_expression_unwinds() {
    // catch [1 + (throw 99)] => 99
    let mut it = Interp::new();
    natives::install(&mut it);
    let plus = it.symbols.intern("+");
    let throw_sym = it.symbols.intern("throw");
    let catch_sym = it.symbols.intern("catch");

    let paren_body = Series::new(vec![bound_word(&it, throw_sym), Value::Integer(99)]);
    let catch_body = Series::new(vec![Value::Integer(1), bound_word(&it, plus), Value::Paren(paren_body)]);
    let catch_source = Series::new(vec![Value::Block(catch_body)]);
    let catch_function = it.global.borrow().get(catch_sym).unwrap().as_function().unwrap().clone();
    let mark = it.argstack.mark();
    let mut out = Cell::unset();
    fulfill_and_call(&mut it, &mut out, catch_function, Some(catch_sym), &catch_source, 0, None, mark).unwrap();
    assert!(!out.thrown);
    assert_eq!(out.value, Value::Integer(99));
}

#[test]
fn object_field_get_and_set_through_a_live_path_value() {
    // o: make object! [f: 42]; o/f => 42; o/f: 7; o/f => 7
    let mut it = Interp::new();
    natives::install(&mut it);
    let make_sym = it.symbols.intern("make");
    let object_bang = it.symbols.intern("object!");
    let f = it.symbols.intern("f");
    let o = it.symbols.intern("o");

    let spec_block = Series::new(vec![Value::SetWord(WordValue::unbound(f)), Value::Integer(42)]);
    let call_source = Series::new(vec![Value::Word(WordValue::unbound(object_bang)), Value::Block(spec_block)]);
    let make_function = it.global.borrow().get(make_sym).unwrap().as_function().unwrap().clone();
    let mark = it.argstack.mark();
    let mut made = Cell::unset();
    fulfill_and_call(&mut it, &mut made, make_function, Some(make_sym), &call_source, 0, None, mark).unwrap();
    it.global.borrow_mut().declare(o, made.value);

    let get_path = Series::new(vec![bound_word(&it, o), Value::Word(WordValue::unbound(f))]);
    match do_path(&mut it, &get_path, None, false).unwrap() {
        PathOutcome::Value(result) => assert_eq!(result.value, Value::Integer(42)),
        PathOutcome::Thrown(_) => panic!("unexpected throw"),
    }

    let set_path = Series::new(vec![bound_word(&it, o), Value::Word(WordValue::unbound(f))]);
    do_path(&mut it, &set_path, Some(Value::Integer(7)), false).unwrap();

    let reget_path = Series::new(vec![bound_word(&it, o), Value::Word(WordValue::unbound(f))]);
    match do_path(&mut it, &reget_path, None, false).unwrap() {
        PathOutcome::Value(result) => assert_eq!(result.value, Value::Integer(7)),
        PathOutcome::Thrown(_) => panic!("unexpected throw"),
    }
}

#[test]
fn block_path_one_based_index_scenario() {
    // p: [a b c]; p/2 => b
    let mut it = Interp::new();
    let a = it.symbols.intern("a");
    let b = it.symbols.intern("b");
    let c = it.symbols.intern("c");
    let p = it.symbols.intern("p");
    let block = Value::Block(Series::new(vec![
        Value::Word(WordValue::unbound(a)),
        Value::Word(WordValue::unbound(b)),
        Value::Word(WordValue::unbound(c)),
    ]));
    it.global.borrow_mut().declare(p, block);

    let path = Series::new(vec![bound_word(&it, p), Value::Integer(2)]);
    match do_path(&mut it, &path, None, false).unwrap() {
        PathOutcome::Value(result) => assert_eq!(result.value, Value::Word(WordValue::unbound(b))),
        PathOutcome::Thrown(_) => panic!("unexpected throw"),
    }
}
