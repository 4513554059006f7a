use std::rc::Rc;

use skribe::{
    Context, ContextRef, MemoryLogger, Node, Registry, Script, SkribeError, Value, ValueKind,
};

fn registry() -> Registry {
    Registry::new(Rc::new(MemoryLogger::new()))
}

fn eval(source: &str) -> Value {
    registry()
        .execute(source, None)
        .expect("evaluation should succeed")
}

fn eval_in(registry: &Registry, ctx: &ContextRef, source: &str) -> Value {
    registry
        .execute(source, Some(ctx))
        .expect("evaluation should succeed")
}

fn eval_error(source: &str) -> SkribeError {
    match registry().execute(source, None) {
        Ok(value) => panic!("expected error, received value {value}"),
        Err(err) => err,
    }
}

fn expect_number(value: &Value) -> f64 {
    match value.kind() {
        ValueKind::Number(n) => *n,
        _ => panic!("expected number, found {}", value.type_name()),
    }
}

fn expect_text(value: &Value) -> &str {
    match value.kind() {
        ValueKind::Text(text) => text,
        _ => panic!("expected text, found {}", value.type_name()),
    }
}

fn expect_bool(value: &Value) -> bool {
    match value.kind() {
        ValueKind::Boolean(b) => *b,
        _ => panic!("expected boolean, found {}", value.type_name()),
    }
}

#[test]
fn evaluates_literals() {
    assert_eq!(expect_number(&eval("42")), 42.0);
    assert_eq!(expect_text(&eval("\"hello\"")), "hello");
    assert!(expect_bool(&eval("true")));
    assert!(!expect_bool(&eval("false")));
    assert!(eval("null").is_null());
}

#[test]
fn evaluates_arithmetic_with_precedence() {
    assert_eq!(expect_number(&eval("1 + 2")), 3.0);
    assert_eq!(expect_number(&eval("1 - 2")), -1.0);
    assert_eq!(expect_number(&eval("2 * 3")), 6.0);
    assert_eq!(expect_number(&eval("6 / 3")), 2.0);
    assert_eq!(expect_number(&eval("4 % 3")), 1.0);
    assert_eq!(expect_number(&eval("2 + 3 * 4")), 14.0);
    assert_eq!(expect_number(&eval("(2 + 3) * 4")), 20.0);
    assert_eq!(expect_number(&eval("-5")), -5.0);
    assert_eq!(expect_number(&eval("\"5\" * 2")), 10.0);
}

#[test]
fn concatenates_when_either_side_is_text() {
    assert_eq!(expect_text(&eval("\"hello\" + \" world\"")), "hello world");
    assert_eq!(expect_text(&eval("\"hello\" + 42")), "hello42");
    assert_eq!(expect_text(&eval("1.5 + \"x\"")), "1.5x");
    assert_eq!(expect_text(&eval("\"value: \" + null")), "value: ");
    assert_eq!(expect_text(&eval("\"flag \" + true")), "flag true");
}

#[test]
fn compares_values() {
    assert!(expect_bool(&eval("1 < 2")));
    assert!(!expect_bool(&eval("1 > 2")));
    assert!(expect_bool(&eval("1 <= 1")));
    assert!(expect_bool(&eval("1 >= 1")));
    assert!(expect_bool(&eval("1 == 1")));
    assert!(!expect_bool(&eval("1 != 1")));
    assert!(expect_bool(&eval("\"a\" < \"b\"")));
    assert!(expect_bool(&eval("\"a\" == \"a\"")));
    assert!(!expect_bool(&eval("1 == \"1\"")));
    assert!(expect_bool(&eval("null == null")));
}

#[test]
fn ordering_between_unrelated_kinds_is_unsupported() {
    match eval_error("1 < \"a\"") {
        SkribeError::UnsupportedOperator {
            operator,
            left,
            right,
        } => {
            assert_eq!(operator, "<");
            assert_eq!(left, "number");
            assert_eq!(right, "text");
        }
        other => panic!("expected unsupported operator, found {other:?}"),
    }
    assert!(matches!(
        eval_error("\"abc\" - 1"),
        SkribeError::UnsupportedOperator { .. }
    ));
}

#[test]
fn logical_operators_short_circuit() {
    assert!(expect_bool(&eval("true and true")));
    assert!(!expect_bool(&eval("true and false")));
    assert!(expect_bool(&eval("true or false")));
    assert!(!expect_bool(&eval("false or false")));
    assert!(!expect_bool(&eval("not true")));
    assert!(expect_bool(&eval("not false")));
    assert!(expect_bool(&eval("!0")));
    assert!(!expect_bool(&eval("false and nonexistent")));
    assert!(expect_bool(&eval("true or nonexistent")));
    assert!(expect_bool(&eval("1 and \"x\"")));
    assert!(expect_bool(&eval("false || 1 && true")));
}

#[test]
fn variables_follow_the_context_chain() {
    let registry = registry();
    let ctx = Context::new();

    eval_in(&registry, &ctx, "var x = 42");
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "x")), 42.0);

    eval_in(&registry, &ctx, "x = 10");
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "x")), 10.0);

    let child = Context::child(&ctx);
    eval_in(&registry, &child, "var y = 20");
    assert_eq!(expect_number(&eval_in(&registry, &child, "y")), 20.0);
    assert_eq!(expect_number(&eval_in(&registry, &child, "x")), 10.0);

    for name in ["z", "y"] {
        match registry.execute(name, Some(&ctx)) {
            Err(SkribeError::UndefinedVariable { name: missing }) => assert_eq!(missing, name),
            other => panic!("expected undefined variable, found {other:?}"),
        }
    }
}

#[test]
fn assignment_in_child_shadows_instead_of_mutating_parent() {
    let registry = registry();
    let ctx = Context::new();
    eval_in(&registry, &ctx, "var x = 1");

    let child = Context::child(&ctx);
    eval_in(&registry, &child, "x = 5");

    assert_eq!(expect_number(&eval_in(&registry, &child, "x")), 5.0);
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "x")), 1.0);

    let scope = child.borrow();
    assert!(scope.has_local("x"));
    assert!(scope.parent().is_some_and(|parent| Rc::ptr_eq(parent, &ctx)));
    assert_eq!(scope.local_names().collect::<Vec<_>>(), vec!["x"]);
    assert!(ctx.borrow().parent().is_none());
}

#[test]
fn globals_are_the_last_fallback() {
    let registry = registry();
    registry.set_global("score", Value::number(7.0));
    let ctx = Context::new();

    assert_eq!(expect_number(&eval_in(&registry, &ctx, "score + 1")), 8.0);
    eval_in(&registry, &ctx, "score = 1");
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "score")), 1.0);
    assert_eq!(registry.global("score").map(|v| expect_number(&v)), Some(7.0));
}

#[test]
fn if_statement_picks_one_branch() {
    let registry = registry();
    let ctx = Context::new();
    let program = "
        if (x > 5) {
          x = 20
        } else {
          x = 0
        }
    ";

    eval_in(&registry, &ctx, "var x = 10");
    eval_in(&registry, &ctx, program);
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "x")), 20.0);

    eval_in(&registry, &ctx, "x = 3");
    eval_in(&registry, &ctx, program);
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "x")), 0.0);

    assert!(eval("if (false) 1").is_null());
}

#[test]
fn else_may_start_on_next_line() {
    let value = eval(
        "
        var x = 0
        if (false) {
          x = 1
        }
        else {
          x = 2
        }
        x
        ",
    );
    assert_eq!(expect_number(&value), 2.0);
}

#[test]
fn while_loop_accumulates() {
    let value = eval(
        "
        var x = 0
        var i = 0
        while (i < 5) {
          x = x + i
          i = i + 1
        }
        x
        ",
    );
    assert_eq!(expect_number(&value), 10.0);
}

#[test]
fn loops_yield_last_body_value() {
    assert_eq!(expect_number(&eval("var i = 0\nwhile (i < 3) i = i + 1")), 3.0);
    assert!(eval("while (false) 1").is_null());
}

#[test]
fn for_loop_runs_in_enclosing_context() {
    let registry = registry();
    let ctx = Context::new();
    eval_in(
        &registry,
        &ctx,
        "
        var sum = 0
        for (var i = 0; i < 5; i = i + 1) {
          sum = sum + i
        }
        ",
    );
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "sum")), 10.0);
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "i")), 5.0);
}

#[test]
fn functions_return_values_and_recurse() {
    let registry = registry();
    let ctx = Context::new();
    eval_in(
        &registry,
        &ctx,
        "
        function add(a, b) { return a + b }
        var result = add(2, 3)
        ",
    );
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "result")), 5.0);

    eval_in(
        &registry,
        &ctx,
        "
        function factorial(n) {
          if (n <= 1) return 1
          return n * factorial(n - 1)
        }
        var fact5 = factorial(5)
        ",
    );
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "fact5")), 120.0);
}

#[test]
fn return_inside_nested_block_exits_the_function() {
    let registry = registry();
    let ctx = Context::new();
    eval_in(
        &registry,
        &ctx,
        "
        function find_first(limit) {
          var i = 0
          while (i < limit) {
            if (i == 3) { return i }
            i = i + 1
          }
          return -1
        }
        ",
    );
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "find_first(10)")), 3.0);
    assert_eq!(expect_number(&eval_in(&registry, &ctx, "find_first(2)")), -1.0);
}

#[test]
fn bare_return_gives_null() {
    assert!(eval("function nothing() {\n  return\n}\nnothing()").is_null());
}

#[test]
fn return_ends_the_script() {
    assert_eq!(expect_number(&eval("return 5\n10")), 5.0);
}

#[test]
fn function_without_return_yields_last_value() {
    assert_eq!(expect_number(&eval("function two() { 1 + 1 }\ntwo()")), 2.0);
}

#[test]
fn functions_close_over_their_defining_context() {
    let value = eval(
        "
        var base = 10
        function add_base(n) { return n + base }
        base = 30
        add_base(5)
        ",
    );
    assert_eq!(expect_number(&value), 35.0);
}

#[test]
fn function_names_are_global() {
    let value = eval(
        "
        function outer() {
          function inner() { return 7 }
          return 1
        }
        outer()
        inner()
        ",
    );
    assert_eq!(expect_number(&value), 7.0);
}

#[test]
fn function_locals_do_not_leak() {
    let err = eval_error(
        "
        function f() {
          var local = 1
          return local
        }
        f()
        local
        ",
    );
    assert!(matches!(err, SkribeError::UndefinedVariable { name } if name == "local"));
}

#[test]
fn call_arity_is_checked() {
    match eval_error("function add(a, b) { return a + b }\nadd(1)") {
        SkribeError::TooFewArguments {
            function,
            required,
            received,
        } => {
            assert_eq!(function, "add");
            assert_eq!((required, received), (2, 1));
        }
        other => panic!("expected too few arguments, found {other:?}"),
    }
    match eval_error("function add(a, b) { return a + b }\nadd(1, 2, 3)") {
        SkribeError::TooManyArguments {
            accepted, received, ..
        } => assert_eq!((accepted, received), (2, 3)),
        other => panic!("expected too many arguments, found {other:?}"),
    }
}

#[test]
fn unknown_function_is_an_error() {
    assert!(matches!(
        eval_error("missing(1)"),
        SkribeError::UnknownFunction { name } if name == "missing"
    ));
}

#[test]
fn member_access_on_builtin_values() {
    assert_eq!(expect_number(&eval("var s = \"hello\"\ns.length")), 5.0);
    assert!(matches!(
        eval_error("var n = null\nn.field"),
        SkribeError::NullMemberAccess { member } if member == "field"
    ));
    assert!(matches!(
        eval_error("var n = 5\nn.size"),
        SkribeError::NoSuchMember { member, type_name } if member == "size" && type_name == "number"
    ));
    assert!(matches!(
        eval_error("var n = 5\nn.size = 2"),
        SkribeError::NoSuchMember { .. }
    ));
}

#[test]
fn unknown_operator_is_fatal() {
    let script = Script::new(Node::Binary {
        left: Box::new(Node::Literal(Value::number(1.0))),
        operator: "^".to_string(),
        right: Box::new(Node::Literal(Value::number(2.0))),
    });
    let registry = registry();
    match registry.execute_script(&script, &Context::new()) {
        Err(SkribeError::UnknownOperator { operator }) => assert_eq!(operator, "^"),
        other => panic!("expected unknown operator, found {other:?}"),
    }
}

#[test]
fn runs_natural_language_program() {
    let value = eval(
        "
        set price to 10
        set tax to 2
        set total to price plus tax
        if (total is greater than 11) then
          set verdict to \"expensive\"
        end if
        verdict + \" at \" + total
        ",
    );
    assert_eq!(expect_text(&value), "expensive at 12");
}

#[test]
fn syntax_errors_prevent_any_execution() {
    let registry = registry();
    let ctx = Context::new();
    let result = registry.execute("var ran = true\nvar broken = (1 + ", Some(&ctx));
    assert!(matches!(result, Err(SkribeError::Syntax { .. })));
    assert!(Context::get(&ctx, "ran").is_none());
}
