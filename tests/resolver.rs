use rox::error::Diagnostics;
use rox::expr::{Expr, ExprId};
use rox::interpreter::Interpreter;
use rox::parser::Parser;
use rox::resolver::Resolver;
use rox::scanner::scan_tokens;
use rox::stmt::Stmt;

fn resolve(source: &str) -> (Vec<Stmt>, Interpreter, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tokens = scan_tokens(source, &mut diagnostics);
    let statements = Parser::new(&tokens).parse(&mut diagnostics);
    assert!(!diagnostics.has_errors(), "source must parse cleanly");

    let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));
    Resolver::new(&mut interpreter, &mut diagnostics).resolve(&statements);

    (statements, interpreter, diagnostics)
}

fn messages(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics.errors().iter().map(|e| e.to_string()).collect()
}

/// Id of the variable read inside `print <name>;`.
fn printed_variable(stmt: &Stmt) -> ExprId {
    match stmt {
        Stmt::Print(Expr::Variable { id, .. }) => *id,
        other => panic!("expected print of a variable, got {:?}", other),
    }
}

#[test]
fn self_referential_initializer_in_block_is_reported_once() {
    let (_, _, diagnostics) = resolve("{ var a = a; }");

    assert_eq!(
        messages(&diagnostics),
        vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
    );
}

#[test]
fn self_referential_initializer_at_top_level_is_reported_once() {
    let (statements, interpreter, diagnostics) = resolve("var a = a;");

    assert_eq!(
        messages(&diagnostics),
        vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
    );

    // Still a global: no distance is recorded.
    let Stmt::Var {
        initializer: Some(Expr::Variable { id, .. }),
        ..
    } = &statements[0]
    else {
        panic!("expected var with variable initializer");
    };
    assert_eq!(interpreter.distance(*id), None);
}

#[test]
fn existing_global_may_feed_a_different_global() {
    let (_, _, diagnostics) = resolve("var a = 1;\nvar b = a;\nvar a2 = b + a;");

    assert!(!diagnostics.has_errors());
}

#[test]
fn shadowing_initializer_sees_its_own_declaration_first() {
    let (_, _, diagnostics) = resolve("{ var a = 1; { var a = a + 1; } }");

    // The inner `a` is already declared in the innermost scope.
    assert_eq!(diagnostics.errors().len(), 1);
}

#[test]
fn outer_local_is_readable_from_nested_initializer() {
    let (_, _, diagnostics) = resolve("{ var a = 1; { var b = a + 1; } }");

    assert!(!diagnostics.has_errors());
}

#[test]
fn redeclaration_in_same_scope_is_reported() {
    let (_, _, diagnostics) = resolve("{ var x = 1; var x = 2; }");

    assert_eq!(
        messages(&diagnostics),
        vec!["[line 1] Error at 'x': Already a variable with this name in this scope."]
    );
}

#[test]
fn shadowing_in_nested_block_resolves_to_distance_zero() {
    let (statements, interpreter, diagnostics) = resolve("{ var x = 1; { var x = 2; print x; } print x; }");

    assert!(!diagnostics.has_errors());

    let Stmt::Block(outer) = &statements[0] else {
        panic!("expected block");
    };
    let Stmt::Block(inner) = &outer[1] else {
        panic!("expected nested block");
    };

    assert_eq!(interpreter.distance(printed_variable(&inner[1])), Some(0));
    assert_eq!(interpreter.distance(printed_variable(&outer[2])), Some(0));
}

#[test]
fn enclosing_scope_reference_counts_hops() {
    let (statements, interpreter, _) = resolve("{ var x = 1; { { print x; } } }");

    let Stmt::Block(outer) = &statements[0] else {
        panic!("expected block");
    };
    let Stmt::Block(middle) = &outer[1] else {
        panic!("expected block");
    };
    let Stmt::Block(inner) = &middle[0] else {
        panic!("expected block");
    };

    assert_eq!(interpreter.distance(printed_variable(&inner[0])), Some(2));
}

#[test]
fn globals_are_left_unresolved() {
    let (statements, interpreter, _) = resolve("var g = 1; print g;");

    assert_eq!(interpreter.distance(printed_variable(&statements[1])), None);
}

#[test]
fn parameters_and_body_share_one_scope() {
    let (statements, interpreter, diagnostics) = resolve("fun f(a) { print a; }");

    assert!(!diagnostics.has_errors());

    let Stmt::Function(declaration) = &statements[0] else {
        panic!("expected function");
    };

    assert_eq!(interpreter.distance(printed_variable(&declaration.body[0])), Some(0));
}

#[test]
fn this_inside_method_resolves_past_the_call_scope() {
    let (statements, interpreter, diagnostics) = resolve("class A { show() { print this; } }");

    assert!(!diagnostics.has_errors());

    let Stmt::Class { methods, .. } = &statements[0] else {
        panic!("expected class");
    };

    let Stmt::Print(Expr::This { id, .. }) = &methods[0].body[0] else {
        panic!("expected print this");
    };

    assert_eq!(interpreter.distance(*id), Some(1));
}

#[test]
fn return_at_top_level_is_reported() {
    let (_, _, diagnostics) = resolve("return 1;");

    assert_eq!(
        messages(&diagnostics),
        vec!["[line 1] Error at 'return': Can't return from top-level code."]
    );
}

#[test]
fn returning_a_value_from_an_initializer_is_reported() {
    let (_, _, diagnostics) = resolve("class A { constructor() { return 1; } }");

    assert_eq!(
        messages(&diagnostics),
        vec!["[line 1] Error at 'return': Can't return a value from an initializer."]
    );
}

#[test]
fn bare_return_in_initializer_is_allowed() {
    let (_, _, diagnostics) = resolve("class A { constructor() { return; } }");

    assert!(!diagnostics.has_errors());
}

#[test]
fn this_outside_class_is_reported() {
    let (_, _, diagnostics) = resolve("print this;\nfun f() { return this; }");

    assert_eq!(
        messages(&diagnostics),
        vec![
            "[line 1] Error at 'this': Can't use 'this' outside of a class.",
            "[line 2] Error at 'this': Can't use 'this' outside of a class.",
        ]
    );
}

#[test]
fn resolution_continues_after_an_error() {
    let (_, _, diagnostics) = resolve("return;\n{ var b = 1; var b = 2; }\n{ var c = c; }");

    assert_eq!(diagnostics.errors().len(), 3);
}

#[test]
fn release_forgets_top_level_nodes_but_keeps_function_bodies() {
    let (statements, mut interpreter, diagnostics) =
        resolve("fun f(a) { print a; }\n{ var x = 1; print x; }");

    assert!(!diagnostics.has_errors());

    let Stmt::Function(declaration) = &statements[0] else {
        panic!("expected function");
    };
    let Stmt::Block(block) = &statements[1] else {
        panic!("expected block");
    };

    let in_body: ExprId = printed_variable(&declaration.body[0]);
    let in_block: ExprId = printed_variable(&block[1]);

    assert_eq!(interpreter.distance(in_block), Some(0));

    interpreter.release(&statements);

    assert_eq!(interpreter.distance(in_block), None);
    assert_eq!(interpreter.distance(in_body), Some(0));
}
