use rox::error::Diagnostics;
use rox::expr::{Expr, LiteralValue};
use rox::parser::Parser;
use rox::scanner::scan_tokens;
use rox::stmt::Stmt;
use rox::token::TokenType;

fn parse(source: &str) -> (Vec<Stmt>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tokens = scan_tokens(source, &mut diagnostics);
    let statements = Parser::new(&tokens).parse(&mut diagnostics);
    (statements, diagnostics)
}

fn parse_ok(source: &str) -> Vec<Stmt> {
    let (statements, diagnostics) = parse(source);
    assert!(
        !diagnostics.has_errors(),
        "unexpected diagnostics: {:?}",
        diagnostics.errors()
    );
    statements
}

fn messages(diagnostics: &Diagnostics) -> Vec<String> {
    diagnostics.errors().iter().map(|e| e.to_string()).collect()
}

#[test]
fn factor_binds_tighter_than_term() {
    let statements = parse_ok("1 + 2 * 3;");

    let Stmt::Expression(Expr::Binary { left, operator, right }) = &statements[0] else {
        panic!("expected binary expression, got {:?}", statements[0]);
    };

    assert_eq!(operator.token_type, TokenType::PLUS);
    assert_eq!(**left, Expr::Literal(LiteralValue::Number(1.0)));
    assert!(matches!(
        &**right,
        Expr::Binary { operator, .. } if operator.token_type == TokenType::STAR
    ));
}

#[test]
fn logical_or_is_lower_than_and() {
    let statements = parse_ok("a or b and c;");

    let Stmt::Expression(Expr::Logical { operator, right, .. }) = &statements[0] else {
        panic!("expected logical expression");
    };

    assert_eq!(operator.token_type, TokenType::OR);
    assert!(matches!(
        &**right,
        Expr::Logical { operator, .. } if operator.token_type == TokenType::AND
    ));
}

#[test]
fn assignment_is_right_associative() {
    let statements = parse_ok("a = b = 1;");

    let Stmt::Expression(Expr::Assign { name, value, .. }) = &statements[0] else {
        panic!("expected assignment");
    };

    assert_eq!(name.lexeme, "a");
    assert!(matches!(&**value, Expr::Assign { name, .. } if name.lexeme == "b"));
}

#[test]
fn property_assignment_becomes_set() {
    let statements = parse_ok("a.b.c = 3;");

    let Stmt::Expression(Expr::Set { object, name, .. }) = &statements[0] else {
        panic!("expected set expression");
    };

    assert_eq!(name.lexeme, "c");
    assert!(matches!(&**object, Expr::Get { name, .. } if name.lexeme == "b"));
}

#[test]
fn chained_calls_and_property_access() {
    let statements = parse_ok("a.b(1)(2).c;");

    let Stmt::Expression(Expr::Get { object, name }) = &statements[0] else {
        panic!("expected get expression");
    };
    assert_eq!(name.lexeme, "c");

    let Expr::Call { callee, arguments, .. } = &**object else {
        panic!("expected outer call");
    };
    assert_eq!(arguments.len(), 1);

    let Expr::Call { callee, .. } = &**callee else {
        panic!("expected inner call");
    };
    assert!(matches!(&**callee, Expr::Get { name, .. } if name.lexeme == "b"));
}

#[test]
fn invalid_assignment_target_is_reported_but_parsing_continues() {
    let (statements, diagnostics) = parse("1 + 2 = 3; print 4;");

    assert_eq!(
        messages(&diagnostics),
        vec!["[line 1] Error at '=': Invalid assignment target."]
    );
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0],
        Stmt::Expression(Expr::Literal(LiteralValue::Number(3.0)))
    );
}

#[test]
fn synchronize_recovers_at_next_statement() {
    let (statements, diagnostics) = parse("var = 1;\nprint 2;\nvar x 3;\nprint x;");

    assert_eq!(
        messages(&diagnostics),
        vec![
            "[line 1] Error at '=': Expect variable name.",
            "[line 3] Error at '3': Expect ';' after variable declaration.",
        ]
    );

    // Both print statements survive.
    assert_eq!(statements.len(), 2);
    assert!(statements.iter().all(|s| matches!(s, Stmt::Print(_))));
}

#[test]
fn missing_expression_at_end_of_input() {
    let (_, diagnostics) = parse("print");

    assert_eq!(
        messages(&diagnostics),
        vec!["[line 1] Error at end: Expect expression."]
    );
}

#[test]
fn for_loop_desugars_to_while_in_blocks() {
    let statements = parse_ok("for (var i = 0; i < 3; i = i + 1) print i;");

    let Stmt::Block(outer) = &statements[0] else {
        panic!("expected outer block");
    };
    assert_eq!(outer.len(), 2);
    assert!(matches!(&outer[0], Stmt::Var { name, .. } if name.lexeme == "i"));

    let Stmt::While { body, .. } = &outer[1] else {
        panic!("expected while loop");
    };

    let Stmt::Block(inner) = &**body else {
        panic!("expected body block");
    };
    assert!(matches!(inner[0], Stmt::Print(_)));
    assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
}

#[test]
fn for_loop_without_clauses_loops_on_true() {
    let statements = parse_ok("for (;;) print 1;");

    let Stmt::While { condition, body } = &statements[0] else {
        panic!("expected bare while loop, got {:?}", statements[0]);
    };

    assert_eq!(*condition, Expr::Literal(LiteralValue::Bool(true)));
    assert!(matches!(**body, Stmt::Print(_)));
}

#[test]
fn class_declaration_collects_methods() {
    let statements = parse_ok("class P { constructor(x) { this.x = x; } getX() { return this.x; } }");

    let Stmt::Class { name, methods } = &statements[0] else {
        panic!("expected class");
    };

    assert_eq!(name.lexeme, "P");
    let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
    assert_eq!(names, vec!["constructor", "getX"]);
    assert_eq!(methods[0].params.len(), 1);
}

#[test]
fn import_accepts_dotted_path() {
    let statements = parse_ok("import std.io;");

    let Stmt::Import { path, .. } = &statements[0] else {
        panic!("expected import");
    };

    let segments: Vec<&str> = path.iter().map(|t| t.lexeme.as_str()).collect();
    assert_eq!(segments, vec!["std", "io"]);
}

#[test]
fn too_many_arguments_is_reported_not_fatal() {
    let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
    let source = format!("f({});", args.join(", "));

    let (statements, diagnostics) = parse(&source);

    assert_eq!(diagnostics.errors().len(), 1);
    assert!(messages(&diagnostics)[0].ends_with("Can't have more than 255 arguments."));

    let Stmt::Expression(Expr::Call { arguments, .. }) = &statements[0] else {
        panic!("expected call");
    };
    assert_eq!(arguments.len(), 256);
}

#[test]
fn too_many_parameters_is_reported_not_fatal() {
    let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    let (statements, diagnostics) = parse(&source);

    assert_eq!(diagnostics.errors().len(), 1);
    assert!(messages(&diagnostics)[0].ends_with("Can't have more than 255 parameters."));
    assert_eq!(statements.len(), 1);
}
