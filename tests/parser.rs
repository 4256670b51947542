use pretty_assertions::assert_eq;
use sloth::{
    ast::{BinaryOp, Expression, Operand, Program, StmtKind},
    parser::parse_program,
    Diagnostic, DiagnosticKind,
};

fn parse(source: &str) -> Program {
    parse_program(source).expect("source should parse")
}

fn parse_error(source: &str) -> Diagnostic {
    match parse_program(source) {
        Ok(program) => panic!("expected syntax error, parsed {program}"),
        Err(diag) => diag,
    }
}

fn single_expression(source: &str) -> Expression {
    let program = parse(source);
    assert_eq!(program.items.len(), 1);
    match &program.items[0].kind {
        StmtKind::Expression(expr) => expr.clone(),
        other => panic!("expected expression statement, found {other:?}"),
    }
}

fn ident(name: &str) -> Operand {
    Operand::Identifier {
        name: name.to_string(),
        line: 1,
    }
}

#[test]
fn expression_keeps_flat_operand_operator_order() {
    let expr = single_expression("a + b * c;");
    assert_eq!(expr.target, None);
    assert_eq!(expr.first, ident("a"));
    assert_eq!(
        expr.rest,
        vec![(BinaryOp::Add, ident("b")), (BinaryOp::Mul, ident("c"))]
    );
    assert_eq!(expr.term_count(), 5);
}

#[test]
fn leading_assignment_sets_target() {
    let expr = single_expression("total = total + 1;");
    assert_eq!(expr.target.as_deref(), Some("total"));
    assert_eq!(expr.first, ident("total"));
    assert_eq!(expr.rest, vec![(BinaryOp::Add, Operand::Number(1))]);
}

#[test]
fn equality_is_not_assignment() {
    let expr = single_expression("x == 1;");
    assert_eq!(expr.target, None);
    assert_eq!(expr.rest, vec![(BinaryOp::Equal, Operand::Number(1))]);
}

#[test]
fn chained_assignment_is_rejected() {
    let err = parse_error("x = y = 1;");
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    assert!(err.message.contains("assignment"), "message was {}", err.message);
}

#[test]
fn identifier_followed_by_paren_is_a_call() {
    let expr = single_expression("f(1, g(2), \"s\");");
    let Operand::Call(call) = &expr.first else {
        panic!("expected call, found {:?}", expr.first);
    };
    assert_eq!(call.callee, "f");
    assert_eq!(call.args.len(), 3);
    assert!(matches!(&call.args[1].first, Operand::Call(inner) if inner.callee == "g"));
    assert_eq!(call.args[2].first, Operand::String("s".to_string()));
}

#[test]
fn parenthesized_expression_is_a_group() {
    let expr = single_expression("(a + b) * c;");
    assert!(matches!(expr.first, Operand::Group(_)));
    assert_eq!(expr.rest, vec![(BinaryOp::Mul, ident("c"))]);
}

#[test]
fn if_else_and_while_structure() {
    let program = parse(
        "while i < 3 do\n  if i == 1 do a; else b; c; end;\n  i = i + 1;\nend;",
    );
    let StmtKind::While { body, .. } = &program.items[0].kind else {
        panic!("expected while loop");
    };
    assert_eq!(body.len(), 2);
    let StmtKind::If {
        then_branch,
        else_branch,
        ..
    } = &body[0].kind
    else {
        panic!("expected if statement");
    };
    assert_eq!(then_branch.len(), 1);
    assert_eq!(else_branch.as_ref().map(Vec::len), Some(2));
    assert_eq!(body[0].line, 2);
}

#[test]
fn function_definition_records_parameters() {
    let program = parse("def add(a, b) do return a + b; end;");
    let StmtKind::Function(def) = &program.items[0].kind else {
        panic!("expected function definition");
    };
    assert_eq!(def.name, "add");
    assert_eq!(def.params, vec!["a", "b"]);
    assert_eq!(def.body.len(), 1);
}

#[test]
fn nested_definition_is_rejected() {
    let err = parse_error("if 1 do\n  def f() do 1; end;\nend;");
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    assert_eq!(err.line, Some(2));
}

#[test]
fn missing_semicolon_points_at_next_token() {
    let err = parse_error("x = 1\ny = 2;");
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    assert_eq!(err.line, Some(2));
    assert!(err.message.contains("`y`"), "message was {}", err.message);
}

#[test]
fn truncated_input_reports_end_of_input() {
    for source in ["x = ", "if x do y;", "def f(a, b)", "f(1, 2"] {
        let err = parse_error(source);
        assert_eq!(err.kind, DiagnosticKind::Syntax, "source {source:?}");
        assert!(
            err.message.contains("end of input"),
            "source {source:?} gave {}",
            err.message
        );
        assert_eq!(err.line, None);
    }
}

#[test]
fn stray_end_is_rejected() {
    let err = parse_error("x;\nend;");
    assert_eq!(err.kind, DiagnosticKind::Syntax);
    assert_eq!(err.line, Some(2));
}

#[test]
fn lex_errors_surface_through_the_parser() {
    let err = parse_error("x = 1 @ 2;");
    assert_eq!(err.kind, DiagnosticKind::Lex);
}

#[test]
fn program_renders_as_s_expression() {
    let program = parse(
        r#"
        def fact(n) do
          if n == 0 do
            return 1;
          else
            return n * fact(n - 1);
          end;
        end;
        x = fact(5) + "!";
        "#,
    );
    assert_eq!(
        program.to_string(),
        "((<def>fact(n)=>((<if>(n == 0)=>((<return>(1)))!((<return>(n * fact((n - 1)))))))) \
         (x = fact((5)) + \"!\"))"
    );
}

#[test]
fn deeply_nested_blocks_parse() {
    let depth = 1500;
    let source = format!(
        "{}x = 1;{}",
        "if 1 do while 0 do ".repeat(depth),
        " end; end;".repeat(depth)
    );
    let program = parse(&source);
    assert_eq!(program.items.len(), 1);

    let mut levels = 0;
    let mut block = &program.items;
    while let Some(StmtKind::If { then_branch, .. }) = block.first().map(|stmt| &stmt.kind) {
        let Some(StmtKind::While { body, .. }) = then_branch.first().map(|stmt| &stmt.kind)
        else {
            panic!("expected while loop at level {levels}");
        };
        block = body;
        levels += 1;
    }
    assert_eq!(levels, depth);
}
