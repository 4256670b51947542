use std::rc::Rc;

use crate::{
    ast::{BinaryOp, Call, Expression, FunctionDef, Operand, Program, Stmt, StmtKind},
    diagnostics::{Diagnostic, DiagnosticKind},
    lexer::Scanner,
    stack::ensure_sufficient_stack,
    token::{Token, TokenKind},
};

pub fn parse_program(source: &str) -> Result<Program, Diagnostic> {
    Parser::new(Scanner::new(source)).parse_program()
}

struct Parser<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Parser<'a> {
    fn new(scanner: Scanner<'a>) -> Self {
        Self { scanner }
    }

    fn parse_program(&mut self) -> Result<Program, Diagnostic> {
        let items = self.parse_block(true)?;
        let next = self.peek()?;
        if !next.is_eof() {
            return Err(syntax_error(next, "unexpected token"));
        }
        Ok(Program { items })
    }

    /// Parses items up to (not including) `end`, `else` or end of input.
    /// Blocks nest through `if` and `while`, so each level is stack guarded.
    fn parse_block(&mut self, top_level: bool) -> Result<Vec<Stmt>, Diagnostic> {
        ensure_sufficient_stack(|| self.parse_block_items(top_level))
    }

    fn parse_block_items(&mut self, top_level: bool) -> Result<Vec<Stmt>, Diagnostic> {
        let mut items = Vec::new();
        loop {
            let token = self.peek()?.clone();
            if token.is_eof()
                || token.is(TokenKind::Keyword, "end")
                || token.is(TokenKind::Keyword, "else")
            {
                break;
            }
            let item = match (token.kind, token.lexeme.as_str()) {
                (TokenKind::Keyword, "while") => self.parse_while()?,
                (TokenKind::Keyword, "if") => self.parse_if()?,
                (TokenKind::Keyword, "return") => self.parse_return()?,
                (TokenKind::Keyword, "def") if top_level => self.parse_function()?,
                (TokenKind::Keyword, "def") => {
                    return Err(syntax_error(
                        &token,
                        "functions may only be defined at the top level",
                    ));
                }
                _ => {
                    let expr = self.parse_expression()?;
                    Stmt {
                        line: expr.line,
                        kind: StmtKind::Expression(expr),
                    }
                }
            };
            items.push(item);
        }
        Ok(items)
    }

    fn parse_while(&mut self) -> Result<Stmt, Diagnostic> {
        let line = self.consume(TokenKind::Keyword, "while", "expected `while`")?.line;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Keyword, "do", "expected `do` after loop condition")?;
        let body = self.parse_block(false)?;
        self.consume(TokenKind::Keyword, "end", "expected `end` to close `while`")?;
        self.consume(TokenKind::Separator, ";", "expected `;` after `end`")?;
        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            line,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let line = self.consume(TokenKind::Keyword, "if", "expected `if`")?.line;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::Keyword, "do", "expected `do` after condition")?;
        let then_branch = self.parse_block(false)?;
        let else_branch = if self.matches(TokenKind::Keyword, "else")? {
            Some(self.parse_block(false)?)
        } else {
            None
        };
        self.consume(TokenKind::Keyword, "end", "expected `end` to close `if`")?;
        self.consume(TokenKind::Separator, ";", "expected `;` after `end`")?;
        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            line,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, Diagnostic> {
        let line = self.consume(TokenKind::Keyword, "return", "expected `return`")?.line;
        let value = self.parse_expression()?;
        Ok(Stmt {
            kind: StmtKind::Return(value),
            line,
        })
    }

    fn parse_function(&mut self) -> Result<Stmt, Diagnostic> {
        let line = self.consume(TokenKind::Keyword, "def", "expected `def`")?.line;
        let name = self.consume_identifier("expected function name")?.lexeme;
        self.consume(TokenKind::Separator, "(", "expected `(` after function name")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::Separator, ")")? {
            loop {
                params.push(self.consume_identifier("expected parameter name")?.lexeme);
                if !self.matches(TokenKind::Separator, ",")? {
                    break;
                }
            }
        }
        self.consume(TokenKind::Separator, ")", "expected `)` after parameters")?;
        self.consume(TokenKind::Keyword, "do", "expected `do` before function body")?;
        let body = self.parse_block(false)?;
        self.consume(TokenKind::Keyword, "end", "expected `end` to close function")?;
        self.consume(TokenKind::Separator, ";", "expected `;` after `end`")?;
        let def = FunctionDef {
            name,
            params,
            body,
            line,
        };
        Ok(Stmt {
            kind: StmtKind::Function(Rc::new(def)),
            line,
        })
    }

    fn parse_expression(&mut self) -> Result<Expression, Diagnostic> {
        let line = self.peek()?.line;
        let is_assignment = self.peek()?.kind == TokenKind::Identifier
            && self.scanner.peek(1)?.is(TokenKind::Punct, "=");
        let target = if is_assignment {
            let name = self.advance()?.lexeme;
            self.advance()?;
            Some(name)
        } else {
            None
        };

        let first = self.parse_factor()?;
        let mut rest = Vec::new();
        while self.peek()?.kind == TokenKind::Punct {
            let token = self.advance()?;
            let op = BinaryOp::from_symbol(&token.lexeme).ok_or_else(|| {
                syntax_error(&token, "assignment is only allowed at the start of an expression")
            })?;
            rest.push((op, self.parse_factor()?));
        }

        if !self.matches(TokenKind::Separator, ";")? {
            let next = self.peek()?;
            let ends_nested = next.is(TokenKind::Keyword, "do")
                || next.is(TokenKind::Separator, ")")
                || next.is(TokenKind::Separator, ",");
            if !ends_nested {
                return Err(syntax_error(next, "expected `;` after expression"));
            }
        }

        Ok(Expression {
            target,
            first,
            rest,
            line,
        })
    }

    fn parse_factor(&mut self) -> Result<Operand, Diagnostic> {
        ensure_sufficient_stack(|| {
            if self.matches(TokenKind::Separator, "(")? {
                let inner = self.parse_expression()?;
                self.consume(TokenKind::Separator, ")", "expected `)`")?;
                return Ok(Operand::Group(Box::new(inner)));
            }
            let token = self.advance()?;
            match token.kind {
                TokenKind::Identifier => {
                    if self.check(TokenKind::Separator, "(")? {
                        self.parse_call(token)
                    } else {
                        Ok(Operand::Identifier {
                            name: token.lexeme,
                            line: token.line,
                        })
                    }
                }
                TokenKind::Number => Ok(Operand::Number(token.value)),
                TokenKind::String => Ok(Operand::String(token.lexeme)),
                _ => Err(syntax_error(&token, "expected an operand")),
            }
        })
    }

    fn parse_call(&mut self, callee: Token) -> Result<Operand, Diagnostic> {
        self.consume(TokenKind::Separator, "(", "expected `(`")?;
        let mut args = Vec::new();
        if !self.check(TokenKind::Separator, ")")? {
            loop {
                args.push(self.parse_expression()?);
                if !self.matches(TokenKind::Separator, ",")? {
                    break;
                }
            }
        }
        self.consume(TokenKind::Separator, ")", "expected `)` after arguments")?;
        Ok(Operand::Call(Call {
            callee: callee.lexeme,
            args,
            line: callee.line,
        }))
    }

    fn check(&mut self, kind: TokenKind, lexeme: &str) -> Result<bool, Diagnostic> {
        Ok(self.peek()?.is(kind, lexeme))
    }

    fn matches(&mut self, kind: TokenKind, lexeme: &str) -> Result<bool, Diagnostic> {
        if self.check(kind, lexeme)? {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn consume(&mut self, kind: TokenKind, lexeme: &str, message: &str) -> Result<Token, Diagnostic> {
        let token = self.advance()?;
        if token.is(kind, lexeme) {
            Ok(token)
        } else {
            Err(syntax_error(&token, message))
        }
    }

    fn consume_identifier(&mut self, message: &str) -> Result<Token, Diagnostic> {
        let token = self.advance()?;
        if token.kind == TokenKind::Identifier {
            Ok(token)
        } else {
            Err(syntax_error(&token, message))
        }
    }

    fn advance(&mut self) -> Result<Token, Diagnostic> {
        self.scanner.next_token()
    }

    fn peek(&mut self) -> Result<&Token, Diagnostic> {
        self.scanner.peek(0)
    }
}

fn syntax_error(token: &Token, message: &str) -> Diagnostic {
    let diag = Diagnostic::new(
        DiagnosticKind::Syntax,
        format!("syntax error near {}: {message}", token.location()),
    );
    if token.is_eof() {
        diag
    } else {
        diag.with_line(token.line)
    }
}
