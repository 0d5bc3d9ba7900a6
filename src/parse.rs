//! Recursive-descent parser for the gate language.
//!
//! Grammar:
//!
//! ```text
//! program   => priv_obj* function*
//! priv_obj  => "//" "(" identifier "," number ")"
//! function  => identifier "(" params? ")" scope
//! scope     => "{" statement* "}"
//! statement => "return" expr? ";" | scope
//!            | "if" "(" expr ")" statement ("else" statement)? | expr ";"
//! expr      => "(" expr ")" | identifier "(" args? ")" | syscall "(" args? ")"
//!            | (identifier | number) (op expr)?
//! ```
//!
//! Binary operators are right-recursive with no precedence levels;
//! parenthesization is the language's precedence mechanism. The parser builds
//! the arena AST directly and performs no semantic analysis beyond the 16-bit
//! limit on privileged addresses.

use crate::ast::{BinOp, Expr, ExprId, Function, PrivObject, Program, Stmt, StmtId};
use crate::core::error::{ParseError, ParseResult};
use crate::lex::{self, Token, TokenKind};

/// Parse source text into a program.
pub fn parse(source: &str) -> ParseResult<Program> {
    let tokens = lex::tokenize(source)?;
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    program: Program,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            program: Program::new(),
        }
    }

    fn parse(mut self) -> ParseResult<Program> {
        while self.pos < self.tokens.len() {
            match self.peek() {
                Some(TokenKind::PrivMarker) => self.priv_object()?,
                Some(TokenKind::Ident(_)) => self.function()?,
                _ => {
                    return Err(self.unexpected("a privileged-object declaration or a function"))
                }
            }
        }
        Ok(self.program)
    }

    // ---- token cursor -----------------------------------------------------

    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(ParseError::Unexpected {
                found: token.kind.to_string(),
                expected: kind.to_string(),
                line: token.line,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: kind.to_string(),
            }),
        }
    }

    fn expect_ident(&mut self, expected: &str) -> ParseResult<String> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => Ok(name),
            Some(token) => Err(ParseError::Unexpected {
                found: token.kind.to_string(),
                expected: expected.to_string(),
                line: token.line,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::Unexpected {
                found: token.kind.to_string(),
                expected: expected.to_string(),
                line: token.line,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    // ---- declarations -----------------------------------------------------

    fn priv_object(&mut self) -> ParseResult<()> {
        self.expect(TokenKind::PrivMarker)?;
        self.expect(TokenKind::LParen)?;
        let name = self.expect_ident("an identifier")?;
        self.expect(TokenKind::Comma)?;
        let (value, line) = match self.advance() {
            Some(Token {
                kind: TokenKind::Number(value),
                line,
            }) => (value, line),
            Some(token) => {
                return Err(ParseError::Unexpected {
                    found: token.kind.to_string(),
                    expected: "an address".to_string(),
                    line: token.line,
                })
            }
            None => {
                return Err(ParseError::UnexpectedEof {
                    expected: "an address".to_string(),
                })
            }
        };
        let address =
            u16::try_from(value).map_err(|_| ParseError::AddressOutOfRange { value, line })?;
        self.expect(TokenKind::RParen)?;
        self.program.priv_objects.push(PrivObject { name, address });
        Ok(())
    }

    fn function(&mut self) -> ParseResult<()> {
        let name = self.expect_ident("a function name")?;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.peek() != Some(&TokenKind::RParen) {
            params.push(self.expect_ident("a parameter name")?);
            while self.peek() == Some(&TokenKind::Comma) {
                self.advance();
                params.push(self.expect_ident("a parameter name")?);
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.scope()?;
        self.program.functions.push(Function { name, params, body });
        Ok(())
    }

    // ---- statements -------------------------------------------------------

    fn scope(&mut self) -> ParseResult<StmtId> {
        self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while self.peek() != Some(&TokenKind::RBrace) {
            if self.pos >= self.tokens.len() {
                return Err(ParseError::UnexpectedEof {
                    expected: "`}`".to_string(),
                });
            }
            stmts.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(self.program.add_stmt(Stmt::Scope(stmts)))
    }

    fn statement(&mut self) -> ParseResult<StmtId> {
        match self.peek() {
            Some(TokenKind::Return) => {
                self.advance();
                let expr = if self.peek() == Some(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(TokenKind::Semi)?;
                Ok(self.program.add_stmt(Stmt::Return(expr)))
            }
            Some(TokenKind::If) => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                let condition = self.expr()?;
                self.expect(TokenKind::RParen)?;
                let then_stmt = self.statement()?;
                let else_stmt = if self.peek() == Some(&TokenKind::Else) {
                    self.advance();
                    Some(self.statement()?)
                } else {
                    None
                };
                Ok(self.program.add_stmt(Stmt::Branch {
                    condition,
                    then_stmt,
                    else_stmt,
                }))
            }
            Some(TokenKind::LBrace) => self.scope(),
            _ => {
                let expr = self.expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(self.program.add_stmt(Stmt::Expr(expr)))
            }
        }
    }

    // ---- expressions ------------------------------------------------------

    fn expr(&mut self) -> ParseResult<ExprId> {
        let lhs = self.primary()?;
        if let Some(op) = self.peek_binop() {
            self.advance();
            let rhs = self.expr()?;
            return Ok(self.program.add_expr(Expr::Binary { op, lhs, rhs }));
        }
        Ok(lhs)
    }

    fn primary(&mut self) -> ParseResult<ExprId> {
        match self.advance() {
            Some(Token {
                kind: TokenKind::LParen,
                ..
            }) => {
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            Some(Token {
                kind: TokenKind::Number(value),
                ..
            }) => Ok(self.program.add_expr(Expr::Number(value))),
            Some(Token {
                kind: TokenKind::Ident(name),
                ..
            }) => {
                if self.peek() == Some(&TokenKind::LParen) {
                    self.advance();
                    let args = self.args()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(self.program.add_expr(Expr::Call { callee: name, args }))
                } else {
                    Ok(self.program.add_expr(Expr::Ident(name)))
                }
            }
            Some(Token {
                kind: TokenKind::Syscall(call),
                ..
            }) => {
                self.expect(TokenKind::LParen)?;
                let args = self.args()?;
                self.expect(TokenKind::RParen)?;
                Ok(self.program.add_expr(Expr::Syscall { call, args }))
            }
            Some(token) => Err(ParseError::Unexpected {
                found: token.kind.to_string(),
                expected: "an expression".to_string(),
                line: token.line,
            }),
            None => Err(ParseError::UnexpectedEof {
                expected: "an expression".to_string(),
            }),
        }
    }

    fn args(&mut self) -> ParseResult<Vec<ExprId>> {
        let mut args = Vec::new();
        if self.peek() == Some(&TokenKind::RParen) {
            return Ok(args);
        }
        args.push(self.expr()?);
        while self.peek() == Some(&TokenKind::Comma) {
            self.advance();
            args.push(self.expr()?);
        }
        Ok(args)
    }

    fn peek_binop(&self) -> Option<BinOp> {
        match self.peek()? {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::Le => Some(BinOp::Le),
            TokenKind::Ge => Some(BinOp::Ge),
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::Ne => Some(BinOp::Ne),
            TokenKind::Assign => Some(BinOp::Assign),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_privileged_objects_and_functions() {
        let program = parse(
            "//(a, 200)\n\
             //(b, 300)\n\
             main() { a = 1; }\n\
             helper(x, y) { return x + y; }\n",
        )
        .unwrap();

        assert_eq!(program.priv_objects.len(), 2);
        assert_eq!(program.priv_objects[0].name, "a");
        assert_eq!(program.priv_objects[0].address, 200);
        assert_eq!(program.functions.len(), 2);
        assert_eq!(program.functions[1].params, vec!["x", "y"]);
    }

    #[test]
    fn test_assignment_is_right_recursive() {
        // a = d + e parses as a = (d + e)
        let program = parse("main() { a = d + e; }").unwrap();
        let body = match program.stmt(program.functions[0].body) {
            Stmt::Scope(stmts) => stmts.clone(),
            other => panic!("expected scope, got {other:?}"),
        };
        let expr = match program.stmt(body[0]) {
            Stmt::Expr(e) => *e,
            other => panic!("expected expression statement, got {other:?}"),
        };
        match program.expr(expr) {
            Expr::Binary {
                op: BinOp::Assign,
                rhs,
                ..
            } => {
                assert!(matches!(
                    program.expr(*rhs),
                    Expr::Binary { op: BinOp::Add, .. }
                ));
            }
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_branch_with_else() {
        let program = parse(
            "main() { if (a == 5) { if (b) return 1; } else return 2; }",
        )
        .unwrap();
        assert_eq!(program.functions.len(), 1);
    }

    #[test]
    fn test_syscall_expression() {
        let program = parse("main() { open(4, 5); }").unwrap();
        let body = match program.stmt(program.functions[0].body) {
            Stmt::Scope(stmts) => stmts.clone(),
            other => panic!("expected scope, got {other:?}"),
        };
        let expr = match program.stmt(body[0]) {
            Stmt::Expr(e) => *e,
            other => panic!("expected expression statement, got {other:?}"),
        };
        match program.expr(expr) {
            Expr::Syscall { call, args } => {
                assert_eq!(call.number(), 0);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected syscall, got {other:?}"),
        }
    }

    #[test]
    fn test_address_over_16_bits_is_rejected() {
        assert!(matches!(
            parse("//(a, 65536)"),
            Err(ParseError::AddressOutOfRange {
                value: 65536,
                line: 1
            })
        ));
        assert!(parse("//(a, 65535)").is_ok());
    }

    #[test]
    fn test_missing_semicolon_is_diagnosed() {
        assert!(matches!(
            parse("main() { a = 1 }"),
            Err(ParseError::Unexpected { .. })
        ));
    }

    #[test]
    fn test_unterminated_scope_is_diagnosed() {
        assert!(matches!(
            parse("main() { a = 1;"),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }
}
