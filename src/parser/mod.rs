//! Parser for the imp surface language
//!
//! A recursive descent parser that produces top-level units from a token
//! stream. Surface conveniences are desugared here, so the evaluator only
//! ever sees the core [`Expr`] variants:
//!
//! - every surface variable lives in a cell, so reading `x` becomes
//!   `deref(x)`;
//! - function, procedure and method bodies rebind their parameters to
//!   fresh cells;
//! - blocks become a `Let` of cell-wrapped declarations over a `Do`;
//! - `for` becomes an initializer followed by a `While`.

use std::rc::Rc;

use crate::ast::*;
use crate::common::Span;
use crate::diagnostics::{SourceFile, SyntaxError};
use crate::lexer::{Token, TokenKind, unescape_string};

type Result<T> = std::result::Result<T, SyntaxError>;

/// Parse every unit in a token stream
pub fn parse(tokens: &[Token], source: &str) -> Result<Vec<TopLevel>> {
    parse_file(tokens, &SourceFile::new("<input>", source))
}

/// Parse every unit in a token stream lexed from `file`
pub fn parse_file(tokens: &[Token], file: &SourceFile) -> Result<Vec<TopLevel>> {
    let mut parser = Parser::new(tokens, file);
    let mut units = Vec::new();
    while !parser.at(TokenKind::Eof) {
        units.push(parser.parse_top()?);
    }
    tracing::debug!("parsed {} units", units.len());
    Ok(units)
}

/// Parse a token stream holding exactly one unit
pub fn parse_unit(tokens: &[Token], source: &str) -> Result<TopLevel> {
    let file = SourceFile::new("<input>", source);
    let mut parser = Parser::new(tokens, &file);
    let unit = parser.parse_top()?;
    parser.expect_or(TokenKind::Eof, "end of input")?;
    Ok(unit)
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: &'a SourceFile,
    /// Returned once the stream runs out
    eof: Token,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], file: &'a SourceFile) -> Self {
        let end = file.content.len();
        Self {
            tokens,
            pos: 0,
            file,
            eof: Token {
                kind: TokenKind::Eof,
                span: Span::new(end, end),
                text: String::new(),
            },
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_n(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        self.expect_or(kind, &format!("`{}`", kind))
    }

    fn expect_or(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(expected))
        }
    }

    fn error(&self, expected: &str) -> SyntaxError {
        let tok = self.current();
        if tok.kind == TokenKind::Eof {
            SyntaxError::UnexpectedEof {
                expected: expected.to_string(),
                span: tok.span.into(),
                src: self.file.to_named_source(),
            }
        } else {
            SyntaxError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("`{}`", tok.text),
                span: tok.span.into(),
                src: self.file.to_named_source(),
            }
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        Ok(self.expect_or(TokenKind::Ident, "a name")?.text)
    }

    /// `( NAME* )`
    fn parse_params(&mut self) -> Result<Vec<String>> {
        self.expect(TokenKind::LParen)?;
        let mut names = Vec::new();
        while self.at(TokenKind::Ident) {
            names.push(self.advance().text);
        }
        self.expect_or(TokenKind::RParen, "`)` or a parameter name")?;
        Ok(names)
    }

    /// `expr*` up to, and including, the closing paren
    fn parse_args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at(TokenKind::Eof) {
            args.push(self.parse_expr()?);
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    // ==================== UNITS ====================

    fn parse_top(&mut self) -> Result<TopLevel> {
        match self.peek() {
            TokenKind::Quit => {
                self.advance();
                Ok(TopLevel::Quit)
            }
            TokenKind::Multi => {
                self.advance();
                Ok(TopLevel::Multi)
            }
            TokenKind::Abstract => {
                self.advance();
                Ok(TopLevel::Abstract(self.parse_stmt()?))
            }
            TokenKind::Var => {
                let (name, expr) = self.parse_decl()?;
                Ok(TopLevel::Declaration { name, expr })
            }
            TokenKind::Procedure => {
                self.advance();
                let name = self.parse_name()?;
                let params = self.parse_params()?;
                let body = self.parse_stmt()?;
                Ok(TopLevel::ProcedureDef {
                    name,
                    expr: procedure(params, body),
                })
            }
            TokenKind::Class | TokenKind::AbsClass => self.parse_template(),
            TokenKind::Obj => self.parse_object_assignment(),
            _ => Ok(TopLevel::Statement(self.parse_stmt()?)),
        }
    }

    /// `var NAME = expr ;` or `var NAME <- ( new-array expr ) ;`
    fn parse_decl(&mut self) -> Result<(String, Expr)> {
        self.expect(TokenKind::Var)?;
        let name = self.parse_name()?;
        let expr = match self.peek() {
            TokenKind::Eq => {
                self.advance();
                self.parse_expr()?
            }
            TokenKind::LeftArrow => {
                self.advance();
                self.expect(TokenKind::LParen)?;
                self.expect(TokenKind::NewArray)?;
                let size = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Expr::Array {
                    size: Box::new(size),
                }
            }
            _ => return Err(self.error("`=` or `<-`")),
        };
        self.expect(TokenKind::Semi)?;
        Ok((name, expr))
    }

    /// `class ( NAME IDENT ( NAME* ) ( expr* ) ( method* ) )`
    fn parse_template(&mut self) -> Result<TopLevel> {
        let is_abstract = self.advance().kind == TokenKind::AbsClass;
        self.expect(TokenKind::LParen)?;
        let name = self.parse_name()?;
        let superclass = Expr::deref_id(self.parse_name()?);
        let params = self.parse_params()?;
        self.expect(TokenKind::LParen)?;
        let super_args = self.parse_args()?;

        self.expect(TokenKind::LParen)?;
        let mut methods = Vec::new();
        while self.at(TokenKind::LParen) {
            methods.push(self.parse_method()?);
        }
        self.expect_or(TokenKind::RParen, "`)` or a method")?;
        self.expect(TokenKind::RParen)?;

        let def = TemplateDef {
            is_abstract,
            name: name.clone(),
            superclass,
            params,
            super_args,
            methods,
        };
        Ok(TopLevel::TemplateDef {
            name,
            expr: Expr::Template(Rc::new(def)),
        })
    }

    /// `( NAME ( NAME* ) stmt )` or `( NAME ( NAME* ) <> )`
    fn parse_method(&mut self) -> Result<MethodDef> {
        self.expect(TokenKind::LParen)?;
        let name = self.parse_name()?;
        let params = self.parse_params()?;
        let body = if self.at(TokenKind::NotImplemented) {
            self.advance();
            Expr::AbstractStub
        } else {
            procedure(params, self.parse_stmt()?)
        };
        self.expect(TokenKind::RParen)?;
        Ok(MethodDef { name, body })
    }

    /// `obj IDENT NAME = new IDENT ( expr* )`
    fn parse_object_assignment(&mut self) -> Result<TopLevel> {
        self.expect(TokenKind::Obj)?;
        let declared = Expr::deref_id(self.parse_name()?);
        let name = self.parse_name()?;
        self.expect(TokenKind::Eq)?;
        self.expect(TokenKind::New)?;
        let concrete = Expr::deref_id(self.parse_name()?);
        self.expect(TokenKind::LParen)?;
        let args = self.parse_args()?;
        if self.at(TokenKind::Semi) {
            self.advance();
        }

        Ok(TopLevel::ObjectAssignment {
            name,
            expr: Expr::ObjectBinding {
                template: Box::new(declared),
                object: Box::new(Expr::Object {
                    template: Box::new(concrete),
                    args,
                }),
            },
        })
    }

    // ==================== STATEMENTS ====================

    fn parse_stmt(&mut self) -> Result<Expr> {
        match self.peek() {
            TokenKind::If => {
                self.advance();
                let cond = self.parse_expr()?;
                let then_branch = self.parse_stmt()?;
                let else_branch = if self.at(TokenKind::Else) {
                    self.advance();
                    self.parse_stmt()?
                } else {
                    Expr::none()
                };
                Ok(Expr::If {
                    cond: Box::new(cond),
                    then_branch: Box::new(then_branch),
                    else_branch: Box::new(else_branch),
                })
            }
            TokenKind::While => {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_stmt()?;
                Ok(Expr::While {
                    cond: Box::new(cond),
                    body: Box::new(body),
                })
            }
            TokenKind::Print => {
                self.advance();
                let value = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Expr::prim(Primitive::Print, vec![value]))
            }
            TokenKind::For => {
                self.advance();
                let init = self.parse_assignment()?;
                let cond = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                let step = self.parse_assignment()?;
                let body = self.parse_stmt()?;
                Ok(Expr::Do(vec![
                    init,
                    Expr::While {
                        cond: Box::new(cond),
                        body: Box::new(Expr::Do(vec![body, step])),
                    },
                ]))
            }
            TokenKind::LBrace => self.parse_block(),
            TokenKind::LParen if self.peek_n(1) == TokenKind::With => self.parse_with(),
            TokenKind::Ident => match self.peek_n(1) {
                TokenKind::LeftArrow => self.parse_assignment(),
                TokenKind::LBracket => {
                    let name = self.advance().text;
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket)?;
                    self.expect(TokenKind::LeftArrow)?;
                    let value = self.parse_expr()?;
                    self.expect(TokenKind::Semi)?;
                    Ok(Expr::prim(
                        Primitive::UpdateArray,
                        vec![Expr::id(name), value, index],
                    ))
                }
                TokenKind::LParen => {
                    let name = self.advance().text;
                    self.advance();
                    let args = self.parse_args()?;
                    self.expect(TokenKind::Semi)?;
                    Ok(Expr::ProcedureCall {
                        func: Box::new(Expr::deref_id(name)),
                        args,
                    })
                }
                _ => {
                    self.advance();
                    Err(self.error("`<-`, `[` or `(`"))
                }
            },
            _ => Err(self.error("a statement")),
        }
    }

    /// `NAME <- expr ;`
    fn parse_assignment(&mut self) -> Result<Expr> {
        let name = self.parse_name()?;
        self.expect(TokenKind::LeftArrow)?;
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        Ok(Expr::prim(Primitive::Update, vec![Expr::id(name), value]))
    }

    /// `{ decl* stmt* }`
    fn parse_block(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LBrace)?;
        let mut bindings = Vec::new();
        while self.at(TokenKind::Var) {
            let (name, init) = self.parse_decl()?;
            bindings.push((name, Expr::RefCell(Box::new(init))));
        }
        let mut stmts = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at(TokenKind::Eof) {
            stmts.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Expr::Let {
            bindings,
            body: Box::new(Expr::Do(stmts)),
        })
    }

    /// `( with IDENT NAME ( expr* ) )`
    fn parse_with(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;
        self.expect(TokenKind::With)?;
        let target = Expr::deref_id(self.parse_name()?);
        let method = self.parse_name()?;
        self.expect(TokenKind::LParen)?;
        let args = self.parse_args()?;
        self.expect(TokenKind::RParen)?;
        Ok(Expr::WithCall {
            target: Box::new(target),
            method,
            args,
        })
    }

    // ==================== EXPRESSIONS ====================

    fn parse_expr(&mut self) -> Result<Expr> {
        match self.peek() {
            TokenKind::IntLit => {
                let tok = self.advance();
                tok.text
                    .parse::<i64>()
                    .map(Expr::int)
                    .map_err(|_| SyntaxError::IntegerOverflow {
                        text: tok.text.clone(),
                        span: tok.span.into(),
                        src: self.file.to_named_source(),
                    })
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::bool(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::bool(false))
            }
            TokenKind::StringLit => Ok(Expr::string(unescape_string(&self.advance().text))),
            TokenKind::Ident => Ok(Expr::deref_id(self.advance().text)),
            TokenKind::LParen => match self.peek_n(1) {
                TokenKind::If => {
                    self.advance();
                    self.advance();
                    let cond = self.parse_expr()?;
                    let then_branch = self.parse_expr()?;
                    let else_branch = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::If {
                        cond: Box::new(cond),
                        then_branch: Box::new(then_branch),
                        else_branch: Box::new(else_branch),
                    })
                }
                TokenKind::Function => {
                    self.advance();
                    self.advance();
                    let params = self.parse_params()?;
                    let body = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::Function {
                        body: Rc::new(rebind_params(&params, body)),
                        params,
                    })
                }
                TokenKind::WithArray => {
                    self.advance();
                    self.advance();
                    let array = self.parse_expr()?;
                    let body = self.parse_expr()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::WithArray {
                        array: Box::new(array),
                        body: Box::new(body),
                    })
                }
                _ => {
                    self.advance();
                    let func = self.parse_expr()?;
                    let args = self.parse_args()?;
                    Ok(Expr::Call {
                        func: Box::new(func),
                        args,
                    })
                }
            },
            _ => Err(self.error("an expression")),
        }
    }
}

/// Rebind each parameter to a fresh cell holding the argument
fn rebind_params(params: &[String], body: Expr) -> Expr {
    Expr::Let {
        bindings: params
            .iter()
            .map(|p| (p.clone(), Expr::RefCell(Box::new(Expr::id(p.clone())))))
            .collect(),
        body: Box::new(body),
    }
}

fn procedure(params: Vec<String>, body: Expr) -> Expr {
    Expr::Procedure {
        body: Rc::new(rebind_params(&params, body)),
        params,
    }
}
