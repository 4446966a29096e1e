//! Token definitions for the imp lexer

use crate::common::Span;
use logos::Logos;
use serde::{Deserialize, Serialize};

/// A token with its kind, span, and text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Token kinds recognized by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Serialize, Deserialize)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("print")]
    Print,
    #[token("var")]
    Var,
    #[token("function")]
    Function,
    #[token("procedure")]
    Procedure,
    #[token("with")]
    With,
    #[token("with-array")]
    WithArray,
    #[token("new-array")]
    NewArray,
    #[token("class")]
    Class,
    #[token("absclass")]
    AbsClass,
    #[token("obj")]
    Obj,
    #[token("new")]
    New,

    // Boolean literals
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Directives
    #[token("#quit")]
    Quit,
    #[token("#abs")]
    Abstract,
    #[token("#multi")]
    Multi,
    #[token("#end")]
    End,

    // Literals
    #[regex(r"[0-9]+")]
    IntLit,
    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r#"'([^'\\]|\\.)*'"#)]
    StringLit,

    // Identifiers may be operator names such as `+`, `<=` or `zero?`
    #[regex(r"[a-zA-Z_+*/?!=<>\-][a-zA-Z0-9_+*/?!=<>\-]*", priority = 1)]
    Ident,

    // Binding operators
    #[token("=")]
    Eq,
    #[token("<-")]
    LeftArrow,
    #[token("<>")]
    NotImplemented,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // Punctuation
    #[token(";")]
    Semi,

    // Special
    Eof,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Print => "print",
            TokenKind::Var => "var",
            TokenKind::Function => "function",
            TokenKind::Procedure => "procedure",
            TokenKind::With => "with",
            TokenKind::WithArray => "with-array",
            TokenKind::NewArray => "new-array",
            TokenKind::Class => "class",
            TokenKind::AbsClass => "absclass",
            TokenKind::Obj => "obj",
            TokenKind::New => "new",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Quit => "#quit",
            TokenKind::Abstract => "#abs",
            TokenKind::Multi => "#multi",
            TokenKind::End => "#end",
            TokenKind::IntLit => "<int>",
            TokenKind::StringLit => "<string>",
            TokenKind::Ident => "<ident>",
            TokenKind::Eq => "=",
            TokenKind::LeftArrow => "<-",
            TokenKind::NotImplemented => "<>",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Semi => ";",
            TokenKind::Eof => "<eof>",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
