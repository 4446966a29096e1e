//! Lexer for the imp surface language
//!
//! Wraps the logos-generated scanner and appends an explicit `Eof` token so
//! the parser never has to special-case the end of the stream.

mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Span;
use crate::diagnostics::{SourceFile, SyntaxError};
use logos::Logos;

/// Tokenize a source string
pub fn lex(source: &str) -> Result<Vec<Token>, SyntaxError> {
    lex_file(&SourceFile::new("<input>", source))
}

/// Tokenize a named source file
pub fn lex_file(file: &SourceFile) -> Result<Vec<Token>, SyntaxError> {
    let source = &*file.content;
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start, range.end);
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span,
                text: lexer.slice().to_string(),
            }),
            Err(()) => {
                return Err(SyntaxError::InvalidToken {
                    text: lexer.slice().to_string(),
                    span: span.into(),
                    src: file.to_named_source(),
                });
            }
        }
    }

    tracing::trace!("lexed {} tokens", tokens.len());

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(source.len(), source.len()),
        text: String::new(),
    });

    Ok(tokens)
}

/// Strip the quotes from a string literal and resolve its escapes
///
/// Only `\\`, `\"` and `\'` are escapes; any other backslash is kept.
pub fn unescape_string(literal: &str) -> String {
    let inner = literal
        .get(1..literal.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '\\' | '"' | '\'') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operator_names_are_identifiers() {
        assert_eq!(
            kinds("+ <= zero? =="),
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_binding_operators_beat_identifiers() {
        assert_eq!(
            kinds("x <- 1 ; = <>"),
            vec![
                TokenKind::Ident,
                TokenKind::LeftArrow,
                TokenKind::IntLit,
                TokenKind::Semi,
                TokenKind::Eq,
                TokenKind::NotImplemented,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_hyphenated_keywords() {
        assert_eq!(
            kinds("with-array with new-array new"),
            vec![
                TokenKind::WithArray,
                TokenKind::With,
                TokenKind::NewArray,
                TokenKind::New,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape_string(r#""a\"b""#), "a\"b");
        assert_eq!(unescape_string(r#""a\\b""#), "a\\b");
        assert_eq!(unescape_string(r#"'it\'s'"#), "it's");
        assert_eq!(unescape_string(r#""a\nb""#), "a\\nb");
        assert_eq!(unescape_string(r#""""#), "");
    }

    #[test]
    fn test_invalid_character() {
        assert!(matches!(
            lex("var x = 1 @"),
            Err(SyntaxError::InvalidToken { .. })
        ));
    }
}
