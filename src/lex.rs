//! Token scanner for the gate language.
//!
//! `//` is not a comment: it introduces a privileged-object declaration
//! (`//(name, address)`). The scanner tracks line numbers for diagnostics
//! only; the parser consumes the flat token list.

use crate::ast::Syscall;
use crate::core::error::{ParseError, ParseResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Number(u64),
    If,
    Else,
    Return,
    Syscall(Syscall),
    Plus,
    Minus,
    Star,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    Assign,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Semi,
    Comma,
    /// The `//` marker opening a privileged-object declaration.
    PrivMarker,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => write!(f, "identifier `{name}`"),
            TokenKind::Number(value) => write!(f, "number `{value}`"),
            TokenKind::If => write!(f, "`if`"),
            TokenKind::Else => write!(f, "`else`"),
            TokenKind::Return => write!(f, "`return`"),
            TokenKind::Syscall(call) => write!(f, "`{}`", call.name()),
            TokenKind::Plus => write!(f, "`+`"),
            TokenKind::Minus => write!(f, "`-`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::Lt => write!(f, "`<`"),
            TokenKind::Gt => write!(f, "`>`"),
            TokenKind::Le => write!(f, "`<=`"),
            TokenKind::Ge => write!(f, "`>=`"),
            TokenKind::EqEq => write!(f, "`==`"),
            TokenKind::Ne => write!(f, "`!=`"),
            TokenKind::Assign => write!(f, "`=`"),
            TokenKind::LParen => write!(f, "`(`"),
            TokenKind::RParen => write!(f, "`)`"),
            TokenKind::LBrace => write!(f, "`{{`"),
            TokenKind::RBrace => write!(f, "`}}`"),
            TokenKind::Semi => write!(f, "`;`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::PrivMarker => write!(f, "`//`"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Scan source text into a token list.
pub fn tokenize(source: &str) -> ParseResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    let mut line = 1usize;

    while let Some(&ch) = chars.peek() {
        if ch == '\n' {
            line += 1;
            chars.next();
            continue;
        }
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            let kind = match word.as_str() {
                "if" => TokenKind::If,
                "else" => TokenKind::Else,
                "return" => TokenKind::Return,
                "open" => TokenKind::Syscall(Syscall::Open),
                "write" => TokenKind::Syscall(Syscall::Write),
                "read" => TokenKind::Syscall(Syscall::Read),
                "ioctl" => TokenKind::Syscall(Syscall::Ioctl),
                _ => TokenKind::Ident(word),
            };
            tokens.push(Token { kind, line });
            continue;
        }

        if ch.is_ascii_digit() {
            let mut value: u64 = 0;
            while let Some(&c) = chars.peek() {
                if let Some(digit) = c.to_digit(10) {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(digit as u64))
                        .ok_or(ParseError::NumberOutOfRange { line })?;
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Number(value),
                line,
            });
            continue;
        }

        chars.next();
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ';' => TokenKind::Semi,
            ',' => TokenKind::Comma,
            '<' => {
                if chars.peek() == Some(&'=') {
                    chars.next();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if chars.peek() == Some(&'=') {
                    chars.next();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            '=' => {
                if chars.peek() == Some(&'=') {
                    chars.next();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if chars.peek() == Some(&'=') {
                    chars.next();
                    TokenKind::Ne
                } else {
                    return Err(ParseError::UnexpectedChar { ch, line });
                }
            }
            '/' => {
                if chars.peek() == Some(&'/') {
                    chars.next();
                    TokenKind::PrivMarker
                } else {
                    return Err(ParseError::UnexpectedChar { ch, line });
                }
            }
            other => return Err(ParseError::UnexpectedChar { ch: other, line }),
        };
        tokens.push(Token { kind, line });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("if else return foo open"),
            vec![
                TokenKind::If,
                TokenKind::Else,
                TokenKind::Return,
                TokenKind::Ident("foo".to_string()),
                TokenKind::Syscall(Syscall::Open),
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            kinds("<= >= == != < > ="),
            vec![
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::EqEq,
                TokenKind::Ne,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Assign,
            ]
        );
    }

    #[test]
    fn test_priv_marker() {
        assert_eq!(
            kinds("//(a, 200)"),
            vec![
                TokenKind::PrivMarker,
                TokenKind::LParen,
                TokenKind::Ident("a".to_string()),
                TokenKind::Comma,
                TokenKind::Number(200),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_line_tracking() {
        let tokens = tokenize("a\nb\n\nc").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            tokenize("a ? b"),
            Err(ParseError::UnexpectedChar { ch: '?', line: 1 })
        );
        assert_eq!(
            tokenize("a ! b"),
            Err(ParseError::UnexpectedChar { ch: '!', line: 1 })
        );
    }

    #[test]
    fn test_number_overflow() {
        assert!(tokenize("99999999999999999999999").is_err());
        assert_eq!(
            kinds("18446744073709551615"),
            vec![TokenKind::Number(u64::MAX)]
        );
    }
}
