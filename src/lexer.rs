//! Hand-rolled tokenizer: source text to a flat token stream with
//! line/column tracking for diagnostics.

use crate::error::CompileError;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    IntLit(i64),
    StrLit(String),
    Fn,
    If,
    Else,
    While,
    Return,
    Read,
    Write,
    True,
    False,
    IntType,
    BoolType,
    StringType,
    VoidType,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Arrow,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    PlusPlus,
    MinusMinus,
    AndAnd,
    OrOr,
    Bang,
    EqEq,
    BangEq,
    Lt,
    Gt,
    Lte,
    Gte,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}:{}", self.kind, self.line, self.col)
    }
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "fn" => TokenKind::Fn,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "read" => TokenKind::Read,
        "write" => TokenKind::Write,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "int" => TokenKind::IntType,
        "bool" => TokenKind::BoolType,
        "string" => TokenKind::StringType,
        "void" => TokenKind::VoidType,
        _ => return None,
    })
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<char> = src.chars().collect();
    let mut i = 0usize;
    let mut line = 1u32;
    let mut col = 1u32;
    let mut tokens = Vec::new();

    macro_rules! bump {
        () => {{
            if chars[i] == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
            i += 1;
        }};
    }

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            bump!();
            continue;
        }
        if c == '/' && i + 1 < chars.len() && chars[i + 1] == '/' {
            while i < chars.len() && chars[i] != '\n' {
                bump!();
            }
            continue;
        }

        let start_line = line;
        let start_col = col;

        if c.is_ascii_digit() {
            let mut s = String::new();
            while i < chars.len() && chars[i].is_ascii_digit() {
                s.push(chars[i]);
                bump!();
            }
            let val: i64 = s
                .parse()
                .map_err(|_| CompileError::Lex(format!("integer literal too large: {s}")))?;
            tokens.push(Token {
                kind: TokenKind::IntLit(val),
                line: start_line,
                col: start_col,
            });
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let mut s = String::new();
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                s.push(chars[i]);
                bump!();
            }
            let kind = keyword(&s).unwrap_or(TokenKind::Ident(s));
            tokens.push(Token {
                kind,
                line: start_line,
                col: start_col,
            });
            continue;
        }

        if c == '"' {
            bump!();
            let mut s = String::new();
            let mut closed = false;
            while i < chars.len() {
                if chars[i] == '"' {
                    closed = true;
                    bump!();
                    break;
                }
                s.push(chars[i]);
                bump!();
            }
            if !closed {
                return Err(CompileError::Lex(format!(
                    "unterminated string literal at {start_line}:{start_col}"
                )));
            }
            tokens.push(Token {
                kind: TokenKind::StrLit(s),
                line: start_line,
                col: start_col,
            });
            continue;
        }

        macro_rules! two_char {
            ($second:expr, $two:expr, $one:expr) => {{
                bump!();
                if i < chars.len() && chars[i] == $second {
                    bump!();
                    $two
                } else {
                    $one
                }
            }};
        }

        let kind = match c {
            '(' => {
                bump!();
                TokenKind::LParen
            }
            ')' => {
                bump!();
                TokenKind::RParen
            }
            '{' => {
                bump!();
                TokenKind::LBrace
            }
            '}' => {
                bump!();
                TokenKind::RBrace
            }
            ',' => {
                bump!();
                TokenKind::Comma
            }
            ';' => {
                bump!();
                TokenKind::Semi
            }
            '+' => two_char!('+', TokenKind::PlusPlus, TokenKind::Plus),
            '-' => two_char!('>', TokenKind::Arrow, {
                if i < chars.len() && chars[i] == '-' {
                    bump!();
                    TokenKind::MinusMinus
                } else {
                    TokenKind::Minus
                }
            }),
            '*' => {
                bump!();
                TokenKind::Star
            }
            '/' => {
                bump!();
                TokenKind::Slash
            }
            '=' => two_char!('=', TokenKind::EqEq, TokenKind::Assign),
            '!' => two_char!('=', TokenKind::BangEq, TokenKind::Bang),
            '<' => two_char!('=', TokenKind::Lte, TokenKind::Lt),
            '>' => two_char!('=', TokenKind::Gte, TokenKind::Gt),
            '&' => two_char!('&', TokenKind::AndAnd, {
                return Err(CompileError::Lex(format!(
                    "unexpected character '&' at {start_line}:{start_col}"
                )))
            }),
            '|' => two_char!('|', TokenKind::OrOr, {
                return Err(CompileError::Lex(format!(
                    "unexpected character '|' at {start_line}:{start_col}"
                )))
            }),
            other => {
                return Err(CompileError::Lex(format!(
                    "unexpected character '{other}' at {start_line}:{start_col}"
                )))
            }
        };
        tokens.push(Token {
            kind,
            line: start_line,
            col: start_col,
        });
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
        col,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_declaration() {
        let toks = tokenize("int x;").unwrap();
        assert_eq!(
            toks.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::IntType,
                TokenKind::Ident("x".into()),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        let toks = tokenize("int x; // trailing\n").unwrap();
        assert_eq!(toks.len(), 4);
    }

    #[test]
    fn unterminated_string_is_a_lex_error() {
        assert!(tokenize("\"abc").is_err());
    }

    #[test]
    fn distinguishes_arrow_from_minus() {
        let toks = tokenize("-> -").unwrap();
        assert_eq!(toks[0].kind, TokenKind::Arrow);
        assert_eq!(toks[1].kind, TokenKind::Minus);
    }
}
