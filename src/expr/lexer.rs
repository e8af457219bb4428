//! Combiner expression tokenizer
//!
//! Single pass over the expression text producing a token stream. Every
//! token carries the byte offset it starts at so parse errors can point at
//! the offending spot.

use crate::error::ExpressionError;
use crate::expr::selector::{parse_numeric_ranges, NumericRange};

/// Attribute addressed by a `{field:payload}` selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorField {
    Artist,
    Comment,
    Date,
    Key,
    Label,
    Playlist,
}

impl SelectorField {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "artist" => Some(SelectorField::Artist),
            "comment" => Some(SelectorField::Comment),
            "date" => Some(SelectorField::Date),
            "key" => Some(SelectorField::Key),
            "label" => Some(SelectorField::Label),
            "playlist" => Some(SelectorField::Playlist),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `&`
    And,
    /// `|`
    Or,
    /// `~`
    Diff,
    LParen,
    RParen,
    /// A tag literal; `wildcard` when it contains `*`
    Tag { text: String, wildcard: bool },
    /// `{field:payload}` with the payload trimmed but otherwise verbatim
    StringSelector {
        field: SelectorField,
        payload: String,
    },
    /// `[ranges]`, already parsed and classified
    NumericSelector(Vec<NumericRange>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

/// Characters that terminate a tag literal. `*` is deliberately absent:
/// inside a tag literal it denotes wildcard substring matching.
fn is_reserved(c: char) -> bool {
    matches!(c, '&' | '|' | '~' | '(' | ')' | '{' | '}' | '[' | ']')
}

pub fn lex(input: &str) -> Result<Vec<Token>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let c = rest.chars().next().expect("pos is on a char boundary");

        if c.is_whitespace() {
            pos += c.len_utf8();
            continue;
        }

        match c {
            '&' => tokens.push(Token { kind: TokenKind::And, pos }),
            '|' => tokens.push(Token { kind: TokenKind::Or, pos }),
            '~' => tokens.push(Token { kind: TokenKind::Diff, pos }),
            '(' => tokens.push(Token { kind: TokenKind::LParen, pos }),
            ')' => tokens.push(Token { kind: TokenKind::RParen, pos }),
            '{' => {
                let close = rest.find('}').ok_or_else(|| {
                    ExpressionError::new(pos, "unterminated string selector")
                })?;
                tokens.push(lex_string_selector(&rest[1..close], pos)?);
                pos += close + 1;
                continue;
            }
            '[' => {
                let close = rest.find(']').ok_or_else(|| {
                    ExpressionError::new(pos, "unterminated numeric selector")
                })?;
                let ranges = parse_numeric_ranges(&rest[1..close])
                    .map_err(|message| ExpressionError::new(pos, message))?;
                tokens.push(Token {
                    kind: TokenKind::NumericSelector(ranges),
                    pos,
                });
                pos += close + 1;
                continue;
            }
            '}' | ']' => {
                return Err(ExpressionError::new(pos, format!("unexpected '{c}'")));
            }
            _ => {
                let len = rest
                    .find(is_reserved)
                    .unwrap_or(rest.len());
                let text = rest[..len].trim();
                if !text.is_empty() {
                    let leading = rest[..len].len() - rest[..len].trim_start().len();
                    tokens.push(Token {
                        kind: TokenKind::Tag {
                            text: text.to_string(),
                            wildcard: text.contains('*'),
                        },
                        pos: pos + leading,
                    });
                }
                pos += len;
                continue;
            }
        }
        pos += c.len_utf8();
    }

    Ok(tokens)
}

fn lex_string_selector(inner: &str, pos: usize) -> Result<Token, ExpressionError> {
    let (field, payload) = inner.split_once(':').ok_or_else(|| {
        ExpressionError::new(pos, "string selector must have the form {field:payload}")
    })?;

    let field_name = field.trim();
    let field = SelectorField::parse(field_name).ok_or_else(|| {
        ExpressionError::new(pos, format!("unknown selector field \"{field_name}\""))
    })?;

    let payload = payload.trim();
    if payload.is_empty() {
        return Err(ExpressionError::new(pos, "empty selector payload"));
    }

    Ok(Token {
        kind: TokenKind::StringSelector {
            field,
            payload: payload.to_string(),
        },
        pos,
    })
}
