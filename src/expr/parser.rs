//! Combiner expression parser
//!
//! Recursive descent over the token stream with one level per precedence
//! tier: `&` binds tightest, then `~`, then `|`, all left-associative.

use crate::error::ExpressionError;
use crate::expr::lexer::{lex, SelectorField, Token, TokenKind};
use crate::expr::selector::{DateSpec, GlobPattern, NumericRange};

/// A parsed string selector with its payload interpreted per field.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Artist(GlobPattern),
    Comment(GlobPattern),
    Key(GlobPattern),
    Label(GlobPattern),
    Date(DateSpec),
    Playlist(String),
}

/// AST of a combiner expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A tag literal; wildcard tags match by lowercased substring
    Tag {
        name: String,
        wildcard: bool,
        pos: usize,
    },
    /// `{field:payload}`
    Selector { selector: Selector, pos: usize },
    /// `[ranges]`; the result is the union over all ranges
    Numeric {
        ranges: Vec<NumericRange>,
        pos: usize,
    },
    /// Set intersection
    And(Box<Expr>, Box<Expr>),
    /// Set union
    Or(Box<Expr>, Box<Expr>),
    /// Set difference (left minus right)
    Diff(Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Byte offset of the leftmost token of this subtree.
    pub fn pos(&self) -> usize {
        match self {
            Expr::Tag { pos, .. } | Expr::Selector { pos, .. } | Expr::Numeric { pos, .. } => *pos,
            Expr::And(left, _) | Expr::Or(left, _) | Expr::Diff(left, _) => left.pos(),
        }
    }

    fn has_operator(&self) -> bool {
        matches!(self, Expr::And(..) | Expr::Or(..) | Expr::Diff(..))
    }
}

/// Parse a combiner expression into its AST.
///
/// The expression must contain at least one binary operator; a lone atom is
/// only valid inside parentheses as part of a larger expression.
pub fn parse(input: &str) -> Result<Expr, ExpressionError> {
    let tokens = lex(input)?;
    if tokens.is_empty() {
        return Err(ExpressionError::new(0, "empty expression"));
    }

    let mut parser = Parser { tokens, pos: 0, input_len: input.len() };
    let expr = parser.parse_or()?;

    if let Some(token) = parser.peek() {
        return Err(ExpressionError::new(
            token.pos,
            "expected an operator between operands",
        ));
    }
    if !expr.has_operator() {
        return Err(ExpressionError::new(
            expr.pos(),
            "expression must contain at least one operator",
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn parse_or(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_diff()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Or)) {
            self.advance();
            let right = self.parse_diff()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_diff(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Diff)) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Diff(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExpressionError> {
        let mut left = self.parse_atom()?;
        while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::And)) {
            self.advance();
            let right = self.parse_atom()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_atom(&mut self) -> Result<Expr, ExpressionError> {
        let Some(token) = self.advance() else {
            return Err(ExpressionError::new(
                self.input_len,
                "expected an operand, found end of expression",
            ));
        };

        match token.kind {
            TokenKind::LParen => {
                let expr = self.parse_or()?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(expr),
                    _ => Err(ExpressionError::new(token.pos, "unmatched '('")),
                }
            }
            TokenKind::Tag { text, wildcard } => Ok(Expr::Tag {
                name: text,
                wildcard,
                pos: token.pos,
            }),
            TokenKind::NumericSelector(ranges) => Ok(Expr::Numeric {
                ranges,
                pos: token.pos,
            }),
            TokenKind::StringSelector { field, payload } => {
                let selector = build_selector(field, &payload, token.pos)?;
                Ok(Expr::Selector {
                    selector,
                    pos: token.pos,
                })
            }
            TokenKind::RParen => Err(ExpressionError::new(token.pos, "unmatched ')'")),
            TokenKind::And | TokenKind::Or | TokenKind::Diff => Err(ExpressionError::new(
                token.pos,
                "expected an operand, found an operator",
            )),
        }
    }
}

fn build_selector(
    field: SelectorField,
    payload: &str,
    pos: usize,
) -> Result<Selector, ExpressionError> {
    if field != SelectorField::Date && starts_with_comparator(payload) {
        return Err(ExpressionError::new(
            pos,
            "comparators are only valid in date selectors",
        ));
    }

    let glob = |payload: &str| {
        GlobPattern::parse(payload).map_err(|err| ExpressionError::new(pos, err.to_string()))
    };

    match field {
        SelectorField::Artist => Ok(Selector::Artist(glob(payload)?)),
        SelectorField::Comment => Ok(Selector::Comment(glob(payload)?)),
        SelectorField::Key => Ok(Selector::Key(glob(payload)?)),
        SelectorField::Label => Ok(Selector::Label(glob(payload)?)),
        SelectorField::Playlist => Ok(Selector::Playlist(payload.to_string())),
        SelectorField::Date => {
            let spec =
                DateSpec::parse(payload).map_err(|message| ExpressionError::new(pos, message))?;
            Ok(Selector::Date(spec))
        }
    }
}

fn starts_with_comparator(payload: &str) -> bool {
    payload.starts_with('<') || payload.starts_with('>')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_and_binds_tighter_than_or() {
        // A | B & C parses as A | (B & C)
        let expr = parse("A | B & C").unwrap();
        match expr {
            Expr::Or(left, right) => {
                assert!(matches!(*left, Expr::Tag { .. }));
                assert!(matches!(*right, Expr::And(..)));
            }
            other => panic!("expected Or at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_diff_binds_tighter_than_or() {
        let expr = parse("A ~ B | C").unwrap();
        match expr {
            Expr::Or(left, right) => {
                assert!(matches!(*left, Expr::Diff(..)));
                assert!(matches!(*right, Expr::Tag { .. }));
            }
            other => panic!("expected Or at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_and_binds_tighter_than_diff() {
        let expr = parse("A ~ B & C").unwrap();
        match expr {
            Expr::Diff(left, right) => {
                assert!(matches!(*left, Expr::Tag { .. }));
                assert!(matches!(*right, Expr::And(..)));
            }
            other => panic!("expected Diff at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_left_associativity() {
        // A ~ B ~ C parses as (A ~ B) ~ C
        let expr = parse("A ~ B ~ C").unwrap();
        match expr {
            Expr::Diff(left, right) => {
                assert!(matches!(*left, Expr::Diff(..)));
                assert!(matches!(*right, Expr::Tag { .. }));
            }
            other => panic!("expected Diff at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse("(A | B) & C").unwrap();
        match expr {
            Expr::And(left, right) => {
                assert!(matches!(*left, Expr::Or(..)));
                assert!(matches!(*right, Expr::Tag { .. }));
            }
            other => panic!("expected And at the root, got {other:?}"),
        }
    }

    #[test]
    fn test_full_expression_shape() {
        let expr =
            parse("((Dubstep ~ [1-3]) | {playlist: My Favorites} | (*Techno & [135-145])) & Dark")
                .unwrap();
        assert!(matches!(expr, Expr::And(..)));
    }

    #[test]
    fn test_single_atom_rejected() {
        let err = parse("House").unwrap_err();
        assert!(err.message.contains("at least one operator"));
        assert!(parse("{playlist:X}").is_err());
    }

    #[test]
    fn test_trailing_operator_rejected() {
        let err = parse("House &").unwrap_err();
        assert!(err.message.contains("end of expression"));
    }

    #[test]
    fn test_leading_operator_rejected() {
        let err = parse("& House").unwrap_err();
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_adjacent_atoms_rejected() {
        let err = parse("(A | B) (C | D)").unwrap_err();
        assert!(err.message.contains("expected an operator"));
    }

    #[test]
    fn test_unmatched_parens() {
        assert!(parse("(House & Techno").is_err());
        assert!(parse("House & Techno)").is_err());
    }

    #[test]
    fn test_comparator_outside_date_rejected() {
        let err = parse("{artist:>Eprom} & X").unwrap_err();
        assert!(err.message.contains("date selectors"));
    }

    #[test]
    fn test_empty_expression() {
        let err = parse("   ").unwrap_err();
        assert_eq!(err.offset, 0);
    }
}
