//! Cursor over a token vector

use crate::error::{FormulaError, FormulaResult};
use crate::tokenizer::{Token, TokenKind};

/// Token cursor used by the parser
///
/// The stream never moves past its trailing [`Token::Eof`]; once there, every further
/// `peek` or `advance` yields `Eof` again.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    /// Create a stream, appending `Eof` if the tokens do not already end with it
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last() != Some(&Token::Eof) {
            tokens.push(Token::Eof);
        }
        Self { tokens, pos: 0 }
    }

    /// Look at the current token without consuming it
    pub fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    /// Consume and return the current token
    pub fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it has the given kind
    pub fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek().kind() == kind {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume the current token, failing unless it has the given kind
    pub fn require(&mut self, kind: TokenKind) -> FormulaResult<Token> {
        let found = self.peek().clone();
        self.expect(kind).ok_or_else(|| {
            FormulaError::syntax(format!("expected {}, got {}", kind, found))
        })
    }

    /// Check whether the cursor sits on `Eof`
    pub fn at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_peek_does_not_consume() {
        let stream = TokenStream::new(tokenize("1 +").unwrap());
        assert_eq!(stream.peek(), &Token::Number(1.0));
        assert_eq!(stream.peek(), &Token::Number(1.0));
    }

    #[test]
    fn test_never_moves_past_eof() {
        let mut stream = TokenStream::new(vec![Token::Plus]);
        assert_eq!(stream.advance(), Token::Plus);
        assert_eq!(stream.advance(), Token::Eof);
        assert_eq!(stream.advance(), Token::Eof);
        assert!(stream.at_end());
    }

    #[test]
    fn test_expect() {
        let mut stream = TokenStream::new(tokenize("( 1").unwrap());
        assert_eq!(stream.expect(TokenKind::Comma), None);
        assert_eq!(stream.expect(TokenKind::LeftParen), Some(Token::LeftParen));
        assert_eq!(stream.expect(TokenKind::Number), Some(Token::Number(1.0)));
    }

    #[test]
    fn test_require_names_both_tokens() {
        let mut stream = TokenStream::new(tokenize("A1").unwrap());
        let err = stream.require(TokenKind::RightParen).unwrap_err();
        assert_eq!(
            err,
            FormulaError::Syntax("expected ')', got identifier 'A1'".into())
        );
    }
}
