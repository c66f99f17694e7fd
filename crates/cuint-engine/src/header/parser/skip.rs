//! Skipping of token runs the declaration grammar does not model.
//!
//! Function bodies, initialisers, array sizes, and GNU attribute lists are
//! consumed as balanced bracket runs without being interpreted.

use super::guards::LoopGuard;
use super::{ParseError, Parser};
use crate::header::token::Token;

impl Parser {
    /// Skip from `open` (which must be current) through its matching `close`.
    pub(super) fn skip_balanced(&mut self, open: Token, close: Token) -> Result<(), ParseError> {
        let start = self.span();
        if !self.check(&open) {
            return Err(ParseError::unexpected(
                &format!("'{}'", open),
                self.current(),
                start,
            ));
        }
        self.advance();

        let mut depth = 1usize;
        let mut guard = LoopGuard::new("balanced");
        while depth > 0 {
            guard.check(self.span())?;
            let token = self.current();
            if *token == Token::Eof {
                return Err(ParseError::unterminated(&format!("'{}'", open), start));
            }
            if *token == open {
                depth += 1;
            } else if *token == close {
                depth -= 1;
            }
            self.advance();
        }
        Ok(())
    }

    /// Skip an expression up to (not including) a `,` or `;` at nesting
    /// depth zero, or a closing bracket that belongs to an enclosing list.
    pub(super) fn skip_expression(&mut self) -> Result<(), ParseError> {
        let start = self.span();
        let mut depth = 0usize;
        let mut guard = LoopGuard::new("expression");

        loop {
            guard.check(self.span())?;
            match self.current() {
                Token::Eof => return Err(ParseError::unterminated("expression", start)),
                Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                Token::RightParen | Token::RightBracket | Token::RightBrace => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Token::Comma | Token::Semicolon if depth == 0 => return Ok(()),
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip any run of `__attribute__((...))` and `__asm__(...)` labels.
    pub(super) fn skip_attributes(&mut self) -> Result<(), ParseError> {
        let mut guard = LoopGuard::new("attributes");
        loop {
            guard.check(self.span())?;
            match self.current() {
                Token::Attribute => {
                    self.advance();
                    if self.check(&Token::LeftParen) {
                        self.skip_balanced(Token::LeftParen, Token::RightParen)?;
                    }
                }
                Token::Asm => {
                    self.advance();
                    while matches!(self.current(), Token::Volatile | Token::Inline)
                        || matches!(self.current(), Token::Identifier(word) if word == "goto")
                    {
                        self.advance();
                    }
                    if self.check(&Token::LeftParen) {
                        self.skip_balanced(Token::LeftParen, Token::RightParen)?;
                    }
                }
                _ => return Ok(()),
            }
        }
    }
}
