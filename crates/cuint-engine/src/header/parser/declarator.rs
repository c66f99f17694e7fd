//! Declarators and parameter lists.

use super::guards::LoopGuard;
use super::{ParseError, Parser};
use crate::header::ast::{Declarator, Derived, Param, Params};
use crate::header::token::Token;

impl Parser {
    /// Parse a declarator. With `abstract_ok` the name may be omitted, as in
    /// parameter lists (`int (*)(void)`).
    pub(super) fn parse_declarator(&mut self, abstract_ok: bool) -> Result<Declarator, ParseError> {
        self.depth.enter("declarator", self.span())?;

        let mut pointers = 0usize;
        while self.check(&Token::Star) {
            self.advance();
            pointers += 1;
            while matches!(
                self.current(),
                Token::Const | Token::Volatile | Token::Restrict | Token::Atomic
            ) {
                self.advance();
            }
            self.skip_attributes()?;
        }
        self.skip_attributes()?;

        let mut declarator = match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Declarator {
                    name: Some(name),
                    derived: Vec::new(),
                }
            }
            Token::LeftParen if self.paren_starts_declarator() => {
                self.advance();
                let inner = self.parse_declarator(abstract_ok)?;
                self.expect(Token::RightParen, "')' closing declarator")?;
                inner
            }
            other => {
                if !abstract_ok {
                    return Err(ParseError::unexpected("identifier", &other, self.span()));
                }
                Declarator::default()
            }
        };

        let mut suffixes = Vec::new();
        let mut guard = LoopGuard::new("declarator_suffix");
        loop {
            guard.check(self.span())?;
            match self.current() {
                Token::LeftBracket => {
                    self.skip_balanced(Token::LeftBracket, Token::RightBracket)?;
                    suffixes.push(Derived::Array);
                }
                Token::LeftParen => suffixes.push(Derived::Function(self.parse_params()?)),
                _ => break,
            }
        }

        declarator.derived.extend(suffixes);
        declarator
            .derived
            .extend(std::iter::repeat(Derived::Pointer).take(pointers));

        self.depth.leave();
        Ok(declarator)
    }

    /// Whether the current `(` opens a nested declarator rather than a
    /// parameter list.
    fn paren_starts_declarator(&self) -> bool {
        match self.peek(1) {
            Token::Star | Token::LeftParen | Token::Attribute | Token::LeftBracket => true,
            Token::Identifier(name) => !self.is_typedef_name(name),
            _ => false,
        }
    }

    fn parse_params(&mut self) -> Result<Params, ParseError> {
        self.expect(Token::LeftParen, "'('")?;
        let mut params = Params::default();

        if self.check(&Token::RightParen) {
            self.advance();
            return Ok(params);
        }

        let mut guard = LoopGuard::new("params");
        loop {
            guard.check(self.span())?;
            if self.check(&Token::Ellipsis) {
                self.advance();
                params.variadic = true;
                self.expect(Token::RightParen, "')' after '...'")?;
                break;
            }

            let (_, base) = self.parse_specifiers()?;
            let declarator = self.parse_declarator(true)?;
            self.skip_attributes()?;
            params.params.push(Param {
                name: declarator.name,
                base,
                derived: declarator.derived,
            });

            match self.current() {
                Token::Comma => {
                    self.advance();
                }
                Token::RightParen => {
                    self.advance();
                    break;
                }
                other => {
                    return Err(ParseError::unexpected(
                        "',' or ')' in parameter list",
                        other,
                        self.span(),
                    ))
                }
            }
        }

        if params.params.len() == 1 && params.params[0].is_void() {
            params.params.clear();
        }
        Ok(params)
    }
}
