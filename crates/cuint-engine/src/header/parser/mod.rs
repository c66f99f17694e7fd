//! Declaration parser for preprocessed C headers.
//!
//! A recursive-descent parser that understands declarations and nothing else.
//! Expressions (array sizes, initialisers, bit-field widths) and function
//! bodies are skipped as balanced token runs. Typedef names are tracked while
//! parsing so `foo_t *x` is told apart from a multiplication-shaped mistake.

mod declarator;
mod guards;
mod skip;
mod specifier;

use std::fmt;

use rustc_hash::FxHashSet;

use crate::header::ast::{Declaration, ExternalDecl, TranslationUnit};
use crate::header::lexer::{LexError, Lexer};
use crate::header::token::{Span, Token};

use guards::{DepthCounter, LoopGuard};

/// Lines of context shown on each side of a parse failure.
pub const CONTEXT_LINES: usize = 4;

/// What went wrong while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    Lex,
    UnexpectedToken,
    UnknownType,
    Unterminated,
    LimitExceeded,
}

/// Parse failure with the position it was detected at.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }

    pub fn unexpected(expected: &str, found: &Token, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            format!("expected {}, found '{}'", expected, found),
            span,
        )
    }

    pub fn unknown_type(name: &str, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnknownType,
            format!("unknown type name '{}'", name),
            span,
        )
    }

    pub fn unterminated(what: &str, span: Span) -> Self {
        Self::new(
            ParseErrorKind::Unterminated,
            format!("unterminated {}", what),
            span,
        )
    }

    pub fn parser_limit_exceeded(message: String, span: Span) -> Self {
        Self::new(ParseErrorKind::LimitExceeded, message, span)
    }

    /// Render the error with the failing line and [`CONTEXT_LINES`] lines of
    /// context on each side, the failing line marked with `>`.
    pub fn format_with_source(&self, source: &str) -> String {
        let mut result = format!(
            "Parse error at {}:{}: {}\n",
            self.span.line, self.span.column, self.message
        );

        let lines: Vec<&str> = source.lines().collect();
        if self.span.line == 0 || lines.is_empty() {
            return result;
        }
        let error_index = (self.span.line as usize - 1).min(lines.len() - 1);
        let first = error_index.saturating_sub(CONTEXT_LINES);
        let last = (error_index + CONTEXT_LINES).min(lines.len() - 1);

        for (index, line) in lines.iter().enumerate().take(last + 1).skip(first) {
            let marker = if index == error_index { '>' } else { ' ' };
            result.push_str(&format!("{} {:5} | {}\n", marker, index + 1, line));
            if index == error_index {
                let pad = self.span.column.saturating_sub(1) as usize;
                result.push_str(&format!("        | {}^\n", " ".repeat(pad)));
            }
        }
        result
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.message, self.span.line, self.span.column
        )
    }
}

impl std::error::Error for ParseError {}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(ParseErrorKind::Lex, err.to_string(), err.span())
    }
}

/// Declaration parser over a token stream.
pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    typedef_names: FxHashSet<String>,
    depth: DepthCounter,
}

impl Parser {
    /// Lex `source` and prepare a parser over it.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            typedef_names: FxHashSet::default(),
            depth: DepthCounter::default(),
        })
    }

    /// Parse the whole translation unit. The first error aborts the parse.
    pub fn parse(mut self) -> Result<TranslationUnit, ParseError> {
        let mut unit = TranslationUnit::default();
        let mut guard = LoopGuard::new("translation_unit");

        while !self.at_eof() {
            guard.check(self.span())?;
            if let Some(item) = self.parse_external()? {
                unit.items.push(item);
            }
        }

        Ok(unit)
    }

    /// Typedef names seen so far.
    pub fn typedef_names(&self) -> &FxHashSet<String> {
        &self.typedef_names
    }

    fn parse_external(&mut self) -> Result<Option<ExternalDecl>, ParseError> {
        match self.current() {
            Token::Semicolon => {
                self.advance();
                return Ok(None);
            }
            Token::StaticAssert => {
                self.advance();
                self.skip_balanced(Token::LeftParen, Token::RightParen)?;
                self.expect(Token::Semicolon, "';' after _Static_assert")?;
                return Ok(None);
            }
            Token::Identifier(name) if name == "_Pragma" => {
                self.advance();
                self.skip_balanced(Token::LeftParen, Token::RightParen)?;
                return Ok(None);
            }
            _ => {}
        }

        let span = self.span();
        let (storage, base) = self.parse_specifiers()?;

        // `struct foo { ... };` declares a tag and nothing else
        if self.check(&Token::Semicolon) {
            self.advance();
            return Ok(Some(ExternalDecl::Declaration(Declaration {
                storage,
                base,
                declarators: Vec::new(),
                span,
            })));
        }

        let mut declarators = Vec::new();
        let mut guard = LoopGuard::new("init_declarator_list");
        loop {
            guard.check(self.span())?;
            let declarator = self.parse_declarator(false)?;
            self.skip_attributes()?;

            if storage.is_typedef {
                if let Some(name) = &declarator.name {
                    self.typedef_names.insert(name.clone());
                }
            }

            if declarators.is_empty() && declarator.is_function() && self.check(&Token::LeftBrace) {
                self.skip_balanced(Token::LeftBrace, Token::RightBrace)?;
                return Ok(Some(ExternalDecl::FunctionDef(Declaration {
                    storage,
                    base,
                    declarators: vec![declarator],
                    span,
                })));
            }

            if self.check(&Token::Assign) {
                self.advance();
                self.skip_expression()?;
            }
            declarators.push(declarator);

            match self.current() {
                Token::Comma => {
                    self.advance();
                }
                Token::Semicolon => {
                    self.advance();
                    break;
                }
                other => return Err(ParseError::unexpected("';' or ','", other, self.span())),
            }
        }

        Ok(Some(ExternalDecl::Declaration(Declaration {
            storage,
            base,
            declarators,
            span,
        })))
    }

    // ── Token cursor ─────────────────────────────────────────────────────

    fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn peek(&self, offset: usize) -> &Token {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].0
    }

    fn span(&self) -> Span {
        self.tokens[self.pos].1
    }

    fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        self.current() == token
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), ParseError> {
        if self.check(&token) {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::unexpected(what, self.current(), self.span()))
        }
    }

    fn is_typedef_name(&self, name: &str) -> bool {
        self.typedef_names.contains(name)
    }
}

/// Parse `source` into a declaration tree.
pub fn parse(source: &str) -> Result<TranslationUnit, ParseError> {
    Parser::new(source)?.parse()
}
