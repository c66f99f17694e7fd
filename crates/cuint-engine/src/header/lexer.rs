//! Lexer for preprocessed C headers.
//!
//! Built on logos. Produces `(Token, Span)` pairs terminated by [`Token::Eof`],
//! with 1-based line and column numbers resolved from byte offsets.

use crate::header::token::{Span, Token};
use logos::{FilterResult, Logos};
use std::fmt;

/// Logos-based token enum for lexing.
///
/// Converted to the public [`Token`] once spans are resolved.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f\v]+")]
#[logos(skip r"//[^\n]*")]
// `#pragma` and stray line markers survive `-E -P`
#[logos(skip r"#[^\n]*")]
#[logos(skip "__extension__")]
enum LogosToken {
    // Storage classes
    #[token("typedef")]
    Typedef,
    #[token("extern")]
    Extern,
    #[token("static")]
    Static,
    #[token("inline")]
    #[token("__inline")]
    #[token("__inline__")]
    Inline,
    #[token("register")]
    Register,
    #[token("auto")]
    Auto,
    #[token("_Thread_local")]
    #[token("__thread")]
    ThreadLocal,
    #[token("_Noreturn")]
    Noreturn,

    // Qualifiers
    #[token("const")]
    #[token("__const")]
    Const,
    #[token("volatile")]
    #[token("__volatile__")]
    Volatile,
    #[token("restrict")]
    #[token("__restrict")]
    #[token("__restrict__")]
    Restrict,
    #[token("_Atomic")]
    Atomic,

    // Builtin type specifiers
    #[token("void")]
    Void,
    #[token("char")]
    Char,
    #[token("short")]
    Short,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("float")]
    Float,
    #[token("double")]
    Double,
    #[token("signed")]
    #[token("__signed__")]
    Signed,
    #[token("unsigned")]
    Unsigned,
    #[token("_Bool")]
    Bool,
    #[token("_Complex")]
    Complex,

    // Records
    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("enum")]
    Enum,

    // Constructs skipped as a whole
    #[token("_Static_assert")]
    StaticAssert,
    #[token("_Alignas")]
    Alignas,
    #[token("__attribute__")]
    #[token("__attribute")]
    Attribute,
    #[token("__asm__")]
    #[token("__asm")]
    #[token("asm")]
    Asm,

    // Literals
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_string())]
    Identifier(String),
    #[regex(r"[0-9][0-9A-Za-z_.]*", |lex| lex.slice().to_string())]
    #[regex(r"\.[0-9][0-9A-Za-z_]*", |lex| lex.slice().to_string())]
    Number(String),
    #[regex(r"[LuU8]*'([^'\\\n]|\\.)*'", |lex| lex.slice().to_string())]
    CharLiteral(String),
    #[regex(r#"[LuU8]*"([^"\\\n]|\\.)*""#, |lex| lex.slice().to_string())]
    StringLiteral(String),

    // Punctuators the declaration grammar cares about
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
    #[token("=")]
    Assign,
    #[token(":")]
    Colon,
    #[token("...")]
    Ellipsis,

    // Everything else an expression may contain
    #[regex(r"->|\+\+|--|<<=?|>>=?|[<>=!]=|&&|\|\||[-+*/%&|^]=|[-+/%&|^!~<>?.@\\]", |lex| lex.slice().to_string())]
    Operator(String),

    #[token("/*", skip_block_comment)]
    BlockComment,
}

/// Consume a `/* ... */` comment up to the first `*/`. An unterminated
/// comment is reported at its opening `/`.
fn skip_block_comment(lex: &mut logos::Lexer<'_, LogosToken>) -> FilterResult<(), ()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            FilterResult::Skip
        }
        None => FilterResult::Error(()),
    }
}


impl From<LogosToken> for Token {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::Typedef => Token::Typedef,
            LogosToken::Extern => Token::Extern,
            LogosToken::Static => Token::Static,
            LogosToken::Inline => Token::Inline,
            LogosToken::Register => Token::Register,
            LogosToken::Auto => Token::Auto,
            LogosToken::ThreadLocal => Token::ThreadLocal,
            LogosToken::Noreturn => Token::Noreturn,
            LogosToken::Const => Token::Const,
            LogosToken::Volatile => Token::Volatile,
            LogosToken::Restrict => Token::Restrict,
            LogosToken::Atomic => Token::Atomic,
            LogosToken::Void => Token::Void,
            LogosToken::Char => Token::Char,
            LogosToken::Short => Token::Short,
            LogosToken::Int => Token::Int,
            LogosToken::Long => Token::Long,
            LogosToken::Float => Token::Float,
            LogosToken::Double => Token::Double,
            LogosToken::Signed => Token::Signed,
            LogosToken::Unsigned => Token::Unsigned,
            LogosToken::Bool => Token::Bool,
            LogosToken::Complex => Token::Complex,
            LogosToken::Struct => Token::Struct,
            LogosToken::Union => Token::Union,
            LogosToken::Enum => Token::Enum,
            LogosToken::StaticAssert => Token::StaticAssert,
            LogosToken::Alignas => Token::Alignas,
            LogosToken::Attribute => Token::Attribute,
            LogosToken::Asm => Token::Asm,
            LogosToken::Identifier(name) => Token::Identifier(name),
            LogosToken::Number(text) => Token::Number(text),
            LogosToken::CharLiteral(text) => Token::CharLiteral(text),
            LogosToken::StringLiteral(text) => Token::StringLiteral(text),
            LogosToken::LeftBrace => Token::LeftBrace,
            LogosToken::RightBrace => Token::RightBrace,
            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::LeftBracket => Token::LeftBracket,
            LogosToken::RightBracket => Token::RightBracket,
            LogosToken::Semicolon => Token::Semicolon,
            LogosToken::Comma => Token::Comma,
            LogosToken::Star => Token::Star,
            LogosToken::Assign => Token::Assign,
            LogosToken::Colon => Token::Colon,
            LogosToken::Ellipsis => Token::Ellipsis,
            LogosToken::Operator(text) => Token::Operator(text),
            LogosToken::BlockComment => unreachable!("block comments are always skipped"),
        }
    }
}

/// Byte offset to line/column mapping.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn locate(&self, offset: usize) -> (u32, u32) {
        let line = match self.starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        ((line + 1) as u32, (offset - self.starts[line] + 1) as u32)
    }
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { char: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. } => *span,
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexError::UnexpectedCharacter { char, span } => write!(
                f,
                "unexpected character {:?} at {}:{}",
                char, span.line, span.column
            ),
        }
    }
}

impl std::error::Error for LexError {}

/// Main lexer structure.
pub struct Lexer<'a> {
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source }
    }

    /// Tokenize the whole source. Stops at the first unrecognised character.
    pub fn tokenize(self) -> Result<Vec<(Token, Span)>, LexError> {
        let index = LineIndex::new(self.source);
        let mut tokens = Vec::new();
        let mut lexer = LogosToken::lexer(self.source);

        while let Some(result) = lexer.next() {
            let range = lexer.span();
            let (line, column) = index.locate(range.start);
            let span = Span::new(range.start, range.end, line, column);
            match result {
                Ok(token) => tokens.push((token.into(), span)),
                Err(()) => {
                    let char = self.source[range.start..].chars().next().unwrap_or('\0');
                    return Err(LexError::UnexpectedCharacter { char, span });
                }
            }
        }

        let end = self.source.len();
        let (line, column) = index.locate(end);
        tokens.push((Token::Eof, Span::new(end, end, line, column)));
        Ok(tokens)
    }
}
