//! Token definitions for preprocessed C headers.
//!
//! Only the parts of C that can appear in a declaration get their own token.
//! Everything an expression could contain collapses into [`Token::Operator`],
//! since the parser skips array sizes, initialisers, and bodies wholesale.

use std::fmt;

/// A token in a preprocessed C translation unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Storage classes
    Typedef,
    Extern,
    Static,
    Inline,
    Register,
    Auto,
    ThreadLocal,
    Noreturn,

    // Qualifiers
    Const,
    Volatile,
    Restrict,
    Atomic,

    // Builtin type specifiers
    Void,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Signed,
    Unsigned,
    Bool,
    Complex,

    // Records
    Struct,
    Union,
    Enum,

    // Constructs skipped as a whole
    StaticAssert,
    Alignas,
    Attribute,
    Asm,

    // Literals
    Identifier(String),
    Number(String),
    CharLiteral(String),
    StringLiteral(String),

    // Punctuators the declaration grammar cares about
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Star,
    Assign,
    Colon,
    Ellipsis,

    // Everything else an expression may contain
    Operator(String),

    Eof,
}

impl Token {
    /// Whether this token may start a declaration specifier list.
    pub fn starts_specifier(&self) -> bool {
        matches!(
            self,
            Token::Typedef
                | Token::Extern
                | Token::Static
                | Token::Inline
                | Token::Register
                | Token::Auto
                | Token::ThreadLocal
                | Token::Noreturn
                | Token::Const
                | Token::Volatile
                | Token::Restrict
                | Token::Atomic
                | Token::Void
                | Token::Char
                | Token::Short
                | Token::Int
                | Token::Long
                | Token::Float
                | Token::Double
                | Token::Signed
                | Token::Unsigned
                | Token::Bool
                | Token::Complex
                | Token::Struct
                | Token::Union
                | Token::Enum
                | Token::Alignas
                | Token::Attribute
        )
    }
}

/// Source location information for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Typedef => write!(f, "typedef"),
            Token::Extern => write!(f, "extern"),
            Token::Static => write!(f, "static"),
            Token::Inline => write!(f, "inline"),
            Token::Register => write!(f, "register"),
            Token::Auto => write!(f, "auto"),
            Token::ThreadLocal => write!(f, "_Thread_local"),
            Token::Noreturn => write!(f, "_Noreturn"),
            Token::Const => write!(f, "const"),
            Token::Volatile => write!(f, "volatile"),
            Token::Restrict => write!(f, "restrict"),
            Token::Atomic => write!(f, "_Atomic"),
            Token::Void => write!(f, "void"),
            Token::Char => write!(f, "char"),
            Token::Short => write!(f, "short"),
            Token::Int => write!(f, "int"),
            Token::Long => write!(f, "long"),
            Token::Float => write!(f, "float"),
            Token::Double => write!(f, "double"),
            Token::Signed => write!(f, "signed"),
            Token::Unsigned => write!(f, "unsigned"),
            Token::Bool => write!(f, "_Bool"),
            Token::Complex => write!(f, "_Complex"),
            Token::Struct => write!(f, "struct"),
            Token::Union => write!(f, "union"),
            Token::Enum => write!(f, "enum"),
            Token::StaticAssert => write!(f, "_Static_assert"),
            Token::Alignas => write!(f, "_Alignas"),
            Token::Attribute => write!(f, "__attribute__"),
            Token::Asm => write!(f, "__asm__"),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Number(text)
            | Token::CharLiteral(text)
            | Token::StringLiteral(text)
            | Token::Operator(text) => write!(f, "{}", text),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Star => write!(f, "*"),
            Token::Assign => write!(f, "="),
            Token::Colon => write!(f, ":"),
            Token::Ellipsis => write!(f, "..."),
            Token::Eof => write!(f, "end of input"),
        }
    }
}
