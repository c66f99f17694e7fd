//! Declaration specifiers: storage classes, qualifiers, and base types.

use super::guards::LoopGuard;
use super::{ParseError, Parser};
use crate::header::ast::{Builtin, BuiltinKind, Member, Record, RecordKind, Storage, TypeSpec};
use crate::header::token::Token;

/// GCC builtin type names that reach the parser as plain identifiers.
const BUILTIN_TYPE_NAMES: &[(&str, BuiltinKind)] = &[
    ("__int128", BuiltinKind::Int128),
    ("__int128_t", BuiltinKind::Int128),
    ("__uint128_t", BuiltinKind::Int128),
    ("__builtin_va_list", BuiltinKind::Long),
    ("__float128", BuiltinKind::Double),
    ("__float80", BuiltinKind::Double),
    ("__fp16", BuiltinKind::Float),
    ("__bf16", BuiltinKind::Float),
    ("_Float16", BuiltinKind::Float),
    ("_Float32", BuiltinKind::Float),
    ("_Float32x", BuiltinKind::Double),
    ("_Float64", BuiltinKind::Double),
    ("_Float64x", BuiltinKind::Double),
    ("_Float128", BuiltinKind::Double),
    ("_Float128x", BuiltinKind::Double),
];

/// Builtin keywords seen in one specifier list.
#[derive(Default)]
struct BuiltinWords {
    any: bool,
    unsigned: bool,
    longs: u8,
    short: bool,
    char: bool,
    float: bool,
    double: bool,
    bool: bool,
    extension: Option<BuiltinKind>,
}

impl BuiltinWords {
    fn resolve(&self) -> Builtin {
        let kind = if let Some(kind) = self.extension {
            kind
        } else if self.bool {
            BuiltinKind::Bool
        } else if self.char {
            BuiltinKind::Char
        } else if self.short {
            BuiltinKind::Short
        } else if self.double {
            BuiltinKind::Double
        } else if self.float {
            BuiltinKind::Float
        } else if self.longs >= 2 {
            BuiltinKind::LongLong
        } else if self.longs == 1 {
            BuiltinKind::Long
        } else {
            BuiltinKind::Int
        };
        Builtin {
            kind,
            unsigned: self.unsigned,
        }
    }
}

impl Parser {
    /// Parse a specifier list into storage flags and a base type.
    pub(super) fn parse_specifiers(&mut self) -> Result<(Storage, TypeSpec), ParseError> {
        let mut storage = Storage::default();
        let mut base: Option<TypeSpec> = None;
        let mut words = BuiltinWords::default();
        let mut seen_any = false;
        let mut guard = LoopGuard::new("specifiers");

        loop {
            guard.check(self.span())?;
            let has_type = base.is_some() || words.any;
            match self.current().clone() {
                Token::Typedef => storage.is_typedef = true,
                Token::Extern => storage.is_extern = true,
                Token::Static => storage.is_static = true,
                Token::Inline => storage.is_inline = true,
                Token::Register
                | Token::Auto
                | Token::ThreadLocal
                | Token::Noreturn
                | Token::Const
                | Token::Volatile
                | Token::Restrict => {}
                Token::Atomic => {
                    self.advance();
                    if self.check(&Token::LeftParen) {
                        // `_Atomic(T)`: the wrapped type does not matter here
                        self.skip_balanced(Token::LeftParen, Token::RightParen)?;
                        words.any = true;
                    }
                    seen_any = true;
                    continue;
                }
                Token::Alignas => {
                    self.advance();
                    self.skip_balanced(Token::LeftParen, Token::RightParen)?;
                    seen_any = true;
                    continue;
                }
                Token::Attribute | Token::Asm => {
                    self.skip_attributes()?;
                    continue;
                }
                Token::Void => base = Some(TypeSpec::Void),
                Token::Char => {
                    words.any = true;
                    words.char = true;
                }
                Token::Short => {
                    words.any = true;
                    words.short = true;
                }
                Token::Int | Token::Signed | Token::Complex => words.any = true,
                Token::Long => {
                    words.any = true;
                    words.longs += 1;
                }
                Token::Float => {
                    words.any = true;
                    words.float = true;
                }
                Token::Double => {
                    words.any = true;
                    words.double = true;
                }
                Token::Unsigned => {
                    words.any = true;
                    words.unsigned = true;
                }
                Token::Bool => {
                    words.any = true;
                    words.bool = true;
                }
                Token::Struct | Token::Union => {
                    base = Some(TypeSpec::Record(self.parse_record()?));
                    seen_any = true;
                    continue;
                }
                Token::Enum => {
                    base = Some(self.parse_enum()?);
                    seen_any = true;
                    continue;
                }
                Token::Identifier(name) if !has_type => {
                    if self.is_typedef_name(&name) {
                        base = Some(TypeSpec::Named(name));
                    } else if let Some((_, kind)) =
                        BUILTIN_TYPE_NAMES.iter().find(|(builtin, _)| *builtin == name)
                    {
                        words.any = true;
                        words.extension = Some(*kind);
                    } else if !seen_any
                        || matches!(self.peek(1), Token::Identifier(_) | Token::Star)
                    {
                        return Err(ParseError::unknown_type(&name, self.span()));
                    } else {
                        // implicit int: `static counter;`
                        break;
                    }
                }
                _ => break,
            }
            seen_any = true;
            self.advance();
        }

        if !seen_any {
            return Err(ParseError::unexpected(
                "declaration specifiers",
                self.current(),
                self.span(),
            ));
        }

        let base = match base {
            Some(base) => base,
            None => TypeSpec::Builtin(words.resolve()),
        };
        Ok((storage, base))
    }

    fn parse_record(&mut self) -> Result<Record, ParseError> {
        let kind = match self.advance() {
            Token::Union => RecordKind::Union,
            _ => RecordKind::Struct,
        };
        self.skip_attributes()?;

        let tag = match self.current() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        self.skip_attributes()?;

        let members = if self.check(&Token::LeftBrace) {
            Some(self.parse_members()?)
        } else {
            None
        };
        self.skip_attributes()?;

        Ok(Record { kind, tag, members })
    }

    fn parse_members(&mut self) -> Result<Vec<Member>, ParseError> {
        let open = self.span();
        self.expect(Token::LeftBrace, "'{'")?;
        let mut members = Vec::new();
        let mut guard = LoopGuard::new("members");

        while !self.check(&Token::RightBrace) {
            guard.check(self.span())?;
            match self.current() {
                Token::Eof => return Err(ParseError::unterminated("record body", open)),
                Token::Semicolon => {
                    self.advance();
                    continue;
                }
                Token::StaticAssert => {
                    self.advance();
                    self.skip_balanced(Token::LeftParen, Token::RightParen)?;
                    self.expect(Token::Semicolon, "';' after _Static_assert")?;
                    continue;
                }
                _ => {}
            }

            let (_, base) = self.parse_specifiers()?;
            if self.check(&Token::Semicolon) {
                // anonymous nested struct/union
                self.advance();
                members.push(Member {
                    name: None,
                    base,
                    derived: Vec::new(),
                });
                continue;
            }

            loop {
                let declarator = if self.check(&Token::Colon) {
                    Default::default()
                } else {
                    self.parse_declarator(false)?
                };
                if self.check(&Token::Colon) {
                    self.advance();
                    self.skip_expression()?;
                }
                self.skip_attributes()?;
                members.push(Member {
                    name: declarator.name,
                    base: base.clone(),
                    derived: declarator.derived,
                });

                match self.current() {
                    Token::Comma => {
                        self.advance();
                    }
                    Token::Semicolon => {
                        self.advance();
                        break;
                    }
                    other => {
                        return Err(ParseError::unexpected(
                            "';' or ',' in member list",
                            other,
                            self.span(),
                        ))
                    }
                }
            }
        }

        self.advance();
        Ok(members)
    }

    fn parse_enum(&mut self) -> Result<TypeSpec, ParseError> {
        self.advance();
        self.skip_attributes()?;
        let tag = match self.current() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        };
        // `enum e : int` (C23 fixed underlying type)
        if self.check(&Token::Colon) {
            self.advance();
            while !matches!(self.current(), Token::LeftBrace | Token::Semicolon | Token::Eof) {
                self.advance();
            }
        }
        if self.check(&Token::LeftBrace) {
            self.skip_balanced(Token::LeftBrace, Token::RightBrace)?;
        }
        self.skip_attributes()?;
        Ok(TypeSpec::Enum { tag })
    }
}
