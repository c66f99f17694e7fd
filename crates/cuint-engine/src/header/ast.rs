//! Declaration tree produced by the header parser.
//!
//! The tree only models what a binding generator needs: storage classes, base
//! types, and declarators with their derivation chain. Expressions never make
//! it into the tree.

use crate::header::token::Span;

/// A whole preprocessed translation unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationUnit {
    pub items: Vec<ExternalDecl>,
}

/// A top-level item.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalDecl {
    /// `specifiers declarator, declarator ... ;`
    Declaration(Declaration),
    /// A function with a body. The body itself is not retained.
    FunctionDef(Declaration),
}

impl ExternalDecl {
    pub fn declaration(&self) -> &Declaration {
        match self {
            ExternalDecl::Declaration(decl) | ExternalDecl::FunctionDef(decl) => decl,
        }
    }
}

/// Storage-class flags of a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Storage {
    pub is_typedef: bool,
    pub is_extern: bool,
    pub is_static: bool,
    pub is_inline: bool,
}

/// One declaration: shared specifiers plus zero or more declarators.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub storage: Storage,
    pub base: TypeSpec,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

/// Base type named by the specifier list.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Void,
    /// Arithmetic builtin, e.g. `unsigned long`.
    Builtin(Builtin),
    Record(Record),
    Enum { tag: Option<String> },
    /// A previously declared typedef name.
    Named(String),
}

/// Arithmetic builtin types, reduced to what return coercion distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Builtin {
    pub kind: BuiltinKind,
    pub unsigned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Char,
    Short,
    Int,
    Long,
    LongLong,
    Bool,
    Float,
    Double,
    Int128,
}

/// Struct or union.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub kind: RecordKind,
    pub tag: Option<String>,
    /// `None` when the record is referenced by tag without a body.
    pub members: Option<Vec<Member>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

/// A record member. Anonymous members (nested records, padding bit-fields)
/// have no name.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub name: Option<String>,
    pub base: TypeSpec,
    pub derived: Vec<Derived>,
}

/// A declarator: the declared name and how its type derives from the base.
///
/// `derived` reads outward from the name, so `*f(int)` is
/// `[Function, Pointer]` (function returning pointer) and `(*f)(int)` is
/// `[Pointer, Function]` (pointer to function).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Declarator {
    pub name: Option<String>,
    pub derived: Vec<Derived>,
}

impl Declarator {
    /// Parameters if this declarator declares a function.
    pub fn function_params(&self) -> Option<&Params> {
        match self.derived.first() {
            Some(Derived::Function(params)) => Some(params),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        self.function_params().is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Derived {
    Pointer,
    Array,
    Function(Params),
}

/// A parameter list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub params: Vec<Param>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Option<String>,
    pub base: TypeSpec,
    pub derived: Vec<Derived>,
}

impl Param {
    /// `(void)` spells an empty parameter list.
    pub fn is_void(&self) -> bool {
        self.name.is_none() && self.derived.is_empty() && self.base == TypeSpec::Void
    }
}
