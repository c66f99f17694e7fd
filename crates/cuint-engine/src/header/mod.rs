//! Header front end: preprocessing, lexing, parsing, and declaration
//! collection.
//!
//! # Example
//!
//! ```ignore
//! use cuint_engine::header::{DeclCollector, Preprocessor};
//!
//! let text = Preprocessor::default().run("include/foo.h".as_ref())?;
//! let catalog = DeclCollector::collect(&text)?;
//! for ty in &catalog.types {
//!     println!("{} ({} methods)", ty.name, ty.methods.len());
//! }
//! ```

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod decl;
pub mod collector;
pub mod preprocess;

pub use token::{Token, Span};
pub use lexer::{Lexer, LexError};
pub use parser::{Parser, ParseError, ParseErrorKind};
pub use decl::{
    Catalog, FunctionDeclaration, MethodDeclaration, ReturnKind, TypeDeclaration,
};
pub use collector::DeclCollector;
pub use preprocess::{Preprocessor, PreprocessError};
