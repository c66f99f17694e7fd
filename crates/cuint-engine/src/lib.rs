//! cuint engine
//!
//! Convention-driven bindings for C shared objects:
//! - **Header**: preprocessing, lexing, parsing, and declaration collection
//!   (`header` module)
//! - **FFI**: library loading, dynamic values, and checked foreign calls
//!   (`ffi` module)
//! - **Binding**: runtime types, instances, and free functions synthesized
//!   from a catalog (`binding` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use cuint_engine::{args, BindingModule, Preprocessor};
//!
//! let module = BindingModule::from_header(
//!     "foo",
//!     "src/foo.h".as_ref(),
//!     "src/foo.so".as_ref(),
//!     &Preprocessor::default(),
//! )?;
//!
//! let foo = module.new_instance("Foo", args![1, "name"])?;
//! let n = foo.call("bar", args![2])?;
//! let greeting = module.call("hello", args![])?;
//! ```

#![warn(rust_2018_idioms)]
#![allow(clippy::arc_with_non_send_sync)]

#[cfg(not(unix))]
compile_error!("cuint-engine loads shared objects through dlopen and supports Unix targets only");

/// Header front end: preprocessor, lexer, parser, and declaration collector
pub mod header;

/// Dynamic library loading and foreign calls
pub mod ffi;

/// Runtime types and instances synthesized from a catalog
pub mod binding;

// ============================================================================
// Re-exports
// ============================================================================

pub use header::{
    Catalog, DeclCollector, FunctionDeclaration, MethodDeclaration, ParseError, PreprocessError,
    Preprocessor, ReturnKind, TypeDeclaration,
};

pub use ffi::{Args, CallError, ForeignFunction, Library, LoadError, NativeHandle, Value};

pub use binding::{BindError, BindingModule, Instance, RuntimeType};
