//! Binding synthesis: turns a declaration catalog plus a loaded shared object
//! into callable runtime types and free functions.

pub mod instance;
pub mod registry;

use thiserror::Error;

use crate::ffi::LoadError;
use crate::header::{ParseError, PreprocessError};

pub use instance::Instance;
pub use registry::{runtime_name, BindingModule, RuntimeType};

/// Errors raised while building a [`BindingModule`].
#[derive(Debug, Error)]
pub enum BindError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),

    #[error("failed to parse header: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Load(#[from] LoadError),

    /// A constructor symbol is missing from the shared object.
    #[error("missing constructor symbol '{symbol}'")]
    Symbol {
        symbol: String,
        #[source]
        source: LoadError,
    },
}
