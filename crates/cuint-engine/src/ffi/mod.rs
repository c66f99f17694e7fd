//! FFI support for compiled C modules
//!
//! This module provides:
//! - Dynamic library loading (`Library`)
//! - Dynamic values and call arguments (`Value`, `Args`)
//! - Checked foreign calls through the integer-class C ABI (`ForeignFunction`)

pub mod call;
pub mod loader;
pub mod proxy;
pub mod value;

pub use loader::{Library, LoadError, Symbol};
pub use proxy::{CallError, ForeignFunction};
pub use value::{Args, NativeHandle, Value};
