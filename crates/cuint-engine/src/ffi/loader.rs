//! Dynamic library loading for compiled C modules
//!
//! Thin wrapper over `dlopen`/`dlsym`/`dlclose`. Symbols resolved from a
//! [`Library`] stay valid for as long as the library is alive, so callers keep
//! it behind an `Arc` next to every resolved function.

use std::ffi::{c_void, CStr, CString};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during library loading
#[derive(Debug, Error)]
pub enum LoadError {
    /// Library file not found or could not be loaded
    #[error("Library not found: {path}")]
    NotFound {
        /// Path that was attempted, with the loader's message
        path: String,
    },

    /// Symbol not found in library
    #[error("Symbol not found: {symbol} in {library}")]
    SymbolNotFound {
        /// Symbol name that was not found
        symbol: String,
        /// Library path
        library: String,
    },

    /// Platform-specific error
    #[error("Platform error: {0}")]
    PlatformError(String),

    /// Invalid path encoding
    #[error("Invalid UTF-8 in path: {0}")]
    InvalidPath(String),
}

/// Raw address of a resolved symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol(*mut c_void);

impl Symbol {
    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }
}

/// A loaded shared object
pub struct Library {
    handle: *mut c_void,
    path: String,
}

impl Library {
    /// Load a shared object from the given path.
    ///
    /// Uses `dlopen(RTLD_NOW | RTLD_LOCAL)`: every symbol is resolved
    /// immediately, and none leak into libraries loaded later.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path_ref = path.as_ref();
        let path_str = path_ref
            .to_str()
            .ok_or_else(|| LoadError::InvalidPath(format!("{:?}", path_ref)))?;
        let c_path = CString::new(path_str)
            .map_err(|e| LoadError::PlatformError(format!("Invalid path: {}", e)))?;

        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        if handle.is_null() {
            return Err(LoadError::NotFound {
                path: format!("{}: {}", path_str, last_error()),
            });
        }

        log::debug!("loaded {}", path_str);
        Ok(Library {
            handle,
            path: path_str.to_string(),
        })
    }

    /// Handle to the running process image and its loaded dependencies.
    pub fn open_self() -> Result<Self, LoadError> {
        let handle = unsafe { libc::dlopen(std::ptr::null(), libc::RTLD_NOW) };
        if handle.is_null() {
            return Err(LoadError::PlatformError(last_error()));
        }
        Ok(Library {
            handle,
            path: "<self>".to_string(),
        })
    }

    /// Resolve a symbol by name.
    pub fn symbol(&self, name: &str) -> Result<Symbol, LoadError> {
        let c_name = CString::new(name)
            .map_err(|e| LoadError::PlatformError(format!("Invalid symbol name: {}", e)))?;

        let symbol = unsafe {
            // Clear any previous errors
            libc::dlerror();
            libc::dlsym(self.handle, c_name.as_ptr())
        };

        let err_ptr = unsafe { libc::dlerror() };
        if !err_ptr.is_null() || symbol.is_null() {
            let library = if err_ptr.is_null() {
                self.path.clone()
            } else {
                let error = unsafe { CStr::from_ptr(err_ptr) }.to_string_lossy();
                format!("{}: {}", self.path, error)
            };
            return Err(LoadError::SymbolNotFound {
                symbol: name.to_string(),
                library,
            });
        }

        Ok(Symbol(symbol))
    }

    /// Whether `name` resolves in this library.
    pub fn has_symbol(&self, name: &str) -> bool {
        self.symbol(name).is_ok()
    }

    /// Get the path this library was loaded from
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        unsafe {
            libc::dlclose(self.handle);
        }
    }
}

unsafe impl Send for Library {}
unsafe impl Sync for Library {}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library").field("path", &self.path).finish()
    }
}

fn last_error() -> String {
    let err_ptr = unsafe { libc::dlerror() };
    if err_ptr.is_null() {
        "Unknown error".to_string()
    } else {
        unsafe { CStr::from_ptr(err_ptr) }.to_string_lossy().into_owned()
    }
}
