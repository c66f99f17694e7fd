//! Runtime error types.

use cuint_engine::BindError;

use crate::config::ConfigError;
use crate::toolchain::ToolchainError;

/// Errors that can occur while building, binding, or executing tests.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Shared-object build error
    #[error("{0}")]
    Toolchain(#[from] ToolchainError),

    /// Header or binding error
    #[error("Binding error: {0}")]
    Bind(#[from] BindError),

    /// An external tool (debugger, unpacker, test binary) exited non-zero
    #[error("`{command}` failed ({status}):\n{output}")]
    Command {
        command: String,
        status: String,
        output: String,
    },
}
