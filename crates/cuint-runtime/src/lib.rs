//! cuint runtime
//!
//! Builds C modules, binds them through `cuint-engine`, and runs tests in
//! crash-isolated child processes:
//! - **Config**: `cuint.toml` harness settings (`config` module)
//! - **Toolchain**: `X.c` -> `X.so` builds (`toolchain` module)
//! - **Modules**: compiled and bound C modules (`module` module)
//! - **Executor**: one child process per test, with pass/fail/crash
//!   classification (`executor` module)
//! - **Backtraces**: core files and crash reports through the debugger
//!   (`backtrace` module)
//! - **Suites**: listing and running whole test binaries (`suite` module)

#[cfg(not(unix))]
compile_error!("cuint-runtime relies on Unix signals and supports Unix targets only");

pub mod backtrace;
pub mod config;
pub mod error;
pub mod executor;
pub mod module;
pub mod signal;
pub mod suite;
pub mod toolchain;

pub use backtrace::{BacktraceExtractor, NO_CORE_DUMP};
pub use config::{ConfigError, HarnessConfig};
pub use error::RuntimeError;
pub use executor::{in_child, isolate, Executor, TestCase, TestOutcome};
pub use module::CModule;
pub use suite::{SuiteOptions, SuiteReport, TestReport, TestSuite};
pub use toolchain::{compile, Toolchain, ToolchainError};

// Engine types needed to drive bound modules
pub use cuint_engine::{args, Args, CallError, Instance, NativeHandle, Value};
