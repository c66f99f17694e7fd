//! Runs a header through the system C preprocessor.
//!
//! Compiler extensions the declaration parser does not model are neutralised
//! by a block of `#define`s prepended to the header text. The combined text is
//! then fed on stdin to `gcc -E -P -` (configurable), so macros are expanded
//! and no line markers are emitted.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Neutralisation block prepended to every header.
pub const PREAMBLE: &str = "\
#define __attribute__(x)
#define __extension__
#define __inline
#define __inline__
#define __asm__(x)
#define asm(x)
#define __const const
#define __restrict
#define __restrict__
#define __volatile__ volatile
#define __builtin_va_list void *
#define __thread
#define _Noreturn
#define __THROW
#define __wur
#define __nonnull(x)
";

static RESIDUAL_RESTRICT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b__restrict\s+(\w+)").expect("valid restrict pattern"));

/// Preprocessing failure.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("failed to read header {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run preprocessor '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The preprocessor exited non-zero; `output` is its diagnostics verbatim.
    #[error("preprocessor failed:\n{output}")]
    Failed { output: String },
}

/// External preprocessor invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preprocessor {
    pub command: String,
    pub args: Vec<String>,
    pub include: Vec<PathBuf>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self {
            command: "gcc".to_string(),
            args: vec!["-E".to_string(), "-P".to_string(), "-".to_string()],
            include: Vec::new(),
        }
    }
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an include directory passed as `-I`.
    pub fn include(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include.push(dir.into());
        self
    }

    /// Preprocess the header at `header`, relative includes resolved from its
    /// directory.
    pub fn run(&self, header: &Path) -> Result<String, PreprocessError> {
        let text = std::fs::read_to_string(header).map_err(|source| PreprocessError::Read {
            path: header.to_path_buf(),
            source,
        })?;
        let dir = match header.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        self.run_source(&text, dir)
    }

    /// Preprocess in-memory header text as if it lived in `dir`.
    pub fn run_source(&self, text: &str, dir: &Path) -> Result<String, PreprocessError> {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut command = Command::new(&self.command);
        command
            .current_dir(&dir)
            .arg(format!("-I{}", dir.display()))
            .args(self.include.iter().map(|inc| format!("-I{}", inc.display())))
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        log::debug!("preprocessing in {} with {:?}", dir.display(), command);
        let spawn_error = |source| PreprocessError::Spawn {
            command: self.command.clone(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_error)?;

        let mut input = String::with_capacity(PREAMBLE.len() + text.len() + 1);
        input.push_str(PREAMBLE);
        input.push_str(text);
        input.push('\n');

        // stdin is fed concurrently with draining stdout
        let writer = child.stdin.take().map(|mut stdin| {
            thread::spawn(move || {
                let _ = stdin.write_all(input.as_bytes());
            })
        });
        let output = child.wait_with_output().map_err(spawn_error)?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }

        if !output.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
            if diagnostics.is_empty() {
                diagnostics = String::from_utf8_lossy(&output.stdout).into_owned();
            }
            return Err(PreprocessError::Failed {
                output: diagnostics,
            });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(RESIDUAL_RESTRICT.replace_all(&text, "$1").into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_residual_restrict_is_stripped() {
        let out = RESIDUAL_RESTRICT.replace_all("char *__restrict dst, int __restrict  n", "$1");
        assert_eq!(out, "char *dst, int n");
    }

    #[test]
    fn test_preamble_covers_extensions() {
        for word in ["__attribute__", "__extension__", "__THROW", "__nonnull", "__wur"] {
            assert!(PREAMBLE.contains(word), "missing {}", word);
        }
    }

    #[test]
    fn test_default_command() {
        let pp = Preprocessor::default();
        assert_eq!(pp.command, "gcc");
        assert_eq!(pp.args, vec!["-E", "-P", "-"]);
    }
}
