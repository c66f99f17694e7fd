//! Shared-object builds: `X.c` -> `X.so`.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::config::CompilerConfig;

/// Build failure
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// Source path has no file stem or directory
    #[error("Invalid source path: {0}")]
    InvalidSource(PathBuf),

    /// Compiler could not be started
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Compiler exited non-zero; `output` is its diagnostics verbatim
    #[error("Build failed:\n{output}")]
    Failed { output: String },
}

/// C compiler invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub cc: String,
    pub cflags: Vec<String>,
    pub ldadd: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::from_config(&CompilerConfig::default())
    }
}

impl Toolchain {
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            cc: config.cc.clone(),
            cflags: config.cflags.clone(),
            ldadd: config.ldadd.clone(),
        }
    }

    /// Compile `source` (`X.c`) into `X.so` next to it.
    ///
    /// Runs `cc -shared -fPIC <cflags> -o X.so X.c <ldadd>` in the source
    /// directory.
    pub fn compile(&self, source: &Path) -> Result<PathBuf, ToolchainError> {
        let (dir, file_name, stem) = match (source.parent(), source.file_name(), source.file_stem())
        {
            (Some(dir), Some(file_name), Some(stem)) => (dir, file_name, stem),
            _ => return Err(ToolchainError::InvalidSource(source.to_path_buf())),
        };
        let dir = if dir.as_os_str().is_empty() {
            Path::new(".")
        } else {
            dir
        };
        let artifact_name = format!("{}.so", stem.to_string_lossy());

        let mut command = Command::new(&self.cc);
        command
            .current_dir(dir)
            .args(["-shared", "-fPIC"])
            .args(&self.cflags)
            .arg("-o")
            .arg(&artifact_name)
            .arg(file_name)
            .args(&self.ldadd);

        log::debug!("building {} with {:?}", source.display(), command);
        let output = command.output().map_err(|source| ToolchainError::Spawn {
            command: self.cc.clone(),
            source,
        })?;

        if !output.status.success() {
            let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
            diagnostics.push_str(&String::from_utf8_lossy(&output.stdout));
            return Err(ToolchainError::Failed {
                output: diagnostics,
            });
        }

        let artifact = dir.join(artifact_name);
        log::info!("built {}", artifact.display());
        Ok(artifact)
    }
}

/// Compile `source` with the default compiler plus `cflags` and `ldadd`.
pub fn compile(source: &Path, cflags: &[&str], ldadd: &[&str]) -> Result<PathBuf, ToolchainError> {
    let toolchain = Toolchain {
        cflags: cflags.iter().map(|flag| flag.to_string()).collect(),
        ldadd: ldadd.iter().map(|flag| flag.to_string()).collect(),
        ..Toolchain::default()
    };
    toolchain.compile(source)
}
