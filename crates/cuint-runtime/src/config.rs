//! Harness configuration (cuint.toml)
//!
//! Every section and field is optional; missing values fall back to the
//! defaults documented on each field. Relative paths are resolved against
//! the directory holding the configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use cuint_engine::Preprocessor;

use crate::signal;

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "cuint.toml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "CUINT_CONFIG";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Complete harness configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HarnessConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub preprocessor: PreprocessorConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub backtrace: BacktraceConfig,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub root: PathBuf,
}

/// Source layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Directory holding `X.h`/`X.c` pairs and their `X.so` (default: "src")
    #[serde(default = "default_src")]
    pub src: PathBuf,
}

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self { src: default_src() }
    }
}

/// Shared-object build
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompilerConfig {
    /// C compiler (default: "gcc")
    #[serde(default = "default_cc")]
    pub cc: String,

    /// Extra flags placed before the output
    #[serde(default)]
    pub cflags: Vec<String>,

    /// Libraries and linker flags placed after the source
    #[serde(default)]
    pub ldadd: Vec<String>,
}

fn default_cc() -> String {
    "gcc".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            cc: default_cc(),
            cflags: Vec::new(),
            ldadd: Vec::new(),
        }
    }
}

/// Header preprocessing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessorConfig {
    /// Preprocessor command (default: "gcc")
    #[serde(default = "default_cc")]
    pub command: String,

    /// Arguments; the header arrives on stdin (default: ["-E", "-P", "-"])
    #[serde(default = "default_preprocessor_args")]
    pub args: Vec<String>,

    /// Extra include directories
    #[serde(default)]
    pub include: Vec<PathBuf>,
}

fn default_preprocessor_args() -> Vec<String> {
    Preprocessor::default().args
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            command: default_cc(),
            args: default_preprocessor_args(),
            include: Vec::new(),
        }
    }
}

/// Crash-isolated execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutorConfig {
    /// Environment variable that marks a re-invoked child (default: "CUINT_TEST")
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Per-test limit in seconds; 0 disables it (default: 300)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Signals classified as crashes (default: ["SIGSEGV"])
    #[serde(default = "default_crash_signals")]
    pub crash_signals: Vec<String>,
}

fn default_marker() -> String {
    "CUINT_TEST".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_crash_signals() -> Vec<String> {
    vec!["SIGSEGV".to_string()]
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
            timeout_secs: default_timeout_secs(),
            crash_signals: default_crash_signals(),
        }
    }
}

/// Post-mortem backtraces
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktraceConfig {
    /// Debugger (default: "gdb")
    #[serde(default = "default_debugger")]
    pub debugger: String,

    /// Crash-report directory (default: "/var/crash")
    #[serde(default = "default_crash_dir")]
    pub crash_dir: PathBuf,

    /// Crash-report unpacker (default: "apport-unpack")
    #[serde(default = "default_unpacker")]
    pub unpacker: String,
}

fn default_debugger() -> String {
    "gdb".to_string()
}

fn default_crash_dir() -> PathBuf {
    PathBuf::from("/var/crash")
}

fn default_unpacker() -> String {
    "apport-unpack".to_string()
}

impl Default for BacktraceConfig {
    fn default() -> Self {
        Self {
            debugger: default_debugger(),
            crash_dir: default_crash_dir(),
            unpacker: default_unpacker(),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;
        config.root = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: HarnessConfig = toml::from_str(content)?;
        config.root = PathBuf::from(".");
        config.validate()?;
        Ok(config)
    }

    /// Load from `$CUINT_CONFIG`, else the nearest `cuint.toml` at or above
    /// the working directory, else defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match Self::find(&cwd) {
            Some(path) => {
                log::debug!("using {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self {
                root: cwd,
                ..Self::default()
            }),
        }
    }

    /// Walk up from `start` looking for `cuint.toml`.
    pub fn find(start: &Path) -> Option<PathBuf> {
        let mut dir = start.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compiler.cc.is_empty() {
            return Err(ConfigError::Validation("compiler.cc is empty".to_string()));
        }
        if self.executor.marker.is_empty() {
            return Err(ConfigError::Validation("executor.marker is empty".to_string()));
        }
        for name in &self.executor.crash_signals {
            if signal::number(name).is_none() {
                return Err(ConfigError::Validation(format!(
                    "executor.crash_signals: unknown signal '{}'",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Resolve a configured path against the configuration root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Directory holding sources and built artifacts.
    pub fn src_dir(&self) -> PathBuf {
        self.resolve(&self.paths.src)
    }

    /// Crash signals as numbers. Unknown names were rejected by `validate`.
    pub fn crash_signals(&self) -> Vec<i32> {
        self.executor
            .crash_signals
            .iter()
            .filter_map(|name| signal::number(name))
            .collect()
    }

    /// Preprocessor built from the `[preprocessor]` section.
    pub fn preprocessor(&self) -> Preprocessor {
        Preprocessor {
            command: self.preprocessor.command.clone(),
            args: self.preprocessor.args.clone(),
            include: self
                .preprocessor
                .include
                .iter()
                .map(|dir| self.resolve(dir))
                .collect(),
        }
    }
}
