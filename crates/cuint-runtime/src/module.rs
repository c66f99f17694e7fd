//! C modules: a header/source pair compiled to a shared object and bound.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use cuint_engine::{BindingModule, Preprocessor};

use crate::config::HarnessConfig;
use crate::error::RuntimeError;
use crate::toolchain::Toolchain;

/// A bound C module built from `<stem>.h` and `<stem>.c`.
///
/// Dereferences to the [`BindingModule`], so types and functions are
/// reachable directly: `module.new_instance("Foo", args![..])`.
#[derive(Debug)]
pub struct CModule {
    header: PathBuf,
    artifact: PathBuf,
    bindings: BindingModule,
}

impl CModule {
    /// Compile `<stem>.c` to `<stem>.so`, then bind `<stem>.h` against it.
    pub fn compile(
        stem: &Path,
        toolchain: &Toolchain,
        preprocessor: &Preprocessor,
    ) -> Result<Self, RuntimeError> {
        toolchain.compile(&stem.with_extension("c"))?;
        Self::load(stem, preprocessor)
    }

    /// Bind an already built `<stem>.so` using `<stem>.h`.
    pub fn load(stem: &Path, preprocessor: &Preprocessor) -> Result<Self, RuntimeError> {
        let header = stem.with_extension("h");
        let artifact = stem.with_extension("so");
        let name = stem
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let bindings = BindingModule::from_header(&name, &header, &artifact, preprocessor)?;
        Ok(Self {
            header,
            artifact,
            bindings,
        })
    }

    /// Compile and bind `<src>/<name>` using the configured toolchain.
    pub fn from_config(name: &str, config: &HarnessConfig) -> Result<Self, RuntimeError> {
        let stem = config.src_dir().join(name);
        Self::compile(
            &stem,
            &Toolchain::from_config(&config.compiler),
            &config.preprocessor(),
        )
    }

    pub fn header(&self) -> &Path {
        &self.header
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn bindings(&self) -> &BindingModule {
        &self.bindings
    }
}

impl Deref for CModule {
    type Target = BindingModule;

    fn deref(&self) -> &BindingModule {
        &self.bindings
    }
}
