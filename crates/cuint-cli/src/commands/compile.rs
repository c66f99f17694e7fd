//! `cuint compile` - build a shared object.

use crate::output::{self, StyledOutput};
use cuint_runtime::{HarnessConfig, Toolchain};
use std::path::PathBuf;

/// Arguments for the compile command.
pub struct CompileArgs {
    pub source: PathBuf,
    pub cflags: Vec<String>,
    pub ldadd: Vec<String>,
    pub color: String,
}

pub fn execute(args: CompileArgs) -> anyhow::Result<()> {
    let config = HarnessConfig::from_env()?;
    let mut toolchain = Toolchain::from_config(&config.compiler);
    toolchain.cflags.extend(args.cflags);
    toolchain.ldadd.extend(args.ldadd);

    let artifact = toolchain.compile(&args.source)?;

    let mut out = StyledOutput::new(output::resolve_color_choice(Some(&args.color)));
    out.success("Built ");
    out.plain(&artifact.display().to_string());
    out.newline();
    Ok(())
}
