//! `cuint bt` - backtrace of the last crash.

use cuint_runtime::{BacktraceExtractor, HarnessConfig};
use std::path::PathBuf;

/// Arguments for the bt command.
pub struct BtArgs {
    pub artifact: PathBuf,
    pub workdir: Option<PathBuf>,
}

pub fn execute(args: BtArgs) -> anyhow::Result<()> {
    let config = HarnessConfig::from_env()?;
    let workdir = match args.workdir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let extractor = BacktraceExtractor {
        crash_dir: config.resolve(&config.backtrace.crash_dir),
        ..BacktraceExtractor::from_config(&config.backtrace, &workdir)
    };
    println!("{}", extractor.extract(&args.artifact)?.trim_end());
    Ok(())
}
