//! Post-mortem backtraces for crashed tests.
//!
//! Looks for a core file in the working directory first, then for the most
//! recent crash report in the crash directory. Reports are unpacked, fed to
//! the debugger, and deleted afterwards.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use crate::config::BacktraceConfig;
use crate::error::RuntimeError;

/// Returned when neither a core file nor a crash report exists.
pub const NO_CORE_DUMP: &str = "No core dump available.";

/// Extracts a backtrace for a crashed artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacktraceExtractor {
    pub workdir: PathBuf,
    pub crash_dir: PathBuf,
    pub debugger: String,
    pub unpacker: String,
}

impl Default for BacktraceExtractor {
    fn default() -> Self {
        Self::from_config(&BacktraceConfig::default(), Path::new("."))
    }
}

impl BacktraceExtractor {
    pub fn from_config(config: &BacktraceConfig, workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
            crash_dir: config.crash_dir.clone(),
            debugger: config.debugger.clone(),
            unpacker: config.unpacker.clone(),
        }
    }

    /// Backtrace text for `artifact`, or [`NO_CORE_DUMP`].
    pub fn extract(&self, artifact: &Path) -> Result<String, RuntimeError> {
        let core = self.workdir.join("core");
        if core.is_file() {
            log::info!("reading backtrace from {}", core.display());
            return self.debug(artifact, &core);
        }

        let Some(report) = self.latest_report() else {
            return Ok(NO_CORE_DUMP.to_string());
        };
        log::info!("reading backtrace from crash report {}", report.display());

        let stem = report
            .file_stem()
            .map(|stem| stem.to_os_string())
            .unwrap_or_else(|| "crash".into());
        let unpacked = self.workdir.join(stem);
        run(Command::new(&self.unpacker).arg(&report).arg(&unpacked))?;

        let result = self.debug(artifact, &unpacked.join("CoreDump"));

        if let Err(err) = std::fs::remove_dir_all(&unpacked) {
            log::warn!("could not remove {}: {}", unpacked.display(), err);
        }
        if let Err(err) = std::fs::remove_file(&report) {
            log::warn!("could not remove {}: {}", report.display(), err);
        }
        result
    }

    fn debug(&self, artifact: &Path, core: &Path) -> Result<String, RuntimeError> {
        run(Command::new(&self.debugger)
            .args(["-q", "-batch", "-ex", "bt full", "-ex", "q"])
            .arg(artifact)
            .arg(core))
    }

    /// Most recently modified `*.crash` file in the crash directory.
    fn latest_report(&self) -> Option<PathBuf> {
        if !self.crash_dir.is_dir() {
            return None;
        }
        let pattern = self.crash_dir.join("*.crash");
        let entries = glob::glob(&pattern.to_string_lossy()).ok()?;

        entries
            .filter_map(Result::ok)
            .filter_map(|path| {
                let modified = path.metadata().and_then(|m| m.modified()).ok()?;
                Some((modified, path))
            })
            .max_by_key(|(modified, _): &(SystemTime, PathBuf)| *modified)
            .map(|(_, path)| path)
    }
}

/// Run `command`, returning combined stdout and stderr.
fn run(command: &mut Command) -> Result<String, RuntimeError> {
    log::debug!("running {:?}", command);
    let output = command.output()?;
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(RuntimeError::Command {
            command: format!("{:?}", command),
            status: output.status.to_string(),
            output: text,
        });
    }
    Ok(text)
}
