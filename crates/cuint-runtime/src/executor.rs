//! Crash-isolated test execution.
//!
//! Each test runs in a fresh copy of the test program, selected with libtest's
//! `--exact` filter. The child recognises itself through a marker environment
//! variable and runs the test body directly; the parent only classifies how
//! the child ended:
//!
//! - exit status 0: [`TestOutcome::Passed`]
//! - killed by a configured crash signal: [`TestOutcome::Crashed`], with a
//!   backtrace of the module's shared object
//! - anything else, including a timeout: [`TestOutcome::Failed`]

use std::io::Read;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::backtrace::BacktraceExtractor;
use crate::config::HarnessConfig;
use crate::error::RuntimeError;
use crate::signal;

/// How often a running child is polled.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Identity of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    /// Test crate name, e.g. `test_cache`.
    pub module: String,
    /// Name as libtest knows it inside the crate, e.g. `tests::put_get`.
    pub full_name: String,
}

impl TestCase {
    pub fn new(module: &str, full_name: &str) -> Self {
        Self {
            module: module.to_string(),
            full_name: full_name.to_string(),
        }
    }

    /// Build from `module_path!()` and a function name. The first path
    /// segment is the crate; the rest prefixes the test name.
    pub fn from_module_path(module_path: &str, name: &str) -> Self {
        let (module, rest) = module_path.split_once("::").unwrap_or((module_path, ""));
        let full_name = if rest.is_empty() {
            name.to_string()
        } else {
            format!("{}::{}", rest, name)
        };
        Self {
            module: module.to_string(),
            full_name,
        }
    }

    /// Stem of the shared object under test: the module without `test_`.
    pub fn artifact_stem(&self) -> &str {
        self.module.strip_prefix("test_").unwrap_or(&self.module)
    }
}

/// How an isolated test ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TestOutcome {
    Passed,
    /// Non-zero exit, non-crash signal, or timeout; `output` is the child's
    /// combined stdout and stderr.
    Failed { output: String },
    /// Killed by a crash signal.
    Crashed { signal: i32, backtrace: String },
}

impl TestOutcome {
    pub fn is_passed(&self) -> bool {
        matches!(self, TestOutcome::Passed)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TestOutcome::Passed => "PASS",
            TestOutcome::Failed { .. } => "FAIL",
            TestOutcome::Crashed { .. } => "CRASH",
        }
    }
}

/// Re-invokes a test program once per test.
#[derive(Debug, Clone)]
pub struct Executor {
    program: PathBuf,
    marker: String,
    timeout: Option<Duration>,
    crash_signals: Vec<i32>,
    src_dir: PathBuf,
    extractor: BacktraceExtractor,
}

impl Executor {
    /// Executor for `program` with default settings.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::from_config(program, &HarnessConfig::default())
    }

    /// Executor for `program` configured from `config`.
    pub fn from_config(program: impl Into<PathBuf>, config: &HarnessConfig) -> Self {
        let timeout = match config.executor.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let workdir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            program: program.into(),
            marker: config.executor.marker.clone(),
            timeout,
            crash_signals: config.crash_signals(),
            src_dir: config.src_dir(),
            extractor: BacktraceExtractor {
                crash_dir: config.resolve(&config.backtrace.crash_dir),
                ..BacktraceExtractor::from_config(&config.backtrace, &workdir)
            },
        }
    }

    /// Executor re-invoking the running test binary.
    pub fn current(config: &HarnessConfig) -> Result<Self, RuntimeError> {
        Ok(Self::from_config(std::env::current_exe()?, config))
    }

    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = marker.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_crash_signals(mut self, signals: Vec<i32>) -> Self {
        self.crash_signals = signals;
        self
    }

    pub fn with_src_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.src_dir = dir.into();
        self
    }

    pub fn with_extractor(mut self, extractor: BacktraceExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Shared object a crash in `case` is attributed to.
    pub fn artifact_for(&self, case: &TestCase) -> PathBuf {
        self.src_dir.join(format!("{}.so", case.artifact_stem()))
    }

    /// Run `case` in a child process and classify how it ended.
    pub fn run(&self, case: &TestCase) -> Result<TestOutcome, RuntimeError> {
        let (mut reader, writer) = std::io::pipe()?;

        let mut command = Command::new(&self.program);
        command
            .arg(&case.full_name)
            .args(["--exact", "--nocapture", "--test-threads=1"])
            .env(&self.marker, &case.full_name)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            // grandchildren share the output pipe and are torn down with the group
            .process_group(0);

        log::debug!("spawning {} for {}", self.program.display(), case.full_name);
        let mut child = command.spawn()?;
        // the command still owns the write ends; the reader only sees EOF
        // once they are closed
        drop(command);

        let drain = thread::spawn(move || {
            let mut output = Vec::new();
            let _ = reader.read_to_end(&mut output);
            output
        });

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if let Some(limit) = self.timeout {
                if started.elapsed() >= limit {
                    log::warn!("{} timed out after {}s", case.full_name, limit.as_secs());
                    kill_group(&child);
                    child.wait()?;
                    break None;
                }
            }
            thread::sleep(POLL_INTERVAL);
        };
        // strays left behind would hold the pipe open
        kill_group(&child);

        let output = drain.join().unwrap_or_default();
        let output = String::from_utf8_lossy(&output).into_owned();

        let outcome = match status {
            None => {
                let limit = self.timeout.map(|t| t.as_secs()).unwrap_or_default();
                Self::timed_out(output, limit)
            }
            Some(status) => self.classify(case, status, output)?,
        };
        log::debug!("{}: {}", case.full_name, outcome.label());
        Ok(outcome)
    }

    fn classify(
        &self,
        case: &TestCase,
        status: ExitStatus,
        output: String,
    ) -> Result<TestOutcome, RuntimeError> {
        if status.success() {
            return Ok(TestOutcome::Passed);
        }
        match status.signal() {
            Some(sig) if self.crash_signals.contains(&sig) => {
                let artifact = self.artifact_for(case);
                log::info!(
                    "{} crashed with {}; extracting backtrace for {}",
                    case.full_name,
                    signal::name(sig),
                    artifact.display()
                );
                let backtrace = self.extractor.extract(&artifact)?;
                Ok(TestOutcome::Crashed {
                    signal: sig,
                    backtrace,
                })
            }
            _ => Ok(TestOutcome::Failed { output }),
        }
    }

    fn timed_out(mut output: String, secs: u64) -> TestOutcome {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!("timed out after {}s", secs));
        TestOutcome::Failed { output }
    }
}

/// SIGKILL every process in the child's group.
fn kill_group(child: &Child) {
    // the group id is the child's pid; ESRCH once the group is gone
    unsafe {
        libc::killpg(child.id() as libc::pid_t, libc::SIGKILL);
    }
}

/// Whether this process is a re-invoked child for `marker`.
pub fn in_child(marker: &str) -> bool {
    std::env::var_os(marker).is_some()
}

/// Run `body` as an isolated test.
///
/// In the child (marker set) the body runs directly. In the parent the test
/// is re-invoked in a child process, and a failure or crash turns into a
/// panic so libtest reports it.
pub fn isolate<F: FnOnce()>(module_path: &str, name: &str, body: F) {
    let config = match HarnessConfig::from_env() {
        Ok(config) => config,
        Err(err) => panic!("cuint: {}", err),
    };
    if in_child(&config.executor.marker) {
        body();
        return;
    }

    let case = TestCase::from_module_path(module_path, name);
    let outcome = Executor::current(&config).and_then(|executor| executor.run(&case));
    match outcome {
        Ok(TestOutcome::Passed) => {}
        Ok(TestOutcome::Failed { output }) => {
            panic!("test {} failed in isolation:\n{}", case.full_name, output)
        }
        Ok(TestOutcome::Crashed { signal: sig, backtrace }) => panic!(
            "test {} crashed with {}:\n{}",
            case.full_name,
            signal::name(sig),
            backtrace
        ),
        Err(err) => panic!("test {} could not be isolated: {}", case.full_name, err),
    }
}

/// Declare `#[test]` functions that each run in their own child process.
///
/// ```ignore
/// cuint_runtime::isolated_test! {
///     fn put_then_get() {
///         let cache = CModule::from_config("cache", &config).unwrap();
///         ...
///     }
/// }
/// ```
#[macro_export]
macro_rules! isolated_test {
    ($($(#[$meta:meta])* fn $name:ident() $body:block)*) => {
        $(
            $(#[$meta])*
            #[test]
            fn $name() {
                $crate::isolate(module_path!(), stringify!($name), || $body);
            }
        )*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_from_module_path() {
        let case = TestCase::from_module_path("test_cache", "put_get");
        assert_eq!(case.module, "test_cache");
        assert_eq!(case.full_name, "put_get");
        assert_eq!(case.artifact_stem(), "cache");

        let nested = TestCase::from_module_path("test_cache::lru::tests", "evicts");
        assert_eq!(nested.module, "test_cache");
        assert_eq!(nested.full_name, "lru::tests::evicts");
    }

    #[test]
    fn test_artifact_stem_without_prefix() {
        assert_eq!(TestCase::new("cache_tests", "x").artifact_stem(), "cache_tests");
    }

    #[test]
    fn test_artifact_for_uses_src_dir() {
        let executor = Executor::new("/bin/true").with_src_dir("/tmp/src");
        let case = TestCase::new("test_foo", "bar");
        assert_eq!(executor.artifact_for(&case), PathBuf::from("/tmp/src/foo.so"));
    }

    #[test]
    fn test_timeout_message_is_appended() {
        match Executor::timed_out("partial".to_string(), 5) {
            TestOutcome::Failed { output } => assert_eq!(output, "partial\ntimed out after 5s"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(TestOutcome::Passed.label(), "PASS");
        assert_eq!(
            TestOutcome::Failed {
                output: String::new()
            }
            .label(),
            "FAIL"
        );
        assert_eq!(
            TestOutcome::Crashed {
                signal: 11,
                backtrace: String::new()
            }
            .label(),
            "CRASH"
        );
    }
}
