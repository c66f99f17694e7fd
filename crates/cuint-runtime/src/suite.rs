//! Suite runner: lists a libtest binary's tests and runs each in isolation.
//!
//! The suite runner:
//! 1. Lists tests with `<binary> --list --format terse`
//! 2. Filters them by substring
//! 3. Runs each through the [`Executor`], collecting outcomes and timings

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use serde::Serialize;

use crate::error::RuntimeError;
use crate::executor::{Executor, TestCase, TestOutcome};

/// Tests discovered in one test binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    pub program: PathBuf,
    pub module: String,
    pub tests: Vec<String>,
}

/// Options for a suite run.
#[derive(Debug, Clone, Default)]
pub struct SuiteOptions {
    /// Only run tests whose name contains this substring.
    pub filter: Option<String>,
    /// Stop after the first test that does not pass.
    pub bail: bool,
}

/// Result of one test.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub name: String,
    #[serde(flatten)]
    pub outcome: TestOutcome,
    pub duration_ms: f64,
}

/// Result of a suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub module: String,
    pub results: Vec<TestReport>,
    pub duration_ms: f64,
}

impl SuiteReport {
    /// Number of passed tests.
    pub fn passed(&self) -> usize {
        self.count(|outcome| matches!(outcome, TestOutcome::Passed))
    }

    /// Number of failed tests (not counting crashes).
    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, TestOutcome::Failed { .. }))
    }

    /// Number of crashed tests.
    pub fn crashed(&self) -> usize {
        self.count(|outcome| matches!(outcome, TestOutcome::Crashed { .. }))
    }

    /// Total number of tests that ran.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Whether any test failed or crashed.
    pub fn has_failures(&self) -> bool {
        self.passed() != self.total()
    }

    fn count(&self, pred: impl Fn(&TestOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

impl TestSuite {
    /// List the tests in `program`.
    pub fn discover(program: &Path) -> Result<Self, RuntimeError> {
        let output = Command::new(program)
            .args(["--list", "--format", "terse"])
            .output()?;
        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(RuntimeError::Command {
                command: format!("{} --list --format terse", program.display()),
                status: output.status.to_string(),
                output: text,
            });
        }

        let tests = parse_terse_list(&String::from_utf8_lossy(&output.stdout));
        log::debug!("{}: {} test(s)", program.display(), tests.len());
        Ok(Self {
            program: program.to_path_buf(),
            module: module_name(program),
            tests,
        })
    }

    /// Test cases selected by `filter`.
    pub fn cases(&self, filter: Option<&str>) -> Vec<TestCase> {
        self.tests
            .iter()
            .filter(|name| filter.is_none_or(|pattern| name.contains(pattern)))
            .map(|name| TestCase::new(&self.module, name))
            .collect()
    }

    /// Run the selected tests, calling `on_result` after each one.
    pub fn run(
        &self,
        executor: &Executor,
        options: &SuiteOptions,
        mut on_result: impl FnMut(&TestReport),
    ) -> Result<SuiteReport, RuntimeError> {
        let started = Instant::now();
        let mut results = Vec::new();

        for case in self.cases(options.filter.as_deref()) {
            let test_started = Instant::now();
            let outcome = executor.run(&case)?;
            let report = TestReport {
                name: case.full_name,
                outcome,
                duration_ms: test_started.elapsed().as_secs_f64() * 1000.0,
            };
            on_result(&report);
            let stop = options.bail && !report.outcome.is_passed();
            results.push(report);
            if stop {
                break;
            }
        }

        Ok(SuiteReport {
            module: self.module.clone(),
            results,
            duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

/// Test names from `--list --format terse` output (`name: test` lines).
pub fn parse_terse_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| line.strip_suffix(": test"))
        .map(str::to_string)
        .collect()
}

/// Module name of a test binary: its file stem without cargo's `-<hash>`.
pub fn module_name(program: &Path) -> String {
    let stem = program
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.rsplit_once('-') {
        Some((name, hash))
            if !name.is_empty() && hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit()) =>
        {
            name.to_string()
        }
        _ => stem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_terse_list() {
        let listing = "tests::a: test\nb: test\nbench_x: bench\n\n";
        assert_eq!(parse_terse_list(listing), vec!["tests::a", "b"]);
    }

    #[test]
    fn test_module_name_strips_cargo_hash() {
        assert_eq!(
            module_name(Path::new("target/debug/deps/test_cache-0123456789abcdef")),
            "test_cache"
        );
        assert_eq!(module_name(Path::new("/bin/test-runner")), "test-runner");
        assert_eq!(module_name(Path::new("plain")), "plain");
    }

    #[test]
    fn test_cases_filter() {
        let suite = TestSuite {
            program: PathBuf::from("x"),
            module: "test_x".to_string(),
            tests: vec!["alpha".to_string(), "beta".to_string()],
        };
        assert_eq!(suite.cases(None).len(), 2);
        let filtered = suite.cases(Some("et"));
        assert_eq!(filtered, vec![TestCase::new("test_x", "beta")]);
    }

    #[test]
    fn test_report_counts() {
        let report = SuiteReport {
            module: "m".to_string(),
            results: vec![
                TestReport {
                    name: "a".into(),
                    outcome: TestOutcome::Passed,
                    duration_ms: 1.0,
                },
                TestReport {
                    name: "b".into(),
                    outcome: TestOutcome::Crashed {
                        signal: 11,
                        backtrace: String::new(),
                    },
                    duration_ms: 1.0,
                },
            ],
            duration_ms: 2.0,
        };
        assert_eq!(report.passed(), 1);
        assert_eq!(report.crashed(), 1);
        assert_eq!(report.failed(), 0);
        assert!(report.has_failures());
    }
}
