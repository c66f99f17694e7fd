//! Executor and suite runner tests.
//!
//! The `helper_*` tests do nothing in a normal run. When re-invoked by an
//! executor with `MARKER` set they pass, fail, crash, or hang on purpose.

use std::process::Command;
use std::time::{Duration, Instant};

use cuint_runtime::{
    BacktraceExtractor, Executor, HarnessConfig, SuiteOptions, TestCase, TestOutcome, TestSuite,
    NO_CORE_DUMP,
};

const MARKER: &str = "CUINT_EXECUTOR_TEST";

fn in_helper() -> bool {
    std::env::var_os(MARKER).is_some()
}

#[test]
fn helper_passes() {
    if !in_helper() {
        return;
    }
    println!("all good");
}

#[test]
fn helper_fails() {
    if !in_helper() {
        return;
    }
    println!("about to fail");
    panic!("deliberate failure");
}

#[test]
fn helper_crashes() {
    if !in_helper() {
        return;
    }
    unsafe {
        let limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        libc::setrlimit(libc::RLIMIT_CORE, &limit);
        // std's stack overflow handler would otherwise see this first
        libc::signal(libc::SIGSEGV, libc::SIG_DFL);
        libc::raise(libc::SIGSEGV);
    }
}

#[test]
fn helper_aborts() {
    if !in_helper() {
        return;
    }
    std::process::abort();
}

#[test]
fn helper_hangs() {
    if !in_helper() {
        return;
    }
    std::thread::sleep(Duration::from_secs(30));
}

#[test]
fn helper_forks_and_hangs() {
    if !in_helper() {
        return;
    }
    // inherits the output pipe
    Command::new("sleep").arg("30").spawn().unwrap();
    std::thread::sleep(Duration::from_secs(30));
}

#[test]
fn helper_leaves_a_stray() {
    if !in_helper() {
        return;
    }
    Command::new("sleep").arg("30").spawn().unwrap();
    println!("stray started");
}

fn executor(scratch: &tempfile::TempDir) -> Executor {
    let extractor = BacktraceExtractor {
        workdir: scratch.path().to_path_buf(),
        crash_dir: scratch.path().join("no-reports"),
        ..BacktraceExtractor::default()
    };
    Executor::current(&HarnessConfig::default())
        .unwrap()
        .with_marker(MARKER)
        .with_src_dir(scratch.path())
        .with_extractor(extractor)
}

fn case(name: &str) -> TestCase {
    TestCase::new("executor_tests", name)
}

#[test]
fn test_passing_child() {
    let scratch = tempfile::tempdir().unwrap();
    let outcome = executor(&scratch).run(&case("helper_passes")).unwrap();
    assert_eq!(outcome, TestOutcome::Passed);
}

#[test]
fn test_failing_child_keeps_output() {
    let scratch = tempfile::tempdir().unwrap();
    match executor(&scratch).run(&case("helper_fails")).unwrap() {
        TestOutcome::Failed { output } => {
            assert!(output.contains("about to fail"), "{}", output);
            assert!(output.contains("deliberate failure"), "{}", output);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_crashing_child_is_not_a_failure() {
    let scratch = tempfile::tempdir().unwrap();
    match executor(&scratch).run(&case("helper_crashes")).unwrap() {
        TestOutcome::Crashed { signal, backtrace } => {
            assert_eq!(signal, libc::SIGSEGV);
            assert_eq!(backtrace, NO_CORE_DUMP);
        }
        other => panic!("expected Crashed, got {:?}", other),
    }
}

#[test]
fn test_other_signals_are_failures() {
    let scratch = tempfile::tempdir().unwrap();
    let outcome = executor(&scratch).run(&case("helper_aborts")).unwrap();
    assert!(matches!(outcome, TestOutcome::Failed { .. }), "{:?}", outcome);

    let widened = executor(&scratch)
        .with_crash_signals(vec![libc::SIGSEGV, libc::SIGABRT])
        .run(&case("helper_aborts"))
        .unwrap();
    assert!(matches!(widened, TestOutcome::Crashed { signal, .. } if signal == libc::SIGABRT));
}

#[test]
fn test_timeout_kills_child() {
    let scratch = tempfile::tempdir().unwrap();
    let outcome = executor(&scratch)
        .with_timeout(Some(Duration::from_secs(1)))
        .run(&case("helper_hangs"))
        .unwrap();
    match outcome {
        TestOutcome::Failed { output } => assert!(output.ends_with("timed out after 1s"), "{}", output),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_timeout_kills_grandchildren_holding_the_pipe() {
    let scratch = tempfile::tempdir().unwrap();
    let started = Instant::now();
    let outcome = executor(&scratch)
        .with_timeout(Some(Duration::from_secs(1)))
        .run(&case("helper_forks_and_hangs"))
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(15), "{:?}", started.elapsed());
    assert!(matches!(outcome, TestOutcome::Failed { .. }), "{:?}", outcome);
}

#[test]
fn test_stray_grandchild_does_not_block_a_pass() {
    let scratch = tempfile::tempdir().unwrap();
    let started = Instant::now();
    let outcome = executor(&scratch).run(&case("helper_leaves_a_stray")).unwrap();
    assert!(started.elapsed() < Duration::from_secs(15), "{:?}", started.elapsed());
    assert_eq!(outcome, TestOutcome::Passed);
}

#[test]
fn test_suite_discovers_and_runs_helpers() {
    let scratch = tempfile::tempdir().unwrap();
    let program = std::env::current_exe().unwrap();
    let suite = TestSuite::discover(&program).unwrap();
    assert_eq!(suite.module, "executor_tests");
    assert!(suite.tests.iter().any(|name| name == "helper_passes"));

    let options = SuiteOptions {
        filter: Some("helper_passes".to_string()),
        bail: false,
    };
    let mut seen = Vec::new();
    let report = suite
        .run(&executor(&scratch), &options, |r| seen.push(r.name.clone()))
        .unwrap();
    assert_eq!(seen, vec!["helper_passes"]);
    assert_eq!(report.passed(), 1);
    assert!(!report.has_failures());
}

#[test]
fn test_suite_bails_on_first_failure() {
    let scratch = tempfile::tempdir().unwrap();
    let suite = TestSuite::discover(&std::env::current_exe().unwrap()).unwrap();
    let options = SuiteOptions {
        filter: Some("helper_".to_string()),
        bail: true,
    };
    let report = suite
        .run(
            &executor(&scratch).with_timeout(Some(Duration::from_secs(5))),
            &options,
            |_| {},
        )
        .unwrap();
    // libtest lists tests alphabetically: helper_aborts fails first
    assert_eq!(report.total(), 1);
    assert_eq!(report.failed(), 1);
}
