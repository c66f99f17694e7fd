//! `cuint test` - run a test binary one isolated process per test.

use crate::output::{self, StyledOutput};
use cuint_runtime::{Executor, HarnessConfig, SuiteOptions, SuiteReport, TestOutcome, TestReport, TestSuite};
use std::path::PathBuf;
use std::time::Duration;
use termcolor::Color;

/// Arguments for the test command.
pub struct TestArgs {
    pub binary: PathBuf,
    pub filter: Option<String>,
    pub bail: bool,
    pub timeout: Option<u64>,
    pub reporter: String,
    pub color: String,
}

pub fn execute(args: TestArgs) -> anyhow::Result<()> {
    let color_choice = output::resolve_color_choice(Some(&args.color));
    let mut out = StyledOutput::new(color_choice);

    let config = HarnessConfig::from_env()?;
    let mut executor = Executor::from_config(&args.binary, &config);
    if let Some(secs) = args.timeout {
        executor = executor.with_timeout((secs > 0).then(|| Duration::from_secs(secs)));
    }

    let suite = TestSuite::discover(&args.binary)?;
    let json = args.reporter == "json";

    if suite.tests.is_empty() {
        if !json {
            out.warning("No tests found.");
            out.newline();
        }
        return Ok(());
    }

    if !json {
        out.newline();
        out.bold(&suite.module);
        out.dim(&format!(" ({})", args.binary.display()));
        out.newline();
    }

    let options = SuiteOptions {
        filter: args.filter,
        bail: args.bail,
    };
    let report = suite.run(&executor, &options, |result| {
        if json {
            print_json_result(&suite.module, result);
        } else {
            print_default_result(&mut out, result);
        }
    })?;

    if json {
        print_json_summary(&report);
    } else {
        print_failure_details(&mut out, &report);
        print_summary(&mut out, &report);
    }
    out.flush();

    if report.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}

// ── Default Reporter ─────────────────────────────────────────────────────

fn print_default_result(out: &mut StyledOutput, result: &TestReport) {
    out.plain("  ");
    match result.outcome {
        TestOutcome::Passed => out.pass_badge(),
        TestOutcome::Failed { .. } => out.fail_badge(),
        TestOutcome::Crashed { .. } => out.crash_badge(),
    }
    out.plain(&format!(" {}", result.name));
    out.dim(&format!(" ({:.0}ms)", result.duration_ms));
    out.newline();
    out.flush();
}

// ── JSON Reporter ────────────────────────────────────────────────────────

fn print_json_result(module: &str, result: &TestReport) {
    let mut value = serde_json::to_value(result).unwrap_or_default();
    if let Some(object) = value.as_object_mut() {
        object.insert("module".to_string(), module.into());
    }
    println!("{}", value);
}

fn print_json_summary(report: &SuiteReport) {
    let summary = serde_json::json!({
        "summary": true,
        "module": report.module,
        "total": report.total(),
        "passed": report.passed(),
        "failed": report.failed(),
        "crashed": report.crashed(),
        "duration_ms": report.duration_ms,
    });
    println!("{}", summary);
}

// ── Failure Details ──────────────────────────────────────────────────────

fn print_failure_details(out: &mut StyledOutput, report: &SuiteReport) {
    let mut header_printed = false;

    for result in &report.results {
        let (text, color) = match &result.outcome {
            TestOutcome::Passed => continue,
            TestOutcome::Failed { output } => (output.as_str(), Color::Red),
            TestOutcome::Crashed { backtrace, .. } => (backtrace.as_str(), Color::Magenta),
        };

        if !header_printed {
            header_printed = true;
            out.newline();
            out.dim("──────────────────────────────────────────");
            out.newline();
            out.newline();
        }

        out.write_styled("  ● ", Some(color), true);
        out.write_styled(&result.name, Some(color), true);
        if let TestOutcome::Crashed { signal, .. } = result.outcome {
            out.dim(&format!(" (signal {})", signal));
        }
        out.newline();
        out.newline();
        for line in text.lines() {
            out.plain("    ");
            out.plain(line);
            out.newline();
        }
        out.newline();
    }
}

// ── Summary ──────────────────────────────────────────────────────────────

fn print_summary(out: &mut StyledOutput, report: &SuiteReport) {
    out.newline();
    out.dim("──────────────────────────────────────────");
    out.newline();

    out.bold("Tests:  ");
    if report.crashed() > 0 {
        out.crash(&format!("{} crashed", report.crashed()));
        out.plain(", ");
    }
    if report.failed() > 0 {
        out.error(&format!("{} failed", report.failed()));
        out.plain(", ");
    }
    if report.passed() > 0 {
        out.success(&format!("{} passed", report.passed()));
        out.plain(", ");
    }
    out.bold(&format!("{} total", report.total()));
    out.newline();

    out.bold("Time:   ");
    out.dim(&format!("{:.2}s", report.duration_ms / 1000.0));
    out.newline();
}
