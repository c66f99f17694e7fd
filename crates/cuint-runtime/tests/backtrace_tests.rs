//! Backtrace extraction with stand-in debugger and unpacker scripts.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use cuint_runtime::{BacktraceExtractor, RuntimeError, NO_CORE_DUMP};

fn script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

struct Setup {
    _tools: tempfile::TempDir,
    workdir: tempfile::TempDir,
    crash_dir: tempfile::TempDir,
    extractor: BacktraceExtractor,
}

fn setup(debugger_body: &str) -> Setup {
    let tools = tempfile::tempdir().unwrap();
    let workdir = tempfile::tempdir().unwrap();
    let crash_dir = tempfile::tempdir().unwrap();
    let debugger = script(tools.path(), "gdb", debugger_body);
    // apport-unpack <report> <target>: create <target>/CoreDump
    let unpacker = script(
        tools.path(),
        "apport-unpack",
        "mkdir -p \"$2\" && echo core > \"$2/CoreDump\"",
    );
    let extractor = BacktraceExtractor {
        workdir: workdir.path().to_path_buf(),
        crash_dir: crash_dir.path().to_path_buf(),
        debugger,
        unpacker,
    };
    Setup {
        _tools: tools,
        workdir,
        crash_dir,
        extractor,
    }
}

#[test]
fn test_no_core_and_no_reports() {
    let setup = setup("echo unused");
    let text = setup.extractor.extract(Path::new("foo.so")).unwrap();
    assert_eq!(text, NO_CORE_DUMP);
}

#[test]
fn test_missing_crash_dir() {
    let mut setup = setup("echo unused");
    setup.extractor.crash_dir = PathBuf::from("/nonexistent/cuint/crash");
    assert_eq!(setup.extractor.extract(Path::new("foo.so")).unwrap(), NO_CORE_DUMP);
}

#[test]
fn test_core_file_in_workdir() {
    let setup = setup("echo \"$@\"");
    std::fs::write(setup.workdir.path().join("core"), "core").unwrap();

    let text = setup.extractor.extract(Path::new("foo.so")).unwrap();
    assert!(text.contains("-q -batch -ex bt full -ex q foo.so"), "{}", text);
    assert!(text.trim_end().ends_with("/core"), "{}", text);
}

#[test]
fn test_newest_crash_report_is_unpacked_and_removed() {
    let setup = setup("echo \"bt for $7 using $8\"");
    let old = setup.crash_dir.path().join("_usr_bin_old.1000.crash");
    let new = setup.crash_dir.path().join("_usr_bin_new.1000.crash");
    std::fs::write(&old, "old").unwrap();
    let earlier = std::time::SystemTime::now() - std::time::Duration::from_secs(60);
    std::fs::File::options()
        .write(true)
        .open(&old)
        .unwrap()
        .set_modified(earlier)
        .unwrap();
    std::fs::write(&new, "new").unwrap();

    let text = setup.extractor.extract(Path::new("foo.so")).unwrap();
    let unpacked = setup.workdir.path().join("_usr_bin_new.1000");
    assert!(text.contains("foo.so"), "{}", text);
    assert!(
        text.contains(&unpacked.join("CoreDump").to_string_lossy().into_owned()),
        "{}",
        text
    );
    assert!(!new.exists());
    assert!(old.exists());
    assert!(!unpacked.exists());
}

#[test]
fn test_debugger_failure_is_an_error() {
    let setup = setup("echo broken >&2; exit 3");
    std::fs::write(setup.workdir.path().join("core"), "core").unwrap();

    match setup.extractor.extract(Path::new("foo.so")) {
        Err(RuntimeError::Command { output, .. }) => assert!(output.contains("broken")),
        other => panic!("expected Command error, got {:?}", other),
    }
}

#[test]
fn test_unpacker_failure_is_an_error() {
    let mut setup = setup("echo unused");
    setup.extractor.unpacker = script(setup.workdir.path(), "bad-unpack", "exit 1");
    std::fs::write(setup.crash_dir.path().join("x.crash"), "x").unwrap();

    let result = setup.extractor.extract(Path::new("foo.so"));
    assert!(matches!(result, Err(RuntimeError::Command { .. })));
}
