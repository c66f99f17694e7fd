//! Shared helpers: build C fixtures into a scratch directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// Copy `<stem>.h` and `<stem>.c` into `dir` and compile `<stem>.so` there.
/// Returns the header and shared object paths.
pub fn build_fixture(dir: &Path, stem: &str) -> (PathBuf, PathBuf) {
    let header = dir.join(format!("{}.h", stem));
    let source = dir.join(format!("{}.c", stem));
    let library = dir.join(format!("{}.so", stem));
    std::fs::copy(fixtures_dir().join(format!("{}.h", stem)), &header).unwrap();
    std::fs::copy(fixtures_dir().join(format!("{}.c", stem)), &source).unwrap();

    let output = Command::new("gcc")
        .args(["-shared", "-fPIC", "-o"])
        .arg(&library)
        .arg(&source)
        .output()
        .expect("gcc must be installed to build fixtures");
    assert!(
        output.status.success(),
        "fixture build failed:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    (header, library)
}
