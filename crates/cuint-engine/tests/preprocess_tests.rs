//! Preprocessing through the system C preprocessor.

mod common;

use cuint_engine::header::{DeclCollector, PreprocessError, Preprocessor};

#[test]
fn test_extensions_are_neutralised() {
    let dir = tempfile::tempdir().unwrap();
    let text = "__extension__ typedef struct { int a; } __attribute__((unused)) s_t;\n\
                char *copy(char *__restrict dst, const char *__restrict src);\n";
    let out = Preprocessor::default().run_source(text, dir.path()).unwrap();
    assert!(!out.contains("__attribute__"), "{}", out);
    assert!(!out.contains("__extension__"), "{}", out);
    assert!(!out.contains("__restrict"), "{}", out);
    assert!(out.contains("dst"), "{}", out);
}

#[test]
fn test_macros_are_expanded_without_line_markers() {
    let dir = tempfile::tempdir().unwrap();
    let text = "#define COUNT 3\nint values[COUNT];\n";
    let out = Preprocessor::default().run_source(text, dir.path()).unwrap();
    assert!(out.contains("int values[3];"), "{}", out);
    assert!(!out.contains("# 1"), "{}", out);
}

#[test]
fn test_relative_includes_resolve_from_header_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("inner.h"), "typedef int inner_int;\n").unwrap();
    let header = dir.path().join("outer.h");
    std::fs::write(&header, "#include \"inner.h\"\ninner_int twice(inner_int v);\n").unwrap();

    let out = Preprocessor::default().run(&header).unwrap();
    let catalog = DeclCollector::collect(&out).unwrap();
    assert!(catalog.function("twice").is_some());
}

#[test]
fn test_extra_include_directories() {
    let dir = tempfile::tempdir().unwrap();
    let include = tempfile::tempdir().unwrap();
    std::fs::write(include.path().join("extra.h"), "int extra(void);\n").unwrap();

    let out = Preprocessor::default()
        .include(include.path())
        .run_source("#include <extra.h>\n", dir.path())
        .unwrap();
    assert!(out.contains("int extra(void);"), "{}", out);
}

#[test]
fn test_failure_returns_diagnostics_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let err = Preprocessor::default()
        .run_source("#include \"does_not_exist.h\"\n", dir.path())
        .unwrap_err();
    match err {
        PreprocessError::Failed { output } => assert!(output.contains("does_not_exist.h")),
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_fixture_header_collects() {
    let out = Preprocessor::default()
        .run(&common::fixtures_dir().join("foo.h"))
        .unwrap();
    let catalog = DeclCollector::collect(&out).unwrap();
    let foo = catalog.get("foo").unwrap();
    assert_eq!(foo.fields, vec!["x", "name"]);
    assert!(catalog.get("widget").is_some());
    assert!(catalog.function("ghost__walk").is_some());
}
