//! End-to-end binding against a compiled fixture.

mod common;

use cuint_engine::{
    args, Args, BindError, BindingModule, CallError, DeclCollector, Library, Preprocessor, Value,
};

fn bind_foo(dir: &tempfile::TempDir) -> BindingModule {
    let (header, library) = common::build_fixture(dir.path(), "foo");
    BindingModule::from_header("foo", &header, &library, &Preprocessor::default()).unwrap()
}

#[test]
fn test_types_are_named_from_keys() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);
    let foo = module.ty("Foo").unwrap();
    assert_eq!(foo.key(), "foo");
    assert_eq!(foo.fields(), ["x", "name"]);
    assert!(module.ty("foo").is_some());
    assert!(module.ty("Widget").is_some());
}

#[test]
fn test_constructor_and_methods() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);
    let foo = module.new_instance("Foo", args![3, "three"]).unwrap();

    assert_eq!(foo.call("bar", args![5]).unwrap(), Value::Int(15));
    assert_eq!(foo.call("name", args![]).unwrap(), Value::from("three"));
    assert_eq!(
        foo.call("sum", Args::new().kwarg("b", 1).kwarg("a", 10)).unwrap(),
        Value::Int(12)
    );
}

#[test]
fn test_missing_method_symbol_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);
    let ty = module.ty("Foo").unwrap();
    assert!(ty.method("ghost").is_none());
    let names: Vec<_> = ty.method_names().collect();
    assert_eq!(names, vec!["bar", "name", "sum", "destroy"]);
}

#[test]
fn test_free_functions() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);

    assert_eq!(module.call("hello", args![]).unwrap(), Value::from("Hello, world!"));
    assert_eq!(module.call("add", args![2, 40]).unwrap(), Value::Int(42));
    assert_eq!(module.call("negative", args![]).unwrap(), Value::Int(-5));
    assert_eq!(
        module.call("big", args![1i64 << 40]).unwrap(),
        Value::Int(1i64 << 42)
    );
    assert_eq!(module.call("maybe_null", args![0]).unwrap(), Value::Null);
    assert_eq!(module.call("maybe_null", args![1]).unwrap(), Value::from("here"));
    // owner key with no type: bound as a plain function
    assert_eq!(module.call("ghost__walk", args![1]).unwrap(), Value::Int(2));
    assert!(module.function("missing_symbol").is_none());
}

#[test]
fn test_call_errors_happen_before_native_code() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);

    let arity = module.call("add", args![1]).unwrap_err();
    assert!(matches!(arity, CallError::Arity { got: 1, .. }));

    let usage = module.call("add", Args::new().arg(1).kwarg("b", 2)).unwrap_err();
    assert!(matches!(usage, CallError::Usage { .. }));

    let unknown = module.call("nope", args![]).unwrap_err();
    assert!(matches!(unknown, CallError::Unknown { .. }));
}

#[test]
fn test_rejected_calls_never_reach_a_faulting_symbol() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);

    // `fault` dereferences NULL; reaching it would kill this process
    let too_few = module.call("fault", args![]).unwrap_err();
    assert!(matches!(too_few, CallError::Arity { got: 0, .. }));
    let too_many = module.call("fault", args![1, 2]).unwrap_err();
    assert!(matches!(too_many, CallError::Arity { got: 2, .. }));
    let unknown = module
        .call("fault", Args::new().kwarg("signal", 11))
        .unwrap_err();
    assert!(matches!(unknown, CallError::Usage { .. }));
}

#[test]
fn test_null_constructor_result() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);
    let err = module.new_instance("Foo", args![-1, "neg"]).unwrap_err();
    assert_eq!(
        err,
        CallError::NullInstance {
            type_name: "Foo".to_string()
        }
    );
}

#[test]
fn test_drop_releases_once() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);
    let destroyed = || module.call("count_destroyed", args![]).unwrap();

    let before = destroyed();
    {
        let _foo = module.new_instance("Foo", args![1, "a"]).unwrap();
    }
    assert_eq!(destroyed(), Value::Int(before.as_int().unwrap() + 1));

    let foo = module.new_instance("Foo", args![1, "b"]).unwrap();
    assert!(foo.release().unwrap());
    assert!(foo.is_released());
    drop(foo);
    assert_eq!(destroyed(), Value::Int(before.as_int().unwrap() + 2));
}

#[test]
fn test_explicit_destroy_marks_released() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);
    let foo = module.new_instance("Foo", args![1, "c"]).unwrap();
    foo.call("destroy", args![]).unwrap();
    assert!(foo.is_released());
    let err = foo.call("bar", args![1]).unwrap_err();
    assert!(matches!(err, CallError::Released { .. }));
}

#[test]
fn test_destructor_with_extra_arguments_is_not_automatic() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);
    let widget = module.new_instance("Widget", args![]).unwrap();
    assert!(!widget.runtime_type().auto_release());
    assert_eq!(widget.call("poke", args![]).unwrap(), Value::Int(1));
    assert!(!widget.release().unwrap());
    assert!(!widget.is_released());
    widget.call("destroy", args![0]).unwrap();
    assert!(widget.is_released());
}

#[test]
fn test_instances_pass_as_handles() {
    let dir = tempfile::tempdir().unwrap();
    let module = bind_foo(&dir);
    let foo = module.new_instance("Foo", args![7, "h"]).unwrap();
    let bar = module.ty("Foo").unwrap().method("bar").unwrap();
    assert_eq!(
        bar.call(&args![foo.handle(), 2]).unwrap(),
        Value::Int(14)
    );
}

#[test]
fn test_missing_constructor_symbol_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (_, library) = common::build_fixture(dir.path(), "foo");
    let catalog =
        DeclCollector::collect("typedef struct { int a; } gone_t; gone_t *gone_new(void);")
            .unwrap();
    let err = BindingModule::synthesize("gone", &catalog, Library::open(&library).unwrap())
        .unwrap_err();
    match err {
        BindError::Symbol { symbol, .. } => assert_eq!(symbol, "gone_new"),
        other => panic!("expected Symbol error, got {:?}", other),
    }
}

#[test]
fn test_bad_header_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let (_, library) = common::build_fixture(dir.path(), "foo");
    let header = dir.path().join("broken.h");
    std::fs::write(&header, "int fine(void);\nmystery_t broken(void);\n").unwrap();
    let err = BindingModule::from_header("broken", &header, &library, &Preprocessor::default())
        .unwrap_err();
    assert!(matches!(err, BindError::Parse(_)));
}
