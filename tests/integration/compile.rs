//! End-to-end scenarios against the public `rugo::compile` entry point,
//! named after the scenarios they cover (S1-S6).
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

use rugo::internals::BuiltinRegistry;

fn registry() -> BuiltinRegistry {
    BuiltinRegistry::new()
}

#[test]
fn s1_hello_is_a_paren_free_core_call() {
    let out = rugo::compile(Path::new("hello.rg"), "puts \"hi\"\n", &registry()).unwrap();
    assert!(out.go_source.contains("package main"));
    assert!(out.go_source.contains("rgrt.Puts(\"hi\")"));
    assert!(out.resolved.imports.iter().any(|i| i == "rgrt"));
}

#[test]
fn s2_require_with_alias_namespaces_the_call_site() {
    let dir = tempdir().unwrap();
    let mut util = std::fs::File::create(dir.path().join("util.rg")).unwrap();
    writeln!(util, "def greet()\nputs(\"hi\")\nend\n").unwrap();

    let entry_path = dir.path().join("main.rg");
    let out = rugo::compile(
        &entry_path,
        "require \"./util\" as u\nu.greet()\n",
        &registry(),
    )
    .unwrap();

    let func = out
        .resolved
        .program
        .iter()
        .find_map(|s| s.as_func_def())
        .expect("resolved program should contain the required function");
    assert_eq!(func.name, "greet");
    assert_eq!(func.namespace, "u");
    assert!(out.go_source.contains("func u_greet"));
    assert!(out.go_source.contains("u_greet()"));
}

#[test]
fn s3_duplicate_function_names_both_source_paths() {
    let dir = tempdir().unwrap();
    let a_path = dir.path().join("a.rg");
    let b_path = dir.path().join("b.rg");
    for path in [&a_path, &b_path] {
        let mut f = std::fs::File::create(path).unwrap();
        writeln!(f, "def foo()\nend\n").unwrap();
    }

    let entry_path = dir.path().join("main.rg");
    let source = "require \"./a\" as shared\nrequire \"./b\" as shared\n";
    let result = rugo::compile(&entry_path, source, &registry());

    let err = result.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("a.rg"));
    assert!(message.contains("b.rg"));
}

#[test]
fn s4_require_cycle_compiles_each_file_exactly_once() {
    let dir = tempdir().unwrap();
    let mut a = std::fs::File::create(dir.path().join("a.rg")).unwrap();
    writeln!(a, "require \"./b\" as b\ndef from_a()\nend\n").unwrap();
    let mut b = std::fs::File::create(dir.path().join("b.rg")).unwrap();
    writeln!(b, "require \"./a\" as a\ndef from_b()\nend\n").unwrap();

    let entry_path = dir.path().join("main.rg");
    let out = rugo::compile(
        &entry_path,
        "require \"./a\" as a\na.from_a()\n",
        &registry(),
    )
    .unwrap();

    let func_defs: Vec<_> = out
        .resolved
        .program
        .iter()
        .filter_map(|s| s.as_func_def())
        .collect();
    assert_eq!(func_defs.len(), 2);
    assert!(out.go_source.contains("func a_from_a"));
}

#[test]
fn s5_nested_import_reports_the_offending_line() {
    let result = rugo::compile(
        Path::new("bad.rg"),
        "def foo()\nimport os\nend\n",
        &registry(),
    );
    let err = result.unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn s6_unknown_module_lists_available_module_names() {
    let result = rugo::compile(Path::new("bad.rg"), "import nope\n", &registry());
    let err = result.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("nope"));
    assert!(message.contains("io"));
}

#[test]
fn printing_the_same_resolved_program_twice_is_byte_identical() {
    let out1 = rugo::compile(Path::new("hello.rg"), "puts \"hi\"\n", &registry()).unwrap();
    let out2 = rugo::compile(Path::new("hello.rg"), "puts \"hi\"\n", &registry()).unwrap();
    assert_eq!(out1.go_source, out2.go_source);
}
