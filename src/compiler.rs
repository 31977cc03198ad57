//! Top-level orchestration: wires the seven pipeline stages together and
//! owns nothing across calls — every mutable bit of state lives in the
//! `CompilerState` a single call to [`resolve::resolve`] creates and
//! discards.
use crate::ast::Program;
use crate::build_descriptor;
use crate::emit::{self, EmitFile};
use crate::error::Error;
use crate::lower::lower_program;
use crate::parser::parse as parse_raw;
use crate::preprocess::{preprocess, scan_function_names, strip_comments};
use crate::resolve::{self, ResolvedProgram};
use crate::stdlib::ModuleRegistry;
use std::path::Path;

pub struct CompileOutput {
    pub go_source: String,
    pub build_descriptor: String,
    pub resolved: ResolvedProgram,
}

/// Runs steps 4.1-4.4 (comment stripping through AST lowering) over one
/// buffer, without following `require`s. Used both as the first stage of a
/// full compile and standalone for the CLI's `--dump-format ast`. The known-
/// function set the preprocessor rewrites paren-free calls against is
/// stdlib core functions plus this buffer's own `def`s.
pub fn parse_entry(source: &str, registry: &dyn ModuleRegistry) -> Result<Program, Error> {
    let cleaned = strip_comments(source)?;
    let mut known = scan_function_names(&cleaned);
    known.extend(registry.core_function_names().into_iter().map(str::to_string));
    let (preprocessed, line_map) = preprocess(&cleaned, &known);
    let raw = parse_raw(&preprocessed)?;
    lower_program(&raw, &line_map, &preprocessed)
}

/// Steps 4.1-4.5: parse the entry buffer and resolve its `require`s against
/// the filesystem. `entry_path` anchors relative requires and line
/// directives; it doesn't need to exist if `source` has no requires (e.g.
/// piped from stdin).
pub fn resolve_entry(
    entry_path: &Path,
    source: &str,
    registry: &dyn ModuleRegistry,
) -> Result<ResolvedProgram, anyhow::Error> {
    let program = parse_entry(source, registry)?;
    resolve::resolve(program, entry_path, registry)
}

/// The full pipeline: parse, resolve, build the emit tree, print it, and
/// render the build-descriptor sidecar.
pub fn compile(
    entry_path: &Path,
    source: &str,
    registry: &dyn ModuleRegistry,
) -> Result<CompileOutput, anyhow::Error> {
    let resolved = resolve_entry(entry_path, source, registry)?;
    let file: EmitFile = emit::build(&resolved, entry_path, registry);
    let go_source = emit::print(&file);
    let deps = registry.collect_toolchain_deps(&resolved.imports);
    let build_descriptor = build_descriptor::render(&deps);
    Ok(CompileOutput {
        go_source,
        build_descriptor,
        resolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinOp, Expression};
    use crate::stdlib::BuiltinRegistry;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn s1_hello_world_end_to_end() {
        let registry = BuiltinRegistry::new();
        let out = compile(
            Path::new("hello.rg"),
            "puts \"hello\"\n",
            &registry,
        )
        .unwrap();
        assert!(out.go_source.contains("package main"));
        assert!(out.go_source.contains("rgrt.Puts(\"hello\")"));
    }

    #[test]
    fn s2_require_with_alias_resolves_and_emits_namespaced_call() {
        let dir = tempdir().unwrap();
        let mut util = std::fs::File::create(dir.path().join("util.rg")).unwrap();
        writeln!(util, "def greet()\nputs(\"hi\")\nend\n").unwrap();

        let registry = BuiltinRegistry::new();
        let entry_path = dir.path().join("main.rg");
        let out = compile(
            &entry_path,
            "require \"./util\" as u\nu.greet()\n",
            &registry,
        )
        .unwrap();

        assert!(out.go_source.contains("func u_greet"));
        assert!(out.go_source.contains("u_greet()"));
    }

    #[test]
    fn s5_nested_import_is_a_placement_error() {
        let registry = BuiltinRegistry::new();
        let result = compile(
            Path::new("bad.rg"),
            "def foo()\nimport os\nend\n",
            &registry,
        );
        assert!(result.is_err());
    }

    #[test]
    fn expression_precedence_survives_the_whole_pipeline() {
        let registry = BuiltinRegistry::new();
        let out = compile(Path::new("math.rg"), "x = 1 + 2 * 3\n", &registry).unwrap();
        let assign = out
            .resolved
            .program
            .iter()
            .find_map(|s| s.as_assign())
            .unwrap();
        match &assign.value {
            Expression::Binary(b) => assert_eq!(b.op, BinOp::Add),
            other => panic!("expected a binary add, got {other:?}"),
        }
        assert!(out.go_source.contains("1 + 2 * 3"));
    }
}
