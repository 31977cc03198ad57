//! The Require Resolver — the algorithmic heart of the front-end. A visitor
//! walks the tree once to check placement, then a single ownership-taking
//! pass replaces `require`s with their resolved expansion, `filter_map`-style.
mod state;

pub use state::CompilerState;

use crate::ast::*;
use crate::ast_fold::{walk_statement, Visitor};
use crate::error::Error;
use crate::lower::lower_program;
use crate::parser::parse as parse_raw;
use crate::preprocess::{preprocess, scan_function_names, strip_comments};
use crate::stdlib::ModuleRegistry;
use std::path::{Path, PathBuf};

/// The flattened program plus the stdlib imports it ended up pulling in, in
/// first-seen order — the emit builder and build-descriptor writer both need
/// that list.
pub struct ResolvedProgram {
    pub program: Program,
    pub imports: Vec<String>,
}

pub fn resolve(
    program: Program,
    entry_path: &Path,
    registry: &dyn ModuleRegistry,
) -> Result<ResolvedProgram, anyhow::Error> {
    let base_dir = entry_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut state = CompilerState::new(base_dir);

    if let Ok(canonical) = entry_path.canonicalize() {
        state.loaded.insert(canonical);
    }

    let flat = resolve_program(program, entry_path, &mut state, registry, true)?;
    Ok(ResolvedProgram {
        program: flat,
        imports: state.imports().to_vec(),
    })
}

/// `is_entry` is true only for the outermost call (the entry file itself);
/// it's false for a required file's own recursive resolution, since that
/// file's `FuncDef`s still have their `namespace` reassigned by the caller in
/// `resolve_require` afterwards — checking `ns_funcs` here, before that
/// reassignment, would compare two required files' functions as if they both
/// still shared the same (empty) namespace. Entry-level `FuncDef`s never get
/// reassigned, so this is the right (and only) place to catch duplicates
/// among them.
fn resolve_program(
    program: Program,
    current_path: &Path,
    state: &mut CompilerState,
    registry: &dyn ModuleRegistry,
    is_entry: bool,
) -> Result<Program, anyhow::Error> {
    check_placement(&program)?;

    let mut out = Vec::with_capacity(program.len());
    for stmt in program {
        match stmt {
            Statement::Import(import) => {
                if !registry.is_module(&import.module) {
                    return Err(Error::UnknownModule {
                        name: import.module.clone(),
                        available: registry.names().into_iter().map(str::to_string).collect(),
                    }
                    .into());
                }
                if state.note_import(&import.module) {
                    out.push(Statement::Import(import));
                }
            }
            Statement::Require(require) => {
                resolve_require(require, current_path, state, registry, &mut out)?;
            }
            Statement::FuncDef(mut func) => {
                if func.source_path.is_empty() {
                    func.source_path = current_path.display().to_string();
                }
                if is_entry {
                    let key = format!("{}.{}", func.namespace, func.name);
                    if let Some(prior) = state.ns_funcs.get(&key) {
                        return Err(Error::DuplicateFunction {
                            namespace: func.namespace.clone(),
                            name: func.name.clone(),
                            prior_path: prior.clone(),
                            path: current_path.to_path_buf(),
                        }
                        .into());
                    }
                    state.ns_funcs.insert(key, current_path.to_path_buf());
                }
                out.push(Statement::FuncDef(func));
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn resolve_require(
    require: RequireStmt,
    current_path: &Path,
    state: &mut CompilerState,
    registry: &dyn ModuleRegistry,
    out: &mut Program,
) -> Result<(), anyhow::Error> {
    let target = state.resolve_against_base(&require.path);
    let canonical = target.canonicalize().map_err(|e| Error::PathResolution {
        path: require.path.clone(),
        message: e.to_string(),
    })?;

    if state.loaded.contains(&canonical) {
        return Ok(());
    }
    state.loaded.insert(canonical.clone());

    let source = std::fs::read_to_string(&canonical).map_err(|e| Error::Io {
        path: canonical.clone(),
        message: e.to_string(),
    })?;
    let required_program = parse_file(&source, registry).map_err(|e| e.in_require(&canonical))?;

    let dir = canonical
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let resolved_required = state.with_base_dir(dir, |state| {
        resolve_program(required_program, &canonical, state, registry, false)
    })?;

    let namespace = match &require.alias {
        Some(alias) => alias.clone(),
        None => {
            if require.path.ends_with(".rg") {
                Path::new(&require.path)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| require.path.clone())
            } else {
                require.path.clone()
            }
        }
    };

    if state.is_imported(&namespace) {
        return Err(Error::NamespaceConflict { namespace }.into());
    }

    for stmt in resolved_required {
        match stmt {
            Statement::Import(import) => out.push(Statement::Import(import)),
            Statement::FuncDef(mut func) => {
                if func.namespace.is_empty() {
                    func.namespace = namespace.clone();
                }
                let key = format!("{}.{}", func.namespace, func.name);
                if let Some(prior) = state.ns_funcs.get(&key) {
                    return Err(Error::DuplicateFunction {
                        namespace: func.namespace.clone(),
                        name: func.name.clone(),
                        prior_path: prior.clone(),
                        path: canonical.clone(),
                    }
                    .into());
                }
                state.ns_funcs.insert(key, canonical.clone());
                out.push(Statement::FuncDef(func));
            }
            // Requires expose only imports and functions; everything else a
            // required file does at its own top level stays local to it.
            _ => {}
        }
    }

    Ok(())
}

fn parse_file(source: &str, registry: &dyn ModuleRegistry) -> Result<Program, Error> {
    let cleaned = strip_comments(source)?;
    let mut known = scan_function_names(&cleaned);
    known.extend(registry.core_function_names().into_iter().map(str::to_string));
    let (preprocessed, line_map) = preprocess(&cleaned, &known);
    let raw = parse_raw(&preprocessed)?;
    lower_program(&raw, &line_map, &preprocessed)
}

struct PlacementChecker {
    violation: Option<(&'static str, usize)>,
}

impl Visitor for PlacementChecker {
    fn visit_statement(&mut self, stmt: &Statement) -> bool {
        match stmt {
            Statement::Import(s) => {
                self.violation = Some(("import", s.line));
                true
            }
            Statement::Require(s) => {
                self.violation = Some(("require", s.line));
                true
            }
            other => walk_statement(self, other),
        }
    }
}

/// `import`/`require` are only valid at the top level of a file; this walks
/// every nested body (never the top-level statements themselves, since
/// `walk_statement` only descends into bodies) looking for one anywhere else.
fn check_placement(program: &Program) -> Result<(), Error> {
    let mut checker = PlacementChecker { violation: None };
    for stmt in program {
        walk_statement(&mut checker, stmt);
        if checker.violation.is_some() {
            break;
        }
    }
    match checker.violation {
        Some((keyword, line)) => Err(Error::Placement {
            keyword: keyword.to_string(),
            line,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stdlib::BuiltinRegistry;
    use std::io::Write;
    use tempfile::tempdir;

    fn parse_and_resolve(entry_source: &str, dir: &std::path::Path) -> ResolvedProgram {
        let entry_path = dir.join("main.rg");
        let program = parse_file(entry_source, &BuiltinRegistry::new()).unwrap();
        resolve(program, &entry_path, &BuiltinRegistry::new()).unwrap()
    }

    #[test]
    fn rejects_import_nested_in_function_body() {
        let dir = tempdir().unwrap();
        let entry_path = dir.path().join("main.rg");
        let program = parse_file("def foo()\nimport os\nend\n", &BuiltinRegistry::new()).unwrap();
        let result = resolve(program, &entry_path, &BuiltinRegistry::new());
        let err = result.unwrap_err();
        let downcast = err.downcast_ref::<Error>().unwrap();
        assert!(matches!(downcast, Error::Placement { line: 2, .. }));
    }

    #[test]
    fn unknown_import_is_rejected() {
        let dir = tempdir().unwrap();
        let entry_path = dir.path().join("main.rg");
        let program = parse_file("import nope\n", &BuiltinRegistry::new()).unwrap();
        let result = resolve(program, &entry_path, &BuiltinRegistry::new());
        assert!(result.is_err());
    }

    #[test]
    fn require_with_alias_namespaces_functions() {
        let dir = tempdir().unwrap();
        let mut util = std::fs::File::create(dir.path().join("util.rg")).unwrap();
        writeln!(util, "def greet()\nputs(\"hi\")\nend\n").unwrap();

        let resolved = parse_and_resolve("require \"./util\" as u\nu.greet()\n", dir.path());
        let func = resolved
            .program
            .iter()
            .find_map(|s| s.as_func_def())
            .expect("expected a FuncDef in the resolved program");
        assert_eq!(func.name, "greet");
        assert_eq!(func.namespace, "u");
    }

    #[test]
    fn duplicate_function_across_requires_is_rejected() {
        let dir = tempdir().unwrap();
        for name in ["a.rg", "b.rg"] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            writeln!(f, "def foo()\nend\n").unwrap();
        }
        let entry_path = dir.path().join("main.rg");
        let program = parse_file(
            "require \"./a\" as u\nrequire \"./b\" as u2\n",
            &BuiltinRegistry::new(),
        )
        .unwrap();

        // Force both into the same namespace to exercise the conflict path.
        let program: Program = program
            .into_iter()
            .map(|s| match s {
                Statement::Require(mut r) => {
                    r.alias = Some("shared".into());
                    Statement::Require(r)
                }
                other => other,
            })
            .collect();

        let result = resolve(program, &entry_path, &BuiltinRegistry::new());
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::DuplicateFunction { .. })
        ));
    }

    #[test]
    fn duplicate_function_at_entry_top_level_is_rejected() {
        let dir = tempdir().unwrap();
        let entry_path = dir.path().join("main.rg");
        let program =
            parse_file("def foo()\nend\ndef foo()\nend\n", &BuiltinRegistry::new()).unwrap();
        let result = resolve(program, &entry_path, &BuiltinRegistry::new());
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::DuplicateFunction { .. })
        ));
    }

    #[test]
    fn same_named_functions_in_different_required_files_are_not_duplicates() {
        let dir = tempdir().unwrap();
        for name in ["a.rg", "b.rg"] {
            let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
            writeln!(f, "def foo()\nend\n").unwrap();
        }
        let resolved = parse_and_resolve(
            "require \"./a\" as a\nrequire \"./b\" as b\n",
            dir.path(),
        );
        let func_count = resolved
            .program
            .iter()
            .filter(|s| s.as_func_def().is_some())
            .count();
        assert_eq!(func_count, 2);
    }

    #[test]
    fn requiring_the_same_file_twice_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut util = std::fs::File::create(dir.path().join("util.rg")).unwrap();
        writeln!(util, "def greet()\nend\n").unwrap();

        let resolved = parse_and_resolve(
            "require \"./util\" as u\nrequire \"./util\" as u\nu.greet()\n",
            dir.path(),
        );
        let func_count = resolved
            .program
            .iter()
            .filter(|s| s.as_func_def().is_some())
            .count();
        assert_eq!(func_count, 1);
    }
}
