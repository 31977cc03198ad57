//! The stdlib module registry: which `import` names are real,
//! what each one costs in the emitted module's toolchain manifest, and what
//! preamble/import lines the emit builder needs to wire a call like
//! `http.get(...)` up to its target-language counterpart.
//!
//! `BuiltinRegistry` is the only implementation shipped here, but downstream
//! code depends on the [`ModuleRegistry`] trait rather than the concrete type
//! so a future registry (e.g. one backed by a manifest file) can drop in
//! without touching the emit builder.

/// One third-party dependency a stdlib module needs in the emitted build
/// descriptor, e.g. `("github.com/rugo-lang/rtio", "v0.4.0")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainDep {
    pub import_path: String,
    pub version: String,
}

/// A function name always reachable without an `import`, plus the emitted
/// call expression it lowers to.
struct CoreFn {
    name: &'static str,
    emit: &'static str,
}

const CORE_FNS: &[CoreFn] = &[
    CoreFn { name: "puts", emit: "rgrt.Puts" },
    CoreFn { name: "print", emit: "rgrt.Print" },
    CoreFn { name: "len", emit: "rgrt.Len" },
    CoreFn { name: "range", emit: "rgrt.Range" },
];

struct Module {
    name: &'static str,
    import_path: &'static str,
    version: &'static str,
    alias: &'static str,
    functions: &'static [&'static str],
}

const MODULES: &[Module] = &[
    Module {
        name: "io",
        import_path: "github.com/rugo-lang/rtio",
        version: "v0.4.0",
        alias: "rgio",
        functions: &["read_file", "write_file", "exists"],
    },
    Module {
        name: "os",
        import_path: "github.com/rugo-lang/rtos",
        version: "v0.3.1",
        alias: "rgos",
        functions: &["args", "getenv", "exit"],
    },
    Module {
        name: "json",
        import_path: "github.com/rugo-lang/rtjson",
        version: "v0.2.0",
        alias: "rgjson",
        functions: &["parse", "stringify"],
    },
    Module {
        name: "http",
        import_path: "github.com/rugo-lang/rthttp",
        version: "v0.5.2",
        alias: "rghttp",
        functions: &["get", "post"],
    },
];

/// What the emit builder needs to know about importable stdlib modules.
/// Kept as a trait (rather than free functions over `BuiltinRegistry`) so a
/// future manifest-driven registry can be swapped in at the `compiler`
/// call site without the emit builder noticing.
pub trait ModuleRegistry {
    fn is_module(&self, name: &str) -> bool;
    fn names(&self) -> Vec<&str>;
    fn is_core_function(&self, name: &str) -> bool;
    /// Every core function name, for seeding the preprocessor's known-function
    /// set alongside the buffer's own `def`s.
    fn core_function_names(&self) -> Vec<&str>;
    /// The emitted call target for a core function (`puts` -> `rgrt.Puts`).
    fn emit_core_call(&self, name: &str) -> Option<&str>;
    /// The emitted call target for `module.function` (`io.read_file` -> `rgio.ReadFile`).
    fn emit_module_call(&self, module: &str, function: &str) -> Option<String>;
    /// The `(alias, import_path)` a module's import line needs.
    fn emit_import(&self, module: &str) -> Option<(String, String)>;
    /// Always-present `(alias, import_path)` every emitted file carries, for
    /// the core function set.
    fn core_import(&self) -> (String, String);
    /// Raw top-level declarations a module needs emitted once, ahead of
    /// `init`. None of the built-in modules need one today, but the hook
    /// exists because the registry is a trait, not just `BuiltinRegistry`.
    fn emit_preamble(&self, module: &str) -> Vec<String>;
    fn collect_toolchain_deps(&self, modules: &[String]) -> Vec<ToolchainDep>;
}

#[derive(Debug, Default)]
pub struct BuiltinRegistry;

impl BuiltinRegistry {
    pub fn new() -> Self {
        BuiltinRegistry
    }

    fn find(&self, name: &str) -> Option<&'static Module> {
        MODULES.iter().find(|m| m.name == name)
    }
}

fn camel_case(snake: &str) -> String {
    snake
        .split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

impl ModuleRegistry for BuiltinRegistry {
    fn is_module(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn names(&self) -> Vec<&str> {
        MODULES.iter().map(|m| m.name).collect()
    }

    fn is_core_function(&self, name: &str) -> bool {
        CORE_FNS.iter().any(|f| f.name == name)
    }

    fn core_function_names(&self) -> Vec<&str> {
        CORE_FNS.iter().map(|f| f.name).collect()
    }

    fn emit_core_call(&self, name: &str) -> Option<&str> {
        CORE_FNS.iter().find(|f| f.name == name).map(|f| f.emit)
    }

    fn emit_module_call(&self, module: &str, function: &str) -> Option<String> {
        let module = self.find(module)?;
        if !module.functions.contains(&function) {
            return None;
        }
        Some(format!("{}.{}", module.alias, camel_case(function)))
    }

    fn emit_import(&self, module: &str) -> Option<(String, String)> {
        let module = self.find(module)?;
        Some((module.alias.to_string(), module.import_path.to_string()))
    }

    fn core_import(&self) -> (String, String) {
        ("rgrt".to_string(), "github.com/rugo-lang/rtcore".to_string())
    }

    fn emit_preamble(&self, _module: &str) -> Vec<String> {
        Vec::new()
    }

    fn collect_toolchain_deps(&self, modules: &[String]) -> Vec<ToolchainDep> {
        let mut deps: Vec<ToolchainDep> = vec![ToolchainDep {
            import_path: "github.com/rugo-lang/rtcore".into(),
            version: "v0.7.0".into(),
        }];
        for name in modules {
            if let Some(module) = self.find(name) {
                let dep = ToolchainDep {
                    import_path: module.import_path.into(),
                    version: module.version.into(),
                };
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_functions_are_always_available() {
        let reg = BuiltinRegistry::new();
        assert!(reg.is_core_function("puts"));
        assert_eq!(reg.emit_core_call("puts"), Some("rgrt.Puts"));
        assert!(!reg.is_core_function("read_file"));
    }

    #[test]
    fn core_function_names_lists_every_core_function() {
        let reg = BuiltinRegistry::new();
        let names = reg.core_function_names();
        for expected in ["puts", "print", "len", "range"] {
            assert!(names.contains(&expected));
        }
    }

    #[test]
    fn module_function_resolves_to_camel_case_target() {
        let reg = BuiltinRegistry::new();
        assert_eq!(
            reg.emit_module_call("io", "read_file"),
            Some("rgio.ReadFile".to_string())
        );
        assert_eq!(reg.emit_module_call("io", "not_a_fn"), None);
        assert_eq!(reg.emit_module_call("nope", "x"), None);
    }

    #[test]
    fn toolchain_deps_always_include_core_and_dedupe() {
        let reg = BuiltinRegistry::new();
        let deps = reg.collect_toolchain_deps(&["io".into(), "io".into(), "os".into()]);
        assert_eq!(deps.len(), 3);
        assert!(deps.iter().any(|d| d.import_path.contains("rtcore")));
        assert!(deps.iter().any(|d| d.import_path.contains("rtio")));
        assert!(deps.iter().any(|d| d.import_path.contains("rtos")));
    }

    #[test]
    fn unknown_module_is_not_a_module() {
        let reg = BuiltinRegistry::new();
        assert!(!reg.is_module("nonexistent"));
    }
}
