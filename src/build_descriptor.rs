//! The optional build-descriptor sidecar: a toolchain dependency manifest
//! assembled from `ModuleRegistry::collect_toolchain_deps`, modeled
//! on `go.mod` — the natural concrete shape for "one fixed-name top-level
//! key, a version line, and a block listing each dependency specifier" given
//! the emit language is Go.
use crate::stdlib::ToolchainDep;

const MODULE_NAME: &str = "rugo.out";
const GO_VERSION: &str = "1.21";

pub fn render(deps: &[ToolchainDep]) -> String {
    let mut out = String::new();
    out.push_str(&format!("module {MODULE_NAME}\n\n"));
    out.push_str(&format!("go {GO_VERSION}\n\n"));
    out.push_str("require (\n");
    for dep in deps {
        out.push_str(&format!("\t{} {}\n", dep.import_path, dep.version));
    }
    out.push_str(")\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_module_go_version_and_require_block() {
        let deps = vec![
            ToolchainDep { import_path: "github.com/rugo-lang/rtcore".into(), version: "v0.7.0".into() },
            ToolchainDep { import_path: "github.com/rugo-lang/rtio".into(), version: "v0.4.0".into() },
        ];
        let out = render(&deps);
        assert!(out.starts_with("module rugo.out\n\n"));
        assert!(out.contains("go 1.21\n\n"));
        assert!(out.contains("require (\n\tgithub.com/rugo-lang/rtcore v0.7.0\n\tgithub.com/rugo-lang/rtio v0.4.0\n)\n"));
    }

    #[test]
    fn empty_deps_still_produce_a_valid_shape() {
        let out = render(&[]);
        assert!(out.contains("require (\n)\n"));
    }
}
