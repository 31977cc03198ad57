pub mod ast;
pub mod ast_fold;
pub mod build_descriptor;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compiler;
pub mod emit;
pub mod error;
pub mod lower;
pub mod parser;
pub mod preprocess;
pub mod resolve;
pub mod stdlib;

pub use anyhow::Result;
pub use compiler::{compile, resolve_entry, CompileOutput};
pub use error::Error;

/// Exposes library internals primarily for documentation and for downstream
/// tooling that wants the raw pipeline stages rather than the convenience
/// wrapper in [`compiler`].
pub mod internals {
    pub use crate::ast::{Expression, Program, Statement};
    pub use crate::ast_fold::Visitor;
    pub use crate::parser::RawNode;
    pub use crate::preprocess::LineMap;
    pub use crate::stdlib::{BuiltinRegistry, ModuleRegistry};
}
