//! Emit-Tree Builder and Printer: turns a resolved `Program` into Go source
//! text.
pub mod builder;
pub mod printer;
pub mod tree;

pub use builder::build;
pub use printer::print;
pub use tree::EmitFile;
