//! The CLI surface: there is no persisted config file, the `clap`-derived
//! `Args` *is* the configuration surface. One `Compile` subcommand reads an
//! `Input`, writes an `Output`, and picks a dump format (`Ast` / `Resolved` /
//! `Go`).
use crate::compiler;
use crate::stdlib::BuiltinRegistry;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use clio::{Input, Output};
use std::io::{Read, Write};
use std::path::PathBuf;

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum DumpFormat {
    /// The lowered AST of the entry file only, requires not followed.
    Ast,
    /// The fully resolved, flattened program.
    Resolved,
    /// The emitted Go source (default).
    Go,
}

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"), about, version)]
pub enum Cli {
    Compile(CompileCommand),
}

/// Compile an `.rg` source file to Go.
#[derive(clap::Args)]
pub struct CompileCommand {
    #[arg(default_value = "-")]
    input: Input,

    #[arg(short, long, default_value = "-")]
    output: Output,

    #[arg(short, long, value_enum, default_value = "go")]
    format: DumpFormat,

    /// Also write the go.mod-style build descriptor alongside the output.
    #[arg(long)]
    build: bool,

    /// Where to write the build descriptor; defaults to `go.mod` next to
    /// the output file.
    #[arg(long)]
    build_output: Option<PathBuf>,
}

impl Cli {
    pub fn execute(&mut self) -> Result<()> {
        match self {
            Cli::Compile(command) => command.execute(),
        }
    }
}

impl CompileCommand {
    fn execute(&mut self) -> Result<()> {
        let entry_path = PathBuf::from(self.input.path().to_string());
        log::debug!("compiling {}", entry_path.display());

        let mut source = String::new();
        self.input
            .read_to_string(&mut source)
            .context("reading source")?;

        let registry = BuiltinRegistry::new();

        match self.format {
            DumpFormat::Ast => {
                let program = compiler::parse_entry(&source, &registry)?;
                self.output
                    .write_all(&serde_yaml::to_vec(&program)?)
                    .context("writing AST dump")?;
            }
            DumpFormat::Resolved => {
                let resolved = compiler::resolve_entry(&entry_path, &source, &registry)?;
                self.output
                    .write_all(&serde_yaml::to_vec(&resolved.program)?)
                    .context("writing resolved-program dump")?;
            }
            DumpFormat::Go => {
                let out = compiler::compile(&entry_path, &source, &registry)?;
                self.output
                    .write_all(out.go_source.as_bytes())
                    .context("writing Go output")?;
                if self.build {
                    let build_path = self
                        .build_output
                        .clone()
                        .unwrap_or_else(|| PathBuf::from("go.mod"));
                    std::fs::write(&build_path, out.build_descriptor)
                        .with_context(|| format!("writing {}", build_path.display()))?;
                    log::info!("wrote build descriptor to {}", build_path.display());
                }
            }
        }

        Ok(())
    }
}
