//! The error taxonomy from the front-end's error handling design, plus
//! `ariadne`-backed pretty printing. Every error is fatal to the current
//! compilation — there is no partial/recoverable path, so this is a flat enum
//! rather than a tree of recoverable `Reason`s, in the same spirit as the
//! upstream `error::Error` this crate is descended from.
use ariadne::{Label, Report, ReportKind, Source};
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for std::ops::Range<usize> {
    fn from(s: Span) -> Self {
        s.start..s.end
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone)]
pub enum Error {
    Io {
        path: PathBuf,
        message: String,
    },
    Syntax(String),
    Preprocess {
        line: usize,
        message: String,
    },
    Placement {
        keyword: String,
        line: usize,
    },
    UnknownModule {
        name: String,
        available: Vec<String>,
    },
    DuplicateFunction {
        namespace: String,
        name: String,
        prior_path: PathBuf,
        path: PathBuf,
    },
    NamespaceConflict {
        namespace: String,
    },
    PathResolution {
        path: String,
        message: String,
    },
    Codegen(String),
}

impl Error {
    /// Wrap this error with the `require` frame it occurred under, so the
    /// final message reads as a stack of location clues from the entry file
    /// down to wherever the problem actually is.
    pub fn in_require(self, path: &std::path::Path) -> anyhow::Error {
        anyhow::Error::new(self).context(format!("in require \"{}\"", path.display()))
    }
}

// Needed for `anyhow`.
impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io { path, message } => write!(f, "could not read {}: {message}", path.display()),
            Error::Syntax(message) => write!(f, "{message}"),
            Error::Preprocess { line, message } => {
                write!(f, "malformed paren-free call on line {line}: {message}")
            }
            Error::Placement { keyword, line } => {
                write!(f, "`{keyword}` may only appear at the top level (line {line})")
            }
            Error::UnknownModule { name, available } => write!(
                f,
                "unknown module `{name}`; available modules: {}",
                available.join(", ")
            ),
            Error::DuplicateFunction {
                namespace,
                name,
                prior_path,
                path,
            } => write!(
                f,
                "function `{namespace}.{name}` is defined in both {} and {}",
                prior_path.display(),
                path.display()
            ),
            Error::NamespaceConflict { namespace } => write!(
                f,
                "namespace `{namespace}` conflicts with an already-imported module of the same name"
            ),
            Error::PathResolution { path, message } => {
                write!(f, "could not resolve require path `{path}`: {message}")
            }
            Error::Codegen(message) => write!(f, "internal error during code generation: {message}"),
        }
    }
}

/// Render `error` to stderr with source context when a [`Span`] is available,
/// falling back to plain `Display` otherwise.
pub fn print_error(error: &anyhow::Error, source_id: &str, source: &str, span: Option<Span>) {
    let Some(span) = span.filter(|_| error.downcast_ref::<Error>().is_some()) else {
        eprintln!("{error:#}");
        return;
    };

    let range = std::ops::Range::from(span);
    let message = error.to_string();
    let report = Report::build(ReportKind::Error, source_id, range.start)
        .with_message(&message)
        .with_label(Label::new((source_id, range)).with_message(&message))
        .finish();

    // A failure here would only mean stderr itself is broken.
    let _ = report.eprint((source_id, Source::from(source)));
}
