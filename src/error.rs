//! Error types for fragment conversion.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Convert,
    Normalize,
    Inline,
    Sanitize,
    Clean,
    Assemble,
    Publish,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Convert => "convert",
            Stage::Normalize => "normalize",
            Stage::Inline => "inline assets",
            Stage::Sanitize => "sanitize styles",
            Stage::Clean => "clean markup",
            Stage::Assemble => "assemble fragment",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Boxed error returned by external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while producing or publishing a fragment.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{stage}: failed to read {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported input type: {} (expected HTML, Word, or Excel)", path.display())]
    UnsupportedInput { path: PathBuf },

    #[error("cleaning {} produced an empty fragment", path.display())]
    EmptyFragment { path: PathBuf },

    #[error("conversion of {} failed: {source}", path.display())]
    Converter {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("publishing to {target} failed: {source}")]
    Publisher {
        target: String,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Build an I/O error tagged with the stage and path that failed.
    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    /// The stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Io { stage, .. } => *stage,
            Error::UnsupportedInput { .. } => Stage::Normalize,
            Error::EmptyFragment { .. } => Stage::Assemble,
            Error::Converter { .. } => Stage::Convert,
            Error::Publisher { .. } => Stage::Publish,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
