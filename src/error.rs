use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end a sampling run.
///
/// Counter resets are not errors; they are reported as a zero latency by the
/// latency tracker.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to launch `{command}`: {source}")]
    /// The admin command could not be started.
    Spawn { command: String, source: io::Error },
    #[error("`{command}` exited with {status}: {stderr}")]
    /// The admin command ran but reported failure.
    Command {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("malformed perf dump from {path:?}: {source}")]
    /// The admin command output is not a mapping of mappings.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("section `{0}` missing from perf dump")]
    MissingSection(String),
    #[error("counter `{counter}` missing from section `{section}`")]
    MissingCounter { section: String, counter: String },
    #[error("counter `{counter}` in section `{section}` is not a {expected}")]
    UnexpectedShape {
        section: String,
        counter: String,
        expected: &'static str,
    },
    #[error("{path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid socket pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("{0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(error: io::Error, path: impl AsRef<Path>) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source: error,
        }
    }
}
