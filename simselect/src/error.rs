//! Error type shared by the selection engine and its collaborators.
//!
//! Only `Computation` is recoverable per item; everything else aborts the stream it came from.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not found: {0:?}")]
    NotFound(PathBuf),

    #[error("parse error in {path:?} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("computation failed: {0}")]
    Computation(String),

    #[error("bad config: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialize(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {

    /// Wraps an I/O error, mapping a missing file to `NotFound`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {

        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path),
            _ => Error::Io { path, source },
        }
    }

    /// Whether the error should abort the whole run rather than drop one item.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Computation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serialize(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Error {
        Error::Serialize(e.to_string())
    }
}
