//! Runtime error taxonomy.
//!
//! Only fatal conditions surface here. A corrupt region and an
//! unresumable snapshot are recovered where they are found and logged.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Backing store could not be opened, sized, mapped or flushed.
    #[error("backing store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Backing file too short and resizing is disabled.
    #[error("backing store {path} is {actual} bytes, region needs {required}")]
    RegionTooSmall {
        path: PathBuf,
        required: u64,
        actual: u64,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Terminal setup, input or rendering failure.
    #[error("terminal: {0}")]
    Terminal(#[source] io::Error),

    #[error("installing signal handler: {0}")]
    Signal(#[source] io::Error),
}

impl RuntimeError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        RuntimeError::Io {
            path: path.into(),
            source,
        }
    }
}
