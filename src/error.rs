//! Error types for the vizlog core.

use thiserror::Error;

/// Error type for log exchange and replay operations.
#[derive(Debug, Error)]
pub enum LogError {
    /// Wire bytes or a wire field did not parse into a valid wrapper.
    #[error("malformed log: {0}")]
    Malformed(String),

    /// A declared raw type could not be constructed, or an operation's
    /// locator names a structure the mirror does not know.
    #[error("unknown structure: {0}")]
    UnknownStructure(String),

    /// An element already occupies the requested address.
    #[error("element already present at {address:?} in \"{identifier}\"")]
    AddressConflict {
        identifier: String,
        address: Vec<i32>,
    },

    /// The transport collaborator reported a failed send.
    #[error("transport rejected the payload")]
    Transport,

    /// A log file could not be opened, read, or written.
    #[error("log file I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        LogError::Malformed(err.to_string())
    }
}
