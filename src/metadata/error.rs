//! Error types for metadata document patching.
use std::path::PathBuf;
use thiserror::Error;

/// Result type for metadata operations.
pub type Result<T> = std::result::Result<T, PatchError>;

/// A document that could not be parsed, with the byte offset of the problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (at byte {position})")]
pub struct XmlFault {
    pub position: u64,
    pub message: String,
}

impl XmlFault {
    pub(crate) fn new(position: impl TryInto<u64>, message: impl Into<String>) -> Self {
        Self {
            position: position.try_into().unwrap_or(u64::MAX),
            message: message.into(),
        }
    }
}

/// Error types for metadata operations.
#[derive(Error, Debug)]
pub enum PatchError {
    /// The document is not well-formed XML
    #[error("malformed XML in {path}: {source}")]
    MalformedXml {
        path: PathBuf,
        #[source]
        source: XmlFault,
    },

    /// The document could not be read or written
    #[error("I/O error on {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
