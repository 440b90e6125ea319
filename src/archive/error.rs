//! Error types for container unpacking and packing.
use std::path::PathBuf;
use thiserror::Error;

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Error types for archive operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The input is not a readable container
    #[error("unreadable container {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: legacy_zip::Error,
    },

    /// Filesystem failure while reading the input or materialising entries
    #[error("I/O error on {path}: {source}")]
    IoFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The output container could not be written or finalised
    #[error("failed to write container {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry name would escape the destination directory
    #[error("unsafe entry path in container: {0}")]
    UnsafeEntryPath(String),

    /// A file exceeds what a non-ZIP64 container can hold
    #[error("cannot pack {path}: {source}")]
    TooLarge {
        path: PathBuf,
        #[source]
        source: legacy_zip::Error,
    },
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::IoFailure {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::WriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Classify a codec error raised while writing `path`.
    pub(crate) fn from_writer(path: impl Into<PathBuf>, err: legacy_zip::Error) -> Self {
        let path = path.into();
        match err.into_kind() {
            legacy_zip::ErrorKind::Io(source) => ArchiveError::WriteFailure { path, source },
            kind @ legacy_zip::ErrorKind::TooLarge { .. } => ArchiveError::TooLarge {
                path,
                source: legacy_zip::Error::from(kind),
            },
            kind => ArchiveError::UnsafeEntryPath(legacy_zip::Error::from(kind).to_string()),
        }
    }
}
