//! Error types for conversion jobs.
use crate::archive::ArchiveError;
use crate::metadata::PatchError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single container conversion.
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Unpacking or repacking failed
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// A metadata document could not be patched
    #[error(transparent)]
    Patch(#[from] PatchError),

    /// The scratch directory could not be prepared
    #[error("cannot prepare scratch directory {path}: {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input path does not name a file
    #[error("input path has no file name: {0}")]
    NoFileName(PathBuf),
}

/// Failure to walk a directory tree in batch mode.
///
/// Per-file conversion failures are reported in the batch results instead.
#[derive(Error, Debug)]
pub enum TraversalError {
    /// The root is not a directory
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root could not be inspected
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory inside the tree could not be read
    #[error("directory walk failed at {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Invalid release selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReleaseError {
    #[error("unknown release: {0}")]
    UnknownRelease(String),

    #[error("version token must not be empty")]
    EmptyToken,
}
