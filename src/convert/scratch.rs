//! Scoped scratch directory for a single conversion.

use crate::convert::error::ConversionError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A directory that exists for the lifetime of the guard.
///
/// Whatever sits at the path on creation is treated as debris from an
/// interrupted run and removed first. The directory and its contents are
/// removed when the guard is dropped, on success and failure alike.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ConversionError> {
        let path = path.into();
        clear(&path).map_err(|source| ConversionError::Scratch {
            path: path.clone(),
            source,
        })?;
        fs::create_dir_all(&path).map_err(|source| ConversionError::Scratch {
            path: path.clone(),
            source,
        })?;
        debug!(scratch = %path.display(), "created scratch directory");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(scratch = %self.path.display(), "removed scratch directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                scratch = %self.path.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }
}

fn clear(path: &Path) -> io::Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    debug!(scratch = %path.display(), "removing stale scratch debris");
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.slx_unzipped");
        {
            let scratch = ScratchDir::create(&path).unwrap();
            fs::create_dir_all(scratch.path().join("metadata")).unwrap();
            fs::write(scratch.path().join("metadata").join("a.xml"), b"<a/>").unwrap();
            assert!(path.is_dir());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_stale_directory_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.slx_unzipped");
        fs::create_dir_all(path.join("old")).unwrap();
        fs::write(path.join("old").join("leftover.xml"), b"stale").unwrap();

        let scratch = ScratchDir::create(&path).unwrap();
        assert!(scratch.path().is_dir());
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_stale_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.slx_unzipped");
        fs::write(&path, b"not a directory").unwrap();

        let scratch = ScratchDir::create(&path).unwrap();
        assert!(scratch.path().is_dir());
    }

    #[test]
    fn test_drop_tolerates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::create(dir.path().join("gone")).unwrap();
        fs::remove_dir_all(scratch.path()).unwrap();
        drop(scratch);
    }

    #[test]
    fn test_create_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let err = ScratchDir::create(blocker.join("scratch")).unwrap_err();
        assert!(matches!(err, ConversionError::Scratch { .. }));
    }
}
