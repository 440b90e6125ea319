//! Batch conversion of every container below a directory.

use crate::convert::error::{ConversionError, TraversalError};
use crate::convert::job::Converter;
use crate::convert::release::VersionToken;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// The outcome of converting one file in a batch.
#[derive(Debug)]
pub struct Conversion {
    pub path: PathBuf,
    pub outcome: Result<PathBuf, ConversionError>,
}

impl Conversion {
    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Progress notifications from [`Converter::convert_tree_with`].
#[derive(Debug)]
pub enum TreeEvent<'a> {
    /// A container is about to be converted
    Started(&'a Path),
    /// A container has been converted, successfully or not
    Finished(&'a Conversion),
}

impl Converter {
    /// Convert every container below `root`.
    ///
    /// See [`Converter::convert_tree_with`].
    pub fn convert_tree<P: AsRef<Path>>(&self, root: P, token: &VersionToken) -> Result<Vec<Conversion>, TraversalError> {
        self.convert_tree_with(root, token, |_| {})
    }

    /// Convert every container below `root`, reporting progress to `observer`.
    ///
    /// The tree is walked depth-first with siblings in lexicographic order.
    /// Each regular file with a recognised extension is converted in place;
    /// a failed conversion is recorded and the walk continues. Directories
    /// that look like scratch debris from an interrupted run are skipped.
    ///
    /// Only problems with the walk itself are returned as errors.
    pub fn convert_tree_with<P, F>(&self, root: P, token: &VersionToken, mut observer: F) -> Result<Vec<Conversion>, TraversalError>
    where
        P: AsRef<Path>,
        F: FnMut(TreeEvent<'_>),
    {
        let root = root.as_ref();
        let meta = fs::metadata(root).map_err(|source| TraversalError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;
        if !meta.is_dir() {
            return Err(TraversalError::NotADirectory(root.to_path_buf()));
        }

        let options = self.options();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !(entry.depth() > 0 && entry.file_type().is_dir() && options.is_scratch_name(entry.file_name())));

        let mut results = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if vanished(&err) => {
                    debug!(path = ?err.path(), "entry vanished during walk");
                    continue;
                },
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    return Err(TraversalError::Walk { path, source: err });
                },
            };
            if !entry.file_type().is_file() || !options.is_container(entry.path()) {
                continue;
            }

            let path = entry.into_path();
            observer(TreeEvent::Started(&path));
            let outcome = self.convert_one(&path, token);
            if let Err(e) = &outcome {
                warn!(container = %path.display(), error = %e, "conversion failed");
            }
            let conversion = Conversion { path, outcome };
            observer(TreeEvent::Finished(&conversion));
            results.push(conversion);
        }

        let failed = results.iter().filter(|c| !c.is_success()).count();
        info!(
            root = %root.display(),
            converted = results.len() - failed,
            failed,
            "batch finished"
        );
        Ok(results)
    }
}

fn vanished(err: &walkdir::Error) -> bool {
    err.depth() > 0 && err.io_error().is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

/// Convert every container below `root` with default options.
///
/// See [`Converter::convert_tree_with`].
pub fn convert_tree<P: AsRef<Path>>(root: P, token: &VersionToken) -> Result<Vec<Conversion>, TraversalError> {
    Converter::default().convert_tree(root, token)
}
