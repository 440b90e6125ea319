//! Configuration for conversion jobs.

use crate::archive::PackOptions;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Configuration options for converting containers.
///
/// # Examples
///
/// ```rust
/// use slx_backport::convert::ConvertOptions;
///
/// // Create with defaults
/// let options = ConvertOptions::default();
/// assert!(options.is_container("model.SLX"));
///
/// // Or customize
/// let options = ConvertOptions::new()
///     .with_extensions(["slx"])
///     .with_scratch_suffix(".work")
///     .with_compression_level(9);
/// assert!(!options.is_container("data.sldd"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// File extensions treated as containers, without the leading dot
    pub extensions: Vec<String>,
    /// Appended to a container's file name to name its scratch directory
    pub scratch_suffix: String,
    /// Deflate level used when repacking
    pub compression_level: u32,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["slx".to_string(), "sldd".to_string(), "mldatx".to_string()],
            scratch_suffix: "_unzipped".to_string(),
            compression_level: PackOptions::default().compression_level,
        }
    }
}

impl ConvertOptions {
    /// Create a new `ConvertOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of recognised extensions.
    ///
    /// A leading dot is accepted and dropped.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    /// Set the scratch directory suffix. An empty suffix is ignored.
    #[inline]
    pub fn with_scratch_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        if !suffix.is_empty() {
            self.scratch_suffix = suffix;
        }
        self
    }

    /// Set the deflate level; values above 9 are treated as 9.
    #[inline]
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }

    /// Whether `path` has one of the recognised extensions, ignoring case.
    pub fn is_container<P: AsRef<Path>>(&self, path: P) -> bool {
        let Some(ext) = path.as_ref().extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|known| known.eq_ignore_ascii_case(ext))
    }

    /// Whether a directory name marks leftover scratch space.
    pub fn is_scratch_name(&self, name: &OsStr) -> bool {
        name.to_str().is_some_and(|n| n.len() > self.scratch_suffix.len() && n.ends_with(&self.scratch_suffix))
    }

    /// Scratch directory for `input`: a sibling named after the full file name
    /// plus the suffix, e.g. `model.slx` becomes `model.slx_unzipped`.
    ///
    /// Returns `None` when `input` has no file name.
    pub fn scratch_dir_for(&self, input: &Path) -> Option<PathBuf> {
        let file_name = input.file_name()?;
        let mut scratch_name = OsString::from(file_name);
        scratch_name.push(&self.scratch_suffix);
        Some(input.with_file_name(scratch_name))
    }

    pub(crate) fn pack_options(&self) -> PackOptions {
        PackOptions::new().with_compression_level(self.compression_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_container() {
        let options = ConvertOptions::default();
        assert!(options.is_container("a/b/model.slx"));
        assert!(options.is_container("Model.SLX"));
        assert!(options.is_container("dict.Sldd"));
        assert!(options.is_container("bundle.mldatx"));
        assert!(!options.is_container("notes.txt"));
        assert!(!options.is_container("slx"));
        assert!(!options.is_container("model.slx.bak"));
    }

    #[test]
    fn test_scratch_dir_for() {
        let options = ConvertOptions::default();
        let slx = options.scratch_dir_for(Path::new("dir/model.slx")).unwrap();
        let sldd = options.scratch_dir_for(Path::new("dir/model.sldd")).unwrap();
        assert_eq!(slx, Path::new("dir/model.slx_unzipped"));
        assert_ne!(slx, sldd);
        assert_ne!(slx, Path::new("dir/model.slx"));
        assert!(options.scratch_dir_for(Path::new("/")).is_none());
        assert!(options.scratch_dir_for(Path::new("dir/..")).is_none());
    }

    #[test]
    fn test_builders() {
        let options = ConvertOptions::new()
            .with_extensions([".SLX", "", "sldd"])
            .with_scratch_suffix("")
            .with_compression_level(42);
        assert_eq!(options.extensions, ["SLX", "sldd"]);
        assert_eq!(options.scratch_suffix, "_unzipped");
        assert_eq!(options.compression_level, 9);
        assert!(options.is_container("m.slx"));
        assert_eq!(options.pack_options().compression_level, 9);
    }

    #[test]
    fn test_is_scratch_name() {
        let options = ConvertOptions::default();
        assert!(options.is_scratch_name("model.slx_unzipped".as_ref()));
        assert!(!options.is_scratch_name("_unzipped".as_ref()));
        assert!(!options.is_scratch_name("models".as_ref()));
    }
}
