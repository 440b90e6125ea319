//! Build a container from a directory tree.

use crate::archive::error::{ArchiveError, Result};
use crate::archive::path::relative_to_entry;
use chrono::{DateTime, Local};
use legacy_zip::{ArchiveWriter, FileOptions, DEFAULT_COMPRESSION_LEVEL};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Options controlling how a container is packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOptions {
    /// Deflate level, 0 (fastest) to 9 (smallest)
    pub compression_level: u32,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl PackOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the deflate level; values above 9 are treated as 9.
    #[inline]
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}

/// Pack every regular file below `src_dir` into `container_path`.
///
/// See [`pack_with`].
pub fn pack<P: AsRef<Path>, Q: AsRef<Path>>(src_dir: P, container_path: Q) -> Result<()> {
    pack_with(src_dir, container_path, &PackOptions::default())
}

/// Pack every regular file below `src_dir` into `container_path`.
///
/// Files are visited depth-first in lexicographic order and stored as deflate
/// entries named by their forward-slash path relative to `src_dir`. Directories
/// get no entries of their own. Every header carries flags `0`, in particular
/// without the UTF-8 name bit. Entry times come from the files' modification
/// times.
///
/// The archive is assembled in a temporary file next to `container_path` and
/// renamed over it once complete, so a failure leaves any existing file at
/// `container_path` untouched and no partial output behind.
pub fn pack_with<P: AsRef<Path>, Q: AsRef<Path>>(src_dir: P, container_path: Q, options: &PackOptions) -> Result<()> {
    let src_dir = src_dir.as_ref();
    let container_path = container_path.as_ref();

    let parent = match container_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut staged = tempfile::Builder::new()
        .prefix(".slx-backport-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| ArchiveError::write_failure(container_path, e))?;

    let count = {
        let mut writer = ArchiveWriter::new(BufWriter::new(staged.as_file_mut()));
        write_tree(&mut writer, src_dir, container_path, options)?;
        let count = writer.len();
        let mut buffered = writer
            .finish()
            .map_err(|e| ArchiveError::from_writer(container_path, e))?;
        buffered
            .flush()
            .map_err(|e| ArchiveError::write_failure(container_path, e))?;
        count
    };

    staged
        .as_file()
        .sync_all()
        .map_err(|e| ArchiveError::write_failure(container_path, e))?;

    // Keep the permissions of the file being replaced
    if let Ok(existing) = fs::metadata(container_path) {
        fs::set_permissions(staged.path(), existing.permissions())
            .map_err(|e| ArchiveError::write_failure(container_path, e))?;
    }

    staged
        .persist(container_path)
        .map_err(|e| ArchiveError::write_failure(container_path, e.error))?;

    debug!(container = %container_path.display(), entries = count, "packed container");
    Ok(())
}

fn write_tree<W: Write>(
    writer: &mut ArchiveWriter<W>,
    src_dir: &Path,
    container_path: &Path,
    options: &PackOptions,
) -> Result<()> {
    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src_dir).to_path_buf();
            ArchiveError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(src_dir).unwrap_or(path);
        let name = relative_to_entry(relative)
            .ok_or_else(|| ArchiveError::UnsafeEntryPath(relative.display().to_string()))?;

        let data = fs::read(path).map_err(|e| ArchiveError::io(path, e))?;
        let modified = entry
            .metadata()
            .map_err(|e| ArchiveError::io(path, e.into()))?
            .modified()
            .map_err(|e| ArchiveError::io(path, e))?;

        let file_options = FileOptions::default()
            .last_modified(DateTime::<Local>::from(modified))
            .compression_level(options.compression_level);

        writer.write_deflated(&name, &data, &file_options).map_err(|e| {
            if e.is_io() {
                ArchiveError::from_writer(container_path, e)
            } else {
                ArchiveError::from_writer(path, e)
            }
        })?;
        debug!(entry = %name, size = data.len(), "added entry");
    }

    Ok(())
}
