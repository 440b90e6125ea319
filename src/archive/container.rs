//! In-memory view of a container's entries.

use crate::archive::error::{ArchiveError, Result};
use chrono::{DateTime, Local, TimeZone};
use legacy_zip::{ArchiveReader, CompressionMethod, DosDateTime};
use std::path::Path;
use std::time::SystemTime;

/// One stored file or directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEntry {
    path: String,
    data: Vec<u8>,
    modified: Option<SystemTime>,
    method: CompressionMethod,
    flags: u16,
}

impl ContainerEntry {
    /// Forward-slash separated entry path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decompressed contents; empty for directories.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Modification time, if the headers carry a valid one.
    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.method
    }

    /// General purpose bit flags as stored in the central directory.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn has_utf8_flag(&self) -> bool {
        self.flags & legacy_zip::flags::UTF8_NAME != 0
    }

    pub fn is_dir(&self) -> bool {
        self.path.ends_with('/')
    }
}

/// Ordered collection of the entries of one container.
///
/// Built once from the input file and never modified; edits happen on the
/// unpacked files.
#[derive(Debug, Clone, Default)]
pub struct Container {
    entries: Vec<ContainerEntry>,
}

impl Container {
    /// Read and fully decompress the container at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| ArchiveError::io(path, e))?;
        Self::from_bytes(&data).map_err(|source| ArchiveError::Unreadable {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a container held in memory.
    pub fn from_bytes(data: &[u8]) -> std::result::Result<Self, legacy_zip::Error> {
        let reader = ArchiveReader::new(data)?;

        let mut entries = Vec::with_capacity(reader.len());
        for entry in reader.entries() {
            let name = entry.name();
            if std::str::from_utf8(entry.name_bytes()).is_err() {
                tracing::warn!(name = %name, "entry name is not valid UTF-8; decoding lossily");
            }

            let data = if entry.is_dir() { Vec::new() } else { reader.read(entry)? };
            entries.push(ContainerEntry {
                path: name.into_owned(),
                data,
                modified: entry_time(entry.unix_mtime(), entry.last_modified()),
                method: entry.compression_method(),
                flags: entry.flags(),
            });
        }

        Ok(Self { entries })
    }

    /// Entries in container order.
    pub fn entries(&self) -> &[ContainerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its exact path.
    pub fn get(&self, path: &str) -> Option<&ContainerEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Paths of the file (non-directory) entries, in container order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter(|e| !e.is_dir()).map(|e| e.path.as_str())
    }
}

/// Prefer the absolute extended timestamp; DOS fields are local wall-clock time.
fn entry_time(unix_mtime: Option<u32>, dos: DosDateTime) -> Option<SystemTime> {
    if let Some(secs) = unix_mtime {
        return DateTime::from_timestamp(i64::from(secs), 0).map(SystemTime::from);
    }
    let naive = dos.to_naive()?;
    Local.from_local_datetime(&naive).earliest().map(SystemTime::from)
}
