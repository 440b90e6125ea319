//! Deflate-only archive writer with fixed header conventions.
//!
//! Every entry is written with general purpose flags `0`: no UTF-8 name
//! marker, no data descriptor, no encryption. Sizes and CRC-32 are known
//! before the local header is emitted because each entry is compressed in
//! memory first.

use crate::crc::crc32;
use crate::errors::Error;
use crate::headers::{
    extended_timestamp_field, CentralDirectoryHeader, CompressionMethod, EndOfCentralDirectory,
    LocalFileHeader, VERSION_MADE_BY, VERSION_NEEDED_DEFLATE,
};
use crate::time::DosDateTime;
use chrono::{DateTime, TimeZone};
use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

/// Default deflate level, matching zlib's default.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Per-entry options for [`ArchiveWriter::write_deflated`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOptions {
    modified: DosDateTime,
    unix_mtime: Option<u32>,
    level: u32,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            modified: DosDateTime::MIN,
            unix_mtime: None,
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl FileOptions {
    /// Set the modification time.
    ///
    /// The DOS fields take the wall-clock time in `at`'s zone; the extended
    /// timestamp block takes the absolute unix time when it fits in 32 bits.
    pub fn last_modified<Tz: TimeZone>(mut self, at: DateTime<Tz>) -> Self {
        self.modified = DosDateTime::from_naive(&at.naive_local());
        self.unix_mtime = u32::try_from(at.timestamp()).ok();
        self
    }

    /// Set the deflate level, clamped to `0..=9`.
    pub fn compression_level(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    pub fn modified(&self) -> DosDateTime {
        self.modified
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

/// Central directory record kept until [`ArchiveWriter::finish`].
#[derive(Debug)]
struct PendingEntry {
    header: CentralDirectoryHeader,
    name: Vec<u8>,
    extra: Vec<u8>,
}

/// Tracks the number of bytes written so local header offsets are known.
#[derive(Debug)]
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

/// Streaming ZIP writer that emits deflated entries in call order.
///
/// # Example
///
/// ```rust
/// use legacy_zip::{ArchiveReader, ArchiveWriter, FileOptions};
///
/// let mut writer = ArchiveWriter::new(Vec::new());
/// writer.write_deflated("metadata/coreProperties.xml", b"<core/>", &FileOptions::default())?;
/// let bytes = writer.finish()?;
///
/// let reader = ArchiveReader::new(&bytes)?;
/// assert_eq!(reader.entries()[0].flags(), 0);
/// # Ok::<(), legacy_zip::Error>(())
/// ```
#[derive(Debug)]
pub struct ArchiveWriter<W: Write> {
    output: CountingWriter<W>,
    entries: Vec<PendingEntry>,
}

impl<W: Write> ArchiveWriter<W> {
    /// Create a writer that starts at offset 0 of `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            output: CountingWriter {
                inner: writer,
                written: 0,
            },
            entries: Vec::new(),
        }
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compress `data` with raw deflate and append it as entry `name`.
    ///
    /// `name` must be a relative, forward-slash separated path. Its bytes are
    /// stored as given, and the UTF-8 name flag stays clear even when the name
    /// is not ASCII.
    pub fn write_deflated(&mut self, name: &str, data: &[u8], options: &FileOptions) -> Result<(), Error> {
        validate_name(name)?;
        if self.entries.len() >= u16::MAX as usize {
            return Err(Error::too_large("entry count", self.entries.len() as u64 + 1));
        }

        let mut encoder = DeflateEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(options.level));
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let uncompressed_size = fit_u32("uncompressed size", data.len() as u64)?;
        let compressed_size = fit_u32("compressed size", compressed.len() as u64)?;
        let local_header_offset = fit_u32("local header offset", self.output.written)?;
        let file_name_len = u16::try_from(name.len()).map_err(|_| Error::too_large("file name length", name.len() as u64))?;

        let extra = match options.unix_mtime {
            Some(mtime) => extended_timestamp_field(mtime).to_vec(),
            None => Vec::new(),
        };
        let extra_field_len = extra.len() as u16;
        let checksum = crc32(data);
        let method = CompressionMethod::Deflate.as_u16();

        let local = LocalFileHeader {
            version_needed: VERSION_NEEDED_DEFLATE,
            flags: 0,
            compression_method: method,
            last_mod_time: options.modified.time,
            last_mod_date: options.modified.date,
            crc32: checksum,
            compressed_size,
            uncompressed_size,
            file_name_len,
            extra_field_len,
        };
        local.write(&mut self.output)?;
        self.output.write_all(name.as_bytes())?;
        self.output.write_all(&extra)?;
        self.output.write_all(&compressed)?;

        self.entries.push(PendingEntry {
            header: CentralDirectoryHeader {
                version_made_by: VERSION_MADE_BY,
                version_needed: VERSION_NEEDED_DEFLATE,
                flags: 0,
                compression_method: method,
                last_mod_time: options.modified.time,
                last_mod_date: options.modified.date,
                crc32: checksum,
                compressed_size,
                uncompressed_size,
                file_name_len,
                extra_field_len,
                file_comment_len: 0,
                disk_number_start: 0,
                internal_attrs: 0,
                external_attrs: 0,
                local_header_offset,
            },
            name: name.as_bytes().to_vec(),
            extra,
        });

        Ok(())
    }

    /// Write the central directory and end record, then return the inner writer.
    pub fn finish(mut self) -> Result<W, Error> {
        let central_dir_offset = fit_u32("central directory offset", self.output.written)?;

        for entry in &self.entries {
            entry.header.write(&mut self.output)?;
            self.output.write_all(&entry.name)?;
            self.output.write_all(&entry.extra)?;
        }

        let central_dir_size = fit_u32("central directory size", self.output.written - u64::from(central_dir_offset))?;
        let count = self.entries.len() as u16;

        EndOfCentralDirectory {
            disk_number: 0,
            central_dir_disk: 0,
            entries_on_disk: count,
            total_entries: count,
            central_dir_size,
            central_dir_offset,
            comment_len: 0,
        }
        .write(&mut self.output)?;

        self.output.flush()?;
        Ok(self.output.inner)
    }
}

fn fit_u32(what: &'static str, value: u64) -> Result<u32, Error> {
    // u32::MAX itself is the ZIP64 sentinel
    match u32::try_from(value) {
        Ok(v) if v != u32::MAX => Ok(v),
        _ => Err(Error::too_large(what, value)),
    }
}

fn validate_name(name: &str) -> Result<(), Error> {
    if name.is_empty() {
        return Err(Error::invalid_input("entry name is empty"));
    }
    if name.starts_with('/') {
        return Err(Error::invalid_input(format!("entry name is absolute: {}", name)));
    }
    if name.contains('\\') {
        return Err(Error::invalid_input(format!("entry name contains a backslash: {}", name)));
    }
    Ok(())
}
