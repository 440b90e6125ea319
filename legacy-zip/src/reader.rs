//! In-memory archive reader exposing raw header fields.
//!
//! The reader walks the central directory in order and keeps every entry's
//! flag bits, method and raw name bytes, which is what a caller needs to
//! check how an archive was framed rather than just what it contains.

use crate::crc::crc32;
use crate::errors::{Error, ErrorKind};
use crate::headers::{
    flags, le_u32, parse_extended_timestamp, CentralDirectoryHeader, CompressionMethod,
    EndOfCentralDirectory, LocalFileHeader, ZIP64_EOCD_LOCATOR_SIGNATURE,
};
use crate::time::DosDateTime;
use flate2::read::DeflateDecoder;
use std::borrow::Cow;
use std::io::Read;

/// Longest archive comment allowed by the format.
const MAX_COMMENT_LEN: usize = u16::MAX as usize;

/// Upper bound on the buffer reserved from a declared entry size.
const PREALLOCATION_LIMIT: u64 = 16 * 1024 * 1024;

/// Metadata of one central directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: Vec<u8>,
    flags: u16,
    method: CompressionMethod,
    modified: DosDateTime,
    unix_mtime: Option<u32>,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    local_header_offset: u64,
}

impl Entry {
    /// Name exactly as stored.
    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// Name decoded as UTF-8, replacing invalid sequences.
    ///
    /// The UTF-8 flag is not consulted: loaders of this container family store
    /// UTF-8 bytes without setting it.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// General purpose bit flags.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// Whether the UTF-8 name flag (bit 11) is set.
    pub fn has_utf8_flag(&self) -> bool {
        self.flags & flags::UTF8_NAME != 0
    }

    /// Directory entries are named with a trailing slash.
    pub fn is_dir(&self) -> bool {
        self.name.last() == Some(&b'/')
    }

    pub fn compression_method(&self) -> CompressionMethod {
        self.method
    }

    /// DOS modification time from the central directory.
    pub fn last_modified(&self) -> DosDateTime {
        self.modified
    }

    /// Unix modification time from an extended timestamp block, if present.
    pub fn unix_mtime(&self) -> Option<u32> {
        self.unix_mtime
    }

    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }
}

/// Reader over a complete archive held in memory.
///
/// # Example
///
/// ```rust,no_run
/// use legacy_zip::ArchiveReader;
///
/// let data = std::fs::read("model.slx")?;
/// let archive = ArchiveReader::new(&data)?;
/// for entry in archive.entries() {
///     println!("{} flags=0x{:04x}", entry.name(), entry.flags());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ArchiveReader<'data> {
    data: &'data [u8],
    entries: Vec<Entry>,
}

impl<'data> ArchiveReader<'data> {
    /// Parse the central directory of `data`.
    pub fn new(data: &'data [u8]) -> Result<Self, Error> {
        let eocd_pos = find_end_of_central_directory(data)?;
        let eocd = EndOfCentralDirectory::parse(&data[eocd_pos..])?;

        if eocd_pos >= 20 && le_u32(&data[eocd_pos - 20..]) == ZIP64_EOCD_LOCATOR_SIGNATURE {
            return Err(Error::from(ErrorKind::Zip64Unsupported));
        }
        if eocd.has_zip64_markers() {
            return Err(Error::from(ErrorKind::Zip64Unsupported));
        }
        if eocd.disk_number != 0 || eocd.central_dir_disk != 0 || eocd.entries_on_disk != eocd.total_entries {
            return Err(Error::from(ErrorKind::MultiDiskUnsupported));
        }

        let start = eocd.central_dir_offset as usize;
        let end = start
            .checked_add(eocd.central_dir_size as usize)
            .filter(|&end| end <= eocd_pos)
            .ok_or_else(|| Error::from(ErrorKind::Eof))?;

        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        let mut cursor = &data[start..end];
        for _ in 0..eocd.total_entries {
            let header = CentralDirectoryHeader::parse(cursor)?;
            let rest = &cursor[CentralDirectoryHeader::SIZE..];
            if rest.len() < header.variable_length() {
                return Err(Error::from(ErrorKind::Eof));
            }
            let name_len = header.file_name_len as usize;
            let extra_len = header.extra_field_len as usize;
            let name = rest[..name_len].to_vec();
            let extra = &rest[name_len..name_len + extra_len];

            if header.compressed_size == u32::MAX
                || header.uncompressed_size == u32::MAX
                || header.local_header_offset == u32::MAX
            {
                return Err(Error::from(ErrorKind::Zip64Unsupported));
            }

            entries.push(Entry {
                name,
                flags: header.flags,
                method: CompressionMethod::from(header.compression_method),
                modified: DosDateTime::from_parts(header.last_mod_time, header.last_mod_date),
                unix_mtime: parse_extended_timestamp(extra),
                crc32: header.crc32,
                compressed_size: u64::from(header.compressed_size),
                uncompressed_size: u64::from(header.uncompressed_size),
                local_header_offset: u64::from(header.local_header_offset),
            });
            cursor = &rest[header.variable_length()..];
        }

        Ok(Self { data, entries })
    }

    /// Entries in central directory order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by its exact name.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name.as_bytes())
    }

    /// Decompress an entry and verify its CRC-32 and size.
    pub fn read(&self, entry: &Entry) -> Result<Vec<u8>, Error> {
        if entry.flags & flags::ENCRYPTED != 0 {
            return Err(Error::from(ErrorKind::Encrypted(entry.name().into_owned())));
        }

        let offset = entry.local_header_offset as usize;
        let local = LocalFileHeader::parse(self.data.get(offset..).ok_or_else(|| Error::from(ErrorKind::Eof))?)?;
        let data_start = offset + LocalFileHeader::SIZE + local.variable_length();
        let raw = data_start
            .checked_add(entry.compressed_size as usize)
            .and_then(|data_end| self.data.get(data_start..data_end))
            .ok_or_else(|| Error::from(ErrorKind::Eof))?;

        let contents = match entry.method {
            CompressionMethod::Store => raw.to_vec(),
            CompressionMethod::Deflate => {
                let capacity = entry.uncompressed_size.min(PREALLOCATION_LIMIT);
                let mut out = Vec::with_capacity(capacity as usize);
                // One byte past the declared size is enough to detect a mismatch.
                DeflateDecoder::new(raw)
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)?;
                out
            },
            CompressionMethod::Other(id) => {
                return Err(Error::from(ErrorKind::UnsupportedCompressionMethod(id)));
            },
        };

        if contents.len() as u64 != entry.uncompressed_size {
            return Err(Error::from(ErrorKind::InvalidSize {
                expected: entry.uncompressed_size,
                actual: contents.len() as u64,
            }));
        }
        let actual = crc32(&contents);
        if actual != entry.crc32 {
            return Err(Error::from(ErrorKind::InvalidChecksum {
                expected: entry.crc32,
                actual,
            }));
        }

        Ok(contents)
    }
}

impl std::fmt::Debug for ArchiveReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveReader")
            .field("size", &self.data.len())
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

/// Locate the end of central directory record by scanning backwards.
fn find_end_of_central_directory(data: &[u8]) -> Result<usize, Error> {
    if data.len() < EndOfCentralDirectory::SIZE {
        return Err(Error::from(ErrorKind::MissingEndOfCentralDirectory));
    }

    let last = data.len() - EndOfCentralDirectory::SIZE;
    let first = last.saturating_sub(MAX_COMMENT_LEN);
    (first..=last)
        .rev()
        .find(|&pos| {
            data[pos..pos + 4] == [0x50, 0x4b, 0x05, 0x06]
                && pos + EndOfCentralDirectory::SIZE + usize::from(u16::from_le_bytes([data[pos + 20], data[pos + 21]]))
                    == data.len()
        })
        .ok_or_else(|| Error::from(ErrorKind::MissingEndOfCentralDirectory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{ArchiveWriter, FileOptions};

    fn sample() -> Vec<u8> {
        let mut writer = ArchiveWriter::new(Vec::new());
        writer
            .write_deflated("[Content_Types].xml", b"<Types/>", &FileOptions::default())
            .unwrap();
        writer
            .write_deflated("metadata/coreProperties.xml", b"<cp:coreProperties/>", &FileOptions::default())
            .unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_entries_in_order() {
        let bytes = sample();
        let reader = ArchiveReader::new(&bytes).unwrap();
        let names: Vec<_> = reader.entries().iter().map(|e| e.name().into_owned()).collect();
        assert_eq!(names, ["[Content_Types].xml", "metadata/coreProperties.xml"]);
        assert!(reader.find("metadata/coreProperties.xml").is_some());
        assert!(reader.find("metadata/missing.xml").is_none());
    }

    #[test]
    fn test_not_an_archive() {
        let err = ArchiveReader::new(b"this is not a zip file at all, just some text").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingEndOfCentralDirectory));

        let err = ArchiveReader::new(b"PK").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingEndOfCentralDirectory));
    }

    #[test]
    fn test_truncated_archive() {
        let bytes = sample();
        // Dropping the front shifts every offset the EOCD points at
        let err = ArchiveReader::new(&bytes[10..]).unwrap_err();
        assert!(!matches!(err.kind(), ErrorKind::MissingEndOfCentralDirectory));
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut bytes = sample();
        // CRC field of the first central directory header
        let reader = ArchiveReader::new(&bytes).unwrap();
        let entry = reader.entries()[0].clone();
        drop(reader);
        let cd_start = bytes
            .windows(4)
            .position(|w| w == [0x50, 0x4b, 0x01, 0x02])
            .unwrap();
        bytes[cd_start + 16] ^= 0xff;

        let reader = ArchiveReader::new(&bytes).unwrap();
        let tampered = &reader.entries()[0];
        assert_ne!(tampered.crc32(), entry.crc32());
        let err = reader.read(tampered).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidChecksum { .. }));
    }

    fn with_declared_size(size: u32) -> Vec<u8> {
        let mut bytes = sample();
        let cd_start = bytes
            .windows(4)
            .position(|w| w == [0x50, 0x4b, 0x01, 0x02])
            .unwrap();
        bytes[cd_start + 24..cd_start + 28].copy_from_slice(&size.to_le_bytes());
        bytes
    }

    #[test]
    fn test_oversized_declaration_is_rejected() {
        let bytes = with_declared_size(0xFFFF_FFFE);
        let reader = ArchiveReader::new(&bytes).unwrap();
        let entry = &reader.entries()[0];
        assert_eq!(entry.uncompressed_size(), 0xFFFF_FFFE);

        let err = reader.read(entry).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidSize { expected, actual } => {
                assert_eq!(*expected, 0xFFFF_FFFE);
                assert_eq!(*actual, b"<Types/>".len() as u64);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_output_stops_past_declared_size() {
        let bytes = with_declared_size(2);
        let reader = ArchiveReader::new(&bytes).unwrap();

        let err = reader.read(&reader.entries()[0]).unwrap_err();
        match err.kind() {
            ErrorKind::InvalidSize { expected, actual } => {
                assert_eq!(*expected, 2);
                assert_eq!(*actual, 3);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_directory_entries() {
        let entry = Entry {
            name: b"metadata/".to_vec(),
            flags: flags::UTF8_NAME,
            method: CompressionMethod::Store,
            modified: DosDateTime::MIN,
            unix_mtime: None,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            local_header_offset: 0,
        };
        assert!(entry.is_dir());
        assert!(entry.has_utf8_flag());
    }

    #[test]
    fn test_archive_with_comment() {
        let mut bytes = sample();
        let comment = b"written by a test";
        let len = bytes.len();
        bytes[len - 2..].copy_from_slice(&(comment.len() as u16).to_le_bytes());
        bytes.extend_from_slice(comment);

        let reader = ArchiveReader::new(&bytes).unwrap();
        assert_eq!(reader.len(), 2);
    }
}
