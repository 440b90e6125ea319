//! Fixed-size ZIP records and the bit flags carried in them.
//!
//! All multi-byte fields are little-endian. Each record is parsed from and
//! written to its exact on-disk layout so that callers control every byte of
//! the framing.

use crate::errors::{Error, ErrorKind};
use std::io::Write;

/// Signature of a local file header.
pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
/// Signature of a central directory file header.
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x02014b50;
/// Signature of the end of central directory record.
pub const END_OF_CENTRAL_DIR_SIGNATURE: u32 = 0x06054b50;
/// Signature of the ZIP64 end of central directory locator.
pub const ZIP64_EOCD_LOCATOR_SIGNATURE: u32 = 0x07064b50;

/// "Version needed to extract" for deflate entries (2.0).
pub const VERSION_NEEDED_DEFLATE: u16 = 20;
/// "Version made by": MS-DOS host, specification 2.0.
pub const VERSION_MADE_BY: u16 = 20;

/// Extra field id of the extended timestamp block.
pub const EXTENDED_TIMESTAMP_ID: u16 = 0x5455;

/// General purpose bit flags.
pub mod flags {
    /// Bit 0: entry is encrypted.
    pub const ENCRYPTED: u16 = 1 << 0;
    /// Bit 3: sizes and CRC follow the data in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
    /// Bit 11: file name and comment are UTF-8.
    ///
    /// Loaders that predate this bit treat its presence as a different name
    /// encoding, so the writer in this crate never sets it.
    pub const UTF8_NAME: u16 = 1 << 11;
}

/// Compression method of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// Method 0, no compression.
    Store,
    /// Method 8, raw deflate.
    Deflate,
    /// Any other method id.
    Other(u16),
}

impl CompressionMethod {
    /// Method id as stored in the headers.
    pub fn as_u16(self) -> u16 {
        match self {
            CompressionMethod::Store => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Other(id) => id,
        }
    }
}

impl From<u16> for CompressionMethod {
    fn from(id: u16) -> Self {
        match id {
            0 => CompressionMethod::Store,
            8 => CompressionMethod::Deflate,
            other => CompressionMethod::Other(other),
        }
    }
}

#[inline]
pub(crate) fn le_u16(data: &[u8]) -> u16 {
    u16::from_le_bytes([data[0], data[1]])
}

#[inline]
pub(crate) fn le_u32(data: &[u8]) -> u32 {
    u32::from_le_bytes([data[0], data[1], data[2], data[3]])
}

fn check_signature(expected: u32, actual: u32) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::from(ErrorKind::InvalidSignature { expected, actual }))
    }
}

/// Local file header, without its variable-length name and extra field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_len: u16,
    pub extra_field_len: u16,
}

impl LocalFileHeader {
    /// Size of the fixed part including the signature.
    pub const SIZE: usize = 30;

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() < Self::SIZE {
            return Err(Error::from(ErrorKind::Eof));
        }
        check_signature(LOCAL_FILE_HEADER_SIGNATURE, le_u32(&data[0..4]))?;

        Ok(LocalFileHeader {
            version_needed: le_u16(&data[4..6]),
            flags: le_u16(&data[6..8]),
            compression_method: le_u16(&data[8..10]),
            last_mod_time: le_u16(&data[10..12]),
            last_mod_date: le_u16(&data[12..14]),
            crc32: le_u32(&data[14..18]),
            compressed_size: le_u32(&data[18..22]),
            uncompressed_size: le_u32(&data[22..26]),
            file_name_len: le_u16(&data[26..28]),
            extra_field_len: le_u16(&data[28..30]),
        })
    }

    /// Length of the name and extra field that follow the fixed part.
    pub fn variable_length(&self) -> usize {
        self.file_name_len as usize + self.extra_field_len as usize
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(&LOCAL_FILE_HEADER_SIGNATURE.to_le_bytes())?;
        writer.write_all(&self.version_needed.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.compression_method.to_le_bytes())?;
        writer.write_all(&self.last_mod_time.to_le_bytes())?;
        writer.write_all(&self.last_mod_date.to_le_bytes())?;
        writer.write_all(&self.crc32.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        writer.write_all(&self.uncompressed_size.to_le_bytes())?;
        writer.write_all(&self.file_name_len.to_le_bytes())?;
        writer.write_all(&self.extra_field_len.to_le_bytes())?;
        Ok(())
    }
}

/// Central directory file header, without its variable-length fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub compression_method: u16,
    pub last_mod_time: u16,
    pub last_mod_date: u16,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub file_name_len: u16,
    pub extra_field_len: u16,
    pub file_comment_len: u16,
    pub disk_number_start: u16,
    pub internal_attrs: u16,
    pub external_attrs: u32,
    pub local_header_offset: u32,
}

impl CentralDirectoryHeader {
    /// Size of the fixed part including the signature.
    pub const SIZE: usize = 46;

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() < Self::SIZE {
            return Err(Error::from(ErrorKind::Eof));
        }
        check_signature(CENTRAL_HEADER_SIGNATURE, le_u32(&data[0..4]))?;

        Ok(CentralDirectoryHeader {
            version_made_by: le_u16(&data[4..6]),
            version_needed: le_u16(&data[6..8]),
            flags: le_u16(&data[8..10]),
            compression_method: le_u16(&data[10..12]),
            last_mod_time: le_u16(&data[12..14]),
            last_mod_date: le_u16(&data[14..16]),
            crc32: le_u32(&data[16..20]),
            compressed_size: le_u32(&data[20..24]),
            uncompressed_size: le_u32(&data[24..28]),
            file_name_len: le_u16(&data[28..30]),
            extra_field_len: le_u16(&data[30..32]),
            file_comment_len: le_u16(&data[32..34]),
            disk_number_start: le_u16(&data[34..36]),
            internal_attrs: le_u16(&data[36..38]),
            external_attrs: le_u32(&data[38..42]),
            local_header_offset: le_u32(&data[42..46]),
        })
    }

    /// Length of the name, extra field and comment that follow the fixed part.
    pub fn variable_length(&self) -> usize {
        self.file_name_len as usize + self.extra_field_len as usize + self.file_comment_len as usize
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(&CENTRAL_HEADER_SIGNATURE.to_le_bytes())?;
        writer.write_all(&self.version_made_by.to_le_bytes())?;
        writer.write_all(&self.version_needed.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        writer.write_all(&self.compression_method.to_le_bytes())?;
        writer.write_all(&self.last_mod_time.to_le_bytes())?;
        writer.write_all(&self.last_mod_date.to_le_bytes())?;
        writer.write_all(&self.crc32.to_le_bytes())?;
        writer.write_all(&self.compressed_size.to_le_bytes())?;
        writer.write_all(&self.uncompressed_size.to_le_bytes())?;
        writer.write_all(&self.file_name_len.to_le_bytes())?;
        writer.write_all(&self.extra_field_len.to_le_bytes())?;
        writer.write_all(&self.file_comment_len.to_le_bytes())?;
        writer.write_all(&self.disk_number_start.to_le_bytes())?;
        writer.write_all(&self.internal_attrs.to_le_bytes())?;
        writer.write_all(&self.external_attrs.to_le_bytes())?;
        writer.write_all(&self.local_header_offset.to_le_bytes())?;
        Ok(())
    }
}

/// End of central directory record, without the trailing archive comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub central_dir_disk: u16,
    pub entries_on_disk: u16,
    pub total_entries: u16,
    pub central_dir_size: u32,
    pub central_dir_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    /// Size of the fixed part including the signature.
    pub const SIZE: usize = 22;

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() < Self::SIZE {
            return Err(Error::from(ErrorKind::Eof));
        }
        check_signature(END_OF_CENTRAL_DIR_SIGNATURE, le_u32(&data[0..4]))?;

        Ok(EndOfCentralDirectory {
            disk_number: le_u16(&data[4..6]),
            central_dir_disk: le_u16(&data[6..8]),
            entries_on_disk: le_u16(&data[8..10]),
            total_entries: le_u16(&data[10..12]),
            central_dir_size: le_u32(&data[12..16]),
            central_dir_offset: le_u32(&data[16..20]),
            comment_len: le_u16(&data[20..22]),
        })
    }

    /// Whether any field holds the ZIP64 sentinel value.
    pub fn has_zip64_markers(&self) -> bool {
        self.total_entries == u16::MAX
            || self.entries_on_disk == u16::MAX
            || self.central_dir_size == u32::MAX
            || self.central_dir_offset == u32::MAX
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        writer.write_all(&END_OF_CENTRAL_DIR_SIGNATURE.to_le_bytes())?;
        writer.write_all(&self.disk_number.to_le_bytes())?;
        writer.write_all(&self.central_dir_disk.to_le_bytes())?;
        writer.write_all(&self.entries_on_disk.to_le_bytes())?;
        writer.write_all(&self.total_entries.to_le_bytes())?;
        writer.write_all(&self.central_dir_size.to_le_bytes())?;
        writer.write_all(&self.central_dir_offset.to_le_bytes())?;
        writer.write_all(&self.comment_len.to_le_bytes())?;
        Ok(())
    }
}

/// Build an extended timestamp extra field carrying only the modification time.
pub fn extended_timestamp_field(mtime: u32) -> [u8; 9] {
    let mut field = [0u8; 9];
    field[0..2].copy_from_slice(&EXTENDED_TIMESTAMP_ID.to_le_bytes());
    field[2..4].copy_from_slice(&5u16.to_le_bytes());
    field[4] = 1;
    field[5..9].copy_from_slice(&mtime.to_le_bytes());
    field
}

/// Find the modification time in an extended timestamp block, if present.
///
/// Malformed extra data is ignored rather than reported.
pub fn parse_extended_timestamp(mut extra: &[u8]) -> Option<u32> {
    while extra.len() >= 4 {
        let id = le_u16(&extra[0..2]);
        let len = le_u16(&extra[2..4]) as usize;
        let body = extra.get(4..4 + len)?;
        if id == EXTENDED_TIMESTAMP_ID && body.len() >= 5 && body[0] & 1 != 0 {
            return Some(le_u32(&body[1..5]));
        }
        extra = &extra[4 + len..];
    }
    None
}
