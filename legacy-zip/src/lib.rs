//! ZIP archive reading and writing with explicit control over header fields.
//!
//! General-purpose ZIP writers decide some header bits on their own, most
//! notably the UTF-8 name flag (bit 11) for non-ASCII names. Loaders that
//! predate that flag read its presence as a different name encoding and
//! misparse the entry. This crate writes every header field itself: entries
//! are raw deflate, flags are always zero, and names are stored as the bytes
//! given.
//!
//! # Quick Start
//!
//! ```rust
//! use legacy_zip::{ArchiveReader, ArchiveWriter, FileOptions};
//!
//! // Writing
//! let mut writer = ArchiveWriter::new(Vec::new());
//! writer.write_deflated("metadata/mwcoreProperties.xml", b"<version>R2022b</version>", &FileOptions::default())?;
//! let bytes = writer.finish()?;
//!
//! // Reading
//! let archive = ArchiveReader::new(&bytes)?;
//! let entry = &archive.entries()[0];
//! assert!(!entry.has_utf8_flag());
//! assert_eq!(archive.read(entry)?, b"<version>R2022b</version>");
//! # Ok::<(), legacy_zip::Error>(())
//! ```
#![forbid(unsafe_code)]

mod crc;
mod errors;
pub mod headers;
mod reader;
pub mod time;
mod writer;

pub use crc::crc32;
pub use errors::{Error, ErrorKind};
pub use headers::{flags, CompressionMethod};
pub use reader::{ArchiveReader, Entry};
pub use time::DosDateTime;
pub use writer::{ArchiveWriter, FileOptions, DEFAULT_COMPRESSION_LEVEL};
