use std::fmt;

/// Error produced while reading or writing an archive.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The specific failure behind an [`Error`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The underlying reader or writer failed.
    Io(std::io::Error),

    /// The data ended before a complete structure could be read.
    Eof,

    /// A record did not start with the expected signature.
    InvalidSignature { expected: u32, actual: u32 },

    /// No end of central directory record was found.
    MissingEndOfCentralDirectory,

    /// The archive uses ZIP64 records.
    Zip64Unsupported,

    /// The archive spans multiple disks.
    MultiDiskUnsupported,

    /// An entry uses a compression method other than stored or deflate.
    UnsupportedCompressionMethod(u16),

    /// An entry is encrypted.
    Encrypted(String),

    /// Decompressed data did not match the recorded CRC-32.
    InvalidChecksum { expected: u32, actual: u32 },

    /// Decompressed data did not match the recorded size.
    InvalidSize { expected: u64, actual: u64 },

    /// A caller-supplied value was rejected.
    InvalidInput { msg: String },

    /// A value does not fit the 32-bit fields of a non-ZIP64 archive.
    TooLarge { what: &'static str, value: u64 },
}

impl Error {
    /// The kind of failure.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Consume the error and return its kind.
    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// Whether the failure came from the underlying reader or writer.
    pub fn is_io(&self) -> bool {
        matches!(self.kind, ErrorKind::Io(_))
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Error::from(ErrorKind::InvalidInput { msg: msg.into() })
    }

    pub(crate) fn too_large(what: &'static str, value: u64) -> Self {
        Error::from(ErrorKind::TooLarge { what, value })
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { kind }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::from(ErrorKind::Io(err))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::Io(e) => write!(f, "io error: {}", e),
            ErrorKind::Eof => write!(f, "unexpected end of archive data"),
            ErrorKind::InvalidSignature { expected, actual } => write!(
                f,
                "invalid signature: expected 0x{:08x}, found 0x{:08x}",
                expected, actual
            ),
            ErrorKind::MissingEndOfCentralDirectory => {
                write!(f, "end of central directory record not found")
            },
            ErrorKind::Zip64Unsupported => write!(f, "ZIP64 archives are not supported"),
            ErrorKind::MultiDiskUnsupported => write!(f, "multi-disk archives are not supported"),
            ErrorKind::UnsupportedCompressionMethod(id) => {
                write!(f, "unsupported compression method {}", id)
            },
            ErrorKind::Encrypted(name) => write!(f, "entry is encrypted: {}", name),
            ErrorKind::InvalidChecksum { expected, actual } => write!(
                f,
                "checksum mismatch: expected 0x{:08x}, computed 0x{:08x}",
                expected, actual
            ),
            ErrorKind::InvalidSize { expected, actual } => {
                write!(f, "size mismatch: expected {} bytes, got {}", expected, actual)
            },
            ErrorKind::InvalidInput { msg } => write!(f, "invalid input: {}", msg),
            ErrorKind::TooLarge { what, value } => {
                write!(f, "{} too large for a non-ZIP64 archive: {}", what, value)
            },
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}
