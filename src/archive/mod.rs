//! Container unpacking and repacking.
//!
//! The containers are ZIP files whose reader is sensitive to framing details
//! beyond the entry contents:
//!
//! - entry names are forward-slash separated on every host
//! - no header carries the UTF-8 name flag (bit 11), even for non-ASCII names
//! - entry data is raw deflate
//!
//! [`unpack`] materialises a container as a directory tree and [`pack`] turns a
//! tree back into a container that follows these rules. Entry order is the
//! filesystem walk order; the reader does not depend on it.

pub mod container;
pub mod error;
pub mod pack;
pub mod path;
pub mod unpack;

pub use container::{Container, ContainerEntry};
pub use error::{ArchiveError, Result};
pub use pack::{PackOptions, pack, pack_with};
pub use unpack::{extract, unpack};
