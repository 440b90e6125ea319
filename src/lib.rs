//! slx-backport - Retarget Simulink containers to an older release
//!
//! Models, data dictionaries and MATLAB data containers (`.slx`, `.sldd`,
//! `.mldatx`) are ZIP archives that record the release which wrote them in a
//! few XML metadata documents. This library rewrites that record and repacks
//! the archive in the framing older releases accept.
//!
//! # Features
//!
//! - **Archive codec**: Unpack containers and repack them with forward-slash
//!   names, deflate entries and no UTF-8 name flag
//! - **Metadata patching**: Rewrite version fields by byte splicing, leaving the
//!   rest of each document untouched
//! - **Batch conversion**: Convert every container below a directory, continuing
//!   past files that fail
//!
//! # Example - Converting one model
//!
//! ```no_run
//! use slx_backport::{Release, convert_one};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let output = convert_one("model.slx", &Release::R2023b.token())?;
//! println!("Created: {}", output.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Converting a project tree
//!
//! ```no_run
//! use slx_backport::{ConvertOptions, Converter, VersionToken};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::new(ConvertOptions::new().with_extensions(["slx"]));
//! let token = VersionToken::new("R2022b")?;
//! let failed = converter
//!     .convert_tree("project", &token)?
//!     .into_iter()
//!     .filter(|c| !c.is_success())
//!     .count();
//! println!("{failed} file(s) failed");
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod convert;
pub mod metadata;

pub use archive::{ArchiveError, Container, pack, unpack};
pub use convert::{
    Conversion, ConversionError, ConvertOptions, Converter, Release, ReleaseError, TraversalError, VersionToken,
    convert_one, convert_tree,
};
pub use metadata::{PatchError, patch_version_fields};
