//! Release metadata documents inside a container.
//!
//! A container records the release that wrote it in up to three XML
//! documents. Any of them may be absent. Within each document the release
//! appears as the text of `version`, `release` or `matlabRelease` elements,
//! whose position in the tree differs between releases.

pub mod error;
pub mod patch;

pub use error::{PatchError, Result, XmlFault};
pub use patch::{patch_document, patch_version_fields};

/// Container-relative paths of the documents that carry release information.
pub const METADATA_DOCUMENTS: [&str; 3] = [
    "metadata/mwcoreProperties.xml",
    "metadata/mwcorePropertiesReleaseInfo.xml",
    "metadata/coreProperties.xml",
];

/// Element names whose text is the release identifier.
pub const VERSION_FIELDS: [&str; 3] = ["version", "release", "matlabRelease"];
