//! Retargeting containers to an older release.
//!
//! A conversion unpacks a container into a scratch directory, rewrites the
//! release recorded in its metadata documents, and packs the tree back over
//! the original file in the form older releases accept.
//!
//! # Examples
//!
//! ```no_run
//! use slx_backport::convert::{Release, convert_tree};
//!
//! for conversion in convert_tree("models", &Release::R2023b.token())? {
//!     match conversion.outcome {
//!         Ok(path) => println!("Created: {}", path.display()),
//!         Err(e) => eprintln!("Error processing {}: {e}", conversion.path.display()),
//!     }
//! }
//! # Ok::<(), slx_backport::convert::TraversalError>(())
//! ```

pub mod error;
pub mod job;
pub mod options;
pub mod release;
pub mod scratch;
pub mod tree;

pub use error::{ConversionError, ReleaseError, TraversalError};
pub use job::{Converter, convert_one};
pub use options::ConvertOptions;
pub use release::{Release, VersionToken};
pub use scratch::ScratchDir;
pub use tree::{Conversion, TreeEvent, convert_tree};
