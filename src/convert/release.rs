//! Target releases and the token written into metadata.

use crate::convert::error::ReleaseError;
use std::fmt;
use std::str::FromStr;

/// The release identifier written into a container's metadata.
///
/// Opaque to the conversion: whatever string the caller selects is written
/// as-is. Only emptiness is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Result<Self, ReleaseError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ReleaseError::EmptyToken);
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VersionToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Release> for VersionToken {
    fn from(release: Release) -> Self {
        Self(release.label().to_string())
    }
}

/// Releases selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Release {
    R2022a,
    R2022b,
    R2023a,
    R2023b,
    R2024a,
    R2024b,
}

impl Release {
    /// All releases, oldest first.
    pub const ALL: [Release; 6] = [
        Release::R2022a,
        Release::R2022b,
        Release::R2023a,
        Release::R2023b,
        Release::R2024a,
        Release::R2024b,
    ];

    /// Release label as written into metadata, e.g. `R2023b`.
    pub fn label(self) -> &'static str {
        match self {
            Release::R2022a => "R2022a",
            Release::R2022b => "R2022b",
            Release::R2023a => "R2023a",
            Release::R2023b => "R2023b",
            Release::R2024a => "R2024a",
            Release::R2024b => "R2024b",
        }
    }

    /// Command-line flag name, e.g. `r2023b`.
    pub fn flag(self) -> &'static str {
        match self {
            Release::R2022a => "r2022a",
            Release::R2022b => "r2022b",
            Release::R2023a => "r2023a",
            Release::R2023b => "r2023b",
            Release::R2024a => "r2024a",
            Release::R2024b => "r2024b",
        }
    }

    /// The token written for this release.
    pub fn token(self) -> VersionToken {
        VersionToken::from(self)
    }
}

impl fmt::Display for Release {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Release {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches("--");
        Release::ALL
            .into_iter()
            .find(|r| r.flag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ReleaseError::UnknownRelease(s.to_string()))
    }
}
