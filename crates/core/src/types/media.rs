//! Media storage modes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How uploaded product media is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaMode {
    /// Uploaded bytes are persisted unchanged as database blobs.
    #[default]
    Raw,
    /// Uploaded files are written to disk and only their paths are persisted.
    Path,
    /// Uploaded images are resized and recompressed before being persisted as blobs.
    Compressed,
}

impl MediaMode {
    /// Whether this mode persists media as binary blobs.
    #[must_use]
    pub const fn stores_blobs(self) -> bool {
        matches!(self, Self::Raw | Self::Compressed)
    }
}

/// Error returned for an unknown media mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown media mode {0:?} (expected raw, path or compressed)")]
pub struct ParseMediaModeError(String);

impl std::fmt::Display for MediaMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => write!(f, "raw"),
            Self::Path => write!(f, "path"),
            Self::Compressed => write!(f, "compressed"),
        }
    }
}

impl std::str::FromStr for MediaMode {
    type Err = ParseMediaModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "path" => Ok(Self::Path),
            "compressed" => Ok(Self::Compressed),
            _ => Err(ParseMediaModeError(s.to_string())),
        }
    }
}
