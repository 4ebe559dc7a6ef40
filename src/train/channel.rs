//! Release channel names

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Maturity stage a bug was reported against.
///
/// Serializes to the lowercase names stored in the `release_channel` column
/// (`"old release"` contains a space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Shipping release
    #[serde(rename = "release")]
    Release,
    /// One cycle ahead of release
    #[serde(rename = "beta")]
    Beta,
    /// Two cycles ahead of release
    #[serde(rename = "aurora")]
    Aurora,
    /// Three or more cycles ahead of release
    #[serde(rename = "nightly")]
    Nightly,
    /// Any branch older than the current release
    #[serde(rename = "old release")]
    OldRelease,
    /// Version string was not recognized
    #[serde(rename = "unknown")]
    Unknown,
    /// Reporter left the version unspecified
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl Channel {
    /// All channels, train channels first.
    pub const ALL: [Self; 7] = [
        Self::Release,
        Self::Beta,
        Self::Aurora,
        Self::Nightly,
        Self::OldRelease,
        Self::Unknown,
        Self::Unspecified,
    ];

    /// Column value for this channel.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Beta => "beta",
            Self::Aurora => "aurora",
            Self::Nightly => "nightly",
            Self::OldRelease => "old release",
            Self::Unknown => "unknown",
            Self::Unspecified => "unspecified",
        }
    }

    /// Whether a release train carries a cycle number for this channel.
    #[must_use]
    pub const fn is_train_slot(self) -> bool {
        matches!(
            self,
            Self::Release | Self::Beta | Self::Aurora | Self::Nightly
        )
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| Error::Other(format!("unknown release channel {s:?}")))
    }
}
