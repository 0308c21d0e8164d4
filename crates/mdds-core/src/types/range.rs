//! Version range intervals and the restricted range grammar.
//!
//! A range is a closed interval `[low, high]` over version ordering. The
//! grammar accepts an exact version `X.Y.Z`, an explicit interval `A..B`,
//! or a compatible-range `^X.Y.Z`; anything else is rejected.

use super::version::{Version, VersionError};
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed version interval with `low <= high`
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Deserialize, Serialize, SerdeDeserialize, SerdeSerialize,
)]
#[archive(check_bytes)]
pub struct VersionRange {
    low: Version,
    high: Version,
}

/// Range parsing and validation errors
#[derive(Error, Debug)]
pub enum RangeError {
    #[error("Invalid version range '{input}': {source}")]
    InvalidVersion {
        input: String,
        #[source]
        source: VersionError,
    },

    #[error("Invalid version range '{input}': dangling '..' separator")]
    DanglingSeparator { input: String },

    #[error("Invalid version range: lower bound {low} is greater than upper bound {high}")]
    InvertedBounds { low: Version, high: Version },
}

impl VersionRange {
    /// The interval accepting every version
    pub const ANY: VersionRange = VersionRange {
        low: Version::MIN,
        high: Version::MAX,
    };

    /// Create a range, rejecting inverted bounds
    pub fn new(low: Version, high: Version) -> Result<Self, RangeError> {
        if low > high {
            return Err(RangeError::InvertedBounds { low, high });
        }
        Ok(Self { low, high })
    }

    /// Create a range accepting exactly one version
    pub fn exact(version: Version) -> Self {
        Self {
            low: version.clone(),
            high: version,
        }
    }

    /// Parse a restricted range expression.
    ///
    /// Accepted forms:
    /// - `X.Y.Z` - exactly that version
    /// - `A..B` - every version from A through B inclusive
    /// - `^X.Y.Z` - X.Y.Z up to the next breaking-change boundary
    pub fn parse(input: &str) -> Result<Self, RangeError> {
        let input = input.trim();

        if let Some(stripped) = input.strip_prefix('^') {
            let low = parse_version(stripped, input)?;
            let high = low.next_breaking();
            return Ok(Self { low, high });
        }

        if let Some((lo, hi)) = input.split_once("..") {
            if lo.is_empty() || hi.is_empty() {
                return Err(RangeError::DanglingSeparator {
                    input: input.to_string(),
                });
            }
            let low = parse_version(lo, input)?;
            let high = parse_version(hi, input)?;
            return Self::new(low, high);
        }

        let version = parse_version(input, input)?;
        Ok(Self::exact(version))
    }

    /// Lower bound (inclusive)
    pub fn low(&self) -> &Version {
        &self.low
    }

    /// Upper bound (inclusive)
    pub fn high(&self) -> &Version {
        &self.high
    }

    /// Check if this range accepts every version
    pub fn is_any(&self) -> bool {
        self.low == Version::MIN && self.high == Version::MAX
    }

    /// Check if this range accepts exactly one version
    pub fn is_exact(&self) -> bool {
        self.low == self.high
    }

    /// Check if a version falls within this range
    pub fn contains(&self, version: &Version) -> bool {
        &self.low <= version && version <= &self.high
    }
}

fn parse_version(component: &str, input: &str) -> Result<Version, RangeError> {
    Version::from_str(component).map_err(|source| RangeError::InvalidVersion {
        input: input.to_string(),
        source,
    })
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            write!(f, "*")
        } else if self.low == self.high {
            write!(f, "{}", self.low)
        } else {
            write!(f, "{}..{}", self.low, self.high)
        }
    }
}
