//! Dependency declarations and the depends-string grammar.
//!
//! A depends string is a package name optionally followed by `@` and a
//! range expression, e.g. `freetype`, `freetype@2.11.0` or
//! `zlib@^1.2.0`. A bare name accepts any version.

use super::range::{RangeError, VersionRange};
use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};
use std::fmt;
use thiserror::Error;

/// A package dependency: name plus acceptable version interval
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Deserialize, Serialize, SerdeDeserialize, SerdeSerialize,
)]
#[archive(check_bytes)]
pub struct Dependency {
    pub name: String,
    pub range: VersionRange,
}

/// A dependency declared in the meta layer.
///
/// Carries reserved per-entry configuration pairs for build-system
/// directives. No manifest syntax populates them yet, so the sequence is
/// always empty after parsing.
#[derive(
    Debug, Clone, PartialEq, Eq, Archive, Deserialize, Serialize, SerdeDeserialize, SerdeSerialize,
)]
#[archive(check_bytes)]
pub struct MetaDependency {
    pub dep: Dependency,
    pub configuration: Vec<(String, String)>,
}

/// Depends-string parsing errors
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("Invalid dependency name '{name}'")]
    InvalidName { name: String },

    #[error("Invalid version range string '{range}' in dependency declaration for '{name}'")]
    InvalidRange {
        name: String,
        range: String,
        #[source]
        source: RangeError,
    },
}

impl Dependency {
    /// Create a new dependency
    pub fn new(name: String, range: VersionRange) -> Self {
        Self { name, range }
    }

    /// Create a dependency accepting any version
    pub fn any_version(name: String) -> Self {
        Self {
            name,
            range: VersionRange::ANY,
        }
    }

    /// Check if this is a valid package name
    pub fn is_valid_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
    }

    /// Parse a `name[@range]` depends string
    pub fn parse(input: &str) -> Result<Self, DependencyError> {
        let (name, range_str) = match input.split_once('@') {
            Some((name, range)) => (name, Some(range)),
            None => (input, None),
        };

        if !Self::is_valid_name(name) {
            return Err(DependencyError::InvalidName {
                name: name.to_string(),
            });
        }

        let range = match range_str {
            Some(expr) => {
                VersionRange::parse(expr).map_err(|source| DependencyError::InvalidRange {
                    name: name.to_string(),
                    range: expr.to_string(),
                    source,
                })?
            }
            None => VersionRange::ANY,
        };

        Ok(Self {
            name: name.to_string(),
            range,
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.range.is_any() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}@{}", self.name, self.range)
        }
    }
}

impl MetaDependency {
    /// Wrap a dependency with no configuration pairs
    pub fn new(dep: Dependency) -> Self {
        Self {
            dep,
            configuration: Vec::new(),
        }
    }
}

impl From<Dependency> for MetaDependency {
    fn from(dep: Dependency) -> Self {
        Self::new(dep)
    }
}

impl fmt::Display for MetaDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dep)
    }
}
