//! # mdds-core
//!
//! Core types shared across all mdds crates.
//!
//! This crate provides:
//! - Version and VersionRange types with rkyv serialization support
//! - The restricted version-range grammar (exact, `A..B`, caret)
//! - Dependency and MetaDependency types with the depends-string grammar
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types (Version, VersionRange, Dependency, etc.)
//!
//! Range and dependency parsing are pure functions with no shared mutable
//! state, so values can be parsed concurrently from any number of threads.

pub mod types;

// Re-export commonly used types
pub use types::{
    Dependency, DependencyError, MetaDependency, RangeError, Version, VersionError, VersionRange,
};
