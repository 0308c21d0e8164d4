//! Core data types for mdds manifest handling.
//!
//! This module provides the fundamental types used throughout the mdds
//! ecosystem:
//! - Version types for semantic versioning
//! - Version range intervals and their grammar
//! - Dependency declarations and their grammar

pub mod dependency;
pub mod range;
pub mod version;

// Re-export all public types
pub use dependency::{Dependency, DependencyError, MetaDependency};
pub use range::{RangeError, VersionRange};
pub use version::{Version, VersionError};
