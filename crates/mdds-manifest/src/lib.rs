//! # mdds-manifest
//!
//! Parsing and validation of `meta_package.json5` manifests for mdds.
//!
//! This crate provides:
//! - A declarative schema walker over untyped document trees
//! - The package manifest schema built on top of it
//! - Loading entry points for documents, text and files, with failures
//!   annotated by the manifest's origin
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `walk`: Generic tree-validation rules and primitives
//! - `manifest`: The PackageManifest model, schema and loaders
//!
//! Each parse is an independent, synchronous computation with no shared
//! state; parsing different manifests from different threads requires no
//! synchronization.

pub mod manifest;
pub mod walk;

// Re-export main types
pub use manifest::{ManifestError, PackageManifest, ParseError};
pub use walk::WalkError;
