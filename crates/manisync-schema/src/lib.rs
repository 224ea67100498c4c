//! Manifest document model for manisync.
//!
//! This crate defines the schema layer: TOML manifest parsing and
//! serialization (`ManifestDocument`), dotted table addressing (`TablePath`),
//! and field lookup/assignment with a strict policy for missing tables. A
//! table that is absent from a document is reported as an error and never
//! created implicitly.

pub mod manifest;
pub mod table_path;

pub use manifest::{parse_manifest_file, parse_manifest_str, ManifestDocument, ManifestError};
pub use table_path::{TablePath, DEFAULT_TABLE};

/// File name of the root manifest when none is configured.
pub const DEFAULT_MANIFEST_NAME: &str = "Cargo.toml";
