//! Manifest synchronization engine for manisync.
//!
//! This crate ties the schema layer to the filesystem: it loads the root
//! manifest, resolves the requested fields, discovers every other manifest
//! with the same file name under a search root, and rewrites each one with the
//! root's values. `Synchronizer` is the central API; `SyncConfig` carries the
//! layered configuration and `SyncReport` describes what a run did.

pub mod config;
pub mod discovery;
pub mod engine;
pub mod interrupt;
pub mod report;
pub mod writer;

pub use config::{ConfigFile, SyncConfig, CONFIG_FILE_NAME};
pub use discovery::{discover_manifests, Discovery};
pub use engine::{resolve_fields, sync, ResolvedFields, Synchronizer};
pub use interrupt::{install_signal_handler, shutdown_requested};
pub use report::{SyncReport, TargetOutcome, TargetReport};
pub use writer::write_atomic;

use manisync_schema::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("manifest error: cannot load root manifest: {source}")]
    RootLoad {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },
    #[error("manifest error: cannot load target manifest: {source}")]
    TargetParse {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to search for manifests: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("config error: no keys to synchronize")]
    NoKeys,
    #[error("interrupted after updating {updated} manifest(s)")]
    Interrupted { updated: usize },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
