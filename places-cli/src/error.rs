//! Error types emitted by the places CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use places_core::{IdError, SiteError, SiteId, SqliteSiteStoreError, StoreError};
use places_recommender::{LedgerError, RecommendError};
use thiserror::Error;

/// Errors emitted by the places CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An identifier argument was malformed.
    #[error("invalid {field}: {source}")]
    InvalidId {
        field: &'static str,
        #[source]
        source: IdError,
    },
    /// Creating the database's parent directory failed.
    #[error("failed to create parent directory for {path:?}: {source}")]
    CreateParent {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the site database failed.
    #[error(transparent)]
    OpenStore(#[from] SqliteSiteStoreError),
    /// A store operation issued directly by the CLI failed.
    #[error("failed to {operation}: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
    /// The requested site is not in the catalog.
    #[error("site {site_id} not found")]
    SiteNotFound { site_id: SiteId },
    /// Opening the catalog file failed.
    #[error("failed to open catalog at {path:?}: {source}")]
    OpenCatalog {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The catalog file was not a JSON array of site documents.
    #[error("failed to parse catalog JSON at {path:?}: {source}")]
    ParseCatalog {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A catalog entry failed validation; nothing was ingested.
    #[error("catalog entry {position} in {path:?} is invalid: {source}")]
    InvalidCatalogEntry {
        path: Utf8PathBuf,
        position: usize,
        #[source]
        source: SiteError,
    },
    /// Two catalog entries share an identifier; nothing was ingested.
    #[error("catalog entry {position} in {path:?} repeats site id {site_id}")]
    DuplicateCatalogEntry {
        path: Utf8PathBuf,
        position: usize,
        site_id: SiteId,
    },
    /// A recommendation operation failed.
    #[error(transparent)]
    Recommend(#[from] RecommendError),
    /// A review operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// Serializing command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
