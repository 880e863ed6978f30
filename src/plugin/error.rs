use std::path::PathBuf;

use thiserror::Error;

use crate::plugin::http::HttpError;

/// Inventory query failure. Collapsed to an empty state by the reader.
#[derive(Debug, Error)]
#[error("plugin inventory query failed: {0}")]
pub struct FetchFailure(#[from] pub HttpError);

/// Fatal failure of an install step; aborts the reconciliation run.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("marketplace version listing for {key} failed: {source}")]
    Marketplace {
        key: String,
        #[source]
        source: HttpError,
    },
    #[error("addon version not found: {key} {version}")]
    AddonNotFound { key: String, version: String },
    #[error("artifact download from {url} failed: {source}")]
    Download {
        url: String,
        #[source]
        source: HttpError,
    },
    #[error("cannot derive an artifact file name from {url}")]
    ArtifactName { url: String },
    #[error("failed to write artifact {}: {source}", .path.display())]
    SaveArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload of {key} failed: {source}")]
    Upload {
        key: String,
        #[source]
        source: HttpError,
    },
    #[error("upload response for {key} carried no status link")]
    MissingStatusLink { key: String },
    #[error("invalid status link {link}: {source}")]
    StatusLink {
        link: String,
        #[source]
        source: url::ParseError,
    },
    #[error("install status poll for {key} failed: {source}")]
    StatusPoll {
        key: String,
        #[source]
        source: HttpError,
    },
}
