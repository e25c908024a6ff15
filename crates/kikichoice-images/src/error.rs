use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("blob storage configuration error: {0}")]
    Config(String),

    #[error("blob operation failed for \"{location}\": {source}")]
    Store {
        location: String,
        #[source]
        source: object_store::Error,
    },
}

/// Errors that abort an upload run, or a single directory within one.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid source path {}: {reason}", path.display())]
    InvalidSource { path: PathBuf, reason: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("variant lookup failed: {0}")]
    VariantLookup(#[source] kikichoice_db::DbError),

    #[error("database error: {0}")]
    Db(#[from] kikichoice_db::DbError),

    #[error(transparent)]
    Blob(#[from] BlobError),
}
