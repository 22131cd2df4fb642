use animelog_api::mal::MalError;
use thiserror::Error;

/// Failures reported by a [`crate::vault::Vault`].
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not a document: {0}")]
    NotADocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AnimelogError {
    /// Primary catalog call failed (network or non-success status).
    #[error("transport error: {0}")]
    Transport(#[from] MalError),

    /// Malformed front-matter or embedded block.
    #[error("parse error: {0}")]
    Parse(String),

    /// No identifier could be resolved for a note.
    #[error("not found: {0}")]
    NotFound(String),

    /// The vault refused to create a note because the path is taken.
    #[error("write conflict: {0} already exists")]
    WriteConflict(String),

    #[error("no status block in {0}")]
    MissingStatusBlock(String),

    /// Stage-one wizard input outside the accepted range.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
