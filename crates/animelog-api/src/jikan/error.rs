use thiserror::Error;

/// Errors from the Jikan API client.
///
/// These never leave the crate: [`super::JikanClient`] turns every one of them
/// into a [`crate::traits::Skipped`].
#[derive(Debug, Error)]
pub enum JikanError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status})")]
    Api { status: u16 },

    #[error("parse error: {0}")]
    Parse(String),
}
