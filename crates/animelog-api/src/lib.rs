//! Anime catalog clients.
//!
//! [`mal::MalClient`] is the primary catalog; [`jikan::JikanClient`] is an
//! optional enrichment source whose failures never reach the caller.

pub mod jikan;
pub mod mal;
pub mod sort;
pub mod traits;

#[cfg(test)]
mod stub;

pub use traits::{
    AnimeDetails, AnimeRecord, AnimeSeason, CatalogService, ExternalLink, LinkSource, Picture,
    Recommendation, RelatedAnime, Skipped, SortMode, Statistics,
};
