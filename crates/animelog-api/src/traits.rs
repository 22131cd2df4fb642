//! Trait definitions for anime catalog services.
//!
//! The MyAnimeList client implements [`CatalogService`]; the selection flow
//! and note synthesis only ever see these shared record types.

use std::collections::HashSet;
use std::future::Future;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::sort::sort_records;

/// A read-only catalog of anime records.
pub trait CatalogService: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch every title that started airing in one period of a year.
    fn fetch_by_period(
        &self,
        year: u32,
        season: AnimeSeason,
        sort: SortMode,
    ) -> impl Future<Output = Result<Vec<AnimeRecord>, Self::Error>> + Send;

    /// Search titles by free text.
    fn search(
        &self,
        query: &str,
        sort: SortMode,
    ) -> impl Future<Output = Result<Vec<AnimeRecord>, Self::Error>> + Send;

    /// Fetch the full record for a single identifier.
    fn get_anime(&self, anime_id: u64)
        -> impl Future<Output = Result<AnimeRecord, Self::Error>> + Send;

    /// Fetch supplementary sub-resources for a title in one request.
    fn fetch_details(
        &self,
        anime_id: u64,
    ) -> impl Future<Output = Result<AnimeDetails, Self::Error>> + Send;

    /// Fetch all four periods of a year and merge them.
    ///
    /// Periods are fetched one after another. A failing period is logged and
    /// skipped; the call only fails when every period failed. Duplicates are
    /// dropped by identifier (first occurrence wins) before the merged set is
    /// sorted again with [`sort_records`].
    fn fetch_by_year(
        &self,
        year: u32,
        sort: SortMode,
    ) -> impl Future<Output = Result<Vec<AnimeRecord>, Self::Error>> + Send {
        async move {
            let mut merged = Vec::new();
            let mut seen = HashSet::new();
            let mut last_error = None;
            let mut succeeded = 0usize;

            for &season in AnimeSeason::ALL {
                match self.fetch_by_period(year, season, sort).await {
                    Ok(records) => {
                        succeeded += 1;
                        for record in records {
                            if seen.insert(record.id) {
                                merged.push(record);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(year, %season, error = %e, "Failed to fetch period, skipping");
                        last_error = Some(e);
                    }
                }
            }

            if succeeded == 0 {
                if let Some(e) = last_error {
                    return Err(e);
                }
            }

            sort_records(&mut merged, sort);
            Ok(merged)
        }
    }
}

/// Optional source of external links for a title.
pub trait LinkSource: Send + Sync {
    /// Any failure is reported as [`Skipped`], never as a hard error.
    fn fetch_external_links(
        &self,
        anime_id: u64,
    ) -> impl Future<Output = Result<Vec<ExternalLink>, Skipped>> + Send;
}

/// A best-effort call that produced nothing usable.
///
/// Returned by optional enrichment paths (external links, thumbnails) so the
/// caller has to branch explicitly instead of treating an empty value as
/// a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("skipped: {reason}")]
pub struct Skipped {
    pub reason: String,
}

impl Skipped {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeRecord {
    pub id: u64,
    pub title: String,
    /// Japanese title, preferred for display when present.
    pub title_ja: Option<String>,
    pub picture_medium: Option<String>,
    pub picture_large: Option<String>,
    pub mean: Option<f32>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub media_type: Option<String>,
    pub status: Option<String>,
    pub num_list_users: Option<u64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub genres: Vec<String>,
}

impl AnimeRecord {
    /// A record with only the required fields set.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            title_ja: None,
            picture_medium: None,
            picture_large: None,
            mean: None,
            rank: None,
            popularity: None,
            media_type: None,
            status: None,
            num_list_users: None,
            start_date: None,
            end_date: None,
            genres: Vec::new(),
        }
    }

    /// Localized title if present, else the default title.
    pub fn display_title(&self) -> &str {
        self.title_ja
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.title)
    }

    /// Higher resolution picture first.
    pub fn best_picture(&self) -> Option<&str> {
        self.picture_large
            .as_deref()
            .or(self.picture_medium.as_deref())
    }

    /// Lower resolution picture first, for grids.
    pub fn grid_picture(&self) -> Option<&str> {
        self.picture_medium
            .as_deref()
            .or(self.picture_large.as_deref())
    }
}

/// Supplementary data for one title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetails {
    pub pictures: Vec<Picture>,
    pub recommendations: Vec<Recommendation>,
    pub related: Vec<RelatedAnime>,
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    pub medium: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub record: AnimeRecord,
    pub num_recommendations: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedAnime {
    pub record: AnimeRecord,
    pub relation_type: String,
    pub relation_type_formatted: String,
}

/// Community list statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub watching: u64,
    pub completed: u64,
    pub on_hold: u64,
    pub dropped: u64,
    pub plan_to_watch: u64,
    pub num_list_users: u64,
}

/// A link to an external site, from the enrichment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub name: String,
    pub url: String,
}

/// Ordering requested for a candidate list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    #[default]
    Popularity,
    Score,
    /// Newest start date first.
    Newest,
    /// Oldest start date first.
    Oldest,
}

impl SortMode {
    pub const ALL: &[SortMode] = &[Self::Popularity, Self::Score, Self::Newest, Self::Oldest];

    /// The MAL `sort` query value, or `None` when the server cannot sort this way.
    pub fn to_mal_param(self) -> Option<&'static str> {
        match self {
            Self::Popularity => Some("anime_num_list_users"),
            Self::Score => Some("anime_score"),
            Self::Newest | Self::Oldest => None,
        }
    }

    /// Whether this order is computed on the client from data already held.
    pub fn is_client_side(self) -> bool {
        self.to_mal_param().is_none()
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "popularity" | "anime_num_list_users" => Some(Self::Popularity),
            "score" | "anime_score" => Some(Self::Score),
            "newest" | "start_date_desc" => Some(Self::Newest),
            "oldest" | "start_date_asc" => Some(Self::Oldest),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Popularity => "popularity",
            Self::Score => "score",
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anime season (quarter of the year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimeSeason {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl AnimeSeason {
    pub const ALL: &[AnimeSeason] = &[Self::Winter, Self::Spring, Self::Summer, Self::Fall];

    /// Lowercase name used in MAL URLs and tags.
    pub fn to_mal_str(self) -> &'static str {
        match self {
            Self::Winter => "winter",
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
        }
    }

    pub fn from_mal_str(s: &str) -> Option<Self> {
        match s {
            "winter" => Some(Self::Winter),
            "spring" => Some(Self::Spring),
            "summer" => Some(Self::Summer),
            "fall" => Some(Self::Fall),
            _ => None,
        }
    }

    /// Map a month (1-12) to its 3-month bucket.
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            1..=3 => Some(Self::Winter),
            4..=6 => Some(Self::Spring),
            7..=9 => Some(Self::Summer),
            10..=12 => Some(Self::Fall),
            _ => None,
        }
    }

    /// Determine the current anime season from the current month.
    pub fn current() -> Self {
        let month = chrono::Local::now().month();
        Self::from_month(month).unwrap_or(Self::Winter)
    }

    /// Japanese single-character season name.
    pub fn to_ja_str(self) -> &'static str {
        match self {
            Self::Winter => "冬",
            Self::Spring => "春",
            Self::Summer => "夏",
            Self::Fall => "秋",
        }
    }
}

impl std::fmt::Display for AnimeSeason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Winter => write!(f, "Winter"),
            Self::Spring => write!(f, "Spring"),
            Self::Summer => write!(f, "Summer"),
            Self::Fall => write!(f, "Fall"),
        }
    }
}
