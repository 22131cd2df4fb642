use serde::{Deserialize, Deserializer};

use crate::traits::{AnimeDetails, AnimeRecord, Picture, Recommendation, RelatedAnime, Statistics};

// ── Season / search responses ───────────────────────────────────

/// List response shared by the seasonal and search endpoints.
#[derive(Debug, Deserialize)]
pub struct MalListResponse {
    pub data: Vec<MalNodeWrapper>,
    #[serde(default)]
    #[allow(dead_code)]
    pub paging: Option<MalPaging>,
}

#[derive(Debug, Deserialize)]
pub struct MalNodeWrapper {
    pub node: MalAnimeNode,
}

#[derive(Debug, Deserialize)]
pub struct MalPaging {
    #[allow(dead_code)]
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MalAnimeNode {
    pub id: u64,
    pub title: String,
    pub main_picture: Option<MalPicture>,
    pub alternative_titles: Option<MalAlternativeTitles>,
    pub mean: Option<f32>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub media_type: Option<String>,
    pub status: Option<String>,
    pub num_list_users: Option<u64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub genres: Option<Vec<MalGenre>>,
}

#[derive(Debug, Deserialize)]
pub struct MalPicture {
    pub medium: Option<String>,
    pub large: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MalAlternativeTitles {
    pub en: Option<String>,
    pub ja: Option<String>,
    #[allow(dead_code)]
    pub synonyms: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MalGenre {
    #[allow(dead_code)]
    pub id: u64,
    pub name: String,
}

// ── Detail response ─────────────────────────────────────────────

/// Sub-resources of `GET /anime/{id}`; every key may be absent.
#[derive(Debug, Deserialize)]
pub struct MalDetailsResponse {
    #[serde(default)]
    pub pictures: Vec<MalPicture>,
    #[serde(default)]
    pub recommendations: Vec<MalRecommendation>,
    #[serde(default)]
    pub related_anime: Vec<MalRelatedAnime>,
    pub statistics: Option<MalStatistics>,
}

#[derive(Debug, Deserialize)]
pub struct MalRecommendation {
    pub node: MalAnimeNode,
    #[serde(default)]
    pub num_recommendations: u32,
}

#[derive(Debug, Deserialize)]
pub struct MalRelatedAnime {
    pub node: MalAnimeNode,
    #[serde(default)]
    pub relation_type: String,
    #[serde(default)]
    pub relation_type_formatted: String,
}

#[derive(Debug, Deserialize)]
pub struct MalStatistics {
    pub status: MalStatusCounts,
    #[serde(deserialize_with = "count", default)]
    pub num_list_users: u64,
}

/// MAL reports these counts as strings.
#[derive(Debug, Deserialize)]
pub struct MalStatusCounts {
    #[serde(deserialize_with = "count", default)]
    pub watching: u64,
    #[serde(deserialize_with = "count", default)]
    pub completed: u64,
    #[serde(deserialize_with = "count", default)]
    pub on_hold: u64,
    #[serde(deserialize_with = "count", default)]
    pub dropped: u64,
    #[serde(deserialize_with = "count", default)]
    pub plan_to_watch: u64,
}

/// Accept a count encoded either as a JSON number or a numeric string.
fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

// ── Conversions to shared trait types ───────────────────────────

impl MalAnimeNode {
    pub fn into_record(self) -> AnimeRecord {
        let (picture_medium, picture_large) = self
            .main_picture
            .map(|p| (p.medium, p.large))
            .unwrap_or_default();
        AnimeRecord {
            id: self.id,
            title: self.title,
            title_ja: self.alternative_titles.and_then(|alt| alt.ja),
            picture_medium,
            picture_large,
            mean: self.mean,
            rank: self.rank,
            popularity: self.popularity,
            media_type: self.media_type,
            status: self.status,
            num_list_users: self.num_list_users,
            start_date: self.start_date,
            end_date: self.end_date,
            genres: self
                .genres
                .map(|g| g.into_iter().map(|x| x.name).collect())
                .unwrap_or_default(),
        }
    }
}

impl MalDetailsResponse {
    pub fn into_details(self) -> AnimeDetails {
        AnimeDetails {
            pictures: self
                .pictures
                .into_iter()
                .map(|p| Picture {
                    medium: p.medium,
                    large: p.large,
                })
                .collect(),
            recommendations: self
                .recommendations
                .into_iter()
                .map(|r| Recommendation {
                    record: r.node.into_record(),
                    num_recommendations: r.num_recommendations,
                })
                .collect(),
            related: self
                .related_anime
                .into_iter()
                .map(|r| RelatedAnime {
                    record: r.node.into_record(),
                    relation_type: r.relation_type,
                    relation_type_formatted: r.relation_type_formatted,
                })
                .collect(),
            statistics: self.statistics.map(|s| Statistics {
                watching: s.status.watching,
                completed: s.status.completed,
                on_hold: s.status.on_hold,
                dropped: s.status.dropped,
                plan_to_watch: s.status.plan_to_watch,
                num_list_users: s.num_list_users,
            }),
        }
    }
}
