use reqwest::Client;
use serde::de::DeserializeOwned;

use super::error::MalError;
use super::types::{MalAnimeNode, MalDetailsResponse, MalListResponse};
use crate::sort::{sort_client_side, sort_records};
use crate::traits::{AnimeDetails, AnimeRecord, AnimeSeason, CatalogService, SortMode};

pub const DEFAULT_BASE_URL: &str = "https://api.myanimelist.net/v2";

/// Fields requested for grid candidates and note synthesis.
const ANIME_FIELDS: &str = "alternative_titles,mean,rank,popularity,media_type,status,\
                            start_date,end_date,genres,num_list_users";

/// Sub-resources requested by [`MalClient::fetch_details`].
const DETAIL_FIELDS: &str = "pictures,recommendations{node{alternative_titles}},\
                             related_anime{node{alternative_titles}},statistics";

/// Page size large enough to hold a whole season in one response.
pub const DEFAULT_PAGE_LIMIT: u32 = 500;

/// Page size for free-text search.
const SEARCH_LIMIT: u32 = 100;

/// MyAnimeList API v2 client, authenticated by a static client id.
#[derive(Clone)]
pub struct MalClient {
    client_id: String,
    base_url: String,
    page_limit: u32,
    http: Client,
}

impl MalClient {
    pub fn new(client_id: String) -> Self {
        Self {
            client_id,
            base_url: DEFAULT_BASE_URL.to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_limit(mut self, page_limit: u32) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Check the HTTP response for errors and return the body text on failure.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, MalError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status, "MAL API error");
            Err(MalError::Api {
                status,
                message: body,
            })
        }
    }

    /// Issue a GET against `endpoint` and decode the JSON body.
    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, MalError> {
        if self.client_id.is_empty() {
            return Err(MalError::MissingClientId);
        }

        let url = format!("{}{endpoint}", self.base_url);
        tracing::debug!(%url, "MAL request");
        let resp = self
            .http
            .get(&url)
            .header("X-MAL-CLIENT-ID", &self.client_id)
            .query(query)
            .send()
            .await?;

        let resp = Self::check_response(resp).await?;
        resp.json()
            .await
            .map_err(|e| MalError::Parse(e.to_string()))
    }
}

/// Query parameters for the season endpoint.
///
/// Date orders have no server-side equivalent, so `sort` is left out and the
/// response is ordered after the fetch.
fn season_query(sort: SortMode, limit: u32) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("limit", limit.to_string()),
        ("fields", ANIME_FIELDS.to_string()),
    ];
    if let Some(param) = sort.to_mal_param() {
        query.push(("sort", param.to_string()));
    }
    query
}

impl CatalogService for MalClient {
    type Error = MalError;

    async fn fetch_by_period(
        &self,
        year: u32,
        season: AnimeSeason,
        sort: SortMode,
    ) -> Result<Vec<AnimeRecord>, MalError> {
        let endpoint = format!("/anime/season/{year}/{}", season.to_mal_str());
        let query = season_query(sort, self.page_limit);

        let page: MalListResponse = self.get(&endpoint, &query).await?;
        let mut records: Vec<AnimeRecord> =
            page.data.into_iter().map(|n| n.node.into_record()).collect();
        sort_client_side(&mut records, sort);

        tracing::info!(year, %season, count = records.len(), "Fetched seasonal anime");
        Ok(records)
    }

    async fn search(&self, query: &str, sort: SortMode) -> Result<Vec<AnimeRecord>, MalError> {
        let params = [
            ("q", query.to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
            ("fields", ANIME_FIELDS.to_string()),
        ];
        let page: MalListResponse = self.get("/anime", &params).await?;
        let mut records: Vec<AnimeRecord> =
            page.data.into_iter().map(|n| n.node.into_record()).collect();
        sort_records(&mut records, sort);
        Ok(records)
    }

    async fn get_anime(&self, anime_id: u64) -> Result<AnimeRecord, MalError> {
        let node: MalAnimeNode = self
            .get(
                &format!("/anime/{anime_id}"),
                &[("fields", ANIME_FIELDS.to_string())],
            )
            .await?;
        Ok(node.into_record())
    }

    async fn fetch_details(&self, anime_id: u64) -> Result<AnimeDetails, MalError> {
        let resp: MalDetailsResponse = self
            .get(
                &format!("/anime/{anime_id}"),
                &[("fields", DETAIL_FIELDS.to_string())],
            )
            .await?;
        Ok(resp.into_details())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::stub::serve_once;

    const SEASON_BODY: &str = r#"{
        "data": [
            { "node": { "id": 1, "title": "Early", "start_date": "2024-04-02" } },
            { "node": { "id": 2, "title": "Late", "start_date": "2024-04-20" } },
            { "node": { "id": 3, "title": "Undated" } }
        ]
    }"#;

    #[test]
    fn test_season_query_per_sort() {
        for &sort in SortMode::ALL {
            let query = season_query(sort, DEFAULT_PAGE_LIMIT);
            assert_eq!(query[0], ("limit", "500".to_string()));
            let sent = query.iter().find(|(k, _)| *k == "sort").map(|(_, v)| v.as_str());
            assert_eq!(sent, sort.to_mal_param(), "{sort}");
        }
        assert!(season_query(SortMode::Newest, 500)
            .iter()
            .all(|(k, _)| *k != "sort"));
        assert_eq!(
            season_query(SortMode::Score, 500).last().unwrap().1,
            "anime_score"
        );
    }

    #[tokio::test]
    async fn test_fetch_by_period_sorts_dates_locally() {
        let (base_url, request) = serve_once(200, SEASON_BODY).await;
        let client = MalClient::new("id".into()).with_base_url(base_url);

        let records = client
            .fetch_by_period(2024, AnimeSeason::Spring, SortMode::Newest)
            .await
            .unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);

        let line = request.await.unwrap();
        assert!(line.starts_with("GET /anime/season/2024/spring?"), "{line}");
        assert!(line.contains("limit=500"), "{line}");
        assert!(!line.contains("sort="), "{line}");
    }

    #[tokio::test]
    async fn test_fetch_by_period_keeps_server_order() {
        let (base_url, request) = serve_once(200, SEASON_BODY).await;
        let client = MalClient::new("id".into()).with_base_url(base_url);

        let records = client
            .fetch_by_period(2024, AnimeSeason::Spring, SortMode::Popularity)
            .await
            .unwrap();
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let line = request.await.unwrap();
        assert!(line.contains("sort=anime_num_list_users"), "{line}");
    }

    #[tokio::test]
    async fn test_error_status_is_api_error() {
        let (base_url, _request) = serve_once(403, r#"{"error":"forbidden"}"#).await;
        let client = MalClient::new("id".into()).with_base_url(base_url);
        let err = client.get_anime(1).await.unwrap_err();
        assert!(matches!(err, MalError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_missing_client_id_fails_before_network() {
        let client = MalClient::new(String::new()).with_base_url("http://127.0.0.1:9");
        let err = client
            .fetch_by_period(2024, AnimeSeason::Spring, SortMode::Popularity)
            .await
            .unwrap_err();
        assert!(matches!(err, MalError::MissingClientId));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        // Port 9 (discard) is not expected to serve HTTP.
        let client = MalClient::new("id".into()).with_base_url("http://127.0.0.1:9/");
        let err = client.get_anime(1).await.unwrap_err();
        assert!(matches!(err, MalError::Http(_)));
    }
}
