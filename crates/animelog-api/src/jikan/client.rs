use reqwest::Client;

use super::error::JikanError;
use super::types::{JikanAnimeFull, JikanResponse};
use crate::traits::{ExternalLink, LinkSource, Skipped};

pub const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";

/// Jikan v4 client, used only for optional enrichment.
#[derive(Clone)]
pub struct JikanClient {
    base_url: String,
    http: Client,
}

impl Default for JikanClient {
    fn default() -> Self {
        Self::new()
    }
}

impl JikanClient {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn get_full(&self, mal_id: u64) -> Result<JikanAnimeFull, JikanError> {
        let url = format!("{}/anime/{mal_id}/full", self.base_url);
        let resp = self.http.get(&url).send().await?;

        if !resp.status().is_success() {
            return Err(JikanError::Api {
                status: resp.status().as_u16(),
            });
        }

        let body: JikanResponse<JikanAnimeFull> = resp
            .json()
            .await
            .map_err(|e| JikanError::Parse(e.to_string()))?;
        Ok(body.data)
    }
}

impl LinkSource for JikanClient {
    /// External links for a title.
    ///
    /// Any failure is logged and reported as [`Skipped`]; the links are
    /// enrichment and must never abort the caller.
    async fn fetch_external_links(&self, mal_id: u64) -> Result<Vec<ExternalLink>, Skipped> {
        match self.get_full(mal_id).await {
            Ok(full) => Ok(full.external.into_iter().map(Into::into).collect()),
            Err(e) => {
                tracing::warn!(mal_id, error = %e, "Failed to fetch external links from Jikan");
                Err(Skipped::new(e.to_string()))
            }
        }
    }
}
