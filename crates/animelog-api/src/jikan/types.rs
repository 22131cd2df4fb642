use serde::Deserialize;

use crate::traits::ExternalLink;

#[derive(Debug, Deserialize)]
pub struct JikanResponse<T> {
    pub data: T,
}

/// The slice of `GET /anime/{id}/full` this crate reads.
#[derive(Debug, Deserialize)]
pub struct JikanAnimeFull {
    #[allow(dead_code)]
    pub mal_id: u64,
    #[serde(default)]
    pub external: Vec<JikanExternal>,
}

#[derive(Debug, Deserialize)]
pub struct JikanExternal {
    pub name: String,
    pub url: String,
}

impl From<JikanExternal> for ExternalLink {
    fn from(e: JikanExternal) -> Self {
        ExternalLink {
            name: e.name,
            url: e.url,
        }
    }
}
