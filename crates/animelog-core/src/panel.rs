//! Status panel: what a note's status block renders as.

use animelog_api::{
    AnimeDetails, AnimeRecord, CatalogService, ExternalLink, LinkSource, Skipped,
};

use crate::block::BlockDocument;
use crate::error::AnimelogError;
use crate::frontmatter::parse_frontmatter;
use crate::models::WatchStatus;
use crate::note::{NoteService, Resolved};
use crate::notify::Notifier;
use crate::status::parse_block;
use crate::thumbnail::ImageFetcher;
use crate::vault::{DocumentRef, Vault};

pub const DETAILS_FAILED: &str = "Failed to load details.";

/// One entry of the status dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusOption {
    pub status: WatchStatus,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Details {
    Loaded(AnimeDetails),
    /// Shown as [`DETAILS_FAILED`]; the rest of the panel still renders.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusPanel {
    pub note: DocumentRef,
    pub mal_id: u64,
    pub status: WatchStatus,
    pub details: Details,
    /// Omitted from the panel when skipped.
    pub external_links: Result<Vec<ExternalLink>, Skipped>,
}

impl StatusPanel {
    pub fn options(&self) -> Vec<StatusOption> {
        WatchStatus::ALL
            .iter()
            .map(|&status| StatusOption {
                status,
                label: status.as_str(),
                selected: status == self.status,
            })
            .collect()
    }

    /// Recommendations then related titles, each of which can be opened.
    pub fn activatable(&self) -> Vec<&AnimeRecord> {
        match &self.details {
            Details::Loaded(d) => d
                .recommendations
                .iter()
                .map(|r| &r.record)
                .chain(d.related.iter().map(|r| &r.record))
                .collect(),
            Details::Failed => Vec::new(),
        }
    }

    pub fn find_activatable(&self, anime_id: u64) -> Option<&AnimeRecord> {
        self.activatable().into_iter().find(|r| r.id == anime_id)
    }
}

/// What to render in place of the block.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelView {
    Ready(Box<StatusPanel>),
    /// Malformed block or front-matter; rendered inline.
    ParseError(String),
    /// No identifier in the note; rendered inline with a retry action.
    Unresolved(String),
}

impl PanelView {
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Unresolved(_))
    }
}

/// Build the panel for the note at `path`.
///
/// Only a failed read or a note without a status block is an error; parse and
/// lookup problems become inline views, and details or links degrade on their
/// own.
pub async fn load_panel<V, C, L>(
    vault: &V,
    catalog: &C,
    links: Option<&L>,
    language: &str,
    path: &str,
) -> Result<PanelView, AnimelogError>
where
    V: Vault,
    C: CatalogService,
    L: LinkSource,
{
    let text = vault.read(path).await?;
    let Some(block) = BlockDocument::new(&text, language).get_block() else {
        return Err(AnimelogError::MissingStatusBlock(path.to_string()));
    };

    let params = match parse_block(block.body) {
        Ok(p) => p,
        Err(e) => return Ok(PanelView::ParseError(e.to_string())),
    };
    let frontmatter = match parse_frontmatter(&text) {
        Ok(fm) => fm,
        Err(e) => return Ok(PanelView::ParseError(e.to_string())),
    };

    let Some(mal_id) = frontmatter.and_then(|fm| fm.mal_id).or(params.mal_id) else {
        tracing::debug!(path, "No mal_id in front-matter or block");
        return Ok(PanelView::Unresolved("MAL ID not found.".into()));
    };

    let details = match catalog.fetch_details(mal_id).await {
        Ok(d) => Details::Loaded(d),
        Err(e) => {
            tracing::warn!(mal_id, error = %e, "Failed to load details");
            Details::Failed
        }
    };

    let external_links = match links {
        Some(source) => source.fetch_external_links(mal_id).await,
        None => Err(Skipped::new("external links disabled")),
    };

    Ok(PanelView::Ready(Box::new(StatusPanel {
        note: DocumentRef::new(path),
        mal_id,
        status: params.status,
        details,
        external_links,
    })))
}

/// Open a recommended or related title, creating its note if needed.
///
/// The partial record is completed with a catalog lookup first so the new
/// note gets period and genre tags; if that lookup fails the partial record
/// is used as is, unless it has no title to name the note by.
pub async fn activate<V, F, N, C>(
    notes: &NoteService<V, F, N>,
    catalog: &C,
    partial: &AnimeRecord,
) -> Result<Resolved, AnimelogError>
where
    V: Vault,
    F: ImageFetcher,
    N: Notifier,
    C: CatalogService,
{
    if let Some(note) = notes.find_note(partial.id).await? {
        notes.open_note(&note).await;
        return Ok(Resolved {
            note,
            created: false,
        });
    }

    let record = match catalog.get_anime(partial.id).await {
        Ok(full) => full,
        Err(e) if partial.title.trim().is_empty() => {
            return Err(AnimelogError::NotFound(format!("anime {}: {e}", partial.id)));
        }
        Err(e) => {
            tracing::warn!(anime_id = partial.id, error = %e, "Failed to fetch full record");
            partial.clone()
        }
    };
    notes.select(&record).await
}
