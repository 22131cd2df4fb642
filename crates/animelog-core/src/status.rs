//! Status-sync engine: keeps the status line of a note's status block in
//! step with the status control.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::block::{BlockDocument, BlockEdit};
use crate::error::AnimelogError;
use crate::models::WatchStatus;
use crate::vault::Vault;

static STATUS_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^status:[^\r\n]*").unwrap());

/// What a status change did to the note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The note already had this status; nothing was written.
    Unchanged,
    Updated,
}

/// Parsed contents of a status block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockParams {
    pub mal_id: Option<u64>,
    pub status: WatchStatus,
}

#[derive(Debug, Default, Deserialize)]
struct RawParams {
    mal_id: Option<u64>,
    status: Option<String>,
}

/// Parse a status block body as YAML.
///
/// An empty body yields defaults. An unknown status value falls back to the
/// default status.
pub fn parse_block(body: &str) -> Result<BlockParams, AnimelogError> {
    let raw: RawParams = if body.trim().is_empty() {
        RawParams::default()
    } else {
        serde_yaml::from_str(body)
            .map_err(|e| AnimelogError::Parse(format!("status block: {e}")))?
    };

    let status = match raw.status.as_deref() {
        None => WatchStatus::default(),
        Some(s) => WatchStatus::from_block_str(s.trim()).unwrap_or_else(|| {
            tracing::warn!(status = s, "Unknown status in block, using default");
            WatchStatus::default()
        }),
    };

    Ok(BlockParams {
        mal_id: raw.mal_id,
        status,
    })
}

/// Render a status block body.
pub fn render_block(mal_id: u64, status: WatchStatus) -> String {
    format!("mal_id: {mal_id}\nstatus: {}", status.as_block_str())
}

/// Set the status line of a block body, appending one if absent.
pub fn with_status(body: &str, status: WatchStatus) -> String {
    let line = format!("status: {}", status.as_block_str());
    if STATUS_LINE_RE.is_match(body) {
        STATUS_LINE_RE.replacen(body, 1, line.as_str()).into_owned()
    } else if body.is_empty() {
        line
    } else {
        format!("{body}\n{line}")
    }
}

/// Apply `status` to the first status block of `text`.
pub fn apply_status(text: &str, language: &str, status: WatchStatus) -> BlockEdit {
    BlockDocument::new(text, language).set_block(|body| with_status(body, status))
}

/// Rewrite the status of the note at `path`, writing only when the text changes.
///
/// Only the first status block is touched. A note without one is reported as
/// [`AnimelogError::MissingStatusBlock`]; read and write failures propagate.
pub async fn sync_status<V: Vault>(
    vault: &V,
    path: &str,
    language: &str,
    status: WatchStatus,
) -> Result<SyncOutcome, AnimelogError> {
    let text = vault.read(path).await?;

    let doc = BlockDocument::new(&text, language);
    let count = doc.blocks().len();
    if count > 1 {
        tracing::warn!(path, count, "Multiple status blocks, updating the first");
    }

    match apply_status(&text, language, status) {
        BlockEdit::Missing => Err(AnimelogError::MissingStatusBlock(path.to_string())),
        BlockEdit::Unchanged => {
            tracing::debug!(path, %status, "Status unchanged");
            Ok(SyncOutcome::Unchanged)
        }
        BlockEdit::Changed(new_text) => {
            vault.modify(path, &new_text).await?;
            tracing::info!(path, status = status.as_block_str(), "Updated status");
            Ok(SyncOutcome::Updated)
        }
    }
}
