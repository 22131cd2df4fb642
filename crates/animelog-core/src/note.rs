//! Note synthesis: find, create and open the note for an anime.

use std::collections::HashSet;

use animelog_api::AnimeRecord;

use crate::config::{AppConfig, Locale};
use crate::error::{AnimelogError, VaultError};
use crate::frontmatter::NoteFrontmatter;
use crate::models::WatchStatus;
use crate::naming::{note_file_name, note_prefix, note_tags, period_label};
use crate::notify::Notifier;
use crate::status::{self, render_block, SyncOutcome};
use crate::thumbnail::{acquire_thumbnail, thumbnail_id, ImageFetcher};
use crate::vault::{normalize_path, DocumentRef, Vault};

/// Where notes go and how they look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteLayout {
    pub notes_dir: String,
    pub attachments_dir: String,
    pub base_tag: String,
    pub block_language: String,
    pub locale: Locale,
    pub thumbnail_width: u32,
}

impl NoteLayout {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            notes_dir: normalize_path(&config.vault.notes_dir),
            attachments_dir: normalize_path(&config.vault.attachments_dir),
            base_tag: config.notes.base_tag.clone(),
            block_language: config.notes.block_language.clone(),
            locale: config.notes.locale,
            thumbnail_width: config.notes.thumbnail_width,
        }
    }
}

impl Default for NoteLayout {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Outcome of find-or-create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub note: DocumentRef,
    pub created: bool,
}

/// Compose the full text of a new note.
pub fn compose_note(record: &AnimeRecord, layout: &NoteLayout, thumbnail: Option<&str>) -> String {
    let title = record.display_title();
    let frontmatter = NoteFrontmatter {
        mal_id: Some(record.id),
        title: Some(title.to_string()),
        year_season: period_label(record.start_date.as_deref(), layout.locale),
        tags: note_tags(record, &layout.base_tag),
    };

    let mut out = frontmatter.render();
    out.push('\n');
    if let Some(src) = thumbnail {
        out.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" width=\"{}\" />\n\n",
            html_escape::encode_double_quoted_attribute(src),
            html_escape::encode_double_quoted_attribute(title),
            layout.thumbnail_width
        ));
    }
    out.push_str(&format!("# {title}\n\n"));
    out.push_str(&format!(
        "```{}\n{}\n```\n",
        layout.block_language,
        render_block(record.id, WatchStatus::default())
    ));
    out
}

/// Leading identifier of a note basename (`5114_Title` -> 5114).
fn note_id(basename: &str) -> Option<u64> {
    basename.split_once('_')?.0.parse().ok()
}

/// Creates and locates notes in a vault.
pub struct NoteService<V, F, N> {
    vault: V,
    fetcher: F,
    notifier: N,
    layout: NoteLayout,
}

impl<V, F, N> NoteService<V, F, N>
where
    V: Vault,
    F: ImageFetcher,
    N: Notifier,
{
    pub fn new(vault: V, fetcher: F, notifier: N, layout: NoteLayout) -> Self {
        Self {
            vault,
            fetcher,
            notifier,
            layout,
        }
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn layout(&self) -> &NoteLayout {
        &self.layout
    }

    /// Canonical vault path for a record's note.
    pub fn note_path(&self, record: &AnimeRecord) -> String {
        normalize_path(&format!("{}/{}", self.layout.notes_dir, note_file_name(record)))
    }

    /// First note (by path) whose name starts with `{anime_id}_`.
    pub async fn find_note(&self, anime_id: u64) -> Result<Option<DocumentRef>, AnimelogError> {
        let prefix = note_prefix(anime_id);
        let mut docs = self.vault.markdown_documents().await?;
        docs.sort();
        Ok(docs.into_iter().find(|d| d.basename().starts_with(&prefix)))
    }

    /// Create the note for `record`.
    ///
    /// The thumbnail is optional and never aborts creation. A path collision
    /// surfaces as [`AnimelogError::WriteConflict`]. Thumbnail garbage
    /// collection runs afterwards and only logs its failures.
    pub async fn create_note(&self, record: &AnimeRecord) -> Result<DocumentRef, AnimelogError> {
        self.vault.ensure_dir(&self.layout.notes_dir).await?;

        let thumbnail = match record.best_picture() {
            Some(url) => acquire_thumbnail(
                &self.vault,
                &self.fetcher,
                &self.notifier,
                &self.layout.attachments_dir,
                record.id,
                url,
            )
            .await
            .ok(),
            None => None,
        };

        let path = self.note_path(record);
        let content = compose_note(record, &self.layout, thumbnail.as_deref());

        match self.vault.create(&path, &content).await {
            Ok(()) => {}
            Err(VaultError::AlreadyExists(p)) => return Err(AnimelogError::WriteConflict(p)),
            Err(e) => return Err(e.into()),
        }
        tracing::info!(anime_id = record.id, path = %path, "Created note");

        if let Err(e) = self.collect_garbage().await {
            tracing::warn!(error = %e, "Thumbnail garbage collection failed");
        }

        Ok(DocumentRef::new(path))
    }

    /// Show a note in the host's active view; failures are only logged.
    pub async fn open_note(&self, note: &DocumentRef) {
        if let Err(e) = self.vault.open(&note.path).await {
            tracing::warn!(path = %note.path, error = %e, "Failed to open note");
        }
    }

    /// Resolve `record` to its note, creating the note if none exists.
    ///
    /// Lookup and creation are not atomic; two concurrent calls for the same
    /// identifier can both create.
    pub async fn find_or_create(&self, record: &AnimeRecord) -> Result<Resolved, AnimelogError> {
        if let Some(note) = self.find_note(record.id).await? {
            return Ok(Resolved {
                note,
                created: false,
            });
        }
        let note = self.create_note(record).await?;
        Ok(Resolved {
            note,
            created: true,
        })
    }

    /// Find-or-create, then open the note.
    pub async fn select(&self, record: &AnimeRecord) -> Result<Resolved, AnimelogError> {
        let resolved = self.find_or_create(record).await?;
        self.open_note(&resolved.note).await;
        Ok(resolved)
    }

    /// Delete thumbnails whose identifier has no note. Returns deleted paths.
    pub async fn collect_garbage(&self) -> Result<Vec<String>, AnimelogError> {
        let live: HashSet<u64> = self
            .vault
            .markdown_documents()
            .await?
            .iter()
            .filter_map(|d| note_id(d.basename()))
            .collect();

        let mut deleted = Vec::new();
        for path in self.vault.list_files(&self.layout.attachments_dir).await? {
            let Some(id) = thumbnail_id(&path) else {
                continue;
            };
            if live.contains(&id) {
                continue;
            }
            match self.vault.delete(&path).await {
                Ok(()) => {
                    tracing::info!(anime_id = id, path = %path, "Deleted orphaned thumbnail");
                    deleted.push(path);
                }
                Err(e) => tracing::warn!(path = %path, error = %e, "Failed to delete thumbnail"),
            }
        }
        Ok(deleted)
    }

    /// Change the status recorded in a note.
    pub async fn set_status(
        &self,
        path: &str,
        status: WatchStatus,
    ) -> Result<SyncOutcome, AnimelogError> {
        status::sync_status(&self.vault, path, &self.layout.block_language, status).await
    }
}
