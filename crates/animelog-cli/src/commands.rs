//! Command handlers.

use std::io::{BufRead, Write};

use animelog_api::jikan::JikanClient;
use animelog_api::mal::MalClient;
use animelog_api::{AnimeRecord, AnimeSeason, SortMode};
use animelog_core::config::AppConfig;
use animelog_core::flow::{current_year, CandidateGrid, Query};
use animelog_core::note::{NoteLayout, NoteService};
use animelog_core::notify::Notifier;
use animelog_core::panel::{self, PanelView};
use animelog_core::status::SyncOutcome;
use animelog_core::thumbnail::HttpImageFetcher;
use animelog_core::vault::{DocumentRef, FsVault};
use animelog_core::{AnimelogError, WatchStatus};

use crate::cli::{Commands, SeasonArg};
use crate::render::{grid_prompt, parse_grid_input, render_grid, render_panel, GridInput};

/// Prints notices to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notice(&self, message: &str) {
        tracing::debug!(notice = message);
        eprintln!("{message}");
    }
}

type Notes = NoteService<FsVault, HttpImageFetcher, TerminalNotifier>;

/// Everything a command needs, built once from config.
pub struct App {
    config: AppConfig,
    catalog: MalClient,
    links: Option<JikanClient>,
    notes: Notes,
}

impl App {
    pub fn new(config: AppConfig, open_documents: bool) -> Self {
        let catalog = MalClient::new(config.mal.client_id.clone())
            .with_base_url(&config.mal.base_url)
            .with_page_limit(config.mal.page_limit);
        let links = config
            .jikan
            .enabled
            .then(|| JikanClient::new().with_base_url(&config.jikan.base_url));
        let vault = FsVault::new(&config.vault.root).with_open_documents(open_documents);
        let notes = NoteService::new(
            vault,
            HttpImageFetcher::new(),
            TerminalNotifier,
            NoteLayout::from_config(&config),
        );
        Self {
            config,
            catalog,
            links,
            notes,
        }
    }

    pub async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Browse { year, season, sort } => {
                let query = browse_query(year, season)?;
                self.pick(query, sort).await
            }
            Commands::Search { query, sort } => {
                let query = Query::search(&query.join(" "))?;
                self.pick(query, sort).await
            }
            Commands::Open { mal_id } => self.cmd_open(mal_id).await,
            Commands::Status { note, status } => self.cmd_status(&note, status).await,
            Commands::Show { note, activate } => self.cmd_show(&note, activate).await,
            Commands::Gc => self.cmd_gc().await,
        }
    }

    /// Stage two of the wizard: show the grid until a title is picked.
    async fn pick(&self, query: Query, sort: Option<SortMode>) -> anyhow::Result<()> {
        let sort = sort.unwrap_or(self.config.browse.default_sort);
        let locale = self.config.notes.locale;
        let mut grid = CandidateGrid::load(&self.catalog, query, sort).await?;

        let stdin = std::io::stdin();
        loop {
            print!("{}", render_grid(&grid, locale));
            if grid.is_empty() {
                return Ok(());
            }
            println!("{}", grid_prompt(grid.records().len()));
            std::io::stdout().flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                return Ok(());
            }

            match parse_grid_input(&line) {
                GridInput::Quit => {
                    println!("Cancelled.");
                    return Ok(());
                }
                GridInput::Sort(sort) => {
                    if let Err(e) = grid.change_sort(&self.catalog, sort).await {
                        tracing::warn!(error = %e, "Re-sort failed");
                        println!("Failed to load titles: {e}");
                    }
                }
                GridInput::Invalid => println!("Invalid selection."),
                GridInput::Select(index) => match grid.select(index) {
                    Ok(record) => {
                        let resolved = self.notes.select(&record).await?;
                        report_note(&resolved.note, resolved.created);
                        return Ok(());
                    }
                    Err(unchanged) => {
                        println!("Invalid selection.");
                        grid = unchanged;
                    }
                },
            }
        }
    }

    async fn cmd_open(&self, mal_id: u64) -> anyhow::Result<()> {
        let resolved =
            panel::activate(&self.notes, &self.catalog, &AnimeRecord::new(mal_id, "")).await?;
        report_note(&resolved.note, resolved.created);
        Ok(())
    }

    async fn cmd_status(&self, note: &str, status: WatchStatus) -> anyhow::Result<()> {
        let path = self.resolve_note(note).await?;
        match self.notes.set_status(&path, status).await? {
            SyncOutcome::Updated => println!("{path}: {}", status.as_block_str()),
            SyncOutcome::Unchanged => println!("{path}: already {}", status.as_block_str()),
        }
        Ok(())
    }

    async fn cmd_show(&self, note: &str, activate: Option<u64>) -> anyhow::Result<()> {
        let path = self.resolve_note(note).await?;
        let view = panel::load_panel(
            self.notes.vault(),
            &self.catalog,
            self.links.as_ref(),
            &self.notes.layout().block_language,
            &path,
        )
        .await?;

        let PanelView::Ready(ready) = &view else {
            print!("{}", render_panel(&view));
            return Ok(());
        };
        let Some(anime_id) = activate else {
            print!("{}", render_panel(&view));
            if !ready.activatable().is_empty() {
                println!();
                println!(
                    "Run 'animelog show {note} --activate <MAL_ID>' to open one of these titles."
                );
            }
            return Ok(());
        };

        let partial = ready.find_activatable(anime_id).ok_or_else(|| {
            AnimelogError::NotFound(format!("{anime_id} is not listed in the panel of {path}"))
        })?;
        let resolved = panel::activate(&self.notes, &self.catalog, partial).await?;
        report_note(&resolved.note, resolved.created);
        Ok(())
    }

    async fn cmd_gc(&self) -> anyhow::Result<()> {
        let deleted = self.notes.collect_garbage().await?;
        if deleted.is_empty() {
            println!("No orphaned thumbnails.");
        }
        for path in deleted {
            println!("Deleted {path}");
        }
        Ok(())
    }

    /// A vault path, or a MAL id looked up among existing notes.
    async fn resolve_note(&self, note: &str) -> Result<String, AnimelogError> {
        match note.parse::<u64>() {
            Ok(id) => self
                .notes
                .find_note(id)
                .await?
                .map(|doc| doc.path)
                .ok_or_else(|| AnimelogError::NotFound(format!("no note for MAL id {id}"))),
            Err(_) => Ok(note.to_string()),
        }
    }
}

fn browse_query(year: Option<u32>, season: Option<SeasonArg>) -> Result<Query, AnimelogError> {
    let season = match season {
        Some(arg) => arg.season(),
        None => Some(AnimeSeason::current()),
    };
    Query::period(year.unwrap_or_else(current_year), season)
}

fn report_note(note: &DocumentRef, created: bool) {
    if created {
        println!("Created {}", note.path);
    } else {
        println!("Opened {}", note.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_query_defaults() {
        let query = browse_query(None, None).unwrap();
        assert_eq!(query, Query::default());

        let query = browse_query(Some(2009), Some(SeasonArg::All)).unwrap();
        assert_eq!(
            query,
            Query::Period {
                year: 2009,
                season: None
            }
        );

        assert!(browse_query(Some(1950), None).is_err());
    }
}
