//! Command-line arguments.

use std::path::PathBuf;

use animelog_api::{AnimeSeason, SortMode};
use animelog_core::WatchStatus;
use clap::{Parser, Subcommand};

/// Keep anime notes in a markdown vault
#[derive(Parser)]
#[command(name = "animelog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the user config, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Vault root, overriding `[vault] root`
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Print note paths instead of opening them
    #[arg(long, global = true)]
    pub no_open: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pick a title from one period (or a whole year) and open its note
    #[command(alias = "b")]
    Browse {
        /// Year, defaults to the current year
        #[arg(long)]
        year: Option<u32>,

        /// winter, spring, summer, fall or all; defaults to the current period
        #[arg(long, value_parser = parse_season)]
        season: Option<SeasonArg>,

        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortMode>,
    },

    /// Pick a title from search results and open its note
    #[command(alias = "s")]
    Search {
        #[arg(required = true)]
        query: Vec<String>,

        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortMode>,
    },

    /// Open the note for a MAL id, creating it if needed
    #[command(alias = "o")]
    Open { mal_id: u64 },

    /// Set the watch status recorded in a note
    Status {
        /// Note path in the vault, or a MAL id
        note: String,

        /// plan_to_watch, watching, completed, on_hold or dropped
        #[arg(value_parser = parse_status)]
        status: WatchStatus,
    },

    /// Show the status panel of a note
    #[command(alias = "i")]
    Show {
        /// Note path in the vault, or a MAL id
        note: String,

        /// Open a recommended or related title listed in the panel
        #[arg(long, value_name = "MAL_ID")]
        activate: Option<u64>,
    },

    /// Delete thumbnails that no note refers to
    Gc,
}

/// `--season` value; `All` aggregates the whole year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonArg {
    One(AnimeSeason),
    All,
}

impl SeasonArg {
    pub fn season(self) -> Option<AnimeSeason> {
        match self {
            Self::One(s) => Some(s),
            Self::All => None,
        }
    }
}

fn parse_season(s: &str) -> Result<SeasonArg, String> {
    let s = s.trim().to_lowercase();
    if s == "all" {
        return Ok(SeasonArg::All);
    }
    AnimeSeason::from_mal_str(&s)
        .map(SeasonArg::One)
        .ok_or_else(|| format!("unknown season '{s}'"))
}

fn parse_sort(s: &str) -> Result<SortMode, String> {
    SortMode::from_str_opt(s.trim()).ok_or_else(|| format!("unknown sort '{s}'"))
}

fn parse_status(s: &str) -> Result<WatchStatus, String> {
    WatchStatus::from_block_str(s.trim()).ok_or_else(|| format!("unknown status '{s}'"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_browse_args() {
        let cli = Cli::try_parse_from([
            "animelog", "--vault", "/tmp/v", "browse", "--year", "2009", "--season", "all",
            "--sort", "newest",
        ])
        .unwrap();
        assert_eq!(cli.vault, Some(PathBuf::from("/tmp/v")));
        let Commands::Browse { year, season, sort } = cli.command else {
            panic!("expected browse");
        };
        assert_eq!(year, Some(2009));
        assert_eq!(season, Some(SeasonArg::All));
        assert_eq!(sort, Some(SortMode::Newest));
    }

    #[test]
    fn test_status_args() {
        let cli = Cli::try_parse_from(["animelog", "status", "5114", "on_hold"]).unwrap();
        let Commands::Status { note, status } = cli.command else {
            panic!("expected status");
        };
        assert_eq!(note, "5114");
        assert_eq!(status, WatchStatus::OnHold);

        assert!(Cli::try_parse_from(["animelog", "status", "5114", "binge"]).is_err());
        assert!(Cli::try_parse_from(["animelog", "browse", "--season", "monsoon"]).is_err());
    }

    #[test]
    fn test_show_args() {
        let cli = Cli::try_parse_from(["animelog", "show", "5114", "--activate", "121"]).unwrap();
        let Commands::Show { note, activate } = cli.command else {
            panic!("expected show");
        };
        assert_eq!(note, "5114");
        assert_eq!(activate, Some(121));

        let cli = Cli::try_parse_from(["animelog", "i", "notes/a.md"]).unwrap();
        assert!(matches!(cli.command, Commands::Show { activate: None, .. }));
    }
}
