//! Plain-text rendering of the grid and the status panel.

use std::fmt::Write;

use animelog_api::SortMode;
use animelog_core::config::Locale;
use animelog_core::flow::CandidateGrid;
use animelog_core::panel::{Details, PanelView, DETAILS_FAILED};

/// A line typed at the grid prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridInput {
    Quit,
    Sort(SortMode),
    /// Zero-based index.
    Select(usize),
    Invalid,
}

pub fn parse_grid_input(line: &str) -> GridInput {
    let line = line.trim();
    if line.is_empty() || line.eq_ignore_ascii_case("q") {
        return GridInput::Quit;
    }
    if let Some(arg) = line.strip_prefix("s ") {
        return SortMode::from_str_opt(arg.trim()).map_or(GridInput::Invalid, GridInput::Sort);
    }
    match line.parse::<usize>() {
        Ok(n) if n >= 1 => GridInput::Select(n - 1),
        _ => GridInput::Invalid,
    }
}

pub fn render_grid(grid: &CandidateGrid, locale: Locale) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  (sort: {})", grid.heading(locale), grid.sort());
    let _ = writeln!(out, "{:-<60}", "");

    if grid.is_empty() {
        let _ = writeln!(out, "{}", CandidateGrid::empty_message(locale));
        return out;
    }

    for card in grid.cards() {
        match card.badge {
            Some(badge) => {
                let _ = writeln!(out, "[{}] {}  {}", card.index + 1, card.title, badge);
            }
            None => {
                let _ = writeln!(out, "[{}] {}", card.index + 1, card.title);
            }
        }
    }
    out
}

pub fn grid_prompt(len: usize) -> String {
    let sorts: Vec<&str> = SortMode::ALL.iter().map(|s| s.as_str()).collect();
    format!(
        "Enter number (1-{len}), 's <{}>' to re-sort, or 'q' to cancel:",
        sorts.join("|")
    )
}

pub fn render_panel(view: &PanelView) -> String {
    let mut out = String::new();
    let panel = match view {
        PanelView::ParseError(msg) => {
            let _ = writeln!(out, "Error: {msg}");
            return out;
        }
        PanelView::Unresolved(msg) => {
            let _ = writeln!(out, "Error: {msg} (run the command again to retry)");
            return out;
        }
        PanelView::Ready(panel) => panel,
    };

    let _ = writeln!(out, "{}  (MAL {})", panel.note.path, panel.mal_id);
    let _ = writeln!(out);
    let _ = writeln!(out, "Status:");
    for option in panel.options() {
        let mark = if option.selected { "*" } else { " " };
        let _ = writeln!(
            out,
            "  {mark} {:<14} {}",
            option.status.as_block_str(),
            option.label
        );
    }

    match &panel.details {
        Details::Failed => {
            let _ = writeln!(out);
            let _ = writeln!(out, "{DETAILS_FAILED}");
        }
        Details::Loaded(details) => {
            if let Some(stats) = &details.statistics {
                let _ = writeln!(out);
                let _ = writeln!(out, "Statistics:");
                let _ = writeln!(out, "  Watching:      {}", stats.watching);
                let _ = writeln!(out, "  Completed:     {}", stats.completed);
                let _ = writeln!(out, "  On Hold:       {}", stats.on_hold);
                let _ = writeln!(out, "  Dropped:       {}", stats.dropped);
                let _ = writeln!(out, "  Plan to Watch: {}", stats.plan_to_watch);
                let _ = writeln!(out, "  List users:    {}", stats.num_list_users);
            }

            let pictures: Vec<&str> = details
                .pictures
                .iter()
                .filter_map(|p| p.medium.as_deref().or(p.large.as_deref()))
                .collect();
            if !pictures.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Pictures:");
                for url in pictures {
                    let _ = writeln!(out, "  {url}");
                }
            }

            if !details.recommendations.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Recommendations:");
                for rec in &details.recommendations {
                    let _ = writeln!(
                        out,
                        "  {:>6}  {} ({})",
                        rec.record.id,
                        rec.record.display_title(),
                        rec.num_recommendations
                    );
                }
            }

            if !details.related.is_empty() {
                let _ = writeln!(out);
                let _ = writeln!(out, "Related:");
                for rel in &details.related {
                    let _ = writeln!(
                        out,
                        "  {:>6}  {} [{}]",
                        rel.record.id,
                        rel.record.display_title(),
                        rel.relation_type_formatted
                    );
                }
            }
        }
    }

    if let Ok(links) = &panel.external_links {
        if !links.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Links:");
            for link in links {
                let _ = writeln!(out, "  {}: {}", link.name, link.url);
            }
        }
    }
    out
}
