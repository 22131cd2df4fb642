//! File names, tags and period labels derived from a record.

use std::sync::LazyLock;

use animelog_api::{AnimeRecord, AnimeSeason};
use regex::Regex;

use crate::config::Locale;

static FILE_UNSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static TAG_UNSAFE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());

/// Strip characters the host file system rejects and trim whitespace.
pub fn sanitize_file_name(name: &str) -> String {
    FILE_UNSAFE_RE.replace_all(name, "").trim().to_string()
}

/// Whitespace runs become `_`; anything outside `[A-Za-z0-9_]` is dropped.
pub fn sanitize_tag(name: &str) -> String {
    let underscored = WHITESPACE_RE.replace_all(name, "_");
    TAG_UNSAFE_RE.replace_all(&underscored, "").into_owned()
}

/// Year component of a start date, or `"unknown"`.
pub fn year_component(start_date: Option<&str>) -> &str {
    start_date
        .and_then(|d| d.split('-').next())
        .filter(|y| !y.is_empty())
        .unwrap_or("unknown")
}

/// Period of a start date, from its month component.
pub fn period_of(start_date: Option<&str>) -> Option<AnimeSeason> {
    let month: u32 = start_date?.split('-').nth(1)?.trim().parse().ok()?;
    AnimeSeason::from_month(month)
}

/// Canonical note file name (without directory): `{id}_{slug}.md`.
pub fn note_file_name(record: &AnimeRecord) -> String {
    format!("{}_{}.md", record.id, sanitize_file_name(record.display_title()))
}

/// Prefix every note for `anime_id` starts with.
pub fn note_prefix(anime_id: u64) -> String {
    format!("{anime_id}_")
}

/// Tag set for a note; the base tag always comes first.
pub fn note_tags(record: &AnimeRecord, base_tag: &str) -> Vec<String> {
    let start = record.start_date.as_deref();
    let year = year_component(start);

    let mut tags = vec![base_tag.to_string(), format!("{base_tag}_{year}")];
    if let Some(season) = period_of(start) {
        tags.push(format!("{base_tag}_{year}_{}", season.to_mal_str()));
    }
    for genre in &record.genres {
        let tag = sanitize_tag(genre);
        if !tag.is_empty() {
            tags.push(format!("{base_tag}_{tag}"));
        }
    }
    tags
}

/// Human-readable period label, e.g. `2009年 春` or `2009 Spring`.
///
/// `None` unless the start date carries both a year and a month.
pub fn period_label(start_date: Option<&str>, locale: Locale) -> Option<String> {
    let season = period_of(start_date)?;
    let year = year_component(start_date);
    Some(match locale {
        Locale::Ja => format!("{year}年 {}", season.to_ja_str()),
        Locale::En => format!("{year} {season}"),
    })
}

/// Heading shown above a candidate grid.
pub fn grid_heading(year: u32, season: Option<AnimeSeason>, locale: Locale) -> String {
    match (locale, season) {
        (Locale::Ja, Some(s)) => format!("{year}年 {}アニメ", s.to_ja_str()),
        (Locale::Ja, None) => format!("{year}年 アニメ"),
        (Locale::En, Some(s)) => format!("{s} {year} anime"),
        (Locale::En, None) => format!("{year} anime"),
    }
}
