//! Client-side ordering of candidate lists.
//!
//! All orders use a stable sort so titles with equal keys keep the order the
//! server returned them in.

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::traits::{AnimeRecord, SortMode};

/// Parse an ISO partial date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
///
/// Missing components default to the first month/day.
pub fn parse_partial_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.trim().splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(m) => m.parse().ok()?,
        None => 1,
    };
    let day: u32 = match parts.next() {
        Some(d) => d.get(..2).unwrap_or(d).parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Sort key for a start date; unknown dates sort as earliest.
fn start_key(record: &AnimeRecord) -> Option<NaiveDate> {
    record.start_date.as_deref().and_then(parse_partial_date)
}

fn by_start_date(a: &AnimeRecord, b: &AnimeRecord) -> Ordering {
    start_key(a).cmp(&start_key(b))
}

fn by_f32_desc(a: f32, b: f32) -> Ordering {
    b.total_cmp(&a)
}

/// Order a list with the comparator for `sort`.
///
/// Date modes compare parsed start dates. Popularity and score compare
/// list-user count and mean score descending, with missing values as zero.
pub fn sort_records(records: &mut [AnimeRecord], sort: SortMode) {
    match sort {
        SortMode::Popularity => records.sort_by(|a, b| {
            b.num_list_users
                .unwrap_or(0)
                .cmp(&a.num_list_users.unwrap_or(0))
        }),
        SortMode::Score => {
            records.sort_by(|a, b| by_f32_desc(a.mean.unwrap_or(0.0), b.mean.unwrap_or(0.0)))
        }
        SortMode::Newest => records.sort_by(|a, b| by_start_date(b, a)),
        SortMode::Oldest => records.sort_by(by_start_date),
    }
}

/// Apply only the orders the server cannot produce.
///
/// Used for single-period fetches, where popularity and score already come
/// sorted from the catalog.
pub fn sort_client_side(records: &mut [AnimeRecord], sort: SortMode) {
    if sort.is_client_side() {
        sort_records(records, sort);
    }
}
