//! Two-stage selection wizard.
//!
//! Stage one produces a [`Query`]; stage two is a [`CandidateGrid`] built from
//! it. Both are plain values handed from one stage to the next, so nothing
//! survives between runs of the wizard.

use std::ops::RangeInclusive;

use animelog_api::sort::sort_records;
use animelog_api::{AnimeRecord, AnimeSeason, CatalogService, SortMode};
use chrono::Datelike;

use crate::config::Locale;
use crate::error::AnimelogError;
use crate::naming::grid_heading;

/// Earliest year offered by stage one.
pub const MIN_YEAR: u32 = 1990;

pub fn current_year() -> u32 {
    chrono::Local::now().year().max(MIN_YEAR as i32) as u32
}

/// Years offered by stage one: 1990 through next year.
pub fn selectable_years() -> RangeInclusive<u32> {
    MIN_YEAR..=current_year() + 1
}

/// Stage-one result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Search(String),
    /// `season: None` aggregates the whole year.
    Period {
        year: u32,
        season: Option<AnimeSeason>,
    },
}

impl Default for Query {
    /// The current year and the period containing the current month.
    fn default() -> Self {
        Self::Period {
            year: current_year(),
            season: Some(AnimeSeason::current()),
        }
    }
}

impl Query {
    pub fn period(year: u32, season: Option<AnimeSeason>) -> Result<Self, AnimelogError> {
        let years = selectable_years();
        if !years.contains(&year) {
            return Err(AnimelogError::InvalidQuery(format!(
                "year {year} outside {}..={}",
                years.start(),
                years.end()
            )));
        }
        Ok(Self::Period { year, season })
    }

    pub fn search(text: &str) -> Result<Self, AnimelogError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AnimelogError::InvalidQuery("empty search".into()));
        }
        Ok(Self::Search(text.to_string()))
    }

    pub fn heading(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::Period { year, season }, _) => grid_heading(*year, *season, locale),
            (Self::Search(q), Locale::Ja) => format!("「{q}」の検索結果"),
            (Self::Search(q), Locale::En) => format!("Results for \"{q}\""),
        }
    }

    async fn fetch<C: CatalogService>(
        &self,
        catalog: &C,
        sort: SortMode,
    ) -> Result<Vec<AnimeRecord>, C::Error> {
        match self {
            Self::Search(q) => catalog.search(q, sort).await,
            Self::Period {
                year,
                season: Some(season),
            } => catalog.fetch_by_period(*year, *season, sort).await,
            Self::Period { year, season: None } => catalog.fetch_by_year(*year, sort).await,
        }
    }
}

/// One grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub index: usize,
    pub title: String,
    /// `#{popularity}` when the record has one.
    pub badge: Option<String>,
    pub picture: Option<String>,
}

/// How a sort change was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resort {
    /// Reordered from the records already held.
    Local,
    /// Fetched again with the new sort.
    Fetched,
}

/// Stage two: the candidate set for one query.
#[derive(Debug, Clone)]
pub struct CandidateGrid {
    query: Query,
    sort: SortMode,
    records: Vec<AnimeRecord>,
}

impl CandidateGrid {
    pub async fn load<C: CatalogService>(
        catalog: &C,
        query: Query,
        sort: SortMode,
    ) -> Result<Self, C::Error> {
        let records = query.fetch(catalog, sort).await?;
        tracing::debug!(?query, %sort, count = records.len(), "Loaded candidates");
        Ok(Self {
            query,
            sort,
            records,
        })
    }

    /// Change the order. Date orders re-sort in place; others fetch again.
    ///
    /// On a failed fetch the grid keeps its previous sort and records.
    pub async fn change_sort<C: CatalogService>(
        &mut self,
        catalog: &C,
        sort: SortMode,
    ) -> Result<Resort, C::Error> {
        if sort.is_client_side() {
            sort_records(&mut self.records, sort);
            self.sort = sort;
            return Ok(Resort::Local);
        }
        self.records = self.query.fetch(catalog, sort).await?;
        self.sort = sort;
        Ok(Resort::Fetched)
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn sort(&self) -> SortMode {
        self.sort
    }

    pub fn records(&self) -> &[AnimeRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn heading(&self, locale: Locale) -> String {
        self.query.heading(locale)
    }

    pub fn empty_message(locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => "該当する作品が見つかりませんでした。",
            Locale::En => "No titles found.",
        }
    }

    pub fn cards(&self) -> Vec<Card> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, r)| Card {
                index,
                title: r.display_title().to_string(),
                badge: r.popularity.map(|p| format!("#{p}")),
                picture: r.grid_picture().map(str::to_string),
            })
            .collect()
    }

    /// Close the flow with the record at `index`; an invalid index hands the
    /// grid back.
    pub fn select(mut self, index: usize) -> Result<AnimeRecord, Self> {
        if index < self.records.len() {
            Ok(self.records.swap_remove(index))
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use animelog_api::AnimeDetails;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("offline")]
    struct Offline;

    /// Catalog returning canned records and counting fetches.
    #[derive(Default)]
    struct FakeCatalog {
        records: Vec<AnimeRecord>,
        fetches: AtomicUsize,
        year_fetches: AtomicUsize,
        offline: bool,
    }

    impl FakeCatalog {
        fn serve(&self, sort: SortMode) -> Result<Vec<AnimeRecord>, Offline> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                return Err(Offline);
            }
            let mut records = self.records.clone();
            sort_records(&mut records, sort);
            Ok(records)
        }
    }

    impl CatalogService for FakeCatalog {
        type Error = Offline;

        async fn fetch_by_period(
            &self,
            _year: u32,
            _season: AnimeSeason,
            sort: SortMode,
        ) -> Result<Vec<AnimeRecord>, Offline> {
            self.serve(sort)
        }

        async fn search(&self, _query: &str, sort: SortMode) -> Result<Vec<AnimeRecord>, Offline> {
            self.serve(sort)
        }

        async fn get_anime(&self, _anime_id: u64) -> Result<AnimeRecord, Offline> {
            Err(Offline)
        }

        async fn fetch_details(&self, _anime_id: u64) -> Result<AnimeDetails, Offline> {
            Err(Offline)
        }

        async fn fetch_by_year(
            &self,
            _year: u32,
            sort: SortMode,
        ) -> Result<Vec<AnimeRecord>, Offline> {
            self.year_fetches.fetch_add(1, Ordering::SeqCst);
            self.serve(sort)
        }
    }

    fn rec(id: u64, users: u64, start: &str) -> AnimeRecord {
        let mut r = AnimeRecord::new(id, format!("Anime {id}"));
        r.num_list_users = Some(users);
        r.start_date = Some(start.to_string());
        r
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog {
            records: vec![
                rec(1, 100, "2024-01-10"),
                rec(2, 300, "2024-03-01"),
                rec(3, 200, "2024-02-05"),
            ],
            ..Default::default()
        }
    }

    fn ids(grid: &CandidateGrid) -> Vec<u64> {
        grid.records().iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_query_validation() {
        assert!(Query::period(1990, None).is_ok());
        assert!(matches!(
            Query::period(1989, None),
            Err(AnimelogError::InvalidQuery(_))
        ));
        let too_late = *selectable_years().end() + 1;
        assert!(Query::period(too_late, None).is_err());
        assert!(Query::search("   ").is_err());
        assert_eq!(
            Query::search(" frieren ").unwrap(),
            Query::Search("frieren".into())
        );
    }

    #[test]
    fn test_default_query_is_current_period() {
        let Query::Period { year, season } = Query::default() else {
            panic!("expected a period query");
        };
        assert!(selectable_years().contains(&year));
        assert_eq!(season, Some(AnimeSeason::current()));
    }

    #[tokio::test]
    async fn test_date_sort_is_local() {
        let catalog = catalog();
        let query = Query::period(2024, Some(AnimeSeason::Winter)).unwrap();
        let mut grid = CandidateGrid::load(&catalog, query, SortMode::Popularity)
            .await
            .unwrap();
        assert_eq!(ids(&grid), vec![2, 3, 1]);

        let how = grid.change_sort(&catalog, SortMode::Oldest).await.unwrap();
        assert_eq!(how, Resort::Local);
        assert_eq!(ids(&grid), vec![1, 3, 2]);
        assert_eq!(grid.sort(), SortMode::Oldest);
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_sort_refetches() {
        let catalog = catalog();
        let mut grid = CandidateGrid::load(&catalog, Query::Search("x".into()), SortMode::Newest)
            .await
            .unwrap();
        assert_eq!(ids(&grid), vec![2, 3, 1]);

        let how = grid.change_sort(&catalog, SortMode::Popularity).await.unwrap();
        assert_eq!(how, Resort::Fetched);
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_grid() {
        let mut catalog = catalog();
        let mut grid = CandidateGrid::load(&catalog, Query::Search("x".into()), SortMode::Newest)
            .await
            .unwrap();
        catalog.offline = true;

        assert!(grid.change_sort(&catalog, SortMode::Score).await.is_err());
        assert_eq!(grid.sort(), SortMode::Newest);
        assert_eq!(ids(&grid), vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_unspecified_period_aggregates_year() {
        let catalog = catalog();
        let query = Query::period(2024, None).unwrap();
        CandidateGrid::load(&catalog, query, SortMode::Popularity)
            .await
            .unwrap();
        assert_eq!(catalog.year_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cards_and_select() {
        let mut catalog = catalog();
        catalog.records[0].popularity = Some(42);
        catalog.records[0].title_ja = Some("アニメ".into());
        let query = Query::period(2024, Some(AnimeSeason::Winter)).unwrap();
        let grid = CandidateGrid::load(&catalog, query, SortMode::Oldest)
            .await
            .unwrap();

        let cards = grid.cards();
        assert_eq!(cards[0].title, "アニメ");
        assert_eq!(cards[0].badge.as_deref(), Some("#42"));
        assert_eq!(cards[1].badge, None);
        assert_eq!(grid.heading(Locale::Ja), "2024年 冬アニメ");

        let grid = grid.select(10).unwrap_err();
        let chosen = grid.select(1).unwrap();
        assert_eq!(chosen.id, 3);
    }

    #[tokio::test]
    async fn test_empty_grid() {
        let catalog = FakeCatalog::default();
        let grid = CandidateGrid::load(&catalog, Query::Search("none".into()), SortMode::Score)
            .await
            .unwrap();
        assert!(grid.is_empty());
        assert_eq!(CandidateGrid::empty_message(Locale::En), "No titles found.");
    }
}
