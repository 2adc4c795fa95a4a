//! # xcomp Store
//!
//! File-backed market history for xcomp.
//!
//! ## Overview
//!
//! The whole market state is a single JSON document mapping each calendar day
//! to its day book (symbol to `{close, games}` row). Only variant instruments
//! are ever written; base instruments are aggregated from them on every read
//! and never cached.
//!
//! ```json
//! {
//!   "2024-05-01": {
//!     "/BILGEWATER4:XCOMP": { "close": 33.25, "games": 8 },
//!     "/BILGEWATER6:XCOMP": 41.0
//!   }
//! }
//! ```
//!
//! Close-only rows like the second one above are legacy data; they load with
//! unknown games and are rewritten in object form on the next save.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xcomp_core::{DayKey, QuoteRow, Symbol};
//! use xcomp_store::{MarketStore, StoreConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MarketStore::new(StoreConfig::default());
//!
//!     let day = store.merge_day(
//!         Some(DayKey::parse("2024-05-01")?),
//!         [(Symbol::parse("/BILGEWATER4:XCOMP")?, QuoteRow::with_games(33.25, 8))],
//!     )?;
//!
//!     for row in store.latest_base_instruments(1)? {
//!         println!("{day} {} {:.2}", row.symbol, row.close);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Operations
//!
//! | Operation | Description |
//! |-----------|-------------|
//! | `merge_day` | Upsert rows into one day, last write wins per symbol |
//! | `latest_day` | Most recent recorded day |
//! | `latest_base_instruments` | Base aggregates on the latest day |
//! | `variants_of_base_on_latest_day` | One base's variants on the latest day |
//! | `series` | Per-day closes for one symbol across the history |
//! | `list_days` | Every recorded day, ascending |

pub mod aggregate;
pub mod atomic;
pub mod history;

use std::env;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;
use xcomp_core::{DayKey, QuoteRow, Symbol, ValidationError};

pub use aggregate::{aggregate_group, base_book, base_row};
pub use atomic::write_json_atomic;
pub use history::{DayBook, History};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The history document is not valid JSON.
    #[error("history document {} is not valid JSON: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The history document is JSON but not shaped like a history.
    #[error("history document {} is malformed: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    /// A top-level key of the history document is not a calendar day.
    #[error("history document {} has a key that is not a day: '{value}'", path.display())]
    InvalidDayKey { path: PathBuf, value: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration for the market store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for xcomp data.
    pub xcomp_home: PathBuf,
    /// Path to the history document.
    pub history_path: PathBuf,
    /// Path the raw match snapshot of a collection run is written to.
    pub raw_snapshot_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_home(resolve_xcomp_home())
    }
}

impl StoreConfig {
    /// Lay out every store path under `home`.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        let xcomp_home = home.into();
        let data_dir = xcomp_home.join("data");
        Self {
            history_path: data_dir.join("market_history.json"),
            raw_snapshot_path: data_dir.join("raw_daily.json"),
            xcomp_home,
        }
    }

    /// Directory holding every xcomp data file.
    pub fn data_dir(&self) -> PathBuf {
        self.xcomp_home.join("data")
    }
}

/// One instrument row on a given day, as returned by listing reads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentRow {
    pub symbol: Symbol,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub games: Option<u64>,
}

impl InstrumentRow {
    fn new(symbol: Symbol, row: QuoteRow) -> Self {
        Self {
            symbol,
            close: row.close,
            games: row.games,
        }
    }
}

/// One point of a symbol's close series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub day: DayKey,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub games: Option<u64>,
}

/// The market history and the read operations over it.
///
/// Every operation reads the document afresh; writers replace it atomically.
/// The store assumes a single writer at a time.
#[derive(Debug, Clone)]
pub struct MarketStore {
    config: StoreConfig,
}

impl MarketStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Open the store under the default xcomp home.
    pub fn open_default() -> Self {
        Self::new(StoreConfig::default())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn history_path(&self) -> &Path {
        &self.config.history_path
    }

    /// Read-only snapshot of the whole normalized history.
    pub fn history(&self) -> Result<History, StoreError> {
        History::load(&self.config.history_path)
    }

    /// Upsert `rows` into the book for `day` (today when `None`) and persist
    /// the history. Returns the day that was written.
    pub fn merge_day<I>(&self, day: Option<DayKey>, rows: I) -> Result<DayKey, StoreError>
    where
        I: IntoIterator<Item = (Symbol, QuoteRow)>,
    {
        let rows = rows.into_iter().collect::<Vec<_>>();
        if rows.iter().any(|(_, row)| !row.close.is_finite()) {
            return Err(ValidationError::NonFiniteValue { field: "close" }.into());
        }

        let day = day.unwrap_or_else(DayKey::today);
        let mut history = self.history()?;
        let written = history.day_mut(day).merge(rows);
        history.save(&self.config.history_path)?;

        info!(%day, rows = written, path = %self.config.history_path.display(), "merged day book");
        Ok(day)
    }

    pub fn latest_day(&self) -> Result<Option<DayKey>, StoreError> {
        Ok(self.history()?.latest().map(|(day, _)| *day))
    }

    pub fn list_days(&self) -> Result<Vec<DayKey>, StoreError> {
        Ok(self.history()?.days().copied().collect())
    }

    /// Base aggregates on the latest day, highest close first.
    ///
    /// Rows with known games below `min_games` are dropped; rows with unknown
    /// games are always kept.
    pub fn latest_base_instruments(&self, min_games: u64) -> Result<Vec<InstrumentRow>, StoreError> {
        let history = self.history()?;
        let Some((_, book)) = history.latest() else {
            return Ok(Vec::new());
        };

        let rows = base_book(book)
            .into_iter()
            .map(|(symbol, row)| InstrumentRow::new(symbol, row));
        Ok(filter_and_rank(rows, min_games))
    }

    /// Variants of `base` on the latest day, highest close first, under the
    /// same games filter as [`Self::latest_base_instruments`]. A variant symbol
    /// has no variants of its own and yields nothing.
    pub fn variants_of_base_on_latest_day(
        &self,
        base: &Symbol,
        min_games: u64,
    ) -> Result<Vec<InstrumentRow>, StoreError> {
        if !base.is_base() {
            return Ok(Vec::new());
        }

        let history = self.history()?;
        let Some((_, book)) = history.latest() else {
            return Ok(Vec::new());
        };

        let rows = book
            .rows()
            .iter()
            .filter(|(symbol, _)| symbol.is_variant_of(base))
            .map(|(symbol, row)| InstrumentRow::new(symbol.clone(), *row));
        Ok(filter_and_rank(rows, min_games))
    }

    /// Close series for `symbol`, ascending by day.
    ///
    /// Variants are looked up directly. Bases are re-aggregated per day, and a
    /// day without any of the base's variants is omitted rather than filled.
    pub fn series(&self, symbol: &Symbol) -> Result<Vec<SeriesPoint>, StoreError> {
        let history = self.history()?;

        let points = history
            .iter()
            .filter_map(|(day, book)| {
                let row = if symbol.is_base() {
                    base_row(book, symbol)
                } else {
                    book.get(symbol).copied()
                };
                row.map(|row| SeriesPoint {
                    day: *day,
                    close: row.close,
                    games: row.games,
                })
            })
            .collect();
        Ok(points)
    }

    /// Atomically write the raw batch behind a collection run.
    pub fn write_raw_snapshot<T>(&self, value: &T) -> Result<&Path, StoreError>
    where
        T: Serialize + ?Sized,
    {
        write_json_atomic(&self.config.raw_snapshot_path, value)?;
        Ok(&self.config.raw_snapshot_path)
    }
}

fn filter_and_rank<I>(rows: I, min_games: u64) -> Vec<InstrumentRow>
where
    I: Iterator<Item = InstrumentRow>,
{
    let mut rows = rows
        .filter(|row| row.games.map_or(true, |games| games >= min_games))
        .collect::<Vec<_>>();
    rows.sort_by(|a, b| b.close.total_cmp(&a.close));
    rows
}

fn resolve_xcomp_home() -> PathBuf {
    if let Some(path) = env::var_os("XCOMP_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".xcomp");
    }

    PathBuf::from(".xcomp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn symbol(value: &str) -> Symbol {
        Symbol::parse(value).expect("valid symbol")
    }

    fn day(value: &str) -> DayKey {
        DayKey::parse(value).expect("valid day")
    }

    #[test]
    fn config_lays_out_paths_under_home() {
        let config = StoreConfig::with_home("/tmp/xcomp-home");
        assert_eq!(
            config.history_path,
            PathBuf::from("/tmp/xcomp-home/data/market_history.json")
        );
        assert_eq!(
            config.raw_snapshot_path,
            PathBuf::from("/tmp/xcomp-home/data/raw_daily.json")
        );
        assert_eq!(config.data_dir(), PathBuf::from("/tmp/xcomp-home/data"));
    }

    #[test]
    fn merge_day_rejects_non_finite_closes_without_writing() {
        let temp = tempdir().expect("tempdir");
        let store = MarketStore::new(StoreConfig::with_home(temp.path()));

        let err = store
            .merge_day(
                Some(day("2024-05-01")),
                [(symbol("/FOO2:XCOMP"), QuoteRow::with_games(f64::NAN, 3))],
            )
            .expect_err("NaN must be rejected");

        assert!(matches!(err, StoreError::Validation(_)));
        assert!(!store.history_path().exists());
    }

    #[test]
    fn merge_day_without_a_day_uses_today() {
        let temp = tempdir().expect("tempdir");
        let store = MarketStore::new(StoreConfig::with_home(temp.path()));

        let before = DayKey::today();
        let written = store
            .merge_day(None, [(symbol("/FOO2:XCOMP"), QuoteRow::with_games(10.0, 3))])
            .expect("merge");
        let after = DayKey::today();

        assert!(
            written == before || written == after,
            "written={written}, before={before}, after={after}"
        );
        assert_eq!(store.latest_day().expect("latest"), Some(written));
    }

    #[test]
    fn ranking_is_stable_for_equal_closes() {
        let rows = vec![
            InstrumentRow::new(symbol("/B:XCOMP"), QuoteRow::with_games(10.0, 9)),
            InstrumentRow::new(symbol("/A:XCOMP"), QuoteRow::with_games(20.0, 9)),
            InstrumentRow::new(symbol("/C:XCOMP"), QuoteRow::with_games(10.0, 9)),
        ];

        let ranked = filter_and_rank(rows.into_iter(), 1)
            .into_iter()
            .map(|row| row.symbol.to_string())
            .collect::<Vec<_>>();
        assert_eq!(ranked, vec!["/A:XCOMP", "/B:XCOMP", "/C:XCOMP"]);
    }

    #[test]
    fn raw_snapshot_is_written_next_to_the_history() {
        let temp = tempdir().expect("tempdir");
        let store = MarketStore::new(StoreConfig::with_home(temp.path()));

        let path = store
            .write_raw_snapshot(&serde_json::json!([{"metadata": {"match_id": "NA1_1"}}]))
            .expect("snapshot")
            .to_path_buf();

        let text = fs::read_to_string(path).expect("read snapshot");
        assert!(text.contains("NA1_1"));
    }
}
