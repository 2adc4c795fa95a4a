//! Behavior-driven tests for the market store
//!
//! These tests verify WHAT a reader of the market sees after collection runs
//! have written day books, focusing on user-visible outcomes.

use std::fs;

use serde_json::{json, Value};
use tempfile::tempdir;
use xcomp_core::{DayKey, QuoteRow, Symbol};
use xcomp_store::{MarketStore, StoreConfig, StoreError};

fn store_in(dir: &std::path::Path) -> MarketStore {
    MarketStore::new(StoreConfig::with_home(dir))
}

fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}

fn day(value: &str) -> Option<DayKey> {
    Some(DayKey::parse(value).expect("valid day"))
}

fn read_document(store: &MarketStore) -> Value {
    let text = fs::read_to_string(store.history_path()).expect("history written");
    serde_json::from_str(&text).expect("history is JSON")
}

// =============================================================================
// Market Store: Empty State
// =============================================================================

#[test]
fn when_user_reads_an_empty_market_then_every_query_is_empty() {
    // Given: A home directory without any history
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());

    // When/Then: Every read answers with nothing, never an error
    assert_eq!(store.latest_day().expect("latest day"), None);
    assert!(store.list_days().expect("days").is_empty());
    assert!(store.latest_base_instruments(1).expect("bases").is_empty());
    assert!(store
        .variants_of_base_on_latest_day(&symbol("/FOO:XCOMP"), 1)
        .expect("variants")
        .is_empty());
    assert!(store.series(&symbol("/FOO:XCOMP")).expect("series").is_empty());

    // And: Reading does not create the document
    assert!(!store.history_path().exists());
}

// =============================================================================
// Market Store: Merging Day Books
// =============================================================================

#[test]
fn when_user_merges_the_same_symbol_twice_on_a_day_then_the_last_write_wins() {
    // Given: A day book with two variants
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-05-01"),
            [
                (symbol("/FOO2:XCOMP"), QuoteRow::with_games(10.0, 5)),
                (symbol("/FOO4:XCOMP"), QuoteRow::with_games(30.0, 5)),
            ],
        )
        .expect("first merge");

    // When: One of them is merged again the same day
    let written = store
        .merge_day(
            day("2024-05-01"),
            [(symbol("/FOO2:XCOMP"), QuoteRow::with_games(20.0, 7))],
        )
        .expect("second merge");

    // Then: The new row replaced the old one and the other row is untouched
    assert_eq!(written.to_string(), "2024-05-01");
    let history = store.history().expect("history");
    let book = history.day(&written).expect("day present");
    assert_eq!(book.get(&symbol("/FOO2:XCOMP")), Some(&QuoteRow::with_games(20.0, 7)));
    assert_eq!(book.get(&symbol("/FOO4:XCOMP")), Some(&QuoteRow::with_games(30.0, 5)));
    assert_eq!(history.len(), 1);
}

#[test]
fn when_user_merges_an_empty_batch_then_the_day_book_is_unchanged() {
    // Given: A persisted day book
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-05-01"),
            [(symbol("/FOO2:XCOMP"), QuoteRow::with_games(10.0, 5))],
        )
        .expect("merge");
    let before = read_document(&store);

    // When: An empty row set is merged into the same day
    store
        .merge_day(day("2024-05-01"), Vec::<(Symbol, QuoteRow)>::new())
        .expect("empty merge");

    // Then: The document is identical
    assert_eq!(read_document(&store), before);
}

#[test]
fn when_user_merges_a_new_day_then_earlier_days_are_kept() {
    // Given: Two earlier days
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    for key in ["2024-05-02", "2024-04-30"] {
        store
            .merge_day(day(key), [(symbol("/FOO2:XCOMP"), QuoteRow::with_games(1.0, 1))])
            .expect("merge");
    }

    // When: A third day is merged
    store
        .merge_day(day("2024-05-10"), [(symbol("/BAR1:XCOMP"), QuoteRow::with_games(2.0, 2))])
        .expect("merge");

    // Then: All days are listed in chronological order and the latest is the newest
    let days = store
        .list_days()
        .expect("days")
        .into_iter()
        .map(|day| day.to_string())
        .collect::<Vec<_>>();
    assert_eq!(days, vec!["2024-04-30", "2024-05-02", "2024-05-10"]);
    assert_eq!(store.latest_day().expect("latest"), day("2024-05-10"));
}

#[test]
fn when_history_is_saved_then_it_is_pretty_json_without_leftover_files() {
    // Given: A fresh store
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());

    // When: A day is merged
    store
        .merge_day(
            day("2024-05-01"),
            [(symbol("/BILGEWATER4:XCOMP"), QuoteRow::with_games(33.25, 8))],
        )
        .expect("merge");

    // Then: The document is indented with two spaces
    let text = fs::read_to_string(store.history_path()).expect("read");
    assert!(text.starts_with("{\n  \"2024-05-01\": {\n    \"/BILGEWATER4:XCOMP\": {"));

    // And: No temporary file is left next to it
    let names = fs::read_dir(store.config().data_dir())
        .expect("data dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["market_history.json"]);
}

// =============================================================================
// Market Store: Base Instruments
// =============================================================================

#[test]
fn when_user_lists_bases_then_variants_are_weighted_by_games_and_ranked_by_close() {
    // Given: Two bases with variants of known games on the latest day
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-04-30"),
            [(symbol("/OLD1:XCOMP"), QuoteRow::with_games(99.0, 99))],
        )
        .expect("older day");
    store
        .merge_day(
            day("2024-05-01"),
            [
                (symbol("/FOO2:XCOMP"), QuoteRow::with_games(30.0, 10)),
                (symbol("/FOO4:XCOMP"), QuoteRow::with_games(60.0, 20)),
                (symbol("/BAR3:XCOMP"), QuoteRow::with_games(70.0, 6)),
            ],
        )
        .expect("latest day");

    // When: They list base instruments
    let rows = store.latest_base_instruments(1).expect("bases");

    // Then: Only the latest day is used, ranked by close descending
    let symbols = rows.iter().map(|row| row.symbol.to_string()).collect::<Vec<_>>();
    assert_eq!(symbols, vec!["/BAR:XCOMP", "/FOO:XCOMP"]);

    // And: The FOO close is the games-weighted mean with summed games
    assert!((rows[1].close - 50.0).abs() < 1e-9);
    assert_eq!(rows[1].games, Some(30));
}

#[test]
fn when_any_variant_has_unknown_games_then_the_base_is_a_plain_mean_with_unknown_games() {
    // Given: A legacy close-only row next to rows with games
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-05-01"),
            [
                (symbol("/FOO2:XCOMP"), QuoteRow::with_games(30.0, 10)),
                (symbol("/FOO4:XCOMP"), QuoteRow::with_games(60.0, 90)),
                (symbol("/FOO6:XCOMP"), QuoteRow::close_only(90.0)),
            ],
        )
        .expect("merge");

    // When: They list base instruments
    let rows = store.latest_base_instruments(1).expect("bases");

    // Then: No partial weighting is fabricated
    assert_eq!(rows.len(), 1);
    assert!((rows[0].close - 60.0).abs() < 1e-9);
    assert_eq!(rows[0].games, None);
}

#[test]
fn when_user_filters_by_min_games_then_unknown_games_rows_are_never_dropped() {
    // Given: One thin base and one base with unknown games
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-05-01"),
            [
                (symbol("/THIN2:XCOMP"), QuoteRow::with_games(80.0, 10)),
                (symbol("/LEGACY3:XCOMP"), QuoteRow::close_only(20.0)),
                (symbol("/THICK1:XCOMP"), QuoteRow::with_games(40.0, 120)),
            ],
        )
        .expect("merge");

    // When: They ask for bases with at least 50 games
    let rows = store.latest_base_instruments(50).expect("bases");

    // Then: The thin base is excluded and the legacy base is kept
    let symbols = rows.iter().map(|row| row.symbol.to_string()).collect::<Vec<_>>();
    assert_eq!(symbols, vec!["/THICK:XCOMP", "/LEGACY:XCOMP"]);
}

#[test]
fn when_a_base_shaped_row_is_stored_then_it_is_not_listed_as_a_base() {
    // Given: The taxonomy fallback symbol was written as a row
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-05-01"),
            [
                (Symbol::unknown(), QuoteRow::with_games(50.0, 40)),
                (symbol("/FOO2:XCOMP"), QuoteRow::with_games(10.0, 40)),
            ],
        )
        .expect("merge");

    // When: They list base instruments
    let rows = store.latest_base_instruments(1).expect("bases");

    // Then: Only aggregates of variants appear
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].symbol.to_string(), "/FOO:XCOMP");
}

// =============================================================================
// Market Store: Variants
// =============================================================================

#[test]
fn when_user_drills_into_a_base_then_only_its_variants_are_listed() {
    // Given: Variants of two bases whose names share a prefix
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-05-01"),
            [
                (symbol("/FOO2:XCOMP"), QuoteRow::with_games(10.0, 5)),
                (symbol("/FOO4:XCOMP"), QuoteRow::with_games(30.0, 2)),
                (symbol("/FOO6:XCOMP"), QuoteRow::close_only(20.0)),
                (symbol("/FOOD2:XCOMP"), QuoteRow::with_games(90.0, 50)),
            ],
        )
        .expect("merge");

    // When: They list FOO variants with at least 3 games
    let rows = store
        .variants_of_base_on_latest_day(&symbol("/FOO:XCOMP"), 3)
        .expect("variants");

    // Then: FOOD is excluded, the thin variant is dropped and the rest are ranked
    let symbols = rows.iter().map(|row| row.symbol.to_string()).collect::<Vec<_>>();
    assert_eq!(symbols, vec!["/FOO6:XCOMP", "/FOO2:XCOMP"]);
}

#[test]
fn when_user_drills_into_a_variant_then_nothing_is_listed() {
    // Given: A recorded variant
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-05-01"),
            [(symbol("/FOO2:XCOMP"), QuoteRow::with_games(10.0, 5))],
        )
        .expect("merge");

    // When/Then: Asking for the variants of a variant yields nothing
    assert!(store
        .variants_of_base_on_latest_day(&symbol("/FOO2:XCOMP"), 1)
        .expect("variants")
        .is_empty());
}

// =============================================================================
// Market Store: Series
// =============================================================================

#[test]
fn when_a_base_is_missing_on_a_day_then_its_series_skips_that_day() {
    // Given: FOO variants on days 1 and 3 but not on day 2
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    store
        .merge_day(
            day("2024-05-01"),
            [
                (symbol("/FOO2:XCOMP"), QuoteRow::with_games(10.0, 1)),
                (symbol("/FOO4:XCOMP"), QuoteRow::with_games(40.0, 2)),
            ],
        )
        .expect("day 1");
    store
        .merge_day(
            day("2024-05-02"),
            [(symbol("/BAR2:XCOMP"), QuoteRow::with_games(5.0, 5))],
        )
        .expect("day 2");
    store
        .merge_day(
            day("2024-05-03"),
            [(symbol("/FOO2:XCOMP"), QuoteRow::close_only(12.0))],
        )
        .expect("day 3");

    // When: They ask for the base series
    let points = store.series(&symbol("/FOO:XCOMP")).expect("series");

    // Then: Exactly days 1 and 3 are returned, each aggregated independently
    let days = points.iter().map(|point| point.day.to_string()).collect::<Vec<_>>();
    assert_eq!(days, vec!["2024-05-01", "2024-05-03"]);
    assert!((points[0].close - 30.0).abs() < 1e-9);
    assert_eq!(points[0].games, Some(3));
    assert!((points[1].close - 12.0).abs() < 1e-9);
    assert_eq!(points[1].games, None);
}

#[test]
fn when_user_asks_for_a_variant_series_then_rows_are_looked_up_directly() {
    // Given: A variant recorded on two days
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    for (key, close) in [("2024-05-02", 22.0), ("2024-05-01", 11.0)] {
        store
            .merge_day(day(key), [(symbol("/FOO2:XCOMP"), QuoteRow::with_games(close, 4))])
            .expect("merge");
    }

    // When: They ask for its series
    let points = store.series(&symbol("/FOO2:XCOMP")).expect("series");

    // Then: Points ascend by day with the stored closes
    let closes = points
        .iter()
        .map(|point| (point.day.to_string(), point.close))
        .collect::<Vec<_>>();
    assert_eq!(
        closes,
        vec![
            (String::from("2024-05-01"), 11.0),
            (String::from("2024-05-02"), 22.0)
        ]
    );

    // And: An unseen symbol has an empty series
    assert!(store.series(&symbol("/NEVER7:XCOMP")).expect("series").is_empty());
}

// =============================================================================
// Market Store: Legacy and Corrupt Documents
// =============================================================================

#[test]
fn when_history_holds_legacy_scalar_rows_then_they_load_and_are_rewritten_as_objects() {
    // Given: A hand-written legacy document
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    fs::create_dir_all(store.config().data_dir()).expect("data dir");
    fs::write(
        store.history_path(),
        r#"{"2024-05-01": {"/FOO2:XCOMP": 41.5, "/FOO4:XCOMP": {"close": 20, "games": 3}}}"#,
    )
    .expect("seed legacy history");

    // When: The legacy row is read
    let rows = store
        .variants_of_base_on_latest_day(&symbol("/FOO:XCOMP"), 100)
        .expect("variants");

    // Then: It has unknown games and survives a high threshold
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].symbol.to_string(), "/FOO2:XCOMP");
    assert_eq!(rows[0].games, None);

    // When: Another day is merged
    store
        .merge_day(
            day("2024-05-02"),
            [(symbol("/BAR1:XCOMP"), QuoteRow::with_games(1.0, 1))],
        )
        .expect("merge");

    // Then: The legacy row is persisted in object form
    assert_eq!(
        read_document(&store)["2024-05-01"]["/FOO2:XCOMP"],
        json!({"close": 41.5})
    );
}

#[test]
fn when_history_is_not_a_day_keyed_object_then_reads_fail_loudly() {
    // Given: A document whose top-level key is not a date
    let temp = tempdir().expect("tempdir");
    let store = store_in(temp.path());
    fs::create_dir_all(store.config().data_dir()).expect("data dir");
    fs::write(store.history_path(), r#"{"latest": {}}"#).expect("seed");

    // When/Then: The corruption surfaces instead of an empty answer
    let err = store.latest_day().expect_err("must fail");
    assert!(matches!(err, StoreError::InvalidDayKey { .. }));

    // And: Merging refuses to overwrite it
    let err = store
        .merge_day(day("2024-05-01"), Vec::<(Symbol, QuoteRow)>::new())
        .expect_err("must fail");
    assert!(matches!(err, StoreError::InvalidDayKey { .. }));
    assert_eq!(
        fs::read_to_string(store.history_path()).expect("read"),
        r#"{"latest": {}}"#
    );
}
