//! Read-time base aggregation over a day's variant rows.

use std::collections::BTreeMap;

use xcomp_core::{QuoteRow, Symbol};

use crate::DayBook;

/// Aggregate every variant in `book` into its base instrument.
///
/// Base-shaped rows stored in the book (such as `/UNKNOWN:XCOMP`) have no
/// variants behind them and do not contribute.
pub fn base_book(book: &DayBook) -> BTreeMap<Symbol, QuoteRow> {
    let mut groups: BTreeMap<Symbol, Vec<QuoteRow>> = BTreeMap::new();
    for (symbol, row) in book.rows() {
        if let Some((base, _)) = symbol.split_variant() {
            groups.entry(base).or_default().push(*row);
        }
    }

    groups
        .into_iter()
        .filter_map(|(base, rows)| aggregate_group(&rows).map(|row| (base, row)))
        .collect()
}

/// Aggregate row for one base, or `None` when `base` has no variants in `book`.
pub fn base_row(book: &DayBook, base: &Symbol) -> Option<QuoteRow> {
    let rows = book
        .rows()
        .iter()
        .filter(|(symbol, _)| symbol.is_variant_of(base))
        .map(|(_, row)| *row)
        .collect::<Vec<_>>();
    aggregate_group(&rows)
}

/// Combine the rows of one base group.
///
/// With every games count known the close is the games-weighted mean and the
/// games are summed; a zero total falls back to the plain mean. If any count
/// is unknown the close is the plain mean of all rows and games stay unknown.
pub fn aggregate_group(rows: &[QuoteRow]) -> Option<QuoteRow> {
    if rows.is_empty() {
        return None;
    }

    let mean = rows.iter().map(|row| row.close).sum::<f64>() / rows.len() as f64;

    let Some(games) = rows.iter().map(|row| row.games).collect::<Option<Vec<_>>>() else {
        return Some(QuoteRow::close_only(mean));
    };

    let total = games.iter().fold(0_u64, |acc, games| acc.saturating_add(*games));
    if total == 0 {
        return Some(QuoteRow::with_games(mean, 0));
    }

    let weighted = rows
        .iter()
        .zip(&games)
        .map(|(row, games)| row.close * *games as f64)
        .sum::<f64>()
        / total as f64;
    Some(QuoteRow::with_games(weighted, total))
}
