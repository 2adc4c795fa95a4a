//! Pure steps of a collection run: deduplicate, aggregate, price, filter.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::pricing::PriceFunction;
use crate::stats::{aggregate_comp_stats, StatsBatch};
use crate::{MatchRecord, QuoteRow, Symbol};

/// Drop repeated match ids, keeping the first occurrence and the input order.
///
/// Records without a match id are kept as-is since they cannot be compared.
pub fn dedupe_matches(matches: Vec<MatchRecord>) -> Vec<MatchRecord> {
    let mut seen = HashSet::new();
    let before = matches.len();
    let unique = matches
        .into_iter()
        .filter(|record| record.match_id().is_empty() || seen.insert(record.match_id().to_string()))
        .collect::<Vec<_>>();

    if unique.len() != before {
        debug!(dropped = before - unique.len(), "dropped duplicate match records");
    }
    unique
}

/// Rows for one day together with the batch they were derived from.
#[derive(Debug, Clone)]
pub struct DayRows {
    pub stats: StatsBatch,
    pub rows: BTreeMap<Symbol, QuoteRow>,
}

/// Aggregate, price and filter a deduplicated batch into day rows.
///
/// Symbols backed by fewer than `min_games` boards are not written. Prices
/// that are not finite cannot be persisted and are skipped with a warning.
pub fn build_day_rows<P>(
    matches: &[MatchRecord],
    top_n_traits: usize,
    min_games: u64,
    price: &P,
) -> DayRows
where
    P: PriceFunction + ?Sized,
{
    let stats = aggregate_comp_stats(matches, top_n_traits);
    let mut rows = BTreeMap::new();

    for (symbol, comp) in &stats.by_symbol {
        if comp.games < min_games {
            continue;
        }

        let close = price.price(comp.win_rate, comp.top4_rate, comp.pick_rate);
        if !close.is_finite() {
            warn!(%symbol, close, "price function returned a non-finite close; skipping");
            continue;
        }

        rows.insert(symbol.clone(), QuoteRow::with_games(close, comp.games));
    }

    DayRows { stats, rows }
}
