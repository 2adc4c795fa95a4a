//! Per-symbol performance counters folded from a batch of match records.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::taxonomy::comp_symbol;
use crate::{MatchRecord, Symbol};

/// Counters and rates for one composition symbol within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompStats {
    pub games: u64,
    pub wins: u64,
    pub top4s: u64,
    pub win_rate: f64,
    pub top4_rate: f64,
    pub pick_rate: f64,
}

/// Result of aggregating one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsBatch {
    /// Every participant seen in the batch, whatever its symbol.
    pub total_boards: u64,
    pub by_symbol: BTreeMap<Symbol, CompStats>,
}

impl StatsBatch {
    pub fn get(&self, symbol: &Symbol) -> Option<&CompStats> {
        self.by_symbol.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    games: u64,
    wins: u64,
    top4s: u64,
}

/// Aggregate a batch of matches into per-symbol stats.
///
/// The batch is taken as given: deduplication by match id and minimum-sample
/// filtering are the caller's policies.
pub fn aggregate_comp_stats(matches: &[MatchRecord], top_n_traits: usize) -> StatsBatch {
    let mut counters: BTreeMap<Symbol, Counters> = BTreeMap::new();
    let mut total_boards = 0_u64;

    for record in matches {
        for participant in record.participants() {
            total_boards += 1;
            let entry = counters
                .entry(comp_symbol(participant, top_n_traits))
                .or_default();
            entry.games += 1;
            if participant.is_win() {
                entry.wins += 1;
            }
            if participant.is_top4() {
                entry.top4s += 1;
            }
        }
    }

    let by_symbol = counters
        .into_iter()
        .map(|(symbol, counts)| {
            let games = counts.games as f64;
            let pick_rate = if total_boards == 0 {
                0.0
            } else {
                games / total_boards as f64
            };
            let stats = CompStats {
                games: counts.games,
                wins: counts.wins,
                top4s: counts.top4s,
                win_rate: counts.wins as f64 / games,
                top4_rate: counts.top4s as f64 / games,
                pick_rate,
            };
            (symbol, stats)
        })
        .collect();

    StatsBatch {
        total_boards,
        by_symbol,
    }
}
