use serde::Serialize;
use xcomp_core::DayKey;

use crate::cli::LatestArgs;
use crate::error::CliError;
use crate::output::table;

use super::{instrument_cells, CommandResult, Context, InstrumentView, INSTRUMENT_HEADERS};

#[derive(Debug, Serialize)]
struct LatestResponseData {
    day: Option<DayKey>,
    min_games: u64,
    instruments: Vec<InstrumentView>,
}

pub fn run(args: &LatestArgs, context: &Context, min_games: u64) -> Result<CommandResult, CliError> {
    let day = context.store.latest_day()?;
    let rows = context.store.latest_base_instruments(min_games)?;

    let needle = args
        .search
        .as_deref()
        .map(str::trim)
        .filter(|needle| !needle.is_empty())
        .map(str::to_ascii_uppercase);

    let mut instruments = rows
        .iter()
        .filter(|row| {
            needle
                .as_deref()
                .map_or(true, |needle| row.symbol.to_string().contains(needle))
        })
        .map(|row| InstrumentView::new(row, &context.watchlist))
        .collect::<Vec<_>>();

    if args.watched_first {
        // stable: each group keeps the close ranking
        instruments.sort_by_key(|view| !view.watched);
    }

    let lines = match day {
        None => vec![String::from(
            "No data. Run `xcomp collect` to record a day first.",
        )],
        Some(day) if instruments.is_empty() => vec![format!(
            "No instruments on {day} with at least {min_games} games."
        )],
        Some(day) => {
            let mut lines = vec![format!(
                "Latest day {day}: {} instruments (min games {min_games})",
                instruments.len()
            )];
            lines.extend(table(&INSTRUMENT_HEADERS, &instrument_cells(&instruments)));
            lines
        }
    };

    CommandResult::new(
        &LatestResponseData {
            day,
            min_games,
            instruments,
        },
        lines,
    )
}
