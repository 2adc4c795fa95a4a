use serde::Serialize;
use xcomp_core::DayKey;

use crate::cli::VariantsArgs;
use crate::error::CliError;
use crate::output::table;

use super::{
    instrument_cells, parse_symbol, CommandResult, Context, InstrumentView, INSTRUMENT_HEADERS,
};

#[derive(Debug, Serialize)]
struct VariantsResponseData {
    base: String,
    day: Option<DayKey>,
    min_games: u64,
    variants: Vec<InstrumentView>,
}

pub fn run(
    args: &VariantsArgs,
    context: &Context,
    min_games: u64,
) -> Result<CommandResult, CliError> {
    let base = parse_symbol(&args.base)?;
    let day = context.store.latest_day()?;
    let variants = context
        .store
        .variants_of_base_on_latest_day(&base, min_games)?
        .iter()
        .map(|row| InstrumentView::new(row, &context.watchlist))
        .collect::<Vec<_>>();

    let lines = if variants.is_empty() {
        let hint = if base.is_variant() {
            format!(" ({base} is a variant; try {})", base.base())
        } else {
            String::new()
        };
        vec![format!("No variants of {base} on the latest day{hint}.")]
    } else {
        let mut lines = vec![format!("Variants of {base}: {}", variants.len())];
        lines.extend(table(&INSTRUMENT_HEADERS, &instrument_cells(&variants)));
        lines
    };

    CommandResult::new(
        &VariantsResponseData {
            base: base.to_string(),
            day,
            min_games,
            variants,
        },
        lines,
    )
}
