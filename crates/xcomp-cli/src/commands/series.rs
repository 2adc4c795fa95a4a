use serde::Serialize;
use xcomp_core::DayKey;

use crate::cli::SeriesArgs;
use crate::error::CliError;
use crate::output::{confidence_label, format_close, format_games, table};

use super::{parse_symbol, CommandResult, Context};

#[derive(Debug, Serialize)]
struct SeriesResponseData {
    symbol: String,
    watched: bool,
    points: Vec<PointView>,
}

#[derive(Debug, Serialize)]
struct PointView {
    day: DayKey,
    close: f64,
    games: Option<u64>,
    confidence: &'static str,
}

pub fn run(args: &SeriesArgs, context: &Context) -> Result<CommandResult, CliError> {
    let symbol = parse_symbol(&args.symbol)?;
    let points = context
        .store
        .series(&symbol)?
        .into_iter()
        .map(|point| PointView {
            day: point.day,
            close: point.close,
            games: point.games,
            confidence: confidence_label(point.games),
        })
        .collect::<Vec<_>>();

    let watched = context.watchlist.contains(&symbol.to_string());
    let lines = if points.is_empty() {
        vec![format!("No history for {symbol}.")]
    } else {
        let marker = if watched { " *" } else { "" };
        let mut lines = vec![format!("{symbol}{marker}: {} days", points.len())];
        let rows = points
            .iter()
            .map(|point| {
                vec![
                    point.day.to_string(),
                    format_close(point.close),
                    format_games(point.games),
                    point.confidence.to_string(),
                ]
            })
            .collect::<Vec<_>>();
        lines.extend(table(&["DAY", "CLOSE", "GAMES", "CONF"], &rows));
        lines
    };

    CommandResult::new(
        &SeriesResponseData {
            symbol: symbol.to_string(),
            watched,
            points,
        },
        lines,
    )
}
