use serde::Serialize;

use crate::cli::{WatchArgs, WatchCommand};
use crate::error::CliError;

use super::{parse_symbol, CommandResult, Context};

#[derive(Debug, Serialize)]
struct WatchChange {
    symbol: String,
    watched: bool,
    changed: bool,
}

pub fn run(args: &WatchArgs, context: &mut Context) -> Result<CommandResult, CliError> {
    let watchlist = &mut context.watchlist;

    let (symbol, watched, changed) = match &args.command {
        WatchCommand::List => {
            let symbols = watchlist.symbols().map(str::to_string).collect::<Vec<_>>();
            let lines = if symbols.is_empty() {
                vec![String::from("Watchlist is empty.")]
            } else {
                symbols.clone()
            };
            return CommandResult::new(&symbols, lines);
        }
        WatchCommand::Toggle { symbol } => {
            let symbol = parse_symbol(symbol)?.to_string();
            let watched = watchlist.toggle(&symbol)?;
            (symbol, watched, true)
        }
        WatchCommand::Add { symbol } => {
            let symbol = parse_symbol(symbol)?.to_string();
            let changed = watchlist.add(&symbol)?;
            (symbol, true, changed)
        }
        WatchCommand::Remove { symbol } => {
            let symbol = parse_symbol(symbol)?.to_string();
            let changed = watchlist.remove(&symbol)?;
            (symbol, false, changed)
        }
    };

    let line = match (watched, changed) {
        (true, true) => format!("Watching {symbol}."),
        (true, false) => format!("{symbol} is already watched."),
        (false, true) => format!("Stopped watching {symbol}."),
        (false, false) => format!("{symbol} was not watched."),
    };

    CommandResult::new(
        &WatchChange {
            symbol,
            watched,
            changed,
        },
        vec![line],
    )
}
