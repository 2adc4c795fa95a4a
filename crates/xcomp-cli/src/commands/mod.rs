mod collect;
mod days;
mod latest;
mod series;
mod variants;
mod watch;

use serde::Serialize;
use serde_json::Value;
use xcomp_core::{CollectorSettings, Symbol};
use xcomp_store::{InstrumentRow, MarketStore, StoreConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::{confidence_label, format_close, format_games};
use crate::watchlist::Watchlist;

/// What a command produced: a JSON document and its terminal rendering.
pub struct CommandResult {
    pub data: Value,
    pub lines: Vec<String>,
}

impl CommandResult {
    pub fn new<T: Serialize>(data: &T, lines: Vec<String>) -> Result<Self, CliError> {
        Ok(Self {
            data: serde_json::to_value(data)?,
            lines,
        })
    }
}

/// Shared state every command runs against.
pub struct Context {
    pub store: MarketStore,
    pub watchlist: Watchlist,
}

impl Context {
    fn from_cli(cli: &Cli) -> Self {
        let config = match &cli.home {
            Some(home) => StoreConfig::with_home(home),
            None => StoreConfig::default(),
        };
        let watchlist = Watchlist::load(&Watchlist::path_for(&config));

        Self {
            store: MarketStore::new(config),
            watchlist,
        }
    }
}

pub async fn run(cli: &Cli) -> Result<CommandResult, CliError> {
    let mut context = Context::from_cli(cli);

    match &cli.command {
        Command::Collect(args) => collect::run(args, &context, load_settings()?).await,
        Command::Latest(args) => latest::run(args, &context, default_min_games(args.min_games)?),
        Command::Variants(args) => {
            variants::run(args, &context, default_min_games(args.min_games)?)
        }
        Command::Series(args) => series::run(args, &context),
        Command::Days => days::run(&context),
        Command::Watch(args) => watch::run(args, &mut context),
    }
}

fn load_settings() -> Result<CollectorSettings, CliError> {
    Ok(CollectorSettings::from_env()?)
}

fn default_min_games(flag: Option<u64>) -> Result<u64, CliError> {
    match flag {
        Some(min_games) => Ok(min_games),
        None => Ok(load_settings()?.min_games_per_comp),
    }
}

fn parse_symbol(input: &str) -> Result<Symbol, CliError> {
    Ok(Symbol::parse(input)?)
}

/// One listed instrument as shown to the user.
#[derive(Debug, Serialize)]
pub struct InstrumentView {
    pub symbol: String,
    pub close: f64,
    pub games: Option<u64>,
    pub confidence: &'static str,
    pub watched: bool,
}

impl InstrumentView {
    pub fn new(row: &InstrumentRow, watchlist: &Watchlist) -> Self {
        let symbol = row.symbol.to_string();
        Self {
            watched: watchlist.contains(&symbol),
            symbol,
            close: row.close,
            games: row.games,
            confidence: confidence_label(row.games),
        }
    }

    fn cells(&self) -> Vec<String> {
        vec![
            String::from(if self.watched { "*" } else { "" }),
            self.symbol.clone(),
            format_close(self.close),
            format_games(self.games),
            self.confidence.to_string(),
        ]
    }
}

pub const INSTRUMENT_HEADERS: [&str; 5] = ["", "SYMBOL", "CLOSE", "GAMES", "CONF"];

pub fn instrument_cells(views: &[InstrumentView]) -> Vec<Vec<String>> {
    views.iter().map(InstrumentView::cells).collect()
}
