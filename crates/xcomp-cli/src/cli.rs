//! CLI argument definitions for xcomp.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `collect` | Sample challenger matches and record today's closes |
//! | `latest` | Base instruments on the latest recorded day |
//! | `variants` | Variants of one base on the latest recorded day |
//! | `series` | Daily close series for one symbol |
//! | `days` | Recorded day keys |
//! | `watch` | Manage the watched-symbols list |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--home` | `$XCOMP_HOME` | Data directory root |
//!
//! # Examples
//!
//! ```bash
//! # Record today's closes
//! XCOMP_RIOT_API_KEY=RGAPI-... xcomp collect
//!
//! # Browse the market
//! xcomp latest --min-games 20
//! xcomp variants /BILGEWATER:XCOMP
//! xcomp series /BILGEWATER4:XCOMP --format json --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// xcomp - synthetic market of Teamfight Tactics compositions
///
/// Each day's challenger matches are folded into per-composition closes;
/// trait-level base instruments are aggregated from them on read.
#[derive(Debug, Parser)]
#[command(
    name = "xcomp",
    author,
    version,
    about = "Synthetic market of Teamfight Tactics compositions"
)]
pub struct Cli {
    /// Output format for results.
    ///
    /// - table: aligned columns for the terminal (default)
    /// - json: single JSON document
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Data directory root; overrides XCOMP_HOME.
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON document.
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sample challenger matches and merge priced closes into a day.
    ///
    /// Reads XCOMP_RIOT_API_KEY and the other XCOMP_* settings from the
    /// environment; flags override them for one run.
    ///
    /// # Examples
    ///
    ///   xcomp collect
    ///   xcomp collect --players 10 --matches-per-player 5 --day 2024-05-01
    Collect(CollectArgs),

    /// List base instruments on the latest day, highest close first.
    ///
    /// # Examples
    ///
    ///   xcomp latest
    ///   xcomp latest --min-games 40 --search bilge --watched-first
    Latest(LatestArgs),

    /// List the variants of one base instrument on the latest day.
    ///
    /// # Examples
    ///
    ///   xcomp variants /BILGEWATER:XCOMP
    Variants(VariantsArgs),

    /// Show the daily close series of a base or variant symbol.
    ///
    /// # Examples
    ///
    ///   xcomp series /BILGEWATER:XCOMP
    ///   xcomp series /BILGEWATER4:XCOMP --format json
    Series(SeriesArgs),

    /// List every recorded day.
    Days,

    /// Manage the watched-symbols list.
    Watch(WatchArgs),
}

/// Arguments for the `collect` command.
#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Day to record the closes under (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub day: Option<String>,

    /// Challenger players to sample (overrides XCOMP_PLAYER_LIMIT).
    #[arg(long)]
    pub players: Option<usize>,

    /// Match ids fetched per player (overrides XCOMP_MATCHES_PER_PLAYER).
    #[arg(long)]
    pub matches_per_player: Option<usize>,

    /// Minimum games for a composition to be recorded (overrides
    /// XCOMP_MIN_GAMES_PER_COMP).
    #[arg(long)]
    pub min_games: Option<u64>,

    /// Skip writing the raw match snapshot.
    #[arg(long, default_value_t = false)]
    pub no_raw_snapshot: bool,
}

/// Arguments for the `latest` command.
#[derive(Debug, Args)]
pub struct LatestArgs {
    /// Hide instruments with fewer known games (defaults to
    /// XCOMP_MIN_GAMES_PER_COMP). Rows with unknown games are always shown.
    #[arg(long)]
    pub min_games: Option<u64>,

    /// Only show symbols containing this text (case-insensitive).
    #[arg(long)]
    pub search: Option<String>,

    /// List watched symbols before the rest.
    #[arg(long, default_value_t = false)]
    pub watched_first: bool,
}

/// Arguments for the `variants` command.
#[derive(Debug, Args)]
pub struct VariantsArgs {
    /// Base symbol, e.g. /BILGEWATER:XCOMP.
    pub base: String,

    /// Hide variants with fewer known games (defaults to
    /// XCOMP_MIN_GAMES_PER_COMP).
    #[arg(long)]
    pub min_games: Option<u64>,
}

/// Arguments for the `series` command.
#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Base or variant symbol.
    pub symbol: String,
}

/// Arguments for the `watch` command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    #[command(subcommand)]
    pub command: WatchCommand,
}

#[derive(Debug, Subcommand)]
pub enum WatchCommand {
    /// Print the watched symbols.
    List,
    /// Watch a symbol if unwatched, unwatch it otherwise.
    Toggle { symbol: String },
    /// Watch a symbol.
    Add { symbol: String },
    /// Stop watching a symbol.
    Remove { symbol: String },
}

impl Command {
    /// Default log filter when `RUST_LOG` is unset.
    pub const fn default_log_filter(&self) -> &'static str {
        match self {
            Self::Collect(_) => "info",
            _ => "warn",
        }
    }
}
