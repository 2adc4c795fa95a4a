use serde::Serialize;
use tracing::info;
use xcomp_core::{
    build_day_rows, dedupe_matches, CollectorSettings, DayKey, LinearPrice, MatchSource,
    PriceFunction, RiotMatchSource,
};
use xcomp_store::MarketStore;

use crate::cli::CollectArgs;
use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
struct CollectSummary {
    day: DayKey,
    symbols: usize,
    players: usize,
    matches: usize,
    boards: u64,
    raw_snapshot: Option<String>,
}

pub async fn run(
    args: &CollectArgs,
    context: &Context,
    settings: CollectorSettings,
) -> Result<CommandResult, CliError> {
    let settings = apply_overrides(args, settings)?;
    let day = args.day.as_deref().map(DayKey::parse).transpose()?;
    let source = RiotMatchSource::from_settings(&settings);

    let summary = collect_day(
        &source,
        &settings,
        &LinearPrice::default(),
        &context.store,
        day,
    )
    .await?;

    let line = format!(
        "Saved closes for day {}. Symbols (filtered): {}",
        summary.day, summary.symbols
    );
    CommandResult::new(&summary, vec![line])
}

fn apply_overrides(
    args: &CollectArgs,
    mut settings: CollectorSettings,
) -> Result<CollectorSettings, CliError> {
    if let Some(players) = args.players {
        settings.player_limit = players;
    }
    if let Some(matches) = args.matches_per_player {
        settings.matches_per_player = matches;
    }
    if let Some(min_games) = args.min_games {
        settings.min_games_per_comp = min_games;
    }
    if args.no_raw_snapshot {
        settings.write_raw_snapshot = false;
    }

    if settings.player_limit == 0 || settings.matches_per_player == 0 {
        return Err(CliError::Command(String::from(
            "--players and --matches-per-player must be greater than zero",
        )));
    }
    Ok(settings)
}

async fn collect_day<P>(
    source: &RiotMatchSource,
    settings: &CollectorSettings,
    price: &P,
    store: &MarketStore,
    day: Option<DayKey>,
) -> Result<CollectSummary, CliError>
where
    P: PriceFunction + ?Sized,
{
    info!(
        platform = %settings.platform,
        region = %settings.region,
        players = settings.player_limit,
        matches_per_player = settings.matches_per_player,
        "starting collection run"
    );

    let players = source.challenger_player_ids(settings.player_limit).await?;
    let fetched = source.fetch(&players, settings.matches_per_player).await?;
    let matches = dedupe_matches(fetched);
    info!(players = players.len(), matches = matches.len(), "fetched match batch");

    let raw_snapshot = if settings.write_raw_snapshot {
        let path = store.write_raw_snapshot(&matches)?;
        info!(path = %path.display(), "wrote raw match snapshot");
        Some(path.display().to_string())
    } else {
        None
    };

    let day_rows = build_day_rows(
        &matches,
        settings.top_n_traits,
        settings.min_games_per_comp,
        price,
    );
    let symbols = day_rows.rows.len();
    let boards = day_rows.stats.total_boards;
    info!(
        compositions = day_rows.stats.len(),
        kept = symbols,
        min_games = settings.min_games_per_comp,
        "priced compositions"
    );

    let day = store.merge_day(day, day_rows.rows)?;

    Ok(CollectSummary {
        day,
        symbols,
        players: players.len(),
        matches: matches.len(),
        boards,
        raw_snapshot,
    })
}
