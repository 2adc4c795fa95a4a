//! Static collection-run settings, read from `XCOMP_*` environment variables.

use std::env;
use std::str::FromStr;

use crate::retry::{BackoffKind, RetryConfig};
use crate::taxonomy::DEFAULT_TOP_N_TRAITS;
use crate::ValidationError;

/// Settings for one collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Upstream API key; `None` is only an error once a request is made.
    pub api_key: Option<String>,
    /// Platform routing host for ladder endpoints (e.g. `na1`).
    pub platform: String,
    /// Regional routing host for match endpoints (e.g. `americas`).
    pub region: String,
    /// Number of challenger players sampled.
    pub player_limit: usize,
    /// Match ids requested per player.
    pub matches_per_player: usize,
    /// Traits kept per composition signature.
    pub top_n_traits: usize,
    /// Minimum games for a symbol to be written to the day book.
    pub min_games_per_comp: u64,
    /// Whether the deduplicated raw batch is written next to the history.
    pub write_raw_snapshot: bool,
    /// Retries per upstream request after the first attempt.
    pub max_retries: u32,
    /// Delay growth between retries.
    pub retry_backoff: BackoffKind,
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            platform: String::from("na1"),
            region: String::from("americas"),
            player_limit: 50,
            matches_per_player: 20,
            top_n_traits: DEFAULT_TOP_N_TRAITS,
            min_games_per_comp: 5,
            write_raw_snapshot: true,
            max_retries: 6,
            retry_backoff: BackoffKind::Linear,
        }
    }
}

impl CollectorSettings {
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup; unset or blank
    /// variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let settings = Self {
            api_key: get("XCOMP_RIOT_API_KEY"),
            platform: get("XCOMP_PLATFORM").unwrap_or(defaults.platform),
            region: get("XCOMP_REGION").unwrap_or(defaults.region),
            player_limit: parse_or(
                "XCOMP_PLAYER_LIMIT",
                get("XCOMP_PLAYER_LIMIT"),
                defaults.player_limit,
            )?,
            matches_per_player: parse_or(
                "XCOMP_MATCHES_PER_PLAYER",
                get("XCOMP_MATCHES_PER_PLAYER"),
                defaults.matches_per_player,
            )?,
            top_n_traits: parse_or(
                "XCOMP_TOP_N_TRAITS",
                get("XCOMP_TOP_N_TRAITS"),
                defaults.top_n_traits,
            )?,
            min_games_per_comp: parse_or(
                "XCOMP_MIN_GAMES_PER_COMP",
                get("XCOMP_MIN_GAMES_PER_COMP"),
                defaults.min_games_per_comp,
            )?,
            write_raw_snapshot: parse_flag(
                "XCOMP_RAW_SNAPSHOT",
                get("XCOMP_RAW_SNAPSHOT"),
                defaults.write_raw_snapshot,
            )?,
            max_retries: parse_or(
                "XCOMP_MAX_RETRIES",
                get("XCOMP_MAX_RETRIES"),
                defaults.max_retries,
            )?,
            retry_backoff: parse_backoff(get("XCOMP_RETRY_BACKOFF"), defaults.retry_backoff)?,
        };

        if settings.top_n_traits == 0 {
            return Err(ValidationError::InvalidSetting {
                name: "XCOMP_TOP_N_TRAITS",
                value: String::from("0"),
                reason: "at least one trait must be kept",
            });
        }

        Ok(settings)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::for_kind(self.retry_backoff, self.max_retries)
    }
}

fn parse_backoff(
    value: Option<String>,
    default: BackoffKind,
) -> Result<BackoffKind, ValidationError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    BackoffKind::parse(&raw).ok_or(ValidationError::InvalidSetting {
        name: "XCOMP_RETRY_BACKOFF",
        value: raw,
        reason: "expected fixed, linear or exponential",
    })
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ValidationError> {
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ValidationError::InvalidSetting {
            name,
            value: raw,
            reason: "expected a non-negative integer",
        }),
    }
}

fn parse_flag(
    name: &'static str,
    value: Option<String>,
    default: bool,
) -> Result<bool, ValidationError> {
    let Some(raw) = value else {
        return Ok(default);
    };

    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ValidationError::InvalidSetting {
            name,
            value: raw,
            reason: "expected a boolean flag",
        }),
    }
}
