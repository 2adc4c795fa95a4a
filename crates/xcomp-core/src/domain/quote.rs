use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One instrument's closing row for a day.
///
/// `games` is the observation count backing `close`; it is `None` for legacy
/// rows that were persisted as a bare close price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuoteRow {
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub games: Option<u64>,
}

impl QuoteRow {
    pub const fn new(close: f64, games: Option<u64>) -> Self {
        Self { close, games }
    }

    pub const fn with_games(close: f64, games: u64) -> Self {
        Self::new(close, Some(games))
    }

    /// A legacy close-only row.
    pub const fn close_only(close: f64) -> Self {
        Self::new(close, None)
    }

    /// Normalize any persisted row encoding into a canonical row.
    ///
    /// Accepts a bare number (legacy), a numeric string, or an object
    /// `{close, games?}`. A missing `close` reads as `0.0`; absent, null,
    /// negative or non-numeric `games` read as unknown. Returns `None` when no
    /// close price can be recovered at all.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_f64().map(Self::close_only),
            Value::String(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|close| close.is_finite())
                .map(Self::close_only),
            Value::Object(map) => {
                let close = match map.get("close") {
                    None | Some(Value::Null) => 0.0,
                    Some(other) => close_from_value(other)?,
                };
                let games = map.get("games").and_then(games_from_value);
                Some(Self::new(close, games))
            }
            _ => None,
        }
    }
}

fn close_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn games_from_value(value: &Value) -> Option<u64> {
    let games = match value {
        Value::Number(number) => number.as_f64()?,
        _ => return None,
    };

    if games.is_finite() && games >= 0.0 {
        Some(games.trunc() as u64)
    } else {
        None
    }
}

impl<'de> Deserialize<'de> for QuoteRow {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| D::Error::custom(format!("unrecognized quote row: {value}")))
    }
}
