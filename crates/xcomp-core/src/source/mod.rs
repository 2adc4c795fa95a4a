//! Raw match source contract and its error model.
//!
//! The market core never talks to the network itself. A collection run asks a
//! [`MatchSource`] for a finite batch of [`MatchRecord`]s; the source owns its
//! own throttling and retry behaviour and either returns the batch or fails.
//!
//! | Kind | Retryable | Meaning |
//! |------|-----------|---------|
//! | `Configuration` | no | missing credentials or bad static settings |
//! | `RateLimited` | yes | upstream throttling outlasted the retry budget |
//! | `Unavailable` | yes | transport failures or 5xx outlasted the retry budget |
//! | `InvalidRequest` | no | upstream rejected the request (4xx) |
//! | `Decode` | no | upstream payload did not match the expected shape |
//! | `Internal` | no | anything else |

mod riot;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::MatchRecord;

pub use riot::{RiotMatchSource, RiotRoutes};

/// Source-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Configuration,
    RateLimited,
    Unavailable,
    InvalidRequest,
    Decode,
    Internal,
}

/// Structured error returned by a match source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Configuration,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Decode,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Configuration => "source.configuration",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::Decode => "source.decode",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Raw match source contract.
///
/// `fetch` returns up to `count_per_player` recent matches for each player.
/// The same match may appear once per participating player; callers
/// deduplicate by match id before aggregating.
pub trait MatchSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        player_ids: &'a [String],
        count_per_player: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MatchRecord>, SourceError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_retryability_follow_kind() {
        let error = SourceError::rate_limited("too many retries");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        assert!(error.retryable());
        assert_eq!(error.to_string(), "too many retries (source.rate_limited)");

        let error = SourceError::configuration("api key missing");
        assert!(!error.retryable());
        assert_eq!(error.code(), "source.configuration");
    }
}
