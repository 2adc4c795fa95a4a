//! Core contracts for xcomp.
//!
//! This crate contains:
//! - Canonical domain models and validation (symbols, day keys, quote rows)
//! - The trait-signature taxonomy and per-composition statistics
//! - The price function contract
//! - The raw match source contract and its Riot API implementation
//! - Pure collection-run steps and static settings

pub mod collect;
pub mod config;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod pricing;
pub mod retry;
pub mod source;
pub mod stats;
pub mod taxonomy;

pub use collect::{build_day_rows, dedupe_matches, DayRows};
pub use config::CollectorSettings;
pub use domain::{
    DayKey, MatchInfo, MatchMetadata, MatchRecord, Participant, QuoteRow, Symbol,
    TraitActivation, DEFAULT_PLACEMENT,
};
pub use error::ValidationError;
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use pricing::{LinearPrice, PriceFunction};
pub use retry::{Backoff, BackoffKind, RetryConfig};
pub use source::{MatchSource, RiotMatchSource, RiotRoutes, SourceError, SourceErrorKind};
pub use stats::{aggregate_comp_stats, CompStats, StatsBatch};
pub use taxonomy::{clean_trait_name, comp_symbol, DEFAULT_TOP_N_TRAITS};
