//! # Domain Models
//!
//! Canonical domain types for the xcomp market.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated instrument symbol (base or variant) |
//! | [`QuoteRow`] | Close price with optional games count |
//! | [`DayKey`] | ISO-8601 calendar day |
//! | [`MatchRecord`] | Raw upstream match with participants |
//! | [`Participant`] | One board: placement and trait activations |
//!
//! ## Validation
//!
//! Symbols and day keys enforce their invariants at construction time:
//!
//! ```rust
//! use xcomp_core::{Symbol, ValidationError};
//!
//! let variant = Symbol::parse("/BILGEWATER4:XCOMP")?;
//! assert_eq!(variant.base().to_string(), "/BILGEWATER:XCOMP");
//!
//! let invalid = Symbol::parse("/BILGEWATER04:XCOMP");
//! assert!(matches!(invalid, Err(ValidationError::InvalidTier { .. })));
//! # Ok::<(), ValidationError>(())
//! ```

mod day;
mod matches;
mod quote;
mod symbol;

pub use day::DayKey;
pub use matches::{
    MatchInfo, MatchMetadata, MatchRecord, Participant, TraitActivation, DEFAULT_PLACEMENT,
};
pub use quote::QuoteRow;
pub use symbol::Symbol;
