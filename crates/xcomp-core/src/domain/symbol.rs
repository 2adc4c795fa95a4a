use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const PREFIX: &str = "/";
const SUFFIX: &str = ":XCOMP";
const UNKNOWN_NAME: &str = "UNKNOWN";

/// Canonical instrument symbol, `/<SIGNATURE>:XCOMP`.
///
/// The signature is split once, at parse time, into a trait `name` and an
/// optional `tier` (the longest trailing run of digits). A symbol with a tier
/// is a variant instrument; without one it is a base instrument. Every
/// variant belongs to exactly one base: the same name with the tier removed.
///
/// Formatting a parsed symbol always yields the normalized input back, so
/// tiers with leading zeros or a value of zero are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    name: String,
    tier: Option<u32>,
}

impl Symbol {
    /// Parse and normalize a symbol to uppercase.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }

        let normalized = trimmed.to_ascii_uppercase();
        let signature = normalized
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_suffix(SUFFIX))
            .ok_or_else(|| ValidationError::SymbolMalformed {
                value: trimmed.to_string(),
            })?;

        Self::from_signature(signature)
    }

    /// Build a symbol from the bare signature, e.g. `BILGEWATER4`.
    pub fn from_signature(signature: &str) -> Result<Self, ValidationError> {
        if signature.is_empty() {
            return Err(ValidationError::EmptySignature);
        }

        for (index, ch) in signature.chars().enumerate() {
            let valid = ch.is_ascii_uppercase() || ch.is_ascii_digit() || ch == '-' || ch == '_';
            if !valid {
                return Err(ValidationError::SymbolInvalidChar { ch, index });
            }
        }

        let split = signature.trim_end_matches(|ch: char| ch.is_ascii_digit()).len();
        let (name, digits) = signature.split_at(split);
        if name.is_empty() {
            return Err(ValidationError::SignatureWithoutName {
                value: signature.to_string(),
            });
        }

        let tier = if digits.is_empty() {
            None
        } else {
            Some(parse_tier(digits)?)
        };

        Ok(Self {
            name: name.to_string(),
            tier,
        })
    }

    /// The sentinel symbol for participants without any active trait.
    pub fn unknown() -> Self {
        Self {
            name: String::from(UNKNOWN_NAME),
            tier: None,
        }
    }

    /// Trait name, i.e. the signature without its tier.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn tier(&self) -> Option<u32> {
        self.tier
    }

    pub const fn is_variant(&self) -> bool {
        self.tier.is_some()
    }

    pub const fn is_base(&self) -> bool {
        self.tier.is_none()
    }

    /// The base instrument this symbol aggregates into. A base is its own base.
    pub fn base(&self) -> Self {
        Self {
            name: self.name.clone(),
            tier: None,
        }
    }

    /// Returns `(base, trait name)` for a variant, `None` for a base symbol.
    pub fn split_variant(&self) -> Option<(Self, &str)> {
        self.tier.map(|_| (self.base(), self.name.as_str()))
    }

    /// Whether this symbol is a variant of the given base.
    pub fn is_variant_of(&self, base: &Symbol) -> bool {
        base.is_base() && self.is_variant() && self.name == base.name
    }

    pub fn signature(&self) -> String {
        match self.tier {
            Some(tier) => format!("{}{tier}", self.name),
            None => self.name.clone(),
        }
    }
}

fn parse_tier(digits: &str) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::InvalidTier {
        value: digits.to_string(),
    };

    if digits.starts_with('0') {
        return Err(invalid());
    }

    digits.parse::<u32>().map_err(|_| invalid())
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(PREFIX)?;
        f.write_str(&self.name)?;
        if let Some(tier) = self.tier {
            write!(f, "{tier}")?;
        }
        f.write_str(SUFFIX)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.to_string()
    }
}
