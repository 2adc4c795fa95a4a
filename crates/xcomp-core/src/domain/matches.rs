use serde::{Deserialize, Serialize};

/// Placement assumed for a participant whose placement is missing.
pub const DEFAULT_PLACEMENT: u8 = 8;

/// One raw match record as returned by the upstream match endpoint.
///
/// Only the fields the statistics need are modelled; everything else in the
/// upstream payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub metadata: MatchMetadata,
    pub info: MatchInfo,
}

impl MatchRecord {
    pub fn match_id(&self) -> &str {
        &self.metadata.match_id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.info.participants
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchMetadata {
    #[serde(default)]
    pub match_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchInfo {
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// One board in a match: final placement (1..=8) and trait activations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(default = "default_placement")]
    pub placement: u8,
    #[serde(default)]
    pub traits: Vec<TraitActivation>,
}

impl Participant {
    pub fn new(placement: u8, traits: Vec<TraitActivation>) -> Self {
        Self { placement, traits }
    }

    pub const fn is_win(&self) -> bool {
        self.placement == 1
    }

    pub const fn is_top4(&self) -> bool {
        self.placement <= 4
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitActivation {
    #[serde(default = "default_trait_name")]
    pub name: String,
    #[serde(default)]
    pub num_units: u32,
}

impl TraitActivation {
    pub fn new(name: impl Into<String>, num_units: u32) -> Self {
        Self {
            name: name.into(),
            num_units,
        }
    }
}

fn default_placement() -> u8 {
    DEFAULT_PLACEMENT
}

fn default_trait_name() -> String {
    String::from("UNKNOWN")
}
