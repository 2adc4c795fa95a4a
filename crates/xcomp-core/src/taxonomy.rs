//! Symbol taxonomy: maps one participant's trait activations to a symbol.

use tracing::warn;

use crate::{Participant, Symbol};

/// Default number of traits kept in a composition signature.
pub const DEFAULT_TOP_N_TRAITS: usize = 1;

/// Strip the set namespace (`TFT9_Bilgewater` -> `BILGEWATER`) and upper-case.
///
/// Characters outside the symbol alphabet are dropped; a name that ends up
/// empty becomes `UNKNOWN`.
pub fn clean_trait_name(raw: &str) -> String {
    let unprefixed = raw.split_once('_').map_or(raw, |(_, rest)| rest);
    let cleaned = unprefixed
        .chars()
        .map(|ch| ch.to_ascii_uppercase())
        .filter(|ch| ch.is_ascii_uppercase() || ch.is_ascii_digit() || *ch == '_')
        .collect::<String>();

    if cleaned.is_empty() {
        String::from("UNKNOWN")
    } else {
        cleaned
    }
}

/// Build the composition symbol for one participant.
///
/// Zero-unit traits are ignored, the rest are ranked by active unit count
/// (stable, so upstream order breaks ties) and the first `top_n_traits` form
/// the signature, e.g. `/BILGEWATER4-NOXUS3:XCOMP`. With no active trait the
/// sentinel `/UNKNOWN:XCOMP` is returned.
pub fn comp_symbol(participant: &Participant, top_n_traits: usize) -> Symbol {
    let mut active = participant
        .traits
        .iter()
        .filter(|activation| activation.num_units > 0)
        .map(|activation| (clean_trait_name(&activation.name), activation.num_units))
        .collect::<Vec<_>>();

    active.sort_by(|left, right| right.1.cmp(&left.1));
    active.truncate(top_n_traits);

    if active.is_empty() {
        return Symbol::unknown();
    }

    let signature = active
        .iter()
        .map(|(name, units)| format!("{name}{units}"))
        .collect::<Vec<_>>()
        .join("-");

    Symbol::from_signature(&signature).unwrap_or_else(|error| {
        warn!(%signature, %error, "trait signature does not form a symbol; using sentinel");
        Symbol::unknown()
    })
}
