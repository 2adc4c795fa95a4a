//! Watched symbols, persisted as a sorted JSON array next to the history.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use xcomp_store::{write_json_atomic, StoreConfig, StoreError};

#[derive(Debug, Clone)]
pub struct Watchlist {
    path: PathBuf,
    symbols: BTreeSet<String>,
}

impl Watchlist {
    pub fn path_for(config: &StoreConfig) -> PathBuf {
        config.data_dir().join("watchlist.json")
    }

    /// Load the list at `path`. A missing, unreadable or non-array file is
    /// an empty list.
    pub fn load(path: &Path) -> Self {
        let symbols = match fs::read_to_string(path) {
            Ok(text) => parse_symbols(path, &text),
            Err(error) => {
                debug!(path = %path.display(), %error, "watchlist not readable; starting empty");
                BTreeSet::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            symbols,
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    /// Flip the watched state of `symbol` and save. Returns the new state.
    pub fn toggle(&mut self, symbol: &str) -> Result<bool, StoreError> {
        let watched = if self.symbols.remove(symbol) {
            false
        } else {
            self.symbols.insert(symbol.to_string());
            true
        };
        self.save()?;
        Ok(watched)
    }

    /// Watch `symbol`. Returns whether the list changed.
    pub fn add(&mut self, symbol: &str) -> Result<bool, StoreError> {
        let changed = self.symbols.insert(symbol.to_string());
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    /// Stop watching `symbol`. Returns whether the list changed.
    pub fn remove(&mut self, symbol: &str) -> Result<bool, StoreError> {
        let changed = self.symbols.remove(symbol);
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    fn save(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &self.symbols)
    }
}

fn parse_symbols(path: &Path, text: &str) -> BTreeSet<String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(symbol) => symbol,
                other => other.to_string(),
            })
            .collect(),
        Ok(_) => {
            warn!(path = %path.display(), "watchlist is not a JSON array; ignoring it");
            BTreeSet::new()
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "watchlist is not valid JSON; ignoring it");
            BTreeSet::new()
        }
    }
}
