//! The persisted history document: day key to day book.
//!
//! Loading is tolerant of legacy and foreign rows. Only a document whose
//! structure cannot be interpreted at all is reported as an error.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::ser::Error as SerError;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use xcomp_core::{DayKey, QuoteRow, Symbol};

use crate::atomic::write_json_atomic;
use crate::StoreError;

/// All rows recorded for one calendar day.
///
/// Entries whose key is not a valid symbol, whose value carries no
/// recoverable close price, or whose key spells a symbol already loaded, are
/// kept verbatim in `unrecognized` so that a rewrite never drops them. They take part in no lookup or aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayBook {
    rows: BTreeMap<Symbol, QuoteRow>,
    unrecognized: BTreeMap<String, Value>,
}

impl DayBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &BTreeMap<Symbol, QuoteRow> {
        &self.rows
    }

    pub fn get(&self, symbol: &Symbol) -> Option<&QuoteRow> {
        self.rows.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of persisted entries that could not be interpreted.
    pub fn unrecognized_len(&self) -> usize {
        self.unrecognized.len()
    }

    /// Insert one row, overwriting any previous row for the symbol.
    pub fn insert(&mut self, symbol: Symbol, row: QuoteRow) -> Option<QuoteRow> {
        self.unrecognized.remove(&symbol.to_string());
        self.rows.insert(symbol, row)
    }

    /// Upsert rows with last-write-wins per symbol. Returns the number of rows
    /// written.
    pub fn merge<I>(&mut self, rows: I) -> usize
    where
        I: IntoIterator<Item = (Symbol, QuoteRow)>,
    {
        let mut written = 0;
        for (symbol, row) in rows {
            self.insert(symbol, row);
            written += 1;
        }
        written
    }

    fn from_object(day: &DayKey, object: &Map<String, Value>) -> Self {
        let mut book = Self::default();
        let mut parsed = Vec::with_capacity(object.len());
        let mut legacy = 0_usize;

        for (key, value) in object {
            let symbol = match Symbol::parse(key) {
                Ok(symbol) => symbol,
                Err(error) => {
                    warn!(%day, key, %error, "keeping day-book entry with an invalid symbol");
                    book.unrecognized.insert(key.clone(), value.clone());
                    continue;
                }
            };

            let Some(row) = QuoteRow::from_value(value) else {
                warn!(%day, key, "keeping day-book entry without a readable close");
                book.unrecognized.insert(key.clone(), value.clone());
                continue;
            };

            if !value.is_object() {
                legacy += 1;
            }
            parsed.push((key, value, symbol, row));
        }

        // Keys already in canonical form claim their symbol first, so a
        // spelling variant can never shadow them on rewrite.
        parsed.sort_by_key(|(key, _, symbol, _)| **key != symbol.to_string());

        for (key, value, symbol, row) in parsed {
            match book.rows.entry(symbol) {
                Entry::Vacant(entry) => {
                    entry.insert(row);
                }
                Entry::Occupied(entry) => {
                    warn!(
                        %day,
                        key,
                        symbol = %entry.key(),
                        "keeping day-book entry that repeats another key's symbol"
                    );
                    book.unrecognized.insert(key.clone(), value.clone());
                }
            }
        }

        if legacy > 0 {
            debug!(%day, rows = legacy, "normalized legacy close-only rows");
        }
        book
    }
}

impl Serialize for DayBook {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut entries = self.unrecognized.clone();
        for (symbol, row) in &self.rows {
            let value = serde_json::to_value(row).map_err(S::Error::custom)?;
            entries.insert(symbol.to_string(), value);
        }
        entries.serialize(serializer)
    }
}

/// Every recorded day, in ascending chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    days: BTreeMap<DayKey, DayBook>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the history document at `path`. A missing or blank file is an
    /// empty history.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "history document not found; starting empty");
                return Ok(Self::default());
            }
            Err(error) => return Err(StoreError::Io(error)),
        };

        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let document: Value =
            serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_document(path, &document)
    }

    fn from_document(path: &Path, document: &Value) -> Result<Self, StoreError> {
        let Value::Object(days) = document else {
            return Err(StoreError::Malformed {
                path: path.to_path_buf(),
                reason: String::from("top level must be an object keyed by day"),
            });
        };

        let mut history = Self::default();
        for (key, book) in days {
            let day = DayKey::parse(key).map_err(|_| StoreError::InvalidDayKey {
                path: path.to_path_buf(),
                value: key.clone(),
            })?;
            let Value::Object(object) = book else {
                return Err(StoreError::Malformed {
                    path: path.to_path_buf(),
                    reason: format!("day '{key}' must map symbols to rows"),
                });
            };
            match history.days.entry(day) {
                Entry::Vacant(entry) => {
                    entry.insert(DayBook::from_object(&day, object));
                }
                Entry::Occupied(_) => {
                    return Err(StoreError::Malformed {
                        path: path.to_path_buf(),
                        reason: format!("day '{key}' repeats day {day} under another spelling"),
                    });
                }
            }
        }
        Ok(history)
    }

    /// Atomically replace the document at `path` with this history.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_json_atomic(path, self)
    }

    pub fn day(&self, day: &DayKey) -> Option<&DayBook> {
        self.days.get(day)
    }

    /// The book for `day`, created empty when absent.
    pub fn day_mut(&mut self, day: DayKey) -> &mut DayBook {
        match self.days.entry(day) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(DayBook::new()),
        }
    }

    pub fn days(&self) -> impl Iterator<Item = &DayKey> {
        self.days.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DayKey, &DayBook)> {
        self.days.iter()
    }

    pub fn latest(&self) -> Option<(&DayKey, &DayBook)> {
        self.days.iter().next_back()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl Serialize for History {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.days.iter())
    }
}
