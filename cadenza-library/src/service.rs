//! Preset library service
//!
//! Keeps the user's saved presets as one JSON document under a single store
//! key. Every mutation rewrites the whole list; reads tolerate damaged state
//! by discarding what cannot be parsed or validated.

use cadenza_preset::{epoch_seconds, Preset, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::{KvStore, StoreError};

/// Store key the whole library serializes under
pub const LIBRARY_KEY: &str = "cadenza.presets";

/// Errors from library operations
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("no preset with id {0}")]
    NotFound(String),
    #[error("a preset named {0:?} already exists")]
    DuplicateName(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A saved preset plus its library bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub preset: Preset,
    /// Stable identifier, assigned once at creation
    pub id: String,
    pub created_at: u64,
    pub last_modified: u64,
    /// How many times the entry has been applied
    #[serde(default)]
    pub usage: u64,
    #[serde(default)]
    pub favorite: bool,
}

/// Preset library over a storage backend
pub struct PresetLibrary<S: KvStore> {
    store: S,
    entries: Vec<LibraryEntry>,
}

impl<S: KvStore> PresetLibrary<S> {
    /// Open the library, loading whatever valid state the store holds.
    pub fn open(store: S) -> Result<Self, LibraryError> {
        let mut library = Self {
            store,
            entries: Vec::new(),
        };
        library.load()?;
        Ok(library)
    }

    /// Reload entries from the store.
    ///
    /// Wholly unparsable stored JSON is cleared and treated as absent.
    /// Individual entries that fail to parse or validate are discarded.
    pub fn load(&mut self) -> Result<(), LibraryError> {
        self.entries.clear();

        let Some(raw) = self.store.get(LIBRARY_KEY)? else {
            return Ok(());
        };

        let values: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(err) => {
                warn!(%err, "stored library is unreadable, clearing it");
                self.store.remove(LIBRARY_KEY)?;
                return Ok(());
            }
        };

        for value in values {
            match serde_json::from_value::<LibraryEntry>(value) {
                Ok(entry) => match entry.preset.validate() {
                    Ok(()) => self.entries.push(entry),
                    Err(err) => {
                        warn!(id = %entry.id, %err, "discarding invalid stored preset")
                    }
                },
                Err(err) => warn!(%err, "discarding unparsable library entry"),
            }
        }

        self.entries
            .sort_by(|a, b| a.preset.name.cmp(&b.preset.name));
        debug!(entries = self.entries.len(), "library loaded");
        Ok(())
    }

    /// Add a preset, or update the existing entry with the same name.
    ///
    /// A same-name add replaces the preset payload and bumps `last_modified`
    /// but keeps the entry's id, creation time, usage count, and favorite
    /// flag.
    pub fn add(&mut self, preset: Preset) -> Result<LibraryEntry, LibraryError> {
        preset.validate()?;
        let preset = preset.normalized();
        let now = epoch_seconds();

        let entry = if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.preset.name == preset.name)
        {
            existing.preset = preset;
            existing.last_modified = now;
            existing.clone()
        } else {
            let entry = LibraryEntry {
                id: format!("{}-{now}", slug(&preset.name)),
                preset,
                created_at: now,
                last_modified: now,
                usage: 0,
                favorite: false,
            };
            self.entries.push(entry.clone());
            entry
        };

        self.entries
            .sort_by(|a, b| a.preset.name.cmp(&b.preset.name));
        self.persist()?;
        Ok(entry)
    }

    /// Remove an entry by id.
    pub fn remove(&mut self, id: &str) -> Result<(), LibraryError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Err(LibraryError::NotFound(id.to_string()));
        }
        self.persist()
    }

    /// Record one application of a preset.
    pub fn increment_usage(&mut self, id: &str) -> Result<(), LibraryError> {
        let entry = self.entry_mut(id)?;
        entry.usage += 1;
        entry.last_modified = epoch_seconds();
        self.persist()
    }

    /// Flip an entry's favorite flag, returning the new state.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool, LibraryError> {
        let entry = self.entry_mut(id)?;
        entry.favorite = !entry.favorite;
        entry.last_modified = epoch_seconds();
        let favorite = entry.favorite;
        self.persist()?;
        Ok(favorite)
    }

    /// Rename an entry, keeping its id and counters.
    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<(), LibraryError> {
        if self
            .entries
            .iter()
            .any(|e| e.id != id && e.preset.name == new_name)
        {
            return Err(LibraryError::DuplicateName(new_name.to_string()));
        }
        let entry = self.entry_mut(id)?;
        entry.preset.name = new_name.to_string();
        entry.last_modified = epoch_seconds();
        self.entries
            .sort_by(|a, b| a.preset.name.cmp(&b.preset.name));
        self.persist()
    }

    /// Case-insensitive substring search over name, description, and source.
    pub fn search(&self, query: &str) -> Vec<&LibraryEntry> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| {
                e.preset.name.to_lowercase().contains(&needle)
                    || e.preset.description.to_lowercase().contains(&needle)
                    || format!("{:?}", e.preset.source)
                        .to_lowercase()
                        .contains(&needle)
            })
            .collect()
    }

    /// The most-applied entries, ties broken by name order.
    pub fn most_used(&self, limit: usize) -> Vec<&LibraryEntry> {
        let mut ranked: Vec<&LibraryEntry> = self.entries.iter().collect();
        ranked.sort_by(|a, b| b.usage.cmp(&a.usage));
        ranked.truncate(limit);
        ranked
    }

    /// Entries flagged as favorites, in name order.
    pub fn favorites(&self) -> Vec<&LibraryEntry> {
        self.entries.iter().filter(|e| e.favorite).collect()
    }

    /// All entries, sorted by name.
    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&LibraryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&LibraryEntry> {
        self.entries.iter().find(|e| e.preset.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The library serialized the way `persist` stores it.
    pub fn to_json(&self) -> Result<String, LibraryError> {
        Ok(serde_json::to_string(&self.entries)
            .map_err(|e| StoreError::Backend(e.to_string()))?)
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut LibraryEntry, LibraryError> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| LibraryError::NotFound(id.to_string()))
    }

    /// Write the full list to the store.
    ///
    /// On `QuotaExceeded` a single reduced write with descriptions stripped
    /// is attempted; a quota failure never fails the operation itself.
    fn persist(&mut self) -> Result<(), LibraryError> {
        let json = self.to_json()?;
        match self.store.set(LIBRARY_KEY, &json) {
            Ok(()) => Ok(()),
            Err(StoreError::QuotaExceeded) => {
                warn!("library write hit storage quota, retrying without descriptions");
                let mut reduced = self.entries.clone();
                for entry in &mut reduced {
                    entry.preset.description.clear();
                }
                let json = serde_json::to_string(&reduced)
                    .map_err(|e| StoreError::Backend(e.to_string()))?;
                if let Err(err) = self.store.set(LIBRARY_KEY, &json) {
                    warn!(%err, "reduced library write failed, keeping in-memory state");
                }
                Ok(())
            }
            Err(other) => Err(other.into()),
        }
    }
}

/// Lowercased name with runs of non-alphanumerics collapsed to single dashes
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "preset".to_string()
    } else {
        trimmed.to_string()
    }
}
