//! Favourites store — the in-memory favourites list, mirrored to durable
//! storage on every mutation.
//!
//! The list is read from storage exactly once, in `init`.  After that the
//! in-memory `Vec` is the source of truth and storage is write-only.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{Episode, FavouriteEntry};
use crate::storage::KeyValueStore;

/// Storage key holding the JSON array of favourites.
pub const FAVOURITES_KEY: &str = "favourites";

pub struct FavouritesStore {
    storage: Box<dyn KeyValueStore>,
    entries: Vec<FavouriteEntry>,
}

impl FavouritesStore {
    /// Load favourites from `storage`.  Never fails: an absent, unreadable or
    /// malformed blob yields an empty list.
    pub fn init(storage: Box<dyn KeyValueStore>) -> Self {
        let entries = match load_entries(storage.as_ref()) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("favourites: starting empty: {}", e);
                Vec::new()
            }
        };
        info!("favourites: loaded {} entries", entries.len());
        Self { storage, entries }
    }

    /// Append a favourite for `episode` with its provenance.  Rejects an
    /// episode that is already present without touching storage.
    ///
    /// On a storage failure the entry stays in memory and `Error::Storage` is
    /// returned so the caller can tell the user it was not saved.
    pub fn add(&mut self, episode: &Episode, show_title: &str, season_title: &str) -> Result<()> {
        if self.is_favourite(&episode.id) {
            return Err(Error::DuplicateFavourite(episode.id.clone()));
        }
        self.entries.push(FavouriteEntry {
            id: episode.id.clone(),
            title: episode.title.clone(),
            file: episode.file.clone(),
            show_title: show_title.to_string(),
            season_title: season_title.to_string(),
            added_at: Utc::now(),
        });
        self.persist()
    }

    /// Remove the entry with `id`.  Returns `Ok(false)` (and skips the write)
    /// when there was nothing to remove.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    pub fn is_favourite(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    /// Entries in the order they were added.
    pub fn list(&self) -> &[FavouriteEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&FavouriteEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shut the store down and hand the storage back.  Every mutation has
    /// already been written, so there is nothing left to flush.
    pub fn dispose(self) -> Box<dyn KeyValueStore> {
        self.storage
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.entries)
            .map_err(|e| Error::Storage(format!("serialize favourites: {}", e)))?;
        self.storage.set(FAVOURITES_KEY, &json).inspect_err(|e| {
            warn!("favourites: keeping unsaved change in memory: {}", e);
        })
    }
}

fn load_entries(storage: &dyn KeyValueStore) -> Result<Vec<FavouriteEntry>> {
    let Some(blob) = storage.get(FAVOURITES_KEY)? else {
        return Ok(Vec::new());
    };
    let mut entries: Vec<FavouriteEntry> =
        serde_json::from_str(&blob).map_err(|e| Error::MalformedData(e.to_string()))?;

    // A blob from an older writer may repeat an id; keep the first.
    let mut seen = HashSet::new();
    entries.retain(|e| seen.insert(e.id.clone()));
    Ok(entries)
}
