//! The record store the feed and the admin desk talk to.
//!
//! [`AdStore`] is the whole contract.  The application constructs one store
//! at startup and hands an `Arc<dyn AdStore>` to whoever needs it, so tests
//! can swap in [`MemoryStore`] or a failing double.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ad::{Ad, AdId, AdStats, AdUpdate, NewAd};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("store file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ad {0} not found")]
    NotFound(AdId),
    #[error("{0}")]
    Validation(String),
    #[error("No valid updates provided")]
    EmptyUpdate,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Operations against the ad table.  Implementations must be usable from
/// worker threads.
pub trait AdStore: Send + Sync {
    /// Every ad, newest first.  The feed imposes its own order on top.
    fn list_all(&self) -> Result<Vec<Ad>, StoreError>;
    /// Bump the click counter of `id` by one.
    fn register_interaction(&self, id: AdId) -> Result<(), StoreError>;
    fn create(&self, ad: NewAd) -> Result<Ad, StoreError>;
    fn update(&self, id: AdId, update: AdUpdate) -> Result<Ad, StoreError>;
    fn delete(&self, id: AdId) -> Result<(), StoreError>;
    fn stats(&self) -> Result<AdStats, StoreError>;
    /// Drop every ad and restart id assignment.
    fn reset(&self) -> Result<(), StoreError>;
}

// ───────────────────────────────────────── table ─────────────

/// The persisted document: id counter plus rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AdTable {
    next_id: AdId,
    ads: Vec<Ad>,
}

impl Default for AdTable {
    fn default() -> Self {
        Self {
            next_id: 1,
            ads: Vec::new(),
        }
    }
}

impl AdTable {
    fn seeded() -> Self {
        let mut table = Self::default();
        for i in 1..=SEED_COUNT {
            let ad = NewAd {
                title: format!("Ad {i}"),
                description: format!("Sample ad description {i}"),
                image_url: format!(
                    "https://via.placeholder.com/300x200/4F46E5/FFFFFF?text=Ad+{i}"
                ),
                smart_link: format!("https://example.com/offer/{i}"),
            };
            // Seed rows are well-formed by construction.
            if let Ok(ad) = ad.normalise() {
                table.insert(ad);
            }
        }
        table
    }

    fn insert(&mut self, ad: NewAd) -> Ad {
        let row = Ad {
            id: self.next_id,
            title: ad.title,
            description: ad.description,
            image_url: ad.image_url,
            smart_link: ad.smart_link,
            clicks: 0,
            created_at: Utc::now(),
        };
        self.next_id += 1;
        self.ads.push(row.clone());
        row
    }

    fn newest_first(&self) -> Vec<Ad> {
        let mut out = self.ads.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        out
    }

    fn get_mut(&mut self, id: AdId) -> Result<&mut Ad, StoreError> {
        self.ads
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn create(&mut self, ad: NewAd) -> Result<Ad, StoreError> {
        let ad = ad.normalise()?;
        Ok(self.insert(ad))
    }

    fn update(&mut self, id: AdId, update: &AdUpdate) -> Result<Ad, StoreError> {
        let row = self.get_mut(id)?;
        update.apply_to(row)?;
        Ok(row.clone())
    }

    fn delete(&mut self, id: AdId) {
        self.ads.retain(|a| a.id != id);
    }

    fn bump(&mut self, id: AdId) -> Result<(), StoreError> {
        let row = self.get_mut(id)?;
        row.clicks = row.clicks.saturating_add(1);
        Ok(())
    }
}

/// Number of sample ads written into a fresh store.
pub const SEED_COUNT: usize = 8;

// ───────────────────────────────────────── memory ────────────

/// In-process store, used by `--memory` and by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<AdTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with the sample ads.
    pub fn seeded() -> Self {
        Self {
            table: Mutex::new(AdTable::seeded()),
        }
    }

    fn with_table<R>(
        &self,
        f: impl FnOnce(&mut AdTable) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut table = self
            .table
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        f(&mut table)
    }
}

impl AdStore for MemoryStore {
    fn list_all(&self) -> Result<Vec<Ad>, StoreError> {
        self.with_table(|t| Ok(t.newest_first()))
    }

    fn register_interaction(&self, id: AdId) -> Result<(), StoreError> {
        self.with_table(|t| t.bump(id))
    }

    fn create(&self, ad: NewAd) -> Result<Ad, StoreError> {
        self.with_table(|t| t.create(ad))
    }

    fn update(&self, id: AdId, update: AdUpdate) -> Result<Ad, StoreError> {
        self.with_table(|t| t.update(id, &update))
    }

    fn delete(&self, id: AdId) -> Result<(), StoreError> {
        self.with_table(|t| {
            t.delete(id);
            Ok(())
        })
    }

    fn stats(&self) -> Result<AdStats, StoreError> {
        self.with_table(|t| Ok(AdStats::from_ads(&t.ads)))
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.with_table(|t| {
            *t = AdTable::default();
            Ok(())
        })
    }
}

// ───────────────────────────────────────── json file ─────────

/// Store backed by a single JSON document on disk.
///
/// Every operation re-reads the file, so edits made by another process are
/// picked up on the next call.  Writes go through a temp file and a rename.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (or create and seed) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };
        if !store.path.exists() {
            tracing::info!(path = %store.path.display(), "seeding new ad store");
            store.write(&AdTable::seeded())?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<AdTable, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AdTable::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, table: &AdTable) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(table)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read-modify-write under the store lock.
    fn transact<R>(
        &self,
        f: impl FnOnce(&mut AdTable) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        let mut table = self.read()?;
        let out = f(&mut table)?;
        self.write(&table)?;
        Ok(out)
    }
}

impl AdStore for JsonFileStore {
    fn list_all(&self) -> Result<Vec<Ad>, StoreError> {
        Ok(self.read()?.newest_first())
    }

    fn register_interaction(&self, id: AdId) -> Result<(), StoreError> {
        tracing::debug!(id, "incrementing clicks");
        self.transact(|t| t.bump(id))
    }

    fn create(&self, ad: NewAd) -> Result<Ad, StoreError> {
        self.transact(|t| t.create(ad))
    }

    fn update(&self, id: AdId, update: AdUpdate) -> Result<Ad, StoreError> {
        self.transact(|t| t.update(id, &update))
    }

    fn delete(&self, id: AdId) -> Result<(), StoreError> {
        self.transact(|t| {
            t.delete(id);
            Ok(())
        })
    }

    fn stats(&self) -> Result<AdStats, StoreError> {
        Ok(AdStats::from_ads(&self.read()?.ads))
    }

    fn reset(&self) -> Result<(), StoreError> {
        self.transact(|t| {
            *t = AdTable::default();
            Ok(())
        })
    }
}
