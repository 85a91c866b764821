//! Gallery store - rated photos, persisted wholesale on every change

use crate::error::{GalleryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Storage key holding the serialized gallery
pub const STORAGE_KEY: &str = "orionPhotos";

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 10;
pub const DEFAULT_RATING: u8 = 5;

/// Largest id that survives a round trip through a JSON number
pub const MAX_PHOTO_ID: u64 = (1 << 53) - 1;

/// Cuteness rating, always within 1..=10
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Result<Self> {
        if (MIN_RATING as i64..=MAX_RATING as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(GalleryError::InvalidRating(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self(DEFAULT_RATING)
    }
}

impl TryFrom<i64> for Rating {
    type Error = GalleryError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

/// A rated photo as stored in the gallery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: u64,
    /// Self-contained data URL
    pub src: String,
    pub rating: Rating,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Split a comma-separated tag string into trimmed, non-empty tags.
/// Duplicates are kept.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Durable key-value storage for the gallery
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| GalleryError::Persist(format!("{}: {}", self.dir.display(), e)))?;

        // Write aside then rename so readers never see a half-written file
        let path = self.key_path(key);
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp, value)
            .map_err(|e| GalleryError::Persist(format!("{}: {}", tmp.display(), e)))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(GalleryError::Persist(format!("{}: {}", path.display(), e)));
        }

        Ok(())
    }
}

/// In-memory storage with an optional size quota
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes larger than `bytes` fail like a full browser storage quota
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota_bytes: Some(bytes),
            ..Self::default()
        }
    }

    /// While set, every write fails as if the disk were gone
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| GalleryError::Persist("storage lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GalleryError::Persist("storage is unavailable".to_string()));
        }
        if let Some(quota) = self.quota_bytes {
            if value.len() > quota {
                return Err(GalleryError::Persist(format!(
                    "storage quota exceeded ({} > {} bytes)",
                    value.len(),
                    quota
                )));
            }
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| GalleryError::Persist("storage lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Ordered, persisted list of rated photos
pub struct GalleryStore<S: Storage> {
    storage: S,
    photos: Vec<PhotoRecord>,
}

impl<S: Storage> GalleryStore<S> {
    /// Load the persisted gallery. Missing or unreadable data yields an
    /// empty gallery.
    pub fn load(storage: S) -> Self {
        let photos = match storage.read(STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<Vec<PhotoRecord>>(&json) {
                Ok(photos) => sanitize_ids(photos),
                Err(e) => {
                    log::warn!("Stored gallery is malformed, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("Could not read stored gallery, starting empty: {}", e);
                Vec::new()
            }
        };

        log::info!("Loaded {} photos from storage", photos.len());
        Self { storage, photos }
    }

    pub fn all(&self) -> &[PhotoRecord] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&PhotoRecord> {
        self.photos.iter().find(|p| p.id == id)
    }

    pub fn max_id(&self) -> Option<u64> {
        self.photos.iter().map(|p| p.id).max()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Append a record and persist. On failure the record is dropped again.
    pub fn append(&mut self, record: PhotoRecord) -> Result<()> {
        if self.get(record.id).is_some() {
            return Err(GalleryError::DuplicateId(record.id));
        }

        self.photos.push(record);
        if let Err(e) = self.save() {
            self.photos.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove the record with `id` once `confirm` agrees.
    /// Unknown ids are a no-op and never prompt.
    pub fn remove<F>(&mut self, id: u64, confirm: F) -> Result<Option<PhotoRecord>>
    where
        F: FnOnce(&PhotoRecord) -> bool,
    {
        let Some(pos) = self.photos.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        if !confirm(&self.photos[pos]) {
            return Ok(None);
        }

        let removed = self.photos.remove(pos);
        if let Err(e) = self.save() {
            self.photos.insert(pos, removed);
            return Err(e);
        }

        log::info!("Deleted photo {}", id);
        Ok(Some(removed))
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string(&self.photos)?;
        self.storage.write(STORAGE_KEY, &json).map_err(|e| match e {
            GalleryError::Persist(_) => e,
            other => GalleryError::Persist(other.to_string()),
        })
    }
}

/// Drop stored records whose id is out of range or already taken
fn sanitize_ids(photos: Vec<PhotoRecord>) -> Vec<PhotoRecord> {
    let mut seen = HashSet::new();
    let before = photos.len();
    let kept: Vec<_> = photos
        .into_iter()
        .filter(|p| p.id <= MAX_PHOTO_ID && seen.insert(p.id))
        .collect();
    if kept.len() != before {
        log::warn!(
            "Dropped {} stored photos with duplicate or out-of-range ids",
            before - kept.len()
        );
    }
    kept
}
