//! Activation Store
//!
//! Durable record of which addons are installed, at what version, and whether
//! they are active. Implementations must make each single-record write atomic.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use crate::addon::error::{AddonError, AddonResult};

/// Installed state of one addon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub id: String,
    pub installed_version: String,
    pub is_active: bool,
    pub installed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActivationRecord {
    /// A fresh, inactive record
    pub fn installed<S: Into<String>>(id: S, version: S) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            installed_version: version.into(),
            is_active: false,
            installed_at: now,
            updated_at: now,
        }
    }
}

/// Persistent key-value store of activation records
pub trait ActivationStore: Send + Sync {
    fn exists(&self, id: &str) -> AddonResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    fn get(&self, id: &str) -> AddonResult<Option<ActivationRecord>>;

    /// Insert a new record; fails if one already exists for the id
    fn create(&self, record: ActivationRecord) -> AddonResult<()>;

    /// Remove a record; fails if none exists
    fn delete(&self, id: &str) -> AddonResult<()>;

    fn set_active(&self, id: &str, active: bool) -> AddonResult<()>;

    fn set_version(&self, id: &str, version: &str) -> AddonResult<()>;

    /// All records, ordered by id
    fn all(&self) -> AddonResult<Vec<ActivationRecord>>;
}

fn missing_record(id: &str) -> AddonError {
    AddonError::store(format!("no activation record for '{}'", id))
}

fn apply_update<F>(records: &mut BTreeMap<String, ActivationRecord>, id: &str, update: F) -> AddonResult<()>
where
    F: FnOnce(&mut ActivationRecord),
{
    let record = records.get_mut(id).ok_or_else(|| missing_record(id))?;
    update(record);
    record.updated_at = Utc::now();
    Ok(())
}

fn insert_new(records: &mut BTreeMap<String, ActivationRecord>, record: ActivationRecord) -> AddonResult<()> {
    if records.contains_key(&record.id) {
        return Err(AddonError::store(format!("activation record for '{}' already exists", record.id)));
    }
    records.insert(record.id.clone(), record);
    Ok(())
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemoryActivationStore {
    records: RwLock<BTreeMap<String, ActivationRecord>>,
}

impl MemoryActivationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records
    pub fn with_records(records: Vec<ActivationRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { records: RwLock::new(map) }
    }
}

impl ActivationStore for MemoryActivationStore {
    fn get(&self, id: &str) -> AddonResult<Option<ActivationRecord>> {
        Ok(self.records.read().get(id).cloned())
    }

    fn create(&self, record: ActivationRecord) -> AddonResult<()> {
        insert_new(&mut self.records.write(), record)
    }

    fn delete(&self, id: &str) -> AddonResult<()> {
        self.records
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| missing_record(id))
    }

    fn set_active(&self, id: &str, active: bool) -> AddonResult<()> {
        apply_update(&mut self.records.write(), id, |r| r.is_active = active)
    }

    fn set_version(&self, id: &str, version: &str) -> AddonResult<()> {
        apply_update(&mut self.records.write(), id, |r| r.installed_version = version.to_string())
    }

    fn all(&self) -> AddonResult<Vec<ActivationRecord>> {
        Ok(self.records.read().values().cloned().collect())
    }
}

/// On-disk shape of the JSON store
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    addons: BTreeMap<String, ActivationRecord>,
}

/// Store persisted as a single JSON document
///
/// Every write rewrites the document to a temporary sibling and renames it
/// into place, so readers never see a half-written file.
#[derive(Debug)]
pub struct JsonFileActivationStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileActivationStore {
    /// Open a store at `path`; the file is created on first write
    pub fn open<P: AsRef<Path>>(path: P) -> AddonResult<Self> {
        let path = path.as_ref().to_path_buf();
        if path.is_dir() {
            return Err(AddonError::store(format!("store path is a directory: {}", path.display())));
        }
        let store = Self { path, lock: Mutex::new(()) };
        // Fail early on a corrupt file rather than at the first operation
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> AddonResult<BTreeMap<String, ActivationRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let file: StoreFile = serde_json::from_str(&content).map_err(|e| {
            AddonError::store(format!("corrupt store {}: {}", self.path.display(), e))
        })?;
        Ok(file.addons)
    }

    fn save(&self, addons: BTreeMap<String, ActivationRecord>) -> AddonResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&StoreFile { addons })
            .map_err(|e| AddonError::store(format!("failed to serialize store: {}", e)))?;

        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        debug!("Wrote activation store {}", self.path.display());
        Ok(())
    }

    /// Read-modify-write under the store lock
    fn modify<F>(&self, change: F) -> AddonResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, ActivationRecord>) -> AddonResult<()>,
    {
        let _guard = self.lock.lock();
        let mut addons = self.load()?;
        change(&mut addons)?;
        self.save(addons)
    }
}

impl ActivationStore for JsonFileActivationStore {
    fn get(&self, id: &str) -> AddonResult<Option<ActivationRecord>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.remove(id))
    }

    fn create(&self, record: ActivationRecord) -> AddonResult<()> {
        self.modify(|addons| insert_new(addons, record))
    }

    fn delete(&self, id: &str) -> AddonResult<()> {
        self.modify(|addons| addons.remove(id).map(|_| ()).ok_or_else(|| missing_record(id)))
    }

    fn set_active(&self, id: &str, active: bool) -> AddonResult<()> {
        self.modify(|addons| apply_update(addons, id, |r| r.is_active = active))
    }

    fn set_version(&self, id: &str, version: &str) -> AddonResult<()> {
        self.modify(|addons| apply_update(addons, id, |r| r.installed_version = version.to_string()))
    }

    fn all(&self) -> AddonResult<Vec<ActivationRecord>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.into_values().collect())
    }
}

/// Point-in-time copy of store contents, for pure dependency checks
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    records: HashMap<String, ActivationRecord>,
}

impl StoreSnapshot {
    /// Read every record from the store
    pub fn capture(store: &dyn ActivationStore) -> AddonResult<Self> {
        Ok(Self::from_records(store.all()?))
    }

    pub fn from_records<I: IntoIterator<Item = ActivationRecord>>(records: I) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ActivationRecord> {
        self.records.get(id)
    }

    pub fn is_installed(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.records.get(id).map(|r| r.is_active).unwrap_or(false)
    }
}
