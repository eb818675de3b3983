use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::types::{DedupRecord, StoreStats};
use chrono::Utc;
use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Persistent, order-preserving set of processed entity identifiers
/// (project names or signal fingerprints).
///
/// Every mutation loads the whole record, changes it in memory and rewrites
/// the whole file. There is no locking: one writer per file.
#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
}

impl DedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(config: &StoreConfig) -> Self {
        Self::new(config.path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been persisted yet.
    pub fn load(&self) -> Result<Option<DedupRecord>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut record: DedupRecord =
            serde_json::from_str(&data).map_err(|source| StoreError::CorruptState {
                path: self.path.clone(),
                source,
            })?;

        if let Some(repair) = record.repair() {
            if repair.duplicates_dropped > 0 {
                warn!(
                    "[DedupStore] {} had {} duplicate member(s), dropped",
                    self.path.display(),
                    repair.duplicates_dropped
                );
            }
            if repair.stated_count != record.total_count {
                warn!(
                    "[DedupStore] {} stated {} member(s) but holds {}, count corrected",
                    self.path.display(),
                    repair.stated_count,
                    record.total_count
                );
            }
        }

        Ok(Some(record))
    }

    pub fn list_members(&self) -> Result<Vec<String>> {
        Ok(self.load()?.map(|r| r.members).unwrap_or_default())
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.load()?.is_some_and(|r| r.contains(name)))
    }

    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        Ok(self.load()?.map(|r| r.search(query)).unwrap_or_default())
    }

    /// Candidates not yet recorded, in input order and without repeats.
    pub fn filter_unseen<I, S>(&self, candidates: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let record = self.load()?.unwrap_or_default();
        let mut seen: HashSet<String> = record.members.into_iter().collect();
        let mut unseen = Vec::new();
        for candidate in candidates {
            let candidate = candidate.as_ref();
            if seen.insert(candidate.to_string()) {
                unseen.push(candidate.to_string());
            }
        }
        Ok(unseen)
    }

    /// Records `name`, creating the record on first use. `false` when it was
    /// already present (nothing written).
    pub fn add(&self, name: &str) -> Result<bool> {
        let mut record = self.load()?.unwrap_or_default();
        if !record.insert(name, Utc::now()) {
            debug!("[DedupStore] {} already recorded", name);
            return Ok(false);
        }
        self.persist(&record)?;
        info!("[DedupStore] Added {} (total: {})", name, record.total_count);
        Ok(true)
    }

    /// `false` when `name` was not present (nothing written).
    pub fn remove(&self, name: &str) -> Result<bool> {
        let Some(mut record) = self.load()? else {
            return Ok(false);
        };
        if !record.remove(name, Utc::now()) {
            debug!("[DedupStore] {} not recorded, nothing to remove", name);
            return Ok(false);
        }
        self.persist(&record)?;
        info!("[DedupStore] Removed {} (total: {})", name, record.total_count);
        Ok(true)
    }

    /// Deletes the persisted record. The caller must have obtained
    /// confirmation; `confirm == false` leaves everything untouched.
    pub fn clear(&self, confirm: bool) -> Result<bool> {
        if !confirm {
            debug!("[DedupStore] Clear not confirmed, skipping");
            return Ok(false);
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("[DedupStore] Cleared {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub fn stats(&self) -> Result<StoreStats> {
        Ok(self.load()?.unwrap_or_default().stats())
    }

    // Atomic rewrite: temp file in the same directory, then rename.
    fn persist(&self, record: &DedupRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(record)?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json)?;
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}
