//! Report catalog store backed by `reports.json`.
//!
//! A flat mapping of report id to `{title, url}`. There is no back-link from
//! catalog entries to the users they are assigned to; user report lists may
//! reference ids that no longer exist here, and those are dropped at read
//! time rather than treated as errors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::store::{file, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub title: String,
    pub url: String,
}

pub struct ReportStore {
    path: PathBuf,
    reports: Mutex<BTreeMap<String, ReportEntry>>,
}

impl ReportStore {
    pub fn open(path: PathBuf) -> Self {
        let reports = file::read_or_default(&path);
        Self {
            path,
            reports: Mutex::new(reports),
        }
    }

    /// Read-only snapshot of the whole catalog.
    pub fn all(&self) -> BTreeMap<String, ReportEntry> {
        self.reports.lock().unwrap().clone()
    }

    /// Insert or overwrite; create and update are the same operation.
    pub fn upsert(&self, id: &str, title: &str, url: &str) -> Result<ReportEntry, StoreError> {
        if id.is_empty() || title.is_empty() || url.is_empty() {
            return Err(StoreError::InvalidInput(
                "id, title and url are required".to_string(),
            ));
        }

        let entry = ReportEntry {
            title: title.to_string(),
            url: url.to_string(),
        };

        let mut reports = self.reports.lock().unwrap();
        let mut next = reports.clone();
        next.insert(id.to_string(), entry.clone());

        file::write_atomic(&self.path, &next)?;
        *reports = next;
        Ok(entry)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut reports = self.reports.lock().unwrap();
        if !reports.contains_key(id) {
            return Err(StoreError::NotFound("Report not found".to_string()));
        }

        let mut next = reports.clone();
        next.remove(id);

        file::write_atomic(&self.path, &next)?;
        *reports = next;
        Ok(())
    }

    /// Resolve a user's assigned ids into catalog entries, preserving the
    /// assignment order. Dangling ids are silently omitted.
    pub fn resolve_many(&self, ids: &[String]) -> Vec<ReportEntry> {
        let reports = self.reports.lock().unwrap();
        ids.iter().filter_map(|id| reports.get(id).cloned()).collect()
    }
}
