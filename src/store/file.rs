//! JSON file persistence helpers.
//!
//! Both collections are read once at startup and rewritten wholesale on every
//! mutation. Writes go through a sibling temp file followed by a rename so a
//! crash mid-write can never leave a truncated data file behind.

use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;

use super::StoreError;

/// Load a collection from disk, degrading to the default on any failure.
///
/// A missing or unreadable file is not fatal: the service boots with an empty
/// collection and the next successful mutation rewrites the file. Failures
/// are logged so operators can tell an empty store from a corrupt one.
pub fn read_or_default<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return T::default();
    }
    match fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => T::default(),
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("failed to parse {}: {} (starting empty)", path.display(), e);
            T::default()
        }),
        Err(e) => {
            tracing::warn!("failed to read {}: {} (starting empty)", path.display(), e);
            T::default()
        }
    }
}

/// Atomically replace the file at `path` with the serialized collection.
///
/// The temp file is created in the same directory so the rename stays on one
/// filesystem. Output is pretty-printed to keep the data files hand-editable.
pub fn write_atomic<T>(path: &Path, value: &T) -> Result<(), StoreError>
where
    T: Serialize,
{
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
