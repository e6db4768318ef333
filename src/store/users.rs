//! Credential store backed by `users.json`.
//!
//! Owns the in-memory user collection and is the sole writer of its backing
//! file. Every mutation rebuilds the collection, persists it atomically, and
//! only then swaps it into the shared state, so a failed write rolls back by
//! never committing. Mutations are serialized behind the mutex because the
//! read-modify-write-persist sequence is not otherwise atomic on a
//! multi-threaded runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::auth::{hash_password, is_bcrypt_hash, verify_password};
use crate::store::{file, StoreError};

/// Assigned to legacy records whose password field is empty, matching the
/// portal's historical default.
const DEFAULT_PASSWORD: &str = "changeme";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    /// bcrypt digest. The on-disk key stays `password` so data files written
    /// before the hash migration load in place.
    pub password: String,
    pub must_change_password: bool,
    pub is_admin: bool,
    #[serde(default)]
    pub reports: Vec<String>,
}

/// User view returned over the wire; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    pub username: String,
    pub reports: Vec<String>,
    pub must_change_password: bool,
    pub is_admin: bool,
}

impl From<&UserRecord> for SafeUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            username: user.username.clone(),
            reports: user.reports.clone(),
            must_change_password: user.must_change_password,
            is_admin: user.is_admin,
        }
    }
}

/// Partial update; only fields that are present are applied.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub password: Option<String>,
    pub reports: Option<Vec<String>>,
    pub must_change_password: Option<bool>,
    pub is_admin: Option<bool>,
}

/// Legacy-tolerant shape used only at load time: the password may still be
/// plaintext (and not even a string), the boolean flags may be absent or hold
/// non-boolean values, and the report list may contain junk entries. Fields
/// stay as raw JSON values so one sloppy legacy record cannot fail the whole
/// file and boot the store empty; coercion happens in the migration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    username: String,
    #[serde(default)]
    password: Value,
    #[serde(default)]
    must_change_password: Value,
    #[serde(default)]
    is_admin: Value,
    #[serde(default)]
    reports: Value,
}

/// JSON truthiness: null, false, 0, and "" are falsy, everything else truthy.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Only an actual JSON boolean counts as explicitly set.
fn explicit_bool(value: &Value) -> Option<bool> {
    value.as_bool()
}

/// Coerce a legacy password value to the plaintext to hash. Scalars are
/// stringified; falsy or structured values fall back to the default password.
fn coerce_password(value: &Value) -> String {
    match value {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) if truthy(value) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => DEFAULT_PASSWORD.to_string(),
    }
}

/// Keep only the string entries of a legacy report list.
fn coerce_reports(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

pub struct UserStore {
    path: PathBuf,
    bcrypt_cost: u32,
    users: Mutex<Vec<UserRecord>>,
}

impl UserStore {
    /// Load the user file and run the one-shot plaintext-to-hash migration.
    ///
    /// Any record whose password field is not bcrypt-prefixed is treated as
    /// legacy plaintext: it gets hashed, `mustChangePassword` defaults to
    /// true unless the record sets it explicitly, and `isAdmin` defaults to
    /// false. The file is rewritten only if at least one record changed, so
    /// re-running the migration is a no-op (already-hashed values are
    /// recognized by their prefix and left untouched).
    pub fn open(path: PathBuf, bcrypt_cost: u32) -> Result<Self, StoreError> {
        let raw: Vec<RawUser> = file::read_or_default(&path);
        let (users, migrated) = Self::migrate(raw, bcrypt_cost)?;

        if migrated > 0 {
            file::write_atomic(&path, &users)?;
            tracing::info!(
                "password migration: {} legacy record(s) hashed in {}",
                migrated,
                path.display()
            );
        }

        Ok(Self {
            path,
            bcrypt_cost,
            users: Mutex::new(users),
        })
    }

    fn migrate(raw: Vec<RawUser>, cost: u32) -> Result<(Vec<UserRecord>, usize), StoreError> {
        let mut migrated = 0;
        let mut users = Vec::with_capacity(raw.len());

        for u in raw {
            let is_admin = truthy(&u.is_admin);
            let reports = coerce_reports(&u.reports);

            // Only a string can already be a digest; anything else is legacy
            if let Some(hash) = u.password.as_str().filter(|p| is_bcrypt_hash(p)) {
                users.push(UserRecord {
                    username: u.username,
                    password: hash.to_string(),
                    must_change_password: truthy(&u.must_change_password),
                    is_admin,
                    reports,
                });
                continue;
            }

            users.push(UserRecord {
                username: u.username,
                password: hash_password(&coerce_password(&u.password), cost)?,
                must_change_password: explicit_bool(&u.must_change_password).unwrap_or(true),
                is_admin,
                reports,
            });
            migrated += 1;
        }

        Ok((users, migrated))
    }

    pub fn find(&self, username: &str) -> Option<UserRecord> {
        let users = self.users.lock().unwrap();
        users.iter().find(|u| u.username == username).cloned()
    }

    pub fn list(&self) -> Vec<SafeUser> {
        let users = self.users.lock().unwrap();
        users.iter().map(SafeUser::from).collect()
    }

    /// Constant-effort comparison via the bcrypt library, never string
    /// equality.
    pub fn verify(user: &UserRecord, candidate: &str) -> bool {
        verify_password(candidate, &user.password)
    }

    /// Re-hash and clear the forced-change flag.
    pub fn set_password(&self, username: &str, new_plain: &str) -> Result<(), StoreError> {
        let hashed = hash_password(new_plain, self.bcrypt_cost)?;

        let mut users = self.users.lock().unwrap();
        let mut next = users.clone();
        let user = next
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?;
        user.password = hashed;
        user.must_change_password = false;

        file::write_atomic(&self.path, &next)?;
        *users = next;
        Ok(())
    }

    /// New users always start in the forced password-change state.
    pub fn create(
        &self,
        username: &str,
        password: Option<&str>,
        reports: Vec<String>,
        is_admin: bool,
    ) -> Result<SafeUser, StoreError> {
        let hashed = hash_password(password.unwrap_or(DEFAULT_PASSWORD), self.bcrypt_cost)?;

        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == username) {
            return Err(StoreError::Duplicate("User already exists".to_string()));
        }

        let mut next = users.clone();
        next.push(UserRecord {
            username: username.to_string(),
            password: hashed,
            must_change_password: true,
            is_admin,
            reports,
        });

        file::write_atomic(&self.path, &next)?;
        *users = next;
        Ok(SafeUser::from(users.last().unwrap()))
    }

    pub fn update(&self, username: &str, patch: UserPatch) -> Result<SafeUser, StoreError> {
        let hashed = match patch.password.as_deref() {
            Some(plain) => Some(hash_password(plain, self.bcrypt_cost)?),
            None => None,
        };

        let mut users = self.users.lock().unwrap();
        let mut next = users.clone();
        let user = next
            .iter_mut()
            .find(|u| u.username == username)
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?;

        if let Some(hash) = hashed {
            user.password = hash;
        }
        if let Some(reports) = patch.reports {
            user.reports = reports;
        }
        if let Some(flag) = patch.must_change_password {
            user.must_change_password = flag;
        }
        if let Some(flag) = patch.is_admin {
            user.is_admin = flag;
        }
        let view = SafeUser::from(&*user);

        file::write_atomic(&self.path, &next)?;
        *users = next;
        Ok(view)
    }

    pub fn delete(&self, username: &str) -> Result<(), StoreError> {
        let mut users = self.users.lock().unwrap();
        let idx = users
            .iter()
            .position(|u| u.username == username)
            .ok_or_else(|| StoreError::NotFound("User not found".to_string()))?;

        let mut next = users.clone();
        next.remove(idx);

        file::write_atomic(&self.path, &next)?;
        *users = next;
        Ok(())
    }
}
