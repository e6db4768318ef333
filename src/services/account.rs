//! Account service: login, forced password change, and admin user CRUD.
//!
//! Per user the lifecycle is a two-state machine: `mustChangePassword == true`
//! (pending first login) transitions to `false` only through a successful
//! password change, and only an admin update can set it back.

use serde::Serialize;
use std::sync::Arc;

use crate::auth::AdminGuard;
use crate::error::ApiError;
use crate::store::reports::{ReportEntry, ReportStore};
use crate::store::users::{SafeUser, UserPatch, UserStore};

/// Identity bundle returned on successful login. No session token is issued;
/// the client holds this and re-asserts the username on later calls.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub username: String,
    pub is_admin: bool,
    pub must_change_password: bool,
    pub reports: Vec<ReportEntry>,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<UserStore>,
    catalog: Arc<ReportStore>,
    guard: Arc<dyn AdminGuard>,
}

impl AccountService {
    pub fn new(users: Arc<UserStore>, catalog: Arc<ReportStore>, guard: Arc<dyn AdminGuard>) -> Self {
        Self { users, catalog, guard }
    }

    /// Unknown username and wrong password return the same error kind and
    /// status so the endpoint does not enumerate usernames.
    pub fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::bad_request("username and password are required"));
        }

        let user = self
            .users
            .find(username)
            .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;
        if !UserStore::verify(&user, password) {
            return Err(ApiError::unauthorized("Invalid credentials"));
        }

        Ok(LoginOutcome {
            reports: self.catalog.resolve_many(&user.reports),
            username: user.username,
            is_admin: user.is_admin,
            must_change_password: user.must_change_password,
        })
    }

    /// When `old_password` is present it must verify; when absent the change
    /// is allowed unconditionally, which is what the forced first-change flow
    /// relies on. Always clears `mustChangePassword` on success.
    pub fn change_password(
        &self,
        username: &str,
        old_password: Option<&str>,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if username.is_empty() || new_password.is_empty() {
            return Err(ApiError::bad_request("username and new password are required"));
        }

        let user = self
            .users
            .find(username)
            .ok_or_else(|| ApiError::not_found("User not found"))?;

        if let Some(old) = old_password.filter(|o| !o.is_empty()) {
            if !UserStore::verify(&user, old) {
                return Err(ApiError::unauthorized("Current password is incorrect"));
            }
        }

        self.users.set_password(username, new_password)?;
        Ok(())
    }

    pub fn list_users(&self) -> Vec<SafeUser> {
        self.users.list()
    }

    pub async fn create_user(
        &self,
        claimed_admin: Option<&str>,
        username: &str,
        password: Option<&str>,
        reports: Vec<String>,
        is_admin: bool,
    ) -> Result<SafeUser, ApiError> {
        self.guard.authorize(claimed_admin).await?;
        if username.is_empty() {
            return Err(ApiError::bad_request("username is required"));
        }
        Ok(self.users.create(username, password, reports, is_admin)?)
    }

    pub async fn update_user(
        &self,
        claimed_admin: Option<&str>,
        username: &str,
        patch: UserPatch,
    ) -> Result<SafeUser, ApiError> {
        self.guard.authorize(claimed_admin).await?;
        Ok(self.users.update(username, patch)?)
    }

    pub async fn delete_user(
        &self,
        claimed_admin: Option<&str>,
        username: &str,
    ) -> Result<(), ApiError> {
        self.guard.authorize(claimed_admin).await?;
        Ok(self.users.delete(username)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClaimedIdentityGuard;

    fn service(dir: &tempfile::TempDir) -> AccountService {
        let users = Arc::new(UserStore::open(dir.path().join("users.json"), 4).unwrap());
        let catalog = Arc::new(ReportStore::open(dir.path().join("reports.json")));
        let guard = Arc::new(ClaimedIdentityGuard::new(users.clone()));
        AccountService::new(users, catalog, guard)
    }

    async fn seed_admin(svc: &AccountService) {
        // Bootstrap directly through the store; there is no admin yet to go
        // through the guarded path
        svc.users.create("boss", Some("pw"), vec![], true).unwrap();
    }

    #[tokio::test]
    async fn login_unknown_user_and_bad_password_look_the_same() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        seed_admin(&svc).await;

        let unknown = svc.login("nobody", "pw").unwrap_err();
        let wrong = svc.login("boss", "wrong").unwrap_err();
        assert_eq!(unknown.status_code(), 401);
        assert_eq!(wrong.status_code(), 401);
        assert_eq!(unknown.message(), wrong.message());
    }

    #[tokio::test]
    async fn login_resolves_assigned_reports_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        seed_admin(&svc).await;
        svc.catalog.upsert("r2", "Ops", "https://y").unwrap();
        svc.catalog.upsert("r1", "Sales", "https://x").unwrap();
        svc.create_user(
            Some("boss"),
            "alice",
            Some("pw1"),
            vec!["r2".to_string(), "gone".to_string(), "r1".to_string()],
            false,
        )
        .await
        .unwrap();

        let outcome = svc.login("alice", "pw1").unwrap();
        assert!(outcome.must_change_password);
        assert!(!outcome.is_admin);
        let titles: Vec<&str> = outcome.reports.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Ops", "Sales"]);
    }

    #[tokio::test]
    async fn change_password_transitions_to_active() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        seed_admin(&svc).await;
        svc.create_user(Some("boss"), "alice", Some("pw1"), vec![], false)
            .await
            .unwrap();

        // Forced first change: no old password supplied
        svc.change_password("alice", None, "pw2").unwrap();
        assert!(!svc.login("alice", "pw2").unwrap().must_change_password);

        // Later change requires the current password when supplied
        let err = svc.change_password("alice", Some("stale"), "pw3").unwrap_err();
        assert_eq!(err.status_code(), 401);
        svc.change_password("alice", Some("pw2"), "pw3").unwrap();
        assert!(svc.login("alice", "pw3").is_ok());
    }

    #[tokio::test]
    async fn change_password_requires_new_password() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        seed_admin(&svc).await;
        assert_eq!(svc.change_password("boss", None, "").unwrap_err().status_code(), 400);
        assert_eq!(
            svc.change_password("nobody", None, "pw").unwrap_err().status_code(),
            404
        );
    }

    #[tokio::test]
    async fn admin_operations_fail_closed() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(&dir);
        seed_admin(&svc).await;
        svc.create_user(Some("boss"), "alice", None, vec![], false)
            .await
            .unwrap();

        for claimed in [None, Some("nobody"), Some("alice")] {
            let err = svc
                .create_user(claimed, "bob", None, vec![], false)
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), 403, "claimed {:?}", claimed);
            let err = svc.delete_user(claimed, "alice").await.unwrap_err();
            assert_eq!(err.status_code(), 403, "claimed {:?}", claimed);
        }

        // A real admin passes
        svc.delete_user(Some("boss"), "alice").await.unwrap();
    }
}
