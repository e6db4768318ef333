pub mod reports;
pub mod session;
pub mod users;

use serde::Deserialize;

use crate::services::account::AccountService;
use crate::services::catalog::CatalogService;

/// Shared handler state, injected at router construction instead of living
/// in process-wide globals.
#[derive(Clone)]
pub struct AppState {
    pub account: AccountService,
    pub catalog: CatalogService,
}

/// Self-asserted admin identity. Accepted in the request body or the query
/// string interchangeably; body wins when both are present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminClaim {
    pub admin_username: Option<String>,
}

impl AdminClaim {
    pub fn merged<'a>(body: Option<&'a str>, query: &'a AdminClaim) -> Option<&'a str> {
        body.or(query.admin_username.as_deref())
    }
}
