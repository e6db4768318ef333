//! Catalog service: unauthenticated reads, guarded admin mutations.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::auth::AdminGuard;
use crate::error::ApiError;
use crate::store::reports::{ReportEntry, ReportStore};

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<ReportStore>,
    guard: Arc<dyn AdminGuard>,
}

impl CatalogService {
    pub fn new(catalog: Arc<ReportStore>, guard: Arc<dyn AdminGuard>) -> Self {
        Self { catalog, guard }
    }

    pub fn list(&self) -> BTreeMap<String, ReportEntry> {
        self.catalog.all()
    }

    pub async fn upsert(
        &self,
        claimed_admin: Option<&str>,
        id: &str,
        title: &str,
        url: &str,
    ) -> Result<ReportEntry, ApiError> {
        self.guard.authorize(claimed_admin).await?;
        Ok(self.catalog.upsert(id, title, url)?)
    }

    pub async fn delete(&self, claimed_admin: Option<&str>, id: &str) -> Result<(), ApiError> {
        self.guard.authorize(claimed_admin).await?;
        Ok(self.catalog.delete(id)?)
    }
}
