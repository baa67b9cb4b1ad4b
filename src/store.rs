//! Persistence collaborator: per-owner collections of saved case studies.
//!
//! `CaseStore` is the narrow contract the rest of the service relies on; the
//! in-memory implementation keeps insertion order and assigns UUID ids.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::CaseStudy;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("case study {0} not found")]
    NotFound(String),
    /// Raised by backends that can go offline; the in-memory store never does.
    #[cfg_attr(not(test), allow(dead_code))]
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait CaseStore: Send + Sync + 'static {
    /// Save `case` under `owner` and return the assigned id.
    fn append(&self, owner: &str, case: CaseStudy) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Everything saved by `owner`, oldest first, ids filled in.
    fn list(&self, owner: &str) -> impl Future<Output = Result<Vec<CaseStudy>, StoreError>> + Send;

    fn delete(&self, owner: &str, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Clone, Default)]
pub struct InMemoryCaseStore {
    by_owner: Arc<RwLock<HashMap<String, Vec<CaseStudy>>>>,
}

impl InMemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CaseStore for InMemoryCaseStore {
    #[instrument(level = "debug", skip(self, case), fields(%owner, field = %case.disease_field))]
    async fn append(&self, owner: &str, case: CaseStudy) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut by_owner = self.by_owner.write().await;
        by_owner
            .entry(owner.to_string())
            .or_default()
            .push(case.with_id(id.clone()));
        debug!(target: "medsky_backend", %owner, %id, "Case study stored");
        Ok(id)
    }

    #[instrument(level = "debug", skip(self), fields(%owner))]
    async fn list(&self, owner: &str) -> Result<Vec<CaseStudy>, StoreError> {
        let by_owner = self.by_owner.read().await;
        Ok(by_owner.get(owner).cloned().unwrap_or_default())
    }

    #[instrument(level = "debug", skip(self), fields(%owner, %id))]
    async fn delete(&self, owner: &str, id: &str) -> Result<(), StoreError> {
        let mut by_owner = self.by_owner.write().await;
        let cases = by_owner
            .get_mut(owner)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let before = cases.len();
        cases.retain(|c| c.id.as_deref() != Some(id));
        if cases.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
