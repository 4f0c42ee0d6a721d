//! Case persistence and document access
//!
//! The product's Postgres repository lives with its schema in the web tier;
//! this core only sees the traits. The in-memory implementations back tests
//! and embedders that do not need a database.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::case::Case;
use crate::services::scoring;

/// Case persistence collaborator. `save` is an atomic whole-record write.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Case>>;
    async fn save(&self, case: &Case) -> Result<()>;
    /// Prior cases (strictly earlier than `before`) whose subject name or
    /// address matches under the scoring rule. Candidates only; the scoring
    /// engine recounts per dimension.
    async fn query_by_subject_prior_to(
        &self,
        name: &str,
        address: &str,
        before: DateTime<Utc>,
    ) -> Result<Vec<Case>>;
    async fn list_all(&self) -> Result<Vec<Case>>;
}

/// External document store; the core only reads case text from it.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn fetch(&self, document_ref: &str) -> Result<String>;
}

/// In-memory case repository.
#[derive(Default)]
pub struct InMemoryCaseRepository {
    cases: RwLock<HashMap<Uuid, Case>>,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cases.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.read().is_empty()
    }

    /// Drop a case outright. Deletion is an external event (merges, GDPR
    /// erasure) handled by the owning tier; the trait has no delete.
    pub fn remove(&self, id: Uuid) -> Option<Case> {
        self.cases.write().remove(&id)
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Case>> {
        Ok(self.cases.read().get(&id).cloned())
    }

    async fn save(&self, case: &Case) -> Result<()> {
        self.cases.write().insert(case.id, case.clone());
        Ok(())
    }

    async fn query_by_subject_prior_to(
        &self,
        name: &str,
        address: &str,
        before: DateTime<Utc>,
    ) -> Result<Vec<Case>> {
        let mut matches: Vec<Case> = self
            .cases
            .read()
            .values()
            .filter(|c| c.created_at < before)
            .filter(|c| {
                scoring::field_matches(&c.subject_name, name)
                    || scoring::field_matches(&c.subject_address, address)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|c| c.created_at);
        Ok(matches)
    }

    async fn list_all(&self) -> Result<Vec<Case>> {
        let mut all: Vec<Case> = self.cases.read().values().cloned().collect();
        all.sort_by_key(|c| c.created_at);
        Ok(all)
    }
}

/// In-memory document store.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, String>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, document_ref: &str, text: &str) {
        self.documents
            .write()
            .insert(document_ref.to_string(), text.to_string());
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn fetch(&self, document_ref: &str) -> Result<String> {
        self.documents
            .read()
            .get(document_ref)
            .cloned()
            .ok_or_else(|| anyhow!("document not found: {}", document_ref))
    }
}
