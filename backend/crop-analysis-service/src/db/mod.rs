//! Append-only store of past analyses
//!
//! Two backends share the [`ResultStore`] contract: Postgres for deployments and a
//! process-local store used when no database is configured. Neither exposes an
//! update or delete operation.
use crate::models::{AnalysisRecord, AnalysisResult, NewAnalysisRecord};
use async_trait::async_trait;
use std::sync::Arc;

pub mod memory;
pub mod pg;

pub use memory::InMemoryResultStore;
pub use pg::PgResultStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Corrupt stored record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    /// Persist a record, assigning `id` and `created_at`
    async fn insert_record(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, StoreError>;

    /// Up to `limit` records, most recent first
    async fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StoreError>;

    /// Persist the storable fields of an analysis result
    async fn insert(&self, result: &AnalysisResult) -> Result<AnalysisRecord, StoreError> {
        self.insert_record(NewAnalysisRecord::from(result)).await
    }
}

pub type SharedResultStore = Arc<dyn ResultStore>;

fn check_record(record: &NewAnalysisRecord) -> Result<(), StoreError> {
    if !record.confidence_in_range() {
        return Err(StoreError::InvalidRecord(format!(
            "confidence score {} outside 0-100",
            record.confidence_score
        )));
    }
    Ok(())
}
