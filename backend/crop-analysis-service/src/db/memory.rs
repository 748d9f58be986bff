//! Process-local result store, used when no database is configured
use super::{check_record, ResultStore, StoreError};
use crate::models::analysis::round_confidence;
use crate::models::{AnalysisRecord, NewAnalysisRecord};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Records are kept in insertion order; appends happen under the write lock so
/// readers never see a half-written record.
#[derive(Default)]
pub struct InMemoryResultStore {
    records: RwLock<Vec<AnalysisRecord>>,
}

impl InMemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_record(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        check_record(&record)?;

        let mut records = self.records.write().await;
        let record = AnalysisRecord {
            id: Uuid::new_v4(),
            crop_type: record.crop_type,
            defects: record.defects,
            severity: record.severity,
            confidence_score: round_confidence(record.confidence_score),
            image_url: None,
            created_at: Utc::now(),
        };
        records.push(record.clone());

        tracing::debug!(
            record_id = %record.id,
            total = records.len(),
            "Analysis record saved in memory"
        );

        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
        let records = self.records.read().await;

        // Newest insert first, then a stable sort so equal timestamps keep that order
        let mut recent: Vec<AnalysisRecord> = records.iter().rev().cloned().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);

        Ok(recent)
    }
}
