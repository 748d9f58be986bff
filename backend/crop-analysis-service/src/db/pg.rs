//! Postgres-backed result store
use super::{check_record, ResultStore, StoreError};
use crate::models::{AnalysisRecord, Defect, NewAnalysisRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Row as stored in `crop_analyses`
#[derive(Debug, FromRow)]
struct AnalysisRow {
    id: Uuid,
    crop_type: String,
    defects: Json<Vec<Defect>>,
    severity: String,
    confidence_score: f64,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = StoreError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        let crop_type = row
            .crop_type
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("record {}: {}", row.id, e)))?;
        let severity = row
            .severity
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("record {}: {}", row.id, e)))?;

        Ok(AnalysisRecord {
            id: row.id,
            crop_type,
            defects: row.defects.0,
            severity,
            confidence_score: row.confidence_score,
            image_url: row.image_url,
            created_at: row.created_at,
        })
    }
}

pub struct PgResultStore {
    pool: PgPool,
}

impl PgResultStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ResultStore for PgResultStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert_record(&self, record: NewAnalysisRecord) -> Result<AnalysisRecord, StoreError> {
        check_record(&record)?;

        let row = sqlx::query_as::<_, AnalysisRow>(
            r#"
            INSERT INTO crop_analyses (crop_type, defects, severity, confidence_score)
            VALUES ($1, $2, $3, ROUND($4::numeric, 2))
            RETURNING id, crop_type, defects, severity,
                      confidence_score::float8 AS confidence_score,
                      image_url, created_at
            "#,
        )
        .bind(record.crop_type.as_str())
        .bind(Json(&record.defects))
        .bind(record.severity.as_str())
        .bind(record.confidence_score)
        .fetch_one(&self.pool)
        .await?;

        let record = AnalysisRecord::try_from(row)?;

        tracing::info!(
            record_id = %record.id,
            crop_type = %record.crop_type,
            severity = %record.severity,
            "Analysis record saved"
        );

        Ok(record)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, AnalysisRow>(
            r#"
            SELECT id, crop_type, defects, severity,
                   confidence_score::float8 AS confidence_score,
                   image_url, created_at
            FROM crop_analyses
            ORDER BY created_at DESC, seq DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AnalysisRecord::try_from).collect()
    }
}
