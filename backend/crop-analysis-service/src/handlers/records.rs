/// Record handlers - append to and read the analysis history
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::error::{Result, ValidationReason};
use crate::models::NewAnalysisRecord;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Save an analysis result. Extra fields such as `recommendations` are ignored.
pub async fn create_record(
    state: web::Data<AppState>,
    req: web::Json<NewAnalysisRecord>,
) -> Result<HttpResponse> {
    let new_record = req.into_inner();
    if !new_record.confidence_in_range() {
        return Err(ValidationReason::InvalidConfidence.into());
    }

    let record = state.store.insert_record(new_record).await?;
    Ok(HttpResponse::Created().json(record))
}

/// Most recent records first
pub async fn list_records(
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let limit = state.history.resolve(query.limit);
    let records = state.store.list_recent(limit).await?;
    Ok(HttpResponse::Ok().json(records))
}
