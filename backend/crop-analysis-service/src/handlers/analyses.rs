/// Analysis handlers - HTTP endpoints that call the model provider
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use futures::StreamExt;
use serde::Serialize;

use crate::error::{AppError, Result, ValidationReason};
use crate::intake::{self, MAX_IMAGE_BYTES};
use crate::models::{AnalysisRecord, AnalysisRequest, AnalysisResult};
use crate::AppState;

/// Outcome of the full pipeline. `record` is `None` when persistence failed.
#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub result: AnalysisResult,
    pub record: Option<AnalysisRecord>,
}

/// Display-only analysis of a data URI image; nothing is persisted
pub async fn analyze(
    state: web::Data<AppState>,
    req: web::Json<AnalysisRequest>,
) -> Result<HttpResponse> {
    let result = state.gateway.analyze_request(&req).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Analyze a raw image body and append the result to the history
pub async fn create_analysis(
    state: web::Data<AppState>,
    req: HttpRequest,
    mut payload: web::Payload,
) -> Result<HttpResponse> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::warn!(error = %e, "Failed to read image body");
            AppError::from(ValidationReason::InvalidRequest)
        })?;
        if body.len() + chunk.len() > MAX_IMAGE_BYTES {
            tracing::warn!(limit = MAX_IMAGE_BYTES, "Image body too large");
            return Err(ValidationReason::TooLarge.into());
        }
        body.extend_from_slice(&chunk);
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let image = intake::prepare(&body, content_type)?;
    let result = state.gateway.analyze(&image).await?;

    // The computed result is returned even when it cannot be saved
    let record = match state.store.insert(&result).await {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::error!(error = %e, "Failed to persist analysis");
            None
        }
    };

    Ok(HttpResponse::Ok().json(AnalysisResponse { result, record }))
}
