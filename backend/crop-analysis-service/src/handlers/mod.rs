/// HTTP handlers for the analysis pipeline
///
/// - Analyses: run an image through the gateway, optionally persisting the result
/// - Records: append to and read the analysis history
///
/// There is no update or delete route; the history is append-only.
use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::error::{AppError, ValidationReason};
use crate::intake::MAX_IMAGE_BYTES;
use crate::AppState;

pub mod analyses;
pub mod records;

pub use analyses::{analyze, create_analysis};
pub use records::{create_record, list_records};

/// A 10 MiB image grows by a third when base64-encoded
const JSON_BODY_LIMIT: usize = MAX_IMAGE_BYTES / 3 * 4 + 64 * 1024;

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(path = %req.path(), error = %err, "Rejected JSON body");
    let reason = match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            ValidationReason::TooLarge
        }
        _ => ValidationReason::InvalidRequest,
    };
    AppError::from(reason).into()
}

fn query_error(err: actix_web::error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(path = %req.path(), error = %err, "Rejected query string");
    AppError::from(ValidationReason::InvalidRequest).into()
}

/// Service health, including which store is active
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "store": state.store.backend(),
        "gatewayConfigured": state.gateway.is_configured(),
    }))
}

/// Register all routes. Shared by the server and the HTTP tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(json_error),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error))
    .service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health))
            .route("/analyze", web::post().to(analyze))
            .route("/analyses", web::post().to(create_analysis))
            .service(
                web::resource("/records")
                    .route(web::get().to(list_records))
                    .route(web::post().to(create_record)),
            ),
    );
}
