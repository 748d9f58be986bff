//! Crop Analysis Service - crop defect classification with a hosted vision model
//!
//! This service provides:
//! - Image intake (size check and data URI encoding)
//! - An analysis gateway that forces the model onto a typed tool schema
//! - An append-only store of past analyses, queryable by recency
//! - An HTTP API for the presentation layer

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod intake;
pub mod models;
pub mod providers;

pub use config::{Config, HistoryLimits};
pub use db::{InMemoryResultStore, PgResultStore, ResultStore, SharedResultStore, StoreError};
pub use error::{AppError, ErrorKind, GatewayError, ValidationReason};
pub use intake::{EncodedImage, MAX_IMAGE_BYTES};
pub use models::{
    AnalysisRecord, AnalysisRequest, AnalysisResult, CropType, Defect, NewAnalysisRecord,
    Severity,
};
pub use providers::{AnalysisGateway, GatewayConfig};

/// Shared state handed to every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub gateway: AnalysisGateway,
    pub store: SharedResultStore,
    pub history: HistoryLimits,
}
