//! Error taxonomy for the analysis pipeline
//!
//! Library code returns [`GatewayError`] (intake and gateway) or
//! [`StoreError`](crate::db::StoreError) (persistence). HTTP handlers wrap both in
//! [`AppError`], which narrows every failure to a stable kind and a user-safe
//! message. Provider statuses and bodies stay in the logs.
use crate::db::StoreError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::fmt;

/// Stable, branchable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Config,
    RateLimit,
    Quota,
    Upstream,
    EmptyResult,
    MalformedResult,
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Config => "config_error",
            ErrorKind::RateLimit => "rate_limit_error",
            ErrorKind::Quota => "quota_error",
            ErrorKind::Upstream => "upstream_error",
            ErrorKind::EmptyResult => "empty_result_error",
            ErrorKind::MalformedResult => "malformed_result_error",
            ErrorKind::Store => "store_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an input was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationReason {
    TooLarge,
    MissingImage,
    InvalidImage,
    InvalidConfidence,
    InvalidRequest,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::TooLarge => "too_large",
            ValidationReason::MissingImage => "missing_image",
            ValidationReason::InvalidImage => "invalid_image",
            ValidationReason::InvalidConfidence => "invalid_confidence",
            ValidationReason::InvalidRequest => "invalid_request",
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            ValidationReason::TooLarge => "Image exceeds the 10 MiB size limit",
            ValidationReason::MissingImage => "No image provided",
            ValidationReason::InvalidImage => "Image must be a base64 data URI",
            ValidationReason::InvalidConfidence => "Confidence score must be between 0 and 100",
            ValidationReason::InvalidRequest => "Malformed request",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures of image intake and the analysis gateway
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Validation error: {reason}")]
    Validation { reason: ValidationReason },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider rate limit exceeded")]
    RateLimited,

    #[error("Provider quota exhausted")]
    QuotaExceeded,

    /// `status` is `None` when the request never produced an HTTP response
    #[error("Upstream error (status {status:?}): {body}")]
    Upstream { status: Option<u16>, body: String },

    #[error("Provider response contained no tool call")]
    EmptyResult,

    #[error("Malformed analysis result: {0}")]
    MalformedResult(String),
}

impl GatewayError {
    pub fn validation(reason: ValidationReason) -> Self {
        GatewayError::Validation { reason }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Validation { .. } => ErrorKind::Validation,
            GatewayError::Config(_) => ErrorKind::Config,
            GatewayError::RateLimited => ErrorKind::RateLimit,
            GatewayError::QuotaExceeded => ErrorKind::Quota,
            GatewayError::Upstream { .. } => ErrorKind::Upstream,
            GatewayError::EmptyResult => ErrorKind::EmptyResult,
            GatewayError::MalformedResult(_) => ErrorKind::MalformedResult,
        }
    }

    /// Message safe to show an end user
    pub fn user_message(&self) -> &'static str {
        match self {
            GatewayError::Validation { reason } => reason.user_message(),
            GatewayError::Config(_) => "Analysis service is unavailable",
            GatewayError::RateLimited => "Rate limit exceeded. Please try again later.",
            GatewayError::QuotaExceeded => {
                "AI usage quota exhausted. Please contact the service operator."
            }
            GatewayError::Upstream { .. }
            | GatewayError::EmptyResult
            | GatewayError::MalformedResult(_) => "Analysis failed. Please try again.",
        }
    }
}

/// JSON error body returned to HTTP clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Result type for HTTP handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Gateway(e) => e.kind(),
            AppError::Store(_) => ErrorKind::Store,
        }
    }

    fn reason(&self) -> Option<ValidationReason> {
        match self {
            AppError::Gateway(GatewayError::Validation { reason }) => Some(*reason),
            _ => None,
        }
    }

    fn user_message(&self) -> &'static str {
        match self {
            AppError::Gateway(e) => e.user_message(),
            AppError::Store(_) => "Failed to save analysis",
        }
    }
}

impl From<ValidationReason> for AppError {
    fn from(reason: ValidationReason) -> Self {
        AppError::Gateway(GatewayError::validation(reason))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Config => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Quota => StatusCode::PAYMENT_REQUIRED,
            ErrorKind::Upstream | ErrorKind::EmptyResult | ErrorKind::MalformedResult => {
                StatusCode::BAD_GATEWAY
            }
            ErrorKind::Store => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.kind().as_str(),
            message: self.user_message(),
            reason: self.reason().map(|r| r.as_str()),
        })
    }
}
