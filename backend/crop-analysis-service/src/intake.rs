//! Image intake: size check and data URI encoding
use crate::error::{GatewayError, ValidationReason};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mime::Mime;

/// Largest accepted image, in bytes (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

const DATA_URI_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// A self-contained image ready to be inlined into a provider request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    mime_type: String,
    byte_len: usize,
    data_uri: String,
}

impl EncodedImage {
    /// MIME type embedded in the data URI
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Size of the decoded image
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    pub fn as_data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn into_data_uri(self) -> String {
        self.data_uri
    }
}

/// Encode raw image bytes as a data URI.
///
/// `content_type` falls back to `application/octet-stream` when absent or not a
/// valid MIME type. Parameters such as `charset` are dropped. An empty body
/// counts as a missing image.
pub fn prepare(bytes: &[u8], content_type: Option<&str>) -> Result<EncodedImage, GatewayError> {
    if bytes.is_empty() {
        return Err(GatewayError::validation(ValidationReason::MissingImage));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(GatewayError::validation(ValidationReason::TooLarge));
    }

    let mime_type = content_type
        .and_then(|ct| ct.parse::<Mime>().ok())
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.essence_str().to_string());

    let data_uri = format!(
        "{}{}{}{}",
        DATA_URI_PREFIX,
        mime_type,
        BASE64_MARKER,
        STANDARD.encode(bytes)
    );

    Ok(EncodedImage {
        mime_type,
        byte_len: bytes.len(),
        data_uri,
    })
}

/// Validate a client-supplied `data:<mime>;base64,<payload>` string
pub fn parse_data_uri(uri: &str) -> Result<EncodedImage, GatewayError> {
    let invalid = || GatewayError::validation(ValidationReason::InvalidImage);

    let rest = uri.strip_prefix(DATA_URI_PREFIX).ok_or_else(invalid)?;
    let (mime_type, payload) = rest.split_once(BASE64_MARKER).ok_or_else(invalid)?;
    let mime_type = mime_type.parse::<Mime>().map_err(|_| invalid())?;

    // Reject oversized payloads before paying for the decode
    if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 2 {
        return Err(GatewayError::validation(ValidationReason::TooLarge));
    }

    let bytes = STANDARD.decode(payload).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(GatewayError::validation(ValidationReason::MissingImage));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(GatewayError::validation(ValidationReason::TooLarge));
    }

    Ok(EncodedImage {
        mime_type: mime_type.essence_str().to_string(),
        byte_len: bytes.len(),
        data_uri: uri.to_string(),
    })
}
