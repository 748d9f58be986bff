//! Chat-completions client that forces a structured crop analysis
use crate::error::{GatewayError, ValidationReason};
use crate::intake::{self, EncodedImage};
use crate::models::{AnalysisRequest, AnalysisResult};
use crate::providers::prompt::{self, SYSTEM_PROMPT, TOOL_DESCRIPTION, TOOL_NAME, USER_PROMPT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings injected into the gateway at construction
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Provider credential. `None` or empty makes every call fail with a config error.
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Stateless analysis gateway. Each call is a single provider attempt.
#[derive(Clone)]
pub struct AnalysisGateway {
    client: Client,
    config: GatewayConfig,
}

// ============================================
// Request types
// ============================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    tools: Vec<Tool>,
    tool_choice: ToolChoice,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum Message<'a> {
    System { content: &'a str },
    User { content: Vec<ContentPart<'a>> },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl<'a> },
}

#[derive(Debug, Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: FunctionDeclaration,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: FunctionName,
}

#[derive(Debug, Serialize)]
struct FunctionName {
    name: &'static str,
}

// ============================================
// Response types
// ============================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ResponseMessage {
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ToolCall {
    function: FunctionCall,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    #[serde(default)]
    name: Option<String>,
    /// Usually a JSON-encoded string; some providers send the object itself
    #[serde(default)]
    arguments: Value,
}

fn build_request<'a>(model: &'a str, image: &'a EncodedImage) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            Message::System {
                content: SYSTEM_PROMPT,
            },
            Message::User {
                content: vec![
                    ContentPart::Text { text: USER_PROMPT },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image.as_data_uri(),
                        },
                    },
                ],
            },
        ],
        tools: vec![Tool {
            tool_type: "function",
            function: FunctionDeclaration {
                name: TOOL_NAME,
                description: TOOL_DESCRIPTION,
                parameters: prompt::analysis_schema(),
            },
        }],
        tool_choice: ToolChoice {
            tool_type: "function",
            function: FunctionName { name: TOOL_NAME },
        },
    }
}

/// Turn a 2xx provider body into a typed result
fn parse_response(body: &str) -> Result<AnalysisResult, GatewayError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedResult(format!("response body: {}", e)))?;

    let call = response
        .choices
        .into_iter()
        .filter_map(|c| c.message)
        .filter_map(|m| m.tool_calls)
        .flatten()
        .find(|call| call.function.name.as_deref().map_or(true, |n| n == TOOL_NAME))
        .ok_or(GatewayError::EmptyResult)?;

    let result: AnalysisResult = match call.function.arguments {
        Value::String(raw) => serde_json::from_str(&raw),
        Value::Null => return Err(GatewayError::EmptyResult),
        other => serde_json::from_value(other),
    }
    .map_err(|e| GatewayError::MalformedResult(e.to_string()))?;

    if !result.confidence_in_range() {
        return Err(GatewayError::MalformedResult(format!(
            "confidenceScore {} outside 0-100",
            result.confidence_score
        )));
    }

    Ok(result)
}

impl AnalysisGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Check if a provider credential is present
    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    fn require_api_key(&self) -> Result<&str, GatewayError> {
        self.api_key().ok_or_else(|| {
            error!("AI gateway API key is not configured");
            GatewayError::Config("AI gateway API key is not configured".to_string())
        })
    }

    /// Analyze a request whose image arrives as a client-supplied data URI.
    ///
    /// The credential is checked before the request so a misconfigured service
    /// reports a config error regardless of input.
    pub async fn analyze_request(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, GatewayError> {
        self.require_api_key()?;

        let uri = request
            .image
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                warn!("Analysis request without image");
                GatewayError::validation(ValidationReason::MissingImage)
            })?;

        let image = intake::parse_data_uri(uri).map_err(|e| {
            warn!(error = %e, "Rejected analysis image");
            e
        })?;

        self.analyze(&image).await
    }

    /// Send one image to the provider and normalize the reply
    pub async fn analyze(&self, image: &EncodedImage) -> Result<AnalysisResult, GatewayError> {
        let api_key = self.require_api_key()?;

        info!(
            model = %self.config.model,
            mime_type = %image.mime_type(),
            image_bytes = image.byte_len(),
            "Analyzing crop image"
        );

        let request = build_request(&self.config.model, image);
        let start = Instant::now();

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, timeout = e.is_timeout(), "AI gateway request failed");
                GatewayError::Upstream {
                    status: None,
                    body: e.to_string(),
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!(status = %status, "AI gateway rate limit exceeded");
            return Err(GatewayError::RateLimited);
        }
        if status == StatusCode::PAYMENT_REQUIRED {
            warn!(status = %status, "AI gateway quota exhausted");
            return Err(GatewayError::QuotaExceeded);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_text, "AI gateway request failed");
            return Err(GatewayError::Upstream {
                status: Some(status.as_u16()),
                body: error_text,
            });
        }

        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read AI gateway response");
            GatewayError::Upstream {
                status: Some(status.as_u16()),
                body: e.to_string(),
            }
        })?;

        let elapsed = start.elapsed();
        debug!(elapsed_ms = elapsed.as_millis(), "AI gateway response received");

        let result = parse_response(&body).map_err(|e| {
            match &e {
                GatewayError::EmptyResult => {
                    error!(body = %body, "AI gateway response has no tool call")
                }
                _ => error!(error = %e, body = %body, "AI gateway returned malformed analysis"),
            }
            e
        })?;

        info!(
            crop_type = %result.crop_type,
            severity = %result.severity,
            confidence = result.confidence_score,
            defects = result.defects.len(),
            elapsed_ms = elapsed.as_millis(),
            "Crop analysis complete"
        );

        Ok(result)
    }
}
