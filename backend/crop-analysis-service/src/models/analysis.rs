use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Crop categories the model is allowed to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CropType {
    Wheat,
    Rice,
    Corn,
    Tomato,
    Potato,
}

impl CropType {
    pub const ALL: [CropType; 5] = [
        CropType::Wheat,
        CropType::Rice,
        CropType::Corn,
        CropType::Tomato,
        CropType::Potato,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CropType::Wheat => "Wheat",
            CropType::Rice => "Rice",
            CropType::Corn => "Corn",
            CropType::Tomato => "Tomato",
            CropType::Potato => "Potato",
        }
    }
}

/// Severity levels, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
            Severity::Critical => "Critical",
        }
    }
}

/// Returned when a stored text column holds a value outside an enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for CropType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CropType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "crop type",
                value: s.to_string(),
            })
    }
}

impl FromStr for Severity {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "severity",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for CropType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a display-only analysis call. `image` is a base64 data URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub image: Option<String>,
}

/// A single defect observed on the plant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defect {
    pub name: String,
    pub description: String,
    /// Free text, e.g. "30%" or "lower leaves"
    pub affected_area: String,
}

/// Typed output of one gateway call.
///
/// Every field is required when deserializing; a provider reply missing any of
/// them never becomes a partially-populated result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub crop_type: CropType,
    pub defects: Vec<Defect>,
    pub severity: Severity,
    /// 0.0 - 100.0 inclusive
    pub confidence_score: f64,
    pub recommendations: String,
}

impl AnalysisResult {
    pub fn confidence_in_range(&self) -> bool {
        confidence_in_range(self.confidence_score)
    }
}

pub(crate) fn confidence_in_range(score: f64) -> bool {
    score.is_finite() && (0.0..=100.0).contains(&score)
}

/// Round to the two fractional digits the store keeps
pub(crate) fn round_confidence(score: f64) -> f64 {
    (score * 100.0).round() / 100.0
}

/// The persisted projection of an [`AnalysisResult`]; recommendations are display-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnalysisRecord {
    pub crop_type: CropType,
    pub defects: Vec<Defect>,
    pub severity: Severity,
    pub confidence_score: f64,
}

impl NewAnalysisRecord {
    pub fn confidence_in_range(&self) -> bool {
        confidence_in_range(self.confidence_score)
    }
}

impl From<&AnalysisResult> for NewAnalysisRecord {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            crop_type: result.crop_type,
            defects: result.defects.clone(),
            severity: result.severity,
            confidence_score: result.confidence_score,
        }
    }
}

/// Stored analysis. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub crop_type: CropType,
    pub defects: Vec<Defect>,
    pub severity: Severity,
    pub confidence_score: f64,
    /// Reserved for image archival, never populated
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
