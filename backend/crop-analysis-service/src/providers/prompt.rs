//! Fixed instructions and the structured-output schema sent with every analysis
use crate::models::{CropType, Severity};
use serde_json::{json, Value};

/// Name of the function the model is forced to call
pub const TOOL_NAME: &str = "analyze_crop";

pub const TOOL_DESCRIPTION: &str = "Return the structured crop defect analysis";

pub const SYSTEM_PROMPT: &str = "You are an expert agricultural pathologist. \
Analyze photos of crop plants and identify defects, diseases, pests and nutrient deficiencies.

The crop must be classified as exactly one of: Wheat, Rice, Corn, Tomato, Potato.

For every defect you find, give its name, a short description of the visible symptoms, \
and the affected area (for example a percentage of the leaf surface or the plant parts involved). \
Return an empty defect list for a healthy plant.

Rate overall severity as Low, Medium, High or Critical:
- Low: cosmetic or early-stage damage, no yield impact expected
- Medium: noticeable damage, treatment recommended
- High: significant damage, prompt treatment required
- Critical: severe damage, crop loss likely without immediate action

Give a confidence score from 0 to 100 for your assessment, \
and practical treatment and prevention recommendations for the grower.";

pub const USER_PROMPT: &str =
    "Analyze this crop image for defects and provide a detailed assessment.";

/// JSON schema for the tool arguments. Every field is required.
pub fn analysis_schema() -> Value {
    let crops: Vec<&str> = CropType::ALL.iter().map(|c| c.as_str()).collect();
    let severities: Vec<&str> = Severity::ALL.iter().map(|s| s.as_str()).collect();

    json!({
        "type": "object",
        "properties": {
            "cropType": {
                "type": "string",
                "enum": crops,
                "description": "The type of crop in the image"
            },
            "defects": {
                "type": "array",
                "description": "Defects identified on the plant",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "description": "Name of the defect or disease" },
                        "description": { "type": "string", "description": "Visible symptoms" },
                        "affectedArea": { "type": "string", "description": "Extent of the affected area" }
                    },
                    "required": ["name", "description", "affectedArea"],
                    "additionalProperties": false
                }
            },
            "severity": {
                "type": "string",
                "enum": severities,
                "description": "Overall severity of the defects"
            },
            "confidenceScore": {
                "type": "number",
                "minimum": 0,
                "maximum": 100,
                "description": "Confidence in the assessment, 0 to 100"
            },
            "recommendations": {
                "type": "string",
                "description": "Treatment and prevention recommendations"
            }
        },
        "required": ["cropType", "defects", "severity", "confidenceScore", "recommendations"],
        "additionalProperties": false
    })
}
