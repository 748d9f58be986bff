pub mod analysis;

pub use analysis::{
    AnalysisRecord, AnalysisRequest, AnalysisResult, CropType, Defect, NewAnalysisRecord, Severity,
    UnknownVariant,
};
