//! Model provider integrations

pub mod ai_gateway;
pub mod prompt;

pub use ai_gateway::{AnalysisGateway, GatewayConfig};
