mod auth_extractor;
mod metrics_layer;
mod tracing_layer;

pub use auth_extractor::JwtSecret;
pub use metrics_layer::*;
pub use tracing_layer::*;
