pub mod client;
pub mod error;

pub use client::{AnalysisApi, ApiClientConfig, HttpApiClient};
pub use error::ApiError;
