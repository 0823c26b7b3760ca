use thiserror::Error;

/// Failures at the HTTP seam.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS or body transfer failure
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The client-side deadline elapsed before a response arrived
    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Non-2xx response, with the backend's `message` when it sent one
    #[error("HTTP {status}: {}", message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    /// 2xx response whose envelope said `success: false` or had no data
    #[error("request rejected: {}", message.as_deref().unwrap_or("no details"))]
    Rejected { message: Option<String> },

    /// Body could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be built (bad base URL, empty id, ...)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An authenticated endpoint was called without a configured token
    #[error("no API token configured")]
    MissingToken,
}

impl ApiError {
    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ApiError::Timeout {
                seconds: timeout_secs,
            }
        } else if err.is_decode() {
            ApiError::InvalidResponse(err.to_string())
        } else {
            ApiError::Network(err)
        }
    }

    /// Message to show the user: the backend's own words when present,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            }
            | ApiError::Rejected {
                message: Some(message),
            } => message.clone(),
            ApiError::MissingToken => "You need to be signed in to do that.".to_string(),
            _ => fallback.to_string(),
        }
    }
}
