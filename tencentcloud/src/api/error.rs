use std::time::Duration;
use thiserror::Error;

/// Error codes, or code prefixes before the first `.`, worth retrying.
pub const RETRYABLE_ERROR_CODES: &[&str] = &[
    "ClientError.NetworkError",
    "ClientError.HttpStatusCodeError",
    "FailedOperation",
    "InternalError",
    "TradeUnknownError",
    "RequestLimitExceeded",
    "ResourceInUse",
    "ResourceInsufficient",
    "ResourceUnavailable",
    "ResourceBusy",
];

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("[TencentCloudSDKError] Code={code}, Message={message}, RequestId={request_id}")]
    Cloud {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("API returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Timed out after {elapsed:?}, last error: {last}")]
    Timeout { elapsed: Duration, last: String },

    #[error("Flow {flow_id} finished with status {status}")]
    Flow { flow_id: i64, status: i64 },

    #[error("{0}")]
    Failed(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Failed to sign request: {0}")]
    Signing(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl ApiError {
    /// Network failures, HTTP status failures and a fixed set of cloud error
    /// codes are transient; everything else aborts a retry loop.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Request(_) | ApiError::HttpStatus { .. } => true,
            ApiError::Cloud { code, .. } => is_retryable_code(code),
            _ => false,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Cloud { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The remote object does not exist.
    pub fn is_not_found(&self) -> bool {
        self.code().is_some_and(|code| {
            code.starts_with("ResourceNotFound") || code.ends_with("NotFound")
        })
    }
}

fn is_retryable_code(code: &str) -> bool {
    let prefix = code.split('.').next().unwrap_or(code);
    RETRYABLE_ERROR_CODES
        .iter()
        .any(|retryable| *retryable == code || *retryable == prefix)
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Parse(e.to_string())
    }
}
