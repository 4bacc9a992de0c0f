//! Tencent Cloud API 3.0 client and the product APIs built on it

pub mod client;
pub mod error;
pub mod mariadb;
pub mod mps;
pub mod pool;
pub mod ratelimit;
pub mod retry;
pub mod signer;
pub mod tag;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, ClientConfig, Service};
pub use error::ApiError;
pub use retry::{poll_until, retry, PollStatus, RetryConfig, READ_RETRY_TIMEOUT, WRITE_RETRY_TIMEOUT};

use serde::Deserialize;

/// Response of actions that return nothing but a request id.
#[derive(Debug, Deserialize)]
pub struct EmptyResponse {
    #[serde(rename = "RequestId", default)]
    pub request_id: String,
}
