//! Test helpers for the Tencent Cloud API

use super::{Client, ClientConfig, RetryConfig};

/// Client pointed at a mock server, with fast retries and no rate limit.
#[allow(dead_code)]
pub fn create_test_client(url: &str) -> Client {
    Client::new(
        ClientConfig::new("AKIDTEST", "test-secret-key", "ap-guangzhou")
            .with_endpoint(url)
            .with_retry_config(RetryConfig::fast())
            .with_rate_limit(0),
    )
    .unwrap()
}

/// `{"Response": {...}}` body with a request id added.
#[allow(dead_code)]
pub fn response_body(fields: serde_json::Value) -> String {
    let mut response = fields;
    if let Some(map) = response.as_object_mut() {
        map.insert("RequestId".to_string(), serde_json::json!("test-request"));
    }
    serde_json::json!({ "Response": response }).to_string()
}

#[allow(dead_code)]
pub fn error_body(code: &str, message: &str) -> String {
    response_body(serde_json::json!({
        "Error": { "Code": code, "Message": message }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_body_wraps_fields() {
        let body = response_body(serde_json::json!({"FlowId": 3}));
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["Response"]["FlowId"], 3);
        assert_eq!(value["Response"]["RequestId"], "test-request");
    }

    #[test]
    fn test_client_uses_fast_retries() {
        let client = create_test_client("http://127.0.0.1:1");
        assert_eq!(client.retry_config().interval.as_millis(), 5);
        assert_eq!(client.region(), "ap-guangzhou");
    }
}
