use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tfplug::Context;
use url::Url;

use super::error::ApiError;
use super::pool::HttpConfig;
use super::ratelimit::{RateLimiter, DEFAULT_REQUESTS_PER_SECOND};
use super::retry::{retry, RetryConfig};
use super::signer::{self, Credential, SigningInput};

pub const DEFAULT_DOMAIN: &str = "tencentcloudapi.com";
pub const DEFAULT_PROTOCOL: &str = "HTTPS";
const LANGUAGE: &str = "en-US";

/// Request fields whose values are masked in logs.
const REDACTED_FIELDS: &[&str] = &["Password", "SecretKey"];

/// A product API: endpoint prefix and action version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    pub name: &'static str,
    pub version: &'static str,
}

/// Settings for a [`Client`]; the provider block maps onto this.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credential: Credential,
    pub region: String,
    /// `HTTPS` or `HTTP`
    pub protocol: String,
    pub domain: String,
    /// Full URL used for every service instead of `<service>.<domain>`
    pub endpoint: Option<String>,
    pub retry: RetryConfig,
    pub http: HttpConfig,
    /// Requests per second per action, 0 for unlimited
    pub rate_limit: u32,
}

impl ClientConfig {
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            credential: Credential {
                secret_id: secret_id.into(),
                secret_key: secret_key.into(),
                token: None,
            },
            region: region.into(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            endpoint: None,
            retry: RetryConfig::default(),
            http: HttpConfig::default(),
            rate_limit: DEFAULT_REQUESTS_PER_SECOND,
        }
    }

    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.credential.token = Some(token.into());
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = rate_limit;
        self
    }
}

/// Tencent Cloud API 3.0 client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    credential: Credential,
    region: String,
    scheme: String,
    domain: String,
    endpoint: Option<Url>,
    retry_config: RetryConfig,
    rate_limiter: RateLimiter,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "Response")]
    response: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    error: ErrorDetail,
    #[serde(default)]
    request_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorDetail {
    code: String,
    #[serde(default)]
    message: String,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let scheme = match config.protocol.to_ascii_uppercase().as_str() {
            "HTTPS" => "https",
            "HTTP" => "http",
            other => {
                return Err(ApiError::InvalidEndpoint(format!(
                    "unsupported protocol {}, expected HTTPS or HTTP",
                    other
                )))
            }
        };

        let endpoint = config
            .endpoint
            .as_deref()
            .map(|e| Url::parse(e).map_err(|err| ApiError::InvalidEndpoint(format!("{}: {}", e, err))))
            .transpose()?;

        let http_client = config.http.build_client()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                credential: config.credential,
                region: config.region,
                scheme: scheme.to_string(),
                domain: config.domain,
                endpoint,
                retry_config: config.retry,
                rate_limiter: RateLimiter::new(config.rate_limit),
            }),
        })
    }

    pub fn region(&self) -> &str {
        &self.inner.region
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.inner.retry_config
    }

    /// Where requests for `service` go.
    pub fn endpoint(&self, service: &str) -> Result<Url, ApiError> {
        if let Some(endpoint) = &self.inner.endpoint {
            return Ok(endpoint.clone());
        }
        let raw = format!("{}://{}.{}/", self.inner.scheme, service, self.inner.domain);
        Url::parse(&raw).map_err(|e| ApiError::InvalidEndpoint(format!("{}: {}", raw, e)))
    }

    /// MariaDB (TDSQL) API operations
    pub fn mariadb(&self) -> crate::api::mariadb::MariadbApi<'_> {
        crate::api::mariadb::MariadbApi::new(self)
    }

    /// Media Processing Service API operations
    pub fn mps(&self) -> crate::api::mps::MpsApi<'_> {
        crate::api::mps::MpsApi::new(self)
    }

    /// Tag API operations
    pub fn tag(&self) -> crate::api::tag::TagApi<'_> {
        crate::api::tag::TagApi::new(self)
    }

    /// Sign and send a single API action, without retries.
    pub async fn call<Req, Resp>(
        &self,
        service: &str,
        version: &str,
        action: &str,
        request: &Req,
    ) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        self.inner.rate_limiter.check(action).await;

        let url = self.endpoint(service)?;
        let host = host_header(&url)?;
        let payload = serde_json::to_vec(request)?;
        let timestamp = chrono::Utc::now().timestamp();
        let credential = &self.inner.credential;
        let authorization = signer::authorization(
            credential,
            &SigningInput {
                service,
                host: &host,
                action,
                payload: &payload,
                timestamp,
            },
        )?;

        let mut builder = self
            .inner
            .http_client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, signer::CONTENT_TYPE)
            .header(HOST, host)
            .header("X-TC-Action", action)
            .header("X-TC-Timestamp", timestamp.to_string())
            .header("X-TC-Version", version)
            .header("X-TC-Region", &self.inner.region)
            .header("X-TC-Language", LANGUAGE);
        if let Some(token) = &credential.token {
            builder = builder.header("X-TC-Token", token);
        }

        let request_body = redacted_body(&payload);
        let result = match self.send(builder.body(payload)).await {
            Ok(text) => parse_response(&text).map(|parsed| (parsed, text)),
            Err(e) => Err(e),
        };

        match result {
            Ok((parsed, text)) => {
                tracing::debug!(
                    "api[{}] success, request body [{}], response body [{}]",
                    action,
                    request_body,
                    text
                );
                Ok(parsed)
            }
            Err(e) => {
                tracing::error!(
                    "api[{}] fail, request body [{}], reason [{}]",
                    action,
                    request_body,
                    e
                );
                Err(e)
            }
        }
    }

    /// `call` wrapped in the fixed-interval retry.
    pub async fn call_with_retry<Req, Resp>(
        &self,
        ctx: &Context,
        timeout: Duration,
        service: &str,
        version: &str,
        action: &str,
        request: &Req,
    ) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        retry(ctx, timeout, self.inner.retry_config.interval, || {
            self.call(service, version, action, request)
        })
        .await
    }

    /// Idempotent lookup under the read retry budget.
    pub async fn read<Req, Resp>(
        &self,
        ctx: &Context,
        service: Service,
        action: &str,
        request: &Req,
    ) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let timeout = self.inner.retry_config.read_timeout;
        self.call_with_retry(ctx, timeout, service.name, service.version, action, request)
            .await
    }

    /// Mutating action under the write retry budget.
    pub async fn write<Req, Resp>(
        &self,
        ctx: &Context,
        service: Service,
        action: &str,
        request: &Req,
    ) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let timeout = self.inner.retry_config.write_timeout;
        self.call_with_retry(ctx, timeout, service.name, service.version, action, request)
            .await
    }

    /// Fetch a plain URL, e.g. a watermark image stored on COS.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        tracing::debug!("GET request to: {}", url);
        let response = self.inner.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

/// Request body for the log, with credential fields masked.
fn redacted_body(payload: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(payload) {
        Ok(mut value) => {
            redact(&mut value);
            value.to_string()
        }
        Err(_) => String::from_utf8_lossy(payload).into_owned(),
    }
}

fn redact(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(fields) => {
            for (name, field) in fields.iter_mut() {
                if REDACTED_FIELDS.contains(&name.as_str()) {
                    *field = serde_json::Value::String("******".to_string());
                } else {
                    redact(field);
                }
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(redact),
        _ => {}
    }
}

fn host_header(url: &Url) -> Result<String, ApiError> {
    let host = url
        .host_str()
        .ok_or_else(|| ApiError::InvalidEndpoint(format!("{} has no host", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Unwrap the `{"Response": {...}}` envelope, turning an embedded `Error`
/// into [`ApiError::Cloud`].
pub(crate) fn parse_response<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| ApiError::Parse(format!("{}, body: {}", e, body)))?;

    if envelope.response.get("Error").is_some() {
        let error: ErrorBody = serde_json::from_value(envelope.response)?;
        return Err(ApiError::Cloud {
            code: error.error.code,
            message: error.error.message,
            request_id: error.request_id,
        });
    }

    serde_json::from_value(envelope.response).map_err(Into::into)
}
