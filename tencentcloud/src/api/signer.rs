//! TC3-HMAC-SHA256 request signing for Tencent Cloud API 3.0.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "TC3-HMAC-SHA256";
pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const SIGNED_HEADERS: &str = "content-type;host;x-tc-action";

#[derive(Clone)]
pub struct Credential {
    pub secret_id: String,
    pub secret_key: String,
    pub token: Option<String>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Everything that goes into one signature.
pub struct SigningInput<'a> {
    pub service: &'a str,
    pub host: &'a str,
    pub action: &'a str,
    pub payload: &'a [u8],
    pub timestamp: i64,
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ApiError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ApiError::Signing(format!("invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn canonical_request(input: &SigningInput<'_>) -> String {
    let canonical_headers = format!(
        "content-type:{}\nhost:{}\nx-tc-action:{}\n",
        CONTENT_TYPE,
        input.host,
        input.action.to_lowercase()
    );
    format!(
        "POST\n/\n\n{}\n{}\n{}",
        canonical_headers,
        SIGNED_HEADERS,
        sha256_hex(input.payload)
    )
}

/// UTC date of the request timestamp, `yyyy-mm-dd`.
pub fn request_date(timestamp: i64) -> Result<String, ApiError> {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .ok_or_else(|| ApiError::Signing(format!("timestamp {} out of range", timestamp)))
}

pub fn credential_scope(date: &str, service: &str) -> String {
    format!("{}/{}/tc3_request", date, service)
}

pub fn string_to_sign(timestamp: i64, scope: &str, canonical_request: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        timestamp,
        scope,
        sha256_hex(canonical_request.as_bytes())
    )
}

pub fn signature(
    secret_key: &str,
    date: &str,
    service: &str,
    string_to_sign: &str,
) -> Result<String, ApiError> {
    let secret_date = hmac_sha256(format!("TC3{}", secret_key).as_bytes(), date.as_bytes())?;
    let secret_service = hmac_sha256(&secret_date, service.as_bytes())?;
    let secret_signing = hmac_sha256(&secret_service, b"tc3_request")?;
    Ok(hex::encode(hmac_sha256(
        &secret_signing,
        string_to_sign.as_bytes(),
    )?))
}

/// Value of the `Authorization` header for a request.
pub fn authorization(credential: &Credential, input: &SigningInput<'_>) -> Result<String, ApiError> {
    let date = request_date(input.timestamp)?;
    let scope = credential_scope(&date, input.service);
    let canonical = canonical_request(input);
    let to_sign = string_to_sign(input.timestamp, &scope, &canonical);
    let signature = signature(&credential.secret_key, &date, input.service, &to_sign)?;

    Ok(format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credential.secret_id, scope, SIGNED_HEADERS, signature
    ))
}
