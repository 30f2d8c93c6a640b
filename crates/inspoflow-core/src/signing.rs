//! AWS Signature Version 4 request signing for the JSON-RPC style
//! provider API (`X-Amz-Target` dispatch, empty query string).
//!
//! The signer never reads the clock: the caller passes the timestamp, so a
//! given set of inputs always produces the same signature.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::error::PipelineError;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm tag used in the string-to-sign and `Authorization` header.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Content type for AWS JSON 1.1 protocol requests.
pub const AMZ_JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Lower-cased names of the signed headers, in canonical (sorted) order.
const SIGNED_HEADERS: [&str; 4] = ["content-type", "host", "x-amz-date", "x-amz-target"];

/// Long-term access key pair.
#[derive(Clone)]
pub struct Credentials {
    access_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// A fully signed request, ready to hand to an HTTP client.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub method: String,
    pub uri: String,
    /// Content-Type, Host, X-Amz-Date, X-Amz-Target and Authorization
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl SignedRequest {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Signs provider requests for one region/service with one key pair.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: Credentials,
    region: String,
    service: String,
}

impl RequestSigner {
    pub fn new(
        credentials: Credentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Sign a request to `endpoint` dispatched to `target`.
    ///
    /// Fails if `endpoint` is not an absolute URL with a host.
    pub fn sign(
        &self,
        method: &str,
        endpoint: &str,
        target: &str,
        body: Vec<u8>,
        timestamp: DateTime<Utc>,
    ) -> Result<SignedRequest, PipelineError> {
        let url = Url::parse(endpoint).map_err(|e| PipelineError::Signing {
            message: format!("cannot parse endpoint {endpoint:?}: {e}"),
        })?;
        let host = host_header(&url).ok_or_else(|| PipelineError::Signing {
            message: format!("endpoint {endpoint:?} has no host"),
        })?;
        let path = match url.path() {
            "" => "/",
            path => path,
        };

        let amz_date = timestamp.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = timestamp.format("%Y%m%d").to_string();

        let header_values = [AMZ_JSON_CONTENT_TYPE, host.as_str(), &amz_date, target];
        let canonical = canonical_request(method, path, &header_values, &body);
        let scope = format!(
            "{date_stamp}/{}/{}/aws4_request",
            self.region, self.service
        );
        let to_sign = string_to_sign(&amz_date, &scope, &canonical);

        let key = signing_key(
            &self.credentials.secret_key,
            &date_stamp,
            &self.region,
            &self.service,
        )?;
        let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes())?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
            self.credentials.access_key,
            SIGNED_HEADERS.join(";"),
        );

        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), AMZ_JSON_CONTENT_TYPE.to_string());
        headers.insert("Host".to_string(), host);
        headers.insert("X-Amz-Date".to_string(), amz_date);
        headers.insert("X-Amz-Target".to_string(), target.to_string());
        headers.insert("Authorization".to_string(), authorization);

        tracing::trace!(target, "Signed request for {}", url);

        Ok(SignedRequest {
            method: method.to_string(),
            uri: url.to_string(),
            headers,
            body,
        })
    }
}

/// `host` or `host:port` when the URL carries a non-default port.
fn host_header(url: &Url) -> Option<String> {
    let host = url.host_str().filter(|h| !h.is_empty())?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Canonical request over the fixed signed-header set.
///
/// `header_values` lines up with `SIGNED_HEADERS`.
fn canonical_request(method: &str, path: &str, header_values: &[&str; 4], body: &[u8]) -> String {
    let mut canonical_headers = String::new();
    for (name, value) in SIGNED_HEADERS.iter().zip(header_values) {
        canonical_headers.push_str(name);
        canonical_headers.push(':');
        canonical_headers.push_str(value.trim());
        canonical_headers.push('\n');
    }
    format!(
        "{method}\n{path}\n\n{canonical_headers}\n{}\n{}",
        SIGNED_HEADERS.join(";"),
        hex::encode(Sha256::digest(body)),
    )
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes())),
    )
}

/// Derive the per-day, per-region, per-service signing key.
pub fn signing_key(
    secret_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<[u8; 32], PipelineError> {
    let k_secret = format!("AWS4{secret_key}");
    let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Result<[u8; 32], PipelineError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| PipelineError::Signing {
        message: format!("invalid HMAC key: {e}"),
    })?;
    mac.update(message);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}
