//! HMAC request signing for the ForU backend.
//!
//! Every outbound call carries three headers derived here:
//! `x-foru-apikey`, `x-foru-timestamp` and `x-foru-signature`. The signature is
//! HMAC-SHA256 over `METHOD \n TIMESTAMP \n CANONICAL_PAYLOAD`, hex encoded.
//! Signing is pure: no clock reads, no I/O, no validation of the method or
//! payload. A malformed request still gets a signature; the backend rejects it.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use std::fmt;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_API_KEY: &str = "x-foru-apikey";
pub const HEADER_TIMESTAMP: &str = "x-foru-timestamp";
pub const HEADER_SIGNATURE: &str = "x-foru-signature";

const ACCEPT_JSON: &str = "application/json";

type HmacSha256 = Hmac<Sha256>;

/// What gets signed alongside the method and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// GET without a query string.
    Empty,
    /// Raw query string, signed verbatim (a leading `?` is ignored).
    Query(String),
    /// JSON body for POST/PUT, signed in canonical form.
    Json(Value),
}

impl Payload {
    /// Build a query payload, collapsing an empty string to [`Payload::Empty`].
    pub fn query(query: impl Into<String>) -> Self {
        let query = query.into();
        if query.is_empty() || query == "?" {
            Payload::Empty
        } else {
            Payload::Query(query)
        }
    }

    /// Canonical string representation used as signing input.
    ///
    /// JSON objects are serialized compactly with keys sorted at every depth,
    /// so two semantically equal bodies always sign the same.
    pub fn canonical(&self) -> String {
        match self {
            Payload::Empty => String::new(),
            Payload::Query(q) => q.strip_prefix('?').unwrap_or(q).to_string(),
            Payload::Json(v) => {
                let mut out = String::new();
                write_canonical(v, &mut out);
                out
            }
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload::Json(value)
    }
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Current wall-clock time as epoch milliseconds, the form sent in
/// `x-foru-timestamp`. Generate a fresh one per request, including retries.
pub fn timestamp_millis() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

/// Header set for one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub api_key: String,
    pub timestamp: String,
    pub signature: String,
    pub bearer: Option<String>,
}

impl SignedHeaders {
    /// All headers as `(name, value)` pairs, `accept` first.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            (HEADER_ACCEPT, ACCEPT_JSON.to_string()),
            (HEADER_API_KEY, self.api_key.clone()),
            (HEADER_TIMESTAMP, self.timestamp.clone()),
            (HEADER_SIGNATURE, self.signature.clone()),
        ];
        if let Some(token) = &self.bearer {
            pairs.push((HEADER_AUTHORIZATION, format!("Bearer {}", token)));
        }
        pairs
    }
}

/// Holds the API key and shared secret; produces signatures.
#[derive(Clone)]
pub struct Signer {
    api_key: String,
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(api_key: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Hex-encoded HMAC-SHA256 of `method`, `timestamp` and the canonical payload.
    pub fn sign(&self, method: &str, payload: &Payload, timestamp: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length");
        mac.update(method.as_bytes());
        mac.update(b"\n");
        mac.update(timestamp.as_bytes());
        mac.update(b"\n");
        mac.update(payload.canonical().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Full header set for a request signed at `timestamp`.
    pub fn headers(
        &self,
        method: &str,
        payload: &Payload,
        timestamp: &str,
        bearer: Option<&str>,
    ) -> SignedHeaders {
        SignedHeaders {
            api_key: self.api_key.clone(),
            timestamp: timestamp.to_string(),
            signature: self.sign(method, payload, timestamp),
            bearer: bearer.map(str::to_string),
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}
