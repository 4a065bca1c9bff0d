/// Request signing for Gemini private endpoints.
///
/// Implements:
/// - API credentials with a redacted `Debug`
/// - HMAC-SHA384 over the base64 payload, hex encoded
/// - a strictly increasing nonce source safe for concurrent callers
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha384;

use crate::encoding::{encode_payload, RequestParams};
use crate::errors::GeminiError;

type HmacSha384 = Hmac<Sha384>;

pub const APIKEY_HEADER: &str = "X-GEMINI-APIKEY";
pub const PAYLOAD_HEADER: &str = "X-GEMINI-PAYLOAD";
pub const SIGNATURE_HEADER: &str = "X-GEMINI-SIGNATURE";

/// API key id and secret. Immutable once built.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: Vec<u8>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl AsRef<[u8]>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.as_ref().to_vec(),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// The three header values of a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    pub api_key: String,
    pub payload: String,
    pub signature: String,
}

impl SignedPayload {
    /// Header name/value pairs in wire order.
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            (APIKEY_HEADER, self.api_key.as_str()),
            (PAYLOAD_HEADER, self.payload.as_str()),
            (SIGNATURE_HEADER, self.signature.as_str()),
        ]
    }
}

/// HMAC-SHA384 of `message` keyed by `secret`, lowercase hex.
pub fn hmac_sha384_hex(secret: &[u8], message: &[u8]) -> Result<String, GeminiError> {
    let mut mac = HmacSha384::new_from_slice(secret)
        .map_err(|e| GeminiError::CryptoError(format!("Invalid HMAC key: {e}")))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Encode and sign `params`. The nonce must already be present in `params`.
pub fn sign(params: &RequestParams, credentials: &Credentials) -> Result<SignedPayload, GeminiError> {
    let payload = encode_payload(params)?;
    let signature = hmac_sha384_hex(&credentials.api_secret, payload.as_bytes())?;
    Ok(SignedPayload {
        api_key: credentials.api_key.clone(),
        payload,
        signature,
    })
}

/// Source of strictly increasing nonces.
///
/// Values follow the wall clock in nanoseconds, but never repeat or go
/// backwards: each call returns `max(now, last + 1)`.
#[derive(Debug, Default)]
pub struct NonceSource {
    last: AtomicU64,
}

impl NonceSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start above `floor`, e.g. a nonce persisted by a previous process.
    pub fn starting_after(floor: u64) -> Self {
        Self {
            last: AtomicU64::new(floor),
        }
    }

    /// Fails once the source has handed out `u64::MAX`.
    pub fn next(&self) -> Result<u64, GeminiError> {
        let now = clock_nanos();
        let prev = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                last.checked_add(1).map(|floor| now.max(floor))
            })
            .map_err(|last| GeminiError::Other(format!("Nonce space exhausted at {last}")))?;
        // prev + 1 cannot overflow: the update above succeeded
        Ok(now.max(prev + 1))
    }

    /// The most recently issued nonce, or the starting floor.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

fn clock_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
