/// Error types for the Gemini SDK.
///
/// Separates three failure classes: transport (`HttpError`), exchange-reported
/// (`Api`) and response-shape (`DecodeError`).
use thiserror::Error;

/// The primary error type for the Gemini SDK.
#[derive(Error, Debug)]
pub enum GeminiError {
    // Exchange-reported ({"result":"error"})
    #[error("[{reason}] {message}")]
    Api { reason: String, message: String },

    // Client-side errors
    #[error("Private endpoint called without API credentials")]
    MissingCredentials,

    // Transport errors
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    // Response shape errors
    #[error("Decode error: {0}")]
    DecodeError(String),

    // Crypto errors
    #[error("Crypto error: {0}")]
    CryptoError(String),

    // Generic
    #[error("{0}")]
    Other(String),
}

/// Well-known reason codes carried by exchange error envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiReason {
    InsufficientFunds,
    OrderNotFound,
    InvalidNonce,
    RateLimit,
    InvalidSignature,
    InvalidSymbol,
    InvalidPrice,
    InvalidQuantity,
    InvalidSide,
    InvalidOrderType,
    MissingApikeyHeader,
    MissingPayloadHeader,
    MissingSignatureHeader,
    InvalidJson,
    Maintenance,
    System,
    Other(String),
}

impl ApiReason {
    /// Classify a raw reason code.
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "InsufficientFunds" => ApiReason::InsufficientFunds,
            "OrderNotFound" => ApiReason::OrderNotFound,
            "InvalidNonce" => ApiReason::InvalidNonce,
            "RateLimit" | "RateLimited" => ApiReason::RateLimit,
            "InvalidSignature" => ApiReason::InvalidSignature,
            "InvalidSymbol" => ApiReason::InvalidSymbol,
            "InvalidPrice" => ApiReason::InvalidPrice,
            "InvalidQuantity" => ApiReason::InvalidQuantity,
            "InvalidSide" => ApiReason::InvalidSide,
            "InvalidOrderType" => ApiReason::InvalidOrderType,
            "MissingApikeyHeader" => ApiReason::MissingApikeyHeader,
            "MissingPayloadHeader" => ApiReason::MissingPayloadHeader,
            "MissingSignatureHeader" => ApiReason::MissingSignatureHeader,
            "InvalidJson" => ApiReason::InvalidJson,
            "Maintenance" => ApiReason::Maintenance,
            "System" => ApiReason::System,
            other => ApiReason::Other(other.to_string()),
        }
    }
}

impl GeminiError {
    /// Build an `Api` error from the envelope's reason and message.
    pub fn from_envelope(reason: Option<String>, message: Option<String>) -> Self {
        GeminiError::Api {
            reason: reason.unwrap_or_default(),
            message: message.unwrap_or_default(),
        }
    }

    /// Returns the raw reason code if this is an exchange-reported error.
    pub fn reason(&self) -> Option<&str> {
        match self {
            GeminiError::Api { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Returns the classified reason code if this is an exchange-reported error.
    pub fn api_reason(&self) -> Option<ApiReason> {
        self.reason().map(ApiReason::from_reason)
    }

    pub fn is_api_error(&self) -> bool {
        matches!(self, GeminiError::Api { .. })
    }

    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            GeminiError::HttpError(_) | GeminiError::WebSocketError(_)
        )
    }

    pub fn is_decode_error(&self) -> bool {
        matches!(self, GeminiError::DecodeError(_))
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        GeminiError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for GeminiError {
    fn from(err: serde_json::Error) -> Self {
        GeminiError::DecodeError(err.to_string())
    }
}

impl From<url::ParseError> for GeminiError {
    fn from(err: url::ParseError) -> Self {
        GeminiError::Other(format!("URL parse error: {err}"))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for GeminiError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        GeminiError::WebSocketError(err.to_string())
    }
}
