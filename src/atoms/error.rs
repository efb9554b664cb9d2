// ── Solprobe Atoms: Error Types ────────────────────────────────────────────
// Canonical error enums for the probe, built with `thiserror`.
//
// Design rules:
//   • `TransportError` covers only what happened on the wire (status, timeout,
//     connect failure). It knows nothing about JSON-RPC.
//   • `EngineError` is coarse-grained by layer. `TooManyAccounts` is the one
//     recognised RPC failure the resolver treats as a tier switch.
//   • No variant carries secret material: targets are redacted before they
//     land in an error message.

use thiserror::Error;

// ── Transport errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum TransportError {
    /// The request did not complete within its timeout.
    #[error("request to {target} timed out")]
    Timeout { target: String },

    /// DNS failure, refused connection, reset, or an unreadable body.
    #[error("connection to {target} failed: {message}")]
    ConnectionFailed { target: String, message: String },

    /// 4xx response (429 lands here once retries are exhausted).
    #[error("HTTP {status} from {target}: {body}")]
    HttpClientError { status: u16, target: String, body: String },

    /// 5xx response after retries were exhausted.
    #[error("HTTP {status} from {target}: {body}")]
    HttpServerError { status: u16, target: String, body: String },
}

impl TransportError {
    /// Classify a reqwest failure that happened before a status was read.
    /// The URL is stripped from the message since it may carry an api key.
    pub fn from_reqwest(target: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout { target: target.to_string() }
        } else {
            TransportError::ConnectionFailed {
                target: target.to_string(),
                message: err.without_url().to_string(),
            }
        }
    }

    /// Build the status-carrying variant for a failed response.
    pub fn from_status(status: u16, target: &str, body: &str) -> Self {
        let body = crate::engine::helpers::truncate_utf8(body, 200).to_string();
        if (500..600).contains(&status) {
            TransportError::HttpServerError { status, target: target.to_string(), body }
        } else {
            TransportError::HttpClientError { status, target: target.to_string(), body }
        }
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpClientError { status, .. }
            | TransportError::HttpServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Network-level or HTTP-status failure from the transport.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// JSON-RPC envelope carried an error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node refused a direct query because the mint has too many holders.
    #[error("RPC error {code}: {message} (too many accounts)")]
    TooManyAccounts { code: i64, message: String },

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Settings are invalid or a required key is missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an argument outside the accepted range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A response parsed as JSON but lacked the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    /// Classify a JSON-RPC error object. The node's wording is the only
    /// signal for the high-cardinality case, so it is matched once, here.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        if message.to_ascii_lowercase().contains("too many accounts") {
            EngineError::TooManyAccounts { code, message }
        } else {
            EngineError::Rpc { code, message }
        }
    }

    pub fn is_too_many_accounts(&self) -> bool {
        matches!(self, EngineError::TooManyAccounts { .. })
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All probe operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;

// ── Conversion: EngineError → String ──────────────────────────────────────
// Lets the CLI boundary print errors without boilerplate.

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_many_accounts_is_recognised_case_insensitively() {
        let err = EngineError::from_rpc(-32600, "Too many accounts requested");
        assert!(err.is_too_many_accounts());
        let err = EngineError::from_rpc(-32600, "TOO MANY ACCOUNTS");
        assert!(err.is_too_many_accounts());
    }

    #[test]
    fn other_rpc_errors_keep_code_and_message() {
        match EngineError::from_rpc(-32602, "Invalid param: not base58") {
            EngineError::Rpc { code, message } => {
                assert_eq!(code, -32602);
                assert_eq!(message, "Invalid param: not base58");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn status_split_between_client_and_server() {
        let e = TransportError::from_status(503, "https://x", "busy");
        assert!(matches!(e, TransportError::HttpServerError { status: 503, .. }));
        let e = TransportError::from_status(429, "https://x", "slow down");
        assert!(matches!(e, TransportError::HttpClientError { status: 429, .. }));
        assert_eq!(e.status(), Some(429));
    }
}
