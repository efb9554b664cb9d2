// Solprobe Engine: JSON-RPC Gateway
// JsonRpcRequest, JsonRpcError, RpcEndpoints, RpcGateway::call
//
// Wraps the transport with the JSON-RPC 2.0 envelope and turns an envelope
// `error` into a typed EngineError (TooManyAccounts is split out here).

use crate::atoms::constants::{HELIUS_RPC_DEVNET, HELIUS_RPC_MAINNET};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::Network;
use crate::engine::helpers::redact_url;
use crate::engine::http::HttpTransport;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── JSON-RPC 2.0 Framing ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: serde_json::Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: serde_json::Value) -> Self {
        JsonRpcRequest {
            jsonrpc: "2.0".into(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Unwrap a decoded envelope: `error` wins, then `result` (a JSON `null`
/// result is a valid answer, e.g. an unknown transaction).
pub fn unwrap_envelope(mut envelope: serde_json::Value) -> EngineResult<serde_json::Value> {
    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        let err: JsonRpcError = serde_json::from_value(error.clone())
            .map_err(|_| EngineError::Decode(format!("malformed RPC error object: {}", error)))?;
        return Err(EngineError::from_rpc(err.code, err.message));
    }
    match envelope.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(EngineError::Decode("RPC response has neither 'result' nor 'error'".into())),
    }
}

// ── Endpoints ─────────────────────────────────────────────────────────

/// One JSON-RPC URL per network.
#[derive(Debug, Clone)]
pub struct RpcEndpoints {
    mainnet: String,
    devnet: String,
}

impl RpcEndpoints {
    pub fn new(mainnet: impl Into<String>, devnet: impl Into<String>) -> Self {
        Self { mainnet: mainnet.into(), devnet: devnet.into() }
    }

    /// Standard Helius URLs carrying the api key.
    pub fn helius(api_key: &str) -> EngineResult<Self> {
        Ok(Self::new(with_api_key(HELIUS_RPC_MAINNET, api_key)?, with_api_key(HELIUS_RPC_DEVNET, api_key)?))
    }

    /// Both networks served by one URL (custom node, local mock).
    pub fn uniform(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::new(url.clone(), url)
    }

    pub fn url(&self, network: Network) -> &str {
        match network {
            Network::Mainnet => &self.mainnet,
            Network::Devnet => &self.devnet,
        }
    }
}

/// Append `api-key=<key>` to a base URL.
pub fn with_api_key(base: &str, api_key: &str) -> EngineResult<String> {
    let mut url = url::Url::parse(base)
        .map_err(|e| EngineError::Config(format!("invalid endpoint '{}': {}", base, e)))?;
    url.query_pairs_mut().append_pair("api-key", api_key);
    Ok(url.to_string())
}

// ── Gateway ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RpcGateway {
    transport: HttpTransport,
    endpoints: RpcEndpoints,
    next_id: Arc<AtomicU64>,
}

impl RpcGateway {
    pub fn new(transport: HttpTransport, endpoints: RpcEndpoints) -> Self {
        Self { transport, endpoints, next_id: Arc::new(AtomicU64::new(1)) }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Make a JSON-RPC call on `network` and return the unwrapped result.
    pub async fn call(
        &self,
        network: Network,
        method: &str,
        params: serde_json::Value,
    ) -> EngineResult<serde_json::Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = self.endpoints.url(network);
        debug!("[rpc] {} id={} on {} via {}", method, id, network, redact_url(url));

        let request = JsonRpcRequest::new(id, method, params);
        let envelope = self.transport.post_json(url, serde_json::to_value(&request)?).await?;
        unwrap_envelope(envelope)
    }
}
