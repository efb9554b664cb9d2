// Solprobe Engine: Helius read service
// Typed wrappers over Helius JSON-RPC, DAS, and the enhanced REST API.

mod source;
pub mod types;

pub use source::HeliusBalanceSource;
pub use types::*;

use crate::atoms::constants::{
    HELIUS_API_DEVNET, HELIUS_API_MAINNET, MAX_ENHANCED_TRANSACTIONS, MAX_SIGNATURES_PER_QUERY,
};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::Network;
use crate::config::Settings;
use crate::engine::helpers::json_u64;
use crate::engine::rpc::{with_api_key, RpcEndpoints, RpcGateway};
use log::{debug, info};
use serde_json::{json, Value};

const DEFAULT_COMMITMENT: &str = "finalized";

#[derive(Debug, Clone)]
pub struct HeliusService {
    gateway: RpcGateway,
    api_bases: RpcEndpoints,
    api_key: Option<String>,
}

impl HeliusService {
    pub fn new(gateway: RpcGateway, api_bases: RpcEndpoints, api_key: Option<String>) -> Self {
        Self { gateway, api_bases, api_key }
    }

    /// Build from settings. Requires a Helius key.
    pub fn from_settings(settings: &Settings) -> EngineResult<Self> {
        let key = settings.require_helius_key()?;
        let transport = settings.transport()?;
        let endpoints = match &settings.helius_rpc_url {
            Some(url) => RpcEndpoints::uniform(url.clone()),
            None => RpcEndpoints::helius(key)?,
        };
        let api_bases = match &settings.helius_api_url {
            Some(url) => RpcEndpoints::uniform(url.clone()),
            None => RpcEndpoints::new(HELIUS_API_MAINNET, HELIUS_API_DEVNET),
        };
        Ok(Self::new(RpcGateway::new(transport, endpoints), api_bases, Some(key.to_string())))
    }

    pub fn gateway(&self) -> &RpcGateway {
        &self.gateway
    }

    fn enhanced_url(&self, path: &str, network: Network) -> EngineResult<String> {
        let url = format!("{}{}", self.api_bases.url(network).trim_end_matches('/'), path);
        match &self.api_key {
            Some(key) => with_api_key(&url, key),
            None => Ok(url),
        }
    }

    // ── Balances and accounts ──────────────────────────────────────────────

    /// Native balance in lamports.
    pub async fn get_balance(&self, address: &str, network: Network, commitment: Option<&str>) -> EngineResult<u64> {
        let result = self
            .gateway
            .call(
                network,
                "getBalance",
                json!([address, {"commitment": commitment.unwrap_or(DEFAULT_COMMITMENT)}]),
            )
            .await?;
        let value = result.get("value").unwrap_or(&result);
        json_u64(value).ok_or_else(|| EngineError::Decode(format!("getBalance: unexpected result {}", result)))
    }

    /// `None` when the account does not exist.
    pub async fn get_account_info(
        &self,
        address: &str,
        network: Network,
        encoding: Option<&str>,
    ) -> EngineResult<Option<AccountInfoSummary>> {
        let result = self
            .gateway
            .call(
                network,
                "getAccountInfo",
                json!([address, {"encoding": encoding.unwrap_or("base64"), "commitment": DEFAULT_COMMITMENT}]),
            )
            .await?;
        match result.get("value") {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    /// Mint precision from the parsed mint account.
    pub async fn get_mint_decimals(&self, mint: &str, network: Network) -> EngineResult<u8> {
        let result = self
            .gateway
            .call(network, "getAccountInfo", json!([mint, {"encoding": "jsonParsed"}]))
            .await?;
        result
            .pointer("/value/data/parsed/info/decimals")
            .and_then(|d| d.as_u64())
            .and_then(|d| u8::try_from(d).ok())
            .ok_or_else(|| EngineError::Decode(format!("no mint decimals for {}", mint)))
    }

    pub async fn get_token_largest_accounts(
        &self,
        mint: &str,
        network: Network,
        commitment: Option<&str>,
    ) -> EngineResult<Vec<TokenLargestAccount>> {
        let params = match commitment {
            Some(c) => json!([mint, {"commitment": c}]),
            None => json!([mint]),
        };
        let result = self.gateway.call(network, "getTokenLargestAccounts", params).await?;
        let value = result.get("value").cloned().unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(value)?)
    }

    /// DAS `getTokenAccounts`, filtered by owner and/or mint.
    pub async fn get_token_accounts(
        &self,
        owner: Option<&str>,
        mint: Option<&str>,
        network: Network,
        limit: Option<u32>,
        cursor: Option<&str>,
    ) -> EngineResult<TokenAccountsPage> {
        if owner.is_none() && mint.is_none() {
            return Err(EngineError::InvalidInput("getTokenAccounts needs an owner or a mint".into()));
        }
        let mut params = serde_json::Map::new();
        if let Some(o) = owner {
            params.insert("owner".into(), json!(o));
        }
        if let Some(m) = mint {
            params.insert("mint".into(), json!(m));
        }
        if let Some(l) = limit {
            params.insert("limit".into(), json!(l));
        }
        if let Some(c) = cursor {
            params.insert("cursor".into(), json!(c));
        }
        let result = self.gateway.call(network, "getTokenAccounts", Value::Object(params)).await?;
        Ok(TokenAccountsPage::from_das(&result))
    }

    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        mint: Option<&str>,
        network: Network,
    ) -> EngineResult<TokenAccountsPage> {
        self.get_token_accounts(Some(owner), mint, network, None, None).await
    }

    // ── Signatures ─────────────────────────────────────────────────────────

    pub async fn get_signatures_for_address(
        &self,
        address: &str,
        network: Network,
        limit: u32,
        before: Option<&str>,
        until: Option<&str>,
        commitment: Option<&str>,
    ) -> EngineResult<Vec<SignatureInfo>> {
        let mut options = json!({
            "limit": limit.clamp(1, MAX_SIGNATURES_PER_QUERY),
            "commitment": commitment.unwrap_or(DEFAULT_COMMITMENT),
        });
        if let Some(b) = before {
            options["before"] = json!(b);
        }
        if let Some(u) = until {
            options["until"] = json!(u);
        }
        let result = self.gateway.call(network, "getSignaturesForAddress", json!([address, options])).await?;
        Ok(serde_json::from_value(result)?)
    }

    /// One entry per signature; `None` for signatures the node never saw.
    pub async fn get_signature_statuses(
        &self,
        signatures: &[String],
        network: Network,
        search_transaction_history: bool,
        commitment: Option<&str>,
    ) -> EngineResult<Vec<Option<SignatureStatus>>> {
        if signatures.is_empty() {
            return Err(EngineError::InvalidInput("signatures must not be empty".into()));
        }
        let mut options = json!({"searchTransactionHistory": search_transaction_history});
        if let Some(c) = commitment {
            options["commitment"] = json!(c);
        }
        let result = self.gateway.call(network, "getSignatureStatuses", json!([signatures, options])).await?;
        let value = result.get("value").cloned().unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(value)?)
    }

    // ── Simulation and fees ────────────────────────────────────────────────

    /// Simulate a base64 transaction with a replaced blockhash.
    pub async fn simulate_transaction(
        &self,
        transaction_b64: &str,
        network: Network,
        sig_verify: bool,
        commitment: Option<&str>,
    ) -> EngineResult<SimulationSummary> {
        let mut config = json!({"encoding": "base64", "sigVerify": sig_verify, "replaceRecentBlockhash": true});
        if let Some(c) = commitment {
            config["commitment"] = json!(c);
        }
        let result = self.gateway.call(network, "simulateTransaction", json!([transaction_b64, config])).await?;
        let summary = match result.get("value") {
            Some(Value::Null) | None => SimulationSummary::default(),
            Some(value) => serde_json::from_value::<SimulationSummary>(value.clone())?,
        };
        debug!(
            "[helius] Simulation on {}: err={:?} units={:?}",
            network, summary.err, summary.units_consumed
        );
        Ok(summary.truncate_logs())
    }

    pub async fn get_priority_fee_estimate(
        &self,
        network: Network,
        transaction: Option<&str>,
        account_keys: Option<&[String]>,
        priority_level: Option<&str>,
    ) -> EngineResult<PriorityFeeSummary> {
        if transaction.is_some() && account_keys.is_some() {
            return Err(EngineError::InvalidInput(
                "provide either a transaction or account keys, not both".into(),
            ));
        }
        let mut options = json!({"recommended": true});
        if let Some(level) = priority_level {
            options["priorityLevel"] = json!(level);
        }
        let mut body = json!({"options": options});
        if let Some(tx) = transaction {
            body["transaction"] = json!(tx);
        }
        if let Some(keys) = account_keys {
            body["accountKeys"] = json!(keys);
        }
        let result = self.gateway.call(network, "getPriorityFeeEstimate", json!([body])).await?;
        PriorityFeeSummary::from_result(&result)
            .ok_or_else(|| EngineError::Decode(format!("getPriorityFeeEstimate: unexpected result {}", result)))
    }

    // ── DAS and enhanced API ───────────────────────────────────────────────

    pub async fn get_asset(&self, asset_id: &str, network: Network) -> EngineResult<AssetSummary> {
        let result = self.gateway.call(network, "getAsset", json!({"id": asset_id})).await?;
        AssetSummary::from_das(&result)
            .ok_or_else(|| EngineError::Decode(format!("getAsset: no asset id in result for {}", asset_id)))
    }

    /// Parsed transactions from the enhanced API, at most 100 per call.
    pub async fn get_transactions(&self, signatures: &[String], network: Network) -> EngineResult<Vec<EnhancedTxSummary>> {
        if signatures.is_empty() {
            return Err(EngineError::InvalidInput("signatures must not be empty".into()));
        }
        if signatures.len() > MAX_ENHANCED_TRANSACTIONS {
            return Err(EngineError::InvalidInput(format!(
                "max {} signatures per call, got {}; chunk the request",
                MAX_ENHANCED_TRANSACTIONS,
                signatures.len()
            )));
        }
        let url = self.enhanced_url("/v0/transactions", network)?;
        info!("[helius] Fetching {} enhanced transactions on {}", signatures.len(), network);
        let raw = self
            .gateway
            .transport()
            .post_json(&url, json!({"transactions": signatures}))
            .await?;
        let list = raw
            .as_array()
            .ok_or_else(|| EngineError::Decode("enhanced transactions: expected a JSON array".into()))?;
        Ok(list.iter().filter(|tx| tx.is_object()).map(EnhancedTxSummary::from_enhanced).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::http::{HttpTransport, RetryPolicy};
    use httpmock::prelude::*;
    use std::time::Duration;

    fn service(server: &MockServer) -> HeliusService {
        let transport = HttpTransport::new(RetryPolicy::none(), Duration::from_secs(5)).unwrap();
        HeliusService::new(
            RpcGateway::new(transport, RpcEndpoints::uniform(server.url("/rpc"))),
            RpcEndpoints::uniform(server.base_url()),
            Some("KEY".into()),
        )
    }

    async fn rpc_mock<'a>(server: &'a MockServer, method: &str, result: Value) -> httpmock::Mock<'a> {
        let body = json!({"method": method}).to_string();
        server
            .mock_async(move |when, then| {
                when.method(POST).path("/rpc").json_body_partial(body);
                then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 1, "result": result}));
            })
            .await
    }

    #[tokio::test]
    async fn balance_accepts_value_wrapper_and_bare_number() {
        let server = MockServer::start_async().await;
        rpc_mock(&server, "getBalance", json!({"context": {"slot": 1}, "value": 1_500_000_000u64})).await;
        let svc = service(&server);
        assert_eq!(svc.get_balance("A", Network::Mainnet, None).await.unwrap(), 1_500_000_000);

        let bare_server = MockServer::start_async().await;
        rpc_mock(&bare_server, "getBalance", json!(42)).await;
        assert_eq!(service(&bare_server).get_balance("A", Network::Mainnet, None).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn missing_account_is_none() {
        let server = MockServer::start_async().await;
        rpc_mock(&server, "getAccountInfo", json!({"context": {"slot": 1}, "value": null})).await;
        let got = service(&server).get_account_info("A", Network::Devnet, None).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn signature_limit_is_clamped() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/rpc")
                    .json_body_partial(r#"{"method": "getSignaturesForAddress"}"#)
                    .body_contains("\"limit\":1000");
                then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 1, "result": [
                    {"signature": "s1", "slot": 5, "blockTime": 1700000000, "confirmationStatus": "finalized", "err": null}
                ]}));
            })
            .await;

        let sigs = service(&server)
            .get_signatures_for_address("A", Network::Mainnet, 50_000, None, None, None)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].block_time, Some(1_700_000_000));
        assert_eq!(sigs[0].confirmation_status.as_deref(), Some("finalized"));
    }

    #[tokio::test]
    async fn signature_statuses_keep_unknown_slots() {
        let server = MockServer::start_async().await;
        rpc_mock(&server, "getSignatureStatuses", json!({"value": [
            {"slot": 9, "confirmations": null, "err": null, "confirmationStatus": "finalized"},
            null
        ]}))
        .await;
        let statuses = service(&server)
            .get_signature_statuses(&["a".to_string(), "b".to_string()], Network::Mainnet, true, None)
            .await
            .unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].as_ref().unwrap().slot, Some(9));
        assert!(statuses[1].is_none());
    }

    #[tokio::test]
    async fn input_validation_happens_before_network() {
        let server = MockServer::start_async().await;
        let svc = service(&server);
        assert!(matches!(
            svc.get_signature_statuses(&[], Network::Mainnet, false, None).await,
            Err(EngineError::InvalidInput(_))
        ));
        assert!(matches!(
            svc.get_priority_fee_estimate(Network::Mainnet, Some("tx"), Some(&["k".to_string()]), None).await,
            Err(EngineError::InvalidInput(_))
        ));
        let too_many: Vec<String> = (0..101).map(|i| i.to_string()).collect();
        assert!(matches!(svc.get_transactions(&too_many, Network::Mainnet).await, Err(EngineError::InvalidInput(_))));
        assert!(matches!(svc.get_transactions(&[], Network::Mainnet).await, Err(EngineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn simulation_is_summarized() {
        let server = MockServer::start_async().await;
        let logs: Vec<String> = (0..60).map(|i| format!("Program log: {}", i)).collect();
        rpc_mock(&server, "simulateTransaction", json!({"context": {"slot": 1}, "value": {
            "err": null, "unitsConsumed": 4200, "logs": logs
        }}))
        .await;
        let sim = service(&server).simulate_transaction("AAAA", Network::Mainnet, false, None).await.unwrap();
        assert!(sim.succeeded());
        assert_eq!(sim.units_consumed, Some(4200));
        assert_eq!(sim.logs.len(), 50);
    }

    #[tokio::test]
    async fn mint_decimals_from_parsed_account() {
        let server = MockServer::start_async().await;
        rpc_mock(&server, "getAccountInfo", json!({"value": {"data": {"parsed": {"info": {"decimals": 5}, "type": "mint"}}}})).await;
        assert_eq!(service(&server).get_mint_decimals("M", Network::Mainnet).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn enhanced_transactions_use_rest_base_with_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v0/transactions")
                    .query_param("api-key", "KEY")
                    .json_body(json!({"transactions": ["sig1"]}));
                then.status(200).json_body(json!([
                    {"signature": "sig1", "type": "TRANSFER", "fee": 5000, "nativeTransfers": []}
                ]));
            })
            .await;

        let txs = service(&server).get_transactions(&["sig1".to_string()], Network::Mainnet).await.unwrap();
        mock.assert_async().await;
        assert_eq!(txs[0].tx_type.as_deref(), Some("TRANSFER"));
        assert_eq!(txs[0].fee_lamports, Some(5000));
    }

    #[tokio::test]
    async fn get_asset_summarizes() {
        let server = MockServer::start_async().await;
        rpc_mock(&server, "getAsset", json!({"id": "M", "interface": "FungibleToken", "token_info": {"decimals": 6}})).await;
        let asset = service(&server).get_asset("M", Network::Mainnet).await.unwrap();
        assert_eq!(asset.decimals, Some(6));
        assert_eq!(asset.interface.as_deref(), Some("FungibleToken"));
    }
}
