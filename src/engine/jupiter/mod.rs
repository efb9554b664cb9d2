// Solprobe Engine: Jupiter Aggregator client
// quote, build_swap, swap_instructions, ultra_order, price, ultra_holdings
//
// Builds unsigned payloads only. An ultra order without a taker gets one from
// the whale resolver so the returned transaction can be simulated.

pub mod types;

pub use types::*;

use crate::atoms::constants::{JUPITER_API_HOST, JUPITER_LITE_HOST};
use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::types::{Network, ResolutionResult, WhaleQuery};
use crate::config::Settings;
use crate::engine::helius::{HeliusService, SimulationSummary};
use crate::engine::http::{HttpTransport, RequestSpec};
use crate::engine::whale::{self, BalanceSource};
use base64::Engine as _;
use log::{info, warn};
use serde_json::Value;
use std::collections::BTreeMap;

/// Simulate a built transaction through Helius before returning it.
#[derive(Debug, Clone, Copy)]
pub struct SimulateWith<'a> {
    pub helius: &'a HeliusService,
    pub network: Network,
    pub sig_verify: bool,
    pub commitment: Option<&'a str>,
}

impl<'a> SimulateWith<'a> {
    pub fn new(helius: &'a HeliusService, network: Network) -> Self {
        Self { helius, network, sig_verify: false, commitment: None }
    }

    async fn run(&self, tx_b64: &str) -> EngineResult<SimulationSummary> {
        self.helius
            .simulate_transaction(tx_b64, self.network, self.sig_verify, self.commitment)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct JupiterClient {
    transport: HttpTransport,
    tier: JupiterTier,
    api_key: Option<String>,
    host: String,
}

impl JupiterClient {
    pub fn new(transport: HttpTransport, tier: JupiterTier, api_key: Option<String>) -> Self {
        let host = match tier {
            JupiterTier::Lite => JUPITER_LITE_HOST,
            JupiterTier::Api => JUPITER_API_HOST,
        };
        Self { transport, tier, api_key, host: host.to_string() }
    }

    pub fn from_settings(settings: &Settings) -> EngineResult<Self> {
        if settings.jupiter_tier == JupiterTier::Api && settings.jupiter_api_key.is_none() {
            warn!("[jupiter] api tier selected without JUPITER_API_KEY; requests may be rejected");
        }
        Ok(Self::new(settings.transport()?, settings.jupiter_tier, settings.jupiter_api_key.clone()))
    }

    /// Point every family at another host (local mock, proxy).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn tier(&self) -> JupiterTier {
        self.tier
    }

    fn url(&self, family: ApiFamily, path: &str) -> String {
        format!("{}{}{}", self.host, family.base_path(), path)
    }

    fn authorize(&self, spec: RequestSpec) -> RequestSpec {
        match (&self.tier, &self.api_key) {
            (JupiterTier::Api, Some(key)) => spec.header("x-api-key", key),
            _ => spec,
        }
    }

    async fn get(&self, family: ApiFamily, path: &str, query: Vec<(String, String)>) -> EngineResult<Value> {
        let spec = self.authorize(RequestSpec::get(self.url(family, path)).query(query));
        self.transport.send_json(&spec).await
    }

    async fn post(&self, family: ApiFamily, path: &str, body: Value) -> EngineResult<Value> {
        let spec = self.authorize(RequestSpec::post(self.url(family, path), body));
        self.transport.send_json(&spec).await
    }

    // ── Swap API ───────────────────────────────────────────────────────────

    pub async fn quote(&self, request: &QuoteRequest) -> EngineResult<QuoteSummary> {
        info!(
            "[jupiter] Quote {} {} -> {}",
            request.amount, request.input_mint, request.output_mint
        );
        let raw = self.get(ApiFamily::Swap, "/quote", request.to_query()).await?;
        let mut quote: QuoteSummary = serde_json::from_value(raw.clone())
            .map_err(|e| EngineError::Decode(format!("unexpected quote response: {}", e)))?;
        quote.raw = raw;
        Ok(quote)
    }

    /// Build the unsigned swap transaction, optionally simulating it.
    pub async fn build_swap(
        &self,
        request: &SwapRequest,
        simulate: Option<SimulateWith<'_>>,
    ) -> EngineResult<UnsignedSwap> {
        let raw = self.post(ApiFamily::Swap, "/swap", serde_json::to_value(request)?).await?;
        let swap_transaction = raw
            .get("swapTransaction")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Decode("swap response missing 'swapTransaction'".into()))?
            .to_string();
        let tx_bytes = decode_transaction(&swap_transaction)?;

        let simulation = match simulate {
            Some(sim) => Some(sim.run(&swap_transaction).await?),
            None => None,
        };
        Ok(UnsignedSwap {
            last_valid_block_height: raw.get("lastValidBlockHeight").and_then(|v| v.as_u64()).unwrap_or(0),
            prioritization_fee_lamports: raw.get("prioritizationFeeLamports").and_then(|v| v.as_u64()),
            swap_transaction,
            tx_bytes,
            simulation,
        })
    }

    pub async fn swap_instructions(&self, request: &SwapRequest) -> EngineResult<Value> {
        self.post(ApiFamily::Swap, "/swap-instructions", serde_json::to_value(request)?).await
    }

    // ── Ultra API ──────────────────────────────────────────────────────────

    /// Request an ultra order. Without a taker, `whales` (when given) is asked
    /// for one; a failed lookup leaves the order taker-less.
    pub async fn ultra_order(
        &self,
        request: &UltraOrderRequest,
        whales: Option<&dyn BalanceSource>,
        simulate: Option<SimulateWith<'_>>,
    ) -> EngineResult<UltraOrder> {
        let taker = match (&request.taker, whales) {
            (Some(t), _) => Some(t.clone()),
            (None, Some(source)) => resolve_taker(&request.input_mint, request.network, source).await,
            (None, None) => None,
        };

        let raw = self.get(ApiFamily::Ultra, "/order", request.to_query(taker.as_deref())).await?;
        let mut order: UltraOrder = serde_json::from_value(raw)
            .map_err(|e| EngineError::Decode(format!("unexpected ultra order response: {}", e)))?;
        if order.taker.is_none() {
            order.taker = taker;
        }

        if let (Some(sim), Some(tx)) = (simulate, order.transaction.as_deref()) {
            decode_transaction(tx)?;
            order.simulation = Some(sim.run(tx).await?);
        }
        Ok(order)
    }

    pub async fn ultra_holdings(&self, address: &str) -> EngineResult<Value> {
        self.get(ApiFamily::Ultra, &format!("/holdings/{}", address), Vec::new()).await
    }

    // ── Price API ──────────────────────────────────────────────────────────

    /// USD prices keyed by mint. Mints without a price are absent.
    pub async fn price(&self, ids: &[String]) -> EngineResult<BTreeMap<String, PriceItem>> {
        let joined = comma_join(ids).ok_or_else(|| EngineError::InvalidInput("price: no mint ids".into()))?;
        let raw = self.get(ApiFamily::Price, "", vec![("ids".into(), joined)]).await?;
        let obj = raw
            .as_object()
            .ok_or_else(|| EngineError::Decode("price response is not an object".into()))?;
        Ok(obj
            .iter()
            .filter_map(|(mint, v)| {
                serde_json::from_value::<PriceItem>(v.clone()).ok().map(|p| (mint.clone(), p))
            })
            .collect())
    }
}

/// Check a base64 transaction decodes; returns its byte length.
fn decode_transaction(tx_b64: &str) -> EngineResult<usize> {
    base64::engine::general_purpose::STANDARD
        .decode(tx_b64)
        .map(|bytes| bytes.len())
        .map_err(|e| EngineError::Decode(format!("transaction is not valid base64: {}", e)))
}

async fn resolve_taker(mint: &str, network: Network, source: &dyn BalanceSource) -> Option<String> {
    match whale::resolve(&WhaleQuery::new(mint, network), source).await {
        Ok(ResolutionResult::Found { address, tier, .. }) => {
            info!("[jupiter] Using whale {} ({:?}) as taker", address, tier);
            Some(address)
        }
        Ok(ResolutionResult::NotFound) => {
            info!("[jupiter] No whale found for {}; ordering without taker", mint);
            None
        }
        Err(e) => {
            warn!("[jupiter] Whale lookup for {} failed: {}; ordering without taker", mint, e);
            None
        }
    }
}
