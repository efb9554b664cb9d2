// Solprobe Engine: Jupiter request and response shapes

use crate::atoms::types::Network;
use crate::engine::helius::SimulationSummary;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Tiers and families ─────────────────────────────────────────────────────

/// Which Jupiter host family to talk to. `Api` expects an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JupiterTier {
    #[default]
    Lite,
    Api,
}

impl JupiterTier {
    /// Unknown values fall back to `Lite`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "api" => JupiterTier::Api,
            "lite" => JupiterTier::Lite,
            other => {
                warn!("[jupiter] Unknown tier '{}', using lite", other);
                JupiterTier::Lite
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFamily {
    Swap,
    Ultra,
    Price,
    Tokens,
}

impl ApiFamily {
    pub fn base_path(&self) -> &'static str {
        match self {
            ApiFamily::Swap => "/swap/v1",
            ApiFamily::Ultra => "/ultra/v1",
            ApiFamily::Price => "/price/v3",
            ApiFamily::Tokens => "/tokens/v2",
        }
    }
}

/// Drop unset parameters and render the rest as query pairs.
pub(crate) fn shape_query(params: Vec<(&str, Option<String>)>) -> Vec<(String, String)> {
    params.into_iter().filter_map(|(k, v)| v.map(|v| (k.to_string(), v))).collect()
}

/// Comma-join non-empty entries; `None` when nothing is left.
pub(crate) fn comma_join(items: &[String]) -> Option<String> {
    let joined = items.iter().filter(|s| !s.is_empty()).cloned().collect::<Vec<_>>().join(",");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

// ── Swap API ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Raw input amount in base units.
    pub amount: u64,
    pub slippage_bps: Option<u16>,
    pub swap_mode: Option<String>,
    pub dexes: Vec<String>,
    pub exclude_dexes: Vec<String>,
    pub restrict_intermediate_tokens: Option<bool>,
    pub only_direct_routes: Option<bool>,
    pub as_legacy_transaction: Option<bool>,
    pub platform_fee_bps: Option<u16>,
    pub max_accounts: Option<u32>,
    pub dynamic_slippage: Option<bool>,
}

impl QuoteRequest {
    pub fn new(input_mint: impl Into<String>, output_mint: impl Into<String>, amount: u64) -> Self {
        Self { input_mint: input_mint.into(), output_mint: output_mint.into(), amount, ..Default::default() }
    }

    pub fn with_slippage_bps(mut self, bps: u16) -> Self {
        self.slippage_bps = Some(bps);
        self
    }

    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let s = |v: Option<bool>| v.map(|b| b.to_string());
        shape_query(vec![
            ("inputMint", Some(self.input_mint.clone())),
            ("outputMint", Some(self.output_mint.clone())),
            ("amount", Some(self.amount.to_string())),
            ("slippageBps", self.slippage_bps.map(|b| b.to_string())),
            ("swapMode", self.swap_mode.clone()),
            ("dexes", comma_join(&self.dexes)),
            ("excludeDexes", comma_join(&self.exclude_dexes)),
            ("restrictIntermediateTokens", s(self.restrict_intermediate_tokens)),
            ("onlyDirectRoutes", s(self.only_direct_routes)),
            ("asLegacyTransaction", s(self.as_legacy_transaction)),
            ("platformFeeBps", self.platform_fee_bps.map(|b| b.to_string())),
            ("maxAccounts", self.max_accounts.map(|m| m.to_string())),
            ("dynamicSlippage", s(self.dynamic_slippage)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    #[serde(default)]
    pub swap_info: Value,
    #[serde(default)]
    pub percent: Option<f64>,
}

impl RoutePlanStep {
    pub fn label(&self) -> Option<&str> {
        self.swap_info.get("label").and_then(|v| v.as_str())
    }
}

/// Quote as returned by `/quote`. The untouched response is kept so it can
/// be posted back to `/swap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub input_mint: String,
    pub in_amount: String,
    pub output_mint: String,
    pub out_amount: String,
    pub other_amount_threshold: String,
    pub swap_mode: String,
    pub slippage_bps: u16,
    #[serde(default)]
    pub price_impact_pct: Option<String>,
    #[serde(default)]
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(default)]
    pub context_slot: Option<u64>,
    #[serde(skip)]
    pub raw: Value,
}

impl QuoteSummary {
    pub fn route_labels(&self) -> Vec<&str> {
        self.route_plan.iter().filter_map(RoutePlanStep::label).collect()
    }
}

/// Body for `/swap` and `/swap-instructions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub user_public_key: String,
    pub quote_response: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    pub wrap_and_unwrap_sol: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_shared_accounts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_token_account: Option<String>,
    pub as_legacy_transaction: bool,
    pub dynamic_compute_unit_limit: bool,
    pub dynamic_slippage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_unit_price_micro_lamports: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritization_fee_lamports: Option<Value>,
}

impl SwapRequest {
    pub fn new(user_public_key: impl Into<String>, quote: &QuoteSummary) -> Self {
        Self {
            user_public_key: user_public_key.into(),
            quote_response: quote.raw.clone(),
            payer: None,
            wrap_and_unwrap_sol: true,
            use_shared_accounts: None,
            fee_account: None,
            destination_token_account: None,
            as_legacy_transaction: false,
            dynamic_compute_unit_limit: false,
            dynamic_slippage: false,
            compute_unit_price_micro_lamports: None,
            prioritization_fee_lamports: None,
        }
    }
}

/// An unsigned swap transaction. Nothing here is signed or submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedSwap {
    /// Base64 serialized versioned transaction.
    pub swap_transaction: String,
    pub last_valid_block_height: u64,
    pub prioritization_fee_lamports: Option<u64>,
    pub tx_bytes: usize,
    pub simulation: Option<SimulationSummary>,
}

// ── Ultra API ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UltraOrderRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Raw input amount in base units.
    pub amount: String,
    /// When unset a whale holding the input mint is looked up.
    pub taker: Option<String>,
    pub referral_account: Option<String>,
    pub referral_fee: Option<u16>,
    pub exclude_routers: Option<String>,
    pub exclude_dexes: Option<String>,
    /// Network used for taker resolution and simulation.
    pub network: Network,
}

impl UltraOrderRequest {
    pub fn new(input_mint: impl Into<String>, output_mint: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            input_mint: input_mint.into(),
            output_mint: output_mint.into(),
            amount: amount.into(),
            taker: None,
            referral_account: None,
            referral_fee: None,
            exclude_routers: None,
            exclude_dexes: None,
            network: Network::Mainnet,
        }
    }

    pub(crate) fn to_query(&self, taker: Option<&str>) -> Vec<(String, String)> {
        shape_query(vec![
            ("inputMint", Some(self.input_mint.clone())),
            ("outputMint", Some(self.output_mint.clone())),
            ("amount", Some(self.amount.clone())),
            ("taker", taker.map(str::to_string)),
            ("referralAccount", self.referral_account.clone()),
            ("referralFee", self.referral_fee.map(|f| f.to_string())),
            ("excludeRouters", self.exclude_routers.clone()),
            ("excludeDexes", self.exclude_dexes.clone()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UltraOrder {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    #[serde(default)]
    pub router: Option<String>,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub taker: Option<String>,
    #[serde(default)]
    pub gasless: bool,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub simulation: Option<SimulationSummary>,
}

// ── Price API ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceItem {
    pub usd_price: f64,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub block_id: Option<u64>,
    #[serde(default)]
    pub price_change_24h: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_quote_params_are_dropped() {
        let mut req = QuoteRequest::new("IN", "OUT", 1000).with_slippage_bps(50);
        req.dexes = vec!["Orca".into(), String::new(), "Raydium".into()];
        let q = req.to_query();
        assert!(q.contains(&("slippageBps".into(), "50".into())));
        assert!(q.contains(&("dexes".into(), "Orca,Raydium".into())));
        assert!(!q.iter().any(|(k, _)| k == "excludeDexes" || k == "swapMode"));
    }

    #[test]
    fn tier_parsing_is_lenient() {
        assert_eq!(JupiterTier::parse_lenient("API"), JupiterTier::Api);
        assert_eq!(JupiterTier::parse_lenient("gold"), JupiterTier::Lite);
    }

    #[test]
    fn swap_request_skips_unset_options() {
        let quote = QuoteSummary {
            input_mint: "IN".into(),
            in_amount: "1".into(),
            output_mint: "OUT".into(),
            out_amount: "2".into(),
            other_amount_threshold: "2".into(),
            swap_mode: "ExactIn".into(),
            slippage_bps: 50,
            price_impact_pct: None,
            route_plan: Vec::new(),
            context_slot: None,
            raw: serde_json::json!({"inputMint": "IN"}),
        };
        let v = serde_json::to_value(SwapRequest::new("USER", &quote)).unwrap();
        assert_eq!(v["userPublicKey"], "USER");
        assert_eq!(v["quoteResponse"]["inputMint"], "IN");
        assert_eq!(v["wrapAndUnwrapSol"], true);
        assert!(v.get("payer").is_none());
    }
}
