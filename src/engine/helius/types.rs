// Solprobe Engine: Helius summary shapes
// Node JSON is camelCase; summaries serialize snake_case and accept the
// node's spelling through serde aliases.

use crate::atoms::constants::MAX_SIMULATION_LOG_LINES;
use crate::engine::helpers::json_u64;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── Accounts ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInfoSummary {
    #[serde(default)]
    pub lamports: u64,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub executable: bool,
    #[serde(default, alias = "rentEpoch", deserialize_with = "lenient_u64")]
    pub rent_epoch: u64,
    #[serde(default)]
    pub space: Option<u64>,
}

/// rentEpoch is u64::MAX on rent-exempt accounts and some nodes send it as a
/// float that no longer fits; clamp instead of failing.
fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    Ok(json_u64(&v).or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)).unwrap_or(0))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLargestAccount {
    pub address: String,
    /// Raw base units, as the node sends them (decimal string).
    pub amount: String,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default, alias = "uiAmountString")]
    pub ui_amount_string: Option<String>,
}

impl TokenLargestAccount {
    /// Natural-unit amount, preferring the node's formatted string.
    pub fn ui_amount(&self) -> Option<f64> {
        if let Some(ui) = self.ui_amount_string.as_deref().and_then(|s| s.parse::<f64>().ok()) {
            return Some(ui);
        }
        let raw: u64 = self.amount.parse().ok()?;
        Some(crate::engine::helpers::raw_to_natural(raw, self.decimals?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenAccountSummary {
    pub token_account: Option<String>,
    pub owner: Option<String>,
    pub mint: Option<String>,
    /// Raw base units.
    pub amount: Option<u64>,
    pub decimals: Option<u8>,
    pub ui_amount_string: Option<String>,
}

impl TokenAccountSummary {
    pub(crate) fn from_das(item: &Value) -> Self {
        let text = |key: &str| item.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let balance = item.get("balance");
        let amount = item
            .get("amount")
            .and_then(json_u64)
            .or_else(|| balance.and_then(|b| b.get("amount")).and_then(json_u64));
        Self {
            token_account: text("address").or_else(|| text("token_account")).or_else(|| text("id")),
            owner: text("owner").or_else(|| text("ownerAddress")),
            mint: text("mint"),
            amount,
            decimals: balance
                .and_then(|b| b.get("decimals"))
                .and_then(|d| d.as_u64())
                .and_then(|d| u8::try_from(d).ok()),
            ui_amount_string: balance
                .and_then(|b| b.get("uiAmountString"))
                .and_then(|s| s.as_str())
                .map(str::to_string),
        }
    }
}

/// One page of DAS `getTokenAccounts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenAccountsPage {
    pub total: Option<u64>,
    pub cursor: Option<String>,
    pub items: Vec<TokenAccountSummary>,
}

impl TokenAccountsPage {
    pub(crate) fn from_das(result: &Value) -> Self {
        let items = result
            .get("token_accounts")
            .or_else(|| result.get("items"))
            .and_then(|v| v.as_array())
            .map(|list| list.iter().map(TokenAccountSummary::from_das).collect())
            .unwrap_or_default();
        Self {
            total: result.get("total").and_then(|v| v.as_u64()),
            cursor: result
                .get("cursor")
                .and_then(|v| v.as_str())
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            items,
        }
    }
}

// ── Signatures ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default, alias = "blockTime")]
    pub block_time: Option<i64>,
    #[serde(default, alias = "confirmationStatus")]
    pub confirmation_status: Option<String>,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureStatus {
    #[serde(default)]
    pub slot: Option<u64>,
    #[serde(default)]
    pub confirmations: Option<u64>,
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default, alias = "confirmationStatus")]
    pub confirmation_status: Option<String>,
}

// ── Simulation and fees ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default, alias = "unitsConsumed")]
    pub units_consumed: Option<u64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub logs: Vec<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

impl SimulationSummary {
    pub fn succeeded(&self) -> bool {
        self.err.as_ref().map_or(true, Value::is_null)
    }

    /// Keep the head and tail of long log output around a marker line.
    pub(crate) fn truncate_logs(mut self) -> Self {
        if self.logs.len() > MAX_SIMULATION_LOG_LINES {
            let head = MAX_SIMULATION_LOG_LINES / 2;
            let tail = head - 1;
            let mut kept: Vec<String> = self.logs[..head].to_vec();
            kept.push("... (truncated) ...".to_string());
            kept.extend_from_slice(&self.logs[self.logs.len() - tail..]);
            self.logs = kept;
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityFeeLevels {
    pub min: Option<f64>,
    pub low: Option<f64>,
    pub medium: Option<f64>,
    pub high: Option<f64>,
    #[serde(alias = "veryHigh")]
    pub very_high: Option<f64>,
    #[serde(alias = "unsafeMax")]
    pub unsafe_max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorityFeeSummary {
    pub estimated_micro_lamports: u64,
    pub levels: Option<PriorityFeeLevels>,
}

impl PriorityFeeSummary {
    /// The node answers with an object, or with a bare number.
    pub(crate) fn from_result(result: &Value) -> Option<Self> {
        if let Some(n) = json_u64(result).or_else(|| result.as_f64().map(|f| f.max(0.0) as u64)) {
            return Some(Self { estimated_micro_lamports: n, levels: None });
        }
        let obj = result.as_object()?;
        let estimate = obj
            .get("priorityFeeEstimate")
            .and_then(|v| json_u64(v).or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
            .unwrap_or(0);
        let levels = obj
            .get("priorityFeeLevels")
            .and_then(|v| serde_json::from_value::<PriorityFeeLevels>(v.clone()).ok());
        Some(Self { estimated_micro_lamports: estimate, levels })
    }
}

// ── DAS assets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub id: String,
    pub interface: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub decimals: Option<u8>,
    pub owner: Option<String>,
    pub image: Option<String>,
    pub collection: Option<String>,
    pub compressed: bool,
}

impl AssetSummary {
    pub(crate) fn from_das(asset: &Value) -> Option<Self> {
        let id = asset.get("id")?.as_str()?.to_string();
        let text = |ptr: &str| asset.pointer(ptr).and_then(|v| v.as_str()).map(str::to_string);

        let image = text("/content/files/0/uri").or_else(|| text("/content/links/image"));
        let collection = asset
            .get("grouping")
            .and_then(|g| g.as_array())
            .and_then(|groups| {
                groups.iter().find_map(|g| {
                    let key = g.get("group_key")?.as_str()?;
                    if key == "collection" || key == "collectionId" {
                        g.get("group_value")?.as_str().map(str::to_string)
                    } else {
                        None
                    }
                })
            });

        Some(Self {
            id,
            interface: text("/interface"),
            name: text("/content/metadata/name"),
            symbol: text("/content/metadata/symbol").or_else(|| text("/token_info/symbol")),
            decimals: asset
                .pointer("/token_info/decimals")
                .and_then(|d| d.as_u64())
                .and_then(|d| u8::try_from(d).ok()),
            owner: text("/ownership/owner"),
            image,
            collection,
            compressed: asset.pointer("/compression/compressed").and_then(|v| v.as_bool()).unwrap_or(false),
        })
    }
}

// ── Enhanced transactions ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeTransfer {
    pub from: String,
    pub to: String,
    pub amount_lamports: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenTransfer {
    pub mint: String,
    pub from: String,
    pub to: String,
    /// Amount as reported (natural units or raw, depending on the feed).
    pub amount: String,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedTxSummary {
    pub signature: Option<String>,
    pub slot: Option<u64>,
    pub timestamp: Option<i64>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub source: Option<String>,
    pub fee_lamports: Option<u64>,
    pub succeeded: Option<bool>,
    pub transaction_error: Option<Value>,
    pub native_transfers: Vec<NativeTransfer>,
    pub token_transfers: Vec<TokenTransfer>,
}

fn first_str(v: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| v.get(*k).and_then(|s| s.as_str()).filter(|s| !s.is_empty()))
        .unwrap_or_default()
        .to_string()
}

impl EnhancedTxSummary {
    pub(crate) fn from_enhanced(tx: &Value) -> Self {
        let text = |key: &str| tx.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let transaction_error = tx.get("transactionError").filter(|e| !e.is_null()).cloned();

        let status = tx.get("status").filter(|s| !s.is_null()).or(transaction_error.as_ref());
        let succeeded = match status {
            Some(Value::String(s)) => Some(s.eq_ignore_ascii_case("success")),
            Some(Value::Object(o)) => Some(!o.contains_key("InstructionError") && !o.contains_key("err")),
            Some(_) => Some(false),
            None => None,
        };

        let native_transfers = tx
            .get("nativeTransfers")
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .map(|nt| NativeTransfer {
                        from: first_str(nt, &["fromUserAccount", "from"]),
                        to: first_str(nt, &["toUserAccount", "to"]),
                        amount_lamports: nt.get("amount").and_then(json_u64).unwrap_or(0),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let token_transfers = tx
            .get("tokenTransfers")
            .and_then(|v| v.as_array())
            .map(|list| list.iter().map(token_transfer).collect())
            .unwrap_or_default();

        Self {
            signature: text("signature"),
            slot: tx.get("slot").and_then(|v| v.as_u64()),
            timestamp: tx.get("timestamp").and_then(|v| v.as_i64()),
            tx_type: text("type"),
            source: text("source"),
            fee_lamports: tx.get("fee").and_then(json_u64),
            succeeded,
            transaction_error,
            native_transfers,
            token_transfers,
        }
    }
}

fn token_transfer(tt: &Value) -> TokenTransfer {
    let token_amount = tt.get("tokenAmount");
    let amount = match token_amount {
        Some(Value::Object(o)) => o.get("amount").map(render_scalar).unwrap_or_default(),
        Some(v) => render_scalar(v),
        None => String::new(),
    };
    let decimals = tt
        .get("decimals")
        .or_else(|| token_amount.and_then(|a| a.get("decimals")))
        .and_then(json_u64)
        .and_then(|d| u8::try_from(d).ok());
    TokenTransfer {
        mint: first_str(tt, &["mint"]),
        from: first_str(tt, &["fromUserAccount", "fromTokenAccount", "from"]),
        to: first_str(tt, &["toUserAccount", "toTokenAccount", "to"]),
        amount,
        decimals,
    }
}

fn render_scalar(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn largest_account_prefers_ui_string() {
        let acct: TokenLargestAccount = serde_json::from_value(json!({
            "address": "A", "amount": "2500000", "decimals": 6, "uiAmount": 2.5, "uiAmountString": "2.5"
        }))
        .unwrap();
        assert_eq!(acct.ui_amount(), Some(2.5));

        let bare = TokenLargestAccount { ui_amount_string: None, ..acct };
        assert_eq!(bare.ui_amount(), Some(2.5));
    }

    #[test]
    fn das_page_reads_token_accounts_key() {
        let page = TokenAccountsPage::from_das(&json!({
            "total": 2, "limit": 1000, "cursor": "next-1",
            "token_accounts": [
                {"address": "ta1", "owner": "o1", "mint": "M", "amount": 1500000},
                {"address": "ta2", "owner": "o2", "mint": "M", "amount": "7"}
            ]
        }));
        assert_eq!(page.cursor.as_deref(), Some("next-1"));
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].amount, Some(1_500_000));
        assert_eq!(page.items[1].amount, Some(7));
        assert_eq!(page.items[1].owner.as_deref(), Some("o2"));
    }

    #[test]
    fn empty_cursor_means_done() {
        let page = TokenAccountsPage::from_das(&json!({"token_accounts": [], "cursor": ""}));
        assert_eq!(page.cursor, None);
    }

    #[test]
    fn simulation_logs_keep_head_and_tail() {
        let logs: Vec<String> = (0..80).map(|i| format!("line {}", i)).collect();
        let sim = SimulationSummary { err: None, units_consumed: Some(5000), logs }.truncate_logs();
        assert_eq!(sim.logs.len(), 50);
        assert_eq!(sim.logs[0], "line 0");
        assert_eq!(sim.logs[24], "line 24");
        assert_eq!(sim.logs[25], "... (truncated) ...");
        assert_eq!(sim.logs[26], "line 56");
        assert_eq!(sim.logs[49], "line 79");
        assert!(sim.succeeded());
    }

    #[test]
    fn short_logs_untouched() {
        let logs: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        let sim = SimulationSummary { logs: logs.clone(), ..Default::default() }.truncate_logs();
        assert_eq!(sim.logs, logs);
    }

    #[test]
    fn priority_fee_accepts_object_or_number() {
        let obj = PriorityFeeSummary::from_result(&json!({
            "priorityFeeEstimate": 1200.0,
            "priorityFeeLevels": {"min": 0.0, "low": 10.0, "medium": 1200.0, "high": 5000.0, "veryHigh": 9000.0, "unsafeMax": 20000.0}
        }))
        .unwrap();
        assert_eq!(obj.estimated_micro_lamports, 1200);
        assert_eq!(obj.levels.unwrap().very_high, Some(9000.0));

        let bare = PriorityFeeSummary::from_result(&json!(777)).unwrap();
        assert_eq!(bare.estimated_micro_lamports, 777);
        assert!(bare.levels.is_none());
    }

    #[test]
    fn asset_summary_extracts_metadata() {
        let asset = AssetSummary::from_das(&json!({
            "id": "MINT", "interface": "FungibleToken",
            "content": {"metadata": {"name": "Bonk", "symbol": "BONK"}, "links": {"image": "https://img"}},
            "token_info": {"decimals": 5},
            "grouping": [{"group_key": "collection", "group_value": "COLL"}],
            "compression": {"compressed": false}
        }))
        .unwrap();
        assert_eq!(asset.symbol.as_deref(), Some("BONK"));
        assert_eq!(asset.decimals, Some(5));
        assert_eq!(asset.image.as_deref(), Some("https://img"));
        assert_eq!(asset.collection.as_deref(), Some("COLL"));
        assert!(AssetSummary::from_das(&json!({"interface": "V1_NFT"})).is_none());
    }

    #[test]
    fn enhanced_tx_status_and_transfers() {
        let tx = EnhancedTxSummary::from_enhanced(&json!({
            "signature": "sig1", "slot": 10, "timestamp": 1700000000, "type": "SWAP", "source": "JUPITER",
            "fee": 5000, "transactionError": null,
            "nativeTransfers": [{"fromUserAccount": "a", "toUserAccount": "b", "amount": 42}],
            "tokenTransfers": [{"mint": "M", "fromUserAccount": "a", "toUserAccount": "b", "tokenAmount": 1.5}]
        }));
        assert_eq!(tx.succeeded, None);
        assert_eq!(tx.native_transfers[0].amount_lamports, 42);
        assert_eq!(tx.token_transfers[0].amount, "1.5");

        let failed = EnhancedTxSummary::from_enhanced(&json!({
            "signature": "sig2", "transactionError": {"InstructionError": [0, "Custom"]}
        }));
        assert_eq!(failed.succeeded, Some(false));
    }

    #[test]
    fn account_info_tolerates_float_rent_epoch() {
        let info: AccountInfoSummary = serde_json::from_value(json!({
            "lamports": 10, "owner": "11111111111111111111111111111111", "executable": false,
            "rentEpoch": 18446744073709551615u64, "space": 0
        }))
        .unwrap();
        assert_eq!(info.rent_epoch, u64::MAX);
    }
}
