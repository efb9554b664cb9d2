// Solprobe Engine: Helius-backed BalanceSource
//
// topHolders  → getTokenLargestAccounts, token accounts mapped to owners
// scanPage    → DAS getTokenAccounts with cursor paging
// decimals    → getAccountInfo (jsonParsed mint)

use super::HeliusService;
use crate::atoms::error::EngineResult;
use crate::atoms::types::{HolderEntry, Network, PageCursor, ScanItem, ScanPage};
use crate::engine::whale::BalanceSource;
use async_trait::async_trait;
use log::debug;
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct HeliusBalanceSource {
    service: HeliusService,
}

impl HeliusBalanceSource {
    pub fn new(service: HeliusService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &HeliusService {
        &self.service
    }
}

impl HeliusService {
    /// Map SPL token accounts to their owning wallets. Accounts that cannot
    /// be parsed are absent from the map.
    pub async fn get_token_account_owners(
        &self,
        token_accounts: &[String],
        network: Network,
    ) -> EngineResult<HashMap<String, String>> {
        if token_accounts.is_empty() {
            return Ok(HashMap::new());
        }
        let result = self
            .gateway()
            .call(network, "getMultipleAccounts", json!([token_accounts, {"encoding": "jsonParsed"}]))
            .await?;
        let values = result.get("value").and_then(|v| v.as_array()).cloned().unwrap_or_default();
        Ok(token_accounts
            .iter()
            .zip(values.iter())
            .filter_map(|(account, value)| {
                let owner = value.pointer("/data/parsed/info/owner")?.as_str()?;
                Some((account.clone(), owner.to_string()))
            })
            .collect())
    }
}

#[async_trait]
impl BalanceSource for HeliusBalanceSource {
    async fn native_balance(&self, address: &str, network: Network) -> EngineResult<u64> {
        self.service.get_balance(address, network, None).await
    }

    async fn top_holders(&self, mint: &str, network: Network) -> EngineResult<Vec<HolderEntry>> {
        let largest = self.service.get_token_largest_accounts(mint, network, None).await?;
        let accounts: Vec<String> = largest.iter().map(|a| a.address.clone()).collect();
        let owners = self.service.get_token_account_owners(&accounts, network).await?;

        Ok(largest
            .into_iter()
            .filter_map(|acct| {
                let amount = acct.ui_amount()?;
                let address = owners.get(&acct.address).cloned().unwrap_or(acct.address);
                Some(HolderEntry { address, amount })
            })
            .collect())
    }

    async fn scan_page(
        &self,
        mint: &str,
        network: Network,
        cursor: Option<&PageCursor>,
        page_size: u32,
    ) -> EngineResult<ScanPage> {
        let page = self
            .service
            .get_token_accounts(None, Some(mint), network, Some(page_size), cursor.map(PageCursor::as_str))
            .await?;

        let indexer_empty = page.items.is_empty();
        let items: Vec<ScanItem> = page
            .items
            .into_iter()
            .filter_map(|item| {
                Some(ScanItem { owner: item.owner?, raw_amount: item.amount?, decimals: item.decimals })
            })
            .collect();
        debug!("[helius] scan page for {}: {} accounts, more={}", mint, items.len(), page.cursor.is_some());

        // An empty indexer page ends the scan even if it hands back a cursor.
        // Accounts dropped for missing owner or amount do not count as empty.
        let next = if indexer_empty { None } else { page.cursor.map(PageCursor) };
        Ok(ScanPage { items, next })
    }

    async fn asset_decimals(&self, mint: &str, network: Network) -> EngineResult<u8> {
        self.service.get_mint_decimals(mint, network).await
    }
}
