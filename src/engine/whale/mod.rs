// Solprobe Engine: Whale Resolver
// Finds an address holding at least `min_amount` of a mint that can also pay
// fees. Tiers run in order, each at most once per resolve:
//
//   Direct     → topHolders, sequential short-circuit
//   Scan       → paginated full-account scan, concurrent probing per page
//   BestEffort → largest holder seen, then caller-supplied seeds

mod prober;
mod scan;

pub use prober::prove_any;

use crate::atoms::error::EngineResult;
use crate::atoms::types::{
    HolderEntry, Network, PageCursor, ResolutionResult, ScanPage, Tier, WhaleQuery,
};
use async_trait::async_trait;
use log::{info, warn};
use std::collections::HashSet;
use tokio::time::Instant;

// ── Balance Source ────────────────────────────────────────────────────

/// The reads the resolver needs from a ledger.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Native balance in lamports.
    async fn native_balance(&self, address: &str, network: Network) -> EngineResult<u64>;

    /// Largest holders in supplied order, amounts in natural units. Fails
    /// with `EngineError::TooManyAccounts` for high-cardinality mints.
    async fn top_holders(&self, mint: &str, network: Network) -> EngineResult<Vec<HolderEntry>>;

    /// One page of a full scan. `next == None` ends the scan.
    async fn scan_page(
        &self,
        mint: &str,
        network: Network,
        cursor: Option<&PageCursor>,
        page_size: u32,
    ) -> EngineResult<ScanPage>;

    async fn asset_decimals(&self, mint: &str, network: Network) -> EngineResult<u8>;
}

pub(crate) async fn meets_fee_floor<S>(
    source: &S,
    address: &str,
    network: Network,
    min_lamports: u64,
) -> EngineResult<bool>
where
    S: BalanceSource + ?Sized,
{
    Ok(source.native_balance(address, network).await? >= min_lamports)
}

// ── Resolver ──────────────────────────────────────────────────────────

/// Resolve a whale for `query`. Only errors the tiers cannot recover from
/// surface here; exhausting every tier is `Ok(NotFound)`.
pub async fn resolve<S>(query: &WhaleQuery, source: &S) -> EngineResult<ResolutionResult>
where
    S: BalanceSource + ?Sized,
{
    query.validate()?;
    let deadline = query.deadline.map(|d| Instant::now() + d);
    info!(
        "[whale] Resolving {} on {} (min_amount={}, min_sol={})",
        query.mint, query.network, query.min_amount, query.min_sol
    );

    if let Some(found) = direct_tier(query, source).await? {
        return Ok(found);
    }

    let outcome = scan::scan_for_whale(query, source, deadline).await?;
    if let Some(winner) = outcome.winner {
        info!(
            "[whale] Scan tier found {} holding {} after {} pages",
            winner.address, winner.amount, outcome.pages
        );
        return Ok(ResolutionResult::Found {
            address: winner.address,
            amount: winner.amount,
            tier: Tier::Scan,
        });
    }

    best_effort_tier(query, source, outcome.largest).await
}

async fn direct_tier<S>(query: &WhaleQuery, source: &S) -> EngineResult<Option<ResolutionResult>>
where
    S: BalanceSource + ?Sized,
{
    let holders = match source.top_holders(&query.mint, query.network).await {
        Ok(holders) => holders,
        Err(e) if e.is_too_many_accounts() => {
            info!("[whale] {} has too many holders for a direct query, scanning", query.mint);
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let min_lamports = query.min_lamports();
    // One wallet can own several of the largest token accounts.
    let mut checked: HashSet<String> = HashSet::new();
    for holder in holders {
        if holder.amount < query.min_amount || !checked.insert(holder.address.clone()) {
            continue;
        }
        if meets_fee_floor(source, &holder.address, query.network, min_lamports).await? {
            info!("[whale] Direct tier found {} holding {}", holder.address, holder.amount);
            return Ok(Some(ResolutionResult::Found {
                address: holder.address,
                amount: holder.amount,
                tier: Tier::Direct,
            }));
        }
    }
    Ok(None)
}

async fn best_effort_tier<S>(
    query: &WhaleQuery,
    source: &S,
    largest: Option<crate::atoms::types::Candidate>,
) -> EngineResult<ResolutionResult>
where
    S: BalanceSource + ?Sized,
{
    let min_lamports = query.min_lamports();

    if let Some(best) = largest.filter(|c| c.raw_amount > 0) {
        match meets_fee_floor(source, &best.address, query.network, min_lamports).await {
            Ok(true) => {
                warn!(
                    "[whale] Falling back to largest holder {} ({} < min {} possible)",
                    best.address, best.amount, query.min_amount
                );
                return Ok(ResolutionResult::Found {
                    address: best.address,
                    amount: best.amount,
                    tier: Tier::BestEffort,
                });
            }
            Ok(false) => {}
            Err(e) => warn!("[whale] Fee check for {} failed: {}", best.address, e),
        }
    }

    for seed in &query.seed_addresses {
        match meets_fee_floor(source, seed, query.network, min_lamports).await {
            Ok(true) => {
                warn!("[whale] Using seed address {} (token balance unverified)", seed);
                return Ok(ResolutionResult::Found {
                    address: seed.clone(),
                    amount: 0.0,
                    tier: Tier::Seed,
                });
            }
            Ok(false) => {}
            Err(e) => warn!("[whale] Fee check for seed {} failed: {}", seed, e),
        }
    }

    info!("[whale] No qualifying address for {}", query.mint);
    Ok(ResolutionResult::NotFound)
}
