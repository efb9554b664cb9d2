// Solprobe Engine: Paginated Scan Driver
// Walks full-account scan pages under an iteration budget and an optional
// deadline, tracking the largest holder seen and probing each page's
// qualifying set for the native-balance constraint.

use super::prober::prove_any;
use super::{meets_fee_floor, BalanceSource};
use crate::atoms::error::EngineResult;
use crate::atoms::types::{Candidate, PageCursor, ScanPage, WhaleQuery};
use crate::engine::helpers::raw_to_natural;
use log::{debug, info};
use std::future::Future;
use tokio::time::Instant;

/// What one pass over the scan produced.
#[derive(Debug, Default)]
pub(crate) struct ScanOutcome {
    /// A candidate that met both constraints.
    pub winner: Option<Candidate>,
    /// Largest holder seen on any page, regardless of threshold.
    pub largest: Option<Candidate>,
    pub pages: u32,
}

/// Run `fut`, giving up at `deadline`. `None` means the deadline passed.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}

pub(crate) async fn scan_for_whale<S>(
    query: &WhaleQuery,
    source: &S,
    deadline: Option<Instant>,
) -> EngineResult<ScanOutcome>
where
    S: BalanceSource + ?Sized,
{
    let min_lamports = query.min_lamports();
    let mut outcome = ScanOutcome::default();
    let mut cursor: Option<PageCursor> = None;
    // Fetched lazily, at most once per scan.
    let mut mint_decimals: Option<u8> = None;

    while outcome.pages < query.iteration_budget {
        if deadline.is_some_and(|at| Instant::now() >= at) {
            info!("[whale] Scan deadline reached after {} pages", outcome.pages);
            break;
        }

        let fetch = source.scan_page(&query.mint, query.network, cursor.as_ref(), query.page_size);
        let ScanPage { items, next } = match within(deadline, fetch).await {
            Some(page) => page?,
            None => {
                info!("[whale] Scan deadline hit while fetching page {}", outcome.pages + 1);
                break;
            }
        };
        outcome.pages += 1;

        let mut qualifying = Vec::new();
        for item in items {
            let decimals = match item.decimals {
                Some(d) => d,
                None => match mint_decimals {
                    Some(d) => d,
                    None => {
                        let d = source.asset_decimals(&query.mint, query.network).await?;
                        debug!("[whale] {} has {} decimals", query.mint, d);
                        mint_decimals = Some(d);
                        d
                    }
                },
            };

            let candidate = Candidate {
                amount: raw_to_natural(item.raw_amount, decimals),
                raw_amount: item.raw_amount,
                address: item.owner,
            };
            if outcome.largest.as_ref().map_or(true, |best| candidate.amount > best.amount) {
                outcome.largest = Some(candidate.clone());
            }
            if candidate.amount >= query.min_amount {
                qualifying.push(candidate);
            }
        }

        if !qualifying.is_empty() {
            debug!(
                "[whale] Page {}: probing {} qualifying holders",
                outcome.pages,
                qualifying.len()
            );
            let probe = prove_any(qualifying, query.concurrency, |c: Candidate| {
                let network = query.network;
                async move {
                    let ok = meets_fee_floor(source, &c.address, network, min_lamports).await?;
                    Ok(ok)
                }
            });
            match within(deadline, probe).await {
                Some(Some(winner)) => {
                    outcome.winner = Some(winner);
                    return Ok(outcome);
                }
                Some(None) => {}
                None => {
                    info!("[whale] Scan deadline hit while probing page {}", outcome.pages);
                    break;
                }
            }
        }

        match next {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }

    if outcome.pages >= query.iteration_budget {
        debug!("[whale] Scan stopped at iteration budget ({} pages)", outcome.pages);
    }
    Ok(outcome)
}
