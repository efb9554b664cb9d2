// Solprobe Engine: Bounded-Concurrency Prober
// prove_any: first candidate whose predicate resolves true wins.
//
// At most `limit` predicate futures are polled at once. Returning drops the
// stream, which drops every in-flight sibling future; their results are
// never observed.

use crate::atoms::error::EngineResult;
use futures::stream::{self, StreamExt};
use log::debug;
use std::future::Future;

/// Evaluate `predicate` over `candidates` with at most `limit` checks in
/// flight and return the first candidate that passes.
///
/// A predicate error counts as "does not qualify". There is no ordering
/// guarantee among candidates, only that the winner passed its check.
pub async fn prove_any<T, F, Fut>(candidates: Vec<T>, limit: usize, predicate: F) -> Option<T>
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = EngineResult<bool>>,
{
    if candidates.is_empty() {
        return None;
    }
    let total = candidates.len();

    let mut checks = stream::iter(candidates)
        .map(|candidate| {
            let check = predicate(candidate.clone());
            async move { (candidate, check.await) }
        })
        .buffer_unordered(limit.max(1));

    let mut rejected = 0usize;
    while let Some((candidate, outcome)) = checks.next().await {
        match outcome {
            Ok(true) => return Some(candidate),
            Ok(false) => rejected += 1,
            Err(e) => {
                debug!("[whale] probe failed, treating as non-qualifying: {}", e);
                rejected += 1;
            }
        }
    }
    debug!("[whale] prober: 0 of {} candidates qualified ({} rejected)", total, rejected);
    None
}
