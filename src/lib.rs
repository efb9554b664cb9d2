// Solprobe: Solana ledger probe.
// Resilient Helius transport, tiered whale-address resolver, and unsigned
// Jupiter swap payloads. Nothing here signs or submits transactions.

pub mod atoms;
pub mod config;
pub mod engine;

// ── Re-exports ─────────────────────────────────────────────────────────────

pub use atoms::error::{EngineError, EngineResult, TransportError};
pub use atoms::types::{Candidate, HolderEntry, Network, PageCursor, ResolutionResult, ScanItem, ScanPage, Tier, WhaleQuery};
pub use config::Settings;
pub use engine::helius::{HeliusBalanceSource, HeliusService};
pub use engine::http::{HttpTransport, RetryPolicy};
pub use engine::jupiter::{JupiterClient, JupiterTier};
pub use engine::rpc::{RpcEndpoints, RpcGateway};
pub use engine::whale::{prove_any, resolve, BalanceSource};
