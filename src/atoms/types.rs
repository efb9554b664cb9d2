// ── Solprobe Atoms: Value Types ────────────────────────────────────────────
// Network selector plus the resolver's inputs, candidates, and outcome.
// Everything here is a plain value owned by the call that built it.

use super::constants::{
    DEFAULT_ITERATION_BUDGET, DEFAULT_MIN_AMOUNT, DEFAULT_MIN_SOL, DEFAULT_PAGE_SIZE,
    DEFAULT_PROBE_CONCURRENCY, LAMPORTS_PER_SOL,
};
use super::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ── Network ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Devnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Devnet => "devnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            "devnet" => Ok(Network::Devnet),
            other => Err(EngineError::InvalidInput(format!(
                "network must be 'mainnet' or 'devnet', got '{}'",
                other
            ))),
        }
    }
}

// ── Balance source shapes ──────────────────────────────────────────────────

/// One entry of a direct top-holder query, amount already in natural units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderEntry {
    pub address: String,
    pub amount: f64,
}

/// One account from a full-scan page. `decimals` is set only when the page
/// carried precision for this item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanItem {
    pub owner: String,
    pub raw_amount: u64,
    pub decimals: Option<u8>,
}

/// Opaque continuation token for a paginated scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor(pub String);

impl PageCursor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    pub items: Vec<ScanItem>,
    /// `None` means the scan is complete.
    pub next: Option<PageCursor>,
}

/// An address with both its natural-unit and raw token amount.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub address: String,
    pub amount: f64,
    pub raw_amount: u64,
}

// ── Whale query ────────────────────────────────────────────────────────────

/// Immutable input to `resolve`. Build with `WhaleQuery::new` and the
/// `with_*` setters, then `validate()` (the resolver validates as well).
#[derive(Debug, Clone)]
pub struct WhaleQuery {
    pub mint: String,
    pub network: Network,
    /// Minimum token holding, natural units.
    pub min_amount: f64,
    /// Minimum native balance for fees, in SOL.
    pub min_sol: f64,
    /// Maximum scan pages fetched in the paginated tier.
    pub iteration_budget: u32,
    pub page_size: u32,
    /// Maximum native-balance probes in flight at once.
    pub concurrency: usize,
    /// Externally supplied last-resort addresses, checked in order.
    pub seed_addresses: Vec<String>,
    /// Wall-clock bound for the paginated tier.
    pub deadline: Option<Duration>,
}

impl WhaleQuery {
    pub fn new(mint: impl Into<String>, network: Network) -> Self {
        Self {
            mint: mint.into(),
            network,
            min_amount: DEFAULT_MIN_AMOUNT,
            min_sol: DEFAULT_MIN_SOL,
            iteration_budget: DEFAULT_ITERATION_BUDGET,
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_PROBE_CONCURRENCY,
            seed_addresses: Vec::new(),
            deadline: None,
        }
    }

    pub fn with_min_amount(mut self, min_amount: f64) -> Self {
        self.min_amount = min_amount;
        self
    }

    pub fn with_min_sol(mut self, min_sol: f64) -> Self {
        self.min_sol = min_sol;
        self
    }

    pub fn with_iteration_budget(mut self, pages: u32) -> Self {
        self.iteration_budget = pages;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_seeds(mut self, seeds: Vec<String>) -> Self {
        self.seed_addresses = seeds;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Native threshold in lamports (rounded down).
    pub fn min_lamports(&self) -> u64 {
        (self.min_sol * LAMPORTS_PER_SOL as f64) as u64
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.mint.trim().is_empty() {
            return Err(EngineError::InvalidInput("mint must not be empty".into()));
        }
        if !(self.min_amount >= 0.0) {
            return Err(EngineError::InvalidInput(format!("min_amount must be >= 0, got {}", self.min_amount)));
        }
        if !(self.min_sol >= 0.0) {
            return Err(EngineError::InvalidInput(format!("min_sol must be >= 0, got {}", self.min_sol)));
        }
        if self.iteration_budget == 0 {
            return Err(EngineError::InvalidInput("iteration_budget must be >= 1".into()));
        }
        if self.page_size == 0 {
            return Err(EngineError::InvalidInput("page_size must be >= 1".into()));
        }
        if self.concurrency == 0 {
            return Err(EngineError::InvalidInput("concurrency must be >= 1".into()));
        }
        Ok(())
    }
}

// ── Resolution outcome ─────────────────────────────────────────────────────

/// Which resolver strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Direct,
    Scan,
    /// Largest holder seen; its amount may sit below `min_amount`.
    BestEffort,
    /// Caller-supplied seed; token amount was not measured.
    Seed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionResult {
    Found { address: String, amount: f64, tier: Tier },
    NotFound,
}

impl ResolutionResult {
    pub fn address(&self) -> Option<&str> {
        match self {
            ResolutionResult::Found { address, .. } => Some(address),
            ResolutionResult::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, ResolutionResult::Found { .. })
    }
}
