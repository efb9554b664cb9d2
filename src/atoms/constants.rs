// Solprobe Atoms: Constants
// KNOWN_TOKENS, endpoint bases, unit conversions, resolver defaults.

/// Well-known SPL tokens on Solana mainnet (symbol, mint_address, decimals)
pub const KNOWN_TOKENS: &[(&str, &str, u8)] = &[
    ("SOL",   "So11111111111111111111111111111111111111112",  9),
    ("USDC",  "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v", 6),
    ("USDT",  "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB",  6),
    ("BONK",  "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",  5),
    ("JUP",   "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN",   6),
    ("RAY",   "4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R",  6),
    ("PYTH",  "HZ1JovNiVvGrGNiiYvEozEVgZ58xaU3RKwX8eACQBCt3",  6),
    ("WIF",   "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm",  6),
    ("MSOL",  "mSoLzYCxHdYgdzU16g5QSh3i5K3z3KZK7ytfqcJm7So",   9),
    ("JITOSOL", "J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn", 9),
];

/// Helius JSON-RPC bases (api key appended as `?api-key=`)
pub const HELIUS_RPC_MAINNET: &str = "https://mainnet.helius-rpc.com/";
pub const HELIUS_RPC_DEVNET: &str = "https://devnet.helius-rpc.com/";

/// Helius enhanced REST bases
pub const HELIUS_API_MAINNET: &str = "https://api.helius.xyz";
pub const HELIUS_API_DEVNET: &str = "https://api-devnet.helius.xyz";

/// Jupiter hosts per tier. Family paths (`/swap/v1`, ...) are appended.
pub const JUPITER_LITE_HOST: &str = "https://lite-api.jup.ag";
pub const JUPITER_API_HOST: &str = "https://api.jup.ag";

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Default backoff slots for transient HTTP failures (milliseconds)
pub const DEFAULT_BACKOFF_MS: [u64; 3] = [200, 600, 1200];
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// ── Whale resolver defaults ────────────────────────────────────────────────

pub const DEFAULT_MIN_AMOUNT: f64 = 1000.0;
pub const DEFAULT_MIN_SOL: f64 = 0.1;
/// Safety bound on paginated scan pages
pub const DEFAULT_ITERATION_BUDGET: u32 = 20;
/// DAS getTokenAccounts max per page
pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_PROBE_CONCURRENCY: usize = 8;

// ── Helius request limits ──────────────────────────────────────────────────

pub const MAX_SIGNATURES_PER_QUERY: u32 = 1000;
pub const MAX_ENHANCED_TRANSACTIONS: usize = 100;
/// Simulation logs beyond this are truncated to head + marker + tail
pub const MAX_SIMULATION_LOG_LINES: usize = 50;
