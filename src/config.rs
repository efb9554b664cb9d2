// Solprobe: Settings
//
// Loaded from `<config_dir>/solprobe/config.toml` (or an explicit path), then
// overlaid with environment variables. Every field has a default so an empty
// or missing file is a valid configuration.

use crate::atoms::constants::{DEFAULT_BACKOFF_MS, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::atoms::error::{EngineError, EngineResult};
use crate::engine::http::{HttpTransport, RetryPolicy};
use crate::engine::jupiter::JupiterTier;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ── Jupiter tier ───────────────────────────────────────────────────────────

fn deserialize_tier<'de, D>(deserializer: D) -> Result<JupiterTier, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(JupiterTier::parse_lenient(&raw))
}

// ── Settings ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub helius_api_key: Option<String>,
    /// Replaces the per-network Helius RPC URL (used verbatim).
    pub helius_rpc_url: Option<String>,
    /// Replaces the enhanced REST base for both networks.
    pub helius_api_url: Option<String>,
    #[serde(deserialize_with = "deserialize_tier")]
    pub jupiter_tier: JupiterTier,
    pub jupiter_api_key: Option<String>,
    pub http_timeout_secs: u64,
    pub retry_backoff_ms: Vec<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            helius_api_key: None,
            helius_rpc_url: None,
            helius_api_url: None,
            jupiter_tier: JupiterTier::Lite,
            jupiter_api_key: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            retry_backoff_ms: DEFAULT_BACKOFF_MS.to_vec(),
        }
    }
}

/// `<config_dir>/solprobe/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("solprobe").join("config.toml"))
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> EngineResult<Self> {
        toml::from_str(raw).map_err(|e| EngineError::Config(format!("invalid config: {}", e)))
    }

    /// Read a TOML file. A missing explicit path is an error.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        debug!("[config] Loaded {}", path.display());
        Self::from_toml_str(&raw)
    }

    /// File (explicit or default location) then process environment.
    pub fn load(explicit: Option<&Path>) -> EngineResult<Self> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        let env: HashMap<String, String> = std::env::vars().collect();
        settings.apply_env(&env)?;
        Ok(settings)
    }

    /// Overlay recognised variables from `env`. Empty values are ignored.
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> EngineResult<()> {
        let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        if let Some(v) = get("HELIUS_API_KEY") {
            self.helius_api_key = Some(v.to_string());
        }
        if let Some(v) = get("HELIUS_RPC_URL") {
            self.helius_rpc_url = Some(v.to_string());
        }
        if let Some(v) = get("HELIUS_API_URL") {
            self.helius_api_url = Some(v.to_string());
        }
        if let Some(v) = get("JUPITER_TIER") {
            self.jupiter_tier = JupiterTier::parse_lenient(v);
        }
        if let Some(v) = get("JUPITER_API_KEY") {
            self.jupiter_api_key = Some(v.to_string());
        }
        if let Some(v) = get("SOLPROBE_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = v.parse().map_err(|_| {
                EngineError::Config(format!("SOLPROBE_HTTP_TIMEOUT_SECS must be an integer, got '{}'", v))
            })?;
        }
        Ok(())
    }

    pub fn require_helius_key(&self) -> EngineResult<&str> {
        self.helius_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EngineError::Config("HELIUS_API_KEY is required (env or config file)".into()))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(&self.retry_backoff_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }

    pub fn transport(&self) -> EngineResult<HttpTransport> {
        HttpTransport::new(self.retry_policy(), self.http_timeout())
    }
}
