// Solprobe Engine: Helpers
// resolve_token, validate_address, raw_to_natural, lamports_to_amount, amount_to_raw,
// truncate_utf8, redact_url

use crate::atoms::constants::KNOWN_TOKENS;
use crate::atoms::error::{EngineError, EngineResult};

// ── Addresses ─────────────────────────────────────────────────────────

/// Check that a string is a base58 Solana public key (32 bytes decoded).
pub fn validate_address(addr: &str) -> EngineResult<&str> {
    let trimmed = addr.trim();
    let decoded = bs58::decode(trimmed)
        .into_vec()
        .map_err(|e| EngineError::InvalidInput(format!("'{}' is not base58: {}", trimmed, e)))?;
    if decoded.len() != 32 {
        return Err(EngineError::InvalidInput(format!(
            "'{}' decodes to {} bytes, expected 32",
            trimmed,
            decoded.len()
        )));
    }
    Ok(trimmed)
}

/// Resolve a token symbol or mint address to (mint_address, decimals).
/// Returns decimals=None for unknown mints; callers query precision on-chain.
pub fn resolve_token(sym_or_addr: &str) -> EngineResult<(String, Option<u8>)> {
    let upper = sym_or_addr.trim().to_uppercase();

    for (sym, addr, dec) in KNOWN_TOKENS {
        if upper == *sym {
            return Ok((addr.to_string(), Some(*dec)));
        }
    }

    match validate_address(sym_or_addr) {
        Ok(mint) => Ok((mint.to_string(), None)),
        Err(_) => Err(EngineError::InvalidInput(format!(
            "Unknown Solana token: '{}'. Use a mint address or known symbol: {}",
            sym_or_addr,
            KNOWN_TOKENS.iter().map(|(s, _, _)| *s).collect::<Vec<_>>().join(", ")
        ))),
    }
}

// ── Amounts ───────────────────────────────────────────────────────────

/// Convert a raw base-unit amount to natural units.
pub fn raw_to_natural(raw: u64, decimals: u8) -> f64 {
    raw as f64 / 10f64.powi(decimals as i32)
}

/// Format lamports to SOL (9 decimals) or an SPL token amount, exactly.
pub fn lamports_to_amount(lamports: u64, decimals: u8) -> String {
    if decimals == 0 {
        return lamports.to_string();
    }
    // 10^20 and beyond overflow u64, so every raw value is a pure fraction.
    let Some(divisor) = 10u64.checked_pow(decimals as u32) else {
        let digits = lamports.to_string();
        let frac = format!("{:0>width$}", digits, width = decimals as usize);
        return format!("0.{}", frac.trim_end_matches('0')).trim_end_matches('.').to_string();
    };
    let whole = lamports / divisor;
    let frac = lamports % divisor;
    if frac == 0 {
        whole.to_string()
    } else {
        let frac_str = format!("{:0>width$}", frac, width = decimals as usize);
        let trimmed = frac_str.trim_end_matches('0');
        format!("{}.{}", whole, trimmed)
    }
}

/// Parse a human amount ("1.25") into base units at `decimals` precision.
pub fn amount_to_raw(amount_str: &str, decimals: u8) -> EngineResult<u64> {
    let amount_str = amount_str.trim();
    let invalid = |why: &str| EngineError::InvalidInput(format!("invalid amount '{}': {}", amount_str, why));
    let scale = 10u64.checked_pow(decimals as u32).ok_or_else(|| invalid("precision too large"))?;

    let (whole_str, frac_str) = match amount_str.split_once('.') {
        Some((w, f)) => (w, f),
        None => (amount_str, ""),
    };
    if !whole_str.bytes().chain(frac_str.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid("only digits and one '.' are allowed"));
    }
    if frac_str.len() > decimals as usize {
        return Err(invalid(&format!("too many decimal places (max {})", decimals)));
    }
    let whole: u64 = if whole_str.is_empty() && !frac_str.is_empty() {
        0
    } else {
        whole_str.parse().map_err(|_| invalid("not a number"))?
    };
    let frac: u64 = if frac_str.is_empty() {
        0
    } else {
        let digits: u64 = frac_str.parse().map_err(|_| invalid("bad fractional part"))?;
        digits * 10u64.pow((decimals as usize - frac_str.len()) as u32)
    };
    whole
        .checked_mul(scale)
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(|| invalid("overflows u64"))
}

/// Parse a u64 that nodes send either as a JSON number or a decimal string.
pub(crate) fn json_u64(v: &serde_json::Value) -> Option<u64> {
    v.as_u64().or_else(|| v.as_str().and_then(|s| s.parse().ok()))
}

// ── Strings ───────────────────────────────────────────────────────────

/// Truncate to at most `max_bytes` without splitting a UTF-8 sequence.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Replace the value of any `api-key` query parameter so URLs are safe to log.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.query().is_none() {
                return raw.to_string();
            }
            let pairs: Vec<(String, String)> = parsed
                .query_pairs()
                .map(|(k, v)| {
                    let v = if k.eq_ignore_ascii_case("api-key") { "***".to_string() } else { v.into_owned() };
                    (k.into_owned(), v)
                })
                .collect();
            parsed.query_pairs_mut().clear().extend_pairs(pairs);
            parsed.to_string()
        }
        Err(_) => raw.split('?').next().unwrap_or(raw).to_string(),
    }
}
