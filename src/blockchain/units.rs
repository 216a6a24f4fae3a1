//! Native-currency unit formatting.
//!
//! Balances travel in two forms: the raw wei amount as a decimal string
//! (no precision loss) and a human-scaled ether string with fixed
//! 18-decimal scaling.

use alloy::primitives::U256;

const ETHER_DECIMALS: usize = 18;

/// Format a wei amount as an ether decimal string.
///
/// Always carries at least one fractional digit (`"1.0"`, `"0.05"`);
/// trailing zeros beyond the first fractional digit are trimmed.
pub fn format_ether(wei: U256) -> String {
    let divisor = U256::from(10u64).pow(U256::from(ETHER_DECIMALS as u64));
    let whole = wei / divisor;
    let frac = wei % divisor;

    let frac_digits = frac.to_string();
    let mut padded = String::with_capacity(ETHER_DECIMALS);
    for _ in frac_digits.len()..ETHER_DECIMALS {
        padded.push('0');
    }
    padded.push_str(&frac_digits);

    let trimmed = padded.trim_end_matches('0');
    let frac_out = if trimmed.is_empty() { "0" } else { trimmed };

    format!("{whole}.{frac_out}")
}
