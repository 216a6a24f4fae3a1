//! Wallet address and message-signature validation.
//!
//! Pure functions, no I/O. Every route runs these before touching the
//! database or the provider, so a malformed address is always a 400, never
//! a 500 from deeper in the stack.

use alloy::primitives::{Address, Signature};

use crate::blockchain::types::{ChainError, ChainResult};

/// Check whether a string is a wallet address: `0x` followed by exactly 40
/// hex digits, any casing.
///
/// Checksum casing is not enforced on input — callers submit addresses in
/// whatever casing their wallet produced, and storage normalizes to
/// lowercase anyway. Canonical EIP-55 casing appears only on output (via
/// `Address`'s Display).
pub fn is_valid_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Parse a wallet address, returning `None` when the format is invalid.
pub fn parse_address(value: &str) -> Option<Address> {
    if !is_valid_address(value) {
        return None;
    }
    value.parse().ok()
}

/// Normalize an address to the lowercase form used as the storage key.
pub fn normalize_address(value: &str) -> String {
    value.to_ascii_lowercase()
}

/// Recover the signer of an EIP-191 personal message.
///
/// `signature` is the 65-byte hex signature produced by
/// `personal_sign` / `signMessage`.
pub fn recover_signer(message: &str, signature: &str) -> ChainResult<Address> {
    let signature: Signature = signature
        .parse()
        .map_err(|e| ChainError::Signature(format!("unparseable signature: {}", e)))?;

    signature
        .recover_address_from_msg(message)
        .map_err(|e| ChainError::Signature(format!("recovery failed: {}", e)))
}
