//! Mocked Krnl action executor.
//!
//! Stands in for the real Krnl API: a fixed switch over four action tags
//! returning synthetic identifiers. The configured API key is never sent
//! anywhere (the remote call is mocked) and never printed, but it gates
//! execution the way the real integration will: no key, no actions.

use chrono::Utc;
use rand::Rng;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::KrnlConfig;

/// The action tags the executor understands.
pub const KNOWN_ACTIONS: &[&str] = &[
    "deploy_contract",
    "execute_transaction",
    "query_data",
    "estimate_gas",
];

/// Errors from the Krnl executor.
#[derive(Debug, Error)]
pub enum KrnlError {
    /// The action tag is not one of [`KNOWN_ACTIONS`].
    #[error("unknown Krnl action type '{0}'")]
    UnknownAction(String),

    /// No API key is configured; the executor refuses to run actions.
    #[error("Krnl API key is not configured")]
    NotConfigured,
}

/// Whether an action tag is one the executor can handle.
pub fn is_known_action(action_type: &str) -> bool {
    KNOWN_ACTIONS.contains(&action_type)
}

/// Mock executor handle, constructed once at startup and injected into the
/// request-handling state.
#[derive(Clone)]
pub struct KrnlExecutor {
    api_key: String,
}

impl KrnlExecutor {
    pub fn new(config: &KrnlConfig) -> Self {
        if config.api_key.is_empty() {
            tracing::warn!("No Krnl API key configured; actions will be rejected");
        }
        Self {
            api_key: config.api_key.clone(),
        }
    }

    /// Execute an action, returning the synthetic response payload.
    ///
    /// Async to keep the call shape of the eventual real integration; the
    /// mock itself completes immediately.
    pub async fn execute(&self, action_type: &str, payload: &Value) -> Result<Value, KrnlError> {
        // The key would authenticate the real call; refuse without one so
        // the failure surfaces here instead of against the live service.
        if self.api_key.is_empty() {
            return Err(KrnlError::NotConfigured);
        }

        let response = match action_type {
            "deploy_contract" => json!({
                "contractAddress": format!("0x{}", random_hex(40)),
                "txHash": format!("0x{}", random_hex(64)),
                "gasUsed": "21000",
            }),
            "execute_transaction" => json!({
                "txHash": format!("0x{}", random_hex(64)),
                "status": "success",
                "gasUsed": "45000",
            }),
            "query_data" => json!({
                "data": payload,
                "timestamp": Utc::now().to_rfc3339(),
                "source": "krnl",
            }),
            "estimate_gas" => json!({
                "gasEstimate": rand::thread_rng().gen_range(21_000u64..200_000).to_string(),
                "gasPrice": rand::thread_rng().gen_range(1_000_000_000u64..50_000_000_000).to_string(),
                "source": "krnl",
            }),
            other => return Err(KrnlError::UnknownAction(other.to_string())),
        };

        tracing::debug!(action_type, "Krnl action executed (mock)");
        Ok(response)
    }
}

impl std::fmt::Debug for KrnlExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KrnlExecutor")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}
