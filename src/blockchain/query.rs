//! Retrying blockchain query workflow.
//!
//! # Responsibilities
//! - Fetch balance / transaction count / contract code with bounded retry
//! - Report which attempt succeeded so responses can carry it as metadata
//!
//! # Design Decisions
//! - Backoff is linear on purpose: attempt `n` sleeps `n * base_delay_ms`
//! - Ceiling of `max_retries` attempts, then the last error is terminal
//! - No jitter, no circuit breaker, no caller-facing cancellation
//!
//! Balance and transaction count are independent reads; the combined query
//! fetches them concurrently inside a single attempt.

use std::future::Future;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{ChainError, ChainResult};
use crate::observability::metrics;

/// A successful query result together with the attempt that produced it.
#[derive(Debug, Clone)]
pub struct Attempted<T> {
    pub value: T,
    pub attempt: u32,
}

/// Balance plus transaction count, the combined account view.
#[derive(Debug, Clone)]
pub struct AccountView {
    pub balance_wei: U256,
    pub tx_count: u64,
}

/// On-chain state of a (possible) contract address.
///
/// `code` is empty for plain accounts; the route layer turns that into a
/// not-a-contract rejection rather than zeroed fields.
#[derive(Debug, Clone)]
pub struct ContractView {
    pub code: Bytes,
    pub balance_wei: U256,
}

impl ContractView {
    /// Length of the hex-encoded bytecode string, `0x` prefix included.
    pub fn bytecode_length(&self) -> usize {
        2 + self.code.len() * 2
    }
}

/// Fetch the balance of an address, retrying per the client's config.
pub async fn fetch_balance(
    client: &ChainClient,
    address: Address,
) -> ChainResult<Attempted<U256>> {
    with_retries(client, "balance", || client.get_balance(address)).await
}

/// Fetch balance and transaction count together, retrying per the client's
/// config. Both reads happen concurrently within one attempt; either
/// failing fails the attempt.
pub async fn fetch_account(
    client: &ChainClient,
    address: Address,
) -> ChainResult<Attempted<AccountView>> {
    with_retries(client, "account", || async {
        let (balance_wei, tx_count) = tokio::try_join!(
            client.get_balance(address),
            client.get_transaction_count(address),
        )?;
        Ok(AccountView {
            balance_wei,
            tx_count,
        })
    })
    .await
}

/// Fetch deployed code and balance for an address, retrying per the
/// client's config. Empty code is a successful result, not a failure.
pub async fn fetch_contract(
    client: &ChainClient,
    address: Address,
) -> ChainResult<Attempted<ContractView>> {
    with_retries(client, "contract", || async {
        let (code, balance_wei) = tokio::try_join!(
            client.get_code(address),
            client.get_balance(address),
        )?;
        Ok(ContractView { code, balance_wei })
    })
    .await
}

async fn with_retries<T, F, Fut>(
    client: &ChainClient,
    what: &'static str,
    mut op: F,
) -> ChainResult<Attempted<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChainResult<T>>,
{
    let config = client.config();
    retry_loop(what, config.max_retries, config.retry_base_delay_ms, &mut op).await
}

/// The retry loop itself, parameterized for testability.
///
/// Attempts are numbered from 1. After a failed attempt `n` (with more
/// attempts remaining) the loop sleeps `n * base_delay_ms`.
async fn retry_loop<T, F, Fut>(
    what: &'static str,
    max_attempts: u32,
    base_delay_ms: u64,
    op: &mut F,
) -> ChainResult<Attempted<T>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ChainResult<T>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => {
                metrics::record_chain_query(what, attempt, true);
                if attempt > 1 {
                    tracing::info!(query = what, attempt, "Chain query succeeded after retry");
                }
                return Ok(Attempted { value, attempt });
            }
            Err(e) if attempt >= max_attempts => {
                metrics::record_chain_query(what, attempt, false);
                tracing::error!(query = what, attempt, error = %e, "Chain query giving up");
                return Err(ChainError::RetriesExhausted {
                    attempts: attempt,
                    last: e.to_string(),
                });
            }
            Err(e) => {
                let delay = Duration::from_millis(attempt as u64 * base_delay_ms);
                tracing::warn!(
                    query = what,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Chain query failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
