//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint
//! - Query chain state (balances, nonces, code, receipts)
//! - Handle timeouts and network errors gracefully
//!
//! The client performs no retries of its own; the retrying query workflow
//! sits above it in `query.rs`.

use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{ChainConfig, ChainError, ChainId, ChainResult};

/// Blockchain RPC client wrapper.
#[derive(Clone)]
pub struct ChainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    config: ChainConfig,
    timeout_duration: Duration,
}

impl ChainClient {
    /// Create a new chain client against the configured RPC endpoint.
    pub async fn new(config: ChainConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        let rpc_url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let provider =
            Arc::new(ProviderBuilder::new().connect_http(rpc_url)) as Arc<dyn Provider + Send + Sync>;

        let client = Self {
            provider,
            config: config.clone(),
            timeout_duration,
        };

        // Verify chain ID matches configuration
        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = config.chain_id,
                    network = %config.network_name,
                    "Chain client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Chain client initialized but chain verification failed"
                );
                // Don't fail initialization - allow graceful degradation
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> ChainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(ChainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> ChainResult<ChainId> {
        let fut = self.provider.get_chain_id();
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(ChainId(result)),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "RPC error fetching chain id");
                Err(ChainError::Rpc(e.to_string()))
            }
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> ChainResult<u64> {
        let fut = self.provider.get_block_number();
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "RPC error fetching block number");
                Err(ChainError::Rpc(e.to_string()))
            }
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    /// Get the balance of an address in wei.
    pub async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        let fut = self.provider.get_balance(address);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(address = %address, error = %e, "RPC error fetching balance");
                Err(ChainError::Rpc(e.to_string()))
            }
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    /// Get the transaction count (nonce) for an address.
    pub async fn get_transaction_count(&self, address: Address) -> ChainResult<u64> {
        let fut = self.provider.get_transaction_count(address);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(address = %address, error = %e, "RPC error fetching nonce");
                Err(ChainError::Rpc(e.to_string()))
            }
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    /// Get the deployed bytecode at an address. Empty bytes means the
    /// address is not a contract.
    pub async fn get_code(&self, address: Address) -> ChainResult<Bytes> {
        let fut = self.provider.get_code_at(address);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(address = %address, error = %e, "RPC error fetching code");
                Err(ChainError::Rpc(e.to_string()))
            }
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> ChainResult<u128> {
        let fut = self.provider.get_gas_price();
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "RPC error fetching gas price");
                Err(ChainError::Rpc(e.to_string()))
            }
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    /// Get a transaction receipt by hash. `None` until mined.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> ChainResult<Option<TransactionReceipt>> {
        let fut = self.provider.get_transaction_receipt(tx_hash);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "RPC error fetching receipt");
                Err(ChainError::Rpc(e.to_string()))
            }
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Human-readable network name for response payloads.
    pub fn network_name(&self) -> &str {
        &self.config.network_name
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ChainConfig {
        ChainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            network_name: "Base".to_string(),
            chain_id: 31337,
            rpc_timeout_secs: 5,
            max_retries: 3,
            retry_base_delay_ms: 1000,
        }
    }

    #[tokio::test]
    async fn test_client_creation() {
        // Client creation should succeed even if the RPC is unreachable
        let result = ChainClient::new(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_rpc_url_rejected() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();

        let result = ChainClient::new(config).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid RPC URL"));
    }
}
