//! Blockchain routes: combined account query, contract inspection,
//! operation recording, deployment estimation, network and receipt views.

use alloy::primitives::TxHash;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::blockchain::address::parse_address;
use crate::blockchain::{query, units};
use crate::http::envelope::{ApiError, ApiSuccess};
use crate::http::server::AppState;
use crate::http::users::validated;
use crate::http::wallet::required;
use crate::storage::models::ChainOperation;

/// Intrinsic gas for any transaction, before calldata costs.
const TX_BASE_GAS: u64 = 21_000;
/// Gas per non-zero calldata byte (EIP-2028 worst case, used flat here).
const GAS_PER_BYTE: u64 = 16;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordOperationRequest {
    pub wallet_address: Option<String>,
    pub operation_type: Option<String>,
    pub tx_hash: Option<String>,
    pub contract_address: Option<String>,
    pub gas_used: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeployContractRequest {
    pub wallet_address: Option<String>,
    pub contract_bytecode: Option<String>,
    #[allow(dead_code)]
    pub constructor_args: Option<Value>,
}

/// `GET /api/blockchain/query/{address}` — the combined retrying workflow.
pub async fn query_address(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let normalized = validated(&address)?;
    let parsed = parse_address(&normalized)
        .ok_or_else(|| ApiError::Validation(format!("'{address}' is not a valid wallet address")))?;

    let result = query::fetch_account(&state.chain, parsed)
        .await
        .map_err(ApiError::ChainQuery)?;

    let data = json!({
        "address": normalized,
        "balance": units::format_ether(result.value.balance_wei),
        "balanceWei": result.value.balance_wei.to_string(),
        "transactionCount": result.value.tx_count,
        "network": state.chain.network_name(),
    });

    Ok(ApiSuccess::new(data).with_attempt(result.attempt, state.chain.network_name()))
}

/// `GET /api/blockchain/contract/{address}`
///
/// The empty-code sentinel means the address is a plain account; that is a
/// 400, never zeroed contract fields.
pub async fn contract_info(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let normalized = validated(&address)?;
    let parsed = parse_address(&normalized)
        .ok_or_else(|| ApiError::Validation(format!("'{address}' is not a valid wallet address")))?;

    let result = query::fetch_contract(&state.chain, parsed)
        .await
        .map_err(ApiError::ChainQuery)?;

    if result.value.code.is_empty() {
        return Err(ApiError::NotAContract(normalized));
    }

    let data = json!({
        "address": normalized,
        "isContract": true,
        "balance": units::format_ether(result.value.balance_wei),
        "balanceWei": result.value.balance_wei.to_string(),
        "bytecodeLength": result.value.bytecode_length(),
        "network": state.chain.network_name(),
    });

    Ok(ApiSuccess::new(data).with_attempt(result.attempt, state.chain.network_name()))
}

/// `POST /api/blockchain/operation`
pub async fn record_operation(
    State(state): State<AppState>,
    Json(body): Json<RecordOperationRequest>,
) -> Result<ApiSuccess<ChainOperation>, ApiError> {
    let wallet_address = required(body.wallet_address.as_deref(), "walletAddress")?;
    let operation_type = required(body.operation_type.as_deref(), "operationType")?;
    let address = validated(wallet_address)?;

    state
        .db
        .get_user(&address)
        .await
        .map_err(|e| ApiError::from_user_lookup(e, &address))?;

    let operation = state
        .db
        .insert_operation(
            &address,
            operation_type,
            body.tx_hash.as_deref(),
            body.contract_address.as_deref(),
            body.gas_used.as_deref(),
        )
        .await?;

    tracing::info!(address = %address, operation_type, "Chain operation recorded");
    Ok(ApiSuccess::new(operation))
}

/// `GET /api/blockchain/operations/{walletAddress}`
pub async fn list_operations(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<ApiSuccess<Vec<ChainOperation>>, ApiError> {
    let address = validated(&wallet_address)?;

    let operations = state.db.list_operations(&address).await?;
    let count = operations.len();

    Ok(ApiSuccess::new(operations).with_count(count))
}

/// `POST /api/blockchain/deploy-contract` — deployment gas estimation.
///
/// Estimate is intrinsic cost plus a flat per-byte calldata cost against
/// the provider's current gas price. No transaction is sent.
pub async fn estimate_deployment(
    State(state): State<AppState>,
    Json(body): Json<DeployContractRequest>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let wallet_address = required(body.wallet_address.as_deref(), "walletAddress")?;
    let bytecode = required(body.contract_bytecode.as_deref(), "contractBytecode")?;
    validated(wallet_address)?;

    let byte_len = bytecode_byte_len(bytecode).ok_or_else(|| {
        ApiError::Validation("contractBytecode must be 0x-prefixed hex".to_string())
    })?;

    let gas_price = state.chain.get_gas_price().await.map_err(ApiError::Chain)?;
    let gas_estimate = TX_BASE_GAS + GAS_PER_BYTE * byte_len as u64;

    let data = json!({
        "gasEstimate": gas_estimate.to_string(),
        "gasPrice": gas_price.to_string(),
        "network": state.chain.network_name(),
    });

    Ok(ApiSuccess::new(data))
}

/// `GET /api/blockchain/network`
pub async fn network_info(
    State(state): State<AppState>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let (chain_id, block_number, gas_price) = tokio::try_join!(
        state.chain.get_chain_id(),
        state.chain.get_block_number(),
        state.chain.get_gas_price(),
    )
    .map_err(ApiError::Chain)?;

    let data = json!({
        "chainId": chain_id.0,
        "blockNumber": block_number,
        "gasPrice": gas_price.to_string(),
        "network": state.chain.network_name(),
    });

    Ok(ApiSuccess::new(data))
}

/// `GET /api/blockchain/transaction/{txHash}`
///
/// 404 while the transaction is unmined or unknown.
pub async fn transaction_status(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let hash: TxHash = parse_tx_hash(&tx_hash)?;

    let receipt = state
        .chain
        .get_transaction_receipt(hash)
        .await
        .map_err(ApiError::Chain)?
        .ok_or_else(|| ApiError::TxNotFound(tx_hash.clone()))?;

    let data = json!({
        "txHash": tx_hash.to_lowercase(),
        "status": if receipt.status() { "success" } else { "failed" },
        "blockNumber": receipt.block_number,
        "gasUsed": receipt.gas_used.to_string(),
        "from": receipt.from.to_string(),
        "to": receipt.to.map(|a| a.to_string()),
    });

    Ok(ApiSuccess::new(data))
}

fn parse_tx_hash(value: &str) -> Result<TxHash, ApiError> {
    let well_formed = value
        .strip_prefix("0x")
        .map(|hex| hex.len() == 64 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
        .unwrap_or(false);
    if !well_formed {
        return Err(ApiError::Validation(format!(
            "'{value}' is not a valid transaction hash"
        )));
    }
    value
        .parse()
        .map_err(|_| ApiError::Validation(format!("'{value}' is not a valid transaction hash")))
}

/// Byte length of a 0x-prefixed hex bytecode string, `None` if malformed.
fn bytecode_byte_len(bytecode: &str) -> Option<usize> {
    let hex = bytecode.strip_prefix("0x")?;
    if hex.is_empty() || hex.len() % 2 != 0 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(hex.len() / 2)
}
