//! Wallet routes: balance lookup, signature verification, transaction
//! recording.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::blockchain::address::{normalize_address, parse_address, recover_signer};
use crate::blockchain::{query, units};
use crate::http::envelope::{ApiError, ApiSuccess};
use crate::http::server::AppState;
use crate::http::users::validated;
use crate::storage::models::Transaction;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyRequest {
    pub message: Option<String>,
    pub signature: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordTransactionRequest {
    pub wallet_address: Option<String>,
    pub tx_hash: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub amount: Option<String>,
}

/// `GET /api/wallet/{address}/balance`
pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let normalized = validated(&address)?;
    let parsed = parse_address(&normalized)
        .ok_or_else(|| ApiError::Validation(format!("'{address}' is not a valid wallet address")))?;

    let result = query::fetch_balance(&state.chain, parsed)
        .await
        .map_err(ApiError::Chain)?;

    let data = json!({
        "address": normalized,
        "balance": units::format_ether(result.value),
        "balanceWei": result.value.to_string(),
        "network": state.chain.network_name(),
    });

    Ok(ApiSuccess::new(data).with_attempt(result.attempt, state.chain.network_name()))
}

/// `POST /api/wallet/verify`
///
/// An unparseable signature is a verification outcome (`isValid: false`),
/// not a server fault.
pub async fn verify_signature(
    Json(body): Json<VerifyRequest>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let message = required(body.message.as_deref(), "message")?;
    let signature = required(body.signature.as_deref(), "signature")?;
    let address = required(body.address.as_deref(), "address")?;
    let normalized = validated(address)?;

    let data = match recover_signer(message, signature) {
        Ok(recovered) => {
            let recovered_lower = normalize_address(&recovered.to_string());
            json!({
                "isValid": recovered_lower == normalized,
                "recoveredAddress": recovered.to_string(),
                "providedAddress": address,
            })
        }
        Err(e) => {
            tracing::debug!(address = %normalized, error = %e, "Signature did not verify");
            json!({
                "isValid": false,
                "recoveredAddress": Value::Null,
                "providedAddress": address,
            })
        }
    };

    Ok(ApiSuccess::new(data))
}

/// `POST /api/wallet/transaction`
///
/// Recording against a missing user is a 404 and writes nothing.
pub async fn record_transaction(
    State(state): State<AppState>,
    Json(body): Json<RecordTransactionRequest>,
) -> Result<ApiSuccess<Transaction>, ApiError> {
    let wallet_address = required(body.wallet_address.as_deref(), "walletAddress")?;
    let tx_hash = required(body.tx_hash.as_deref(), "txHash")?;
    let tx_type = required(body.tx_type.as_deref(), "type")?;
    let address = validated(wallet_address)?;

    state
        .db
        .get_user(&address)
        .await
        .map_err(|e| ApiError::from_user_lookup(e, &address))?;

    let transaction = state
        .db
        .insert_transaction(&address, tx_hash, tx_type, body.amount.as_deref())
        .await?;

    tracing::info!(address = %address, tx_hash, "Transaction recorded");
    Ok(ApiSuccess::new(transaction))
}

pub(crate) fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ApiError> {
    value.ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}
