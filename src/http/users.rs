//! User profile routes.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::blockchain::address::{is_valid_address, normalize_address};
use crate::http::envelope::{ApiError, ApiSuccess};
use crate::http::server::AppState;
use crate::storage::models::{Transaction, User};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    pub wallet_address: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// `GET /api/users/{walletAddress}`
pub async fn get_user(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<ApiSuccess<User>, ApiError> {
    let address = validated(&wallet_address)?;

    let user = state
        .db
        .get_user(&address)
        .await
        .map_err(|e| ApiError::from_user_lookup(e, &address))?;

    Ok(ApiSuccess::new(user))
}

/// `POST /api/users` — upsert keyed by the lowercase wallet address.
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<ApiSuccess<User>, ApiError> {
    let wallet_address = body
        .wallet_address
        .as_deref()
        .ok_or_else(|| ApiError::Validation("walletAddress is required".to_string()))?;
    let address = validated(wallet_address)?;

    let user = state
        .db
        .upsert_user(&address, body.username.as_deref(), body.email.as_deref())
        .await?;

    tracing::info!(address = %address, "User upserted");
    Ok(ApiSuccess::new(user))
}

/// `GET /api/users/{walletAddress}/transactions`
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<ApiSuccess<Vec<Transaction>>, ApiError> {
    let address = validated(&wallet_address)?;

    let transactions = state.db.list_transactions(&address).await?;
    let count = transactions.len();

    Ok(ApiSuccess::new(transactions).with_count(count))
}

/// Gate used by every address-taking handler: reject before any I/O.
pub(crate) fn validated(wallet_address: &str) -> Result<String, ApiError> {
    if !is_valid_address(wallet_address) {
        return Err(ApiError::Validation(format!(
            "'{wallet_address}' is not a valid wallet address"
        )));
    }
    Ok(normalize_address(wallet_address))
}
