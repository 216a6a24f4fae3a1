//! Krnl action routes.
//!
//! The execute flow writes a `processing` row, awaits the executor, then
//! awaits the terminal status update. Both updates are awaited on purpose:
//! an interaction row must always end `completed` or `failed`, never hang
//! in `processing`.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::http::envelope::{ApiError, ApiSuccess};
use crate::http::server::AppState;
use crate::http::users::validated;
use crate::http::wallet::required;
use crate::krnl::{self, KrnlError};
use crate::observability::metrics;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecuteActionRequest {
    pub wallet_address: Option<String>,
    pub action_type: Option<String>,
    pub payload: Option<Value>,
}

/// `POST /api/krnl/execute`
pub async fn execute_action(
    State(state): State<AppState>,
    Json(body): Json<ExecuteActionRequest>,
) -> Result<ApiSuccess<Value>, ApiError> {
    let wallet_address = required(body.wallet_address.as_deref(), "walletAddress")?;
    let action_type = required(body.action_type.as_deref(), "actionType")?;
    let address = validated(wallet_address)?;

    // Unknown tags fail validation before any row is written.
    if !krnl::is_known_action(action_type) {
        return Err(KrnlError::UnknownAction(action_type.to_string()).into());
    }

    state
        .db
        .get_user(&address)
        .await
        .map_err(|e| ApiError::from_user_lookup(e, &address))?;

    let payload = body.payload.unwrap_or(Value::Null);
    let payload_text = payload.to_string();

    let interaction_id = state
        .db
        .insert_interaction(&address, action_type, Some(&payload_text))
        .await?;

    match state.krnl.execute(action_type, &payload).await {
        Ok(response) => {
            state
                .db
                .complete_interaction(interaction_id, &response.to_string())
                .await?;
            metrics::record_krnl_action(action_type, true);
            tracing::info!(address = %address, action_type, interaction_id, "Krnl action completed");

            let data = json!({
                "interactionId": interaction_id,
                "actionType": action_type,
                "status": "completed",
                "response": response,
            });
            Ok(ApiSuccess::new(data))
        }
        Err(e) => {
            // Terminal failure state, recorded before the error surfaces.
            state
                .db
                .fail_interaction(interaction_id, &e.to_string())
                .await?;
            metrics::record_krnl_action(action_type, false);
            Err(e.into())
        }
    }
}

/// `GET /api/krnl/interactions/{walletAddress}`
///
/// `payload` and `response` are stored as JSON text and decoded here so
/// clients get structured values, not doubly-encoded strings.
pub async fn list_interactions(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<ApiSuccess<Vec<Value>>, ApiError> {
    let address = validated(&wallet_address)?;

    let interactions = state.db.list_interactions(&address).await?;
    let count = interactions.len();

    let items = interactions
        .into_iter()
        .map(|row| {
            json!({
                "id": row.id,
                "walletAddress": row.wallet_address,
                "actionType": row.action_type,
                "payload": decode_json(row.payload.as_deref()),
                "response": decode_json(row.response.as_deref()),
                "status": row.status,
                "createdAt": row.created_at.to_rfc3339(),
            })
        })
        .collect();

    Ok(ApiSuccess::new(items).with_count(count))
}

fn decode_json(text: Option<&str>) -> Value {
    match text {
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
        None => Value::Null,
    }
}
