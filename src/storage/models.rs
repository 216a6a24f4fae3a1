//! Data models for Klunkaz storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user, keyed by the lowercase wallet address.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub wallet_address: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A wallet-reported transaction.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub wallet_address: String,
    pub tx_hash: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: Option<String>,
    pub status: TxStatus,
    pub created_at: DateTime<Utc>,
}

/// Transaction status. Any caller may overwrite it; no state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
}

/// A recorded Krnl interaction. `payload` and `response` hold JSON text.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct KrnlInteraction {
    pub id: i64,
    pub wallet_address: String,
    pub action_type: String,
    pub payload: Option<String>,
    pub response: Option<String>,
    pub status: InteractionStatus,
    pub created_at: DateTime<Utc>,
}

/// Krnl interaction lifecycle. Every interaction reaches `completed` or
/// `failed`; a row must never be left in `processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum InteractionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A recorded on-chain operation (deploys, queries, transfers).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChainOperation {
    pub id: i64,
    pub wallet_address: String,
    pub operation_type: String,
    pub tx_hash: Option<String>,
    pub contract_address: Option<String>,
    pub gas_used: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
