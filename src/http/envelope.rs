//! Response envelopes and the HTTP-facing error type.
//!
//! One envelope generation, applied uniformly: success bodies are
//! `{"data": .., "metadata": {..}}`, error bodies are
//! `{"error", "code", "details", "timestamp"}`. The only flat route is
//! `/api/health`, which is an operational probe.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::blockchain::types::ChainError;
use crate::krnl::KrnlError;
use crate::observability::metrics;
use crate::storage::db::StorageError;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub data: T,
    pub metadata: Metadata,
}

/// Envelope metadata. Always carries a timestamp; chain-touching routes
/// add the attempt count and provider name, lists add a count.
#[derive(Debug, Serialize)]
pub struct Metadata {
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Metadata {
    fn now() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            attempt: None,
            provider: None,
            count: None,
        }
    }
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            metadata: Metadata::now(),
        }
    }

    /// Attach retry metadata from the chain query workflow.
    pub fn with_attempt(mut self, attempt: u32, provider: &str) -> Self {
        self.metadata.attempt = Some(attempt);
        self.metadata.provider = Some(provider.to_string());
        self
    }

    /// Attach the element count of a list response.
    pub fn with_count(mut self, count: usize) -> Self {
        self.metadata.count = Some(count);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Everything a handler can fail with, mapped to status + machine code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("User not found for wallet address {0}")]
    UserNotFound(String),

    #[error("Transaction {0} not found")]
    TxNotFound(String),

    #[error("Address {0} is not a contract")]
    NotAContract(String),

    #[error("Blockchain query failed: {0}")]
    ChainQuery(ChainError),

    #[error("Blockchain error: {0}")]
    Chain(#[from] ChainError),

    #[error("Krnl action failed: {0}")]
    Krnl(KrnlError),

    #[error("Storage unavailable")]
    Storage(#[source] StorageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::NotAContract(_) => StatusCode::BAD_REQUEST,
            ApiError::UserNotFound(_) | ApiError::TxNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ChainQuery(_) | ApiError::Chain(_) | ApiError::Krnl(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::UserNotFound(_) => "USER_NOT_FOUND",
            ApiError::TxNotFound(_) => "TX_NOT_FOUND",
            ApiError::NotAContract(_) => "NOT_A_CONTRACT",
            ApiError::ChainQuery(_) => "BLOCKCHAIN_QUERY_ERROR",
            ApiError::Chain(_) => "BLOCKCHAIN_ERROR",
            ApiError::Krnl(_) => "KRNL_ERROR",
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Map a user lookup failure: missing row is the caller's 404, anything
    /// else is a storage fault.
    pub fn from_user_lookup(err: StorageError, wallet_address: &str) -> Self {
        match err {
            StorageError::NotFound(_) => ApiError::UserNotFound(wallet_address.to_string()),
            other => ApiError::Storage(other),
        }
    }

    fn details(&self) -> serde_json::Value {
        let chain = match self {
            ApiError::ChainQuery(e) | ApiError::Chain(e) => Some(e.to_string()),
            ApiError::Krnl(e) => Some(e.to_string()),
            ApiError::Storage(e) => Some(e.to_string()),
            _ => None,
        };
        match chain {
            Some(cause) => json!({ "cause": cause }),
            None => json!({}),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

impl From<KrnlError> for ApiError {
    fn from(err: KrnlError) -> Self {
        match err {
            KrnlError::UnknownAction(_) => ApiError::Validation(err.to_string()),
            other => ApiError::Krnl(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Storage(_) = &self {
            metrics::record_storage_error();
        }
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }

        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
            "details": self.details(),
            "timestamp": Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}
