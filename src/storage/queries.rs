//! Database queries for the Klunkaz API.
//!
//! Wallet addresses are normalized to lowercase before they reach this
//! module; every method trusts its input is already normalized.

use chrono::Utc;

use super::db::{Database, StorageError};
use super::models::{ChainOperation, InteractionStatus, KrnlInteraction, Transaction, User};

impl Database {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Insert or update a user, keyed by wallet address.
    ///
    /// The second write wins wholesale: absent username/email clear the
    /// stored values, matching the replace-on-conflict behavior callers
    /// depend on.
    pub async fn upsert_user(
        &self,
        wallet_address: &str,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, StorageError> {
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO users (wallet_address, username, email, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(wallet_address) DO UPDATE SET \
                username = excluded.username, \
                email = excluded.email, \
                updated_at = excluded.updated_at",
        )
        .bind(wallet_address)
        .bind(username)
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(wallet_address).await
    }

    /// Get a user by wallet address.
    pub async fn get_user(&self, wallet_address: &str) -> Result<User, StorageError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE wallet_address = ?")
            .bind(wallet_address)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("User {wallet_address}")))
    }

    // =========================================================================
    // Transaction queries
    // =========================================================================

    /// Record a transaction for a user. Status starts as `pending`.
    pub async fn insert_transaction(
        &self,
        wallet_address: &str,
        tx_hash: &str,
        tx_type: &str,
        amount: Option<&str>,
    ) -> Result<Transaction, StorageError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO transactions (wallet_address, tx_hash, type, amount, status, created_at) \
             VALUES (?, ?, ?, ?, 'pending', ?)",
        )
        .bind(wallet_address)
        .bind(tx_hash)
        .bind(tx_type)
        .bind(amount)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_transaction(result.last_insert_rowid()).await
    }

    /// Get a transaction by row id.
    pub async fn get_transaction(&self, id: i64) -> Result<Transaction, StorageError> {
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Transaction {id}")))
    }

    /// List a user's transactions, newest first.
    pub async fn list_transactions(
        &self,
        wallet_address: &str,
    ) -> Result<Vec<Transaction>, StorageError> {
        let rows = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE wallet_address = ? \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(wallet_address)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    /// Count transactions for a wallet.
    pub async fn count_transactions(&self, wallet_address: &str) -> Result<i64, StorageError> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM transactions WHERE wallet_address = ?")
                .bind(wallet_address)
                .fetch_one(self.pool())
                .await?;

        Ok(row.0)
    }

    // =========================================================================
    // Krnl interaction queries
    // =========================================================================

    /// Record a new interaction in `processing` state, returning its id.
    pub async fn insert_interaction(
        &self,
        wallet_address: &str,
        action_type: &str,
        payload: Option<&str>,
    ) -> Result<i64, StorageError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO krnl_interactions (wallet_address, action_type, payload, status, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(wallet_address)
        .bind(action_type)
        .bind(payload)
        .bind(InteractionStatus::Processing)
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Mark an interaction completed with its response.
    pub async fn complete_interaction(
        &self,
        id: i64,
        response: &str,
    ) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE krnl_interactions SET response = ?, status = ? WHERE id = ?",
        )
        .bind(response)
        .bind(InteractionStatus::Completed)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Interaction {id}")));
        }
        Ok(())
    }

    /// Mark an interaction failed, recording the error.
    ///
    /// This is the terminal state for every error path; a row must never be
    /// left in `processing`.
    pub async fn fail_interaction(&self, id: i64, error: &str) -> Result<(), StorageError> {
        let response = serde_json::json!({ "error": error }).to_string();

        let result = sqlx::query(
            "UPDATE krnl_interactions SET response = ?, status = ? WHERE id = ?",
        )
        .bind(response)
        .bind(InteractionStatus::Failed)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("Interaction {id}")));
        }
        Ok(())
    }

    /// List a user's interactions, newest first.
    pub async fn list_interactions(
        &self,
        wallet_address: &str,
    ) -> Result<Vec<KrnlInteraction>, StorageError> {
        let rows = sqlx::query_as::<_, KrnlInteraction>(
            "SELECT * FROM krnl_interactions WHERE wallet_address = ? \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(wallet_address)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Chain operation queries
    // =========================================================================

    /// Record an on-chain operation for a user.
    pub async fn insert_operation(
        &self,
        wallet_address: &str,
        operation_type: &str,
        tx_hash: Option<&str>,
        contract_address: Option<&str>,
        gas_used: Option<&str>,
    ) -> Result<ChainOperation, StorageError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO chain_operations \
             (wallet_address, operation_type, tx_hash, contract_address, gas_used, status, created_at) \
             VALUES (?, ?, ?, ?, ?, 'pending', ?)",
        )
        .bind(wallet_address)
        .bind(operation_type)
        .bind(tx_hash)
        .bind(contract_address)
        .bind(gas_used)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_operation(result.last_insert_rowid()).await
    }

    /// Get a chain operation by row id.
    pub async fn get_operation(&self, id: i64) -> Result<ChainOperation, StorageError> {
        sqlx::query_as::<_, ChainOperation>("SELECT * FROM chain_operations WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("Operation {id}")))
    }

    /// List a user's chain operations, newest first.
    pub async fn list_operations(
        &self,
        wallet_address: &str,
    ) -> Result<Vec<ChainOperation>, StorageError> {
        let rows = sqlx::query_as::<_, ChainOperation>(
            "SELECT * FROM chain_operations WHERE wallet_address = ? \
             ORDER BY created_at DESC, id DESC",
        )
        .bind(wallet_address)
        .fetch_all(self.pool())
        .await?;

        Ok(rows)
    }
}
