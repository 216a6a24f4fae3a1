//! End-to-end tests against the real server, an in-memory database, and a
//! scripted mock JSON-RPC provider.

use serde_json::{json, Value};

use klunkaz_sdk::{
    CreateUserRequest, ExecuteActionRequest, KlunkazClient, RecordTransactionRequest,
    VerifyRequest,
};

mod common;
use common::{canned, spawn_app, spawn_app_with, start_mock_rpc, RpcReply};

const WALLET: &str = "0x742d35Cc6634C0532925a3b8D0C9e3e0C0e8b4C0";
const WALLET_LOWER: &str = "0x742d35cc6634c0532925a3b8d0c9e3e0c0e8b4c0";

async fn spawn_default() -> common::TestApp {
    let rpc = start_mock_rpc(|method, _| canned(method)).await;
    spawn_app(rpc, 50).await
}

fn assert_rfc3339(value: &Value) {
    let text = value.as_str().expect("timestamp should be a string");
    chrono::DateTime::parse_from_rfc3339(text).expect("timestamp should be RFC-3339");
}

#[tokio::test]
async fn test_health_is_flat() {
    let app = spawn_default().await;

    let body: Value = reqwest::get(format!("{}/api/health", app.base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "OK");
    assert_eq!(body["service"], "Klunkaz API");
    assert_rfc3339(&body["timestamp"]);
    assert!(body.get("data").is_none(), "health stays non-enveloped");
}

#[tokio::test]
async fn test_create_user_normalizes_and_upserts() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    let first = sdk
        .create_user(CreateUserRequest {
            wallet_address: WALLET.to_string(),
            username: Some("testuser".to_string()),
            email: Some("test@example.com".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(first.data["walletAddress"], WALLET_LOWER);
    assert_eq!(first.data["username"], "testuser");

    // Second post with the same address overwrites, one row total.
    let second = sdk
        .create_user(CreateUserRequest {
            wallet_address: WALLET.to_uppercase().replace("0X", "0x"),
            username: Some("renamed".to_string()),
            email: None,
        })
        .await
        .unwrap();

    assert_eq!(second.data["walletAddress"], WALLET_LOWER);
    assert_eq!(second.data["username"], "renamed");
    assert_eq!(second.data["email"], Value::Null);

    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    assert_eq!(row.0, 1);
}

#[tokio::test]
async fn test_invalid_address_is_validation_error_everywhere() {
    let app = spawn_default().await;
    let client = reqwest::Client::new();

    let gets = [
        format!("{}/api/users/0xinvalid", app.base_url),
        format!("{}/api/users/0xinvalid/transactions", app.base_url),
        format!("{}/api/wallet/0xinvalid/balance", app.base_url),
        format!("{}/api/blockchain/query/0xinvalid", app.base_url),
        format!("{}/api/blockchain/contract/0xinvalid", app.base_url),
        format!("{}/api/blockchain/operations/0xinvalid", app.base_url),
        format!("{}/api/krnl/interactions/0xinvalid", app.base_url),
    ];

    for url in gets {
        let resp = client.get(&url).send().await.unwrap();
        assert_eq!(resp.status(), 400, "{url}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR", "{url}");
        assert!(body["error"].is_string());
        assert_rfc3339(&body["timestamp"]);
    }
}

#[tokio::test]
async fn test_missing_user_is_404() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    let err = sdk.get_user(WALLET).await.unwrap_err();
    let failure = err.downcast::<klunkaz_sdk::ApiFailure>().unwrap();
    assert_eq!(failure.status, 404);
    assert_eq!(failure.code, "USER_NOT_FOUND");
}

#[tokio::test]
async fn test_record_transaction_for_missing_user_writes_nothing() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    let err = sdk
        .record_transaction(RecordTransactionRequest {
            wallet_address: WALLET.to_string(),
            tx_hash: "0xdeadbeef".to_string(),
            tx_type: "transfer".to_string(),
            amount: None,
        })
        .await
        .unwrap_err();
    let failure = err.downcast::<klunkaz_sdk::ApiFailure>().unwrap();
    assert_eq!(failure.status, 404);
    assert_eq!(failure.code, "USER_NOT_FOUND");

    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    assert_eq!(row.0, 0);
}

#[tokio::test]
async fn test_record_and_list_transactions() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    sdk.create_user(CreateUserRequest {
        wallet_address: WALLET.to_string(),
        username: None,
        email: None,
    })
    .await
    .unwrap();

    let created = sdk
        .record_transaction(RecordTransactionRequest {
            wallet_address: WALLET.to_string(),
            tx_hash: "0xaaa".to_string(),
            tx_type: "transfer".to_string(),
            amount: Some("0.5".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(created.data["status"], "pending");
    assert_eq!(created.data["type"], "transfer");

    sdk.record_transaction(RecordTransactionRequest {
        wallet_address: WALLET.to_string(),
        tx_hash: "0xbbb".to_string(),
        tx_type: "mint".to_string(),
        amount: None,
    })
    .await
    .unwrap();

    let listed = sdk.get_user_transactions(WALLET).await.unwrap();
    let items = listed.data.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(listed.metadata["count"], 2);
    // Newest first
    assert_eq!(items[0]["txHash"], "0xbbb");
}

#[tokio::test]
async fn test_duplicate_tx_hash_is_opaque_storage_error() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);
    let client = reqwest::Client::new();

    sdk.create_user(CreateUserRequest {
        wallet_address: WALLET.to_string(),
        username: None,
        email: None,
    })
    .await
    .unwrap();

    sdk.record_transaction(RecordTransactionRequest {
        wallet_address: WALLET.to_string(),
        tx_hash: "0xaaa".to_string(),
        tx_type: "transfer".to_string(),
        amount: None,
    })
    .await
    .unwrap();

    // Same hash again: the uniqueness violation surfaces as an opaque 500.
    let resp = client
        .post(format!("{}/api/wallet/transaction", app.base_url))
        .json(&json!({
            "walletAddress": WALLET,
            "txHash": "0xaaa",
            "type": "transfer",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "STORAGE_ERROR");
    assert_eq!(body["error"], "Storage unavailable");

    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions")
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    assert_eq!(row.0, 1);
}

#[tokio::test]
async fn test_production_mode_scrubs_error_details() {
    use klunkaz_api::config::RuntimeMode;

    let rpc = start_mock_rpc(|method, _| match method {
        "eth_getBalance" => RpcReply::Fail,
        other => canned(other),
    })
    .await;
    let app = spawn_app(rpc, 10).await;

    // Development keeps the underlying cause in `details`.
    let resp = reqwest::get(format!("{}/api/wallet/{}/balance", app.base_url, WALLET))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert!(body["details"]["cause"].is_string());

    // Production blanks `details` but keeps the envelope shape.
    let rpc = start_mock_rpc(|method, _| match method {
        "eth_getBalance" => RpcReply::Fail,
        other => canned(other),
    })
    .await;
    let app = spawn_app_with(rpc, 10, |config| {
        config.runtime_mode = RuntimeMode::Production;
    })
    .await;

    let resp = reqwest::get(format!("{}/api/wallet/{}/balance", app.base_url, WALLET))
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "BLOCKCHAIN_ERROR");
    assert_eq!(body["details"], json!({}));
    assert!(body["error"].is_string());
    assert_rfc3339(&body["timestamp"]);
}

#[tokio::test]
async fn test_verify_signature() {
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;

    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    let signer = PrivateKeySigner::random();
    let address = signer.address().to_string();
    let message = "Sign in to Klunkaz";
    let signature = signer.sign_message_sync(message.as_bytes()).unwrap();

    let verified = sdk
        .verify_signature(VerifyRequest {
            message: message.to_string(),
            signature: signature.to_string(),
            address: address.clone(),
        })
        .await
        .unwrap();
    assert_eq!(verified.data["isValid"], true);
    assert_eq!(verified.data["providedAddress"], address.as_str());

    // Tampered message recovers a different signer.
    let tampered = sdk
        .verify_signature(VerifyRequest {
            message: "tampered".to_string(),
            signature: signature.to_string(),
            address: address.clone(),
        })
        .await
        .unwrap();
    assert_eq!(tampered.data["isValid"], false);

    // Garbage signature is an outcome, not a server error.
    let garbage = sdk
        .verify_signature(VerifyRequest {
            message: message.to_string(),
            signature: "not-a-signature".to_string(),
            address,
        })
        .await
        .unwrap();
    assert_eq!(garbage.data["isValid"], false);
    assert_eq!(garbage.data["recoveredAddress"], Value::Null);
}

#[tokio::test]
async fn test_verify_missing_fields_is_400() {
    let app = spawn_default().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/wallet/verify", app.base_url))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_wallet_balance_envelope() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    let balance = sdk.get_wallet_balance(WALLET).await.unwrap();

    assert_eq!(balance.data["address"], WALLET_LOWER);
    assert_eq!(balance.data["balance"], "1.5");
    assert_eq!(balance.data["balanceWei"], "1500000000000000000");
    assert_eq!(balance.data["network"], "Base");
    assert_eq!(balance.metadata["attempt"], 1);
    assert_eq!(balance.metadata["provider"], "Base");
    assert_rfc3339(&balance.metadata["timestamp"]);
}

#[tokio::test]
async fn test_blockchain_query_combined() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    let result = sdk.query_blockchain(WALLET).await.unwrap();

    assert_eq!(result.data["balanceWei"], "1500000000000000000");
    assert_eq!(result.data["transactionCount"], 42);
    assert_eq!(result.data["network"], "Base");
    assert_eq!(result.metadata["attempt"], 1);
}

#[tokio::test]
async fn test_contract_route_distinguishes_accounts() {
    // Canned eth_getCode answers "0x": a plain account.
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    let err = sdk.get_contract_info(WALLET).await.unwrap_err();
    let failure = err.downcast::<klunkaz_sdk::ApiFailure>().unwrap();
    assert_eq!(failure.status, 400);
    assert_eq!(failure.code, "NOT_A_CONTRACT");

    // Now a provider that reports deployed code.
    let rpc = start_mock_rpc(|method, _| match method {
        "eth_getCode" => RpcReply::Result(json!("0x6001")),
        other => canned(other),
    })
    .await;
    let app = spawn_app(rpc, 50).await;
    let sdk = KlunkazClient::new(&app.base_url);

    let info = sdk.get_contract_info(WALLET).await.unwrap();
    assert_eq!(info.data["isContract"], true);
    assert_eq!(info.data["bytecodeLength"], 6);
    assert_eq!(info.data["balance"], "1.5");
}

#[tokio::test]
async fn test_krnl_execute_and_list() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    sdk.create_user(CreateUserRequest {
        wallet_address: WALLET.to_string(),
        username: None,
        email: None,
    })
    .await
    .unwrap();

    let executed = sdk
        .execute_krnl_action(ExecuteActionRequest {
            wallet_address: WALLET.to_string(),
            action_type: "deploy_contract".to_string(),
            payload: Some(json!({"name": "Demo"})),
        })
        .await
        .unwrap();

    assert_eq!(executed.data["status"], "completed");
    assert_eq!(executed.data["actionType"], "deploy_contract");
    assert!(executed.data["response"]["txHash"].is_string());

    let listed = sdk.get_krnl_interactions(WALLET).await.unwrap();
    let items = listed.data.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], "completed");
    // Stored JSON text comes back decoded, not double-encoded.
    assert_eq!(items[0]["payload"]["name"], "Demo");
    assert!(items[0]["response"]["contractAddress"].is_string());
}

#[tokio::test]
async fn test_krnl_unknown_action_writes_no_row() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    sdk.create_user(CreateUserRequest {
        wallet_address: WALLET.to_string(),
        username: None,
        email: None,
    })
    .await
    .unwrap();

    let err = sdk
        .execute_krnl_action(ExecuteActionRequest {
            wallet_address: WALLET.to_string(),
            action_type: "bogus_action".to_string(),
            payload: None,
        })
        .await
        .unwrap_err();
    let failure = err.downcast::<klunkaz_sdk::ApiFailure>().unwrap();
    assert_eq!(failure.status, 400);
    assert_eq!(failure.code, "VALIDATION_ERROR");

    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM krnl_interactions")
        .fetch_one(app.db.pool())
        .await
        .unwrap();
    assert_eq!(row.0, 0);
}

#[tokio::test]
async fn test_operations_record_and_list() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);
    let client = reqwest::Client::new();

    sdk.create_user(CreateUserRequest {
        wallet_address: WALLET.to_string(),
        username: None,
        email: None,
    })
    .await
    .unwrap();

    let resp = client
        .post(format!("{}/api/blockchain/operation", app.base_url))
        .json(&json!({
            "walletAddress": WALLET,
            "operationType": "balance_query",
            "txHash": "0x1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["operationType"], "balance_query");
    assert_eq!(body["data"]["status"], "pending");

    let resp = client
        .get(format!(
            "{}/api/blockchain/operations/{}",
            app.base_url, WALLET
        ))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["metadata"]["count"], 1);
}

#[tokio::test]
async fn test_deploy_contract_estimate() {
    let app = spawn_default().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/blockchain/deploy-contract", app.base_url))
        .json(&json!({
            "walletAddress": WALLET,
            "contractBytecode": "0x6001",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    // 21000 intrinsic + 16 gas per byte over 2 bytes
    assert_eq!(body["data"]["gasEstimate"], "21032");
    assert_eq!(body["data"]["gasPrice"], "1000000000");

    let resp = client
        .post(format!("{}/api/blockchain/deploy-contract", app.base_url))
        .json(&json!({
            "walletAddress": WALLET,
            "contractBytecode": "not hex",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_network_info() {
    let app = spawn_default().await;
    let sdk = KlunkazClient::new(&app.base_url);

    let info = sdk.get_network_info().await.unwrap();
    assert_eq!(info.data["chainId"], 31337);
    assert_eq!(info.data["blockNumber"], 256);
    assert_eq!(info.data["gasPrice"], "1000000000");
    assert_eq!(info.data["network"], "Base");
}

#[tokio::test]
async fn test_transaction_status_unknown_and_malformed() {
    let app = spawn_default().await;
    let client = reqwest::Client::new();

    // Canned receipt lookup answers null: unmined or unknown.
    let hash = format!("0x{}", "ab".repeat(32));
    let resp = client
        .get(format!("{}/api/blockchain/transaction/{}", app.base_url, hash))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "TX_NOT_FOUND");

    let resp = client
        .get(format!(
            "{}/api/blockchain/transaction/0x1234",
            app.base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_unmatched_route_envelope() {
    let app = spawn_default().await;

    let resp = reqwest::get(format!("{}/api/nope", app.base_url))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
    assert_rfc3339(&body["timestamp"]);
}
