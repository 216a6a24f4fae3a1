//! Shared utilities for integration testing: a scripted JSON-RPC mock
//! provider speaking raw TCP, and a helper that spawns the real server on
//! an ephemeral port against an in-memory database.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use klunkaz_api::blockchain::ChainClient;
use klunkaz_api::config::AppConfig;
use klunkaz_api::krnl::KrnlExecutor;
use klunkaz_api::{Database, HttpServer};

/// 1.5 ETH in wei, the canned mock balance.
pub const MOCK_BALANCE_WEI: u128 = 1_500_000_000_000_000_000;

/// What the mock provider answers for one JSON-RPC call.
pub enum RpcReply {
    /// Respond 200 with `{"jsonrpc":"2.0","id":..,"result":<value>}`.
    Result(Value),
    /// Respond HTTP 503, which the client surfaces as an RPC error.
    Fail,
}

pub fn hex_quantity(value: u128) -> Value {
    json!(format!("0x{value:x}"))
}

/// Canned answers for every method the service issues. Tests wrap this and
/// override the methods they script.
pub fn canned(method: &str) -> RpcReply {
    match method {
        "eth_chainId" => RpcReply::Result(hex_quantity(31337)),
        "eth_blockNumber" => RpcReply::Result(hex_quantity(0x100)),
        "eth_gasPrice" => RpcReply::Result(hex_quantity(1_000_000_000)),
        "eth_getBalance" => RpcReply::Result(hex_quantity(MOCK_BALANCE_WEI)),
        "eth_getTransactionCount" => RpcReply::Result(hex_quantity(42)),
        "eth_getCode" => RpcReply::Result(json!("0x")),
        "eth_getTransactionReceipt" => RpcReply::Result(Value::Null),
        _ => RpcReply::Fail,
    }
}

/// Start a mock JSON-RPC provider whose per-call behavior is the given
/// closure. Returns the bound address.
pub async fn start_mock_rpc<F>(handler: F) -> SocketAddr
where
    F: Fn(&str, &Value) -> RpcReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_http_request(&mut socket).await else {
                            return;
                        };
                        let response = match serde_json::from_slice::<Value>(&body) {
                            Ok(Value::Array(calls)) => {
                                let replies: Vec<Value> =
                                    calls.iter().map(|call| rpc_response(&handler, call)).collect();
                                http_json(&Value::Array(replies))
                            }
                            Ok(call) => match handler(
                                call["method"].as_str().unwrap_or(""),
                                &call["params"],
                            ) {
                                RpcReply::Result(result) => http_json(&json!({
                                    "jsonrpc": "2.0",
                                    "id": call["id"].clone(),
                                    "result": result,
                                })),
                                RpcReply::Fail => http_503(),
                            },
                            Err(_) => http_503(),
                        };
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

fn rpc_response<F>(handler: &Arc<F>, call: &Value) -> Value
where
    F: Fn(&str, &Value) -> RpcReply + Send + Sync + 'static,
{
    match handler(call["method"].as_str().unwrap_or(""), &call["params"]) {
        RpcReply::Result(result) => json!({
            "jsonrpc": "2.0",
            "id": call["id"].clone(),
            "result": result,
        }),
        RpcReply::Fail => json!({
            "jsonrpc": "2.0",
            "id": call["id"].clone(),
            "error": {"code": -32000, "message": "injected failure"},
        }),
    }
}

async fn read_http_request(socket: &mut tokio::net::TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let header_end = loop {
        let mut chunk = [0u8; 1024];
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find_subsequence(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        if buf.len() > 64 * 1024 {
            return None;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length: usize = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let mut chunk = [0u8; 1024];
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(buf[header_end..header_end + content_length].to_vec())
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn http_json(body: &Value) -> String {
    let body = body.to_string();
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn http_503() -> String {
    let body = "injected failure";
    format!(
        "HTTP/1.1 503 Service Unavailable\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

/// A running service instance plus handles the tests assert against.
pub struct TestApp {
    pub base_url: String,
    pub db: Database,
}

/// Spawn the real server on an ephemeral port: in-memory database, chain
/// client pointed at the given mock provider.
pub async fn spawn_app(rpc_addr: SocketAddr, retry_base_delay_ms: u64) -> TestApp {
    spawn_app_with(rpc_addr, retry_base_delay_ms, |_| {}).await
}

/// Like [`spawn_app`], with a hook to adjust the config before startup
/// (runtime mode, Krnl key, and so on).
pub async fn spawn_app_with<F>(
    rpc_addr: SocketAddr,
    retry_base_delay_ms: u64,
    configure: F,
) -> TestApp
where
    F: FnOnce(&mut AppConfig),
{
    let mut config = AppConfig::default();
    config.chain.rpc_url = format!("http://{rpc_addr}");
    config.chain.chain_id = 31337;
    config.chain.rpc_timeout_secs = 2;
    config.chain.retry_base_delay_ms = retry_base_delay_ms;
    config.krnl.api_key = "test-key".to_string();
    configure(&mut config);

    let db = Database::open_in_memory().await.unwrap();
    let chain = ChainClient::new(config.chain.clone()).await.unwrap();
    let krnl = KrnlExecutor::new(&config.krnl);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, db.clone(), chain, krnl);
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    TestApp {
        base_url: format!("http://{addr}"),
        db,
    }
}
