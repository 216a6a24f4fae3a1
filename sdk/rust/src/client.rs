use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The `{data, metadata}` envelope every business route returns.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    pub data: Value,
    #[serde(default)]
    pub metadata: Value,
}

/// A non-2xx response, decoded from the API's error envelope.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: u16,
    pub error: String,
    pub code: String,
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "API error {} ({}): {}", self.status, self.code, self.error)
    }
}

impl std::error::Error for ApiFailure {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub wallet_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub message: String,
    pub signature: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTransactionRequest {
    pub wallet_address: String,
    pub tx_hash: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteActionRequest {
    pub wallet_address: String,
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

pub struct KlunkazClient {
    client: Client,
    base_url: String,
}

impl KlunkazClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET /api/health` — the one flat (non-enveloped) response.
    pub async fn health(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/api/health", self.base_url))
            .send()
            .await?;
        Ok(resp.json().await?)
    }

    pub async fn get_user(&self, address: &str) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.get(&format!("/api/users/{address}")).await
    }

    pub async fn create_user(
        &self,
        req: CreateUserRequest,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.post("/api/users", &req).await
    }

    pub async fn get_user_transactions(
        &self,
        address: &str,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.get(&format!("/api/users/{address}/transactions")).await
    }

    pub async fn get_wallet_balance(
        &self,
        address: &str,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.get(&format!("/api/wallet/{address}/balance")).await
    }

    pub async fn verify_signature(
        &self,
        req: VerifyRequest,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.post("/api/wallet/verify", &req).await
    }

    pub async fn record_transaction(
        &self,
        req: RecordTransactionRequest,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.post("/api/wallet/transaction", &req).await
    }

    pub async fn query_blockchain(
        &self,
        address: &str,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.get(&format!("/api/blockchain/query/{address}")).await
    }

    pub async fn get_contract_info(
        &self,
        address: &str,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.get(&format!("/api/blockchain/contract/{address}")).await
    }

    pub async fn get_network_info(&self) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.get("/api/blockchain/network").await
    }

    pub async fn execute_krnl_action(
        &self,
        req: ExecuteActionRequest,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.post("/api/krnl/execute", &req).await
    }

    pub async fn get_krnl_interactions(
        &self,
        address: &str,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        self.get(&format!("/api/krnl/interactions/{address}")).await
    }

    async fn get(&self, path: &str) -> Result<Envelope, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn post<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Envelope, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode(resp: reqwest::Response) -> Result<Envelope, Box<dyn std::error::Error>> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let body: Value = serde_json::from_str(&text).unwrap_or(json!({}));
            return Err(Box::new(ApiFailure {
                status: status.as_u16(),
                error: body["error"].as_str().unwrap_or(&text).to_string(),
                code: body["code"].as_str().unwrap_or("UNKNOWN").to_string(),
            }));
        }

        Ok(serde_json::from_str(&text)?)
    }
}
