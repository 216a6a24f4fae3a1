//! Operator CLI for the Klunkaz API.
//!
//! Exercises the REST surface from the command line and pretty-prints the
//! JSON envelopes.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "klunkaz-cli")]
#[command(about = "Operator CLI for the Klunkaz API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service health
    Health,
    /// Look up a user by wallet address
    User { address: String },
    /// Create or update a user
    UpsertUser {
        address: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List a user's recorded transactions
    Transactions { address: String },
    /// Fetch the wallet balance (with retry metadata)
    Balance { address: String },
    /// Combined balance + transaction count query
    Query { address: String },
    /// Inspect a contract address
    Contract { address: String },
    /// Current network view (chain id, block, gas price)
    Network,
    /// Execute a Krnl action
    Execute {
        address: String,
        action: String,
        #[arg(long)]
        payload: Option<String>,
    },
    /// List a user's Krnl interactions
    Interactions { address: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/api/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::User { address } => {
            let res = client
                .get(format!("{}/api/users/{}", cli.url, address))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::UpsertUser {
            address,
            username,
            email,
        } => {
            let res = client
                .post(format!("{}/api/users", cli.url))
                .json(&json!({
                    "walletAddress": address,
                    "username": username,
                    "email": email,
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Transactions { address } => {
            let res = client
                .get(format!("{}/api/users/{}/transactions", cli.url, address))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Balance { address } => {
            let res = client
                .get(format!("{}/api/wallet/{}/balance", cli.url, address))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Query { address } => {
            let res = client
                .get(format!("{}/api/blockchain/query/{}", cli.url, address))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Contract { address } => {
            let res = client
                .get(format!("{}/api/blockchain/contract/{}", cli.url, address))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Network => {
            let res = client
                .get(format!("{}/api/blockchain/network", cli.url))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Execute {
            address,
            action,
            payload,
        } => {
            let payload: Value = match payload {
                Some(text) => serde_json::from_str(&text)?,
                None => Value::Null,
            };
            let res = client
                .post(format!("{}/api/krnl/execute", cli.url))
                .json(&json!({
                    "walletAddress": address,
                    "actionType": action,
                    "payload": payload,
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Interactions { address } => {
            let res = client
                .get(format!("{}/api/krnl/interactions/{}", cli.url, address))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
