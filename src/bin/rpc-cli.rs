use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "rpc-cli")]
#[command(about = "Send JSON-RPC 2.0 calls to a dispatcher", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single call
    Call {
        /// Method in `Service.Method` form
        method: String,
        /// Params as a JSON document
        #[arg(short, long)]
        params: Option<String>,
        /// Request id (JSON value, defaults to 1)
        #[arg(short, long, default_value = "1")]
        id: String,
    },
    /// Send a batch read from a JSON file
    Batch {
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let body = match cli.command {
        Commands::Call { method, params, id } => {
            let id: Value = serde_json::from_str(&id).unwrap_or(Value::String(id));
            let mut request = json!({"jsonrpc": "2.0", "method": method, "id": id});
            if let Some(params) = params {
                request["params"] = serde_json::from_str(&params)?;
            }
            request
        }
        Commands::Batch { file } => serde_json::from_str(&std::fs::read_to_string(file)?)?,
    };

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let res = reqwest::Client::new()
        .post(&cli.url)
        .headers(headers)
        .json(&body)
        .send()
        .await?;

    let status = res.status();
    let json: Value = res.json().await?;
    println!("HTTP {}", status);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
