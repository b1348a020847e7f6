use clap::{Parser, Subcommand};
use policy_gate::policy::HostRange;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "policy-cli")]
#[command(about = "Management CLI for the policy gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "POLICY_GATE_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gate system status
    Status,
    /// Show connection counts, limits and host ranges
    Policy,
    /// Validate host-range tokens without contacting the gate
    Check {
        /// Tokens such as "*", "10.0.0.1" or "10.0.0.1,10.0.0.99"
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let path = match cli.command {
        Commands::Status => "/admin/status",
        Commands::Policy => "/admin/policy",
        Commands::Check { tokens } => {
            if !check_tokens(&tokens) {
                std::process::exit(1);
            }
            return Ok(());
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let res = reqwest::Client::new()
        .get(format!("{}{}", cli.url, path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

/// Prints one line per token. Returns false if any token is invalid.
fn check_tokens(tokens: &[String]) -> bool {
    let mut all_valid = true;
    for token in tokens {
        match HostRange::parse(token) {
            Ok(range) => println!("ok       {:<40} {}", token, range),
            Err(e) => {
                all_valid = false;
                println!("invalid  {:<40} {}", token, e);
            }
        }
    }
    all_valid
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
