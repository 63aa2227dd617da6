use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "portal-cli")]
#[command(about = "Command-line client for the cardano-portal backend", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend is up
    Health,
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and print a session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Check a session token
    Verify {
        #[arg(long, env = "PORTAL_TOKEN")]
        token: String,
    },
    /// Pin a file to IPFS through the backend
    Upload {
        file: PathBuf,
        /// Content type sent with the file
        #[arg(long, default_value = "application/octet-stream")]
        content_type: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{url}/health")).send().await?,
        Commands::Register { name, email, password } => {
            client
                .post(format!("{url}/api/register"))
                .json(&json!({ "name": name, "email": email, "password": password }))
                .send()
                .await?
        }
        Commands::Login { email, password } => {
            client
                .post(format!("{url}/api/login"))
                .json(&json!({ "email": email, "password": password }))
                .send()
                .await?
        }
        Commands::Verify { token } => {
            client
                .post(format!("{url}/api/verify"))
                .bearer_auth(token)
                .send()
                .await?
        }
        Commands::Upload { file, content_type } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let part = Part::bytes(bytes).file_name(file_name).mime_str(&content_type)?;
            client
                .post(format!("{url}/api/upload-to-pinata"))
                .multipart(Form::new().part("file", part))
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = serde_json::from_str::<Value>(&text)
        .and_then(|v| serde_json::to_string_pretty(&v))
        .unwrap_or(text);

    if status.is_success() {
        println!("{body}");
        Ok(())
    } else {
        eprintln!("Error: portal returned status {status}");
        eprintln!("{body}");
        std::process::exit(1);
    }
}
