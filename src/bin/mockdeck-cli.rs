use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "mockdeck-cli")]
#[command(about = "Management CLI for a running mockdeck server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show listener state, endpoints and recent requests
    Status,
    /// Start the mock listener
    Start,
    /// Stop the mock listener
    Stop,
    /// Show the retained request log
    Logs,
    /// List projects
    Projects,
    /// List response files of the current project
    Files,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/api/status")),
        Commands::Start => client.post(format!("{base}/api/start")),
        Commands::Stop => client.post(format!("{base}/api/stop")),
        Commands::Logs => client.get(format!("{base}/api/logs")),
        Commands::Projects => client.get(format!("{base}/api/projects")),
        Commands::Files => client.get(format!("{base}/api/files")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: control API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
