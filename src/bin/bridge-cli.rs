use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Command-line client for the currency bridge", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch exchange rates for a date (today when omitted)
    Rates {
        /// Date in yyyy-MM-dd form
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Check that the bridge is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let request = match cli.command {
        Commands::Rates { date } => {
            let mut request = client.get(format!("{}/api/currency", cli.url));
            if let Some(date) = date {
                request = request.query(&[("date", date)]);
            }
            request
        }
        Commands::Health => client.get(format!("{}/health", cli.url)),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(date) = res.headers().get("x-rates-date") {
        eprintln!("Rates date: {}", date.to_str().unwrap_or("?"));
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        eprintln!("Error: bridge returned status {}", status);
        std::process::exit(1);
    }
    Ok(())
}
