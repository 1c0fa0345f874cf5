//! currency-bridge
//!
//! Exposes `GET /api/currency?date=yyyy-MM-dd` and answers it by calling the
//! central bank `GetCursOnDate` SOAP operation.
//!
//! ```text
//!     Client ──GET /api/currency──▶ ┌──────────────────────────────────────────┐
//!                                   │ http (axum, request id, trace, timeout)  │
//!                                   │   → date → envelope → upstream ──────────┼──POST SOAP──▶ DailyInfo.asmx
//!                                   │   ← JSON ← translate ← raw XML ◀─────────┼─────────────
//!     Client ◀──────JSON─────────── └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use currency_bridge::config::load_or_default;
use currency_bridge::lifecycle::{signals, startup, Shutdown};
use currency_bridge::observability::logging;

#[derive(Parser)]
#[command(name = "currency-bridge")]
#[command(about = "REST/JSON gateway for the CBR GetCursOnDate SOAP service", long_about = None)]
struct Args {
    /// Path to the TOML configuration file; defaults are used when omitted.
    #[arg(short, long, env = "CURRENCY_BRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        upstream_timeout_secs = config.upstream.request_timeout_secs,
        request_timeout_secs = config.timeouts.request_secs,
        strict_dates = config.validation.strict_dates,
        "currency-bridge starting"
    );

    let shutdown = Shutdown::new();
    signals::forward_signals(shutdown.clone());

    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
