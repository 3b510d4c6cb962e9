//! Reel pipeline binary. Performs exactly one run and exits.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_worker::{Pipeline, PipelineConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reel=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(true).with_target(true))
            .with(env_filter)
            .init();
    }

    info!("Starting reelcast {}", env!("CARGO_PKG_VERSION"));

    let config = match PipelineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(e.exit_code());
        }
    };
    info!("Pipeline config: {:?}", config);

    let mut pipeline = match Pipeline::from_config(&config) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Failed to build pipeline");
            std::process::exit(e.exit_code());
        }
    };

    let report = pipeline.run().await;
    match serde_json::to_string(&report) {
        Ok(json) => info!(report = %json, "Run report"),
        Err(e) => error!(error = %e, "Failed to serialize run report"),
    }

    std::process::exit(report.exit_code());
}
