use std::process::ExitCode;
use std::sync::Arc;

use hubgate::{Config, Gateway, GitHubClient, Server, gateway};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    info!(user = config.username(), authenticated = config.token().is_some(), "configuration loaded");

    let host = Arc::new(GitHubClient::from_config(&config)?);
    let app = gateway::router(Gateway::new(host, &config));

    let server = Server::bind(("0.0.0.0", config.port())).await?;
    info!(port = config.port(), "Server running on port {}", config.port());
    server.serve(app).await?;
    Ok(())
}
