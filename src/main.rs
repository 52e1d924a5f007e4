//! HTTP server for the payroll settlement engine.
//!
//! Environment:
//! - `PAYROLL_CONFIG_DIR`: directory holding `rates.yaml` and `policy.yaml`
//! - `PAYROLL_DIRECTORY_FILE`: employee directory YAML
//! - `PAYROLL_BIND_ADDR`: listen address, `127.0.0.1:3000` by default

use std::env;
use std::net::SocketAddr;

use anyhow::Context;
use tracing::info;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::settlement::PayrollService;
use payroll_engine::sources::InMemoryDirectory;

const DEFAULT_CONFIG_DIR: &str = "./config/payroll";
const DEFAULT_DIRECTORY_FILE: &str = "./config/directory.yaml";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let config_dir = env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let directory_file =
        env::var("PAYROLL_DIRECTORY_FILE").unwrap_or_else(|_| DEFAULT_DIRECTORY_FILE.to_string());
    let bind_addr = env::var("PAYROLL_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let config = ConfigLoader::load(&config_dir)
        .with_context(|| format!("failed to load payroll configuration from {}", config_dir))?
        .into_config();
    let directory = InMemoryDirectory::from_yaml_file(&directory_file)
        .with_context(|| format!("failed to load employee directory from {}", directory_file))?;

    info!(
        config_dir = %config_dir,
        directory_file = %directory_file,
        worker_concurrency = config.policy().worker_concurrency,
        "starting payroll server"
    );

    let service = PayrollService::in_memory(config, directory);
    let app = create_router(AppState::new(service));

    let addr: SocketAddr = bind_addr.parse().context("invalid bind address")?;
    info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
