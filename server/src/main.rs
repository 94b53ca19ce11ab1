use std::net::SocketAddr;

use anyhow::Context;
use tracing::{info, warn};
use triage_server::config::AppConfig;
use triage_server::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = AppConfig::load()?;
    if config.admin_password == AppConfig::default().admin_password {
        warn!("using the built-in admin password; set TRIAGE_ADMIN_PASSWORD");
    }

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("invalid host/port")?;
    let state = AppState::open(config).context("failed to initialise storage")?;
    let app = router(state);

    info!(%addr, "incident triage API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info")),
        )
        .json()
        .init();
}
