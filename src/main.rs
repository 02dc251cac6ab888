use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pr_steward::config::Config;
use pr_steward::github::AppClientFactory;
use pr_steward::server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pr_steward=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();

    let private_key = tokio::fs::read(&config.private_key_path).await?;
    let factory = AppClientFactory::new(config.app_id, &private_key)?;

    let state = AppState::new(factory, config.wip_hold_label, config.claim_ttl_hours);

    // Hourly sweep of expired idempotency claims.
    let pruner = state.clone();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(3600));
        loop {
            tick.tick().await;
            let removed = pruner.guard().prune_expired();
            if removed > 0 {
                tracing::debug!(removed, "pruned expired claims");
            }
        }
    });

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
