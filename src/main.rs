use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use lgtm_bot::config::Config;
use lgtm_bot::github::OctocrabClient;
use lgtm_bot::owners::StaticOwners;
use lgtm_bot::server::{AppState, build_router};
use lgtm_bot::worker::Dispatcher;
use octocrab::Octocrab;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lgtm_bot=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "Starting LGTM bot");

    let owners = StaticOwners::from_file(&config.owners_file)
        .with_context(|| format!("loading {}", config.owners_file.display()))?;

    let octocrab = Octocrab::builder()
        .personal_token(config.github_token.clone())
        .build()
        .context("building GitHub client")?;

    let dispatcher = Arc::new(Dispatcher::new(
        config.dispatcher_config(),
        Box::new(move |repo| OctocrabClient::new(octocrab.clone(), repo.clone())),
        Arc::new(owners),
    ));

    let app = build_router(AppState::new(Arc::clone(&dispatcher)));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("listening on {}", addr);

    let shutdown = dispatcher.shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = shutdown.cancelled() => {}
            }
        })
        .await
        .context("serving HTTP")?;

    dispatcher.shutdown_all().await;
    tracing::info!("Shut down");
    Ok(())
}
