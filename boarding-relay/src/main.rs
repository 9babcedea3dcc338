use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use boarding_relay::config::Config;
use boarding_relay::feed::{MartaClient, MartaConfig, MockFeed, TrainFeed};
use boarding_relay::poller::{BoardingPoller, Shutdown};
use boarding_relay::slack::{RequestVerifier, WebhookDispatcher};
use boarding_relay::web::{AppState, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.debug);
    config.validate()?;

    info!("Starting boarding-relay v{}", env!("CARGO_PKG_VERSION"));

    // Transit feed: live MARTA, or a JSON file for local runs
    let feed: Arc<dyn TrainFeed> = match &config.mock_trains {
        Some(path) => {
            let mock = MockFeed::new(path).context("failed to load mock trains")?;
            info!(path = %path.display(), "serving trains from file");
            spawn_mock_reload(mock.clone(), path.clone());
            Arc::new(mock)
        }
        None => {
            let mut marta_config = MartaConfig::new(config.marta_api_key.clone().unwrap_or_default())
                .with_timeout(config.request_timeout_secs);
            if let Some(url) = &config.feed_url {
                marta_config = marta_config.with_base_url(url);
            }
            Arc::new(MartaClient::new(marta_config).context("failed to create MARTA client")?)
        }
    };

    let dispatcher = WebhookDispatcher::new(config.webhook_url.clone(), config.request_timeout())
        .context("failed to create webhook client")?;

    // Background poller
    let shutdown = Shutdown::new();
    let poller = BoardingPoller::new(feed.clone(), Arc::new(dispatcher), config.poll_interval());
    let poller_task = tokio::spawn(poller.run(shutdown.clone()));

    // Slash-command server
    let state = match &config.signing_secret {
        Some(secret) if !config.skip_signature_check => {
            AppState::new(feed, RequestVerifier::new(secret))
        }
        _ => {
            warn!("signature verification disabled; do not expose this server");
            AppState::unauthenticated(feed)
        }
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("Listening on http://{}", config.listen);
    info!("  GET  /health        - Health check");
    info!("  POST /find-arrival  - Slash command");

    let signal_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_signal().await;
            signal_shutdown.cancel();
        })
        .await
        .context("server error")?;

    // The server can also stop on its own; make sure the poller follows.
    shutdown.cancel();
    let cycles = poller_task.await.context("poller task panicked")?;
    info!(cycles, "shutdown complete");

    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over `--debug`.
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

/// Reload the mock train file on SIGHUP.
#[cfg(unix)]
fn spawn_mock_reload(mock: MockFeed, path: std::path::PathBuf) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut sighup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to install SIGHUP handler");
                return;
            }
        };
        while sighup.recv().await.is_some() {
            match mock.reload(&path).await {
                Ok(count) => info!(count, "reloaded mock trains"),
                Err(e) => warn!(error = %e, "failed to reload mock trains"),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_mock_reload(_mock: MockFeed, _path: std::path::PathBuf) {}
