//! Galtick - Elite Dangerous galaxy tick watcher
//!
//! Polls the galaxy tick API, detects new ticks, and announces them in a chat channel.

pub mod commands;
pub mod config;
pub mod dashboard;
pub mod discord;
pub mod error;
pub mod fetcher;
pub mod formatter;
pub mod io;
pub mod monitor;
pub mod notifier;
pub mod state;
pub mod tick;

pub use config::{load_config, Config};
pub use error::{GaltickError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::commands::CommandHandler;
use crate::discord::DiscordNotifier;
use crate::fetcher::{HttpTickFetcher, TickFetcher};
use crate::io::{HttpClient, ReqwestHttpClient};
use crate::monitor::TickMonitor;
use crate::notifier::NotificationSink;

/// Run the galtick service with the given configuration until Ctrl-C
pub async fn run(config: Config) -> Result<()> {
    let http: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::with_timeout(config.monitor.fetch_timeout)?);
    let fetcher: Arc<dyn TickFetcher> =
        Arc::new(HttpTickFetcher::new(&config.monitor, Arc::clone(&http)));
    let sink: Arc<dyn NotificationSink> =
        Arc::new(DiscordNotifier::new(&config.discord, Arc::clone(&http))?);
    let cancel = CancellationToken::new();

    // Setup shutdown handler
    let cancel_for_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => tracing::error!("Failed to listen for ctrl-c: {}", e),
        }
        cancel_for_signal.cancel();
    });

    run_with(config, fetcher, sink, cancel).await
}

/// Run the service with injected collaborators until `cancel` fires
pub async fn run_with(
    config: Config,
    fetcher: Arc<dyn TickFetcher>,
    sink: Arc<dyn NotificationSink>,
    cancel: CancellationToken,
) -> Result<()> {
    let state = state::new_state_handle(
        config.monitor.channel_id,
        config.monitor.polling_interval,
        config.dashboard.history_size,
    );

    tracing::info!(
        "Tick notification channel: {}",
        config
            .monitor
            .channel_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "NOT CONFIGURED".to_string())
    );

    let monitor = Arc::new(TickMonitor::new(
        Arc::clone(&fetcher),
        sink,
        &config,
        Arc::clone(&state),
        cancel.clone(),
    ));
    let commands = CommandHandler::new(fetcher, Arc::clone(&state), config.discord.footer.clone());

    // Start dashboard if enabled
    if config.dashboard.enabled {
        let dashboard_port = config.dashboard.port;
        let admin_token = config.dashboard.admin_token.clone();
        let dashboard_state = Arc::clone(&state);
        let cancel_for_dashboard = cancel.clone();

        if admin_token.is_none() {
            tracing::warn!(
                "{} not set; POST /api/tickchannel will reject every request",
                config::ADMIN_TOKEN_ENV
            );
        }

        tokio::spawn(async move {
            let router = dashboard::build_router(dashboard_state, commands, admin_token);
            let addr = SocketAddr::from(([0, 0, 0, 0], dashboard_port));
            tracing::info!("Dashboard listening on http://{}", addr);

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!(
                        "Failed to bind dashboard to port {}: {}. Continuing without dashboard.",
                        dashboard_port,
                        e
                    );
                    return;
                }
            };

            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    cancel_for_dashboard.cancelled().await;
                })
                .await
                .ok();

            tracing::debug!("Dashboard stopped");
        });
    }

    monitor.seed().await;

    if let Some(handle) = monitor.start() {
        if let Err(e) = handle.await {
            tracing::error!("Tick monitor task failed: {}", e);
        }
    }

    tracing::info!("Galtick stopped");
    Ok(())
}
