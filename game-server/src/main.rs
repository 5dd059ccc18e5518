use std::sync::Arc;
use tokio::signal;
use tracing::info;

use game_core::WordList;
use game_server::{config::Config, create_routes, hub::GameHub};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting imposter game server...");

    let config = Config::new();
    let word_list = Arc::new(WordList::default());
    let hub = GameHub::new(config.hub_settings(), config.game_settings(), word_list);

    let routes = create_routes(hub.clone(), config.reconnect_grace_period());

    let addr = (
        config.host.parse::<std::net::IpAddr>().expect("Invalid HOST"),
        config.port,
    );

    let (addr, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, async {
        // Wait for SIGINT (Ctrl+C) or SIGTERM
        #[cfg(unix)]
        {
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).unwrap();
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).unwrap();

            tokio::select! {
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully...");
                }
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            signal::ctrl_c().await.expect("Failed to listen for ctrl+c");
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    });

    info!("Server started on {}. Press Ctrl+C to stop.", addr);
    server.await;

    hub.close().await;
    info!("Server shutdown complete.");
}
