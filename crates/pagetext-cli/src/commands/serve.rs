//! Serve command - run the HTTP front end.

use anyhow::Context;
use console::style;
use tokio::net::TcpListener;
use tracing::{info, warn};

use pagetext_core::PagetextConfig;

use crate::server::{self, AppState};

pub async fn run(config: PagetextConfig) -> anyhow::Result<()> {
    let bind = config.server.bind.clone();
    let app = server::router(AppState::new(config.server, config.parse));

    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    let addr = listener.local_addr()?;

    info!("Listening on {}", addr);
    eprintln!("{} Listening on http://{}", style("ℹ").blue(), addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            warn!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
