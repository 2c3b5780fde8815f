use std::sync::Arc;

use crate::config::AppConfig;
use crate::data::tables::EventTables;

pub mod api;
pub mod routes;

pub use routes::{create_router, AppState, SharedState};

pub fn run_server(config: &AppConfig, tables: EventTables) -> std::io::Result<()> {
    let state = Arc::new(AppState {
        tables,
        static_dir: config.static_dir.clone(),
    });
    let app = create_router(state);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
        log::info!("gacha-ev server listening on http://{}", config.bind_addr);
        log::info!("serving static files from {}", config.static_dir.display());
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    })?;

    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("unable to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
