//! Memo Server: standalone binary exposing one memo session over REST.
//!
//! Default: http://127.0.0.1:8080/
//!
//! Configuration comes from `.env` and the process environment:
//! `MEMO_BACKEND`, `MEMO_DIR`, `MEMO_LEGACY_FILE`, `MEMO_FLUSH_QUIET_MS`,
//! `MEMO_SERVER_PORT` and `MEMO_LOG_DIR`.

mod routes;
mod state;

use log::{error, info};
use memo_core::{default_log_level, init_logging, StoreConfig};
use state::{AppState, StartupError};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_PORT: u16 = 8080;
const TICK_INTERVAL: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    if let Ok(log_dir) = std::env::var("MEMO_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=server_exit module=server status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let port: u16 = std::env::var("MEMO_SERVER_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_PORT);

    let config = StoreConfig::from_env()?;
    let state = AppState::open(&config)?;
    let ticker = tokio::spawn(flush_ticker(state.clone()));

    let app = routes::router(state.clone());
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("event=server_listen module=server status=ok addr=http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    ticker.abort();
    let written = state.lock_session().flush_now()?;
    info!("event=server_shutdown module=server status=ok flushed={written}");
    Ok(())
}

/// Drives the debounced flush of the shared session.
async fn flush_ticker(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    loop {
        interval.tick().await;
        let result = state.lock_session().tick(Instant::now());
        if let Err(err) = result {
            error!("event=memo_tick module=server status=error kind={:?} error={err}", err.kind());
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=server_signal module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
