//! Purpose: Provide the HTTP server hosting the JSON echo endpoint.
//! Exports: `ServeConfig`, `router`, `serve`, `serve_listener`, `init_tracing`, default constants.
//! Role: Axum-based server; one route (`POST /`), framework defaults for everything else.
//! Invariants: Config is built once at startup and passed in; no global app object.
//! Invariants: Unknown paths get 404 and other methods on `/` get 405 (axum defaults).
//! Notes: Shutdown drains in-flight requests, bounded by `SHUTDOWN_GRACE`.

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use tokio::net::TcpListener;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::echo::{EchoState, echo};
use crate::error::{Error, ErrorKind};

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_MAX_BODY_BYTES: u64 = 2 * 1024 * 1024;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub max_body_bytes: u64,
    pub strict_json: bool,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            strict_json: false,
        }
    }
}

/// Binds `config.bind` and serves until SIGINT/SIGTERM.
pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let listener = TcpListener::bind(config.bind).await.map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to bind server")
            .with_hint(format!(
                "Check that {} is free or pass a different --bind.",
                config.bind
            ))
            .with_source(err)
    })?;

    serve_listener(listener, &config, shutdown_signal()).await
}

/// Serves on an already-bound listener until `shutdown` resolves, then drains.
pub async fn serve_listener<F>(
    listener: TcpListener,
    config: &ServeConfig,
    shutdown: F,
) -> Result<(), Error>
where
    F: Future<Output = ()>,
{
    let app = router(config)?;
    let local_addr = listener.local_addr().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read listener address")
            .with_source(err)
    })?;
    info!(
        bind = %local_addr,
        strict_json = config.strict_json,
        max_body_bytes = config.max_body_bytes,
        "Starting jsonecho server"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(server_failed)?;
        }
        _ = shutdown => {
            info!("shutdown requested; draining connections");
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await {
                Ok(result) => result.map_err(server_failed)?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    info!("server stopped");
    Ok(())
}

pub fn router(config: &ServeConfig) -> Result<Router, Error> {
    let max_body_bytes = body_limit(config)?;
    let state = Arc::new(EchoState {
        strict_json: config.strict_json,
    });

    Ok(Router::new()
        .route("/", post(echo))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn server_failed(err: std::io::Error) -> Error {
    Error::new(ErrorKind::Io)
        .with_message("server failed")
        .with_source(err)
}

fn body_limit(config: &ServeConfig) -> Result<usize, Error> {
    config.max_body_bytes.try_into().map_err(|_| {
        Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes exceeds platform limits")
            .with_hint("Use a smaller value that fits in memory.")
    })
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if config.max_body_bytes == 0 {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--max-body-bytes must be greater than zero")
            .with_hint("Use a positive value like 2097152."));
    }
    body_limit(config)?;
    Ok(())
}

/// Installs the fmt subscriber (stdout); `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}
