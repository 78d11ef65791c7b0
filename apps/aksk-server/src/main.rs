//! AKSK echo server.
//!
//! Serves an unauthenticated health check and echoes the body of every other
//! request that carries a valid AKSK signature.
//!
//! # Usage
//!
//! ```text
//! AKSK_CREDENTIALS=123:456 aksk-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `AKSK_CREDENTIALS` | *(empty)* | `ak:sk` pairs separated by commas |
//! | `AKSK_SKIP_BODY` | `false` | Skip body hash verification |
//! | `AKSK_REPLAY_GUARD` | `false` | Reject repeated nonces |
//! | `AKSK_ENCODING` | `base64` | `base64` or `hex` |
//! | `AKSK_HASH` | `sha256` | `sha1`, `sha256`, or `sha512` |
//! | `AKSK_ACCEPTABLE_SKEW_SECS` | `60` | Allowed clock skew |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod config;
mod gateway;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use aksk_core::Auth;
use aksk_http::{AkskService, NonceCache, RequestValidator};
use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::gateway::{EchoService, GatewayService};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Resolve the log filter: `RUST_LOG` wins over the configured level.
fn log_filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter> {
    let directives = rust_log.unwrap_or(log_level);
    EnvFilter::try_new(directives).with_context(|| format!("invalid log filter: {directives}"))
}

fn init_tracing(log_level: &str) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), log_level)?)
        .with_target(true)
        .init();
    Ok(())
}

/// Build the request validator described by `config`.
fn build_validator(config: &ServerConfig) -> Result<RequestValidator> {
    let resolver = config.resolver()?;
    if resolver.is_empty() {
        warn!("no credentials configured, every signed request will be rejected");
    }

    let auth = Auth::new(config.auth);
    let mut validator = RequestValidator::new(auth, resolver).skip_body(config.skip_body);
    if config.replay_guard {
        validator =
            validator.with_replay_guard(Arc::new(NonceCache::for_skew(auth.acceptable_skew())));
    }
    Ok(validator)
}

/// Connection counters reported at shutdown.
#[derive(Debug, Default)]
struct ConnectionStats {
    accepted: AtomicU64,
    accept_failures: AtomicU64,
    connection_errors: AtomicU64,
}

impl ConnectionStats {
    fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn log_summary(&self) {
        info!(
            accepted = self.accepted.load(Ordering::Relaxed),
            accept_failures = self.accept_failures.load(Ordering::Relaxed),
            connection_errors = self.connection_errors.load(Ordering::Relaxed),
            "connection summary"
        );
    }
}

/// Serve connections on `listener` until Ctrl-C, then drain in-flight requests.
async fn serve(listener: TcpListener, service: GatewayService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());
    let stats = Arc::new(ConnectionStats::default());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        ConnectionStats::record(&stats.accept_failures);
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };
                ConnectionStats::record(&stats.accepted);

                let conn = http.serve_connection(TokioIo::new(stream), service.clone());
                let conn = graceful.watch(conn.into_owned());
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        ConnectionStats::record(&stats.connection_errors);
                        error!(%peer_addr, error = %e, "connection error");
                    }
                });
            }

            _ = &mut shutdown => {
                info!("received shutdown signal, draining connections");
                break;
            }
        }
    }

    graceful.shutdown().await;
    stats.log_summary();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        encoding = %config.auth.encoding,
        hash = %config.auth.hash,
        acceptable_skew_secs = config.auth.acceptable_skew.as_secs(),
        skip_body = config.skip_body,
        replay_guard = config.replay_guard,
        version = VERSION,
        "starting AKSK echo server",
    );

    let validator = build_validator(&config)?;
    let service = GatewayService::new(AkskService::new(EchoService, validator));

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service).await
}
