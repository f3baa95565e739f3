//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache setup, background task spawning and
//! the Axum server lifecycle, including graceful drain on shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::api::routes::routes;
use crate::application::batcher::{BatcherConfig, spawn_flush_workers};
use crate::application::key_pool::{KeyPool, KeyPoolConfig};
use crate::application::services::{DecodeService, EncodeService};
use crate::config::Config;
use crate::infrastructure::LinkStore;
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{PgLinkRepository, PgSequenceSource};
use crate::state::AppState;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool and migrations
/// - Redis cache (or NullCache fallback)
/// - Key pool refill loop
/// - Write-behind flush workers
/// - Axum HTTP server with graceful shutdown
///
/// On shutdown the listener stops first, then the refill loop and the flush
/// workers are cancelled and given `SHUTDOWN_GRACE_MS` to drain. Exceeding
/// the grace budget is reported as an error since it means buffered links
/// were lost.
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let cache: Arc<dyn CacheService> = if let Some(redis_url) = &config.redis_url {
        match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
            Ok(redis) => {
                tracing::info!("Cache enabled (Redis)");
                Arc::new(redis)
            }
            Err(e) => {
                tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
                Arc::new(NullCache::new())
            }
        }
    } else {
        tracing::info!("Cache disabled (NullCache)");
        Arc::new(NullCache::new())
    };

    let pool = Arc::new(pool);
    let store = Arc::new(LinkStore::new(
        Arc::new(PgLinkRepository::new(pool.clone())),
        cache,
    ));

    let shutdown = CancellationToken::new();

    let (key_pool, key_pool_errors, refill_handle) = KeyPool::spawn(
        Arc::new(PgSequenceSource::new(pool.clone())),
        KeyPoolConfig {
            capacity: config.key_buffer_capacity,
            target_rate: config.key_target_rate,
            issue_timeout: Duration::from_millis(config.key_issue_timeout_ms),
        },
        shutdown.clone(),
    );
    tokio::spawn(log_key_pool_errors(key_pool_errors));

    let (event_tx, event_rx) = mpsc::channel(config.event_queue_capacity);
    let (flush_errors, batcher_handle) = spawn_flush_workers(
        store.clone(),
        event_rx,
        BatcherConfig {
            batch_size: config.batch_size,
            concurrency: config.batch_workers,
            flush_interval: Duration::from_millis(config.flush_interval_ms),
            flush_timeout: Duration::from_millis(config.flush_timeout_ms),
        },
        shutdown.clone(),
    );
    tokio::spawn(log_flush_errors(flush_errors));
    tracing::info!("Flush workers started");

    let state = AppState {
        encode_service: Arc::new(EncodeService::new(Arc::new(key_pool), event_tx)),
        decode_service: Arc::new(DecodeService::new(store)),
    };

    let app = routes().with_state(state);

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Listener stopped, draining background tasks");
    shutdown.cancel();

    let grace = Duration::from_millis(config.shutdown_grace_ms);
    let drain = async {
        let _ = refill_handle.await;
        let _ = batcher_handle.await;
    };
    timeout(grace, drain)
        .await
        .map_err(|_| anyhow::anyhow!("shutdown exceeded {:?} drain budget", grace))?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Logs fatal key pool failures as they surface. The channel closes when the
/// refill loop exits.
async fn log_key_pool_errors(mut errors: mpsc::Receiver<crate::application::key_pool::KeyPoolError>) {
    while let Some(e) = errors.recv().await {
        tracing::error!(error = %e, "Key pool failed; encode will be refused once drained");
    }
}

/// Logs failed flushes. The batch counts here are links that were accepted
/// but never persisted.
async fn log_flush_errors(mut errors: mpsc::Receiver<crate::application::batcher::FlushError>) {
    while let Some(e) = errors.recv().await {
        tracing::error!(count = e.count, reason = %e.reason, "Lost a batch of links");
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
