//! Shared harness for integration tests.
#![allow(dead_code)]
//!
//! Runs the full application wiring (key pool, batcher, services, router)
//! against in-memory stand-ins for PostgreSQL, so tests exercise the real
//! request and persistence paths without external services.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shortl::AppState;
use shortl::application::batcher::{BatcherConfig, spawn_flush_workers};
use shortl::application::key_pool::{KeyPool, KeyPoolConfig};
use shortl::application::services::{DecodeService, EncodeService};
use shortl::api::routes::routes;
use shortl::domain::key::MIN_KEY;
use shortl::domain::repositories::{LinkRepository, SequenceSource};
use shortl::domain::{Link, LinkKey};
use shortl::error::AppError;
use shortl::infrastructure::LinkStore;
use shortl::infrastructure::cache::NullCache;

/// Keeps links in a map keyed by link key.
pub struct InMemoryLinkRepository {
    links: Mutex<HashMap<i64, (String, String)>>,
}

impl InMemoryLinkRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            links: Mutex::new(HashMap::new()),
        })
    }

    pub fn len(&self) -> usize {
        self.links.lock().unwrap().len()
    }
}

#[async_trait]
impl LinkRepository for InMemoryLinkRepository {
    async fn find_url_by_key(&self, key: LinkKey) -> Result<Option<String>, AppError> {
        Ok(self
            .links
            .lock()
            .unwrap()
            .get(&key.value())
            .map(|(_, url)| url.clone()))
    }

    async fn insert_many(&self, links: &[Link]) -> Result<(), AppError> {
        let mut map = self.links.lock().unwrap();
        for link in links {
            map.insert(
                link.key().value(),
                (
                    link.slug().as_str().to_string(),
                    link.destination().as_str().to_string(),
                ),
            );
        }
        Ok(())
    }
}

/// Hands out sequential keys starting at the bottom of the valid range.
pub struct FakeSequenceSource {
    next: AtomicI64,
}

impl FakeSequenceSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next: AtomicI64::new(MIN_KEY),
        })
    }
}

#[async_trait]
impl SequenceSource for FakeSequenceSource {
    async fn next_n(&self, n: usize) -> Result<Vec<i64>, AppError> {
        let start = self.next.fetch_add(n as i64, Ordering::SeqCst);
        Ok((start..start + n as i64).collect())
    }
}

/// The application with its background tasks, plus handles to drive them.
pub struct TestApp {
    pub server: TestServer,
    pub repository: Arc<InMemoryLinkRepository>,
    shutdown: CancellationToken,
    batcher: Option<JoinHandle<()>>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::spawn_with(BatcherConfig {
            batch_size: 8,
            concurrency: 2,
            flush_interval: Duration::from_millis(25),
            flush_timeout: Duration::from_secs(5),
        })
    }

    pub fn spawn_with(batcher_config: BatcherConfig) -> Self {
        let repository = InMemoryLinkRepository::new();
        let store = Arc::new(LinkStore::new(repository.clone(), Arc::new(NullCache::new())));
        let shutdown = CancellationToken::new();

        let (key_pool, _pool_errors, _refill) = KeyPool::spawn(
            FakeSequenceSource::new(),
            KeyPoolConfig {
                capacity: 64,
                target_rate: 100_000,
                issue_timeout: Duration::from_millis(200),
            },
            shutdown.clone(),
        );

        let (event_tx, event_rx) = mpsc::channel(1024);
        let (_flush_errors, batcher) =
            spawn_flush_workers(store.clone(), event_rx, batcher_config, shutdown.clone());

        let state = AppState {
            encode_service: Arc::new(EncodeService::new(Arc::new(key_pool), event_tx)),
            decode_service: Arc::new(DecodeService::new(store)),
        };

        let server = TestServer::new(routes().with_state(state)).unwrap();

        Self {
            server,
            repository,
            shutdown,
            batcher: Some(batcher),
        }
    }

    /// Cancels the background tasks and waits for the batcher to flush
    /// whatever it holds.
    pub async fn drain(&mut self) {
        self.shutdown.cancel();
        if let Some(batcher) = self.batcher.take() {
            batcher.await.unwrap();
        }
    }

    /// Waits until the repository holds `count` links.
    pub async fn wait_for_persisted(&self, count: usize) {
        for _ in 0..200 {
            if self.repository.len() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} persisted links, found {}",
            count,
            self.repository.len()
        );
    }
}
