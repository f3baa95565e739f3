//! Pool of pre-claimed unique keys.
//!
//! The authoritative counter lives in Postgres, which is slow relative to the
//! request path, so keys are claimed ahead of demand: a background refill
//! loop tops a bounded buffer up to capacity on a fixed tick, and
//! [`KeyPool::issue`] hands keys out of the buffer with a bounded wait.
//!
//! Refill failures are fatal to the pool. The loop surfaces the error on a
//! dedicated channel and closes the buffer, so once the remaining keys drain
//! every subsequent `issue` call fails deterministically instead of stalling.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::LinkKey;
use crate::domain::repositories::SequenceSource;

#[derive(Debug, Clone)]
pub struct KeyPoolConfig {
    /// Fixed size of the key buffer.
    pub capacity: usize,
    /// Sustained issuance rate (keys per second) the buffer is sized for.
    pub target_rate: u64,
    /// Bounded wait for a buffered key in [`KeyPool::issue`].
    pub issue_timeout: Duration,
}

impl KeyPoolConfig {
    /// Tick period keeping the buffer near capacity at the target rate.
    fn refill_interval(&self) -> Duration {
        Duration::from_millis(((self.capacity as u64 * 1000) / self.target_rate.max(1)).max(1))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KeyPoolError {
    #[error("no key became available within {waited:?}")]
    Timeout { waited: Duration },

    #[error("key pool stopped: {reason}")]
    Stopped { reason: String },

    #[error("key refill failed: {reason}")]
    Refill { reason: String },
}

/// Hands out unique, never-before-issued keys with minimal latency.
///
/// The buffer is single-producer (the refill loop) / multi-consumer (request
/// handlers); consumers share the receiving side behind an async mutex.
pub struct KeyPool {
    buffer: Arc<Mutex<mpsc::Receiver<LinkKey>>>,
    failure: Arc<OnceLock<String>>,
    issue_timeout: Duration,
}

impl KeyPool {
    /// Starts the refill loop and returns the pool, the fatal-error channel
    /// and the loop's join handle.
    pub fn spawn(
        source: Arc<dyn SequenceSource>,
        config: KeyPoolConfig,
        shutdown: CancellationToken,
    ) -> (Self, mpsc::Receiver<KeyPoolError>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.capacity);
        let (err_tx, err_rx) = mpsc::channel(1);
        let failure = Arc::new(OnceLock::new());

        let interval = config.refill_interval();
        info!(
            capacity = config.capacity,
            target_rate = config.target_rate,
            refill_interval_ms = interval.as_millis() as u64,
            "Key pool started"
        );

        let handle = tokio::spawn(refill_loop(
            source,
            tx,
            failure.clone(),
            err_tx,
            interval,
            shutdown,
        ));

        (
            Self {
                buffer: Arc::new(Mutex::new(rx)),
                failure,
                issue_timeout: config.issue_timeout,
            },
            err_rx,
            handle,
        )
    }

    /// Takes one key out of the buffer.
    ///
    /// Waits up to the configured issue timeout. A key is only removed from
    /// the buffer when it is actually handed out, so a timed-out call loses
    /// nothing. Once the refill loop has failed and the buffer is drained,
    /// every call returns [`KeyPoolError::Stopped`].
    pub async fn issue(&self) -> Result<LinkKey, KeyPoolError> {
        let recv = async {
            let mut buffer = self.buffer.lock().await;
            buffer.recv().await
        };

        match timeout(self.issue_timeout, recv).await {
            Ok(Some(key)) => Ok(key),
            Ok(None) => Err(KeyPoolError::Stopped {
                reason: self
                    .failure
                    .get()
                    .cloned()
                    .unwrap_or_else(|| "refill loop exited".to_string()),
            }),
            Err(_) => Err(KeyPoolError::Timeout {
                waited: self.issue_timeout,
            }),
        }
    }
}

async fn refill_loop(
    source: Arc<dyn SequenceSource>,
    tx: mpsc::Sender<LinkKey>,
    failure: Arc<OnceLock<String>>,
    err_tx: mpsc::Sender<KeyPoolError>,
    interval: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let fail = |reason: String| {
        error!(reason = %reason, "Key pool refill loop terminating");
        let _ = failure.set(reason.clone());
        let _ = err_tx.try_send(KeyPoolError::Refill { reason });
    };

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Key pool refill loop cancelled");
                let _ = failure.set("shutdown requested".to_string());
                return;
            }
            _ = ticker.tick() => {
                // Sender capacity is the number of free slots in the buffer.
                let free = tx.capacity();
                if free == 0 {
                    continue;
                }

                let batch = match source.next_n(free).await {
                    Ok(batch) => batch,
                    Err(e) => {
                        fail(format!("sequence source: {e}"));
                        return;
                    }
                };

                // A short count violates the sequence contract; masking it
                // would hand out keys that were never claimed.
                if batch.len() != free {
                    fail(format!(
                        "sequence source returned {} values, expected {free}",
                        batch.len()
                    ));
                    return;
                }

                let mut keys = Vec::with_capacity(free);
                for value in batch {
                    match LinkKey::new(value) {
                        Ok(key) => keys.push(key),
                        Err(e) => {
                            fail(format!("sequence value rejected: {e}"));
                            return;
                        }
                    }
                }

                debug!(count = keys.len(), "Refilled key buffer");
                for key in keys {
                    if tx.send(key).await.is_err() {
                        return;
                    }
                }
                ticker.reset();
            }
        }
    }
}
