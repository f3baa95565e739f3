//! Write-behind persistence of created links.
//!
//! A configurable number of workers drain one shared bounded channel of
//! [`LinkCreatedEvent`]s. Each worker accumulates a local batch and flushes
//! it when the batch reaches the size threshold, when the flush timer fires,
//! or on drain (channel closed or shutdown cancelled). A cancelled worker
//! first empties what is still queued in the input channel; an accepted
//! event is never abandoned by a clean shutdown. Within a worker,
//! events are flushed in receipt order; no ordering holds across workers.
//!
//! Flush failures are pushed to a bounded error channel with `try_send`; a
//! full channel drops the error with only a log line and a counter. The
//! batcher must never block on error reporting, since that would stall
//! draining and back the encode path up. Failed batches are not retried and
//! their events leave the persistence path.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use tokio::sync::{Mutex, mpsc};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::{Link, LinkCreatedEvent};
use crate::error::AppError;

/// Flush target of the batcher, implemented by the link store.
#[async_trait]
pub trait LinkSink: Send + Sync {
    /// Persists a whole batch; partial failure counts as whole-batch failure.
    async fn save_many(&self, links: &[Link]) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct BatcherConfig {
    /// Flush as soon as a worker's local batch reaches this size.
    pub batch_size: usize,
    /// Number of workers sharing the input channel.
    pub concurrency: usize,
    /// Flush a non-empty batch at least this often.
    pub flush_interval: Duration,
    /// Upper bound on a single `save_many` call.
    pub flush_timeout: Duration,
}

/// A batch that could not be persisted. Its events are lost.
#[derive(Debug, thiserror::Error)]
#[error("failed to flush batch of {count} links: {reason}")]
pub struct FlushError {
    pub count: usize,
    pub reason: String,
}

/// Spawns the flush workers and their governor.
///
/// The governor waits for every worker to exit before the error channel
/// closes, so all in-flight flush errors are observable before shutdown is
/// reported complete. The returned handle resolves when all workers are done.
pub fn spawn_flush_workers(
    sink: Arc<dyn LinkSink>,
    events: mpsc::Receiver<LinkCreatedEvent>,
    config: BatcherConfig,
    shutdown: CancellationToken,
) -> (mpsc::Receiver<FlushError>, JoinHandle<()>) {
    let (err_tx, err_rx) = mpsc::channel(config.concurrency + 1);
    let events = Arc::new(Mutex::new(events));

    let mut workers = JoinSet::new();
    for worker in 0..config.concurrency {
        workers.spawn(worker_loop(
            worker,
            events.clone(),
            sink.clone(),
            config.clone(),
            shutdown.clone(),
            err_tx.clone(),
        ));
    }
    drop(err_tx);

    let governor = tokio::spawn(async move {
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Batch worker panicked");
            }
        }
        info!("All batch workers stopped");
    });

    (err_rx, governor)
}

async fn worker_loop(
    worker: usize,
    events: Arc<Mutex<mpsc::Receiver<LinkCreatedEvent>>>,
    sink: Arc<dyn LinkSink>,
    config: BatcherConfig,
    shutdown: CancellationToken,
    err_tx: mpsc::Sender<FlushError>,
) {
    let mut ticker = time::interval(config.flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut batch: Vec<LinkCreatedEvent> = Vec::with_capacity(config.batch_size);

    loop {
        tokio::select! {
            event = recv_shared(&events) => match event {
                Some(event) => {
                    batch.push(event);
                    if batch.len() >= config.batch_size {
                        flush(worker, &sink, &mut batch, &config, &err_tx).await;
                        ticker.reset();
                    }
                }
                None => {
                    if !batch.is_empty() {
                        info!(worker, "Input channel closed, flushing remaining batch");
                        flush(worker, &sink, &mut batch, &config, &err_tx).await;
                    }
                    debug!(worker, "Batch worker shut down");
                    return;
                }
            },
            _ = ticker.tick() => {
                if !batch.is_empty() {
                    flush(worker, &sink, &mut batch, &config, &err_tx).await;
                }
            }
            _ = shutdown.cancelled() => {
                info!(worker, "Cancelled, draining queued events before shutdown");
                drain_queued(worker, &events, &sink, &mut batch, &config, &err_tx).await;
                debug!(worker, "Batch worker shut down");
                return;
            }
        }
    }
}

/// Empties whatever is still sitting in the input channel at shutdown and
/// flushes it along with the local batch. Events accepted before the
/// cancellation must reach the store even though no more are coming.
async fn drain_queued(
    worker: usize,
    events: &Arc<Mutex<mpsc::Receiver<LinkCreatedEvent>>>,
    sink: &Arc<dyn LinkSink>,
    batch: &mut Vec<LinkCreatedEvent>,
    config: &BatcherConfig,
    err_tx: &mpsc::Sender<FlushError>,
) {
    loop {
        let queued = {
            let mut events = events.lock().await;
            events.try_recv()
        };
        match queued {
            Ok(event) => {
                batch.push(event);
                if batch.len() >= config.batch_size {
                    flush(worker, sink, batch, config, err_tx).await;
                }
            }
            Err(_) => break,
        }
    }

    if !batch.is_empty() {
        flush(worker, sink, batch, config, err_tx).await;
    }
}

/// `recv` on the shared receiver; cancel-safe, so an event is never lost
/// when another select branch wins.
async fn recv_shared(
    events: &Arc<Mutex<mpsc::Receiver<LinkCreatedEvent>>>,
) -> Option<LinkCreatedEvent> {
    let mut events = events.lock().await;
    events.recv().await
}

async fn flush(
    worker: usize,
    sink: &Arc<dyn LinkSink>,
    batch: &mut Vec<LinkCreatedEvent>,
    config: &BatcherConfig,
    err_tx: &mpsc::Sender<FlushError>,
) {
    let links: Vec<Link> = batch.drain(..).map(|event| event.link).collect();
    let count = links.len();

    let outcome = match timeout(config.flush_timeout, sink.save_many(&links)).await {
        Ok(Ok(())) => {
            counter!("links_flushed_total").increment(count as u64);
            debug!(worker, count, "Flushed batch");
            return;
        }
        Ok(Err(e)) => e.to_string(),
        Err(_) => format!("flush timed out after {:?}", config.flush_timeout),
    };

    counter!("link_flush_failures_total").increment(1);
    error!(worker, count, reason = %outcome, "Failed to flush batch");

    let flush_error = FlushError {
        count,
        reason: outcome,
    };
    if err_tx.try_send(flush_error).is_err() {
        counter!("link_flush_errors_dropped_total").increment(1);
        error!(worker, "Flush error channel full, error discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::key::MIN_KEY;
    use crate::domain::{DestinationUrl, LinkHost, LinkKey};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingSink {
        batches: std::sync::Mutex<Vec<Vec<Link>>>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                batches: std::sync::Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                fail,
            })
        }

        fn saved_keys(&self) -> Vec<LinkKey> {
            self.batches
                .lock()
                .unwrap()
                .iter()
                .flatten()
                .map(Link::key)
                .collect()
        }
    }

    #[async_trait]
    impl LinkSink for RecordingSink {
        async fn save_many(&self, links: &[Link]) -> Result<(), AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::infrastructure("store down", json!({})));
            }
            self.batches.lock().unwrap().push(links.to_vec());
            Ok(())
        }
    }

    fn event(offset: i64) -> LinkCreatedEvent {
        let link = Link::new(
            LinkKey::new(MIN_KEY + offset).unwrap(),
            LinkHost::Standard,
            DestinationUrl::parse(&format!("https://example.com/{offset}")).unwrap(),
        )
        .unwrap();
        LinkCreatedEvent::new(link)
    }

    fn config(batch_size: usize, concurrency: usize) -> BatcherConfig {
        BatcherConfig {
            batch_size,
            concurrency,
            flush_interval: Duration::from_millis(100),
            flush_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_events_flushed_exactly_once_on_channel_close() {
        let sink = RecordingSink::new(false);
        let (tx, rx) = mpsc::channel(64);
        let (_errors, governor) = spawn_flush_workers(
            sink.clone(),
            rx,
            config(10, 2),
            CancellationToken::new(),
        );

        for i in 0..25 {
            tx.send(event(i)).await.unwrap();
        }
        drop(tx);
        governor.await.unwrap();

        let keys = sink.saved_keys();
        assert_eq!(keys.len(), 25);
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), 25, "an event was flushed twice");
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_by_timer_with_partial_batch() {
        let sink = RecordingSink::new(false);
        let (tx, rx) = mpsc::channel(64);
        let (_errors, _governor) = spawn_flush_workers(
            sink.clone(),
            rx,
            config(100, 1),
            CancellationToken::new(),
        );

        for i in 0..3 {
            tx.send(event(i)).await.unwrap();
        }

        for _ in 0..100 {
            if sink.saved_keys().len() == 3 {
                return;
            }
            time::sleep(Duration::from_millis(20)).await;
        }
        panic!("timer flush never happened");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_flushes_partial_batch_once() {
        let sink = RecordingSink::new(false);
        let (tx, rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let (_errors, governor) =
            spawn_flush_workers(sink.clone(), rx, config(100, 2), shutdown.clone());

        for i in 0..5 {
            tx.send(event(i)).await.unwrap();
        }
        // Let workers pick the events up before cancelling.
        time::sleep(Duration::from_millis(10)).await;

        shutdown.cancel();
        governor.await.unwrap();

        let keys = sink.saved_keys();
        assert_eq!(keys.len(), 5);
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_drains_events_still_queued_in_channel() {
        let sink = RecordingSink::new(false);
        let (tx, rx) = mpsc::channel(64);
        let shutdown = CancellationToken::new();
        let (_errors, governor) =
            spawn_flush_workers(sink.clone(), rx, config(10, 2), shutdown.clone());

        // Cancel immediately after sending, while the sender stays alive:
        // most events are still sitting in the channel, not in any worker's
        // local batch.
        for i in 0..37 {
            tx.send(event(i)).await.unwrap();
        }
        shutdown.cancel();
        governor.await.unwrap();

        let keys = sink.saved_keys();
        assert_eq!(keys.len(), 37);
        let unique: HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), 37, "an event was flushed twice");
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_failures_never_block_draining() {
        let sink = RecordingSink::new(true);
        let (tx, rx) = mpsc::channel(64);
        let (mut errors, governor) = spawn_flush_workers(
            sink.clone(),
            rx,
            config(1, 1),
            CancellationToken::new(),
        );

        // Five failing batches against an error channel with capacity two:
        // overflow is dropped, draining continues.
        for i in 0..5 {
            tx.send(event(i)).await.unwrap();
        }
        drop(tx);
        governor.await.unwrap();

        assert_eq!(sink.calls.load(Ordering::SeqCst), 5);

        let mut reported = 0;
        while let Some(err) = errors.recv().await {
            assert_eq!(err.count, 1);
            reported += 1;
        }
        assert!(reported >= 1);
        assert!(reported <= 2, "error channel capacity exceeded");
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_channel_closes_after_workers_exit() {
        let sink = RecordingSink::new(false);
        let (tx, rx) = mpsc::channel(8);
        let (mut errors, governor) = spawn_flush_workers(
            sink,
            rx,
            config(10, 3),
            CancellationToken::new(),
        );

        drop(tx);
        governor.await.unwrap();
        assert!(errors.recv().await.is_none());
    }
}
