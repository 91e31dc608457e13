//! Collapses concurrent requests for the same data source into a single
//! upstream fetch.
//!
//! The pending map is owned by one coordinator task. Callers talk to it over a
//! bounded channel and wait on a oneshot; the coordinator only ever awaits its
//! inbound channels, so it cannot deadlock with the worker pool.

use crate::config::WorkerConfig;
use crate::dispatch::DispatchKey;
use crate::errors::FetchError;
use crate::metrics_defs::{
    COALESCED_SUBMISSIONS, PENDING_KEYS, REJECTED_DISPATCHES, UPSTREAM_FETCHES,
};
use crate::normalize::{Clock, normalize_source};
use crate::worker_pool::{Completion, DispatchError, FetchResult, Job, WorkerPool};
use performance_client::{DataApi, DataSource};
use shared::{counter, gauge};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    /// Keys with a fetch in flight
    pub pending_keys: usize,
    /// Callers waiting on those fetches
    pub waiters: usize,
}

enum Message {
    Submit {
        key: DispatchKey,
        source: DataSource,
        waiter: oneshot::Sender<FetchResult>,
    },
    Stats(oneshot::Sender<CoalescerStats>),
}

struct CoalescerInner {
    tx: mpsc::Sender<Message>,
    clock: Arc<dyn Clock>,
}

/// Handle to the coordinator. Cheap to clone; the coordinator and its worker
/// pool stop once every handle is dropped.
#[derive(Clone)]
pub struct Coalescer {
    inner: Arc<CoalescerInner>,
}

impl Coalescer {
    /// Starts the coordinator and its worker pool. Must be called from within
    /// a tokio runtime.
    pub fn new(data_api: Arc<dyn DataApi>, clock: Arc<dyn Clock>, workers: &WorkerConfig) -> Self {
        let (tx, rx) = mpsc::channel::<Message>(workers.queue_capacity);
        let (completions_tx, completions_rx) = mpsc::channel::<Completion>(workers.queue_capacity);

        let pool = WorkerPool::spawn(workers, data_api, completions_tx);
        tracing::info!(
            workers = pool.size(),
            queue_capacity = workers.queue_capacity,
            "Starting fetch coordinator"
        );

        let coordinator = Coordinator {
            pending: HashMap::new(),
            pool,
        };
        tokio::spawn(coordinator.run(rx, completions_rx));

        Coalescer {
            inner: Arc::new(CoalescerInner { tx, clock }),
        }
    }

    /// Fetches `source`, sharing the upstream call with any identical request
    /// already in flight.
    pub async fn submit(&self, source: DataSource) -> FetchResult {
        let source = normalize_source(source, self.inner.clock.now())?;
        let key = DispatchKey::new(&source);

        let (waiter, rx) = oneshot::channel();
        self.inner
            .tx
            .send(Message::Submit {
                key,
                source,
                waiter,
            })
            .await
            .map_err(|_| FetchError::Unavailable)?;

        rx.await.unwrap_or(Err(FetchError::Unavailable))
    }

    /// Snapshot of the pending map, or `None` if the coordinator has stopped.
    pub async fn stats(&self) -> Option<CoalescerStats> {
        let (tx, rx) = oneshot::channel();
        self.inner.tx.send(Message::Stats(tx)).await.ok()?;
        rx.await.ok()
    }

    pub fn is_running(&self) -> bool {
        !self.inner.tx.is_closed()
    }
}

struct PendingEntry {
    waiters: Vec<oneshot::Sender<FetchResult>>,
    dispatched_at: Instant,
}

struct Coordinator {
    pending: HashMap<DispatchKey, PendingEntry>,
    pool: WorkerPool,
}

impl Coordinator {
    async fn run(
        mut self,
        mut messages: mpsc::Receiver<Message>,
        mut completions: mpsc::Receiver<Completion>,
    ) {
        loop {
            tokio::select! {
                biased;
                Some(completion) = completions.recv() => self.on_completion(completion),
                message = messages.recv() => match message {
                    Some(Message::Submit { key, source, waiter }) => {
                        self.on_submit(key, source, waiter)
                    }
                    Some(Message::Stats(reply)) => {
                        let _ = reply.send(self.stats());
                    }
                    None => break,
                },
            }
        }

        tracing::info!(
            pending_keys = self.pending.len(),
            "Fetch coordinator stopping"
        );
        // Executors blocked on a full completion channel must see it closed
        drop(completions);
        self.pool.shutdown().await;
    }

    fn on_submit(
        &mut self,
        key: DispatchKey,
        source: DataSource,
        waiter: oneshot::Sender<FetchResult>,
    ) {
        match self.pending.entry(key) {
            Entry::Occupied(mut entry) => {
                tracing::debug!(key = %entry.key(), "Joining in-flight fetch");
                counter!(COALESCED_SUBMISSIONS).increment(1);
                entry.get_mut().waiters.push(waiter);
            }
            Entry::Vacant(entry) => {
                let job = Job {
                    key: entry.key().clone(),
                    source,
                };
                match self.pool.try_dispatch(job) {
                    Ok(()) => {
                        tracing::debug!(key = %entry.key(), "Dispatched fetch");
                        counter!(UPSTREAM_FETCHES).increment(1);
                        entry.insert(PendingEntry {
                            waiters: vec![waiter],
                            dispatched_at: Instant::now(),
                        });
                    }
                    Err(e) => {
                        if matches!(e, DispatchError::Full(_)) {
                            counter!(REJECTED_DISPATCHES).increment(1);
                        }
                        tracing::warn!(key = %entry.key(), "Could not dispatch fetch: {}", e);
                        let _ = waiter.send(Err(FetchError::from(e)));
                    }
                }
            }
        }

        gauge!(PENDING_KEYS).set(self.pending.len() as f64);
    }

    fn on_completion(&mut self, completion: Completion) {
        let Completion { key, result } = completion;

        let Some(entry) = self.pending.remove(&key) else {
            tracing::error!(%key, "Completion for a key with no pending fetch");
            return;
        };

        tracing::debug!(
            %key,
            waiters = entry.waiters.len(),
            elapsed_ms = entry.dispatched_at.elapsed().as_millis() as u64,
            "Fetch completed"
        );

        for waiter in entry.waiters {
            // The caller may have gone away
            let _ = waiter.send(result.clone());
        }

        gauge!(PENDING_KEYS).set(self.pending.len() as f64);
    }

    fn stats(&self) -> CoalescerStats {
        CoalescerStats {
            pending_keys: self.pending.len(),
            waiters: self.pending.values().map(|e| e.waiters.len()).sum(),
        }
    }
}
