//! Fixed-size pool of executors performing Data API fetches.
//!
//! Jobs enter through a bounded intake queue shared by all executors and
//! leave as [`Completion`]s on the output channel handed to [`WorkerPool::spawn`].

use crate::config::WorkerConfig;
use crate::dispatch::DispatchKey;
use crate::errors::FetchError;
use crate::metrics_defs::UPSTREAM_FETCH_DURATION;
use performance_client::{DataApi, DataResponse, DataSource};
use shared::histogram;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout};

/// Outcome of one upstream fetch, shared by every waiter of its key.
pub type FetchResult = Result<Arc<DataResponse>, FetchError>;

#[derive(Debug)]
pub struct Job {
    pub key: DispatchKey,
    pub source: DataSource,
}

#[derive(Debug)]
pub struct Completion {
    pub key: DispatchKey,
    pub result: FetchResult,
}

#[derive(thiserror::Error, Debug)]
pub enum DispatchError {
    #[error("worker queue is full")]
    Full(Job),
    #[error("worker pool has shut down")]
    Closed(Job),
}

impl From<DispatchError> for FetchError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Full(_) => FetchError::Overloaded,
            DispatchError::Closed(_) => FetchError::Unavailable,
        }
    }
}

pub struct WorkerPool {
    intake: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `config.size` executors. Must be called from within a tokio runtime.
    pub fn spawn(
        config: &WorkerConfig,
        data_api: Arc<dyn DataApi>,
        completions: mpsc::Sender<Completion>,
    ) -> Self {
        let (intake, intake_rx) = mpsc::channel::<Job>(config.queue_capacity);
        let intake_rx = Arc::new(Mutex::new(intake_rx));
        let job_timeout = config.job_timeout();

        let workers = (0..config.size)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    intake_rx.clone(),
                    data_api.clone(),
                    completions.clone(),
                    job_timeout,
                ))
            })
            .collect();

        WorkerPool { intake, workers }
    }

    /// Queues a job without waiting. Fails when the intake queue is full.
    pub fn try_dispatch(&self, job: Job) -> Result<(), DispatchError> {
        self.intake.try_send(job).map_err(|e| match e {
            TrySendError::Full(job) => DispatchError::Full(job),
            TrySendError::Closed(job) => DispatchError::Closed(job),
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Closes the intake and waits for executors to finish their current job.
    pub async fn shutdown(self) {
        drop(self.intake);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::error!("Worker panicked: {}", e);
            }
        }
    }
}

async fn run_worker(
    id: usize,
    intake: Arc<Mutex<mpsc::Receiver<Job>>>,
    data_api: Arc<dyn DataApi>,
    completions: mpsc::Sender<Completion>,
    job_timeout: Duration,
) {
    loop {
        // The lock is only held while waiting for the next job
        let next = intake.lock().await.recv().await;
        let Some(Job { key, source }) = next else {
            break;
        };

        let result = execute(data_api.clone(), source, job_timeout).await;

        if completions.send(Completion { key, result }).await.is_err() {
            break;
        }
    }

    tracing::debug!(worker = id, "Worker stopped");
}

/// Runs one fetch in its own task so a timeout can abort it and a panic
/// cannot take the executor down.
async fn execute(
    data_api: Arc<dyn DataApi>,
    source: DataSource,
    job_timeout: Duration,
) -> FetchResult {
    let started = Instant::now();
    let mut task = tokio::spawn(async move { data_api.fetch(&source).await });

    let result = match timeout(job_timeout, &mut task).await {
        Ok(Ok(Ok(response))) => Ok(Arc::new(response)),
        Ok(Ok(Err(e))) => Err(FetchError::from(e)),
        Ok(Err(join_error)) => Err(FetchError::Internal(format!(
            "fetch task failed: {join_error}"
        ))),
        Err(_) => {
            task.abort();
            Err(FetchError::Timeout(job_timeout))
        }
    };

    histogram!(UPSTREAM_FETCH_DURATION).record(started.elapsed().as_secs_f64());
    result
}
