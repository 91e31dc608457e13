use crate::coalescer::Coalescer;
use crate::dispatch::DispatchKey;
use crate::metrics_defs::FETCH_FAILURES;
use performance_client::{DataResponse, DataSource};
use shared::counter;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Gathers the data for one page render, tolerating partial failure.
#[derive(Clone)]
pub struct Aggregator {
    coalescer: Coalescer,
}

impl Aggregator {
    pub fn new(coalescer: Coalescer) -> Self {
        Aggregator { coalescer }
    }

    pub fn coalescer(&self) -> &Coalescer {
        &self.coalescer
    }

    /// Submits every source and returns the payloads that succeeded, in
    /// completion order. Failed sources are logged and left out.
    pub async fn aggregate(&self, sources: Vec<DataSource>) -> Vec<Arc<DataResponse>> {
        if sources.is_empty() {
            return Vec::new();
        }

        let mut join_set = JoinSet::new();
        for source in sources {
            let coalescer = self.coalescer.clone();
            let key = DispatchKey::new(&source);
            join_set.spawn(async move { (key, coalescer.submit(source).await) });
        }

        let mut responses = Vec::with_capacity(join_set.len());
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((_, Ok(response))) => responses.push(response),
                Ok((key, Err(e))) => {
                    tracing::warn!(%key, kind = e.kind(), "Dropping data source: {}", e);
                    counter!(FETCH_FAILURES, "kind" => e.kind()).increment(1);
                }
                Err(e) => tracing::error!("Gather task panicked: {}", e),
            }
        }

        responses
    }
}
