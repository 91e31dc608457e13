use crate::coalescer::{Coalescer, CoalescerStats};
use crate::normalize::Clock;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use http::StatusCode;
use performance_client::{
    ClientError, ConfigApi, DataApi, DataResponse, DataSource, Dashboard, Dashboards, QueryParams,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;

const OPEN_GATE: usize = 1024;

pub fn source(data_group: &str, data_type: &str) -> DataSource {
    DataSource::new(data_group, data_type, QueryParams::default())
}

pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        FixedClock(Utc.with_ymd_and_hms(2014, 6, 20, 12, 0, 0).unwrap())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// How the mock answers queries for a given data type.
#[derive(Clone, Debug)]
pub enum Behavior {
    Respond(serde_json::Value),
    Fail(String),
    Hang,
    Panic,
}

/// Data API double that records calls and concurrency. A gated mock holds
/// every fetch until [`MockDataApi::release`] is called.
pub struct MockDataApi {
    behaviors: HashMap<String, Behavior>,
    delay: Duration,
    gate: Semaphore,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockDataApi {
    pub fn new() -> Self {
        Self::with_permits(OPEN_GATE)
    }

    pub fn gated() -> Self {
        Self::with_permits(0)
    }

    fn with_permits(permits: usize) -> Self {
        MockDataApi {
            behaviors: HashMap::new(),
            delay: Duration::ZERO,
            gate: Semaphore::new(permits),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with_behavior(mut self, data_type: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(data_type.to_string(), behavior);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn release(&self) {
        self.gate.add_permits(OPEN_GATE);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Canonical paths of every fetch, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    pub async fn wait_for_calls(&self, calls: usize) {
        wait_until(|| self.calls() >= calls).await;
    }

    pub async fn wait_for_in_flight(&self, in_flight: usize) {
        wait_until(|| self.in_flight() == in_flight).await;
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DataApi for MockDataApi {
    async fn fetch(&self, source: &DataSource) -> Result<DataResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap()
            .push(source.canonical_path());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        let _permit = self.gate.acquire().await.expect("gate is never closed");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self
            .behaviors
            .get(&source.data_type)
            .cloned()
            .unwrap_or_else(|| {
                Behavior::Respond(serde_json::json!({"data_type": source.data_type}))
            });

        match behavior {
            Behavior::Respond(data) => Ok(DataResponse {
                data,
                ..Default::default()
            }),
            Behavior::Fail(message) => Err(ClientError::Upstream { message }),
            Behavior::Hang => std::future::pending().await,
            Behavior::Panic => panic!("mock fetch panicked for {}", source.data_type),
        }
    }
}

/// Config API double serving a fixed set of dashboards.
pub struct MockConfigApi {
    dashboards: Vec<Dashboard>,
    available: bool,
}

impl MockConfigApi {
    pub fn new(dashboards: Vec<Dashboard>) -> Self {
        MockConfigApi {
            dashboards,
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        MockConfigApi {
            dashboards: Vec::new(),
            available: false,
        }
    }
}

#[async_trait]
impl ConfigApi for MockConfigApi {
    async fn fetch(&self, slug: &str) -> Result<Dashboard, ClientError> {
        if !self.available {
            return Err(ClientError::Status(StatusCode::SERVICE_UNAVAILABLE));
        }
        self.dashboards
            .iter()
            .find(|d| d.slug == slug)
            .cloned()
            .ok_or(ClientError::Status(StatusCode::NOT_FOUND))
    }

    async fn fetch_all(&self) -> Result<Dashboards, ClientError> {
        if !self.available {
            return Err(ClientError::Status(StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(Dashboards {
            items: self.dashboards.clone(),
        })
    }
}

pub fn dashboard(slug: &str, title: &str, dashboard_type: &str) -> Dashboard {
    Dashboard {
        slug: slug.to_string(),
        title: title.to_string(),
        dashboard_type: dashboard_type.to_string(),
        ..Default::default()
    }
}

/// Polls the coordinator until `predicate` holds for its stats.
pub async fn wait_for_stats(coalescer: &Coalescer, predicate: impl Fn(&CoalescerStats) -> bool) {
    for _ in 0..200 {
        if let Some(stats) = coalescer.stats().await
            && predicate(&stats)
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("coalescer never reached the expected state");
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
