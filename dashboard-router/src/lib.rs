//! Dashboard pages for the performance platform.
//!
//! Every page request fans out into Data API queries. Identical queries that
//! are in flight at the same time are collapsed into one upstream call by the
//! [`Coalescer`], and a fixed pool of workers bounds how many upstream calls
//! run at once.

pub mod aggregator;
pub mod coalescer;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod homepage;
pub mod metrics_defs;
pub mod normalize;
pub mod pages;
pub mod service;
pub mod worker_pool;

#[cfg(test)]
mod testutils;

pub use aggregator::Aggregator;
pub use coalescer::{Coalescer, CoalescerStats};
pub use errors::{DashboardError, FetchError};
pub use service::DashboardService;

use crate::config::Config;
use crate::normalize::SystemClock;
use performance_client::{ConfigClient, DataClient};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use shared::metrics_defs::describe_metrics;
use std::sync::Arc;

pub async fn run(config: Config) -> Result<(), DashboardError> {
    describe_metrics(metrics_defs::ALL_METRICS);

    let config_api = ConfigClient::new(config.config_api.url.clone(), config.config_api.timeout())
        .map_err(DashboardError::Client)?;
    let data_api = DataClient::new(&config.data_api.url, config.data_api.timeout())
        .map_err(DashboardError::Client)?;

    let coalescer = Coalescer::new(Arc::new(data_api), Arc::new(SystemClock), &config.workers);
    let aggregator = Aggregator::new(coalescer.clone());
    let dashboard_service = DashboardService::new(Arc::new(config_api), aggregator);

    let admin_service: AdminService<_, DashboardError> =
        AdminService::new(move || coalescer.is_running());

    let dashboard_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        dashboard_service,
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(dashboard_task, admin_task)?;
    Ok(())
}
