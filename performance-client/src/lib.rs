//! Clients for the performance platform's Config API (dashboard metadata)
//! and Data API (time-series and aggregate query results).

pub mod config_api;
pub mod data_api;
pub mod errors;
pub mod query;
pub mod types;

#[cfg(test)]
mod testutils;

pub use config_api::{ConfigApi, ConfigClient};
pub use data_api::{DataApi, DataClient};
pub use errors::ClientError;
pub use types::{
    DataResponse, DataSource, Dashboard, Dashboards, Module, Organisation, QueryParams, Tab,
};
