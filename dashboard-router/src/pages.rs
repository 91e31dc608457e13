use performance_client::{DataResponse, Dashboard};
use serde::Serialize;

pub const ASSET_PATH: &str = "/assets/";

/// A dashboard together with the data of every source that could be fetched.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPage<'a> {
    pub asset_path: &'static str,
    pub dashboard: &'a Dashboard,
    pub data: Vec<&'a DataResponse>,
}

impl<'a> DashboardPage<'a> {
    pub fn new(dashboard: &'a Dashboard, data: &'a [std::sync::Arc<DataResponse>]) -> Self {
        DashboardPage {
            asset_path: ASSET_PATH,
            dashboard,
            data: data.iter().map(|d| d.as_ref()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorPage {
    pub error: String,
}
