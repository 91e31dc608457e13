use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response of the Config API listing endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Dashboards {
    #[serde(rename = "Items", default)]
    pub items: Vec<Dashboard>,
}

/// Metadata and module tree for one dashboard page.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Dashboard {
    pub department: Organisation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency: Option<Organisation>,
    #[serde(rename = "dashboard-type")]
    pub dashboard_type: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub modules: Vec<Module>,
    pub published: bool,
    #[serde(rename = "page-type")]
    pub page_type: String,
    pub costs: String,
}

impl Dashboard {
    /// Data sources that have to be fetched to render this dashboard.
    ///
    /// A module with tabs contributes one source per tab and its own source is
    /// ignored. Modules and tabs without a source contribute nothing.
    pub fn data_sources(&self) -> Vec<DataSource> {
        let mut sources = Vec::new();

        for module in &self.modules {
            if module.tabs.is_empty() {
                sources.extend(module.data_source.iter().cloned());
            } else {
                sources.extend(module.tabs.iter().filter_map(|t| t.data_source.clone()));
            }
        }

        sources
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Organisation {
    #[serde(rename = "abbr")]
    pub abbreviation: String,
    pub title: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Module {
    pub info: Vec<String>,
    #[serde(rename = "data-source", skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
    pub tabs: Vec<Tab>,
    pub title: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Tab {
    pub description: String,
    #[serde(rename = "data-source", skip_serializing_if = "Option::is_none")]
    pub data_source: Option<DataSource>,
}

/// One analytics query against the Data API.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DataSource {
    #[serde(rename = "data-group")]
    pub data_group: String,
    #[serde(rename = "data-type")]
    pub data_type: String,
    #[serde(rename = "query-params")]
    pub query_params: QueryParams,
}

impl DataSource {
    pub fn new(
        data_group: impl Into<String>,
        data_type: impl Into<String>,
        query_params: QueryParams,
    ) -> Self {
        DataSource {
            data_group: data_group.into(),
            data_type: data_type.into(),
            query_params,
        }
    }
}

/// Query parameters of a data source. Empty and zero values mean "not set".
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryParams {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filter_by: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collect: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Body returned by the Data API for a query.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DataResponse {
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DataResponse {
    pub fn is_error(&self) -> bool {
        self.status.as_deref() == Some("error")
    }
}
