//! Canonical wire encoding of Data API queries.
//!
//! The request path and query string built here double as the identity of a
//! query: two data sources with the same content always encode to the same
//! string, whatever order their fields were populated in.

use crate::types::{DataSource, QueryParams};
use chrono::{DateTime, SecondsFormat, Utc};
use url::form_urlencoded;

impl QueryParams {
    /// Wire pairs, ordered by parameter name. Repeated parameters keep the
    /// order of their list. Unset fields are omitted.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        for value in &self.collect {
            pairs.push(("collect", value.clone()));
        }
        if self.duration != 0 {
            pairs.push(("duration", self.duration.to_string()));
        }
        if let Some(end_at) = &self.end_at {
            pairs.push(("end_at", format_timestamp(end_at)));
        }
        for value in &self.filter_by {
            pairs.push(("filter_by", value.clone()));
        }
        push_non_empty(&mut pairs, "group_by", &self.group_by);
        if self.limit != 0 {
            pairs.push(("limit", self.limit.to_string()));
        }
        push_non_empty(&mut pairs, "period", &self.period);
        push_non_empty(&mut pairs, "sort_by", &self.sort_by);
        if let Some(start_at) = &self.start_at {
            pairs.push(("start_at", format_timestamp(start_at)));
        }

        pairs
    }

    /// Form-urlencoded query string, empty when no field is set.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in self.to_pairs() {
            serializer.append_pair(name, &value);
        }
        serializer.finish()
    }
}

impl DataSource {
    /// Request path and query relative to the Data API base URL,
    /// e.g. `/data/govuk/visitors?duration=9&period=week`.
    pub fn canonical_path(&self) -> String {
        let mut path = format!("/data/{}/{}", self.data_group, self.data_type);

        let query = self.query_params.to_query_string();
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query);
        }

        path
    }
}

fn push_non_empty(
    pairs: &mut Vec<(&'static str, String)>,
    name: &'static str,
    value: &Option<String>,
) {
    if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
        pairs.push((name, value.clone()));
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
