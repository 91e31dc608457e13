//! Groups the published dashboards into the sections of the landing page.

use crate::pages::ASSET_PATH;
use performance_client::Dashboard;
use serde::Serialize;

const SITE_ACTIVITY_SLUG: &str = "site-activity";

#[derive(Debug, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub asset_path: &'static str,
    pub service_count: usize,
    pub first_services: Vec<Dashboard>,
    pub second_services: Vec<Dashboard>,
    pub service_groups: Vec<Dashboard>,
    pub high_volume_services: Vec<Dashboard>,
    pub first_content: Vec<Dashboard>,
    pub second_content: Vec<Dashboard>,
}

impl HomePage {
    /// Sorts dashboards by title and sorts them into buckets by type.
    /// Dashboards of any other type are not listed.
    pub fn build(mut dashboards: Vec<Dashboard>) -> Self {
        dashboards.sort_by(|a, b| a.title.cmp(&b.title));

        let mut services = Vec::new();
        let mut service_groups = Vec::new();
        let mut high_volume_services = Vec::new();
        let mut content = Vec::new();

        for dashboard in dashboards {
            match dashboard.dashboard_type.as_str() {
                "transaction" | "other" => services.push(dashboard),
                "service-group" => service_groups.push(dashboard),
                "high-volume-transaction" => high_volume_services.push(dashboard),
                "content" if dashboard.slug != SITE_ACTIVITY_SLUG => content.push(dashboard),
                _ => {}
            }
        }

        let service_count = services.len();
        let (first_services, second_services) = split_in_half(services);
        let (first_content, second_content) = split_in_half(content);

        HomePage {
            asset_path: ASSET_PATH,
            service_count,
            first_services,
            second_services,
            service_groups,
            high_volume_services,
            first_content,
            second_content,
        }
    }
}

/// Two contiguous halves, the first holding the extra element of an odd list.
fn split_in_half<T>(mut items: Vec<T>) -> (Vec<T>, Vec<T>) {
    let second = items.split_off(items.len().div_ceil(2));
    (items, second)
}
