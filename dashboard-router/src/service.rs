//! Public HTTP surface: the landing page and one page per dashboard, both
//! rendered as JSON page models.

use crate::aggregator::Aggregator;
use crate::errors::{DashboardError, Result};
use crate::homepage::HomePage;
use crate::metrics_defs::REQUEST_DURATION;
use crate::pages::{DashboardPage, ErrorPage};
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Method, StatusCode};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response};
use performance_client::ConfigApi;
use serde::Serialize;
use shared::histogram;
use shared::http::{full_body, make_error_response};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

const HOME_PATH: &str = "/performance";

type DashboardResponse = Response<BoxBody<Bytes, DashboardError>>;

#[derive(Debug, PartialEq)]
enum Route<'a> {
    Root,
    Home,
    Dashboard(&'a str),
    MethodNotAllowed,
    NotFound,
}

impl Route<'_> {
    fn label(&self) -> &'static str {
        match self {
            Route::Root => "root",
            Route::Home => "home",
            Route::Dashboard(_) => "dashboard",
            Route::MethodNotAllowed => "method_not_allowed",
            Route::NotFound => "not_found",
        }
    }
}

fn route<'a>(method: &Method, path: &'a str) -> Route<'a> {
    if method != Method::GET {
        return Route::MethodNotAllowed;
    }

    if path == "/" {
        return Route::Root;
    }

    match path.strip_prefix(HOME_PATH) {
        Some("") => Route::Home,
        Some(rest) => match rest.strip_prefix('/').map(|s| s.trim_end_matches('/')) {
            Some("") => Route::Home,
            Some(slug) => Route::Dashboard(slug),
            // e.g. /performancefoo
            None => Route::NotFound,
        },
        None => Route::NotFound,
    }
}

struct ServiceInner {
    config_api: Arc<dyn ConfigApi>,
    aggregator: Aggregator,
}

#[derive(Clone)]
pub struct DashboardService {
    inner: Arc<ServiceInner>,
}

impl DashboardService {
    pub fn new(config_api: Arc<dyn ConfigApi>, aggregator: Aggregator) -> Self {
        DashboardService {
            inner: Arc::new(ServiceInner {
                config_api,
                aggregator,
            }),
        }
    }

    pub async fn handle<B>(&self, request: Request<B>) -> DashboardResponse {
        let started = Instant::now();
        let route = route(request.method(), request.uri().path());
        let page = route.label();

        let response = match route {
            Route::Root => redirect(HOME_PATH),
            Route::Home => self.home_page().await.unwrap_or_else(error_response),
            Route::Dashboard(slug) => self
                .dashboard_page(slug)
                .await
                .unwrap_or_else(error_response),
            Route::MethodNotAllowed => make_error_response(StatusCode::METHOD_NOT_ALLOWED),
            Route::NotFound => make_error_response(StatusCode::NOT_FOUND),
        };

        histogram!(
            REQUEST_DURATION,
            "page" => page,
            "status" => response.status().as_str().to_string()
        )
        .record(started.elapsed().as_secs_f64());

        response
    }

    async fn home_page(&self) -> Result<DashboardResponse> {
        let dashboards = self
            .inner
            .config_api
            .fetch_all()
            .await
            .map_err(DashboardError::ConfigFetch)?;

        json_response(StatusCode::OK, &HomePage::build(dashboards.items))
    }

    async fn dashboard_page(&self, slug: &str) -> Result<DashboardResponse> {
        let dashboard = self
            .inner
            .config_api
            .fetch(slug)
            .await
            .map_err(DashboardError::ConfigFetch)?;

        let sources = dashboard.data_sources();
        let requested = sources.len();
        let data = self.inner.aggregator.aggregate(sources).await;
        tracing::debug!(slug, requested, fetched = data.len(), "Rendering dashboard");

        json_response(StatusCode::OK, &DashboardPage::new(&dashboard, &data))
    }
}

impl Service<Request<Incoming>> for DashboardService {
    type Response = DashboardResponse;
    type Error = DashboardError;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<DashboardResponse> {
    let body = serde_json::to_vec(value)?;
    let mut response = Response::new(full_body(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

fn redirect(location: &'static str) -> DashboardResponse {
    let mut response = Response::new(full_body(Bytes::new()));
    *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
    response
        .headers_mut()
        .insert(LOCATION, HeaderValue::from_static(location));
    response
}

fn error_response(error: DashboardError) -> DashboardResponse {
    tracing::error!("Failed to render page: {}", error);
    let page = ErrorPage {
        error: error.to_string(),
    };
    json_response(StatusCode::INTERNAL_SERVER_ERROR, &page)
        .unwrap_or_else(|_| make_error_response(StatusCode::INTERNAL_SERVER_ERROR))
}
