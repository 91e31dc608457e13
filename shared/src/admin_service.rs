use crate::http::{full_body, make_error_response};
use http_body_util::combinators::BoxBody;
use hyper::body::{Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// Liveness and readiness endpoints served on the admin listener.
///
/// `/health` always answers `ok`; `/ready` asks the `is_ready` probe.
pub struct AdminService<F, E> {
    is_ready: F,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> AdminService<F, E>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self {
            is_ready,
            _error: PhantomData,
        }
    }
}

impl<F, E> Service<Request<Incoming>> for AdminService<F, E>
where
    F: Fn() -> bool + Send + Sync + 'static,
    E: Send + 'static,
{
    type Response = Response<BoxBody<Bytes, E>>;
    type Error = E;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let response = route_admin(req.uri().path(), &self.is_ready);
        Box::pin(async move { Ok(response) })
    }
}

fn route_admin<E>(path: &str, is_ready: impl Fn() -> bool) -> Response<BoxBody<Bytes, E>> {
    match path {
        "/health" => Response::new(full_body("ok\n")),
        "/ready" => match is_ready() {
            true => Response::new(full_body("ok\n")),
            false => make_error_response(StatusCode::SERVICE_UNAVAILABLE),
        },
        _ => make_error_response(StatusCode::NOT_FOUND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::serve_listener;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::net::TcpListener;

    #[derive(Debug)]
    struct TestError;

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error")
        }
    }

    impl std::error::Error for TestError {}

    impl From<std::io::Error> for TestError {
        fn from(_: std::io::Error) -> Self {
            TestError
        }
    }

    #[test]
    fn test_admin_routes() {
        let health = route_admin::<TestError>("/health", || false);
        assert_eq!(health.status(), StatusCode::OK);

        let ready = route_admin::<TestError>("/ready", || true);
        assert_eq!(ready.status(), StatusCode::OK);

        let not_ready = route_admin::<TestError>("/ready", || false);
        assert_eq!(not_ready.status(), StatusCode::SERVICE_UNAVAILABLE);

        let unknown = route_admin::<TestError>("/metrics", || true);
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_service_over_http() {
        let ready = Arc::new(AtomicBool::new(false));
        let ready_probe = ready.clone();
        let service: AdminService<_, TestError> =
            AdminService::new(move || ready_probe.load(Ordering::Relaxed));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(serve_listener(listener, service));

        let client = reqwest::Client::new();
        let base = format!("http://127.0.0.1:{port}");

        let response = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        assert_eq!(response.text().await.unwrap(), "ok\n");

        let response = client.get(format!("{base}/ready")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 503);

        ready.store(true, Ordering::Relaxed);
        let response = client.get(format!("{base}/ready")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
}
