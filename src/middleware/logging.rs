//! Request logging middleware.
//!
//! One line per request with method, path, status and latency. Headers and
//! bodies are never logged, so tokens and passwords stay out of the output.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn, Instrument};

/// Paths polled by load balancers; logging them is noise.
const QUIET_PATHS: &[&str] = &["/health"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Ok,
    Rejected,
    Failed,
}

fn classify(status: StatusCode) -> Outcome {
    if status.is_server_error() {
        Outcome::Failed
    } else if status.is_client_error() {
        Outcome::Rejected
    } else {
        Outcome::Ok
    }
}

/// Logs at INFO for 2xx/3xx/4xx and WARN for 5xx.
///
/// The client address is included when the server was started with
/// connect info; in-process tests run without it.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if QUIET_PATHS.contains(&path.as_str()) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let client_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());

    let span = tracing::info_span!(
        "http_request",
        method = %method,
        path = %path,
        client_ip = %client_ip,
    );

    let start = Instant::now();
    let response = next.run(request).instrument(span.clone()).await;
    let latency_ms = start.elapsed().as_millis() as u64;
    let status = response.status();

    let _entered = span.enter();
    match classify(status) {
        Outcome::Failed => warn!(status = status.as_u16(), latency_ms, "Request failed (5xx)"),
        Outcome::Rejected => info!(status = status.as_u16(), latency_ms, "Request rejected (4xx)"),
        Outcome::Ok => info!(status = status.as_u16(), latency_ms, "Request completed"),
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(StatusCode::OK), Outcome::Ok);
        assert_eq!(classify(StatusCode::CREATED), Outcome::Ok);
        assert_eq!(classify(StatusCode::UNAUTHORIZED), Outcome::Rejected);
        assert_eq!(classify(StatusCode::CONFLICT), Outcome::Rejected);
        assert_eq!(classify(StatusCode::INTERNAL_SERVER_ERROR), Outcome::Failed);
    }
}
