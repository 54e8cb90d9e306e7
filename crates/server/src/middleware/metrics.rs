//! Prometheus metrics collection middleware
//!
//! Records `http_requests_total` and `http_request_duration_seconds` for
//! every request. Session ids are folded into `:id` to keep label
//! cardinality bounded.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

fn route_label(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if uuid::Uuid::try_parse(seg).is_ok() {
                ":id"
            } else {
                seg
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = route_label(request.uri().path());

    let start = Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed().as_secs_f64();

    metrics::counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(elapsed);

    response
}

#[cfg(test)]
mod tests {
    use super::route_label;

    #[test]
    fn session_ids_are_folded() {
        assert_eq!(
            route_label("/api/sessions/7d444840-9dc0-11d1-b245-5ffdce74fad2/report"),
            "/api/sessions/:id/report"
        );
        assert_eq!(route_label("/health"), "/health");
    }
}
