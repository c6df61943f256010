//! Per-request tracing: OpenTelemetry context extraction, request spans and
//! the `x-trace-id` response header.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::global;
use opentelemetry::trace::{TraceContextExt, TraceId};
use opentelemetry_http::HeaderExtractor;
use std::time::Duration;
use tracing::{Span, info, info_span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

fn header<'a>(request: &'a Request<Body>, name: &str, fallback: &'a str) -> &'a str {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback)
}

pub fn make_span(request: &Request<Body>) -> Span {
    let parent_cx =
        global::get_text_map_propagator(|prop| prop.extract(&HeaderExtractor(request.headers())));

    let span = info_span!(
        "http.server.request",
        otel.kind = "server",
        otel.status_code = tracing::field::Empty,
        http.method = request.method().as_str(),
        http.route = request.uri().path(),
        http.target = request.uri().to_string(),
        http.scheme = request.uri().scheme_str().unwrap_or("http"),
        http.user_agent = header(request, "user-agent", "unknown"),
        request_id = header(request, "x-request-id", "none"),
    );

    let _ = span.set_parent(parent_cx);

    span
}

pub fn on_response<B>(response: &axum::http::Response<B>, latency: Duration, span: &Span) {
    let status_code = if response.status().is_server_error() {
        "ERROR"
    } else {
        "OK"
    };
    span.record("otel.status_code", status_code);

    let elapsed_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    let trace_id = span.context().span().span_context().trace_id();

    if trace_id == TraceId::INVALID {
        info!(
            parent: span,
            status = response.status().as_u16(),
            elapsed_ms,
            "request completed"
        );
    } else {
        info!(
            parent: span,
            status = response.status().as_u16(),
            elapsed_ms,
            trace_id = %trace_id,
            "request completed"
        );
    }
}

pub async fn add_trace_headers(req: Request<Body>, next: Next) -> Response {
    let mut res = next.run(req).await;

    let span_context = Span::current().context().span().span_context().clone();

    if span_context.is_valid()
        && let Ok(val) = HeaderValue::from_str(&span_context.trace_id().to_string())
    {
        res.headers_mut()
            .insert(HeaderName::from_static("x-trace-id"), val);
    }

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_make_span_name() {
        let request = Request::builder()
            .method("GET")
            .uri("/metrics")
            .header("user-agent", "prometheus/2.53")
            .header("x-request-id", "01J0000000000000000000000")
            .body(Body::empty())
            .unwrap();

        let span = make_span(&request);
        assert_eq!(
            span.metadata().map(|m| m.name()),
            Some("http.server.request")
        );
    }

    #[test]
    fn test_make_span_without_optional_headers() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let span = make_span(&request);
        assert_eq!(
            span.metadata().map(|m| m.name()),
            Some("http.server.request")
        );
    }

    #[test]
    fn test_on_response_status_codes() {
        let span = info_span!("test");
        let latency = Duration::from_millis(100);

        let ok = axum::http::Response::builder()
            .status(StatusCode::OK)
            .body(())
            .unwrap();
        on_response(&ok, latency, &span);

        let unavailable = axum::http::Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(())
            .unwrap();
        on_response(&unavailable, latency, &span);
    }
}
