use crate::{
    collectors::registry::CollectorRegistry,
    exporter::ScrapeScope,
    store::{AdminConnection, Store},
};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error};

pub async fn metrics<C: AdminConnection + 'static>(
    Extension(store): Extension<Arc<Store<C>>>,
    Extension(registry): Extension<CollectorRegistry>,
    Extension(scope): Extension<ScrapeScope>,
) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        "content-type",
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );

    let ctx = scope.context();

    match registry.collect_all(&*store, &ctx).await {
        Ok(metrics) => {
            debug!("Successfully collected metrics");
            (StatusCode::OK, headers, metrics)
        }
        Err(e) => {
            error!("Failed to collect metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                headers,
                format!("Error collecting metrics: {e}"),
            )
        }
    }
}
