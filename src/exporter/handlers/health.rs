use crate::{
    exporter::{GIT_COMMIT_HASH, ScrapeScope},
    store::{AdminConnection, Store},
};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    pgbouncer: String,
}

fn create_health_response(healthy: bool) -> Health {
    Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pgbouncer: if healthy { "ok" } else { "error" }.to_string(),
    }
}

// Body only for GET, OPTIONS gets headers and status
fn create_response_body(method: &Method, health: &Health) -> Body {
    if method == Method::GET {
        Json(health).into_response().into_body()
    } else {
        Body::empty()
    }
}

// X-App: name:version:short-hash
fn create_app_headers(health: &Health) -> HeaderMap {
    let short_hash = health.commit.get(0..7).unwrap_or("");

    let header_value = format!("{}:{}:{}", health.name, health.version, short_hash);

    match header_value.parse::<HeaderValue>() {
        Ok(x_app_header_value) => {
            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        }
        Err(err) => {
            debug!("Failed to parse X-App header: {}", err);
            HeaderMap::new()
        }
    }
}

pub async fn health<C: AdminConnection + 'static>(
    method: Method,
    Extension(store): Extension<Arc<Store<C>>>,
    Extension(scope): Extension<ScrapeScope>,
) -> impl IntoResponse {
    let result = store.check_health(&scope.context()).await;

    if let Err(e) = &result {
        error!("pgbouncer health check failed: {}", e);
    }

    let health = create_health_response(result.is_ok());
    let body = create_response_body(&method, &health);
    let headers = create_app_headers(&health);

    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, headers, body)
}
