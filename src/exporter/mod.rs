use crate::{
    cli::telemetry::shutdown_tracer,
    collectors::{config::CollectorConfig, registry::CollectorRegistry},
    store::{AdminConnection, ColumnPolicy, Context, Store},
};
use anyhow::{Context as _, Result, anyhow};
use axum::{
    Extension, Router,
    http::{HeaderName, HeaderValue},
    middleware::from_fn,
    routing::get,
};
use secrecy::SecretString;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info};
use ulid::Ulid;

mod handlers;
mod shutdown;
mod trace;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = if let Some(hash) = built_info::GIT_COMMIT_HASH {
    hash
} else {
    ":-("
};

/// Runtime settings for one exporter instance.
#[derive(Clone, Debug)]
pub struct ExporterOptions {
    pub collectors: Vec<String>,
    /// Deadline applied to every scrape and health request.
    pub scrape_timeout: Duration,
    pub column_policy: ColumnPolicy,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            collectors: Vec::new(),
            scrape_timeout: Duration::from_secs(5),
            column_policy: ColumnPolicy::Strict,
        }
    }
}

/// Per-request context factory: a deadline-bound child of the server context.
#[derive(Clone, Debug)]
pub struct ScrapeScope {
    root: Context,
    timeout: Duration,
}

impl ScrapeScope {
    #[must_use]
    pub const fn new(root: Context, timeout: Duration) -> Self {
        Self { root, timeout }
    }

    #[must_use]
    pub fn context(&self) -> Context {
        self.root.with_timeout(self.timeout)
    }
}

/// Configure the console client, bind and serve until SIGINT/SIGTERM.
///
/// # Errors
///
/// Returns an error if the DSN is malformed or the listener cannot be bound.
pub async fn new(
    port: u16,
    listen: Option<String>,
    dsn: SecretString,
    options: ExporterOptions,
) -> Result<()> {
    let store = Store::connect(&dsn)
        .context("Failed to configure pgbouncer connection")?
        .with_policy(options.column_policy);

    let (listener, bind_addr) = bind(port, listen).await?;

    println!(
        "{} {} - Listening on {bind_addr}\n\nEnabled collectors:\n{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        format_list(&options.collectors),
    );

    serve(listener, store, &options, shutdown::shutdown_signal()).await?;

    shutdown_tracer();

    Ok(())
}

/// Serve `/metrics` and `/health` for `store` on `listener`.
///
/// When `signal` resolves, in-flight scrapes are cancelled, the server drains
/// and the store is closed.
///
/// # Errors
///
/// Returns an error if the collector registry cannot be built.
pub async fn serve<C, F>(
    listener: TcpListener,
    store: Store<C>,
    options: &ExporterOptions,
    signal: F,
) -> Result<()>
where
    C: AdminConnection + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let config = CollectorConfig::new().with_enabled(&options.collectors);
    let registry = CollectorRegistry::new(&config)?;

    let root = Context::background();
    let scope = ScrapeScope::new(root.clone(), options.scrape_timeout);
    let store = Arc::new(store);

    let app = router(Arc::clone(&store), registry, scope);

    let shutdown = async move {
        signal.await;
        root.cancel();
    };

    if let Err(e) = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!(error=%e, "server error");
    }

    info!("shutting down");

    if let Err(e) = store.close().await {
        error!(error=%e, "failed to close pgbouncer connection");
    }

    Ok(())
}

/// Build the application router.
pub fn router<C: AdminConnection + 'static>(
    store: Arc<Store<C>>,
    registry: CollectorRegistry,
    scope: ScrapeScope,
) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(trace::make_span)
        .on_response(trace::on_response);

    Router::new()
        .route("/metrics", get(handlers::metrics::<C>))
        .route(
            "/health",
            get(handlers::health::<C>).options(handlers::health::<C>),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(trace_layer)
                .layer(from_fn(trace::add_trace_headers))
                .layer(Extension(store))
                .layer(Extension(registry))
                .layer(Extension(scope)),
        )
}

async fn bind(port: u16, listen: Option<String>) -> Result<(TcpListener, String)> {
    if let Some(addr) = listen {
        let ip = addr.parse::<std::net::IpAddr>().map_err(|_| {
            anyhow!(
                "Invalid IP address: '{}'. Expected IPv4 (e.g., 0.0.0.0, 127.0.0.1) or IPv6 (e.g., ::, ::1)",
                addr
            )
        })?;

        let bind_addr = std::net::SocketAddr::new(ip, port);
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {bind_addr}"))?;

        return Ok((listener, bind_addr.to_string()));
    }

    // Auto: try IPv6 first, fallback to IPv4
    match TcpListener::bind(format!("[::]:{port}")).await {
        Ok(l) => Ok((l, format!("[::]:{port}"))),
        Err(_) => Ok((
            TcpListener::bind(format!("0.0.0.0:{port}")).await?,
            format!("0.0.0.0:{port}"),
        )),
    }
}

// Helper to format a list of items with a leading dash and indentation for the
// start up message
fn format_list<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|i| format!("  - {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}
