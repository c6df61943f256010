use crate::collectors::Collector;
use crate::store::{AdminConnection, Context, Store};
use anyhow::Result;
use futures::future::BoxFuture;
use prometheus::{IntGaugeVec, Opts, Registry};
use tracing::{debug, info_span, instrument};

const DATABASE_LABELS: [&str; 6] = ["name", "host", "port", "database", "force_user", "pool_mode"];

/// Exposes `SHOW DATABASES`, one series per configured database entry.
///
/// **Metrics:** (all labelled `{name,host,port,database,force_user,pool_mode}`)
/// - `pgbouncer_databases_pool_size`
/// - `pgbouncer_databases_reserve_pool`
/// - `pgbouncer_databases_max_connections`
/// - `pgbouncer_databases_current_connections`
/// - `pgbouncer_databases_paused` (1 = paused)
/// - `pgbouncer_databases_disabled` (1 = disabled)
#[derive(Clone)]
pub struct DatabasesCollector {
    pool_size: IntGaugeVec,
    reserve_pool: IntGaugeVec,
    max_connections: IntGaugeVec,
    current_connections: IntGaugeVec,
    paused: IntGaugeVec,
    disabled: IntGaugeVec,
}

impl Default for DatabasesCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::expect_used)]
fn database_gauge(metric: &str, help: &str) -> IntGaugeVec {
    IntGaugeVec::new(Opts::new(metric, help), &DATABASE_LABELS)
        .expect("valid pgbouncer_databases metric")
}

impl DatabasesCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pool_size: database_gauge(
                "pgbouncer_databases_pool_size",
                "Maximum number of server connections.",
            ),
            reserve_pool: database_gauge(
                "pgbouncer_databases_reserve_pool",
                "Maximum number of additional connections for this database.",
            ),
            max_connections: database_gauge(
                "pgbouncer_databases_max_connections",
                "Maximum number of allowed connections for this database.",
            ),
            current_connections: database_gauge(
                "pgbouncer_databases_current_connections",
                "Current number of connections for this database.",
            ),
            paused: database_gauge(
                "pgbouncer_databases_paused",
                "1 if this database is currently paused, else 0.",
            ),
            disabled: database_gauge(
                "pgbouncer_databases_disabled",
                "1 if this database is currently disabled, else 0.",
            ),
        }
    }

    fn gauges(&self) -> [&IntGaugeVec; 6] {
        [
            &self.pool_size,
            &self.reserve_pool,
            &self.max_connections,
            &self.current_connections,
            &self.paused,
            &self.disabled,
        ]
    }
}

impl Collector for DatabasesCollector {
    fn name(&self) -> &'static str {
        "databases"
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    #[instrument(skip(self, registry), level = "info", err, fields(collector = "databases"))]
    fn register_metrics(&self, registry: &Registry) -> Result<()> {
        for gauge in self.gauges() {
            registry.register(Box::new(gauge.clone()))?;
        }
        Ok(())
    }

    #[instrument(skip(self, store, ctx), level = "info", err, fields(collector = "databases", otel.kind = "internal"))]
    fn collect<'a, C: AdminConnection>(
        &'a self,
        store: &'a Store<C>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for gauge in self.gauges() {
                gauge.reset();
            }

            let databases = store.get_databases(ctx).await?;

            let apply_span = info_span!("databases.apply_metrics", databases = databases.len());
            let _g = apply_span.enter();

            for database in &databases {
                let port = database.port.to_string();
                let labels = [
                    database.name.as_str(),
                    database.host.as_str(),
                    port.as_str(),
                    database.database.as_str(),
                    database.force_user.as_str(),
                    database.pool_mode.as_str(),
                ];

                self.pool_size.with_label_values(&labels).set(database.pool_size);
                self.reserve_pool.with_label_values(&labels).set(database.reserve_pool);
                self.max_connections.with_label_values(&labels).set(database.max_connections);
                self.current_connections
                    .with_label_values(&labels)
                    .set(database.current_connections);
                self.paused.with_label_values(&labels).set(database.paused);
                self.disabled.with_label_values(&labels).set(database.disabled);
            }

            debug!(databases = databases.len(), "collected pgbouncer databases");

            Ok(())
        })
    }
}
