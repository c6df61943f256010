use crate::collectors::{Collector, i64_to_f64};
use crate::store::{AdminConnection, Context, Store};
use anyhow::Result;
use futures::future::BoxFuture;
use prometheus::{GaugeVec, IntGaugeVec, Opts, Registry};
use tracing::{debug, info_span, instrument};

const POOL_LABELS: [&str; 3] = ["database", "user", "pool_mode"];

const MICROS_PER_SEC: f64 = 1_000_000.0;

/// Exposes `SHOW POOLS` per (database, user).
///
/// **Metrics:** (all labelled `{database,user,pool_mode}`)
/// - `pgbouncer_pools_client_active_connections`
/// - `pgbouncer_pools_client_waiting_connections`
/// - `pgbouncer_pools_server_active_connections`
/// - `pgbouncer_pools_server_idle_connections`
/// - `pgbouncer_pools_server_used_connections`
/// - `pgbouncer_pools_server_tested_connections`
/// - `pgbouncer_pools_server_login_connections`
/// - `pgbouncer_pools_client_maxwait_seconds` (`maxwait` + `maxwait_us`)
#[derive(Clone)]
pub struct PoolsCollector {
    client_active: IntGaugeVec,
    client_waiting: IntGaugeVec,
    server_active: IntGaugeVec,
    server_idle: IntGaugeVec,
    server_used: IntGaugeVec,
    server_tested: IntGaugeVec,
    server_login: IntGaugeVec,
    client_maxwait_seconds: GaugeVec,
}

impl Default for PoolsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::expect_used)]
fn pool_gauge(metric: &str, help: &str) -> IntGaugeVec {
    IntGaugeVec::new(Opts::new(metric, help), &POOL_LABELS).expect("valid pgbouncer_pools metric")
}

impl PoolsCollector {
    /// # Panics
    ///
    /// Panics if metric creation fails (should never happen with valid metric names)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self {
            client_active: pool_gauge(
                "pgbouncer_pools_client_active_connections",
                "Client connections linked to server connection and able to process queries.",
            ),
            client_waiting: pool_gauge(
                "pgbouncer_pools_client_waiting_connections",
                "Client connections waiting on a server connection.",
            ),
            server_active: pool_gauge(
                "pgbouncer_pools_server_active_connections",
                "Server connections linked to a client connection.",
            ),
            server_idle: pool_gauge(
                "pgbouncer_pools_server_idle_connections",
                "Server connections idle and ready for a client query.",
            ),
            server_used: pool_gauge(
                "pgbouncer_pools_server_used_connections",
                "Server connections idle more than server_check_delay, needing server_check_query.",
            ),
            server_tested: pool_gauge(
                "pgbouncer_pools_server_tested_connections",
                "Server connections currently running either server_reset_query or server_check_query.",
            ),
            server_login: pool_gauge(
                "pgbouncer_pools_server_login_connections",
                "Server connections currently in the process of logging in.",
            ),
            client_maxwait_seconds: GaugeVec::new(
                Opts::new(
                    "pgbouncer_pools_client_maxwait_seconds",
                    "Age of the oldest unserved client connection in seconds.",
                ),
                &POOL_LABELS,
            )
            .expect("valid pgbouncer_pools_client_maxwait_seconds metric"),
        }
    }

    fn int_gauges(&self) -> [&IntGaugeVec; 7] {
        [
            &self.client_active,
            &self.client_waiting,
            &self.server_active,
            &self.server_idle,
            &self.server_used,
            &self.server_tested,
            &self.server_login,
        ]
    }
}

/// Whole seconds plus the microsecond remainder reported separately.
fn max_wait_seconds(max_wait: i64, max_wait_microseconds: i64) -> f64 {
    i64_to_f64(max_wait) + i64_to_f64(max_wait_microseconds) / MICROS_PER_SEC
}

impl Collector for PoolsCollector {
    fn name(&self) -> &'static str {
        "pools"
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    #[instrument(skip(self, registry), level = "info", err, fields(collector = "pools"))]
    fn register_metrics(&self, registry: &Registry) -> Result<()> {
        for gauge in self.int_gauges() {
            registry.register(Box::new(gauge.clone()))?;
        }
        registry.register(Box::new(self.client_maxwait_seconds.clone()))?;
        Ok(())
    }

    #[instrument(skip(self, store, ctx), level = "info", err, fields(collector = "pools", otel.kind = "internal"))]
    fn collect<'a, C: AdminConnection>(
        &'a self,
        store: &'a Store<C>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for gauge in self.int_gauges() {
                gauge.reset();
            }
            self.client_maxwait_seconds.reset();

            let pools = store.get_pools(ctx).await?;

            let apply_span = info_span!("pools.apply_metrics", pools = pools.len());
            let _g = apply_span.enter();

            for pool in &pools {
                let labels = [
                    pool.database.as_str(),
                    pool.user.as_str(),
                    pool.pool_mode.as_str(),
                ];

                self.client_active.with_label_values(&labels).set(pool.client_active);
                self.client_waiting.with_label_values(&labels).set(pool.client_waiting);
                self.server_active.with_label_values(&labels).set(pool.server_active);
                self.server_idle.with_label_values(&labels).set(pool.server_idle);
                self.server_used.with_label_values(&labels).set(pool.server_used);
                self.server_tested.with_label_values(&labels).set(pool.server_tested);
                self.server_login.with_label_values(&labels).set(pool.server_login);
                self.client_maxwait_seconds
                    .with_label_values(&labels)
                    .set(max_wait_seconds(pool.max_wait, pool.max_wait_microseconds));
            }

            debug!(pools = pools.len(), "collected pgbouncer pools");

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_wait_seconds() {
        assert!((max_wait_seconds(0, 0) - 0.0).abs() < f64::EPSILON);
        assert!((max_wait_seconds(2, 500_000) - 2.5).abs() < f64::EPSILON);
        assert!((max_wait_seconds(0, 250) - 0.000_25).abs() < 1e-12);
    }
}
