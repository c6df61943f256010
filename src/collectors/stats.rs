use crate::collectors::Collector;
use crate::store::{AdminConnection, Context, Store};
use anyhow::Result;
use futures::future::BoxFuture;
use prometheus::{IntGaugeVec, Opts, Registry};
use tracing::{debug, info_span, instrument};

/// Exposes `SHOW STATS` per database.
///
/// **Metrics:** (all labelled `{database}`)
/// - `pgbouncer_stats_requests_total`
/// - `pgbouncer_stats_received_bytes_total`
/// - `pgbouncer_stats_sent_bytes_total`
/// - `pgbouncer_stats_query_time_microseconds_total`
/// - `pgbouncer_stats_transactions_total`
/// - `pgbouncer_stats_transaction_time_microseconds_total`
/// - `pgbouncer_stats_queries_total`
/// - `pgbouncer_stats_wait_time_microseconds_total`
/// - `pgbouncer_stats_avg_requests`
/// - `pgbouncer_stats_avg_received_bytes`
/// - `pgbouncer_stats_avg_sent_bytes`
/// - `pgbouncer_stats_avg_query`
/// - `pgbouncer_stats_avg_queries`
/// - `pgbouncer_stats_avg_query_time_microseconds`
/// - `pgbouncer_stats_avg_transaction_time_microseconds`
/// - `pgbouncer_stats_avg_transactions`
/// - `pgbouncer_stats_avg_wait_time_microseconds`
///
/// Totals are exported as absolute gauges; use `rate()`/`increase()` in `PromQL`.
/// They keep the `_total` suffix because the console value only grows until
/// pgbouncer restarts. The collector sets the value it read rather than
/// counting increments, so the type stays gauge.
#[derive(Clone)]
pub struct StatsCollector {
    requests_total: IntGaugeVec,
    received_bytes_total: IntGaugeVec,
    sent_bytes_total: IntGaugeVec,
    query_time_total: IntGaugeVec,
    transactions_total: IntGaugeVec,
    transaction_time_total: IntGaugeVec,
    queries_total: IntGaugeVec,
    wait_time_total: IntGaugeVec,

    avg_requests: IntGaugeVec,
    avg_received_bytes: IntGaugeVec,
    avg_sent_bytes: IntGaugeVec,
    avg_query: IntGaugeVec,
    avg_queries: IntGaugeVec,
    avg_query_time: IntGaugeVec,
    avg_transaction_time: IntGaugeVec,
    avg_transactions: IntGaugeVec,
    avg_wait_time: IntGaugeVec,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::expect_used)]
fn stats_gauge(metric: &str, help: &str) -> IntGaugeVec {
    IntGaugeVec::new(Opts::new(metric, help), &["database"]).expect("valid pgbouncer_stats metric")
}

impl StatsCollector {
    /// # Panics
    ///
    /// Panics if metric creation fails (should never happen with valid metric names)
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests_total: stats_gauge(
                "pgbouncer_stats_requests_total",
                "Total number of SQL requests pooled.",
            ),
            received_bytes_total: stats_gauge(
                "pgbouncer_stats_received_bytes_total",
                "Total volume in bytes of network traffic received.",
            ),
            sent_bytes_total: stats_gauge(
                "pgbouncer_stats_sent_bytes_total",
                "Total volume in bytes of network traffic sent.",
            ),
            query_time_total: stats_gauge(
                "pgbouncer_stats_query_time_microseconds_total",
                "Total time spent connected to the server running queries.",
            ),
            transactions_total: stats_gauge(
                "pgbouncer_stats_transactions_total",
                "Total number of SQL transactions pooled.",
            ),
            transaction_time_total: stats_gauge(
                "pgbouncer_stats_transaction_time_microseconds_total",
                "Total time spent connected to the server in a transaction.",
            ),
            queries_total: stats_gauge(
                "pgbouncer_stats_queries_total",
                "Total number of SQL queries pooled.",
            ),
            wait_time_total: stats_gauge(
                "pgbouncer_stats_wait_time_microseconds_total",
                "Time spent by clients waiting for a server.",
            ),
            avg_requests: stats_gauge(
                "pgbouncer_stats_avg_requests",
                "Average requests per second in last stat period.",
            ),
            avg_received_bytes: stats_gauge(
                "pgbouncer_stats_avg_received_bytes",
                "Average received (from clients) bytes per second.",
            ),
            avg_sent_bytes: stats_gauge(
                "pgbouncer_stats_avg_sent_bytes",
                "Average sent (to clients) bytes per second.",
            ),
            avg_query: stats_gauge(
                "pgbouncer_stats_avg_query",
                "Average query duration in microseconds.",
            ),
            avg_queries: stats_gauge(
                "pgbouncer_stats_avg_queries",
                "Average queries per second in last stat period.",
            ),
            avg_query_time: stats_gauge(
                "pgbouncer_stats_avg_query_time_microseconds",
                "Average query duration in microseconds.",
            ),
            avg_transaction_time: stats_gauge(
                "pgbouncer_stats_avg_transaction_time_microseconds",
                "Average transaction duration in microseconds.",
            ),
            avg_transactions: stats_gauge(
                "pgbouncer_stats_avg_transactions",
                "Average transactions per second in last stat period.",
            ),
            avg_wait_time: stats_gauge(
                "pgbouncer_stats_avg_wait_time_microseconds",
                "Time spent by clients waiting for a server in microseconds (average per second).",
            ),
        }
    }

    fn gauges(&self) -> [&IntGaugeVec; 17] {
        [
            &self.requests_total,
            &self.received_bytes_total,
            &self.sent_bytes_total,
            &self.query_time_total,
            &self.transactions_total,
            &self.transaction_time_total,
            &self.queries_total,
            &self.wait_time_total,
            &self.avg_requests,
            &self.avg_received_bytes,
            &self.avg_sent_bytes,
            &self.avg_query,
            &self.avg_queries,
            &self.avg_query_time,
            &self.avg_transaction_time,
            &self.avg_transactions,
            &self.avg_wait_time,
        ]
    }
}

impl Collector for StatsCollector {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    #[instrument(skip(self, registry), level = "info", err, fields(collector = "stats"))]
    fn register_metrics(&self, registry: &Registry) -> Result<()> {
        for gauge in self.gauges() {
            registry.register(Box::new(gauge.clone()))?;
        }
        Ok(())
    }

    #[instrument(skip(self, store, ctx), level = "info", err, fields(collector = "stats", otel.kind = "internal"))]
    fn collect<'a, C: AdminConnection>(
        &'a self,
        store: &'a Store<C>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for gauge in self.gauges() {
                gauge.reset();
            }

            let stats = store.get_stats(ctx).await?;

            let apply_span = info_span!("stats.apply_metrics", databases = stats.len());
            let _g = apply_span.enter();

            for stat in &stats {
                let labels = [stat.database.as_str()];

                self.requests_total.with_label_values(&labels).set(stat.total_requests);
                self.received_bytes_total.with_label_values(&labels).set(stat.total_received);
                self.sent_bytes_total.with_label_values(&labels).set(stat.total_sent);
                self.query_time_total.with_label_values(&labels).set(stat.total_query_time);
                self.transactions_total.with_label_values(&labels).set(stat.total_xact_count);
                self.transaction_time_total.with_label_values(&labels).set(stat.total_xact_time);
                self.queries_total.with_label_values(&labels).set(stat.total_query_count);
                self.wait_time_total.with_label_values(&labels).set(stat.total_wait_time);

                self.avg_requests.with_label_values(&labels).set(stat.average_requests);
                self.avg_received_bytes.with_label_values(&labels).set(stat.average_received);
                self.avg_sent_bytes.with_label_values(&labels).set(stat.average_sent);
                self.avg_query.with_label_values(&labels).set(stat.average_query);
                self.avg_queries.with_label_values(&labels).set(stat.average_query_count);
                self.avg_query_time.with_label_values(&labels).set(stat.average_query_time);
                self.avg_transaction_time.with_label_values(&labels).set(stat.average_xact_time);
                self.avg_transactions.with_label_values(&labels).set(stat.average_xact_count);
                self.avg_wait_time.with_label_values(&labels).set(stat.average_wait_time);
            }

            debug!(databases = stats.len(), "collected pgbouncer stats");

            Ok(())
        })
    }
}
