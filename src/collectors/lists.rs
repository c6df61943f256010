use crate::collectors::Collector;
use crate::store::{AdminConnection, Context, Store};
use anyhow::Result;
use futures::future::BoxFuture;
use prometheus::{IntGaugeVec, Opts, Registry};
use tracing::{debug, instrument};

/// Exposes `SHOW LISTS` as `pgbouncer_lists_items{list}`.
#[derive(Clone)]
pub struct ListsCollector {
    items: IntGaugeVec,
}

impl Default for ListsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ListsCollector {
    /// # Panics
    ///
    /// Panics if metric creation fails (should never happen with valid metric names)
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let items = IntGaugeVec::new(
            Opts::new(
                "pgbouncer_lists_items",
                "Count of items registered with pgbouncer.",
            ),
            &["list"],
        )
        .expect("valid pgbouncer_lists_items metric");

        Self { items }
    }
}

impl Collector for ListsCollector {
    fn name(&self) -> &'static str {
        "lists"
    }

    fn enabled_by_default(&self) -> bool {
        true
    }

    fn register_metrics(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.items.clone()))?;
        Ok(())
    }

    #[instrument(skip(self, store, ctx), level = "info", err, fields(collector = "lists", otel.kind = "internal"))]
    fn collect<'a, C: AdminConnection>(
        &'a self,
        store: &'a Store<C>,
        ctx: &'a Context,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.items.reset();

            let lists = store.get_lists(ctx).await?;

            for list in &lists {
                self.items.with_label_values(&[list.list.as_str()]).set(list.items);
            }

            debug!(lists = lists.len(), "collected pgbouncer lists");

            Ok(())
        })
    }
}
