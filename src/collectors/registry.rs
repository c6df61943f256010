use crate::collectors::{COLLECTOR_NAMES, Collector, CollectorType, all_factories, config::CollectorConfig};
use crate::store::{AdminConnection, Context, Store};
use anyhow::Result;
use prometheus::{IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Enabled collectors plus the registry they publish into.
///
/// Besides the collectors' own metrics every scrape sets:
/// - `pgbouncer_up` (1 when the admin console answered the health probe)
/// - `pgbouncer_exporter_collector_last_scrape_success{collector}`
#[derive(Clone)]
pub struct CollectorRegistry {
    collectors: Vec<CollectorType>,
    registry: Arc<Registry>,
    up: IntGauge,
    scrape_success: IntGaugeVec,
    /// Collectors reset their gauges before reading, so scrapes must not interleave.
    scrape: Arc<Mutex<()>>,
}

impl CollectorRegistry {
    /// Build the enabled collectors and register their metrics.
    ///
    /// Collectors are kept in [`COLLECTOR_NAMES`] order so the exposition is
    /// stable between runs.
    ///
    /// # Errors
    ///
    /// Returns an error if a metric cannot be registered (duplicate name).
    pub fn new(config: &CollectorConfig) -> Result<Self> {
        let factories = all_factories();
        let collectors: Vec<CollectorType> = COLLECTOR_NAMES
            .iter()
            .filter(|name| config.is_enabled(name))
            .filter_map(|name| factories.get(name).map(|f| f()))
            .collect();

        let registry = Registry::new();

        let up = IntGauge::new("pgbouncer_up", "Whether the pgbouncer admin console is reachable.")?;
        registry.register(Box::new(up.clone()))?;

        let scrape_success = IntGaugeVec::new(
            Opts::new(
                "pgbouncer_exporter_collector_last_scrape_success",
                "1 if the last scrape of the collector succeeded, else 0.",
            ),
            &["collector"],
        )?;
        registry.register(Box::new(scrape_success.clone()))?;

        for collector in &collectors {
            collector.register_metrics(&registry)?;
        }

        Ok(Self {
            collectors,
            registry: Arc::new(registry),
            up,
            scrape_success,
            scrape: Arc::new(Mutex::new(())),
        })
    }

    /// Run one poll cycle and render the text exposition.
    ///
    /// A failing collector is logged and reported through its success gauge;
    /// the remaining collectors still run. Concurrent calls are queued, each
    /// one renders the values it read itself.
    ///
    /// # Errors
    ///
    /// Returns an error only if encoding the exposition fails.
    pub async fn collect_all<C: AdminConnection>(&self, store: &Store<C>, ctx: &Context) -> Result<String> {
        let _scrape = self.scrape.lock().await;

        match store.check_health(ctx).await {
            Ok(()) => self.up.set(1),
            Err(e) => {
                warn!("pgbouncer health probe failed: {}", e);
                self.up.set(0);
            }
        }

        for collector in &self.collectors {
            let name = collector.name();
            match collector.collect(store, ctx).await {
                Ok(()) => {
                    debug!("Collected metrics from '{}'", name);
                    self.scrape_success.with_label_values(&[name]).set(1);
                }
                Err(e) => {
                    warn!("Collector '{}' failed: {:#}", name, e);
                    self.scrape_success.with_label_values(&[name]).set(0);
                }
            }
        }

        Ok(TextEncoder::new().encode_to_string(&self.registry.gather())?)
    }

    pub fn collector_names(&self) -> Vec<&'static str> {
        self.collectors.iter().map(Collector::name).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
