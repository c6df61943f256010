use super::{common, family, gather, gauge, label};
use anyhow::Result;
use pgbouncer_exporter::{
    collectors::{Collector, StatsCollector},
    store::{Context, MockConsole, Store},
};
use prometheus::Registry;

#[tokio::test]
async fn test_stats_collector_publishes_every_counter() -> Result<()> {
    let console = MockConsole::new().with_rows(
        "SHOW STATS",
        vec![common::stats_row("app", 0), common::stats_row("pgbouncer", 100)],
    );
    let store = Store::new(console);

    let collector = StatsCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;
    collector.collect(&store, &Context::background()).await?;

    let families = gather(&registry);
    assert_eq!(families.len(), 17);

    let requests = family(&families, "pgbouncer_stats_requests_total");
    assert_eq!(requests.get_metric().len(), 2);
    assert_eq!(label(requests, "database"), Some("app"));
    assert_eq!(gauge(requests, 0), Some(1.0));
    assert_eq!(gauge(requests, 1), Some(101.0));

    let wait = family(&families, "pgbouncer_stats_avg_wait_time_microseconds");
    assert_eq!(gauge(wait, 0), Some(17.0));

    Ok(())
}

#[tokio::test]
async fn test_stats_collector_drops_vanished_databases() -> Result<()> {
    let console = MockConsole::new().with_rows("SHOW STATS", vec![common::stats_row("old", 0)]);
    let collector = StatsCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;
    collector
        .collect(&Store::new(console), &Context::background())
        .await?;

    let console = MockConsole::new().with_rows("SHOW STATS", vec![common::stats_row("new", 0)]);
    collector
        .collect(&Store::new(console), &Context::background())
        .await?;

    let families = gather(&registry);
    let requests = family(&families, "pgbouncer_stats_requests_total");
    assert_eq!(requests.get_metric().len(), 1);
    assert_eq!(label(requests, "database"), Some("new"));

    Ok(())
}

#[tokio::test]
async fn test_stats_collector_fails_on_bad_counter() -> Result<()> {
    let console = MockConsole::new().with_rows(
        "SHOW STATS",
        vec![common::stats_row("app", 0).with("total_sent", "lots")],
    );
    let collector = StatsCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;

    let err = collector
        .collect(&Store::new(console), &Context::background())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("total_sent"));

    Ok(())
}

#[tokio::test]
async fn test_stats_totals_are_gauges() -> Result<()> {
    let console = MockConsole::new().with_rows("SHOW STATS", vec![common::stats_row("app", 0)]);
    let collector = StatsCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;
    collector
        .collect(&Store::new(console), &Context::background())
        .await?;

    let families = gather(&registry);
    let totals: Vec<_> = families
        .iter()
        .filter(|m| m.name().ends_with("_total"))
        .collect();
    assert_eq!(totals.len(), 8);

    // absolute values read from the console, not counted increments
    for metric_family in totals {
        assert_eq!(
            metric_family.get_field_type(),
            prometheus::proto::MetricType::GAUGE,
            "{}",
            metric_family.name()
        );
    }

    Ok(())
}
