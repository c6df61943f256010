use super::{common, family, gather, gauge, label};
use anyhow::Result;
use pgbouncer_exporter::{
    collectors::{Collector, PoolsCollector},
    store::{Context, MockConsole, Store},
};
use prometheus::Registry;

#[tokio::test]
async fn test_pools_collector_labels_and_values() -> Result<()> {
    let console = MockConsole::new().with_rows(
        "SHOW POOLS",
        vec![common::pools_row("pgbouncer", "myuser")],
    );

    let collector = PoolsCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;
    collector
        .collect(&Store::new(console), &Context::background())
        .await?;

    let families = gather(&registry);

    let active = family(&families, "pgbouncer_pools_client_active_connections");
    assert_eq!(label(active, "database"), Some("pgbouncer"));
    assert_eq!(label(active, "user"), Some("myuser"));
    assert_eq!(label(active, "pool_mode"), Some("transaction"));
    assert_eq!(gauge(active, 0), Some(1.0));

    let login = family(&families, "pgbouncer_pools_server_login_connections");
    assert_eq!(gauge(login, 0), Some(7.0));

    let maxwait = family(&families, "pgbouncer_pools_client_maxwait_seconds");
    assert_eq!(gauge(maxwait, 0), Some(8.5));

    Ok(())
}

#[tokio::test]
async fn test_pools_collector_null_pool_mode_is_empty_label() -> Result<()> {
    let console = MockConsole::new().with_rows(
        "SHOW POOLS",
        vec![common::pools_row("pgbouncer", "myuser").with_null("pool_mode")],
    );

    let collector = PoolsCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;
    collector
        .collect(&Store::new(console), &Context::background())
        .await?;

    let families = gather(&registry);
    let active = family(&families, "pgbouncer_pools_client_active_connections");
    assert_eq!(label(active, "pool_mode"), Some(""));

    Ok(())
}
