use super::{family, gather, label};
use anyhow::Result;
use pgbouncer_exporter::{
    collectors::{Collector, ListsCollector},
    store::{AdminRow, Context, MockConsole, Store},
};
use prometheus::Registry;

#[tokio::test]
async fn test_lists_collector_preserves_every_entry() -> Result<()> {
    let console = MockConsole::new().with_rows(
        "SHOW LISTS",
        vec![
            AdminRow::new().with("list", "databases").with_int("items", 2),
            AdminRow::new().with("list", "users").with_int("items", 3),
            AdminRow::new().with("list", "used_clients").with_int("items", 0),
        ],
    );

    let collector = ListsCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;
    collector
        .collect(&Store::new(console), &Context::background())
        .await?;

    let families = gather(&registry);
    let items = family(&families, "pgbouncer_lists_items");
    assert_eq!(items.get_metric().len(), 3);
    assert_eq!(label(items, "list"), Some("databases"));

    Ok(())
}

#[tokio::test]
async fn test_lists_collector_cancelled() -> Result<()> {
    let console = MockConsole::new().with_rows("SHOW LISTS", vec![]);
    let handle = console.clone();

    let collector = ListsCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;

    let ctx = Context::background();
    ctx.cancel();
    assert!(collector.collect(&Store::new(console), &ctx).await.is_err());
    assert!(handle.issued().is_empty());

    Ok(())
}
