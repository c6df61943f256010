use super::{common, family, gather, gauge, label};
use anyhow::Result;
use pgbouncer_exporter::{
    collectors::{Collector, DatabasesCollector},
    store::{Context, MockConsole, Store},
};
use prometheus::Registry;

#[tokio::test]
async fn test_databases_collector_labels_and_values() -> Result<()> {
    let console =
        MockConsole::new().with_rows("SHOW DATABASES", vec![common::databases_row("myname")]);

    let collector = DatabasesCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;
    collector
        .collect(&Store::new(console), &Context::background())
        .await?;

    let families = gather(&registry);

    let pool_size = family(&families, "pgbouncer_databases_pool_size");
    assert_eq!(label(pool_size, "name"), Some("myname"));
    assert_eq!(label(pool_size, "host"), Some("localhost"));
    assert_eq!(label(pool_size, "port"), Some("23"));
    assert_eq!(label(pool_size, "database"), Some("pgbouncer"));
    assert_eq!(label(pool_size, "force_user"), Some("myuser"));
    assert_eq!(label(pool_size, "pool_mode"), Some("session"));
    assert_eq!(gauge(pool_size, 0), Some(4.0));

    let disabled = family(&families, "pgbouncer_databases_disabled");
    assert_eq!(gauge(disabled, 0), Some(1.0));

    Ok(())
}

#[tokio::test]
async fn test_databases_collector_unix_socket_entry() -> Result<()> {
    // entries reached over a unix socket report no host
    let console = MockConsole::new().with_rows(
        "SHOW DATABASES",
        vec![
            common::databases_row("local")
                .with_null("host")
                .with_null("force_user")
                .with_null("pool_mode"),
        ],
    );

    let collector = DatabasesCollector::new();
    let registry = Registry::new();
    collector.register_metrics(&registry)?;
    collector
        .collect(&Store::new(console), &Context::background())
        .await?;

    let families = gather(&registry);
    let pool_size = family(&families, "pgbouncer_databases_pool_size");
    assert_eq!(label(pool_size, "host"), Some(""));
    assert_eq!(label(pool_size, "force_user"), Some(""));
    assert_eq!(label(pool_size, "pool_mode"), Some(""));

    Ok(())
}
