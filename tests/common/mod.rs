#![allow(dead_code)]

use pgbouncer_exporter::{
    exporter::{ExporterOptions, serve},
    store::{AdminRow, MockConsole, Store},
};
use std::{net::SocketAddr, time::Duration};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};

/// A console answering every command the exporter issues.
pub fn scripted_console() -> MockConsole {
    MockConsole::new()
        .with_rows(
            "SHOW server_version",
            vec![AdminRow::new().with("server_version", "PgBouncer 1.22.1")],
        )
        .with_rows("SHOW STATS", vec![stats_row("pgbouncer", 0)])
        .with_rows("SHOW POOLS", vec![pools_row("pgbouncer", "myuser")])
        .with_rows("SHOW DATABASES", vec![databases_row("myname")])
        .with_rows(
            "SHOW LISTS",
            vec![
                AdminRow::new().with("list", "databases").with_int("items", 1),
                AdminRow::new().with("list", "free_clients").with_int("items", 49),
            ],
        )
}

/// A `SHOW STATS` row whose counters are `base + 1` .. `base + 17`.
pub fn stats_row(database: &str, base: i64) -> AdminRow {
    AdminRow::new()
        .with("database", database)
        .with_int("total_requests", base + 1)
        .with_int("total_received", base + 2)
        .with_int("total_sent", base + 3)
        .with_int("total_query_time", base + 4)
        .with_int("total_xact_count", base + 5)
        .with_int("total_xact_time", base + 6)
        .with_int("total_query_count", base + 7)
        .with_int("total_wait_time", base + 8)
        .with_int("avg_req", base + 9)
        .with_int("avg_recv", base + 10)
        .with_int("avg_sent", base + 11)
        .with_int("avg_query", base + 12)
        .with_int("avg_query_count", base + 13)
        .with_int("avg_query_time", base + 14)
        .with_int("avg_xact_time", base + 15)
        .with_int("avg_xact_count", base + 16)
        .with_int("avg_wait_time", base + 17)
}

pub fn pools_row(database: &str, user: &str) -> AdminRow {
    AdminRow::new()
        .with("database", database)
        .with("user", user)
        .with_int("cl_active", 1)
        .with_int("cl_waiting", 2)
        .with_int("sv_active", 3)
        .with_int("sv_idle", 4)
        .with_int("sv_used", 5)
        .with_int("sv_tested", 6)
        .with_int("sv_login", 7)
        .with_int("maxwait", 8)
        .with_int("maxwait_us", 500_000)
        .with("pool_mode", "transaction")
}

pub fn databases_row(name: &str) -> AdminRow {
    AdminRow::new()
        .with("name", name)
        .with("host", "localhost")
        .with_int("port", 23)
        .with("database", "pgbouncer")
        .with("force_user", "myuser")
        .with_int("pool_size", 4)
        .with_int("reserve_pool", 5)
        .with("pool_mode", "session")
        .with_int("max_connections", 7)
        .with_int("current_connections", 8)
        .with_int("paused", 0)
        .with_int("disabled", 1)
}

/// A running exporter bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn start(console: MockConsole, options: ExporterOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().expect("Failed to get local addr");

        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            serve(listener, Store::new(console), &options, async move {
                let _ = rx.await;
            })
            .await
        });

        Self {
            addr,
            shutdown: Some(tx),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Signal shutdown and wait for the server task to finish.
    pub async fn stop(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), self.handle).await??
    }
}

pub fn options(collectors: &[&str]) -> ExporterOptions {
    ExporterOptions {
        collectors: collectors.iter().map(|s| (*s).to_string()).collect(),
        ..ExporterOptions::default()
    }
}
