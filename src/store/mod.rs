//! Acquisition layer for the `PgBouncer` admin console.
//!
//! The console is addressed like a database (`pgbouncer` virtual database)
//! but only understands a handful of `SHOW` commands. [`Store`] issues those
//! commands over one [`AdminConnection`] and maps each result row to a typed
//! record:
//!
//! | Operation | Command | Record |
//! |---|---|---|
//! | [`Store::get_stats`] | `SHOW STATS` | [`Stat`] |
//! | [`Store::get_pools`] | `SHOW POOLS` | [`Pool`] |
//! | [`Store::get_databases`] | `SHOW DATABASES` | [`Database`] |
//! | [`Store::get_lists`] | `SHOW LISTS` | [`List`] |
//! | [`Store::check_health`] | `SHOW server_version` | none |
//!
//! Nothing is cached or retried. Rows come back in console order and a
//! single undecodable row fails the whole call.

pub mod command;
pub mod console;
pub mod context;
pub mod error;
pub mod mock;
pub mod records;
pub mod rows;

pub use command::{AdminCommand, Column, ColumnPolicy};
pub use console::{AdminConnection, PgConsole};
pub use context::{Context, Interrupted};
pub use error::{CloseError, ConnectionError, DecodeError, HealthError, QueryError};
pub use mock::MockConsole;
pub use records::{Database, List, Pool, Stat};
pub use rows::{AdminRecord, AdminRow, FromAdminRow};

use secrecy::SecretString;
use tracing::{debug, debug_span, instrument};
use tracing_futures::Instrument as _;

/// Owns one admin console session and reads typed records from it.
///
/// The store adds no locking of its own; concurrent calls are as safe as the
/// connection makes them (`PgConsole` queues them on its single session).
#[derive(Debug)]
pub struct Store<C = PgConsole> {
    connection: C,
    policy: ColumnPolicy,
}

impl Store<PgConsole> {
    /// Build a store on a console client that connects on first use.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the DSN cannot be parsed.
    pub fn connect(dsn: &SecretString) -> Result<Self, ConnectionError> {
        Ok(Self::new(PgConsole::connect(dsn)?))
    }
}

impl<C: AdminConnection> Store<C> {
    pub const fn new(connection: C) -> Self {
        Self {
            connection,
            policy: ColumnPolicy::Strict,
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ColumnPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn policy(&self) -> ColumnPolicy {
        self.policy
    }

    pub const fn connection(&self) -> &C {
        &self.connection
    }

    /// Aggregate traffic statistics per database.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] on transport failure, cancellation or an
    /// undecodable row.
    pub async fn get_stats(&self, ctx: &Context) -> Result<Vec<Stat>, QueryError> {
        self.fetch(ctx).await
    }

    /// Pool occupancy per (database, user).
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] on transport failure, cancellation or an
    /// undecodable row.
    pub async fn get_pools(&self, ctx: &Context) -> Result<Vec<Pool>, QueryError> {
        self.fetch(ctx).await
    }

    /// Configured backend databases.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] on transport failure, cancellation or an
    /// undecodable row.
    pub async fn get_databases(&self, ctx: &Context) -> Result<Vec<Database>, QueryError> {
        self.fetch(ctx).await
    }

    /// Item counts of the console's internal lists.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] on transport failure, cancellation or an
    /// undecodable row.
    pub async fn get_lists(&self, ctx: &Context) -> Result<Vec<List>, QueryError> {
        self.fetch(ctx).await
    }

    /// Liveness probe.
    ///
    /// The console rejects the empty query standard clients ping with, so this
    /// runs `SHOW server_version` and ignores what comes back.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError`] on transport failure or cancellation.
    #[instrument(skip(self, ctx), level = "debug", err, fields(db.system = "pgbouncer", otel.kind = "client"))]
    pub async fn check_health(&self, ctx: &Context) -> Result<(), HealthError> {
        ctx.run(self.connection.fetch(AdminCommand::ServerVersion.text()))
            .await?
            .map_err(|source| HealthError::Transport { source })?;
        Ok(())
    }

    /// Release the console session. Call once.
    ///
    /// # Errors
    ///
    /// Returns [`CloseError`] if the session cannot be released or was
    /// already closed.
    pub async fn close(&self) -> Result<(), CloseError> {
        self.connection.close().await?;
        debug!("admin console connection closed");
        Ok(())
    }

    async fn fetch<T: AdminRecord>(&self, ctx: &Context) -> Result<Vec<T>, QueryError> {
        let command = T::COMMAND;

        let span = debug_span!(
            "db.query",
            otel.kind = "client",
            db.system = "pgbouncer",
            db.operation = "SHOW",
            db.statement = command.text()
        );

        let rows = ctx
            .run(self.connection.fetch(command.text()))
            .instrument(span)
            .await
            .map_err(|reason| QueryError::interrupted(command, reason))?
            .map_err(|source| QueryError::Transport { command, source })?;

        let records = decode_rows::<T>(&rows, self.policy)?;

        debug!(command = command.text(), rows = records.len(), "decoded admin console rows");

        Ok(records)
    }
}

/// Decode every row or none.
fn decode_rows<T: AdminRecord>(rows: &[AdminRow], policy: ColumnPolicy) -> Result<Vec<T>, QueryError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            T::COMMAND
                .validate(row, policy)
                .and_then(|()| <T::Row as FromAdminRow>::from_admin_row(row))
                .map(Into::into)
                .map_err(|source| QueryError::Decode {
                    command: T::COMMAND,
                    row: index,
                    source,
                })
        })
        .collect()
}
