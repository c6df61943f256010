//! Row decoding.
//!
//! The console answers in text. An [`AdminRow`] holds one result row as
//! column names and optional text values; the `*Row` shapes decode it by
//! column name, keeping nullable columns as `Option<String>` until they are
//! converted into the public records.

use crate::store::{
    command::AdminCommand,
    error::DecodeError,
    records::{Database, List, Pool, Stat},
};

/// One result row as returned by the console.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdminRow {
    columns: Vec<(String, Option<String>)>,
}

impl AdminRow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Set a text column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, Some(value.into()));
        self
    }

    /// Set an integer column, rendered the way the console sends it.
    #[must_use]
    pub fn with_int(mut self, column: impl Into<String>, value: i64) -> Self {
        self.push(column, Some(value.to_string()));
        self
    }

    /// Set a column to NULL.
    #[must_use]
    pub fn with_null(mut self, column: impl Into<String>) -> Self {
        self.push(column, None);
        self
    }

    /// Append a column, or overwrite it in place if already present.
    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        let column = column.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => slot.1 = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|(name, _)| name == column)
    }

    /// `None` when the column is absent, `Some(None)` when it is NULL.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<Option<&str>> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_deref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn required(&self, column: &'static str) -> Result<&str, DecodeError> {
        match self.value(column) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(DecodeError::NullValue { column }),
            None => Err(DecodeError::MissingColumn { column }),
        }
    }

    fn text(&self, column: &'static str) -> Result<String, DecodeError> {
        self.required(column).map(str::to_string)
    }

    fn nullable_text(&self, column: &str) -> Option<String> {
        self.value(column).flatten().map(str::to_string)
    }

    fn integer(&self, column: &'static str) -> Result<i64, DecodeError> {
        let value = self.required(column)?;
        value
            .trim()
            .parse::<i64>()
            .map_err(|source| DecodeError::InvalidInteger {
                column,
                value: value.to_string(),
                source,
            })
    }
}

/// Decodes one row into an intermediate shape.
pub trait FromAdminRow: Sized {
    /// # Errors
    ///
    /// Returns a [`DecodeError`] when a required column is missing, NULL or
    /// not an integer where one is expected.
    fn from_admin_row(row: &AdminRow) -> Result<Self, DecodeError>;
}

/// A public record produced by one admin command.
pub trait AdminRecord: Sized {
    const COMMAND: AdminCommand;
    type Row: FromAdminRow + Into<Self>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatRow {
    pub database: String,
    pub total_requests: i64,
    pub total_received: i64,
    pub total_sent: i64,
    pub total_query_time: i64,
    pub total_xact_count: i64,
    pub total_xact_time: i64,
    pub total_query_count: i64,
    pub total_wait_time: i64,
    pub avg_req: i64,
    pub avg_recv: i64,
    pub avg_sent: i64,
    pub avg_query: i64,
    pub avg_query_count: i64,
    pub avg_query_time: i64,
    pub avg_xact_time: i64,
    pub avg_xact_count: i64,
    pub avg_wait_time: i64,
}

impl FromAdminRow for StatRow {
    fn from_admin_row(row: &AdminRow) -> Result<Self, DecodeError> {
        Ok(Self {
            database: row.text("database")?,
            total_requests: row.integer("total_requests")?,
            total_received: row.integer("total_received")?,
            total_sent: row.integer("total_sent")?,
            total_query_time: row.integer("total_query_time")?,
            total_xact_count: row.integer("total_xact_count")?,
            total_xact_time: row.integer("total_xact_time")?,
            total_query_count: row.integer("total_query_count")?,
            total_wait_time: row.integer("total_wait_time")?,
            avg_req: row.integer("avg_req")?,
            avg_recv: row.integer("avg_recv")?,
            avg_sent: row.integer("avg_sent")?,
            avg_query: row.integer("avg_query")?,
            avg_query_count: row.integer("avg_query_count")?,
            avg_query_time: row.integer("avg_query_time")?,
            avg_xact_time: row.integer("avg_xact_time")?,
            avg_xact_count: row.integer("avg_xact_count")?,
            avg_wait_time: row.integer("avg_wait_time")?,
        })
    }
}

impl From<StatRow> for Stat {
    fn from(row: StatRow) -> Self {
        Self {
            database: row.database,
            total_requests: row.total_requests,
            total_received: row.total_received,
            total_sent: row.total_sent,
            total_query_time: row.total_query_time,
            total_xact_count: row.total_xact_count,
            total_xact_time: row.total_xact_time,
            total_query_count: row.total_query_count,
            total_wait_time: row.total_wait_time,
            average_requests: row.avg_req,
            average_received: row.avg_recv,
            average_sent: row.avg_sent,
            average_query: row.avg_query,
            average_query_count: row.avg_query_count,
            average_query_time: row.avg_query_time,
            average_xact_time: row.avg_xact_time,
            average_xact_count: row.avg_xact_count,
            average_wait_time: row.avg_wait_time,
        }
    }
}

impl AdminRecord for Stat {
    const COMMAND: AdminCommand = AdminCommand::Stats;
    type Row = StatRow;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolRow {
    pub database: String,
    pub user: String,
    pub cl_active: i64,
    pub cl_waiting: i64,
    pub sv_active: i64,
    pub sv_idle: i64,
    pub sv_used: i64,
    pub sv_tested: i64,
    pub sv_login: i64,
    pub maxwait: i64,
    pub maxwait_us: i64,
    pub pool_mode: Option<String>,
}

impl FromAdminRow for PoolRow {
    fn from_admin_row(row: &AdminRow) -> Result<Self, DecodeError> {
        Ok(Self {
            database: row.text("database")?,
            user: row.text("user")?,
            cl_active: row.integer("cl_active")?,
            cl_waiting: row.integer("cl_waiting")?,
            sv_active: row.integer("sv_active")?,
            sv_idle: row.integer("sv_idle")?,
            sv_used: row.integer("sv_used")?,
            sv_tested: row.integer("sv_tested")?,
            sv_login: row.integer("sv_login")?,
            maxwait: row.integer("maxwait")?,
            maxwait_us: row.integer("maxwait_us")?,
            pool_mode: row.nullable_text("pool_mode"),
        })
    }
}

impl From<PoolRow> for Pool {
    fn from(row: PoolRow) -> Self {
        Self {
            database: row.database,
            user: row.user,
            client_active: row.cl_active,
            client_waiting: row.cl_waiting,
            server_active: row.sv_active,
            server_idle: row.sv_idle,
            server_used: row.sv_used,
            server_tested: row.sv_tested,
            server_login: row.sv_login,
            max_wait: row.maxwait,
            max_wait_microseconds: row.maxwait_us,
            pool_mode: row.pool_mode.unwrap_or_default(),
        }
    }
}

impl AdminRecord for Pool {
    const COMMAND: AdminCommand = AdminCommand::Pools;
    type Row = PoolRow;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseRow {
    pub name: String,
    pub host: Option<String>,
    pub port: i64,
    pub database: String,
    pub force_user: Option<String>,
    pub pool_size: i64,
    pub reserve_pool: i64,
    pub pool_mode: Option<String>,
    pub max_connections: i64,
    pub current_connections: i64,
    pub paused: i64,
    pub disabled: i64,
}

impl FromAdminRow for DatabaseRow {
    fn from_admin_row(row: &AdminRow) -> Result<Self, DecodeError> {
        Ok(Self {
            name: row.text("name")?,
            host: row.nullable_text("host"),
            port: row.integer("port")?,
            database: row.text("database")?,
            force_user: row.nullable_text("force_user"),
            pool_size: row.integer("pool_size")?,
            reserve_pool: row.integer("reserve_pool")?,
            pool_mode: row.nullable_text("pool_mode"),
            max_connections: row.integer("max_connections")?,
            current_connections: row.integer("current_connections")?,
            paused: row.integer("paused")?,
            disabled: row.integer("disabled")?,
        })
    }
}

impl From<DatabaseRow> for Database {
    fn from(row: DatabaseRow) -> Self {
        Self {
            name: row.name,
            host: row.host.unwrap_or_default(),
            port: row.port,
            database: row.database,
            force_user: row.force_user.unwrap_or_default(),
            pool_size: row.pool_size,
            reserve_pool: row.reserve_pool,
            pool_mode: row.pool_mode.unwrap_or_default(),
            max_connections: row.max_connections,
            current_connections: row.current_connections,
            paused: row.paused,
            disabled: row.disabled,
        }
    }
}

impl AdminRecord for Database {
    const COMMAND: AdminCommand = AdminCommand::Databases;
    type Row = DatabaseRow;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListRow {
    pub list: String,
    pub items: i64,
}

impl FromAdminRow for ListRow {
    fn from_admin_row(row: &AdminRow) -> Result<Self, DecodeError> {
        Ok(Self {
            list: row.text("list")?,
            items: row.integer("items")?,
        })
    }
}

impl From<ListRow> for List {
    fn from(row: ListRow) -> Self {
        Self {
            list: row.list,
            items: row.items,
        }
    }
}

impl AdminRecord for List {
    const COMMAND: AdminCommand = AdminCommand::Lists;
    type Row = ListRow;
}
