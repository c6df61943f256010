//! Records returned by the store, one kind per administrative command.
//!
//! Records are plain owned values built fresh on every call. Nullable console
//! columns are already resolved to empty strings here.

use serde::Serialize;

/// Aggregate traffic counters for one database (`SHOW STATS`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub database: String,
    pub total_requests: i64,
    pub total_received: i64,
    pub total_sent: i64,
    pub total_query_time: i64,
    pub total_xact_count: i64,
    pub total_xact_time: i64,
    pub total_query_count: i64,
    pub total_wait_time: i64,
    pub average_requests: i64,
    pub average_received: i64,
    pub average_sent: i64,
    pub average_query: i64,
    pub average_query_count: i64,
    pub average_query_time: i64,
    pub average_xact_time: i64,
    pub average_xact_count: i64,
    pub average_wait_time: i64,
}

/// Connection occupancy of one (database, user) pool (`SHOW POOLS`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Pool {
    pub database: String,
    pub user: String,
    pub client_active: i64,
    pub client_waiting: i64,
    pub server_active: i64,
    pub server_idle: i64,
    pub server_used: i64,
    pub server_tested: i64,
    pub server_login: i64,
    pub max_wait: i64,
    pub max_wait_microseconds: i64,
    /// Empty when the console reports no pool mode override.
    pub pool_mode: String,
}

/// A configured backend database entry (`SHOW DATABASES`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Database {
    pub name: String,
    /// Empty for unix socket connections.
    pub host: String,
    pub port: i64,
    pub database: String,
    pub force_user: String,
    pub pool_size: i64,
    pub reserve_pool: i64,
    pub pool_mode: String,
    pub max_connections: i64,
    pub current_connections: i64,
    pub paused: i64,
    pub disabled: i64,
}

/// Item count of one internal list (`SHOW LISTS`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct List {
    pub list: String,
    pub items: i64,
}
