//! The fixed vocabulary of the admin console.
//!
//! Each command maps to the columns it is expected to return. Read operations
//! validate every row against this table before decoding it.

use crate::store::{error::DecodeError, rows::AdminRow};
use std::fmt;

/// One expected result column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    /// Nullable columns may also be missing from the result altogether.
    pub nullable: bool,
}

const fn required(name: &'static str) -> Column {
    Column {
        name,
        nullable: false,
    }
}

const fn nullable(name: &'static str) -> Column {
    Column {
        name,
        nullable: true,
    }
}

const STATS_COLUMNS: &[Column] = &[
    required("database"),
    required("total_requests"),
    required("total_received"),
    required("total_sent"),
    required("total_query_time"),
    required("total_xact_count"),
    required("total_xact_time"),
    required("total_query_count"),
    required("total_wait_time"),
    required("avg_req"),
    required("avg_recv"),
    required("avg_sent"),
    required("avg_query"),
    required("avg_query_count"),
    required("avg_query_time"),
    required("avg_xact_time"),
    required("avg_xact_count"),
    required("avg_wait_time"),
];

const POOLS_COLUMNS: &[Column] = &[
    required("database"),
    required("user"),
    required("cl_active"),
    required("cl_waiting"),
    required("sv_active"),
    required("sv_idle"),
    required("sv_used"),
    required("sv_tested"),
    required("sv_login"),
    required("maxwait"),
    required("maxwait_us"),
    nullable("pool_mode"),
];

const DATABASES_COLUMNS: &[Column] = &[
    required("name"),
    nullable("host"),
    required("port"),
    required("database"),
    nullable("force_user"),
    required("pool_size"),
    required("reserve_pool"),
    nullable("pool_mode"),
    required("max_connections"),
    required("current_connections"),
    required("paused"),
    required("disabled"),
];

const LISTS_COLUMNS: &[Column] = &[required("list"), required("items")];

/// How columns outside the command table are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnPolicy {
    /// Reject rows carrying columns the table does not know.
    #[default]
    Strict,
    /// Ignore unknown columns (newer console releases add some).
    Lenient,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdminCommand {
    Stats,
    Pools,
    Databases,
    Lists,
    ServerVersion,
}

impl AdminCommand {
    pub const ALL: [Self; 5] = [
        Self::Stats,
        Self::Pools,
        Self::Databases,
        Self::Lists,
        Self::ServerVersion,
    ];

    /// Command text, exactly as the console expects it.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Stats => "SHOW STATS",
            Self::Pools => "SHOW POOLS",
            Self::Databases => "SHOW DATABASES",
            Self::Lists => "SHOW LISTS",
            Self::ServerVersion => "SHOW server_version",
        }
    }

    /// Expected columns, `None` when the result is discarded.
    #[must_use]
    pub const fn columns(self) -> Option<&'static [Column]> {
        match self {
            Self::Stats => Some(STATS_COLUMNS),
            Self::Pools => Some(POOLS_COLUMNS),
            Self::Databases => Some(DATABASES_COLUMNS),
            Self::Lists => Some(LISTS_COLUMNS),
            Self::ServerVersion => None,
        }
    }

    #[must_use]
    pub fn column(self, name: &str) -> Option<Column> {
        self.columns()?.iter().copied().find(|c| c.name == name)
    }

    /// Check a row's column set against the table.
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` for an absent required column and, under
    /// [`ColumnPolicy::Strict`], `UnexpectedColumn` for a column the table
    /// does not list.
    pub fn validate(self, row: &AdminRow, policy: ColumnPolicy) -> Result<(), DecodeError> {
        let Some(columns) = self.columns() else {
            return Ok(());
        };

        if let Some(missing) = columns
            .iter()
            .find(|c| !c.nullable && !row.contains(c.name))
        {
            return Err(DecodeError::MissingColumn {
                column: missing.name,
            });
        }

        if policy == ColumnPolicy::Strict
            && let Some(extra) = row
                .column_names()
                .find(|name| !columns.iter().any(|c| c.name == *name))
        {
            return Err(DecodeError::UnexpectedColumn {
                column: extra.to_string(),
            });
        }

        Ok(())
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_text_is_exact() {
        assert_eq!(AdminCommand::Stats.text(), "SHOW STATS");
        assert_eq!(AdminCommand::Pools.text(), "SHOW POOLS");
        assert_eq!(AdminCommand::Databases.text(), "SHOW DATABASES");
        assert_eq!(AdminCommand::Lists.text(), "SHOW LISTS");
        assert_eq!(AdminCommand::ServerVersion.text(), "SHOW server_version");
        assert_eq!(AdminCommand::Pools.to_string(), "SHOW POOLS");
    }

    #[test]
    fn test_nullable_columns() {
        let nullable: Vec<(AdminCommand, &str)> = AdminCommand::ALL
            .iter()
            .filter_map(|cmd| cmd.columns().map(|cols| (*cmd, cols)))
            .flat_map(|(cmd, cols)| {
                cols.iter()
                    .filter(|c| c.nullable)
                    .map(move |c| (cmd, c.name))
            })
            .collect();

        assert_eq!(
            nullable,
            vec![
                (AdminCommand::Pools, "pool_mode"),
                (AdminCommand::Databases, "host"),
                (AdminCommand::Databases, "force_user"),
                (AdminCommand::Databases, "pool_mode"),
            ]
        );
    }

    #[test]
    fn test_server_version_has_no_shape() {
        assert!(AdminCommand::ServerVersion.columns().is_none());
        let row = AdminRow::new().with("anything", "at all");
        assert!(
            AdminCommand::ServerVersion
                .validate(&row, ColumnPolicy::Strict)
                .is_ok()
        );
    }

    #[test]
    fn test_validate_missing_required_column() {
        let row = AdminRow::new().with("list", "free_clients");
        let err = AdminCommand::Lists
            .validate(&row, ColumnPolicy::Lenient)
            .unwrap_err();
        assert!(matches!(err, DecodeError::MissingColumn { column: "items" }));
    }

    #[test]
    fn test_validate_absent_nullable_column() {
        let row = AdminRow::new()
            .with("database", "app")
            .with("user", "app")
            .with_int("cl_active", 0)
            .with_int("cl_waiting", 0)
            .with_int("sv_active", 0)
            .with_int("sv_idle", 0)
            .with_int("sv_used", 0)
            .with_int("sv_tested", 0)
            .with_int("sv_login", 0)
            .with_int("maxwait", 0)
            .with_int("maxwait_us", 0);
        assert!(
            AdminCommand::Pools
                .validate(&row, ColumnPolicy::Strict)
                .is_ok()
        );
    }

    #[test]
    fn test_validate_extra_column_by_policy() {
        let row = AdminRow::new()
            .with("list", "free_clients")
            .with_int("items", 3)
            .with_int("bytes", 10);

        let err = AdminCommand::Lists
            .validate(&row, ColumnPolicy::Strict)
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedColumn { ref column } if column == "bytes"));

        assert!(
            AdminCommand::Lists
                .validate(&row, ColumnPolicy::Lenient)
                .is_ok()
        );
    }

    #[test]
    fn test_column_lookup() {
        assert_eq!(
            AdminCommand::Databases.column("host"),
            Some(Column {
                name: "host",
                nullable: true
            })
        );
        assert_eq!(AdminCommand::Databases.column("nope"), None);
        assert_eq!(AdminCommand::ServerVersion.column("server_version"), None);
    }
}
