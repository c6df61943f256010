use crate::store::{error::ConnectionError, rows::AdminRow};
use futures::future::BoxFuture;
use secrecy::{ExposeSecret, SecretString};
use sqlx::{
    Column, Connection, Row,
    postgres::{PgConnectOptions, PgConnection, PgRow},
};
use std::str::FromStr;
use tokio::sync::Mutex;
use tracing::debug;

/// A session on the admin console.
///
/// The store only ever sends whole commands and reads whole result sets, so
/// this is the seam where tests substitute a scripted console.
pub trait AdminConnection: Send + Sync {
    /// Run one command and return every row it produced, in order.
    fn fetch<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<Vec<AdminRow>, sqlx::Error>>;

    /// Release the session.
    fn close(&self) -> BoxFuture<'_, Result<(), sqlx::Error>>;
}

#[derive(Debug, Default)]
struct Session {
    connection: Option<PgConnection>,
    closed: bool,
}

/// Admin console reached through one dedicated sqlx connection.
///
/// A `PgPool` is not used: it pings every connection it takes back, and the
/// ping is an extended-protocol `Sync` the console does not serve. Commands
/// queue on the session, the connection is opened on first use and reopened
/// after a transport failure.
#[derive(Debug)]
pub struct PgConsole {
    options: PgConnectOptions,
    session: Mutex<Session>,
}

impl PgConsole {
    /// Configure the console client without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError`] when the DSN cannot be parsed.
    pub fn connect(dsn: &SecretString) -> Result<Self, ConnectionError> {
        // pgbouncer refuses unknown startup parameters
        let options =
            PgConnectOptions::from_str(dsn.expose_secret())?.extra_float_digits(None::<i8>);

        Ok(Self {
            options,
            session: Mutex::new(Session::default()),
        })
    }
}

impl AdminConnection for PgConsole {
    fn fetch<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<Vec<AdminRow>, sqlx::Error>> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            if session.closed {
                return Err(sqlx::Error::PoolClosed);
            }

            // taken out so a dropped (cancelled) call also drops a half-read connection
            let mut connection = match session.connection.take() {
                Some(connection) => connection,
                None => {
                    debug!("opening admin console session");
                    PgConnection::connect_with(&self.options).await?
                }
            };

            // simple query protocol, the console has no prepared statements
            match sqlx::Executor::fetch_all(&mut connection, sqlx::raw_sql(command)).await {
                Ok(rows) => {
                    session.connection = Some(connection);
                    rows.iter().map(admin_row).collect()
                }
                // the console answered, the session is still usable
                Err(e @ sqlx::Error::Database(_)) => {
                    session.connection = Some(connection);
                    Err(e)
                }
                Err(e) => Err(e),
            }
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), sqlx::Error>> {
        Box::pin(async move {
            let mut session = self.session.lock().await;
            if session.closed {
                return Err(sqlx::Error::PoolClosed);
            }
            session.closed = true;

            match session.connection.take() {
                Some(connection) => connection.close().await,
                None => Ok(()),
            }
        })
    }
}

fn admin_row(row: &PgRow) -> Result<AdminRow, sqlx::Error> {
    let mut admin = AdminRow::with_capacity(row.len());
    for column in row.columns() {
        // text protocol: every value arrives as text whatever its declared type
        let value: Option<String> = row.try_get_unchecked(column.ordinal())?;
        admin.push(column.name(), value);
    }
    Ok(admin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_malformed_dsn() {
        let dsn = SecretString::from("postgresql://user@localhost:notaport/pgbouncer");
        assert!(PgConsole::connect(&dsn).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_console_fails_each_call() {
        // nothing listens on port 1
        let dsn = SecretString::from("postgresql://pgbouncer@127.0.0.1:1/pgbouncer?sslmode=disable");
        let console = PgConsole::connect(&dsn).unwrap();

        assert!(console.fetch("SHOW LISTS").await.is_err());
        assert!(console.fetch("SHOW LISTS").await.is_err());

        assert!(console.close().await.is_ok());
        assert!(matches!(
            console.fetch("SHOW LISTS").await,
            Err(sqlx::Error::PoolClosed)
        ));
        assert!(matches!(
            console.close().await,
            Err(sqlx::Error::PoolClosed)
        ));
    }
}
