use crate::store::{console::AdminConnection, rows::AdminRow};
use futures::future::BoxFuture;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

#[derive(Clone, Debug)]
enum Response {
    Rows(Vec<AdminRow>),
    Failure(String),
}

#[derive(Debug, Default)]
struct State {
    responses: HashMap<String, Response>,
    issued: Vec<String>,
    latency: Option<Duration>,
    closed: bool,
}

/// Scripted admin console for tests.
///
/// Answers only the commands it was given; anything else, including the
/// generic `;` and `SELECT 1` probes, fails the way the real console does.
/// Clones share state, so a test can keep a handle after moving one into a
/// store.
///
/// ```
/// use pgbouncer_exporter::store::{AdminRow, Context, MockConsole, Store};
///
/// # tokio_test_block(async {
/// let console = MockConsole::new().with_rows(
///     "SHOW LISTS",
///     vec![AdminRow::new().with("list", "free_clients").with_int("items", 3)],
/// );
/// let store = Store::new(console);
/// let lists = store.get_lists(&Context::background()).await.unwrap();
/// assert_eq!(lists[0].items, 3);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockConsole {
    state: Arc<Mutex<State>>,
}

impl MockConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `command` with `rows`.
    #[must_use]
    pub fn with_rows(self, command: impl Into<String>, rows: Vec<AdminRow>) -> Self {
        self.state()
            .responses
            .insert(command.into(), Response::Rows(rows));
        self
    }

    /// Fail `command` with a protocol error carrying `message`.
    #[must_use]
    pub fn with_failure(self, command: impl Into<String>, message: impl Into<String>) -> Self {
        self.state()
            .responses
            .insert(command.into(), Response::Failure(message.into()));
        self
    }

    /// Delay every answer, to exercise cancellation.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = Some(latency);
        self
    }

    /// Commands received so far, in order.
    #[must_use]
    pub fn issued(&self) -> Vec<String> {
        self.state().issued.clone()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AdminConnection for MockConsole {
    fn fetch<'a>(&'a self, command: &'a str) -> BoxFuture<'a, Result<Vec<AdminRow>, sqlx::Error>> {
        Box::pin(async move {
            let (latency, response) = {
                let mut state = self.state();
                if state.closed {
                    return Err(sqlx::Error::PoolClosed);
                }
                state.issued.push(command.to_string());
                (state.latency, state.responses.get(command).cloned())
            };

            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            match response {
                Some(Response::Rows(rows)) => Ok(rows),
                Some(Response::Failure(message)) => Err(sqlx::Error::Protocol(message)),
                None => Err(sqlx::Error::Protocol(format!(
                    "invalid command '{command}', use SHOW HELP;"
                ))),
            }
        })
    }

    fn close(&self) -> BoxFuture<'_, Result<(), sqlx::Error>> {
        Box::pin(async move {
            let mut state = self.state();
            if state.closed {
                return Err(sqlx::Error::PoolClosed);
            }
            state.closed = true;
            Ok(())
        })
    }
}
