use crate::cli::{actions::Action, commands, dispatch::handler, telemetry};
use anyhow::Result;
use tracing::{Level, info};

/// `-v` count to log level; without `-v` only errors are shown unless
/// `RUST_LOG` says otherwise.
const fn verbosity(count: u8) -> Option<Level> {
    match count {
        0 => None,
        1 => Some(Level::INFO),
        2 => Some(Level::DEBUG),
        _ => Some(Level::TRACE),
    }
}

/// Parse arguments, install logging and resolve the action to run.
///
/// # Errors
///
/// Returns an error if telemetry initialization or argument handling fails
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    telemetry::init(verbosity(matches.get_count("verbose")))?;

    let action = handler(&matches)?;

    let Action::Run {
        port,
        ref listen,
        ref collectors,
        timeout,
        ..
    } = action;
    info!(
        port,
        listen = listen.as_deref().unwrap_or("auto"),
        ?collectors,
        timeout_secs = timeout.as_secs(),
        "starting pgbouncer exporter"
    );

    Ok(action)
}
