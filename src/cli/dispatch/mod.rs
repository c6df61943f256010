use crate::{
    cli::actions::Action,
    collectors::{COLLECTOR_NAMES, Collector, all_factories},
};
use anyhow::{Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;
use std::time::Duration;
use tracing::debug;

/// Turn parsed arguments into an [`Action`].
///
/// # Errors
///
/// Returns an error if a required argument is missing
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    // Get the port or return an error
    let port = matches
        .get_one::<u16>("port")
        .copied()
        .ok_or_else(|| anyhow!("Port is required. Please provide it using the --port flag."))?;

    // None means auto-detect
    let listen = matches.get_one::<String>("listen").cloned();

    let dsn = SecretString::from(
        matches
            .get_one::<String>("dsn")
            .cloned()
            .ok_or_else(|| anyhow!("DSN is required. Please provide it using the --dsn flag."))?,
    );

    let timeout = matches
        .get_one::<u64>("timeout")
        .copied()
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow!("Timeout is required. Please provide it using the --timeout flag."))?;

    let allow_extra_columns = matches.get_flag("allow-extra-columns");

    let collectors = get_enabled_collectors(matches);

    debug!(?collectors, ?timeout, allow_extra_columns, "configuration");

    Ok(Action::Run {
        port,
        listen,
        dsn,
        collectors,
        timeout,
        allow_extra_columns,
    })
}

#[must_use]
pub fn get_enabled_collectors(matches: &ArgMatches) -> Vec<String> {
    let factories = all_factories();

    COLLECTOR_NAMES
        .iter()
        .filter(|&name| {
            let enable_flag = format!("collector.{name}");
            let disable_flag = format!("no-collector.{name}");

            // If explicitly disabled, skip it
            if matches.get_flag(&disable_flag) {
                return false;
            }

            if matches.get_flag(&enable_flag) {
                return true;
            }

            factories
                .get(name)
                .is_some_and(|factory| factory().enabled_by_default())
        })
        .map(|&name| name.to_string())
        .collect()
}
