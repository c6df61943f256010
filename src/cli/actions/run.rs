use crate::{
    cli::actions::Action,
    exporter::{ExporterOptions, new},
    store::ColumnPolicy,
};
use anyhow::Result;

/// Handle the run action
///
/// # Errors
///
/// Returns an error if the exporter cannot be configured or bound
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Run {
            port,
            listen,
            dsn,
            collectors,
            timeout,
            allow_extra_columns,
        } => {
            let column_policy = if allow_extra_columns {
                ColumnPolicy::Lenient
            } else {
                ColumnPolicy::Strict
            };

            let options = ExporterOptions {
                collectors,
                scrape_timeout: timeout,
                column_policy,
            };

            new(port, listen, dsn, options).await?;
        }
    }

    Ok(())
}
