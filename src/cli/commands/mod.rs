use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

mod collectors;

pub const DEFAULT_DSN: &str = "postgresql://pgbouncer@localhost:6432/pgbouncer";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let cmd = Command::new("pgbouncer_exporter")
        .about("PgBouncer metric exporter for Prometheus")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(crate::exporter::GIT_COMMIT_HASH)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("9127")
                .env("PGBOUNCER_EXPORTER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("listen")
                .short('l')
                .long("listen")
                .help("IP address to bind to (default: [::] with 0.0.0.0 fallback)")
                .env("PGBOUNCER_EXPORTER_LISTEN")
                .value_name("IP"),
        )
        .arg(
            Arg::new("dsn")
                .long("dsn")
                .help("PgBouncer admin console connection string")
                .default_value(DEFAULT_DSN)
                .env("PGBOUNCER_EXPORTER_DSN")
                .value_name("DSN")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Deadline in seconds for each scrape or health check")
                .default_value("5")
                .env("PGBOUNCER_EXPORTER_TIMEOUT")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("allow-extra-columns")
                .long("allow-extra-columns")
                .help("Ignore result columns this exporter does not know (newer pgbouncer releases)")
                .env("PGBOUNCER_EXPORTER_ALLOW_EXTRA_COLUMNS")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity, -vv for debug")
                .action(ArgAction::Count),
        );

    collectors::add_collectors_args(cmd)
}
