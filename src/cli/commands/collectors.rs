use crate::collectors::{COLLECTOR_NAMES, Collector, all_factories};
use clap::{Arg, ArgAction, Command};

/// Add `--collector.<name>` / `--no-collector.<name>` for every collector.
pub fn add_collectors_args(mut cmd: Command) -> Command {
    let factories = all_factories();

    for &name in COLLECTOR_NAMES {
        let default_enabled = factories
            .get(name)
            .is_some_and(|factory| factory().enabled_by_default());

        let default_indicator = if default_enabled {
            " [default: enabled]"
        } else {
            " [default: disabled]"
        };

        // clap ids and long names must outlive the command
        let enable_flag: &'static str = Box::leak(format!("collector.{name}").into_boxed_str());
        let disable_flag: &'static str =
            Box::leak(format!("no-collector.{name}").into_boxed_str());

        cmd = cmd
            .arg(
                Arg::new(enable_flag)
                    .long(enable_flag)
                    .help(format!("Enable the {name} collector{default_indicator}"))
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new(disable_flag)
                    .long(disable_flag)
                    .help(format!("Disable the {name} collector"))
                    .action(ArgAction::SetTrue)
                    .overrides_with(enable_flag),
            );
    }
    cmd
}
