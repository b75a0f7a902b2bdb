//! Turns parsed arguments into the library's run configuration.

use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use planetary_fetch::{HttpTimeouts, OverwritePolicy, RunConfig};

use crate::ProcessExit;
use crate::cli::Args;

/// Which arguments were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) level: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let matches = Args::command()
        .try_get_matches()
        .unwrap_or_else(|err| exit_on_parse_error(&err));
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| exit_on_parse_error(&err));
    let sources = sources_from_matches(&matches);
    (args, sources)
}

/// Help and version exit 0; usage errors exit like any configuration error.
fn exit_on_parse_error(err: &clap::Error) -> ! {
    if !err.use_stderr() {
        err.exit();
    }
    let _ = err.print();
    std::process::exit(i32::from(ProcessExit::Failure.code()))
}

fn sources_from_matches(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        level: is_commandline_value(matches, "level"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// `RUST_LOG` wins over the default level, but not over an explicit `--level`.
pub(crate) fn should_force_cli_log_level(sources: &CliValueSources) -> bool {
    sources.level
}

pub(crate) fn build_run_config(args: &Args) -> RunConfig {
    let mut config = RunConfig::new(args.ids.clone(), args.output_dir.clone());
    config.log_level = args.level;
    config.show_progress = !args.disable_tqdm;
    config.max_workers = usize::from(args.max_workers);
    config.overwrite = if args.skip_existing {
        OverwritePolicy::SkipExisting
    } else {
        OverwritePolicy::Overwrite
    };
    config.layout = args.layout.into();
    config.extensions = args
        .extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect();
    config.save_metadata = args.save_metadata;
    config
}

pub(crate) fn http_timeouts(args: &Args) -> HttpTimeouts {
    HttpTimeouts {
        connect_secs: args.connect_timeout,
        read_secs: args.read_timeout,
    }
}
