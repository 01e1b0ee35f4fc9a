use anyhow::Context;
use backtrace::Backtrace;
use clap::{value_parser, Arg, ArgAction, Command};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};

use std::path::PathBuf;

mod agent;
mod config;
mod discovery;
mod error;
mod latency;
mod output;
mod sampler;

use agent::Agent;
use config::{Config, Level};
use sampler::AdminCommand;

fn main() {
    // custom panic hook to terminate whole process after unwinding
    std::panic::set_hook(Box::new(|s| {
        eprintln!("{s}");
        eprintln!("{:?}", Backtrace::new());
        std::process::exit(101);
    }));

    // parse command line options
    let matches = Command::new(env!("CARGO_BIN_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_about(
            "rgwstat samples RADOS gateway perf counters through their admin \
            sockets and writes one value per file for a monitoring agent to \
            collect. It is meant to be run periodically, eg from cron.",
        )
        .arg(
            Arg::new("CONFIG")
                .help("Configuration file, built-in defaults are used if omitted")
                .value_parser(value_parser!(PathBuf))
                .action(ArgAction::Set)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .help("Log at debug level regardless of the configuration")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    // load config from file
    let config = match matches.get_one::<PathBuf>("CONFIG") {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(error) => {
                eprintln!("error loading config file: {path:?}\n{error}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    // configure debug log
    let level = if matches.get_flag("verbose") {
        config.log().level().max(Level::Debug)
    } else {
        config.log().level()
    };

    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::from(level))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(config) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(config: Config) -> anyhow::Result<()> {
    debug!(
        "sampling sockets matching {:?} in {:?}",
        config.general().socket_pattern(),
        config.general().socket_dir()
    );

    let source = AdminCommand::new(config.general().admin_command());

    let agent = Agent::new(config, source).context("failed to initialize")?;

    let sampled = agent.run().context("sampling failed")?;

    debug!("sampled {sampled} instance(s)");

    Ok(())
}
