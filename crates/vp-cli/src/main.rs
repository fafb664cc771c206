//! vp - idempotent schema bootstrap for the practice database

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Cli;
use commands::common::{ExitCode, EXIT_FATAL};
use commands::{migrate, status, unlock};

/// Install the log sink. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Migrate => migrate::execute(&cli.global),
        cli::Commands::Status(args) => status::execute(args, &cli.global),
        cli::Commands::Unlock => unlock::execute(&cli.global),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(err) = run(&cli) {
        let code = match err.downcast_ref::<ExitCode>() {
            Some(ec) => ec.0,
            None => {
                eprintln!("Error: {err:#}");
                EXIT_FATAL
            }
        };
        std::process::exit(code);
    }
}
