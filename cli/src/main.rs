mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{aggregate, cache, disaggregate, export};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .target(env_logger::Target::Stderr)
        .init();
}

/// Runs the selected command and returns the process exit code.
pub fn run() -> anyhow::Result<i32> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Disaggregate(args) => disaggregate::run(&cli, args),
        Commands::Aggregate(args) => aggregate::run(&cli, args),
        Commands::Cache(command) => cache::run(&cli, command),
        Commands::Export(command) => export::run(&cli, command),
    }
}

fn main() -> anyhow::Result<()> {
    let code = run()?;
    if code != 0 { std::process::exit(code) }
    Ok(())
}
