//! restrepo CLI - criteria queries and schema migrations

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{query, schema};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        cli::Commands::Query(args) => query::execute(args, &cli.global),
        cli::Commands::Schema(args) => schema::execute(args, &cli.global),
    }
}
