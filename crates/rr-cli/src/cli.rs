//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// restrepo - criteria queries and schema migrations for declared entities
#[derive(Parser, Debug)]
#[command(name = "rr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override the database path from the config
    #[arg(long, global = true, env = "RR_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate criteria into SQL, or run the query and print entities
    Query(QueryArgs),

    /// Compare schema snapshots and generate migration SQL
    Schema(SchemaArgs),
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON
    Json,
}

/// Arguments for the query command
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Entity to query
    #[arg(short, long)]
    pub entity: String,

    /// Criteria as a JSON object, e.g. '{"age": {"op": ">=", "value": 18}}'
    #[arg(long, default_value = "{}")]
    pub criteria: String,

    /// Ordering as a JSON object, e.g. '{"name": "ASC"}'
    #[arg(long)]
    pub order: Option<String>,

    /// Maximum number of entities
    #[arg(long)]
    pub limit: Option<u64>,

    /// Number of entities to skip
    #[arg(long)]
    pub offset: Option<u64>,

    /// Run the query against the database instead of printing it
    #[arg(short = 'x', long)]
    pub execute: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the schema command
#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub command: SchemaCommands,
}

/// Schema subcommands
#[derive(Subcommand, Debug)]
pub enum SchemaCommands {
    /// Diff two snapshots, or a snapshot against the entity metadata
    Diff(SchemaDiffArgs),

    /// DDL creating the schema the entities need
    Create(SchemaCreateArgs),

    /// Write the schema the entities need as a YAML snapshot
    Snapshot(SchemaSnapshotArgs),
}

/// Arguments for schema diff
#[derive(Args, Debug)]
pub struct SchemaDiffArgs {
    /// Snapshot describing the current database
    #[arg(long)]
    pub from: String,

    /// Target snapshot (default: derived from the entity metadata)
    #[arg(long)]
    pub to: Option<String>,

    /// Print migration SQL instead of a summary
    #[arg(long)]
    pub sql: bool,

    /// Leave out drops of tables, sequences and orphaned foreign keys
    #[arg(long, requires = "sql")]
    pub save_mode: bool,

    /// SQL dialect: duckdb or generic
    #[arg(long, default_value = "duckdb")]
    pub platform: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for schema create
#[derive(Args, Debug)]
pub struct SchemaCreateArgs {
    /// SQL dialect: duckdb or generic
    #[arg(long, default_value = "duckdb")]
    pub platform: String,

    /// Apply the statements to the configured database
    #[arg(short = 'x', long)]
    pub execute: bool,
}

/// Arguments for schema snapshot
#[derive(Args, Debug)]
pub struct SchemaSnapshotArgs {
    /// Write to this file instead of stdout
    #[arg(short = 'f', long)]
    pub file: Option<String>,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
