//! Schema command implementation
//!
//! `diff` compares a snapshot with another snapshot or with the schema the
//! configured entities need; `create` prints (or applies) the DDL for that
//! schema; `snapshot` writes it out as YAML.

use anyhow::{Context, Result};
use rr_db::Connection;
use rr_schema::{compare, create_sql, platform_for, Schema};
use std::path::Path;

use crate::cli::{
    GlobalArgs, OutputFormat, SchemaArgs, SchemaCommands, SchemaCreateArgs, SchemaDiffArgs,
    SchemaSnapshotArgs,
};
use crate::commands::common::{database_path, load_config, open_database};

/// Execute the schema command
pub fn execute(args: &SchemaArgs, global: &GlobalArgs) -> Result<()> {
    match &args.command {
        SchemaCommands::Diff(args) => diff(args, global),
        SchemaCommands::Create(args) => create(args, global),
        SchemaCommands::Snapshot(args) => snapshot(args, global),
    }
}

fn metadata_schema(global: &GlobalArgs) -> Result<Schema> {
    let config = load_config(global)?;
    let registry = config.metadata().context("Invalid entity metadata")?;
    Ok(Schema::from_metadata(&registry))
}

fn load_snapshot(path: &str) -> Result<Schema> {
    Schema::load(Path::new(path)).with_context(|| format!("Failed to load snapshot {}", path))
}

fn diff(args: &SchemaDiffArgs, global: &GlobalArgs) -> Result<()> {
    let from = load_snapshot(&args.from)?;
    let to = match &args.to {
        Some(path) => load_snapshot(path)?,
        None => metadata_schema(global)?,
    };
    let diff = compare(&from, &to);

    if !args.sql {
        match args.output {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&diff)?),
            OutputFormat::Text => print!("{}", diff),
        }
        return Ok(());
    }

    let platform = platform_for(&args.platform)?;
    let statements = if args.save_mode {
        diff.to_save_sql(platform.as_ref())
    } else {
        diff.to_sql(platform.as_ref())
    };
    print_statements(&statements, args.output)
}

fn create(args: &SchemaCreateArgs, global: &GlobalArgs) -> Result<()> {
    let platform = platform_for(&args.platform)?;
    let statements = create_sql(&metadata_schema(global)?, platform.as_ref());
    if !args.execute {
        return print_statements(&statements, OutputFormat::Text);
    }

    let config = load_config(global)?;
    let conn = open_database(&config, global)?;
    for statement in &statements {
        log::debug!("{}", statement);
        conn.execute_batch(statement)
            .with_context(|| format!("Failed to execute: {}", statement))?;
    }
    println!(
        "Applied {} statements to {}",
        statements.len(),
        database_path(&config, global)
    );
    Ok(())
}

fn snapshot(args: &SchemaSnapshotArgs, global: &GlobalArgs) -> Result<()> {
    let yaml = metadata_schema(global)?.to_yaml_string()?;
    match &args.file {
        Some(path) => {
            std::fs::write(path, yaml).with_context(|| format!("Failed to write {}", path))?;
            eprintln!("Wrote {}", path);
        }
        None => print!("{}", yaml),
    }
    Ok(())
}

fn print_statements(statements: &[String], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(statements)?),
        OutputFormat::Text => {
            for statement in statements {
                println!("{};", statement);
            }
        }
    }
    Ok(())
}
