//! Query command implementation
//!
//! Translates JSON criteria for one entity into SQL. With `--execute` the
//! query runs against the configured database and the matching entities
//! are printed instead.

use anyhow::{Context, Result};
use rr_db::{DuckDbConnection, Session};
use rr_query::{order_by_from_json, Criteria, RenderedQuery};
use rr_repository::Repository;
use std::rc::Rc;

use crate::cli::{GlobalArgs, OutputFormat, QueryArgs};
use crate::commands::common::{load_config, open_database};

/// Execute the query command
pub fn execute(args: &QueryArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global)?;
    let criteria = Criteria::from_json_str(&args.criteria).context("Invalid --criteria")?;
    let order = parse_order(args.order.as_deref())?;

    // rendering alone never touches a table
    let conn = if args.execute {
        open_database(&config, global)?
    } else {
        DuckDbConnection::open_memory()?
    };
    let registry = config.metadata().context("Invalid entity metadata")?;
    let session = Rc::new(Session::new(Box::new(conn), registry));
    let repository = Repository::from_config(Rc::clone(&session), &config, &args.entity)
        .with_context(|| format!("Failed to set up repository for '{}'", args.entity))?;

    if !args.execute {
        let executor = repository.executor();
        let plan = executor.select_plan(criteria, order.as_slice(), args.limit, args.offset)?;
        let rendered = executor.render(&plan);
        match args.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&rendered_json(&rendered))?)
            }
            OutputFormat::Text => print!("{}", format_rendered(&rendered)),
        }
        return Ok(());
    }

    let keys = repository
        .get_all(criteria, order.as_slice(), args.limit, args.offset)
        .with_context(|| format!("Query on '{}' failed", args.entity))?;
    let rows = keys
        .iter()
        .map(|key| repository.to_json(*key))
        .collect::<Result<Vec<_>, _>>()?;
    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Text => {
            for row in &rows {
                println!("{}", row);
            }
            eprintln!("{} {} entities", rows.len(), args.entity);
        }
    }
    Ok(())
}

fn parse_order(order: Option<&str>) -> Result<Vec<(String, String)>> {
    let Some(order) = order else {
        return Ok(Vec::new());
    };
    let json: serde_json::Value = serde_json::from_str(order).context("Invalid --order JSON")?;
    Ok(order_by_from_json(&json)?)
}

/// SQL followed by one comment line per parameter
fn format_rendered(rendered: &RenderedQuery) -> String {
    let mut out = format!("{}\n", rendered.sql);
    for (i, param) in rendered.params.iter().enumerate() {
        out.push_str(&format!(
            "-- ${} = {} ({})\n",
            i + 1,
            param.value.to_json(),
            param.param_type
        ));
    }
    out
}

fn rendered_json(rendered: &RenderedQuery) -> serde_json::Value {
    let params: Vec<serde_json::Value> = rendered
        .params
        .iter()
        .map(|p| serde_json::json!({"value": p.value.to_json(), "type": p.param_type.to_string()}))
        .collect();
    serde_json::json!({"sql": rendered.sql, "params": params})
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
