//! SQL dialects for migration statements
//!
//! A [`SchemaPlatform`] turns schema objects and table diffs into DDL.
//! The provided methods produce portable SQL; a dialect overrides only
//! what it does differently and reports the features it lacks.

use crate::diff::{ColumnDiff, ColumnProperty, TableDiff};
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{Column, ForeignKey, Index, Sequence, Table};
use rr_core::sql_utils::quote_ident;

fn column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ")
}

/// DDL generation for one database dialect
pub trait SchemaPlatform {
    fn name(&self) -> &'static str;

    fn supports_sequences(&self) -> bool {
        true
    }

    /// Whether foreign keys can be added and dropped on existing tables
    fn supports_foreign_keys(&self) -> bool {
        true
    }

    fn column_declaration(&self, column: &Column) -> String {
        let mut sql = format!("{} {}", quote_ident(&column.name), column.column_type);
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(default);
        }
        sql
    }

    /// `CREATE TABLE` followed by the table's indexes. Foreign keys are
    /// created separately once every table exists.
    fn create_table_sql(&self, table: &Table) -> Vec<String> {
        let mut parts: Vec<String> = table
            .columns
            .iter()
            .map(|c| self.column_declaration(c))
            .collect();
        if !table.primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", column_list(&table.primary_key)));
        }
        let mut sql = vec![format!(
            "CREATE TABLE {} ({})",
            quote_ident(&table.name),
            parts.join(", ")
        )];
        sql.extend(
            table
                .indexes
                .iter()
                .map(|index| self.create_index_sql(&table.name, index)),
        );
        sql
    }

    fn drop_table_sql(&self, table: &Table) -> String {
        format!("DROP TABLE {}", quote_ident(&table.name))
    }

    fn create_index_sql(&self, table: &str, index: &Index) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            quote_ident(&index.name),
            quote_ident(table),
            column_list(&index.columns)
        )
    }

    fn drop_index_sql(&self, _table: &str, index: &Index) -> String {
        format!("DROP INDEX {}", quote_ident(&index.name))
    }

    fn create_foreign_key_sql(&self, table: &str, key: &ForeignKey) -> String {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_ident(table),
            quote_ident(&key.name),
            column_list(&key.columns),
            quote_ident(&key.foreign_table),
            column_list(&key.foreign_columns)
        );
        if let Some(action) = &key.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(&action.to_ascii_uppercase());
        }
        sql
    }

    fn drop_foreign_key_sql(&self, table: &str, key: &ForeignKey) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            quote_ident(table),
            quote_ident(&key.name)
        )
    }

    fn create_sequence_sql(&self, sequence: &Sequence) -> String {
        format!(
            "CREATE SEQUENCE {} START WITH {} INCREMENT BY {}",
            quote_ident(&sequence.name),
            sequence.start,
            sequence.increment
        )
    }

    fn alter_sequence_sql(&self, sequence: &Sequence) -> String {
        format!(
            "ALTER SEQUENCE {} INCREMENT BY {}",
            quote_ident(&sequence.name),
            sequence.increment
        )
    }

    fn drop_sequence_sql(&self, sequence: &Sequence) -> String {
        format!("DROP SEQUENCE {}", quote_ident(&sequence.name))
    }

    fn add_column_sql(&self, table: &str, column: &Column) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(table),
            self.column_declaration(column)
        )]
    }

    fn drop_column_sql(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(table),
            quote_ident(&column.name)
        )
    }

    fn rename_column_sql(&self, table: &str, from: &str, to: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            quote_ident(table),
            quote_ident(from),
            quote_ident(to)
        )
    }

    /// One statement per changed property
    fn alter_column_sql(&self, table: &str, diff: &ColumnDiff) -> Vec<String> {
        let prefix = format!(
            "ALTER TABLE {} ALTER COLUMN {}",
            quote_ident(table),
            quote_ident(&diff.old_name)
        );
        let column = &diff.column;
        diff.changed_properties
            .iter()
            .map(|property| match property {
                ColumnProperty::Type => format!("{} SET DATA TYPE {}", prefix, column.column_type),
                ColumnProperty::Nullable if column.nullable => format!("{} DROP NOT NULL", prefix),
                ColumnProperty::Nullable => format!("{} SET NOT NULL", prefix),
                ColumnProperty::Default => match &column.default {
                    Some(default) => format!("{} SET DEFAULT {}", prefix, default),
                    None => format!("{} DROP DEFAULT", prefix),
                },
            })
            .collect()
    }

    /// Statements migrating one table: dropped keys and indexes first,
    /// then column changes, then new indexes and keys.
    fn alter_table_sql(&self, diff: &TableDiff) -> Vec<String> {
        let table = diff.name.as_str();
        let mut sql = Vec::new();

        if self.supports_foreign_keys() {
            for key in diff.removed_foreign_keys.iter().chain(&diff.changed_foreign_keys) {
                sql.push(self.drop_foreign_key_sql(table, key));
            }
        }
        for index in diff.removed_indexes.iter().chain(&diff.changed_indexes) {
            sql.push(self.drop_index_sql(table, index));
        }

        for column in &diff.added_columns {
            sql.extend(self.add_column_sql(table, column));
        }
        for column in &diff.removed_columns {
            sql.push(self.drop_column_sql(table, column));
        }
        for renamed in &diff.renamed_columns {
            sql.push(self.rename_column_sql(table, &renamed.from, &renamed.column.name));
        }
        for column in &diff.changed_columns {
            sql.extend(self.alter_column_sql(table, column));
        }

        for index in diff.added_indexes.iter().chain(&diff.changed_indexes) {
            sql.push(self.create_index_sql(table, index));
        }
        if self.supports_foreign_keys() {
            for key in diff.added_foreign_keys.iter().chain(&diff.changed_foreign_keys) {
                sql.push(self.create_foreign_key_sql(table, key));
            }
        }
        sql
    }
}

/// Portable SQL in the PostgreSQL style
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericPlatform;

impl SchemaPlatform for GenericPlatform {
    fn name(&self) -> &'static str {
        "generic"
    }
}

/// DuckDB
///
/// DuckDB cannot add or drop foreign key constraints on existing tables,
/// cannot add a column together with a constraint, and has no
/// `ALTER SEQUENCE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbPlatform;

impl SchemaPlatform for DuckDbPlatform {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn supports_foreign_keys(&self) -> bool {
        false
    }

    fn add_column_sql(&self, table: &str, column: &Column) -> Vec<String> {
        let mut sql = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            quote_ident(table),
            self.column_declaration(&Column {
                nullable: true,
                ..column.clone()
            })
        )];
        if !column.nullable {
            sql.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL",
                quote_ident(table),
                quote_ident(&column.name)
            ));
        }
        sql
    }

    fn alter_sequence_sql(&self, sequence: &Sequence) -> String {
        format!(
            "CREATE OR REPLACE SEQUENCE {} START WITH {} INCREMENT BY {}",
            quote_ident(&sequence.name),
            sequence.start,
            sequence.increment
        )
    }
}

/// Look up a platform by name.
pub fn platform_for(name: &str) -> SchemaResult<Box<dyn SchemaPlatform>> {
    match name.to_ascii_lowercase().as_str() {
        "duckdb" => Ok(Box::new(DuckDbPlatform)),
        "generic" | "postgres" | "postgresql" => Ok(Box::new(GenericPlatform)),
        _ => Err(SchemaError::UnknownPlatform {
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "platform_test.rs"]
mod tests;
