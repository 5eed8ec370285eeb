//! Schema differences
//!
//! The result of comparing two snapshots, expressed as the operations that
//! turn the first into the second.

use crate::schema::{Column, ForeignKey, Index, Sequence, Table};
use serde::Serialize;
use std::fmt;

/// Column property that differs between two versions of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnProperty {
    Type,
    Nullable,
    Default,
}

impl fmt::Display for ColumnProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnProperty::Type => write!(f, "type"),
            ColumnProperty::Nullable => write!(f, "nullable"),
            ColumnProperty::Default => write!(f, "default"),
        }
    }
}

/// A column present in both snapshots whose definition changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDiff {
    pub old_name: String,
    pub from_column: Column,
    pub column: Column,
    pub changed_properties: Vec<ColumnProperty>,
}

impl ColumnDiff {
    pub fn has_changed(&self, property: ColumnProperty) -> bool {
        self.changed_properties.contains(&property)
    }
}

/// A column that kept its definition under a new name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenamedColumn {
    pub from: String,
    pub column: Column,
}

/// A foreign key together with the table that declares it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableForeignKey {
    pub table: String,
    pub key: ForeignKey,
}

/// Changes to one table present in both snapshots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDiff {
    pub name: String,
    pub added_columns: Vec<Column>,
    pub removed_columns: Vec<Column>,
    pub changed_columns: Vec<ColumnDiff>,
    pub renamed_columns: Vec<RenamedColumn>,
    pub added_indexes: Vec<Index>,
    pub removed_indexes: Vec<Index>,
    pub changed_indexes: Vec<Index>,
    pub added_foreign_keys: Vec<ForeignKey>,
    pub removed_foreign_keys: Vec<ForeignKey>,
    pub changed_foreign_keys: Vec<ForeignKey>,
    /// Keys on other tables referencing a changed column of this table.
    /// They are dropped before and recreated after the migration.
    pub impacted_foreign_keys: Vec<TableForeignKey>,
}

impl TableDiff {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            added_columns: Vec::new(),
            removed_columns: Vec::new(),
            changed_columns: Vec::new(),
            renamed_columns: Vec::new(),
            added_indexes: Vec::new(),
            removed_indexes: Vec::new(),
            changed_indexes: Vec::new(),
            added_foreign_keys: Vec::new(),
            removed_foreign_keys: Vec::new(),
            changed_foreign_keys: Vec::new(),
            impacted_foreign_keys: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty()
            && self.removed_columns.is_empty()
            && self.changed_columns.is_empty()
            && self.renamed_columns.is_empty()
            && self.added_indexes.is_empty()
            && self.removed_indexes.is_empty()
            && self.changed_indexes.is_empty()
            && self.added_foreign_keys.is_empty()
            && self.removed_foreign_keys.is_empty()
            && self.changed_foreign_keys.is_empty()
    }
}

/// All differences between two snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaDiff {
    pub new_tables: Vec<Table>,
    pub changed_tables: Vec<TableDiff>,
    pub removed_tables: Vec<Table>,
    pub new_sequences: Vec<Sequence>,
    pub changed_sequences: Vec<Sequence>,
    pub removed_sequences: Vec<Sequence>,
    /// Keys pointing at removed tables, declared on tables that survive
    pub orphaned_foreign_keys: Vec<TableForeignKey>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.new_tables.is_empty()
            && self.changed_tables.is_empty()
            && self.removed_tables.is_empty()
            && self.new_sequences.is_empty()
            && self.changed_sequences.is_empty()
            && self.removed_sequences.is_empty()
            && self.orphaned_foreign_keys.is_empty()
    }

    pub fn changed_table(&self, name: &str) -> Option<&TableDiff> {
        self.changed_tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

/// One line per change, `+` added, `-` removed, `~` changed
impl fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No schema changes");
        }
        for table in &self.new_tables {
            writeln!(f, "+ table {}", table.name)?;
        }
        for table in &self.removed_tables {
            writeln!(f, "- table {}", table.name)?;
        }
        for diff in &self.changed_tables {
            writeln!(f, "~ table {}", diff.name)?;
            for column in &diff.added_columns {
                writeln!(f, "    + column {} {}", column.name, column.column_type)?;
            }
            for column in &diff.removed_columns {
                writeln!(f, "    - column {}", column.name)?;
            }
            for renamed in &diff.renamed_columns {
                writeln!(f, "    ~ column {} -> {}", renamed.from, renamed.column.name)?;
            }
            for column in &diff.changed_columns {
                let props: Vec<String> = column
                    .changed_properties
                    .iter()
                    .map(|p| p.to_string())
                    .collect();
                writeln!(f, "    ~ column {} ({})", column.old_name, props.join(", "))?;
            }
            for index in &diff.added_indexes {
                writeln!(f, "    + index {}", index.name)?;
            }
            for index in &diff.removed_indexes {
                writeln!(f, "    - index {}", index.name)?;
            }
            for index in &diff.changed_indexes {
                writeln!(f, "    ~ index {}", index.name)?;
            }
            for key in &diff.added_foreign_keys {
                writeln!(f, "    + foreign key {}", key.name)?;
            }
            for key in &diff.removed_foreign_keys {
                writeln!(f, "    - foreign key {}", key.name)?;
            }
            for key in &diff.changed_foreign_keys {
                writeln!(f, "    ~ foreign key {}", key.name)?;
            }
            for impacted in &diff.impacted_foreign_keys {
                writeln!(
                    f,
                    "    ! foreign key {}.{} is rebuilt",
                    impacted.table, impacted.key.name
                )?;
            }
        }
        for sequence in &self.new_sequences {
            writeln!(f, "+ sequence {}", sequence.name)?;
        }
        for sequence in &self.removed_sequences {
            writeln!(f, "- sequence {}", sequence.name)?;
        }
        for sequence in &self.changed_sequences {
            writeln!(f, "~ sequence {}", sequence.name)?;
        }
        for orphan in &self.orphaned_foreign_keys {
            writeln!(f, "- foreign key {}.{}", orphan.table, orphan.key.name)?;
        }
        Ok(())
    }
}
