//! Schema comparator
//!
//! Computes the [`SchemaDiff`] that migrates one snapshot into another.
//! Besides the plain structural differences it tracks two kinds of foreign
//! keys that a naive migration would break: keys left pointing at a removed
//! table, and keys on other tables that reference a column being altered.

use crate::diff::{ColumnDiff, ColumnProperty, RenamedColumn, SchemaDiff, TableDiff, TableForeignKey};
use crate::schema::{fold, Column, Schema, Sequence, Table};
use std::collections::HashMap;

/// Compare two snapshots.
pub fn compare(from: &Schema, to: &Schema) -> SchemaDiff {
    Comparator::for_schema(from).compare(from, to)
}

/// Compares snapshots and tables.
///
/// Keeps a map from referenced table to the foreign keys pointing at it,
/// taken from the snapshot being migrated away from.
#[derive(Debug, Default)]
pub struct Comparator {
    keys_to_table: HashMap<String, Vec<TableForeignKey>>,
}

impl Comparator {
    /// Comparator knowing every foreign key declared in `from`.
    pub fn for_schema(from: &Schema) -> Self {
        let mut keys_to_table: HashMap<String, Vec<TableForeignKey>> = HashMap::new();
        for table in &from.tables {
            for key in &table.foreign_keys {
                keys_to_table
                    .entry(fold(&key.foreign_table))
                    .or_default()
                    .push(TableForeignKey {
                        table: table.name.clone(),
                        key: key.clone(),
                    });
            }
        }
        Self { keys_to_table }
    }

    pub fn compare(&self, from: &Schema, to: &Schema) -> SchemaDiff {
        let mut diff = SchemaDiff::default();

        for table in &from.tables {
            if !to.has_table(&table.name) {
                diff.removed_tables.push(table.clone());
            }
        }

        for table in &to.tables {
            match from.table(&table.name) {
                None => diff.new_tables.push(table.clone()),
                Some(from_table) => {
                    if let Some(table_diff) = self.diff_table(from_table, table) {
                        diff.changed_tables.push(table_diff);
                    }
                }
            }
        }

        // keys whose own table is dropped go away with it
        for removed in &diff.removed_tables {
            if let Some(keys) = self.keys_to_table.get(&fold(&removed.name)) {
                diff.orphaned_foreign_keys.extend(
                    keys.iter()
                        .filter(|k| to.has_table(&k.table))
                        .cloned(),
                );
            }
        }
        // an orphaned key is dropped once, ahead of the table changes
        if !diff.orphaned_foreign_keys.is_empty() {
            let orphans = diff.orphaned_foreign_keys.clone();
            for table_diff in &mut diff.changed_tables {
                let table = table_diff.name.clone();
                table_diff.removed_foreign_keys.retain(|key| {
                    !orphans.iter().any(|o| {
                        o.table.eq_ignore_ascii_case(&table)
                            && o.key.name.eq_ignore_ascii_case(&key.name)
                    })
                });
            }
            diff.changed_tables.retain(|t| !t.is_empty());
        }

        // impacted keys are rebuilt only where nothing else drops them
        let rebuilt_elsewhere: Vec<(String, String)> = diff
            .changed_tables
            .iter()
            .flat_map(|t| {
                t.removed_foreign_keys
                    .iter()
                    .chain(&t.changed_foreign_keys)
                    .map(move |k| (fold(&t.name), fold(&k.name)))
            })
            .collect();
        for table_diff in &mut diff.changed_tables {
            table_diff.impacted_foreign_keys.retain(|k| {
                to.has_table(&k.table)
                    && !rebuilt_elsewhere.contains(&(fold(&k.table), fold(&k.key.name)))
            });
        }

        for sequence in &to.sequences {
            match from.sequence(&sequence.name) {
                None => diff.new_sequences.push(sequence.clone()),
                Some(old) if diff_sequence(old, sequence) => {
                    diff.changed_sequences.push(sequence.clone())
                }
                Some(_) => {}
            }
        }
        for sequence in &from.sequences {
            if !to.has_sequence(&sequence.name) {
                diff.removed_sequences.push(sequence.clone());
            }
        }

        log::debug!(
            "Schema diff: {} new, {} changed, {} removed tables",
            diff.new_tables.len(),
            diff.changed_tables.len(),
            diff.removed_tables.len()
        );
        diff
    }

    /// Differences between two versions of a table, `None` when identical.
    pub fn diff_table(&self, from: &Table, to: &Table) -> Option<TableDiff> {
        let mut diff = TableDiff::new(from.name.clone());

        for column in &to.columns {
            if !from.has_column(&column.name) {
                diff.added_columns.push(column.clone());
            }
        }
        for column in &from.columns {
            match to.column(&column.name) {
                None => diff.removed_columns.push(column.clone()),
                Some(new) => {
                    let changed = diff_column(column, new);
                    if changed.is_empty() {
                        continue;
                    }
                    self.record_impacted_keys(&mut diff, &from.name, &column.name);
                    diff.changed_columns.push(ColumnDiff {
                        old_name: column.name.clone(),
                        from_column: column.clone(),
                        column: new.clone(),
                        changed_properties: changed,
                    });
                }
            }
        }

        detect_column_renames(&mut diff);
        diff_indexes(&mut diff, from, to);
        diff_foreign_keys(&mut diff, from, to);

        if diff.is_empty() {
            None
        } else {
            Some(diff)
        }
    }

    /// Record every key referencing `column` of `table`, once per key.
    fn record_impacted_keys(&self, diff: &mut TableDiff, table: &str, column: &str) {
        let Some(keys) = self.keys_to_table.get(&fold(table)) else {
            return;
        };
        for key in keys {
            let references_column = key
                .key
                .foreign_columns
                .iter()
                .any(|c| c.eq_ignore_ascii_case(column));
            let already = diff.impacted_foreign_keys.iter().any(|k| {
                k.table.eq_ignore_ascii_case(&key.table)
                    && k.key.name.eq_ignore_ascii_case(&key.key.name)
            });
            if references_column && !already {
                diff.impacted_foreign_keys.push(key.clone());
            }
        }
    }
}

/// Properties that differ between two versions of a column; names are not
/// compared.
pub fn diff_column(from: &Column, to: &Column) -> Vec<ColumnProperty> {
    let mut changed = Vec::new();
    if from.normalized_type() != to.normalized_type() {
        changed.push(ColumnProperty::Type);
    }
    if from.nullable != to.nullable {
        changed.push(ColumnProperty::Nullable);
    }
    let default = |c: &Column| c.default.as_deref().map(str::trim).map(str::to_string);
    if default(from) != default(to) {
        changed.push(ColumnProperty::Default);
    }
    changed
}

pub fn diff_sequence(from: &Sequence, to: &Sequence) -> bool {
    from.start != to.start || from.increment != to.increment
}

/// Turn added/removed pairs with identical definitions into renames.
///
/// A pair only counts when the added column matches exactly one removed
/// column and that removed column matches no other added column.
fn detect_column_renames(diff: &mut TableDiff) {
    let candidates: Vec<(usize, Vec<usize>)> = diff
        .added_columns
        .iter()
        .enumerate()
        .map(|(a, added)| {
            let matches = diff
                .removed_columns
                .iter()
                .enumerate()
                .filter(|(_, removed)| diff_column(removed, added).is_empty())
                .map(|(r, _)| r)
                .collect();
            (a, matches)
        })
        .collect();

    let mut pairs: Vec<(usize, usize)> = Vec::new();
    for (added, removed) in &candidates {
        if removed.len() != 1 {
            continue;
        }
        let r = removed[0];
        let claimed = candidates
            .iter()
            .filter(|(_, other)| other.contains(&r))
            .count();
        if claimed == 1 {
            pairs.push((*added, r));
        }
    }
    if pairs.is_empty() {
        return;
    }

    for &(added, removed) in &pairs {
        log::debug!(
            "Column '{}' on '{}' renamed to '{}'",
            diff.removed_columns[removed].name,
            diff.name,
            diff.added_columns[added].name
        );
        diff.renamed_columns.push(RenamedColumn {
            from: diff.removed_columns[removed].name.clone(),
            column: diff.added_columns[added].clone(),
        });
    }
    let mut index = 0;
    diff.added_columns.retain(|_| {
        let keep = !pairs.iter().any(|(a, _)| *a == index);
        index += 1;
        keep
    });
    let mut index = 0;
    diff.removed_columns.retain(|_| {
        let keep = !pairs.iter().any(|(_, r)| *r == index);
        index += 1;
        keep
    });
}

fn diff_indexes(diff: &mut TableDiff, from: &Table, to: &Table) {
    let mut remaining: Vec<_> = from.indexes.iter().collect();
    for index in &to.indexes {
        if let Some(pos) = remaining.iter().position(|old| old.same_definition(index)) {
            remaining.remove(pos);
        } else if let Some(pos) = remaining
            .iter()
            .position(|old| old.name.eq_ignore_ascii_case(&index.name))
        {
            remaining.remove(pos);
            diff.changed_indexes.push(index.clone());
        } else {
            diff.added_indexes.push(index.clone());
        }
    }
    diff.removed_indexes
        .extend(remaining.into_iter().cloned());
}

fn diff_foreign_keys(diff: &mut TableDiff, from: &Table, to: &Table) {
    let mut remaining: Vec<_> = from.foreign_keys.iter().collect();
    for key in &to.foreign_keys {
        if let Some(pos) = remaining.iter().position(|old| old.same_definition(key)) {
            remaining.remove(pos);
        } else if let Some(pos) = remaining
            .iter()
            .position(|old| old.name.eq_ignore_ascii_case(&key.name))
        {
            remaining.remove(pos);
            diff.changed_foreign_keys.push(key.clone());
        } else {
            diff.added_foreign_keys.push(key.clone());
        }
    }
    diff.removed_foreign_keys
        .extend(remaining.into_iter().cloned());
}

#[cfg(test)]
#[path = "comparator_test.rs"]
mod tests;
