//! Migration SQL
//!
//! Orders the statements of a [`SchemaDiff`] so each one runs against a
//! database where everything it depends on already exists and nothing it
//! removes is still referenced.

use crate::comparator::compare;
use crate::diff::SchemaDiff;
use crate::platform::SchemaPlatform;
use crate::schema::Schema;
use rr_core::MetadataRegistry;

impl SchemaDiff {
    /// Full migration, including destructive statements.
    pub fn to_sql(&self, platform: &dyn SchemaPlatform) -> Vec<String> {
        self.build_sql(platform, false)
    }

    /// Migration without drops of tables, sequences or orphaned keys.
    pub fn to_save_sql(&self, platform: &dyn SchemaPlatform) -> Vec<String> {
        self.build_sql(platform, true)
    }

    /// Statement order:
    ///
    /// 1. drop orphaned foreign keys
    /// 2. alter changed, drop removed and create new sequences
    /// 3. create new tables, then their foreign keys
    /// 4. drop removed tables
    /// 5. alter changed tables
    ///
    /// Keys impacted by a column change are dropped ahead of everything and
    /// recreated after everything.
    fn build_sql(&self, platform: &dyn SchemaPlatform, save_mode: bool) -> Vec<String> {
        let foreign_keys = platform.supports_foreign_keys();
        let mut pre = Vec::new();
        let mut sql = Vec::new();
        let mut post = Vec::new();

        if foreign_keys && !save_mode {
            for orphan in &self.orphaned_foreign_keys {
                sql.push(platform.drop_foreign_key_sql(&orphan.table, &orphan.key));
            }
        }

        if platform.supports_sequences() {
            for sequence in &self.changed_sequences {
                sql.push(platform.alter_sequence_sql(sequence));
            }
            if !save_mode {
                for sequence in &self.removed_sequences {
                    sql.push(platform.drop_sequence_sql(sequence));
                }
            }
            for sequence in &self.new_sequences {
                sql.push(platform.create_sequence_sql(sequence));
            }
        }

        let mut new_keys = Vec::new();
        for table in &self.new_tables {
            sql.extend(platform.create_table_sql(table));
            if foreign_keys {
                for key in &table.foreign_keys {
                    new_keys.push(platform.create_foreign_key_sql(&table.name, key));
                }
            } else if !table.foreign_keys.is_empty() {
                log::debug!(
                    "Skipping {} foreign keys of '{}' on {}",
                    table.foreign_keys.len(),
                    table.name,
                    platform.name()
                );
            }
        }
        sql.extend(new_keys);

        if !save_mode {
            for table in &self.removed_tables {
                sql.push(platform.drop_table_sql(table));
            }
        }

        for diff in &self.changed_tables {
            if foreign_keys {
                for impacted in &diff.impacted_foreign_keys {
                    pre.push(platform.drop_foreign_key_sql(&impacted.table, &impacted.key));
                    post.push(platform.create_foreign_key_sql(&impacted.table, &impacted.key));
                }
            }
            sql.extend(platform.alter_table_sql(diff));
        }

        log::debug!(
            "Migration for {}: {} statements{}",
            platform.name(),
            pre.len() + sql.len() + post.len(),
            if save_mode { " (save mode)" } else { "" }
        );
        pre.extend(sql);
        pre.extend(post);
        pre
    }
}

/// DDL creating `schema` from nothing.
pub fn create_sql(schema: &Schema, platform: &dyn SchemaPlatform) -> Vec<String> {
    compare(&Schema::new(), schema).to_sql(platform)
}

/// SQL migrating the `current` snapshot to the schema the entities need.
pub fn update_sql(
    current: &Schema,
    registry: &MetadataRegistry,
    platform: &dyn SchemaPlatform,
    save_mode: bool,
) -> Vec<String> {
    let target = Schema::from_metadata(registry);
    let diff = compare(current, &target);
    if save_mode {
        diff.to_save_sql(platform)
    } else {
        diff.to_sql(platform)
    }
}

#[cfg(test)]
#[path = "migration_test.rs"]
mod tests;
