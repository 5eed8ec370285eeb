//! Schema derived from entity metadata
//!
//! Each entity becomes a table: its fields become columns, owning
//! associations add a join column with an index and a foreign key to the
//! target's identifier, and a generated identifier gets its own
//! `<table>_id_seq` sequence used as the column default.

use crate::schema::{Column, ForeignKey, Index, Schema, Sequence, Table};
use rr_core::{AssociationKind, ColumnSource, EntityMetadata, FieldType, MetadataRegistry};

/// Name of the sequence feeding a table's generated identifier
pub fn id_sequence_name(table: &str) -> String {
    format!("{}_id_seq", table)
}

impl Schema {
    /// Build the target schema for a set of entities.
    pub fn from_metadata(registry: &MetadataRegistry) -> Schema {
        let mut schema = Schema::new();
        for metadata in registry.iter() {
            if metadata.id_is_generated() {
                schema
                    .sequences
                    .push(Sequence::new(id_sequence_name(&metadata.table)));
            }
            schema.tables.push(entity_table(registry, metadata));
        }
        log::debug!(
            "Built schema with {} tables from metadata",
            schema.tables.len()
        );
        schema
    }
}

fn entity_table(registry: &MetadataRegistry, metadata: &EntityMetadata) -> Table {
    let mut table = Table::new(metadata.table.clone());
    table.primary_key = vec![metadata.id_field.clone()];

    for (name, source) in metadata.columns() {
        match source {
            ColumnSource::Field(field) => {
                let mut column = Column::new(name, field.field_type.sql_type());
                column.nullable = field.nullable && field.name != metadata.id_field;
                if field.generated && field.name == metadata.id_field {
                    column.default = Some(format!(
                        "nextval('{}')",
                        id_sequence_name(&metadata.table)
                    ));
                }
                table.columns.push(column);
            }
            ColumnSource::JoinColumn(assoc) => {
                let target = registry.get(&assoc.target);
                let column_type = target
                    .and_then(|t| t.id_def())
                    .map(|f| f.field_type)
                    .unwrap_or(FieldType::Integer)
                    .sql_type();
                let mut column = Column::new(name.clone(), column_type);
                column.nullable = assoc.nullable;
                table.columns.push(column);

                let mut index =
                    Index::new(format!("idx_{}_{}", metadata.table, name), &[name.as_str()]);
                // one-to-one keeps at most one owner per target
                index.unique = assoc.kind == AssociationKind::OneToOne;
                table.indexes.push(index);

                if let Some(target) = target {
                    table.foreign_keys.push(ForeignKey::new(
                        format!("fk_{}_{}", metadata.table, name),
                        &[name.as_str()],
                        target.table.clone(),
                        &[target.id_field.as_str()],
                    ));
                }
            }
        }
    }
    table
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;
