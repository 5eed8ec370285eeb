use super::*;
use crate::diff::RenamedColumn;

fn users() -> Table {
    Table::new("users")
        .with_column(
            Column::new("id", "BIGINT")
                .not_null()
                .with_default("nextval('users_id_seq')"),
        )
        .with_column(Column::new("name", "VARCHAR").not_null())
        .with_column(Column::new("team_id", "BIGINT"))
        .with_primary_key(&["id"])
        .with_index(Index::new("idx_users_team_id", &["team_id"]))
}

#[test]
fn test_create_table() {
    let sql = GenericPlatform.create_table_sql(&users());
    assert_eq!(
        sql,
        vec![
            r#"CREATE TABLE "users" ("id" BIGINT NOT NULL DEFAULT nextval('users_id_seq'), "name" VARCHAR NOT NULL, "team_id" BIGINT, PRIMARY KEY ("id"))"#,
            r#"CREATE INDEX "idx_users_team_id" ON "users" ("team_id")"#,
        ]
    );
}

#[test]
fn test_foreign_key_statements() {
    let key = ForeignKey::new("fk_users_team_id", &["team_id"], "teams", &["id"]).on_delete("set null");
    assert_eq!(
        GenericPlatform.create_foreign_key_sql("users", &key),
        r#"ALTER TABLE "users" ADD CONSTRAINT "fk_users_team_id" FOREIGN KEY ("team_id") REFERENCES "teams" ("id") ON DELETE SET NULL"#
    );
    assert_eq!(
        GenericPlatform.drop_foreign_key_sql("users", &key),
        r#"ALTER TABLE "users" DROP CONSTRAINT "fk_users_team_id""#
    );
}

#[test]
fn test_sequences() {
    let seq = Sequence::new("users_id_seq").start(100);
    assert_eq!(
        GenericPlatform.create_sequence_sql(&seq),
        r#"CREATE SEQUENCE "users_id_seq" START WITH 100 INCREMENT BY 1"#
    );
    assert_eq!(
        GenericPlatform.alter_sequence_sql(&seq),
        r#"ALTER SEQUENCE "users_id_seq" INCREMENT BY 1"#
    );
    assert!(DuckDbPlatform
        .alter_sequence_sql(&seq)
        .starts_with("CREATE OR REPLACE SEQUENCE"));
}

#[test]
fn test_alter_table_order() {
    let mut diff = TableDiff::new("users");
    diff.removed_indexes.push(Index::new("idx_old", &["name"]));
    diff.removed_foreign_keys
        .push(ForeignKey::new("fk_old", &["team_id"], "teams", &["id"]));
    diff.added_columns.push(Column::new("age", "INTEGER"));
    diff.renamed_columns.push(RenamedColumn {
        from: "name".to_string(),
        column: Column::new("full_name", "VARCHAR"),
    });
    diff.added_indexes.push(Index::new("idx_age", &["age"]).unique());

    assert_eq!(
        GenericPlatform.alter_table_sql(&diff),
        vec![
            r#"ALTER TABLE "users" DROP CONSTRAINT "fk_old""#,
            r#"DROP INDEX "idx_old""#,
            r#"ALTER TABLE "users" ADD COLUMN "age" INTEGER"#,
            r#"ALTER TABLE "users" RENAME COLUMN "name" TO "full_name""#,
            r#"CREATE UNIQUE INDEX "idx_age" ON "users" ("age")"#,
        ]
    );
    // no constraint statements where keys cannot be altered
    assert_eq!(DuckDbPlatform.alter_table_sql(&diff).len(), 4);
}

#[test]
fn test_alter_column_per_property() {
    let from = Column::new("email", "VARCHAR");
    let to = Column::new("email", "TEXT").not_null();
    let diff = ColumnDiff {
        old_name: "email".to_string(),
        from_column: from,
        column: to,
        changed_properties: vec![
            ColumnProperty::Type,
            ColumnProperty::Nullable,
            ColumnProperty::Default,
        ],
    };
    assert_eq!(
        GenericPlatform.alter_column_sql("users", &diff),
        vec![
            r#"ALTER TABLE "users" ALTER COLUMN "email" SET DATA TYPE TEXT"#,
            r#"ALTER TABLE "users" ALTER COLUMN "email" SET NOT NULL"#,
            r#"ALTER TABLE "users" ALTER COLUMN "email" DROP DEFAULT"#,
        ]
    );
}

#[test]
fn test_duckdb_adds_constraints_separately() {
    let column = Column::new("status", "VARCHAR").not_null().with_default("'new'");
    assert_eq!(
        DuckDbPlatform.add_column_sql("users", &column),
        vec![
            r#"ALTER TABLE "users" ADD COLUMN "status" VARCHAR DEFAULT 'new'"#,
            r#"ALTER TABLE "users" ALTER COLUMN "status" SET NOT NULL"#,
        ]
    );
}

#[test]
fn test_platform_lookup() {
    assert_eq!(platform_for("DuckDB").unwrap().name(), "duckdb");
    assert_eq!(platform_for("postgres").unwrap().name(), "generic");
    assert!(matches!(
        platform_for("oracle"),
        Err(SchemaError::UnknownPlatform { .. })
    ));
}
