use super::*;

const SNAPSHOT: &str = r#"
tables:
  - name: teams
    columns:
      - { name: id, type: BIGINT, nullable: false }
      - { name: name, type: VARCHAR }
    primary_key: [id]
  - name: users
    columns:
      - { name: id, type: BIGINT, nullable: false, default: "nextval('users_id_seq')" }
      - { name: team_id, data_type: BIGINT }
    primary_key: [id]
    indexes:
      - { name: idx_users_team_id, columns: [team_id] }
    foreign_keys:
      - { name: fk_users_team_id, columns: [team_id], foreign_table: teams, foreign_columns: [id] }
sequences:
  - { name: users_id_seq, start: 100 }
"#;

#[test]
fn test_parse_snapshot() {
    let schema = Schema::from_yaml_str(SNAPSHOT).unwrap();
    assert_eq!(schema.tables.len(), 2);

    let users = schema.table("USERS").unwrap();
    let id = users.column("Id").unwrap();
    assert!(!id.nullable);
    assert_eq!(id.default.as_deref(), Some("nextval('users_id_seq')"));
    // columns are nullable unless declared otherwise
    assert!(users.column("team_id").unwrap().nullable);
    assert_eq!(users.column("team_id").unwrap().column_type, "BIGINT");
    assert!(users.foreign_keys[0].references("Teams"));

    let seq = schema.sequence("users_id_seq").unwrap();
    assert_eq!((seq.start, seq.increment), (100, 1));
}

#[test]
fn test_unknown_keys_rejected() {
    let yaml = "tables:\n  - name: t\n    colums: []\n";
    assert!(matches!(
        Schema::from_yaml_str(yaml),
        Err(SchemaError::Parse { .. })
    ));
}

#[test]
fn test_duplicate_table_case_insensitive() {
    let schema = Schema::new()
        .with_table(Table::new("users"))
        .with_table(Table::new("Users"));
    assert!(matches!(
        schema.validate(),
        Err(SchemaError::DuplicateTable { .. })
    ));
}

#[test]
fn test_duplicate_column() {
    let schema = Schema::new().with_table(
        Table::new("users")
            .with_column(Column::new("name", "VARCHAR"))
            .with_column(Column::new("NAME", "VARCHAR")),
    );
    assert!(matches!(
        schema.validate(),
        Err(SchemaError::DuplicateColumn { .. })
    ));
}

#[test]
fn test_key_on_unknown_column() {
    let schema = Schema::new().with_table(
        Table::new("users")
            .with_column(Column::new("id", "BIGINT"))
            .with_index(Index::new("idx_users_email", &["email"])),
    );
    let err = schema.validate().unwrap_err();
    assert!(err.to_string().contains("unknown column 'email'"));

    let schema = Schema::new().with_table(
        Table::new("users")
            .with_column(Column::new("team_id", "BIGINT"))
            .with_foreign_key(ForeignKey::new("fk", &["team_id"], "teams", &["id", "x"])),
    );
    assert!(matches!(
        schema.validate(),
        Err(SchemaError::InvalidTable { .. })
    ));
}

#[test]
fn test_definitions_ignore_names() {
    let a = Index::new("a", &["x", "y"]);
    assert!(a.same_definition(&Index::new("b", &["X", "Y"])));
    assert!(!a.same_definition(&Index::new("a", &["y", "x"])));
    assert!(!a.same_definition(&Index::new("a", &["x", "y"]).unique()));

    let fk = ForeignKey::new("fk1", &["team_id"], "teams", &["id"]);
    assert!(fk.same_definition(&ForeignKey::new("fk2", &["team_id"], "TEAMS", &["id"])));
    assert!(!fk.same_definition(&fk.clone().on_delete("CASCADE")));
}

#[test]
fn test_yaml_round_trip() {
    let schema = Schema::from_yaml_str(SNAPSHOT).unwrap();
    let yaml = schema.to_yaml_string().unwrap();
    assert_eq!(Schema::from_yaml_str(&yaml).unwrap(), schema);
}

#[test]
fn test_load_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.yml");
    std::fs::write(&path, "tables: 3").unwrap();
    let err = Schema::load(&path).unwrap_err();
    assert!(err.to_string().contains("schema.yml"));

    let missing = Schema::load(&dir.path().join("missing.yml")).unwrap_err();
    assert!(matches!(missing, SchemaError::IoWithPath { .. }));
}
