use super::*;
use std::io::Write;
use tempfile::TempDir;

const SHOP_YAML: &str = r#"
name: shop
database:
  path: shop.duckdb
entities:
  - name: Team
    table: teams
    fields:
      - { name: id, type: integer, generated: true }
      - { name: name, type: text }
    associations:
      - { name: members, kind: one_to_many, target: User, mapped_by: team }
  - name: User
    table: users
    fields:
      - { name: id, type: integer, generated: true }
      - { name: name, type: text }
      - { name: status, type: text, nullable: true }
    associations:
      - { name: team, kind: many_to_one, target: Team, inversed_by: members }
repositories:
  User:
    local_attributes: [name, status]
    local_create_attributes: [name]
    foreign_attributes: [team]
    criteria_aliases:
      q: name
      page: null
    foreign_criteria:
      team_name:
        field: t.name
        joins:
          - { table: teams, alias: t, on: "t.id = e.team_id" }
"#;

#[test]
fn test_parse_full_config() {
    let config = Config::from_yaml_str(SHOP_YAML).unwrap();
    assert_eq!(config.name, "shop");
    assert_eq!(config.database.path, "shop.duckdb");
    assert_eq!(config.entities.len(), 2);

    let users = config.repository("User");
    assert_eq!(users.local_attributes, vec!["name", "status"]);
    assert_eq!(users.create_local_attributes(), &["name".to_string()]);
    assert_eq!(users.create_foreign_attributes(), &["team".to_string()]);
    assert_eq!(users.criteria_aliases.get("q"), Some(&Some("name".to_string())));
    assert_eq!(users.criteria_aliases.get("page"), Some(&None));

    let rule = &users.foreign_criteria["team_name"];
    assert_eq!(rule.field, "t.name");
    assert_eq!(rule.joins[0].kind, JoinKind::Inner);
    assert_eq!(rule.joins[0].alias, "t");

    let registry = config.metadata().unwrap();
    assert!(registry.contains("Team"));
}

#[test]
fn test_defaults() {
    let config = Config::from_yaml_str("name: empty").unwrap();
    assert_eq!(config.database.path, ":memory:");
    assert!(config.entities.is_empty());
    assert_eq!(config.repository("Anything"), RepositoryConfig::default());
}

#[test]
fn test_empty_name_rejected() {
    let err = Config::from_yaml_str("name: ''").unwrap_err();
    assert!(matches!(err, CoreError::ConfigInvalid { .. }));
}

#[test]
fn test_unknown_repository_entity_rejected() {
    let yaml = r#"
name: shop
repositories:
  Ghost:
    local_attributes: [name]
"#;
    let err = Config::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, CoreError::UnknownEntity { .. }));
}

#[test]
fn test_unknown_keys_rejected() {
    let err = Config::from_yaml_str("name: shop\nverbose: true").unwrap_err();
    assert!(matches!(err, CoreError::YamlParse(_)));
}

#[test]
fn test_load_from_dir() {
    let dir = TempDir::new().unwrap();
    let mut file = std::fs::File::create(dir.path().join("restrepo.yml")).unwrap();
    file.write_all(SHOP_YAML.as_bytes()).unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "shop");
}

#[test]
fn test_load_from_dir_missing() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}
