//! Integration tests for criteria translation.
//!
//! These tests build metadata and repository declarations through the
//! rr-core YAML loaders, translate criteria maps and check the rendered SQL
//! and parameter bindings.

use rr_core::{Config, NoIdentities, Value};
use rr_query::{
    order_by_from_json, Criteria, CriteriaTranslator, ParamType, PlaceholderStyle, QueryError,
    QueryPlan, ROOT_ALIAS,
};
use serde_json::json;

// ── Helpers ────────────────────────────────────────────────────────────

fn shop_config() -> Config {
    Config::from_yaml_str(
        r#"
name: shop
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
      - { name: status, type: text }
      - { name: age, type: integer }
      - { name: active, type: boolean }
    associations:
      - { name: team, kind: many_to_one, target: Team, inversed_by: members }
repositories:
  User:
    local_attributes: [name, status, age]
    foreign_criteria:
      team_name:
        field: t.name
        joins:
          - { kind: left, table: teams, alias: t, on: "t.id = e.team_id" }
"#,
    )
    .unwrap()
}

fn user_translator() -> CriteriaTranslator {
    let config = shop_config();
    let registry = config.metadata().unwrap();
    CriteriaTranslator::new(&registry, "User", &config.repository("User")).unwrap()
}

fn root_plan() -> QueryPlan {
    QueryPlan::new("users")
        .distinct(true)
        .select(format!("{}.*", ROOT_ALIAS))
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_end_to_end_example() {
    let translator = user_translator();
    let criteria = Criteria::from_json(&json!({
        "status": "active",
        "age": {"op": ">=", "value": 18},
    }))
    .unwrap();
    let order = order_by_from_json(&json!({"name": "ASC"})).unwrap();

    let plan = translator
        .apply(root_plan(), criteria, &NoIdentities)
        .unwrap();
    let plan = translator
        .apply_order(plan, &order)
        .unwrap()
        .limit(Some(10))
        .offset(Some(0));
    let rendered = plan.render(PlaceholderStyle::Numbered);

    assert_eq!(
        rendered.sql,
        concat!(
            r#"SELECT DISTINCT e.* FROM "users" e "#,
            r#"WHERE e."status" = ?1 AND e."age" >= ?2 "#,
            r#"ORDER BY e."name" ASC LIMIT 10 OFFSET 0"#
        )
    );
    let values: Vec<Value> = rendered.params.iter().map(|p| p.value.clone()).collect();
    assert_eq!(values, vec![Value::from("active"), Value::Int(18)]);
}

#[test]
fn test_scalar_criteria_param_count() {
    let translator = user_translator();
    let criteria = Criteria::new()
        .with("name", "Ann")
        .with("status", Value::Null)
        .with("age", 30i64)
        .with("active", true);
    let rendered = translator
        .apply(root_plan(), criteria, &NoIdentities)
        .unwrap()
        .render(PlaceholderStyle::Numbered);

    assert_eq!(rendered.sql.matches(" AND ").count(), 3);
    assert_eq!(rendered.params.len(), 3);
    assert!(rendered.sql.contains(r#"e."status" IS NULL"#));
    assert_eq!(rendered.params[2].value, Value::Int(1));
    assert_eq!(rendered.params[2].param_type, ParamType::Integer);
}

#[test]
fn test_foreign_rule_with_left_join() {
    let translator = user_translator();
    let criteria = Criteria::new().with_op("team_name", "NOT LIKE", "temp");
    let rendered = translator
        .apply(root_plan(), criteria, &NoIdentities)
        .unwrap()
        .render(PlaceholderStyle::Dollar);
    assert_eq!(
        rendered.sql,
        concat!(
            r#"SELECT DISTINCT e.* FROM "users" e LEFT JOIN "teams" t ON t.id = e.team_id "#,
            r#"WHERE t."name" NOT LIKE $1"#
        )
    );
    assert_eq!(rendered.params[0].value, Value::from("%temp%"));
}

#[test]
fn test_between_is_rejected() {
    let translator = user_translator();
    let criteria = Criteria::new().with_op("age", "BETWEEN", vec![18i64, 30]);
    let err = translator
        .apply(root_plan(), criteria, &NoIdentities)
        .unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedOperator { .. }));
    assert!(err.to_string().starts_with("[Q001]"));
}

#[test]
fn test_missing_value_is_rejected() {
    let translator = user_translator();
    let criteria = Criteria::from_json(&json!({"age": {"op": "<"}})).unwrap();
    assert!(matches!(
        translator.apply(root_plan(), criteria, &NoIdentities),
        Err(QueryError::MissingValue { .. })
    ));
}
