use super::*;
use crate::render::PlaceholderStyle;
use rr_core::{
    AssociationDef, AssociationKind, FieldDef, FieldType, JoinClause, NoIdentities, Value,
};
use serde_json::json;

fn registry() -> MetadataRegistry {
    MetadataRegistry::from_entities(vec![
        EntityMetadata::new("Team", "teams")
            .with_field(FieldDef::new("name", FieldType::Text))
            .with_association(
                AssociationDef::new("members", AssociationKind::OneToMany, "User")
                    .mapped_by("team"),
            ),
        EntityMetadata::new("User", "users")
            .with_field(FieldDef::new("name", FieldType::Text))
            .with_field(FieldDef::new("status", FieldType::Text))
            .with_field(FieldDef::new("age", FieldType::Integer))
            .with_association(
                AssociationDef::new("team", AssociationKind::ManyToOne, "Team")
                    .inversed_by("members"),
            ),
    ])
    .unwrap()
}

fn user_config() -> RepositoryConfig {
    let mut config = RepositoryConfig::default();
    config.criteria_aliases.insert("q".to_string(), Some("name".to_string()));
    config.criteria_aliases.insert("page".to_string(), None);
    config.foreign_criteria.insert(
        "team_name".to_string(),
        ForeignCriterionRule {
            field: "t.name".to_string(),
            select: vec!["t.name AS team_name".to_string()],
            joins: vec![JoinClause {
                kind: JoinKind::Inner,
                table: "teams".to_string(),
                alias: "t".to_string(),
                on: "t.id = e.team_id".to_string(),
            }],
        },
    );
    config
}

fn translator() -> CriteriaTranslator {
    CriteriaTranslator::new(&registry(), "User", &user_config()).unwrap()
}

fn translate(criteria: serde_json::Value) -> QueryResult<String> {
    let criteria = Criteria::from_json(&criteria)?;
    let plan = translator().apply(QueryPlan::new("users"), criteria, &NoIdentities)?;
    Ok(plan.render(PlaceholderStyle::Numbered).sql)
}

#[test]
fn test_unknown_entity() {
    let err = CriteriaTranslator::new(&registry(), "Ghost", &RepositoryConfig::default())
        .unwrap_err();
    assert!(matches!(err, QueryError::Core(_)));
}

#[test]
fn test_resolve_unqualified_and_root_alias() {
    let t = translator();
    assert_eq!(t.resolve_field("name").unwrap().expr, r#"e."name""#);
    assert_eq!(t.resolve_field("e.name").unwrap().expr, r#"e."name""#);
    assert!(t.resolve_field("name").unwrap().joins.is_empty());
}

#[test]
fn test_resolve_association_uses_join_column() {
    assert_eq!(translator().resolve_field("team").unwrap().expr, r#"e."team_id""#);
}

#[test]
fn test_resolve_association_alias_adds_join() {
    let resolved = translator().resolve_field("team.name").unwrap();
    assert_eq!(resolved.expr, r#""team"."name""#);
    assert_eq!(resolved.joins.len(), 1);
    assert_eq!(
        resolved.joins[0].to_sql(),
        r#"INNER JOIN "teams" "team" ON "team"."id" = e."team_id""#
    );
}

#[test]
fn test_resolve_rule_alias_passes_through() {
    let resolved = translator().resolve_field("t.name").unwrap();
    assert_eq!(resolved.expr, r#"t."name""#);
    assert_eq!(resolved.joins[0].alias, "t");
}

#[test]
fn test_resolve_invalid_fields() {
    let t = translator();
    assert!(matches!(
        t.resolve_field("nope"),
        Err(QueryError::InvalidField { .. })
    ));
    assert!(matches!(
        t.resolve_field("team.nope"),
        Err(QueryError::InvalidField { .. })
    ));
    assert!(matches!(
        t.resolve_field("x.name"),
        Err(QueryError::UnknownAlias { .. })
    ));
    assert!(matches!(
        t.resolve_field("name; DROP TABLE users"),
        Err(QueryError::InvalidField { .. })
    ));
}

#[test]
fn test_empty_criteria_has_no_where() {
    assert_eq!(translate(json!({})).unwrap(), r#"SELECT e.* FROM "users" e"#);
}

#[test]
fn test_aliases_rename_and_drop() {
    let sql = translate(json!({"q": "Ann", "page": 3})).unwrap();
    assert_eq!(sql, r#"SELECT e.* FROM "users" e WHERE e."name" = ?1"#);
}

#[test]
fn test_foreign_rule_adds_select_and_join() {
    let sql = translate(json!({"team_name": {"op": "like", "value": "ops"}})).unwrap();
    assert_eq!(
        sql,
        concat!(
            r#"SELECT t.name AS team_name FROM "users" e "#,
            r#"INNER JOIN "teams" t ON t.id = e.team_id WHERE t."name" LIKE ?1"#
        )
    );
}

#[test]
fn test_rewrite_keeps_position() {
    let (criteria, selects, joins) = translator().rewrite_keys(
        Criteria::new()
            .with("status", "active")
            .with("team_name", "ops")
            .with("age", 3i64),
    );
    assert_eq!(
        criteria.keys().collect::<Vec<_>>(),
        vec!["status", "t.name", "age"]
    );
    assert_eq!(selects, vec!["t.name AS team_name".to_string()]);
    assert_eq!(joins.len(), 1);
}

#[test]
fn test_null_and_bare_array() {
    let criteria = Criteria::from_json(&json!({"status": null, "age": [1, 2]})).unwrap();
    let plan = translator()
        .apply(QueryPlan::new("users"), criteria, &NoIdentities)
        .unwrap();
    let rendered = plan.render(PlaceholderStyle::Numbered);
    assert_eq!(
        rendered.sql,
        r#"SELECT e.* FROM "users" e WHERE e."status" IS NULL AND e."age" IN (?1, ?2)"#
    );
    assert_eq!(
        rendered.params.iter().map(|p| p.value.clone()).collect::<Vec<_>>(),
        vec![Value::Int(1), Value::Int(2)]
    );
}

#[test]
fn test_unsupported_operator_stops_translation() {
    let err = translate(json!({"age": {"op": "BETWEEN", "value": [1, 5]}})).unwrap_err();
    assert!(matches!(err, QueryError::UnsupportedOperator { .. }));
}

#[test]
fn test_invalid_rule_fragment_rejected() {
    let mut config = user_config();
    config
        .foreign_criteria
        .get_mut("team_name")
        .unwrap()
        .select
        .push("(broken".to_string());
    assert!(matches!(
        CriteriaTranslator::new(&registry(), "User", &config),
        Err(QueryError::InvalidFragment { .. })
    ));
}

#[test]
fn test_rule_join_cannot_use_root_alias() {
    let mut config = user_config();
    config.foreign_criteria.get_mut("team_name").unwrap().joins[0].alias = "e".to_string();
    assert!(CriteriaTranslator::new(&registry(), "User", &config).is_err());
}

#[test]
fn test_apply_order() {
    let plan = translator()
        .apply_order(
            QueryPlan::new("users"),
            &[("name", "asc"), ("team.name", "DESC")],
        )
        .unwrap();
    assert_eq!(
        plan.render(PlaceholderStyle::Numbered).sql,
        concat!(
            r#"SELECT e.* FROM "users" e INNER JOIN "teams" "team" ON "team"."id" = e."team_id" "#,
            r#"ORDER BY e."name" ASC, "team"."name" DESC"#
        )
    );
}

#[test]
fn test_apply_order_bad_direction() {
    let err = translator()
        .apply_order(QueryPlan::new("users"), &[("name", "upward")])
        .unwrap_err();
    assert!(matches!(err, QueryError::InvalidSortDirection { .. }));
}

#[test]
fn test_order_by_from_json() {
    let order = order_by_from_json(&json!({"name": "ASC", "age": "desc"})).unwrap();
    assert_eq!(
        order,
        vec![
            ("name".to_string(), "ASC".to_string()),
            ("age".to_string(), "desc".to_string())
        ]
    );
    assert!(order_by_from_json(&json!({"name": 1})).is_err());
}

#[test]
fn test_keyword_association_alias_is_quoted() {
    let registry = MetadataRegistry::from_entities(vec![
        EntityMetadata::new("Order", "orders").with_field(FieldDef::new("placed", FieldType::Text)),
        EntityMetadata::new("LineItem", "line_items")
            .with_field(FieldDef::new("sku", FieldType::Text))
            .with_association(AssociationDef::new("order", AssociationKind::ManyToOne, "Order")),
    ])
    .unwrap();
    let translator =
        CriteriaTranslator::new(&registry, "LineItem", &RepositoryConfig::default()).unwrap();
    let plan = translator
        .apply_order(QueryPlan::new("line_items"), &[("order.placed", "ASC")])
        .unwrap();
    let sql = plan.render(PlaceholderStyle::Numbered).sql;
    assert_eq!(
        sql,
        concat!(
            r#"SELECT e.* FROM "line_items" e INNER JOIN "orders" "order" ON "order"."id" = e."order_id" "#,
            r#"ORDER BY "order"."placed" ASC"#
        )
    );
    let parsed = sqlparser::parser::Parser::parse_sql(&sqlparser::dialect::DuckDbDialect {}, &sql);
    assert!(parsed.is_ok(), "{:?}", parsed);
}
