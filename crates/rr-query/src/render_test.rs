use super::*;
use crate::criterion::{CompareOp, Criterion};
use crate::plan::{Join, SortDirection};
use rr_core::{JoinKind, NoIdentities, Value};

fn predicate(expr: &str, criterion: Criterion) -> Predicate {
    Predicate::from_criterion(expr.to_string(), expr, &criterion, &NoIdentities).unwrap()
}

#[test]
fn test_render_bare_plan() {
    let rendered = QueryPlan::new("users").render(PlaceholderStyle::Numbered);
    assert_eq!(rendered.sql, r#"SELECT e.* FROM "users" e"#);
    assert!(rendered.params.is_empty());
}

#[test]
fn test_render_clause_order() {
    let plan = QueryPlan::new("users")
        .distinct(true)
        .select("e.*")
        .join(Join {
            kind: JoinKind::Left,
            table: "teams".to_string(),
            alias: "t".to_string(),
            on: "t.id = e.team_id".to_string(),
        })
        .filter(predicate("e.\"status\"", Criterion::Equals(Value::from("active"))))
        .filter(predicate(
            "e.\"age\"",
            Criterion::Compare(CompareOp::Ge, Value::Int(18)),
        ))
        .group_by("e.\"id\"")
        .order_by("e.\"name\"", SortDirection::Asc)
        .limit(Some(10))
        .offset(Some(0));

    let rendered = plan.render(PlaceholderStyle::Numbered);
    assert_eq!(
        rendered.sql,
        concat!(
            r#"SELECT DISTINCT e.* FROM "users" e LEFT JOIN "teams" t ON t.id = e.team_id "#,
            r#"WHERE e."status" = ?1 AND e."age" >= ?2 GROUP BY e."id" "#,
            r#"ORDER BY e."name" ASC LIMIT 10 OFFSET 0"#
        )
    );
    let values: Vec<Value> = rendered.params.into_iter().map(|p| p.value).collect();
    assert_eq!(values, vec![Value::from("active"), Value::Int(18)]);
}

#[test]
fn test_render_dollar_placeholders_expand_arrays() {
    let plan = QueryPlan::new("users")
        .filter(predicate(
            "e.\"id\"",
            Criterion::InSet {
                values: vec![Value::Int(1), Value::Int(2), Value::Int(3)],
                negate: true,
            },
        ))
        .filter(predicate(
            "e.\"name\"",
            Criterion::Like {
                pattern: "%a%".to_string(),
                negate: false,
            },
        ));
    let rendered = plan.render(PlaceholderStyle::Dollar);
    assert_eq!(
        rendered.sql,
        r#"SELECT e.* FROM "users" e WHERE e."id" NOT IN ($1, $2, $3) AND e."name" LIKE $4"#
    );
    assert_eq!(rendered.params.len(), 4);
}

#[test]
fn test_render_null_checks_and_constants() {
    let plan = QueryPlan::new("users")
        .filter(predicate("e.\"deleted_at\"", Criterion::NullCheck { negate: false }))
        .filter(predicate("e.\"email\"", Criterion::NullCheck { negate: true }))
        .filter(predicate(
            "e.\"id\"",
            Criterion::InSet {
                values: vec![],
                negate: false,
            },
        ));
    let rendered = plan.render(PlaceholderStyle::Numbered);
    assert_eq!(
        rendered.sql,
        r#"SELECT e.* FROM "users" e WHERE e."deleted_at" IS NULL AND e."email" IS NOT NULL AND 1 = 0"#
    );
    assert!(rendered.params.is_empty());
}

#[test]
fn test_render_not_equals() {
    let plan = QueryPlan::new("users")
        .filter(predicate("e.\"status\"", Criterion::NotEquals(Value::from("banned"))));
    assert_eq!(
        plan.render(PlaceholderStyle::Numbered).sql,
        r#"SELECT e.* FROM "users" e WHERE e."status" <> ?1"#
    );
}
