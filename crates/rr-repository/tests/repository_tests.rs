//! Repositories built from a `restrepo.yml` document, running on DuckDB.

use rr_core::{Config, Value};
use rr_db::{Connection, DuckDbConnection, Session};
use rr_query::{Criteria, QueryError};
use rr_repository::{values_from_json, Repository, RepositoryError};
use serde_json::json;
use std::rc::Rc;

// ── Helpers ────────────────────────────────────────────────────────────

const CONFIG: &str = r#"
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
      - { name: status, type: text, nullable: true }
      - { name: age, type: integer, nullable: true }
    associations:
      - { name: team, kind: many_to_one, target: Team, inversed_by: members }
repositories:
  User:
    local_attributes: [name, status, age]
    foreign_attributes: [team]
    foreign_criteria:
      team_name:
        field: t.name
        joins: [{ table: teams, alias: t, on: "t.id = e.team_id" }]
    criteria_aliases:
      years: age
      ignored: ~
"#;

const DDL: &str = r#"
CREATE SEQUENCE teams_id_seq START 10;
CREATE TABLE teams (id BIGINT PRIMARY KEY DEFAULT nextval('teams_id_seq'), name VARCHAR NOT NULL);
CREATE SEQUENCE users_id_seq START 100;
CREATE TABLE users (
    id BIGINT PRIMARY KEY DEFAULT nextval('users_id_seq'),
    name VARCHAR NOT NULL,
    status VARCHAR,
    age BIGINT,
    team_id BIGINT
);
INSERT INTO teams (id, name) VALUES (1, 'ops'), (2, 'dev');
INSERT INTO users (id, name, status, age, team_id) VALUES
    (1, 'ann', 'active', 30, 1),
    (2, 'bob', 'active', 17, 1),
    (3, 'cid', 'inactive', 44, 2);
"#;

fn setup() -> (Rc<Session>, Repository) {
    let config = Config::from_yaml_str(CONFIG).unwrap();
    let conn = DuckDbConnection::open_memory().unwrap();
    conn.execute_batch(DDL).unwrap();
    let session = Rc::new(Session::new(Box::new(conn), config.metadata().unwrap()));
    let users = Repository::from_config(Rc::clone(&session), &config, "User").unwrap();
    (session, users)
}

fn ids(session: &Session, keys: &[rr_core::EntityKey]) -> Vec<i64> {
    keys.iter()
        .map(|k| session.id_of(*k).unwrap().as_i64().unwrap())
        .collect()
}

// ── Tests ──────────────────────────────────────────────────────────────

#[test]
fn test_reassignment_repairs_both_collections_before_flush() {
    let (session, users) = setup();
    let ops = session.find("Team", &Value::Int(1)).unwrap().unwrap();
    let dev = session.find("Team", &Value::Int(2)).unwrap().unwrap();
    let ann = users.get(&Value::Int(1), None).unwrap().unwrap();

    users
        .update(ann, values_from_json(&json!({"team": 2})).unwrap())
        .unwrap();

    assert_eq!(ids(&session, &session.collection_of(ops, "members").unwrap()), vec![2]);
    let mut dev_members = ids(&session, &session.collection_of(dev, "members").unwrap());
    dev_members.sort();
    assert_eq!(dev_members, vec![1, 3]);

    users.flush().unwrap();
    let team_id = session
        .connection()
        .query_scalar("SELECT team_id FROM users WHERE id = 1", &[])
        .unwrap();
    assert_eq!(team_id, Value::Int(2));
}

#[test]
fn test_create_round_trip_ignores_undeclared_keys() {
    let (session, users) = setup();
    let input = json!({
        "name": "dee",
        "status": "active",
        "age": 21,
        "team": 2,
        "password": "hunter2"
    });
    users.create(values_from_json(&input).unwrap()).unwrap();
    users.flush().unwrap();
    session.clear();

    let loaded = users.get(&Value::Int(100), None).unwrap().unwrap();
    assert_eq!(
        users.to_json(loaded).unwrap(),
        json!({"id": 100, "name": "dee", "status": "active", "age": 21, "team": 2})
    );
}

#[test]
fn test_between_is_rejected_before_any_query() {
    let (session, users) = setup();
    // with the table gone, any executed query would fail with a Db error
    session
        .connection()
        .execute_batch("DROP TABLE users")
        .unwrap();
    let criteria = Criteria::from_json(&json!({"age": {"op": "BETWEEN", "value": [1, 2]}})).unwrap();
    let err = users
        .get_all(criteria, &[("name", "ASC")], None, None)
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Query(QueryError::UnsupportedOperator { .. })
    ));
}

#[test]
fn test_end_to_end_listing() {
    let (session, users) = setup();
    let criteria =
        Criteria::from_json(&json!({"status": "active", "age": {"op": ">=", "value": 18}}))
            .unwrap();
    let keys = users
        .get_all(criteria, &[("name", "ASC")], Some(10), Some(0))
        .unwrap();
    assert_eq!(ids(&session, &keys), vec![1]);
}

#[test]
fn test_virtual_key_and_aliases() {
    let (session, users) = setup();
    let criteria = Criteria::from_json(&json!({
        "team_name": {"op": "LIKE", "value": "de"},
        "years": {"op": ">", "value": 40},
        "ignored": "anything"
    }))
    .unwrap();
    let keys = users.get_all(criteria, &[("id", "ASC")], None, None).unwrap();
    assert_eq!(ids(&session, &keys), vec![3]);
    assert_eq!(
        users
            .count(Criteria::from_json(&json!({"team_name": ["ops", "dev"]})).unwrap())
            .unwrap(),
        3
    );
}

#[test]
fn test_bare_array_and_null_criteria() {
    let (session, users) = setup();
    let keys = users
        .get_all(
            Criteria::from_json(&json!({"id": [3, 1], "status": {"op": "IS NOT NULL"}})).unwrap(),
            &[("id", "DESC")],
            None,
            None,
        )
        .unwrap();
    assert_eq!(ids(&session, &keys), vec![3, 1]);
    assert_eq!(
        users
            .count(Criteria::from_json(&json!({"team": null})).unwrap())
            .unwrap(),
        0
    );
    assert_eq!(
        users
            .count(Criteria::from_json(&json!({"id": []})).unwrap())
            .unwrap(),
        0
    );
}
