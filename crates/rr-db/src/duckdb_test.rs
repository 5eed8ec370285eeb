use super::*;
use crate::traits::with_transaction;
use chrono::NaiveDate;

fn conn_with_table() -> DuckDbConnection {
    let conn = DuckDbConnection::open_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE items (id BIGINT, name VARCHAR, price DOUBLE, active BOOLEAN, seen TIMESTAMP)",
    )
    .unwrap();
    conn
}

#[test]
fn test_new_handles_memory() {
    let conn = DuckDbConnection::new(":memory:").unwrap();
    assert_eq!(conn.db_type(), "duckdb");
    assert_eq!(conn.query_scalar("SELECT 42", &[]).unwrap(), Value::Int(42));
}

#[test]
fn test_open_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.duckdb");
    {
        let conn = DuckDbConnection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (7)")
            .unwrap();
    }
    let conn = DuckDbConnection::open(&path).unwrap();
    assert_eq!(
        conn.query_scalar("SELECT x FROM t", &[]).unwrap(),
        Value::Int(7)
    );
}

#[test]
fn test_bind_and_read_values() {
    let conn = conn_with_table();
    let seen = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 30, 0)
        .unwrap();
    let inserted = conn
        .execute(
            "INSERT INTO items VALUES ($1, $2, $3, $4, $5)",
            &[
                Value::Int(1),
                Value::from("widget"),
                Value::Float(2.5),
                Value::Bool(true),
                Value::DateTime(seen),
            ],
        )
        .unwrap();
    assert_eq!(inserted, 1);

    let rows = conn
        .query_rows(
            "SELECT id, name, price, active, seen FROM items WHERE name = $1",
            &[Value::from("widget")],
        )
        .unwrap();
    assert_eq!(rows.columns, vec!["id", "name", "price", "active", "seen"]);
    assert_eq!(
        rows.rows,
        vec![vec![
            Value::Int(1),
            Value::from("widget"),
            Value::Float(2.5),
            Value::Bool(true),
            Value::DateTime(seen),
        ]]
    );
}

#[test]
fn test_null_binding() {
    let conn = conn_with_table();
    conn.execute(
        "INSERT INTO items (id, name) VALUES ($1, $2)",
        &[Value::Int(1), Value::Null],
    )
    .unwrap();
    assert_eq!(
        conn.query_scalar("SELECT name FROM items", &[]).unwrap(),
        Value::Null
    );
}

#[test]
fn test_date_column_reads_as_midnight() {
    let conn = DuckDbConnection::open_memory().unwrap();
    let value = conn.query_scalar("SELECT DATE '2024-01-02'", &[]).unwrap();
    assert_eq!(
        value,
        Value::DateTime(
            NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        )
    );
}

#[test]
fn test_list_param_rejected() {
    let conn = conn_with_table();
    let err = conn
        .query_rows(
            "SELECT * FROM items WHERE id = $1",
            &[Value::List(vec![Value::Int(1)])],
        )
        .unwrap_err();
    assert!(matches!(err, DbError::UnsupportedParam(_)));
}

#[test]
fn test_missing_table_classified() {
    let conn = DuckDbConnection::open_memory().unwrap();
    let err = conn.query_rows("SELECT * FROM nope", &[]).unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)), "{err}");
}

#[test]
fn test_query_scalar_empty_is_null() {
    let conn = conn_with_table();
    assert_eq!(
        conn.query_scalar("SELECT id FROM items", &[]).unwrap(),
        Value::Null
    );
}

#[test]
fn test_transaction_commits() {
    let conn = conn_with_table();
    with_transaction(&conn, || {
        conn.execute("INSERT INTO items (id) VALUES (1)", &[])?;
        conn.execute("INSERT INTO items (id) VALUES (2)", &[])
    })
    .unwrap();
    assert_eq!(
        conn.query_scalar("SELECT COUNT(*) FROM items", &[]).unwrap(),
        Value::Int(2)
    );
}

#[test]
fn test_transaction_rolls_back_on_error() {
    let conn = conn_with_table();
    let result: DbResult<()> = with_transaction(&conn, || {
        conn.execute("INSERT INTO items (id) VALUES (1)", &[])?;
        Err(DbError::ExecutionError("boom".to_string()))
    });
    assert!(result.is_err());
    assert_eq!(
        conn.query_scalar("SELECT COUNT(*) FROM items", &[]).unwrap(),
        Value::Int(0)
    );
}
