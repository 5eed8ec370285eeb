//! Integration tests for the `rr` binary

use rr_db::{Connection, DuckDbConnection};
use std::path::Path;
use std::process::Command;

// ── Helpers ────────────────────────────────────────────────────────────

const PROJECT: &str = "tests/fixtures/shop_project";

/// Path to the compiled rr binary
fn rr_bin() -> String {
    env!("CARGO_BIN_EXE_rr").to_string()
}

/// Run an `rr` CLI command and return (stdout, stderr, success).
fn run_rr(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(rr_bin())
        .args(args)
        .env_remove("RR_DATABASE")
        .output()
        .unwrap_or_else(|e| panic!("Failed to execute rr with args {:?}: {}", args, e));
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

/// Copy the fixture project so the database file lands in a temp dir.
fn temp_project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in ["restrepo.yml", "schema_v0.yml"] {
        std::fs::copy(Path::new(PROJECT).join(file), dir.path().join(file)).unwrap();
    }
    dir
}

// ── Query ──────────────────────────────────────────────────────────────

#[test]
fn test_query_prints_sql_and_params() {
    let (stdout, stderr, success) = run_rr(&[
        "-p",
        PROJECT,
        "query",
        "-e",
        "User",
        "--criteria",
        r#"{"status": "active", "age": {"op": ">=", "value": 18}}"#,
        "--order",
        r#"{"name": "ASC"}"#,
        "--limit",
        "10",
        "--offset",
        "0",
    ]);
    assert!(success, "stderr: {}", stderr);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"SELECT DISTINCT e."id", e."name", e."status", e."age", e."team_id" FROM "users" e WHERE e."status" = $1 AND e."age" >= $2 ORDER BY e."name" ASC LIMIT 10 OFFSET 0"#,
            r#"-- $1 = "active" (text)"#,
            "-- $2 = 18 (integer)",
        ]
    );
}

#[test]
fn test_query_json_output() {
    let (stdout, stderr, success) = run_rr(&[
        "-p",
        PROJECT,
        "query",
        "-e",
        "User",
        "--criteria",
        r#"{"team_name": ["ops", "dev"]}"#,
        "-o",
        "json",
    ]);
    assert!(success, "stderr: {}", stderr);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let sql = json["sql"].as_str().unwrap();
    assert!(sql.contains(r#"INNER JOIN "teams" t ON t.id = e.team_id"#), "sql: {}", sql);
    assert_eq!(json["params"][0]["value"], "ops");
    assert_eq!(json["params"][1]["value"], "dev");
}

#[test]
fn test_query_rejects_between() {
    let (_, stderr, success) = run_rr(&[
        "-p",
        PROJECT,
        "query",
        "-e",
        "User",
        "--criteria",
        r#"{"age": {"op": "BETWEEN", "value": [1, 2]}}"#,
    ]);
    assert!(!success);
    assert!(stderr.contains("[Q001]"), "stderr: {}", stderr);
}

#[test]
fn test_query_unknown_entity() {
    let (_, stderr, success) = run_rr(&["-p", PROJECT, "query", "-e", "Ghost"]);
    assert!(!success);
    assert!(stderr.contains("Ghost"), "stderr: {}", stderr);
}

#[test]
fn test_create_schema_then_execute_query() {
    let project = temp_project();
    let dir = project.path().to_str().unwrap();

    let (stdout, stderr, success) = run_rr(&["-p", dir, "schema", "create", "-x"]);
    assert!(success, "stderr: {}", stderr);
    assert!(stdout.starts_with("Applied 5 statements"), "stdout: {}", stdout);

    {
        let conn = DuckDbConnection::open(&project.path().join("shop.duckdb")).unwrap();
        conn.execute_batch(
            "INSERT INTO teams (name) VALUES ('ops'), ('dev');
             INSERT INTO users (name, status, age, team_id) VALUES
                 ('ann', 'active', 30, 1),
                 ('bob', 'active', 17, 1),
                 ('cid', 'active', 44, 2);",
        )
        .unwrap();
    }

    let (stdout, stderr, success) = run_rr(&[
        "-p",
        dir,
        "query",
        "-e",
        "User",
        "--criteria",
        r#"{"age": {"op": ">=", "value": 18}}"#,
        "--order",
        r#"{"age": "DESC"}"#,
        "-x",
        "-o",
        "json",
    ]);
    assert!(success, "stderr: {}", stderr);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(
        rows,
        serde_json::json!([
            {"id": 3, "name": "cid", "status": "active", "age": 44, "team": 2},
            {"id": 1, "name": "ann", "status": "active", "age": 30, "team": 1}
        ])
    );
}

// ── Schema ─────────────────────────────────────────────────────────────

#[test]
fn test_schema_diff_sql_against_metadata() {
    let snapshot = format!("{}/schema_v0.yml", PROJECT);
    let (stdout, stderr, success) = run_rr(&[
        "-p",
        PROJECT,
        "schema",
        "diff",
        "--from",
        &snapshot,
        "--sql",
        "--platform",
        "generic",
    ]);
    assert!(success, "stderr: {}", stderr);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"DROP TABLE "legacy_accounts";"#,
            r#"ALTER TABLE "users" ADD COLUMN "status" VARCHAR;"#,
            r#"ALTER TABLE "users" ADD COLUMN "team_id" BIGINT;"#,
            r#"ALTER TABLE "users" RENAME COLUMN "full_name" TO "name";"#,
            r#"CREATE INDEX "idx_users_team_id" ON "users" ("team_id");"#,
            r#"ALTER TABLE "users" ADD CONSTRAINT "fk_users_team_id" FOREIGN KEY ("team_id") REFERENCES "teams" ("id");"#,
        ]
    );

    let (stdout, _, success) = run_rr(&[
        "-p",
        PROJECT,
        "schema",
        "diff",
        "--from",
        &snapshot,
        "--sql",
        "--save-mode",
        "--platform",
        "generic",
    ]);
    assert!(success);
    assert!(!stdout.contains("DROP TABLE"));
    assert_eq!(stdout.lines().count(), 5);
}

#[test]
fn test_schema_diff_summary() {
    let snapshot = format!("{}/schema_v0.yml", PROJECT);
    let (stdout, stderr, success) =
        run_rr(&["-p", PROJECT, "schema", "diff", "--from", &snapshot]);
    assert!(success, "stderr: {}", stderr);
    assert!(stdout.contains("- table legacy_accounts"));
    assert!(stdout.contains("~ column full_name -> name"));
    assert!(stdout.contains("+ foreign key fk_users_team_id"));
}

#[test]
fn test_snapshot_diffs_clean_against_metadata() {
    let project = temp_project();
    let dir = project.path().to_str().unwrap();
    let snapshot = project.path().join("current.yml");
    let snapshot = snapshot.to_str().unwrap();

    let (_, stderr, success) = run_rr(&["-p", dir, "schema", "snapshot", "-f", snapshot]);
    assert!(success, "stderr: {}", stderr);

    let (stdout, _, success) = run_rr(&["-p", dir, "schema", "diff", "--from", snapshot]);
    assert!(success);
    assert_eq!(stdout, "No schema changes\n");

    let (stdout, _, success) =
        run_rr(&["-p", dir, "schema", "diff", "--from", snapshot, "-o", "json"]);
    assert!(success);
    let diff: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(diff["new_tables"], serde_json::json!([]));
}

#[test]
fn test_schema_diff_missing_snapshot() {
    let (_, stderr, success) = run_rr(&[
        "-p",
        PROJECT,
        "schema",
        "diff",
        "--from",
        "does/not/exist.yml",
    ]);
    assert!(!success);
    assert!(stderr.contains("Failed to load snapshot"), "stderr: {}", stderr);
}
