use super::*;
use rr_core::JoinKind;

fn join(on: &str) -> JoinClause {
    JoinClause {
        kind: JoinKind::Inner,
        table: "teams".to_string(),
        alias: "t".to_string(),
        on: on.to_string(),
    }
}

#[test]
fn test_valid_select() {
    assert!(validate_select("t.name AS team_name").is_ok());
    assert!(validate_select("COUNT(DISTINCT e.id)").is_ok());
}

#[test]
fn test_invalid_select() {
    assert!(matches!(
        validate_select("(t.name"),
        Err(QueryError::InvalidFragment { .. })
    ));
}

#[test]
fn test_select_injection_rejected() {
    assert!(validate_select("1 FROM x; DROP TABLE users; SELECT 1").is_err());
}

#[test]
fn test_valid_join() {
    assert!(validate_join(&join("t.id = e.team_id")).is_ok());
}

#[test]
fn test_invalid_join() {
    assert!(validate_join(&join("t.id = ")).is_err());
    assert!(validate_join(&join("1 = 1; DELETE FROM users")).is_err());
}
