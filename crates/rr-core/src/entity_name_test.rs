use super::*;

#[test]
fn test_short_name() {
    assert_eq!(EntityName::new("User").short_name(), "User");
    assert_eq!(EntityName::new("App\\Entities\\User").short_name(), "User");
    assert_eq!(EntityName::new("app::Team").short_name(), "Team");
}

#[test]
fn test_try_new_rejects_empty() {
    assert!(EntityName::try_new("").is_none());
    assert_eq!(EntityName::try_new("Team").unwrap(), "Team");
}

#[test]
fn test_deserialize_rejects_empty() {
    let result: Result<EntityName, _> = serde_yaml::from_str("''");
    assert!(result.is_err());
}
