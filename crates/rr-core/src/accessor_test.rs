use super::*;
use crate::metadata::{AssociationDef, AssociationKind, FieldDef};

fn user_metadata() -> EntityMetadata {
    EntityMetadata::new("User", "users")
        .with_field(FieldDef::new("first_name", FieldType::Text))
        .with_field(FieldDef::new("age", FieldType::Integer).nullable())
        .with_association(
            AssociationDef::new("team", AssociationKind::ManyToOne, "Team").inversed_by("members"),
        )
}

fn team_metadata() -> EntityMetadata {
    EntityMetadata::new("Team", "teams").with_association(
        AssociationDef::new("members", AssociationKind::OneToMany, "User").mapped_by("team"),
    )
}

#[test]
fn test_operation_name() {
    assert_eq!(operation_name("first_name"), "FirstName");
    assert_eq!(operation_name("name"), "Name");
    assert_eq!(operation_name("__x__y"), "XY");
}

#[test]
fn test_build_table_kinds() {
    let table = AccessorTable::build(&user_metadata());
    assert_eq!(table.entity(), "User");
    assert!(matches!(
        table.get("first_name"),
        Some(Accessor::Scalar { field_type: FieldType::Text, nullable: false, .. })
    ));
    assert!(matches!(
        table.get("team"),
        Some(Accessor::Reference { owning: true, .. })
    ));
    assert!(table.get("missing").is_none());

    let teams = AccessorTable::build(&team_metadata());
    assert!(teams.get("members").unwrap().is_collection());
}

#[test]
fn test_scalar_coerce_enforces_nullability() {
    let table = AccessorTable::build(&user_metadata());
    let name = table.get("first_name").unwrap();
    assert!(matches!(
        name.coerce(Value::Null),
        Err(CoreError::TypeMismatch { .. })
    ));
    let age = table.get("age").unwrap();
    assert_eq!(age.coerce(Value::Null).unwrap(), Value::Null);
    assert_eq!(age.coerce(Value::from("30")).unwrap(), Value::Int(30));
}

#[test]
fn test_scalar_write_marks_dirty() {
    let meta = user_metadata();
    let table = AccessorTable::build(&meta);
    let mut user = Entity::new(&meta);
    let name = table.get("first_name").unwrap();
    name.write(&mut user, Value::from("Ada")).unwrap();
    assert_eq!(name.read(&user), Some(&Value::from("Ada")));
    assert!(user.is_dirty());
}

#[test]
fn test_reference_accessors() {
    let meta = user_metadata();
    let table = AccessorTable::build(&meta);
    let mut user = Entity::new(&meta);
    let team = table.get("team").unwrap();
    assert_eq!(team.get_reference(&user).unwrap(), Some(None));
    team.set_reference(&mut user, Some(EntityKey(2))).unwrap();
    assert_eq!(team.get_reference(&user).unwrap(), Some(Some(EntityKey(2))));
    assert!(team.write(&mut user, Value::Int(1)).is_err());
}

#[test]
fn test_collection_add_remove() {
    let meta = team_metadata();
    let table = AccessorTable::build(&meta);
    let mut team = Entity::new(&meta);
    let members = table.get("members").unwrap();

    members.add_to_collection(&mut team, EntityKey(1)).unwrap();
    members.add_to_collection(&mut team, EntityKey(1)).unwrap();
    members.add_to_collection(&mut team, EntityKey(2)).unwrap();
    assert_eq!(team.collection("members"), Some(&[EntityKey(1), EntityKey(2)][..]));

    members.remove_from_collection(&mut team, EntityKey(1)).unwrap();
    members.remove_from_collection(&mut team, EntityKey(9)).unwrap();
    assert_eq!(team.collection("members"), Some(&[EntityKey(2)][..]));
}

#[test]
fn test_collection_requires_loaded_relation() {
    let meta = team_metadata();
    let table = AccessorTable::build(&meta);
    let mut proxy = Entity::proxy(&meta, Value::Int(1));
    let members = table.get("members").unwrap();
    assert!(members.add_to_collection(&mut proxy, EntityKey(1)).is_err());
}
