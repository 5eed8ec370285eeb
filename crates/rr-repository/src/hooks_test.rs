use super::*;
use rr_core::{EntityMetadata, FieldDef, FieldType, MetadataRegistry, Value};
use rr_db::DuckDbConnection;
use std::cell::RefCell;
use std::rc::Rc;

fn session() -> Session {
    let registry = MetadataRegistry::from_entities(vec![EntityMetadata::new("Tag", "tags")
        .with_field(FieldDef::new("label", FieldType::Text))])
    .unwrap();
    Session::new(Box::new(DuckDbConnection::open_memory().unwrap()), registry)
}

#[test]
fn test_hooks_run_in_registration_order() {
    let session = session();
    let key = session.create("Tag").unwrap();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut pipeline = HookPipeline::new();
    for n in 1..=2 {
        let seen = Rc::clone(&seen);
        pipeline.register(HookStage::PreCreate, move |ctx, _| {
            seen.borrow_mut().push((n, ctx.stage));
            Ok(())
        });
    }

    pipeline
        .run(HookStage::PreCreate, &session, key, &mut Values::new())
        .unwrap();
    pipeline
        .run(HookStage::PostCreate, &session, key, &mut Values::new())
        .unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![(1, HookStage::PreCreate), (2, HookStage::PreCreate)]
    );
    assert_eq!(pipeline.count(HookStage::PreCreate), 2);
    assert_eq!(pipeline.count(HookStage::PostCreate), 0);
}

#[test]
fn test_hook_can_rewrite_values() {
    let session = session();
    let key = session.create("Tag").unwrap();
    let mut pipeline = HookPipeline::new();
    pipeline.register(HookStage::PreUpdate, |_, values| {
        values.insert("label".to_string(), Value::from("forced"));
        Ok(())
    });
    let mut values = Values::new();
    pipeline
        .run(HookStage::PreUpdate, &session, key, &mut values)
        .unwrap();
    assert_eq!(values.get("label"), Some(&Value::from("forced")));
}

#[test]
fn test_failing_hook_stops_pipeline() {
    let session = session();
    let key = session.create("Tag").unwrap();
    let calls = Rc::new(RefCell::new(0));
    let mut pipeline = HookPipeline::new();
    pipeline.register(HookStage::PreDelete, |_, _| {
        Err(crate::error::RepositoryError::validation("locked"))
    });
    let counter = Rc::clone(&calls);
    pipeline.register(HookStage::PreDelete, move |_, _| {
        *counter.borrow_mut() += 1;
        Ok(())
    });
    assert!(pipeline
        .run(HookStage::PreDelete, &session, key, &mut Values::new())
        .is_err());
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn test_write_tracker_only_moves_forward() {
    let mut tracker = WriteTracker::start("delete", &EntityName::new("Tag"));
    tracker.advance(WriteStage::PreHook);
    tracker.advance(WriteStage::PostHook);
    tracker.advance(WriteStage::PreHook);
    assert_eq!(tracker.stage(), WriteStage::PostHook);
    tracker.advance(WriteStage::QueuedForPersist);
    assert_eq!(tracker.stage(), WriteStage::QueuedForPersist);
}
