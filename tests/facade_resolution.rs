//! Integration tests for identity resolution and the field lookup chain.

mod support;

use recview::error::ModelError;
use recview::source::{DataSource, RecordRef};
use recview::types::ROOT_UID;
use recview::value::{CanonicalValue, RawValue};
use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use support::{sample_world, CLIENT_UID, SAMPLE_UID, UNKNOWN_UID};

#[test]
fn two_facades_from_one_uid_yield_equal_values() {
    let world = sample_world();
    let a = world.facade(SAMPLE_UID).unwrap();
    let b = world.facade(SAMPLE_UID).unwrap();

    assert_eq!(a.get("title").unwrap(), b.get("title").unwrap());
    assert_eq!(a.get("volume").unwrap(), b.get("volume").unwrap());
    assert_eq!(a, b);
}

#[test]
fn root_sentinel_resolves_without_catalog_query() {
    let world = sample_world();
    let root = world.facade(ROOT_UID).unwrap();

    assert_eq!(root.uid(), ROOT_UID);
    assert!(root.is_valid());
    assert_eq!(world.catalog.query_count(), 0);
    assert_eq!(world.audit.query_count(), 0);
    assert_eq!(world.source.global_lookup_count(), 0);
}

#[test]
fn malformed_seed_text_is_unsupported() {
    let world = sample_world();
    assert!(matches!(
        world.facade("banana"),
        Err(ModelError::Unsupported(_))
    ));
}

#[test]
fn bare_uid_discovers_owning_catalog_then_queries_it() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();

    let title = facade.get("title").unwrap();
    assert_eq!(title, Some(CanonicalValue::Text("Water".to_string())));
    assert_eq!(world.source.global_lookup_count(), 1);
    assert_eq!(world.catalog.query_count(), 1);
    // audit catalogs are never selected as the owning catalog
    assert_eq!(world.audit.query_count(), 0);
}

#[test]
fn repeated_gets_reuse_the_resolved_projection() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();

    facade.get("title").unwrap();
    facade.get("volume").unwrap();
    facade.get("client").unwrap();
    assert_eq!(world.catalog.query_count(), 1);
}

#[test]
fn unknown_uid_is_not_found_and_invalid() {
    let world = sample_world();
    let facade = world.facade(UNKNOWN_UID).unwrap();

    assert!(matches!(
        facade.get("title"),
        Err(ModelError::NotFound(_))
    ));
    assert!(!facade.is_valid());
}

#[test]
fn duplicate_projections_are_ambiguous() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();

    // second row for the same identifier
    let duplicate = world
        .source
        .find_projection(SAMPLE_UID)
        .expect("sample projection");
    world.catalog.push_row(duplicate);

    match facade.get("title") {
        Err(ModelError::Ambiguous { uid, count }) => {
            assert_eq!(uid, SAMPLE_UID);
            assert_eq!(count, 2);
        }
        other => panic!("expected ambiguous, got {:?}", other),
    }
    assert!(!facade.is_valid());
}

#[test]
fn indexed_column_resolves_without_waking_the_record() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();

    facade.get("title").unwrap();
    assert_eq!(world.source.record(SAMPLE_UID).unwrap().wake_count(), 0);
}

#[test]
fn unindexed_field_wakes_the_record_once() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();

    assert_eq!(
        facade.get("volume").unwrap(),
        Some(CanonicalValue::Int(500))
    );
    facade.get("client").unwrap();
    assert_eq!(world.source.record(SAMPLE_UID).unwrap().wake_count(), 1);
}

#[test]
fn flush_triggers_a_fresh_resolution() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();
    let record = world.source.record(SAMPLE_UID).unwrap();

    facade.get("volume").unwrap();
    facade.get("volume").unwrap();
    assert_eq!(record.read_count(), 1);

    facade.flush();
    facade.get("volume").unwrap();
    assert_eq!(record.read_count(), 2);
}

#[test]
fn seed_representations_compare_and_hash_equal() {
    let world = sample_world();
    let record = world.source.record(SAMPLE_UID).unwrap();
    let projection = world.source.find_projection(SAMPLE_UID).unwrap();

    let from_record = world.facade(record as RecordRef).unwrap();
    let from_projection = world.facade(projection).unwrap();

    assert_eq!(from_record, from_projection);

    let mut h1 = DefaultHasher::new();
    let mut h2 = DefaultHasher::new();
    from_record.hash(&mut h1);
    from_projection.hash(&mut h2);
    assert_eq!(h1.finish(), h2.finish());
}

#[test]
fn reference_fields_stay_lazy_until_accessed() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();

    let client = match facade.get("client").unwrap() {
        Some(CanonicalValue::Ref(f)) => f,
        other => panic!("expected reference, got {:?}", other),
    };
    assert_eq!(client.uid(), CLIENT_UID);
    // wrapping never touched the client record
    assert_eq!(world.source.record(CLIENT_UID).unwrap().wake_count(), 0);

    assert_eq!(
        client.get("title").unwrap(),
        Some(CanonicalValue::Text("Acme Labs".to_string()))
    );
}

#[test]
fn mutually_referential_records_do_not_expand_infinitely() {
    let world = sample_world();
    world
        .source
        .record(SAMPLE_UID)
        .unwrap()
        .set_field("getClient", RawValue::text(CLIENT_UID));
    let client = world.source.record(CLIENT_UID).unwrap();
    client.set_field("getTitle", RawValue::text(SAMPLE_UID));

    let sample = world.facade(SAMPLE_UID).unwrap();
    let client_ref = sample.get("client").unwrap().unwrap();
    let back_ref = match &client_ref {
        CanonicalValue::Ref(f) => f.get("title").unwrap().unwrap(),
        other => panic!("expected reference, got {:?}", other),
    };
    assert_eq!(back_ref.ref_uid(), Some(SAMPLE_UID));
}

#[test]
fn attribute_fallback_is_normalized_but_uncached() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();
    let record = world.source.record(SAMPLE_UID).unwrap();

    let calls = Rc::new(Cell::new(0usize));
    let seen = calls.clone();
    record.set_attr(
        "computed_state",
        RawValue::thunk(move || {
            seen.set(seen.get() + 1);
            RawValue::text("in progress")
        }),
    );

    assert_eq!(
        facade.get("computed_state").unwrap(),
        Some(CanonicalValue::Text("in progress".to_string()))
    );
    facade.get("computed_state").unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn private_names_are_not_exposed_through_the_fallback() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();

    assert_eq!(facade.get("_secret").unwrap(), None);
}

#[test]
fn absent_names_fall_through_to_the_default() {
    let world = sample_world();
    let facade = world.facade(SAMPLE_UID).unwrap();

    assert_eq!(facade.get("no_such_field").unwrap(), None);
    assert_eq!(
        facade
            .get_or("no_such_field", CanonicalValue::Text("n/a".to_string()))
            .unwrap(),
        CanonicalValue::Text("n/a".to_string())
    );
    assert!(matches!(
        facade.at("no_such_field"),
        Err(ModelError::KeyMissing(_))
    ));
}

#[test]
fn release_deactivates_a_clean_record() {
    let world = sample_world();
    let record = world.source.record(SAMPLE_UID).unwrap();
    let facade = world.facade(record.clone() as RecordRef).unwrap();

    facade.release();
    assert!(!record.is_active());
}

#[test]
fn release_never_deactivates_a_dirty_record() {
    let world = sample_world();
    let record = world.source.record(SAMPLE_UID).unwrap();
    record.set_dirty(true);
    let facade = world.facade(record.clone() as RecordRef).unwrap();

    facade.release();
    assert!(record.is_active());
}
