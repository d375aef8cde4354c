// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::Error;
use chronicle_engine::{ChronicleOptions, CreateBranchOptions, UndeleteOptions};
use chronicle_testing::{TestChronicle, test_chronicle_with};
use chronicle_type::{DocumentId, Value, attrs};

fn unique_email_chronicle() -> TestChronicle {
    test_chronicle_with(ChronicleOptions::new("users").unique_field("email"))
}

#[test]
fn test_duplicate_unique_value_is_rejected() {
    let fixture = unique_email_chronicle();
    let doc_a = DocumentId::generate();
    let doc_b = DocumentId::generate();

    fixture.engine.save(doc_a, attrs! { "email" => "a@b" }).unwrap();
    let err = fixture
        .engine
        .save(doc_b, attrs! { "email" => "a@b" })
        .unwrap_err();
    assert!(
        matches!(err, Error::UniqueConstraintViolation { ref field, ref value }
            if field == "email" && *value == Value::from("a@b"))
    );
}

#[test]
fn test_update_does_not_collide_with_itself() {
    let fixture = unique_email_chronicle();
    let doc_id = DocumentId::generate();

    fixture.engine.save(doc_id, attrs! { "email" => "a@b" }).unwrap();
    fixture
        .engine
        .save(doc_id, attrs! { "email" => "a@b", "n" => 1 })
        .unwrap();
}

#[test]
fn test_soft_delete_releases_the_slot() {
    let fixture = unique_email_chronicle();
    let doc_a = DocumentId::generate();
    let doc_b = DocumentId::generate();

    fixture.engine.save(doc_a, attrs! { "email" => "a@b" }).unwrap();
    fixture.engine.soft_delete(doc_a).unwrap();

    // the freed value is available to another document
    fixture.engine.save(doc_b, attrs! { "email" => "a@b" }).unwrap();
}

#[test]
fn test_undelete_fails_when_slot_was_taken() {
    let fixture = unique_email_chronicle();
    let doc_a = DocumentId::generate();
    let doc_b = DocumentId::generate();

    fixture.engine.save(doc_a, attrs! { "email" => "a@b" }).unwrap();
    fixture.engine.soft_delete(doc_a).unwrap();
    fixture.engine.save(doc_b, attrs! { "email" => "a@b" }).unwrap();

    let err = fixture
        .engine
        .undelete(doc_a, UndeleteOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::UniqueConstraintViolation { .. }));
}

#[test]
fn test_sparse_values_never_collide() {
    let fixture = unique_email_chronicle();
    let doc_a = DocumentId::generate();
    let doc_b = DocumentId::generate();

    fixture.engine.save(doc_a, attrs! { "n" => 1 }).unwrap();
    fixture.engine.save(doc_b, attrs! { "n" => 2 }).unwrap();
}

#[test]
fn test_uniqueness_is_scoped_per_branch() {
    let fixture = unique_email_chronicle();
    let doc_a = DocumentId::generate();
    let doc_b = DocumentId::generate();

    fixture.engine.save(doc_a, attrs! { "email" => "a@b" }).unwrap();
    fixture
        .engine
        .create_branch(
            doc_a,
            "feature",
            CreateBranchOptions {
                activate: true,
                from_serial: None,
            },
        )
        .unwrap();
    fixture
        .engine
        .save(doc_a, attrs! { "email" => "feature@b" })
        .unwrap();

    // doc_a's main still holds a@b, so a new document on its own main
    // conflicts; the feature timeline does not shield it
    let err = fixture
        .engine
        .save(doc_b, attrs! { "email" => "a@b" })
        .unwrap_err();
    assert!(matches!(err, Error::UniqueConstraintViolation { .. }));

    // but a value held only on a feature timeline does not block main
    fixture
        .engine
        .save(doc_b, attrs! { "email" => "feature@b" })
        .unwrap();
}

#[test]
fn test_changing_unique_value_frees_the_old_one() {
    let fixture = unique_email_chronicle();
    let doc_a = DocumentId::generate();
    let doc_b = DocumentId::generate();

    fixture.engine.save(doc_a, attrs! { "email" => "a@b" }).unwrap();
    fixture.engine.save(doc_a, attrs! { "email" => "a2@b" }).unwrap();

    fixture.engine.save(doc_b, attrs! { "email" => "a@b" }).unwrap();
    let err = fixture
        .engine
        .save(doc_b, attrs! { "email" => "a2@b" })
        .unwrap_err();
    assert!(matches!(err, Error::UniqueConstraintViolation { .. }));
}

#[test]
fn test_key_rows_track_current_values() {
    let fixture = unique_email_chronicle();
    let doc_id = DocumentId::generate();

    fixture.engine.save(doc_id, attrs! { "email" => "a@b" }).unwrap();
    fixture.engine.save(doc_id, attrs! { "email" => "a2@b" }).unwrap();

    let rows = fixture.key_rows_of(doc_id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].branch, "main");
    assert_eq!(rows[0].keys.get("email"), Some(&Value::from("a2@b")));
    assert!(!rows[0].is_deleted);
}
