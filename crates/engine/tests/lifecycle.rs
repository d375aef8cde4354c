// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{ChunkType, Error};
use chronicle_engine::{ListDeletedOptions, UndeleteOptions};
use chronicle_testing::test_chronicle;
use chronicle_type::{DocumentId, Serial, Timestamp, attrs};

#[test]
fn test_soft_delete_appends_snapshot_chunk() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    fixture.engine.save(doc_id, attrs! { "email" => "x@y" }).unwrap();
    fixture
        .engine
        .save(doc_id, attrs! { "email" => "x@y", "n" => "Updated" })
        .unwrap();

    let result = fixture.engine.soft_delete(doc_id).unwrap();
    assert_eq!(result.final_state, attrs! { "email" => "x@y", "n" => "Updated" });

    let chunks = fixture.chunks_of(doc_id);
    assert_eq!(chunks.len(), 3);
    let deletion = &chunks[2];
    assert_eq!(deletion.chunk_type, ChunkType::Full);
    assert!(deletion.is_deleted);
    assert!(deletion.is_latest);
    assert_eq!(deletion.serial, Serial(3));
    // the deletion chunk carries the complete pre-deletion snapshot
    assert_eq!(deletion.payload, result.final_state);

    let rows = fixture.key_rows_of(doc_id);
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_deleted);
}

#[test]
fn test_soft_delete_twice_fails() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    fixture.engine.save(doc_id, attrs! { "a" => 1 }).unwrap();
    fixture.engine.soft_delete(doc_id).unwrap();
    let err = fixture.engine.soft_delete(doc_id).unwrap_err();
    assert!(matches!(err, Error::AlreadyDeleted { .. }));
}

#[test]
fn test_soft_delete_unknown_document_fails() {
    let fixture = test_chronicle();
    let err = fixture
        .engine
        .soft_delete(DocumentId::generate())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_undelete_restores_final_state() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    fixture.engine.save(doc_id, attrs! { "email" => "x@y" }).unwrap();
    fixture
        .engine
        .save(doc_id, attrs! { "email" => "x@y", "n" => "Updated" })
        .unwrap();
    fixture.engine.soft_delete(doc_id).unwrap();

    let listed = fixture.engine.list_deleted(ListDeletedOptions::default()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].doc_id, doc_id);
    assert_eq!(listed[0].final_state, attrs! { "email" => "x@y", "n" => "Updated" });

    let restored = fixture
        .engine
        .undelete(doc_id, UndeleteOptions::default())
        .unwrap();
    assert_eq!(restored.restored_state, attrs! { "email" => "x@y", "n" => "Updated" });

    let latest = fixture
        .engine
        .as_of(doc_id, Timestamp::now(), Default::default())
        .unwrap();
    assert_eq!(latest.state.unwrap(), attrs! { "email" => "x@y", "n" => "Updated" });

    let rows = fixture.key_rows_of(doc_id);
    assert!(!rows[0].is_deleted);

    // the undelete chunk is a live FULL on the next serial
    let chunks = fixture.chunks_of(doc_id);
    assert_eq!(chunks.len(), 4);
    assert_eq!(chunks[3].chunk_type, ChunkType::Full);
    assert!(!chunks[3].is_deleted);
    assert_eq!(chunks[3].serial, Serial(4));
}

#[test]
fn test_undelete_of_live_document_fails() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    fixture.engine.save(doc_id, attrs! { "a" => 1 }).unwrap();
    let err = fixture
        .engine
        .undelete(doc_id, UndeleteOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotDeleted { .. }));
}

#[test]
fn test_undelete_unknown_document_fails() {
    let fixture = test_chronicle();
    let err = fixture
        .engine
        .undelete(DocumentId::generate(), UndeleteOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn test_list_deleted_time_filters_and_order() {
    let fixture = test_chronicle();
    let first = DocumentId::generate();
    let second = DocumentId::generate();

    fixture.engine.save(first, attrs! { "n" => 1 }).unwrap();
    fixture.engine.save(second, attrs! { "n" => 2 }).unwrap();

    fixture.engine.soft_delete(first).unwrap();
    let between = Timestamp::now();
    fixture.engine.soft_delete(second).unwrap();

    let all = fixture.engine.list_deleted(ListDeletedOptions::default()).unwrap();
    let ids: Vec<DocumentId> = all.iter().map(|entry| entry.doc_id).collect();
    // newest deletion first
    assert_eq!(ids, vec![second, first]);

    let late = fixture
        .engine
        .list_deleted(ListDeletedOptions {
            deleted_after: Some(between),
            deleted_before: None,
        })
        .unwrap();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].doc_id, second);

    let early = fixture
        .engine
        .list_deleted(ListDeletedOptions {
            deleted_after: None,
            deleted_before: Some(between),
        })
        .unwrap();
    assert_eq!(early.len(), 1);
    assert_eq!(early[0].doc_id, first);
}

#[test]
fn test_undeleted_document_leaves_the_deleted_listing() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    fixture.engine.save(doc_id, attrs! { "a" => 1 }).unwrap();
    fixture.engine.soft_delete(doc_id).unwrap();
    fixture
        .engine
        .undelete(doc_id, UndeleteOptions::default())
        .unwrap();

    assert!(
        fixture
            .engine
            .list_deleted(ListDeletedOptions::default())
            .unwrap()
            .is_empty()
    );
}
