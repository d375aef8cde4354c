// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{
    Collection, DocumentStore, Error, Filter, FindOptions, IndexSpec, SortKey, UpdateDoc,
};
use chronicle_store::MemoryStore;
use chronicle_type::{Value, attrs};

#[test]
fn test_collections_are_shared_by_name() {
    let store = MemoryStore::new();
    let first = store.collection("users");
    let second = store.collection("users");

    first.insert_one(attrs! { "a" => 1 }).unwrap();
    assert_eq!(second.count(&Filter::all()).unwrap(), 1);
    assert_eq!(store.collection("other").count(&Filter::all()).unwrap(), 0);
}

#[test]
fn test_find_sort_and_limit() {
    let store = MemoryStore::new();
    let coll = store.collection("chunks");
    for serial in [3i64, 1, 2] {
        coll.insert_one(attrs! { "serial" => serial }).unwrap();
    }

    let ascending = coll
        .find(
            &Filter::all(),
            &FindOptions::new().sort(SortKey::asc("serial")),
        )
        .unwrap();
    let serials: Vec<i64> = ascending
        .iter()
        .filter_map(|doc| doc.get("serial").and_then(Value::as_int))
        .collect();
    assert_eq!(serials, vec![1, 2, 3]);

    let top = coll
        .find_one(
            &Filter::all(),
            &FindOptions::new().sort(SortKey::desc("serial")),
        )
        .unwrap()
        .unwrap();
    assert_eq!(top.get("serial"), Some(&Value::Int(3)));
}

#[test]
fn test_unique_index_rejects_duplicates() {
    let store = MemoryStore::new();
    let coll = store.collection("keys");
    coll.create_index(IndexSpec::new("email_unique", vec![SortKey::asc("email")]).unique())
        .unwrap();

    coll.insert_one(attrs! { "email" => "x@y" }).unwrap();
    let err = coll.insert_one(attrs! { "email" => "x@y" }).unwrap_err();
    assert!(matches!(err, Error::DuplicateKey { ref index, .. } if index == "email_unique"));

    coll.insert_one(attrs! { "email" => "other@y" }).unwrap();
}

#[test]
fn test_partial_unique_index_ignores_filtered_rows() {
    let store = MemoryStore::new();
    let coll = store.collection("keys");
    coll.create_index(
        IndexSpec::new("email_live_unique", vec![SortKey::asc("email")])
            .unique()
            .partial(Filter::all().eq("isDeleted", false)),
    )
    .unwrap();

    coll.insert_one(attrs! { "email" => "x@y", "isDeleted" => true })
        .unwrap();
    // the deleted row does not hold the slot
    coll.insert_one(attrs! { "email" => "x@y", "isDeleted" => false })
        .unwrap();
    // but a second live row does collide
    let err = coll
        .insert_one(attrs! { "email" => "x@y", "isDeleted" => false })
        .unwrap_err();
    assert!(err.is_duplicate_key());
}

#[test]
fn test_sparse_nulls_do_not_collide() {
    let store = MemoryStore::new();
    let coll = store.collection("keys");
    coll.create_index(
        IndexSpec::new("email_sparse_unique", vec![SortKey::asc("email")])
            .unique()
            .partial(Filter::all().ne("email", Value::Undefined)),
    )
    .unwrap();

    coll.insert_one(attrs! { "email" => Value::Undefined }).unwrap();
    coll.insert_one(attrs! { "email" => Value::Undefined }).unwrap();
    coll.insert_one(attrs! { "email" => "x@y" }).unwrap();
    assert!(
        coll.insert_one(attrs! { "email" => "x@y" })
            .unwrap_err()
            .is_duplicate_key()
    );
}

#[test]
fn test_update_one_moves_index_entries() {
    let store = MemoryStore::new();
    let coll = store.collection("keys");
    coll.create_index(IndexSpec::new("email_unique", vec![SortKey::asc("email")]).unique())
        .unwrap();

    coll.insert_one(attrs! { "email" => "a@y", "n" => 1 }).unwrap();
    coll.update_one(
        &Filter::all().eq("n", 1),
        &UpdateDoc::new().set("email", "b@y"),
        false,
    )
    .unwrap();

    // the old slot is free again, the new one is taken
    coll.insert_one(attrs! { "email" => "a@y" }).unwrap();
    assert!(
        coll.insert_one(attrs! { "email" => "b@y" })
            .unwrap_err()
            .is_duplicate_key()
    );
}

#[test]
fn test_update_one_upserts_from_filter() {
    let store = MemoryStore::new();
    let coll = store.collection("meta");

    let outcome = coll
        .update_one(
            &Filter::all().eq("docId", "d1").eq("branchId", "b1"),
            &UpdateDoc::new().set("isDeleted", true),
            true,
        )
        .unwrap();
    assert!(outcome.upserted);

    let doc = coll
        .find_one(&Filter::all().eq("docId", "d1"), &FindOptions::new())
        .unwrap()
        .unwrap();
    assert_eq!(doc.get("branchId"), Some(&Value::from("b1")));
    assert_eq!(doc.get("isDeleted"), Some(&Value::Bool(true)));

    // second call hits the existing row instead of inserting
    let outcome = coll
        .update_one(
            &Filter::all().eq("docId", "d1").eq("branchId", "b1"),
            &UpdateDoc::new().set("isDeleted", false),
            true,
        )
        .unwrap();
    assert_eq!(outcome.matched, 1);
    assert_eq!(coll.count(&Filter::all()).unwrap(), 1);
}

#[test]
fn test_update_many_and_delete_many() {
    let store = MemoryStore::new();
    let coll = store.collection("chunks");
    for serial in 1i64..=5 {
        coll.insert_one(attrs! { "serial" => serial, "isLatest" => (serial == 5) })
            .unwrap();
    }

    let modified = coll
        .update_many(
            &Filter::all().eq("isLatest", true),
            &UpdateDoc::new().set("isLatest", false),
        )
        .unwrap();
    assert_eq!(modified, 1);
    assert_eq!(coll.count(&Filter::all().eq("isLatest", true)).unwrap(), 0);

    let removed = coll.delete_many(&Filter::all().gt("serial", 2)).unwrap();
    assert_eq!(removed, 3);
    assert_eq!(coll.count(&Filter::all()).unwrap(), 2);
}

#[test]
fn test_delete_frees_unique_slot() {
    let store = MemoryStore::new();
    let coll = store.collection("keys");
    coll.create_index(IndexSpec::new("email_unique", vec![SortKey::asc("email")]).unique())
        .unwrap();

    coll.insert_one(attrs! { "email" => "x@y" }).unwrap();
    coll.delete_many(&Filter::all().eq("email", "x@y")).unwrap();
    coll.insert_one(attrs! { "email" => "x@y" }).unwrap();
}

#[test]
fn test_create_index_is_idempotent_and_checks_existing_rows() {
    let store = MemoryStore::new();
    let coll = store.collection("keys");
    coll.insert_one(attrs! { "email" => "x@y" }).unwrap();
    coll.insert_one(attrs! { "email" => "x@y" }).unwrap();

    let err = coll
        .create_index(IndexSpec::new("email_unique", vec![SortKey::asc("email")]).unique())
        .unwrap_err();
    assert!(err.is_duplicate_key());

    coll.create_index(IndexSpec::new("serial_idx", vec![SortKey::asc("serial")]))
        .unwrap();
    // same name again is a no-op
    coll.create_index(IndexSpec::new("serial_idx", vec![SortKey::asc("serial")]))
        .unwrap();
}
