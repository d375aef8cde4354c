// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{ChunkType, Error, MAIN_BRANCH};
use chronicle_engine::{CreateBranchOptions, SquashOptions, SquashOutcome};
use chronicle_testing::test_chronicle;
use chronicle_type::{DocumentId, Epoch, Serial, Timestamp, attrs};

#[test]
fn test_squash_requires_confirmation() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();
    fixture.engine.save(doc_id, attrs! { "v" => 1 }).unwrap();

    let err = fixture
        .engine
        .squash(doc_id, Serial(1), SquashOptions::default())
        .unwrap_err();
    assert!(matches!(err, Error::ConfirmationRequired { .. }));
}

#[test]
fn test_squash_collapses_lineage() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    for v in 1i64..=3 {
        fixture.engine.save(doc_id, attrs! { "v" => v }).unwrap();
    }
    fixture
        .engine
        .create_branch(doc_id, "side", CreateBranchOptions::default())
        .unwrap();

    let expected = fixture
        .engine
        .as_of(doc_id, Timestamp::now(), Default::default())
        .unwrap()
        .state
        .unwrap();

    let outcome = fixture
        .engine
        .squash(
            doc_id,
            Serial(3),
            SquashOptions {
                branch_id: None,
                confirm: true,
                dry_run: false,
            },
        )
        .unwrap();
    let SquashOutcome::Applied(applied) = outcome else {
        panic!("expected an applied squash");
    };
    assert_eq!(applied.chunks_removed, 4);
    assert_eq!(applied.branches_removed, 2);
    assert_eq!(applied.state, expected);

    // exactly one branch named main, one FULL chunk at serial 1
    let branches = fixture.engine.list_branches(doc_id).unwrap();
    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].name, MAIN_BRANCH);
    assert_eq!(branches[0].branch_id, applied.branch_id);
    assert_eq!(branches[0].epoch, Epoch::FIRST);

    let chunks = fixture.chunks_of(doc_id);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].chunk_type, ChunkType::Full);
    assert_eq!(chunks[0].serial, Serial::FIRST);
    assert_eq!(chunks[0].payload, expected);

    let metadata = fixture.metadata_of(doc_id);
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0].epoch, Epoch::FIRST);
    assert_eq!(metadata[0].active_branch_id, applied.branch_id);

    let latest = fixture
        .engine
        .as_of(doc_id, Timestamp::now(), Default::default())
        .unwrap();
    assert_eq!(latest.state.unwrap(), expected);
}

#[test]
fn test_squash_to_earlier_serial_rewinds_state() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    for v in 1i64..=3 {
        fixture.engine.save(doc_id, attrs! { "v" => v }).unwrap();
    }

    let outcome = fixture
        .engine
        .squash(
            doc_id,
            Serial(2),
            SquashOptions {
                branch_id: None,
                confirm: true,
                dry_run: false,
            },
        )
        .unwrap();
    let SquashOutcome::Applied(applied) = outcome else {
        panic!("expected an applied squash");
    };
    assert_eq!(applied.state, attrs! { "v" => 2 });

    let latest = fixture
        .engine
        .as_of(doc_id, Timestamp::now(), Default::default())
        .unwrap();
    assert_eq!(latest.state.unwrap(), attrs! { "v" => 2 });
}

#[test]
fn test_squash_dry_run_changes_nothing() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    for v in 1i64..=3 {
        fixture.engine.save(doc_id, attrs! { "v" => v }).unwrap();
    }
    fixture
        .engine
        .create_branch(doc_id, "side", CreateBranchOptions::default())
        .unwrap();

    let outcome = fixture
        .engine
        .squash(
            doc_id,
            Serial(3),
            SquashOptions {
                branch_id: None,
                confirm: false,
                dry_run: true,
            },
        )
        .unwrap();
    let SquashOutcome::DryRun(dry_run) = outcome else {
        panic!("expected a dry run");
    };
    assert_eq!(dry_run.would_delete_chunks, 4);
    assert_eq!(dry_run.would_delete_branches, 1);
    assert_eq!(dry_run.new_base_state, attrs! { "v" => 3 });

    assert_eq!(fixture.chunks_of(doc_id).len(), 4);
    assert_eq!(fixture.engine.list_branches(doc_id).unwrap().len(), 2);
}

#[test]
fn test_squash_at_missing_serial_fails() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();
    fixture.engine.save(doc_id, attrs! { "v" => 1 }).unwrap();

    let err = fixture
        .engine
        .squash(
            doc_id,
            Serial(9),
            SquashOptions {
                branch_id: None,
                confirm: true,
                dry_run: false,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::SerialNotFound { .. }));
}

#[test]
fn test_squash_resets_epochs() {
    let fixture = test_chronicle();
    let doc_id = DocumentId::generate();

    // two incarnations: epoch 1 deleted, epoch 2 live at serial 2
    fixture.engine.save(doc_id, attrs! { "v" => 1 }).unwrap();
    fixture.engine.soft_delete(doc_id).unwrap();
    fixture.engine.save(doc_id, attrs! { "v" => 10 }).unwrap();
    fixture.engine.save(doc_id, attrs! { "v" => 20 }).unwrap();

    let outcome = fixture
        .engine
        .squash(
            doc_id,
            Serial(2),
            SquashOptions {
                branch_id: None,
                confirm: true,
                dry_run: false,
            },
        )
        .unwrap();
    let SquashOutcome::Applied(applied) = outcome else {
        panic!("expected an applied squash");
    };
    // chunks of both epochs are gone
    assert_eq!(applied.chunks_removed, 4);
    assert_eq!(applied.state, attrs! { "v" => 20 });

    let metadata = fixture.metadata_of(doc_id);
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0].epoch, Epoch::FIRST);

    // the next save continues the squashed lineage at serial 2
    let result = fixture.engine.save(doc_id, attrs! { "v" => 30 }).unwrap();
    assert_eq!(result.epoch, Epoch::FIRST);
    assert_eq!(result.serial, Serial(2));
}
