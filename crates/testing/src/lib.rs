// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

//! Fixtures for chronicle tests: an engine over the in-memory store plus raw
//! access to the persisted records for invariant assertions.

use chronicle_core::{
    ChronicleBranch, ChronicleChunk, ChronicleKeyRow, ChronicleMetadata, Collection, DocumentStore,
    Filter, FindOptions, SortKey, branch, chunk, keys, metadata,
};
use chronicle_engine::{Chronicle, ChronicleOptions};
use chronicle_store::{MemoryCollection, MemoryStore};
use chronicle_type::DocumentId;

/// Installs a fmt subscriber honoring `RUST_LOG`; repeated calls are fine.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An engine over a fresh in-memory store, with the store kept around so
/// tests can read the raw chronicle records back.
pub struct TestChronicle {
    pub store: MemoryStore,
    pub engine: Chronicle<MemoryCollection>,
}

pub fn test_chronicle() -> TestChronicle {
    test_chronicle_with(ChronicleOptions::new("items"))
}

pub fn test_chronicle_with(options: ChronicleOptions) -> TestChronicle {
    init_tracing();
    let store = MemoryStore::new();
    let engine = Chronicle::initialize(&store, options).expect("initialize chronicle");
    TestChronicle { store, engine }
}

impl TestChronicle {
    fn collection(&self, name: String) -> MemoryCollection {
        self.store.collection(&name)
    }

    /// All chunks of the document across branches and epochs, ordered by
    /// `(epoch, branchId, serial)`.
    pub fn chunks_of(&self, doc_id: DocumentId) -> Vec<ChronicleChunk> {
        self.collection(self.engine.config().chunks_collection())
            .find(
                &Filter::all().eq(chunk::fields::DOC_ID, doc_id),
                &FindOptions::new()
                    .sort(SortKey::asc(chunk::fields::EPOCH))
                    .sort(SortKey::asc(chunk::fields::BRANCH_ID))
                    .sort(SortKey::asc(chunk::fields::SERIAL)),
            )
            .expect("read chunks")
            .iter()
            .map(|attrs| ChronicleChunk::from_attrs(attrs).expect("decode chunk"))
            .collect()
    }

    pub fn chunks_of_branch(
        &self,
        doc_id: DocumentId,
        branch: &ChronicleBranch,
    ) -> Vec<ChronicleChunk> {
        self.chunks_of(doc_id)
            .into_iter()
            .filter(|chunk| chunk.branch_id == branch.branch_id)
            .collect()
    }

    pub fn branches_of(&self, doc_id: DocumentId) -> Vec<ChronicleBranch> {
        self.collection(self.engine.config().branches_collection())
            .find(
                &Filter::all().eq(branch::fields::DOC_ID, doc_id),
                &FindOptions::new()
                    .sort(SortKey::asc(branch::fields::EPOCH))
                    .sort(SortKey::asc(branch::fields::CREATED_AT)),
            )
            .expect("read branches")
            .iter()
            .map(|attrs| ChronicleBranch::from_attrs(attrs).expect("decode branch"))
            .collect()
    }

    pub fn metadata_of(&self, doc_id: DocumentId) -> Vec<ChronicleMetadata> {
        self.collection(self.engine.config().metadata_collection())
            .find(
                &Filter::all().eq(metadata::fields::DOC_ID, doc_id),
                &FindOptions::new().sort(SortKey::asc(metadata::fields::EPOCH)),
            )
            .expect("read metadata")
            .iter()
            .map(|attrs| ChronicleMetadata::from_attrs(attrs).expect("decode metadata"))
            .collect()
    }

    pub fn key_rows_of(&self, doc_id: DocumentId) -> Vec<ChronicleKeyRow> {
        self.collection(self.engine.config().keys_collection())
            .find(
                &Filter::all().eq(keys::fields::DOC_ID, doc_id),
                &FindOptions::new().sort(SortKey::asc(keys::fields::BRANCH_ID)),
            )
            .expect("read key rows")
            .iter()
            .map(|attrs| ChronicleKeyRow::from_attrs(attrs).expect("decode key row"))
            .collect()
    }
}
