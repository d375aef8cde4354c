// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{
    ChronicleChunk, Collection, Filter, FindOptions, Result, SortKey, UpdateDoc, chunk::fields,
};
use chronicle_type::{BranchId, ChunkId, DocumentId, Epoch, Serial, Timestamp};

/// Upper bound of a chunk scan within one `(docId, epoch, branchId)` group.
#[derive(Clone, Copy, Debug)]
pub(crate) enum ChunkBound {
    Latest,
    Serial(Serial),
    Time(Timestamp),
}

/// Append-only access to the chunk collection (component C2). All operations
/// are scoped to one `(docId, epoch, branchId)` group unless stated
/// otherwise.
pub(crate) struct ChunkStore<'a, C: Collection> {
    collection: &'a C,
}

impl<'a, C: Collection> ChunkStore<'a, C> {
    pub fn new(collection: &'a C) -> Self {
        Self { collection }
    }

    fn group(doc_id: DocumentId, epoch: Epoch, branch_id: BranchId) -> Filter {
        Filter::all()
            .eq(fields::DOC_ID, doc_id)
            .eq(fields::EPOCH, epoch)
            .eq(fields::BRANCH_ID, branch_id)
    }

    /// Clears the current latest flag, then inserts the chunk. The unique
    /// `(docId, epoch, branchId, serial)` index turns racing appends into a
    /// `DuplicateKey` for all but one writer; callers retry on that.
    pub fn append(&self, chunk: &ChronicleChunk) -> Result<()> {
        self.clear_latest(chunk.doc_id, chunk.epoch, chunk.branch_id)?;
        self.collection.insert_one(chunk.to_attrs())
    }

    pub fn clear_latest(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
        branch_id: BranchId,
    ) -> Result<()> {
        self.collection.update_many(
            &Self::group(doc_id, epoch, branch_id).eq(fields::IS_LATEST, true),
            &UpdateDoc::new().set(fields::IS_LATEST, false),
        )?;
        Ok(())
    }

    /// Re-flags one chunk as latest after a revert truncated the lineage.
    pub fn mark_latest(&self, chunk_id: ChunkId) -> Result<()> {
        self.collection.update_one(
            &Filter::all().eq(fields::CHUNK_ID, chunk_id),
            &UpdateDoc::new().set(fields::IS_LATEST, true),
            false,
        )?;
        Ok(())
    }

    /// The latest chunk of the group. Sorted by serial descending so that a
    /// reader caught in the clear-then-insert window prefers the newer chunk.
    pub fn find_latest(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
        branch_id: BranchId,
    ) -> Result<Option<ChronicleChunk>> {
        self.collection
            .find_one(
                &Self::group(doc_id, epoch, branch_id).eq(fields::IS_LATEST, true),
                &FindOptions::new().sort(SortKey::desc(fields::SERIAL)),
            )?
            .map(|attrs| ChronicleChunk::from_attrs(&attrs))
            .transpose()
    }

    pub fn find_by_serial(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
        branch_id: BranchId,
        serial: Serial,
    ) -> Result<Option<ChronicleChunk>> {
        self.collection
            .find_one(
                &Self::group(doc_id, epoch, branch_id).eq(fields::SERIAL, serial),
                &FindOptions::new(),
            )?
            .map(|attrs| ChronicleChunk::from_attrs(&attrs))
            .transpose()
    }

    /// All chunks of the group under the bound, sorted by serial ascending.
    pub fn list_ordered(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
        branch_id: BranchId,
        bound: &ChunkBound,
    ) -> Result<Vec<ChronicleChunk>> {
        let mut filter = Self::group(doc_id, epoch, branch_id);
        match bound {
            ChunkBound::Latest => {}
            ChunkBound::Serial(serial) => filter = filter.lte(fields::SERIAL, *serial),
            ChunkBound::Time(at) => filter = filter.lte(fields::C_TIME, *at),
        }
        self.collection
            .find(&filter, &FindOptions::new().sort(SortKey::asc(fields::SERIAL)))?
            .iter()
            .map(ChronicleChunk::from_attrs)
            .collect()
    }

    /// The newest chunk of the group at or before `at`, if any.
    pub fn latest_at(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
        branch_id: BranchId,
        at: Timestamp,
    ) -> Result<Option<ChronicleChunk>> {
        self.collection
            .find_one(
                &Self::group(doc_id, epoch, branch_id).lte(fields::C_TIME, at),
                &FindOptions::new().sort(SortKey::desc(fields::SERIAL)),
            )?
            .map(|attrs| ChronicleChunk::from_attrs(&attrs))
            .transpose()
    }

    /// Removes every chunk of the group with a serial above `serial`.
    pub fn delete_after(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
        branch_id: BranchId,
        serial: Serial,
    ) -> Result<u64> {
        self.collection
            .delete_many(&Self::group(doc_id, epoch, branch_id).gt(fields::SERIAL, serial))
    }

    /// Cascade delete across every branch of the document, optionally scoped
    /// to one epoch.
    pub fn delete_all(&self, doc_id: DocumentId, epoch: Option<Epoch>) -> Result<u64> {
        let mut filter = Filter::all().eq(fields::DOC_ID, doc_id);
        if let Some(epoch) = epoch {
            filter = filter.eq(fields::EPOCH, epoch);
        }
        self.collection.delete_many(&filter)
    }

    pub fn count_for_doc(&self, doc_id: DocumentId) -> Result<u64> {
        self.collection
            .count(&Filter::all().eq(fields::DOC_ID, doc_id))
    }

    /// Latest-and-deleted chunks across all documents, newest first,
    /// optionally bounded in time.
    pub fn find_deleted(
        &self,
        after: Option<Timestamp>,
        before: Option<Timestamp>,
    ) -> Result<Vec<ChronicleChunk>> {
        let mut filter = Filter::all()
            .eq(fields::IS_LATEST, true)
            .eq(fields::IS_DELETED, true);
        if let Some(after) = after {
            filter = filter.gte(fields::C_TIME, after);
        }
        if let Some(before) = before {
            filter = filter.lte(fields::C_TIME, before);
        }
        self.collection
            .find(&filter, &FindOptions::new().sort(SortKey::desc(fields::C_TIME)))?
            .iter()
            .map(ChronicleChunk::from_attrs)
            .collect()
    }
}
