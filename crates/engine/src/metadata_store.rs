// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{
    ChronicleMetadata, Collection, Filter, FindOptions, MetadataStatus, Result, SortKey, UpdateDoc,
    metadata::fields,
};
use chronicle_type::{BranchId, DocumentId, Epoch, Timestamp};

/// Access to the per-`(docId, epoch)` metadata rows (part of component C5).
pub(crate) struct MetadataStore<'a, C: Collection> {
    collection: &'a C,
}

impl<'a, C: Collection> MetadataStore<'a, C> {
    pub fn new(collection: &'a C) -> Self {
        Self { collection }
    }

    pub fn insert(&self, metadata: &ChronicleMetadata) -> Result<()> {
        self.collection.insert_one(metadata.to_attrs())
    }

    /// The metadata row of the highest epoch, i.e. the current incarnation.
    pub fn find_latest(&self, doc_id: DocumentId) -> Result<Option<ChronicleMetadata>> {
        self.collection
            .find_one(
                &Filter::all().eq(fields::DOC_ID, doc_id),
                &FindOptions::new().sort(SortKey::desc(fields::EPOCH)),
            )?
            .map(|attrs| ChronicleMetadata::from_attrs(&attrs))
            .transpose()
    }

    pub fn find_at(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
    ) -> Result<Option<ChronicleMetadata>> {
        self.collection
            .find_one(
                &Filter::all().eq(fields::DOC_ID, doc_id).eq(fields::EPOCH, epoch),
                &FindOptions::new(),
            )?
            .map(|attrs| ChronicleMetadata::from_attrs(&attrs))
            .transpose()
    }

    pub fn set_active_branch(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
        branch_id: BranchId,
    ) -> Result<()> {
        self.collection.update_one(
            &Filter::all().eq(fields::DOC_ID, doc_id).eq(fields::EPOCH, epoch),
            &UpdateDoc::new()
                .set(fields::ACTIVE_BRANCH_ID, branch_id)
                .set(fields::UPDATED_AT, Timestamp::now()),
            false,
        )?;
        Ok(())
    }

    pub fn set_status(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
        status: MetadataStatus,
    ) -> Result<()> {
        self.collection.update_one(
            &Filter::all().eq(fields::DOC_ID, doc_id).eq(fields::EPOCH, epoch),
            &UpdateDoc::new()
                .set(fields::STATUS, status.as_wire())
                .set(fields::UPDATED_AT, Timestamp::now()),
            false,
        )?;
        Ok(())
    }

    pub fn count_for_doc(&self, doc_id: DocumentId) -> Result<u64> {
        self.collection
            .count(&Filter::all().eq(fields::DOC_ID, doc_id))
    }

    pub fn delete_doc(&self, doc_id: DocumentId, epoch: Option<Epoch>) -> Result<u64> {
        let mut filter = Filter::all().eq(fields::DOC_ID, doc_id);
        if let Some(epoch) = epoch {
            filter = filter.eq(fields::EPOCH, epoch);
        }
        self.collection.delete_many(&filter)
    }
}
