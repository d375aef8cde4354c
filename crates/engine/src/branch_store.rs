// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{
    ChronicleBranch, Collection, Filter, FindOptions, Result, SortKey, UpdateDoc, branch::fields,
};
use chronicle_type::{BranchId, DocumentId, Epoch, Serial};

/// Access to the branch records of a document (part of component C5).
/// Branches form a forest rooted at `main` per epoch; this store never walks
/// chunks.
pub(crate) struct BranchStore<'a, C: Collection> {
    collection: &'a C,
}

impl<'a, C: Collection> BranchStore<'a, C> {
    pub fn new(collection: &'a C) -> Self {
        Self { collection }
    }

    pub fn insert(&self, branch: &ChronicleBranch) -> Result<()> {
        self.collection.insert_one(branch.to_attrs())
    }

    pub fn find(
        &self,
        doc_id: DocumentId,
        branch_id: BranchId,
    ) -> Result<Option<ChronicleBranch>> {
        self.collection
            .find_one(
                &Filter::all()
                    .eq(fields::DOC_ID, doc_id)
                    .eq(fields::BRANCH_ID, branch_id),
                &FindOptions::new(),
            )?
            .map(|attrs| ChronicleBranch::from_attrs(&attrs))
            .transpose()
    }

    /// Every branch of the document across all epochs, oldest epoch first.
    pub fn list(&self, doc_id: DocumentId) -> Result<Vec<ChronicleBranch>> {
        self.collection
            .find(
                &Filter::all().eq(fields::DOC_ID, doc_id),
                &FindOptions::new()
                    .sort(SortKey::asc(fields::EPOCH))
                    .sort(SortKey::asc(fields::CREATED_AT)),
            )?
            .iter()
            .map(ChronicleBranch::from_attrs)
            .collect()
    }

    pub fn list_for_epoch(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
    ) -> Result<Vec<ChronicleBranch>> {
        self.collection
            .find(
                &Filter::all().eq(fields::DOC_ID, doc_id).eq(fields::EPOCH, epoch),
                &FindOptions::new().sort(SortKey::asc(fields::CREATED_AT)),
            )?
            .iter()
            .map(ChronicleBranch::from_attrs)
            .collect()
    }

    pub fn count_for_doc(&self, doc_id: DocumentId) -> Result<u64> {
        self.collection
            .count(&Filter::all().eq(fields::DOC_ID, doc_id))
    }

    /// Pulls children attached above `target` down to it, keeping their
    /// logical attachment point well-defined after a revert truncated the
    /// parent.
    pub fn reparent_children(
        &self,
        doc_id: DocumentId,
        parent: BranchId,
        target: Serial,
    ) -> Result<u64> {
        self.collection.update_many(
            &Filter::all()
                .eq(fields::DOC_ID, doc_id)
                .eq(fields::PARENT_BRANCH_ID, parent)
                .gt(fields::PARENT_SERIAL, target),
            &UpdateDoc::new().set(fields::PARENT_SERIAL, target),
        )
    }

    pub fn delete_doc(&self, doc_id: DocumentId, epoch: Option<Epoch>) -> Result<u64> {
        let mut filter = Filter::all().eq(fields::DOC_ID, doc_id);
        if let Some(epoch) = epoch {
            filter = filter.eq(fields::EPOCH, epoch);
        }
        self.collection.delete_many(&filter)
    }
}
