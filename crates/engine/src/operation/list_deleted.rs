// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{Collection, Result};
use chronicle_type::{AttrMap, BranchId, DocumentId, Epoch, Timestamp};
use tracing::instrument;

use crate::engine::Chronicle;

#[derive(Clone, Copy, Debug, Default)]
pub struct ListDeletedOptions {
    pub deleted_after: Option<Timestamp>,
    pub deleted_before: Option<Timestamp>,
}

#[derive(Clone, Debug)]
pub struct DeletedEntry {
    pub doc_id: DocumentId,
    pub epoch: Epoch,
    pub branch_id: BranchId,
    pub deleted_at: Timestamp,
    /// The pre-deletion snapshot the deletion chunk carries.
    pub final_state: AttrMap,
}

impl<C: Collection> Chronicle<C> {
    /// Every document whose latest chunk is a deletion chunk, newest
    /// deletions first.
    #[instrument(name = "chronicle::list_deleted", level = "debug", skip(self, options))]
    pub fn list_deleted(&self, options: ListDeletedOptions) -> Result<Vec<DeletedEntry>> {
        let chunks = self
            .chunk_store()
            .find_deleted(options.deleted_after, options.deleted_before)?;
        Ok(chunks
            .into_iter()
            .map(|chunk| DeletedEntry {
                doc_id: chunk.doc_id,
                epoch: chunk.epoch,
                branch_id: chunk.branch_id,
                deleted_at: chunk.created_at,
                final_state: chunk.payload,
            })
            .collect())
    }
}
