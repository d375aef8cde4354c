// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{ChronicleChunk, ChunkType, Collection, Error, Result};
use chronicle_type::{AttrMap, BranchId, ChunkId, DocumentId, Epoch, Timestamp};
use tracing::instrument;

use crate::engine::Chronicle;

#[derive(Clone, Copy, Debug, Default)]
pub struct UndeleteOptions {
    /// Target incarnation; defaults to the highest epoch.
    pub epoch: Option<Epoch>,
    /// Target branch; defaults to the active one.
    pub branch_id: Option<BranchId>,
}

#[derive(Clone, Debug)]
pub struct UndeleteResult {
    pub doc_id: DocumentId,
    pub epoch: Epoch,
    pub branch_id: BranchId,
    pub restored_state: AttrMap,
}

impl<C: Collection> Chronicle<C> {
    /// Brings a soft-deleted document back by re-appending its pre-deletion
    /// snapshot. Fails if a live document on the same branch has taken one of
    /// the freed unique values in the meantime.
    #[instrument(name = "chronicle::undelete", level = "debug", skip(self, options))]
    pub fn undelete(
        &self,
        doc_id: DocumentId,
        options: UndeleteOptions,
    ) -> Result<UndeleteResult> {
        let metadata = match options.epoch {
            Some(epoch) => self
                .metadata_store()
                .find_at(doc_id, epoch)?
                .ok_or(Error::NotFound { doc_id })?,
            None => self.require_latest_metadata(doc_id)?,
        };
        let branch = match options.branch_id {
            Some(branch_id) => {
                let branch = self
                    .branch_store()
                    .find(doc_id, branch_id)?
                    .ok_or(Error::BranchNotFound { doc_id, branch_id })?;
                if branch.epoch != metadata.epoch {
                    return Err(Error::BranchNotFound { doc_id, branch_id });
                }
                branch
            }
            None => self.active_branch_of(&metadata)?,
        };

        let chunks = self.chunk_store();
        let latest = chunks
            .find_latest(doc_id, metadata.epoch, branch.branch_id)?
            .ok_or(Error::NotFound { doc_id })?;
        if !latest.is_deleted {
            return Err(Error::NotDeleted { doc_id });
        }

        // the deletion chunk is a FULL by construction of soft_delete
        let restored = latest.payload.clone();
        self.key_index()
            .validate(&restored, &branch.name, Some(doc_id))?;

        let chunk = ChronicleChunk {
            chunk_id: ChunkId::generate(),
            doc_id,
            epoch: metadata.epoch,
            branch_id: branch.branch_id,
            serial: latest.serial.next(),
            chunk_type: ChunkType::Full,
            is_deleted: false,
            is_latest: true,
            created_at: Timestamp::now(),
            payload: restored.clone(),
        };
        chunks.append(&chunk)?;
        self.key_index().clear_deleted(doc_id, &branch, &restored)?;

        Ok(UndeleteResult {
            doc_id,
            epoch: metadata.epoch,
            branch_id: branch.branch_id,
            restored_state: restored,
        })
    }
}
