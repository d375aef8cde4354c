// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{ChronicleChunk, ChunkType, Collection, Error, Result};
use chronicle_type::{AttrMap, ChunkId, DocumentId, Timestamp};
use tracing::instrument;

use crate::chunk_store::ChunkBound;
use crate::engine::Chronicle;
use crate::rehydrate::rehydrate;

#[derive(Clone, Debug)]
pub struct SoftDeleteResult {
    pub chunk_id: ChunkId,
    /// The complete state right before the deletion; also carried by the
    /// deletion chunk itself so undelete and listing need no rehydration.
    pub final_state: AttrMap,
}

impl<C: Collection> Chronicle<C> {
    /// Appends a deletion chunk carrying the full pre-deletion snapshot and
    /// releases the document's unique-key slots on its active branch.
    #[instrument(name = "chronicle::soft_delete", level = "debug", skip(self))]
    pub fn soft_delete(&self, doc_id: DocumentId) -> Result<SoftDeleteResult> {
        let metadata = self.require_latest_metadata(doc_id)?;
        let branch = self.active_branch_of(&metadata)?;
        let chunks = self.chunk_store();

        let latest = chunks
            .find_latest(doc_id, metadata.epoch, branch.branch_id)?
            .ok_or(Error::NotFound { doc_id })?;
        if latest.is_deleted {
            return Err(Error::AlreadyDeleted { doc_id });
        }

        let rehydrated = rehydrate(
            &chunks,
            doc_id,
            metadata.epoch,
            branch.branch_id,
            &ChunkBound::Latest,
        )?
        .ok_or(Error::Corrupt {
            doc_id,
            branch_id: branch.branch_id,
            detail: "latest chunk exists but the scan came back empty".to_string(),
        })?;

        let chunk = ChronicleChunk {
            chunk_id: ChunkId::generate(),
            doc_id,
            epoch: metadata.epoch,
            branch_id: branch.branch_id,
            serial: latest.serial.next(),
            chunk_type: ChunkType::Full,
            is_deleted: true,
            is_latest: true,
            created_at: Timestamp::now(),
            payload: rehydrated.state.clone(),
        };
        chunks.append(&chunk)?;
        self.key_index().mark_deleted(doc_id, branch.branch_id)?;

        Ok(SoftDeleteResult {
            chunk_id: chunk.chunk_id,
            final_state: rehydrated.state,
        })
    }
}
