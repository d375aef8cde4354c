// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{
    ChronicleBranch, ChronicleChunk, ChronicleMetadata, ChunkType, Collection, Error, MAIN_BRANCH,
    MetadataStatus, Result,
};
use chronicle_type::{AttrMap, BranchId, ChunkId, DocumentId, Epoch, Serial, Timestamp};
use tracing::instrument;

use crate::chunk_store::ChunkBound;
use crate::engine::Chronicle;
use crate::rehydrate::rehydrate;

#[derive(Clone, Copy, Debug, Default)]
pub struct SquashOptions {
    /// Branch whose state at `target_serial` becomes the new base; defaults
    /// to the active one.
    pub branch_id: Option<BranchId>,
    pub confirm: bool,
    pub dry_run: bool,
}

#[derive(Clone, Debug)]
pub struct SquashDryRun {
    pub would_delete_chunks: u64,
    pub would_delete_branches: u64,
    pub new_base_state: AttrMap,
}

#[derive(Clone, Debug)]
pub struct SquashApplied {
    pub doc_id: DocumentId,
    /// The fresh `main` everything collapsed into.
    pub branch_id: BranchId,
    pub chunk_id: ChunkId,
    pub chunks_removed: u64,
    pub branches_removed: u64,
    pub state: AttrMap,
}

#[derive(Clone, Debug)]
pub enum SquashOutcome {
    DryRun(SquashDryRun),
    Applied(SquashApplied),
}

impl<C: Collection> Chronicle<C> {
    /// Collapses the entire history of a document, across all branches and
    /// epochs, into a single FULL chunk on a fresh `main` at epoch 1 carrying
    /// the state at `(branch, target_serial)`.
    #[instrument(name = "chronicle::squash", level = "debug", skip(self, options))]
    pub fn squash(
        &self,
        doc_id: DocumentId,
        target_serial: Serial,
        options: SquashOptions,
    ) -> Result<SquashOutcome> {
        if !options.confirm && !options.dry_run {
            return Err(Error::ConfirmationRequired {
                operation: "squash",
            });
        }

        let metadata = self.require_latest_metadata(doc_id)?;
        let branch = self.resolve_branch(&metadata, options.branch_id)?;
        let chunks = self.chunk_store();

        let target = chunks
            .find_by_serial(doc_id, branch.epoch, branch.branch_id, target_serial)?
            .ok_or(Error::SerialNotFound {
                doc_id,
                branch_id: branch.branch_id,
                serial: target_serial,
            })?;
        let rehydrated = rehydrate(
            &chunks,
            doc_id,
            branch.epoch,
            branch.branch_id,
            &ChunkBound::Serial(target_serial),
        )?
        .ok_or(Error::Corrupt {
            doc_id,
            branch_id: branch.branch_id,
            detail: "target serial exists but the scan came back empty".to_string(),
        })?;

        let total_chunks = chunks.count_for_doc(doc_id)?;
        let total_branches = self.branch_store().count_for_doc(doc_id)?;

        if options.dry_run {
            return Ok(SquashOutcome::DryRun(SquashDryRun {
                would_delete_chunks: total_chunks,
                would_delete_branches: total_branches.saturating_sub(1),
                new_base_state: rehydrated.state,
            }));
        }

        let chunks_removed = chunks.delete_all(doc_id, None)?;
        let branches_removed = self.branch_store().delete_doc(doc_id, None)?;
        self.key_index().delete_doc(doc_id)?;

        let now = Timestamp::now();
        let main = ChronicleBranch {
            branch_id: BranchId::generate(),
            doc_id,
            epoch: Epoch::FIRST,
            parent_branch_id: None,
            parent_serial: None,
            name: MAIN_BRANCH.to_string(),
            created_at: now,
        };
        self.branch_store().insert(&main)?;

        let chunk = ChronicleChunk {
            chunk_id: ChunkId::generate(),
            doc_id,
            epoch: Epoch::FIRST,
            branch_id: main.branch_id,
            serial: Serial::FIRST,
            chunk_type: ChunkType::Full,
            // squashing a deleted lineage keeps the document deleted
            is_deleted: target.is_deleted,
            is_latest: true,
            created_at: now,
            payload: rehydrated.state.clone(),
        };
        self.chunk_store().append(&chunk)?;
        self.key_index()
            .upsert(doc_id, &main, &rehydrated.state, target.is_deleted)?;

        self.metadata_store().delete_doc(doc_id, None)?;
        self.metadata_store().insert(&ChronicleMetadata {
            doc_id,
            epoch: Epoch::FIRST,
            active_branch_id: main.branch_id,
            status: MetadataStatus::Active,
            created_at: now,
            updated_at: now,
        })?;

        Ok(SquashOutcome::Applied(SquashApplied {
            doc_id,
            branch_id: main.branch_id,
            chunk_id: chunk.chunk_id,
            chunks_removed,
            branches_removed,
            state: rehydrated.state,
        }))
    }
}
