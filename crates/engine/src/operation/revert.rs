// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{Collection, Error, Result};
use chronicle_type::{AttrMap, BranchId, DocumentId, Serial};
use tracing::instrument;

use crate::chunk_store::ChunkBound;
use crate::engine::Chronicle;
use crate::rehydrate::rehydrate;

#[derive(Clone, Copy, Debug, Default)]
pub struct RevertOptions {
    /// Branch to revert; defaults to the active one.
    pub branch_id: Option<BranchId>,
    /// Also return the reinstated state.
    pub rehydrate: bool,
}

#[derive(Clone, Debug)]
pub struct RevertResult {
    pub success: bool,
    pub reverted_to_serial: Serial,
    pub chunks_removed: u64,
    pub branches_updated: u64,
    pub state: Option<AttrMap>,
}

impl<C: Collection> Chronicle<C> {
    /// Deletes every chunk after `target_serial` on one branch and re-flags
    /// the target as latest. Children that diverged above the target are
    /// pulled down to it; their own chunks are untouched since every child
    /// starts with its own serial-1 FULL.
    #[instrument(name = "chronicle::revert", level = "debug", skip(self, options))]
    pub fn revert(
        &self,
        doc_id: DocumentId,
        target_serial: Serial,
        options: RevertOptions,
    ) -> Result<RevertResult> {
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
        let latest = chunks
            .find_latest(doc_id, branch.epoch, branch.branch_id)?
            .ok_or(Error::Corrupt {
                doc_id,
                branch_id: branch.branch_id,
                detail: "branch has chunks but none is flagged latest".to_string(),
            })?;

        if latest.serial == target_serial {
            let state = if options.rehydrate {
                rehydrate(
                    &chunks,
                    doc_id,
                    branch.epoch,
                    branch.branch_id,
                    &ChunkBound::Serial(target_serial),
                )?
                .map(|rehydrated| rehydrated.state)
            } else {
                None
            };
            return Ok(RevertResult {
                success: true,
                reverted_to_serial: target_serial,
                chunks_removed: 0,
                branches_updated: 0,
                state,
            });
        }

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

        // the key row tracks the latest live state; make sure the reinstated
        // values are still free before truncating anything
        if !rehydrated.is_deleted {
            self.key_index()
                .validate(&rehydrated.state, &branch.name, Some(doc_id))?;
        }

        let chunks_removed =
            chunks.delete_after(doc_id, branch.epoch, branch.branch_id, target_serial)?;
        chunks.mark_latest(target.chunk_id)?;
        let branches_updated =
            self.branch_store()
                .reparent_children(doc_id, branch.branch_id, target_serial)?;
        self.key_index()
            .upsert(doc_id, &branch, &rehydrated.state, rehydrated.is_deleted)?;

        Ok(RevertResult {
            success: true,
            reverted_to_serial: target_serial,
            chunks_removed,
            branches_updated,
            state: options.rehydrate.then_some(rehydrated.state),
        })
    }
}
