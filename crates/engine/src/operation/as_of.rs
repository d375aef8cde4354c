// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{Collection, Error, Result};
use chronicle_type::{AttrMap, BranchId, DocumentId, Serial, Timestamp};
use tracing::instrument;

use crate::chunk_store::ChunkBound;
use crate::engine::Chronicle;
use crate::rehydrate::{Rehydrated, rehydrate};

#[derive(Clone, Copy, Debug, Default)]
pub struct AsOfOptions {
    /// Read a specific branch instead of the active one. Mutually exclusive
    /// with `search_all_branches`.
    pub branch_id: Option<BranchId>,
    /// Pick the branch whose most recent chunk at the asked time is newest.
    pub search_all_branches: bool,
}

#[derive(Clone, Debug)]
pub struct AsOfResult {
    pub found: bool,
    pub state: Option<AttrMap>,
    pub serial: Option<Serial>,
    pub branch_id: Option<BranchId>,
    pub chunk_timestamp: Option<Timestamp>,
}

impl AsOfResult {
    fn not_found() -> Self {
        Self {
            found: false,
            state: None,
            serial: None,
            branch_id: None,
            chunk_timestamp: None,
        }
    }
}

impl From<Rehydrated> for AsOfResult {
    fn from(rehydrated: Rehydrated) -> Self {
        Self {
            found: true,
            state: Some(rehydrated.state),
            serial: Some(rehydrated.serial),
            branch_id: Some(rehydrated.branch_id),
            chunk_timestamp: Some(rehydrated.chunk_timestamp),
        }
    }
}

impl<C: Collection> Chronicle<C> {
    /// The document state as of `at`. A time before the first chunk yields
    /// `found: false`; a time in the future yields the current latest state.
    #[instrument(name = "chronicle::as_of", level = "debug", skip(self, options))]
    pub fn as_of(
        &self,
        doc_id: DocumentId,
        at: Timestamp,
        options: AsOfOptions,
    ) -> Result<AsOfResult> {
        if options.branch_id.is_some() && options.search_all_branches {
            return Err(Error::MutuallyExclusiveOptions {
                first: "branchId",
                second: "searchAllBranches",
            });
        }

        let metadata = self.require_latest_metadata(doc_id)?;
        let chunks = self.chunk_store();

        if options.search_all_branches {
            // the winning branch is the one whose newest chunk at `at` is the
            // most recent; ties break towards the higher branch id
            let mut best: Option<(Timestamp, BranchId, Serial)> = None;
            let mut best_branch = None;
            for branch in self.branch_store().list(doc_id)? {
                let Some(candidate) =
                    chunks.latest_at(doc_id, branch.epoch, branch.branch_id, at)?
                else {
                    continue;
                };
                let key = (candidate.created_at, candidate.branch_id, candidate.serial);
                if best.is_none_or(|current| key > current) {
                    best = Some(key);
                    best_branch = Some(branch);
                }
            }
            let Some(branch) = best_branch else {
                return Ok(AsOfResult::not_found());
            };
            return Ok(rehydrate(
                &chunks,
                doc_id,
                branch.epoch,
                branch.branch_id,
                &ChunkBound::Time(at),
            )?
            .map(AsOfResult::from)
            .unwrap_or_else(AsOfResult::not_found));
        }

        let branch = self.resolve_branch(&metadata, options.branch_id)?;
        Ok(rehydrate(
            &chunks,
            doc_id,
            branch.epoch,
            branch.branch_id,
            &ChunkBound::Time(at),
        )?
        .map(AsOfResult::from)
        .unwrap_or_else(AsOfResult::not_found))
    }
}
