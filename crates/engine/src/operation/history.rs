// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{ChunkType, Collection, Error, Result, compute_delta};
use chronicle_type::{AttrMap, BranchId, ChunkId, DocumentId, Serial, Timestamp};
use tracing::instrument;

use crate::chunk_store::ChunkBound;
use crate::engine::Chronicle;
use crate::rehydrate::rehydrate;

#[derive(Clone, Copy, Debug, Default)]
pub struct HistoryOptions {
    /// Branch to audit; defaults to the active one.
    pub branch_id: Option<BranchId>,
    pub limit: Option<usize>,
}

/// One chunk descriptor in an audit trail; payloads stay behind on purpose,
/// `as_of` or `diff` reconstruct states when needed.
#[derive(Clone, Debug)]
pub struct HistoryEntry {
    pub chunk_id: ChunkId,
    pub serial: Serial,
    pub chunk_type: ChunkType,
    pub is_deleted: bool,
    pub created_at: Timestamp,
}

impl<C: Collection> Chronicle<C> {
    /// The chunk descriptors of one branch, newest first.
    #[instrument(name = "chronicle::history", level = "debug", skip(self, options))]
    pub fn history(
        &self,
        doc_id: DocumentId,
        options: HistoryOptions,
    ) -> Result<Vec<HistoryEntry>> {
        let metadata = self.require_latest_metadata(doc_id)?;
        let branch = self.resolve_branch(&metadata, options.branch_id)?;

        let mut entries: Vec<HistoryEntry> = self
            .chunk_store()
            .list_ordered(doc_id, branch.epoch, branch.branch_id, &ChunkBound::Latest)?
            .into_iter()
            .rev()
            .map(|chunk| HistoryEntry {
                chunk_id: chunk.chunk_id,
                serial: chunk.serial,
                chunk_type: chunk.chunk_type,
                is_deleted: chunk.is_deleted,
                created_at: chunk.created_at,
            })
            .collect();
        if let Some(limit) = options.limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }

    /// The field-level delta between the states at two serials of one
    /// branch: what changed between then and then.
    #[instrument(name = "chronicle::diff", level = "debug", skip(self))]
    pub fn diff(
        &self,
        doc_id: DocumentId,
        from_serial: Serial,
        to_serial: Serial,
        branch_id: Option<BranchId>,
    ) -> Result<AttrMap> {
        let metadata = self.require_latest_metadata(doc_id)?;
        let branch = self.resolve_branch(&metadata, branch_id)?;
        let chunks = self.chunk_store();

        let mut states = Vec::with_capacity(2);
        for serial in [from_serial, to_serial] {
            chunks
                .find_by_serial(doc_id, branch.epoch, branch.branch_id, serial)?
                .ok_or(Error::SerialNotFound {
                    doc_id,
                    branch_id: branch.branch_id,
                    serial,
                })?;
            let rehydrated = rehydrate(
                &chunks,
                doc_id,
                branch.epoch,
                branch.branch_id,
                &ChunkBound::Serial(serial),
            )?
            .ok_or(Error::Corrupt {
                doc_id,
                branch_id: branch.branch_id,
                detail: "serial exists but the scan came back empty".to_string(),
            })?;
            states.push(rehydrated.state);
        }

        Ok(compute_delta(&states[0], &states[1]))
    }
}
