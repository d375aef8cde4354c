// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{ChunkType, Collection, Error, Result, apply_delta};
use chronicle_type::{AttrMap, BranchId, DocumentId, Epoch, Serial, Timestamp};
use tracing::error;

use crate::chunk_store::{ChunkBound, ChunkStore};

/// A document state reconstructed at some coordinate of one branch.
#[derive(Clone, Debug)]
pub(crate) struct Rehydrated {
    pub state: AttrMap,
    pub serial: Serial,
    pub branch_id: BranchId,
    pub chunk_timestamp: Timestamp,
    /// Whether the chunk the scan ended on is a deletion chunk.
    pub is_deleted: bool,
}

/// Reconstructs the document state at the bound by folding deltas onto the
/// most recent FULL chunk at-or-before it (component C3).
///
/// `Ok(None)` means no chunks exist under the bound. A non-empty scan without
/// a FULL chunk violates the chronicle invariants and surfaces as `Corrupt`.
pub(crate) fn rehydrate<C: Collection>(
    chunks: &ChunkStore<'_, C>,
    doc_id: DocumentId,
    epoch: Epoch,
    branch_id: BranchId,
    bound: &ChunkBound,
) -> Result<Option<Rehydrated>> {
    let scan = chunks.list_ordered(doc_id, epoch, branch_id, bound)?;
    if scan.is_empty() {
        return Ok(None);
    }

    let full_idx = scan
        .iter()
        .rposition(|chunk| chunk.chunk_type == ChunkType::Full)
        .ok_or_else(|| {
            error!(%doc_id, %branch_id, ?bound, "no FULL chunk reachable under bound");
            Error::Corrupt {
                doc_id,
                branch_id,
                detail: format!("no FULL chunk among {} scanned chunks", scan.len()),
            }
        })?;

    let mut state = scan[full_idx].payload.clone();
    for chunk in &scan[full_idx + 1..] {
        state = apply_delta(&state, &chunk.payload);
    }
    // folding never leaves tombstones behind, but a FULL payload written by
    // an older version might carry explicit nulls; normalize either way
    state.retain(|_, value| !value.is_undefined());

    let last = &scan[scan.len() - 1];
    Ok(Some(Rehydrated {
        state,
        serial: last.serial,
        branch_id,
        chunk_timestamp: last.created_at,
        is_deleted: last.is_deleted,
    }))
}
