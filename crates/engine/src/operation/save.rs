// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{
    ChronicleBranch, ChronicleChunk, ChronicleMetadata, ChunkType, Collection, Error, MAIN_BRANCH,
    MetadataStatus, Result, compute_delta, strip_reserved,
};
use chronicle_type::{AttrMap, BranchId, ChunkId, DocumentId, Epoch, Serial, Timestamp};
use tracing::{debug, instrument, warn};

use crate::chunk_store::ChunkBound;
use crate::engine::Chronicle;
use crate::rehydrate::rehydrate;

/// How often a save retries after losing the conditional-append race on the
/// `(docId, epoch, branchId, serial)` unique index.
const MAX_APPEND_ATTEMPTS: usize = 3;

#[derive(Clone, Debug)]
pub struct SaveResult {
    pub doc_id: DocumentId,
    pub epoch: Epoch,
    pub branch_id: BranchId,
    pub serial: Serial,
    /// `None` when the payload matched the previous state and no chunk was
    /// appended.
    pub chunk_id: Option<ChunkId>,
}

impl<C: Collection> Chronicle<C> {
    /// Chronicles one version of the document, creating the lineage on first
    /// contact. Serves both create and update; an unchanged payload is a
    /// no-op.
    #[instrument(name = "chronicle::save", level = "debug", skip(self, payload))]
    pub fn save(&self, doc_id: DocumentId, payload: AttrMap) -> Result<SaveResult> {
        let payload = strip_reserved(&payload);
        let mut attempt = 1;
        loop {
            match self.try_save(doc_id, &payload) {
                Err(err) if err.is_duplicate_key() && attempt < MAX_APPEND_ATTEMPTS => {
                    debug!(%doc_id, attempt, "lost append race, re-reading latest chunk");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    fn try_save(&self, doc_id: DocumentId, payload: &AttrMap) -> Result<SaveResult> {
        let chunks = self.chunk_store();

        // resolve (metadata, branch, previous state, current serial)
        let (metadata, branch, previous, current_serial) =
            match self.metadata_store().find_latest(doc_id)? {
                None => {
                    let (metadata, branch) = self.begin_epoch(doc_id, Epoch::FIRST)?;
                    (metadata, branch, None, Serial::ZERO)
                }
                Some(metadata) => {
                    let branch = self.active_branch_of(&metadata)?;
                    match chunks.find_latest(doc_id, metadata.epoch, branch.branch_id)? {
                        None => {
                            // an interrupted create left a pending row behind;
                            // resume it instead of starting another epoch
                            warn!(%doc_id, epoch = %metadata.epoch, "resuming chunkless pending lineage");
                            (metadata, branch, None, Serial::ZERO)
                        }
                        Some(latest) if latest.is_deleted => {
                            // reuse of a deleted identity: the next incarnation
                            // starts with a fresh main, leaving the prior
                            // chronicle untouched
                            let (metadata, branch) =
                                self.begin_epoch(doc_id, metadata.epoch.next())?;
                            (metadata, branch, None, Serial::ZERO)
                        }
                        Some(latest) => {
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
                                detail: "latest chunk exists but the scan came back empty"
                                    .to_string(),
                            })?;
                            (metadata, branch, Some(rehydrated.state), latest.serial)
                        }
                    }
                }
            };

        let exclude = (current_serial != Serial::ZERO).then_some(doc_id);
        self.key_index().validate(payload, &branch.name, exclude)?;

        let next_serial = current_serial.next();
        let full_due = current_serial == Serial::ZERO
            || next_serial.0 % self.config.full_chunk_interval == 0;

        let (chunk_type, chunk_payload) = if full_due {
            (ChunkType::Full, payload.clone())
        } else {
            let empty = AttrMap::new();
            let delta = compute_delta(previous.as_ref().unwrap_or(&empty), payload);
            if delta.is_empty() {
                debug!(%doc_id, serial = %current_serial, "payload unchanged, skipping append");
                return Ok(SaveResult {
                    doc_id,
                    epoch: metadata.epoch,
                    branch_id: branch.branch_id,
                    serial: current_serial,
                    chunk_id: None,
                });
            }
            (ChunkType::Delta, delta)
        };

        let chunk = ChronicleChunk {
            chunk_id: ChunkId::generate(),
            doc_id,
            epoch: metadata.epoch,
            branch_id: branch.branch_id,
            serial: next_serial,
            chunk_type,
            is_deleted: false,
            is_latest: true,
            created_at: Timestamp::now(),
            payload: chunk_payload,
        };
        chunks.append(&chunk)?;
        self.key_index().upsert(doc_id, &branch, payload, false)?;
        self.metadata_store()
            .set_status(doc_id, metadata.epoch, MetadataStatus::Active)?;

        Ok(SaveResult {
            doc_id,
            epoch: metadata.epoch,
            branch_id: branch.branch_id,
            serial: next_serial,
            chunk_id: Some(chunk.chunk_id),
        })
    }

    /// Inserts the pending metadata row and the `main` branch of a fresh
    /// epoch. Metadata goes first so an interruption leaves an identifiable
    /// pending row rather than an unreachable branch.
    fn begin_epoch(
        &self,
        doc_id: DocumentId,
        epoch: Epoch,
    ) -> Result<(ChronicleMetadata, ChronicleBranch)> {
        let now = Timestamp::now();
        let branch = ChronicleBranch {
            branch_id: BranchId::generate(),
            doc_id,
            epoch,
            parent_branch_id: None,
            parent_serial: None,
            name: MAIN_BRANCH.to_string(),
            created_at: now,
        };
        let metadata = ChronicleMetadata {
            doc_id,
            epoch,
            active_branch_id: branch.branch_id,
            status: MetadataStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.metadata_store().insert(&metadata)?;
        self.branch_store().insert(&branch)?;
        Ok((metadata, branch))
    }
}
