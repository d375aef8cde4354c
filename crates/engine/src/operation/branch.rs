// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{ChronicleBranch, ChronicleChunk, ChunkType, Collection, Error, Result};
use chronicle_type::{BranchId, ChunkId, DocumentId, Serial, Timestamp};
use tracing::{instrument, warn};

use crate::chunk_store::ChunkBound;
use crate::engine::Chronicle;
use crate::rehydrate::rehydrate;

#[derive(Clone, Copy, Debug, Default)]
pub struct CreateBranchOptions {
    /// Divergence point on the parent; defaults to the parent's latest
    /// serial.
    pub from_serial: Option<Serial>,
    /// Make the new branch the target of subsequent saves.
    pub activate: bool,
}

impl<C: Collection> Chronicle<C> {
    /// Forks the active branch at a serial: inserts the branch record and a
    /// serial-1 FULL chunk carrying the parent's state at that point.
    #[instrument(name = "chronicle::create_branch", level = "debug", skip(self, options))]
    pub fn create_branch(
        &self,
        doc_id: DocumentId,
        name: &str,
        options: CreateBranchOptions,
    ) -> Result<ChronicleBranch> {
        let metadata = self.require_latest_metadata(doc_id)?;
        let parent = self.active_branch_of(&metadata)?;
        let chunks = self.chunk_store();

        let latest = chunks
            .find_latest(doc_id, metadata.epoch, parent.branch_id)?
            .ok_or(Error::NoChunks {
                doc_id,
                branch_id: parent.branch_id,
            })?;
        let from_serial = match options.from_serial {
            Some(serial) => {
                chunks
                    .find_by_serial(doc_id, metadata.epoch, parent.branch_id, serial)?
                    .ok_or(Error::SerialNotFound {
                        doc_id,
                        branch_id: parent.branch_id,
                        serial,
                    })?;
                serial
            }
            None => latest.serial,
        };

        let rehydrated = rehydrate(
            &chunks,
            doc_id,
            metadata.epoch,
            parent.branch_id,
            &ChunkBound::Serial(from_serial),
        )?
        .ok_or(Error::Corrupt {
            doc_id,
            branch_id: parent.branch_id,
            detail: "divergence serial exists but the scan came back empty".to_string(),
        })?;

        if self
            .branch_store()
            .list_for_epoch(doc_id, metadata.epoch)?
            .iter()
            .any(|branch| branch.name == name)
        {
            // names are unique by convention only; the id is the identity
            warn!(%doc_id, name, "branch name already in use on this document");
        }

        let now = Timestamp::now();
        let branch = ChronicleBranch {
            branch_id: BranchId::generate(),
            doc_id,
            epoch: metadata.epoch,
            parent_branch_id: Some(parent.branch_id),
            parent_serial: Some(from_serial),
            name: name.to_string(),
            created_at: now,
        };
        self.branch_store().insert(&branch)?;

        let chunk = ChronicleChunk {
            chunk_id: ChunkId::generate(),
            doc_id,
            epoch: metadata.epoch,
            branch_id: branch.branch_id,
            serial: Serial::FIRST,
            chunk_type: ChunkType::Full,
            is_deleted: false,
            is_latest: true,
            created_at: now,
            payload: rehydrated.state.clone(),
        };
        chunks.append(&chunk)?;
        self.key_index()
            .upsert(doc_id, &branch, &rehydrated.state, false)?;

        if options.activate {
            self.metadata_store()
                .set_active_branch(doc_id, metadata.epoch, branch.branch_id)?;
        }
        Ok(branch)
    }

    /// Points subsequent saves at another branch of the current epoch. The
    /// host may resync its live mirror from the branch's latest state.
    #[instrument(name = "chronicle::switch_branch", level = "debug", skip(self))]
    pub fn switch_branch(&self, doc_id: DocumentId, branch_id: BranchId) -> Result<()> {
        let metadata = self.require_latest_metadata(doc_id)?;
        let branch = self
            .branch_store()
            .find(doc_id, branch_id)?
            .ok_or(Error::BranchNotFound { doc_id, branch_id })?;
        if branch.epoch != metadata.epoch {
            return Err(Error::BranchNotFound { doc_id, branch_id });
        }
        self.metadata_store()
            .set_active_branch(doc_id, metadata.epoch, branch_id)
    }

    /// Every branch of the document across all epochs.
    pub fn list_branches(&self, doc_id: DocumentId) -> Result<Vec<ChronicleBranch>> {
        self.branch_store().list(doc_id)
    }

    /// The branch currently receiving saves, or `None` for an unchronicled
    /// document.
    pub fn get_active_branch(&self, doc_id: DocumentId) -> Result<Option<ChronicleBranch>> {
        match self.metadata_store().find_latest(doc_id)? {
            None => Ok(None),
            Some(metadata) => self.active_branch_of(&metadata).map(Some),
        }
    }
}
