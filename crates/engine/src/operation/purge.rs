// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{Collection, Error, Result};
use chronicle_type::{DocumentId, Epoch};
use tracing::instrument;

use crate::engine::Chronicle;

#[derive(Clone, Copy, Debug, Default)]
pub struct PurgeOptions {
    pub confirm: bool,
    /// Restrict removal to one epoch; all epochs otherwise.
    pub epoch: Option<Epoch>,
}

#[derive(Clone, Copy, Debug)]
pub struct PurgeResult {
    pub doc_id: DocumentId,
    pub epochs_purged: u64,
    pub chunks_removed: u64,
    pub branches_removed: u64,
}

impl<C: Collection> Chronicle<C> {
    /// Removes every chronicle record of the document. After a full purge a
    /// save with the same id starts a fresh lineage at epoch 1.
    #[instrument(name = "chronicle::purge", level = "debug", skip(self, options))]
    pub fn purge(&self, doc_id: DocumentId, options: PurgeOptions) -> Result<PurgeResult> {
        if !options.confirm {
            return Err(Error::ConfirmationRequired { operation: "purge" });
        }

        let epochs_purged = match options.epoch {
            Some(epoch) => {
                self.metadata_store()
                    .find_at(doc_id, epoch)?
                    .ok_or(Error::NotFound { doc_id })?;
                1
            }
            None => {
                let count = self.metadata_store().count_for_doc(doc_id)?;
                if count == 0 {
                    return Err(Error::NotFound { doc_id });
                }
                count
            }
        };

        // key rows carry no epoch; scope their removal through the epoch's
        // branches when the purge is partial
        match options.epoch {
            None => {
                self.key_index().delete_doc(doc_id)?;
            }
            Some(epoch) => {
                let branch_ids: Vec<_> = self
                    .branch_store()
                    .list_for_epoch(doc_id, epoch)?
                    .into_iter()
                    .map(|branch| branch.branch_id)
                    .collect();
                self.key_index().delete_branches(doc_id, &branch_ids)?;
            }
        }

        let chunks_removed = self.chunk_store().delete_all(doc_id, options.epoch)?;
        let branches_removed = self.branch_store().delete_doc(doc_id, options.epoch)?;
        self.metadata_store().delete_doc(doc_id, options.epoch)?;

        Ok(PurgeResult {
            doc_id,
            epochs_purged,
            chunks_removed,
            branches_removed,
        })
    }
}
