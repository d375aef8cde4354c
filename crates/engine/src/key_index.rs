// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{
    ChronicleBranch, Collection, Error, Filter, Result, UpdateDoc,
    keys::{fields, key_field},
};
use chronicle_type::{AttrMap, BranchId, DocumentId, Value};
use tracing::debug;

/// Name of the partial unique index enforcing one live holder per branch for
/// one declared unique field.
pub(crate) fn unique_index_name(field: &str) -> String {
    format!("key_{field}_branch_unique")
}

/// History-aware uniqueness enforcement (component C4): one key row per
/// `(docId, branchId)`, scoped for uniqueness by branch name, released by
/// soft delete.
pub(crate) struct KeyIndex<'a, C: Collection> {
    collection: &'a C,
    unique_fields: &'a [String],
}

impl<'a, C: Collection> KeyIndex<'a, C> {
    pub fn new(collection: &'a C, unique_fields: &'a [String]) -> Self {
        Self {
            collection,
            unique_fields,
        }
    }

    /// Pre-checks a prospective payload against the live key rows of the
    /// branch. Advisory: the partial unique index is the authoritative
    /// enforcement, this exists to yield clean errors cheaply.
    pub fn validate(
        &self,
        payload: &AttrMap,
        branch_name: &str,
        exclude: Option<DocumentId>,
    ) -> Result<()> {
        for field in self.unique_fields {
            let Some(value) = payload.get(field) else {
                continue;
            };
            if value.is_undefined() {
                continue;
            }
            let mut filter = Filter::all()
                .eq(key_field(field), value.clone())
                .eq(fields::BRANCH, branch_name)
                .eq(fields::IS_DELETED, false);
            if let Some(doc_id) = exclude {
                filter = filter.ne(fields::DOC_ID, doc_id);
            }
            if self.collection.count(&filter)? > 0 {
                debug!(field, %value, branch = branch_name, "unique pre-check failed");
                return Err(Error::UniqueConstraintViolation {
                    field: field.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }

    /// Writes the key row for `(docId, branchId)` from the given payload.
    /// Store-level duplicate keys are normalized to
    /// `UniqueConstraintViolation` here.
    pub fn upsert(
        &self,
        doc_id: DocumentId,
        branch: &ChronicleBranch,
        payload: &AttrMap,
        is_deleted: bool,
    ) -> Result<()> {
        let mut update = UpdateDoc::new()
            .set(fields::BRANCH, branch.name.as_str())
            .set(fields::IS_DELETED, is_deleted);
        for field in self.unique_fields {
            update = update.set(
                key_field(field),
                payload.get(field).cloned().unwrap_or(Value::Undefined),
            );
        }
        self.collection
            .update_one(
                &Filter::all()
                    .eq(fields::DOC_ID, doc_id)
                    .eq(fields::BRANCH_ID, branch.branch_id),
                &update,
                true,
            )
            .map(drop)
            .map_err(|err| self.normalize(err))
    }

    /// Releases the branch's unique slots without touching the stored values.
    pub fn mark_deleted(&self, doc_id: DocumentId, branch_id: BranchId) -> Result<()> {
        self.collection.update_one(
            &Filter::all()
                .eq(fields::DOC_ID, doc_id)
                .eq(fields::BRANCH_ID, branch_id),
            &UpdateDoc::new().set(fields::IS_DELETED, true),
            false,
        )?;
        Ok(())
    }

    /// Re-occupies the slots after an undelete, refreshing the key values.
    pub fn clear_deleted(
        &self,
        doc_id: DocumentId,
        branch: &ChronicleBranch,
        payload: &AttrMap,
    ) -> Result<()> {
        self.upsert(doc_id, branch, payload, false)
    }

    pub fn delete_doc(&self, doc_id: DocumentId) -> Result<u64> {
        self.collection
            .delete_many(&Filter::all().eq(fields::DOC_ID, doc_id))
    }

    pub fn delete_branches(&self, doc_id: DocumentId, branch_ids: &[BranchId]) -> Result<u64> {
        let mut removed = 0;
        for branch_id in branch_ids {
            removed += self.collection.delete_many(
                &Filter::all()
                    .eq(fields::DOC_ID, doc_id)
                    .eq(fields::BRANCH_ID, *branch_id),
            )?;
        }
        Ok(removed)
    }

    /// Maps a duplicate-key failure from one of the per-field partial unique
    /// indexes back to the field it guards.
    fn normalize(&self, err: Error) -> Error {
        if let Error::DuplicateKey { index, value } = &err {
            for field in self.unique_fields {
                if *index == unique_index_name(field) {
                    return Error::UniqueConstraintViolation {
                        field: field.clone(),
                        value: value.clone(),
                    };
                }
            }
        }
        err
    }
}
