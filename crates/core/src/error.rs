// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_type::{BranchId, DocumentId, Serial, Value};

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong inside the chronicle engine or the backing
/// collection layer.
///
/// Lifecycle errors (`AlreadyDeleted`, `NotDeleted`) and
/// `UniqueConstraintViolation` are recoverable for callers; `Corrupt` signals
/// a broken invariant in the stored chronicle and is logged with context
/// before it surfaces.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No metadata, chunks or branch exist at the given coordinates.
    #[error("document {doc_id} not found")]
    NotFound { doc_id: DocumentId },

    #[error("serial {serial} does not exist on branch {branch_id} of document {doc_id}")]
    SerialNotFound {
        doc_id: DocumentId,
        branch_id: BranchId,
        serial: Serial,
    },

    #[error("branch {branch_id} does not belong to document {doc_id}")]
    BranchNotFound {
        doc_id: DocumentId,
        branch_id: BranchId,
    },

    #[error("branch {branch_id} of document {doc_id} has no chunks")]
    NoChunks {
        doc_id: DocumentId,
        branch_id: BranchId,
    },

    #[error("document {doc_id} is already deleted")]
    AlreadyDeleted { doc_id: DocumentId },

    #[error("document {doc_id} is not deleted")]
    NotDeleted { doc_id: DocumentId },

    #[error("unique constraint violation on {field}: {value}")]
    UniqueConstraintViolation { field: String, value: Value },

    #[error("{operation} is destructive and requires confirmation")]
    ConfirmationRequired { operation: &'static str },

    #[error("options {first} and {second} are mutually exclusive")]
    MutuallyExclusiveOptions {
        first: &'static str,
        second: &'static str,
    },

    /// No FULL chunk is reachable under the requested bound; never expected
    /// in a well-formed store.
    #[error("chronicle of document {doc_id} is corrupt on branch {branch_id}: {detail}")]
    Corrupt {
        doc_id: DocumentId,
        branch_id: BranchId,
        detail: String,
    },

    /// Raised by the collection layer when a unique index rejects a write.
    /// The key index normalizes this into `UniqueConstraintViolation` at the
    /// engine boundary.
    #[error("duplicate key in index {index}: {value}")]
    DuplicateKey { index: String, value: Value },

    #[error("invalid configuration: {detail}")]
    InvalidConfiguration { detail: String },

    #[error("failed to decode stored record attribute {field}: {detail}")]
    Decode { field: String, detail: String },

    #[error("backing store is not available: {detail}")]
    NotConnected { detail: String },

    #[error("store error: {detail}")]
    Store { detail: String },
}

impl Error {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Error::DuplicateKey { .. })
    }
}
