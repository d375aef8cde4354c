// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

//! The chronicle operation engine: turns a conventional document store into
//! an append-only chronicle of every change per document, with branching,
//! point-in-time reads, revert/squash and recoverable soft deletion.
//!
//! The engine is generic over [`chronicle_core::Collection`]; see
//! `chronicle-store` for the in-memory reference backend.

mod branch_store;
mod chunk_store;
mod engine;
mod key_index;
mod metadata_store;
mod operation;
mod rehydrate;

pub use chronicle_core::{Error, Result};
pub use engine::{Chronicle, ChronicleOptions};
pub use operation::as_of::{AsOfOptions, AsOfResult};
pub use operation::branch::CreateBranchOptions;
pub use operation::history::{HistoryEntry, HistoryOptions};
pub use operation::list_deleted::{DeletedEntry, ListDeletedOptions};
pub use operation::purge::{PurgeOptions, PurgeResult};
pub use operation::revert::{RevertOptions, RevertResult};
pub use operation::save::SaveResult;
pub use operation::soft_delete::SoftDeleteResult;
pub use operation::squash::{SquashApplied, SquashDryRun, SquashOptions, SquashOutcome};
pub use operation::undelete::{UndeleteOptions, UndeleteResult};
