// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

//! The public operations, one per file; each composes the chunk store, the
//! rehydrator, the key index and the branch manager.

pub(crate) mod as_of;
pub(crate) mod branch;
pub(crate) mod history;
pub(crate) mod list_deleted;
pub(crate) mod purge;
pub(crate) mod revert;
pub(crate) mod save;
pub(crate) mod soft_delete;
pub(crate) mod squash;
pub(crate) mod undelete;
