// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

//! Primitive building blocks shared by every Chronicle crate: the attribute
//! value model, attribute maps, opaque sortable identifiers and wall-clock
//! timestamps.

mod attrs;
mod id;
mod timestamp;
mod value;

pub use attrs::AttrMap;
pub use id::{BranchId, ChunkId, DocumentId, Epoch, Serial};
pub use timestamp::Timestamp;
pub use value::{DATE_KEY, Value};
