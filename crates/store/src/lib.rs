// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

//! In-memory document collections implementing the chronicle collection
//! interface, including partial unique indexes. The reference backend for
//! tests and for hosts without a real document database.

mod memory;

pub use memory::{MemoryCollection, MemoryStore};
