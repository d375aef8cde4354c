// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_type::{AttrMap, BranchId, ChunkId, DocumentId, Epoch, Serial, Timestamp, Value};

use crate::{Error, Result, codec};

/// Wire attribute names of a persisted chunk.
pub mod fields {
    pub const CHUNK_ID: &str = "chunkId";
    pub const DOC_ID: &str = "docId";
    pub const EPOCH: &str = "epoch";
    pub const BRANCH_ID: &str = "branchId";
    pub const SERIAL: &str = "serial";
    pub const CC_TYPE: &str = "ccType";
    pub const IS_DELETED: &str = "isDeleted";
    pub const IS_LATEST: &str = "isLatest";
    pub const C_TIME: &str = "cTime";
    pub const PAYLOAD: &str = "payload";
}

/// Whether a chunk carries a complete state or a forward patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkType {
    /// Payload is the complete state at this point.
    Full,
    /// Payload maps changed keys to new values and removed keys to the
    /// tombstone.
    Delta,
}

impl ChunkType {
    pub fn to_wire(self) -> i64 {
        match self {
            ChunkType::Full => 1,
            ChunkType::Delta => 2,
        }
    }

    pub fn from_wire(raw: i64) -> Result<Self> {
        match raw {
            1 => Ok(ChunkType::Full),
            2 => Ok(ChunkType::Delta),
            other => Err(Error::Decode {
                field: fields::CC_TYPE.to_string(),
                detail: format!("unknown chunk type {other}"),
            }),
        }
    }
}

/// One immutable record of the append-only chronicle: either a full snapshot
/// or a forward delta of a document on one `(docId, epoch, branchId)` lineage.
#[derive(Clone, Debug, PartialEq)]
pub struct ChronicleChunk {
    pub chunk_id: ChunkId,
    pub doc_id: DocumentId,
    pub epoch: Epoch,
    pub branch_id: BranchId,
    pub serial: Serial,
    pub chunk_type: ChunkType,
    pub is_deleted: bool,
    pub is_latest: bool,
    pub created_at: Timestamp,
    pub payload: AttrMap,
}

impl ChronicleChunk {
    pub fn to_attrs(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert(fields::CHUNK_ID, self.chunk_id);
        attrs.insert(fields::DOC_ID, self.doc_id);
        attrs.insert(fields::EPOCH, self.epoch);
        attrs.insert(fields::BRANCH_ID, self.branch_id);
        attrs.insert(fields::SERIAL, self.serial);
        attrs.insert(fields::CC_TYPE, self.chunk_type.to_wire());
        attrs.insert(fields::IS_DELETED, self.is_deleted);
        attrs.insert(fields::IS_LATEST, self.is_latest);
        attrs.insert(fields::C_TIME, self.created_at);
        attrs.insert(fields::PAYLOAD, Value::Map(self.payload.clone()));
        attrs
    }

    pub fn from_attrs(attrs: &AttrMap) -> Result<Self> {
        Ok(Self {
            chunk_id: codec::parse(attrs, fields::CHUNK_ID)?,
            doc_id: codec::parse(attrs, fields::DOC_ID)?,
            epoch: Epoch(codec::unsigned(attrs, fields::EPOCH)? as u32),
            branch_id: codec::parse(attrs, fields::BRANCH_ID)?,
            serial: Serial(codec::unsigned(attrs, fields::SERIAL)?),
            chunk_type: ChunkType::from_wire(codec::int(attrs, fields::CC_TYPE)?)?,
            is_deleted: codec::boolean(attrs, fields::IS_DELETED)?,
            is_latest: codec::boolean(attrs, fields::IS_LATEST)?,
            created_at: codec::instant(attrs, fields::C_TIME)?,
            payload: codec::map(attrs, fields::PAYLOAD)?,
        })
    }
}
