// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_type::{AttrMap, BranchId, DocumentId, Epoch, Timestamp};

use crate::{Error, Result, codec};

/// Wire attribute names of a persisted metadata record.
pub mod fields {
    pub const DOC_ID: &str = "docId";
    pub const EPOCH: &str = "epoch";
    pub const ACTIVE_BRANCH_ID: &str = "activeBranchId";
    pub const STATUS: &str = "metadataStatus";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Lifecycle state of one `(docId, epoch)` incarnation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetadataStatus {
    /// Metadata exists but the first chunk commit has not finished yet.
    Pending,
    Active,
    /// Left behind by an interrupted create; identifiable for cleanup.
    Orphaned,
}

impl MetadataStatus {
    pub fn as_wire(self) -> &'static str {
        match self {
            MetadataStatus::Pending => "pending",
            MetadataStatus::Active => "active",
            MetadataStatus::Orphaned => "orphaned",
        }
    }

    pub fn from_wire(raw: &str) -> Result<Self> {
        match raw {
            "pending" => Ok(MetadataStatus::Pending),
            "active" => Ok(MetadataStatus::Active),
            "orphaned" => Ok(MetadataStatus::Orphaned),
            other => Err(Error::Decode {
                field: fields::STATUS.to_string(),
                detail: format!("unknown metadata status {other:?}"),
            }),
        }
    }
}

/// One row per `(docId, epoch)`: which branch receives saves and how far the
/// incarnation has progressed.
#[derive(Clone, Debug, PartialEq)]
pub struct ChronicleMetadata {
    pub doc_id: DocumentId,
    pub epoch: Epoch,
    pub active_branch_id: BranchId,
    pub status: MetadataStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ChronicleMetadata {
    pub fn to_attrs(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert(fields::DOC_ID, self.doc_id);
        attrs.insert(fields::EPOCH, self.epoch);
        attrs.insert(fields::ACTIVE_BRANCH_ID, self.active_branch_id);
        attrs.insert(fields::STATUS, self.status.as_wire());
        attrs.insert(fields::CREATED_AT, self.created_at);
        attrs.insert(fields::UPDATED_AT, self.updated_at);
        attrs
    }

    pub fn from_attrs(attrs: &AttrMap) -> Result<Self> {
        Ok(Self {
            doc_id: codec::parse(attrs, fields::DOC_ID)?,
            epoch: Epoch(codec::unsigned(attrs, fields::EPOCH)? as u32),
            active_branch_id: codec::parse(attrs, fields::ACTIVE_BRANCH_ID)?,
            status: MetadataStatus::from_wire(codec::text(attrs, fields::STATUS)?)?,
            created_at: codec::instant(attrs, fields::CREATED_AT)?,
            updated_at: codec::instant(attrs, fields::UPDATED_AT)?,
        })
    }
}
