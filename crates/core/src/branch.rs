// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_type::{AttrMap, BranchId, DocumentId, Epoch, Serial, Timestamp, Value};

use crate::{Result, codec};

/// Conventional name of the root branch of every epoch.
pub const MAIN_BRANCH: &str = "main";

/// Wire attribute names of a persisted branch record.
pub mod fields {
    pub const BRANCH_ID: &str = "branchId";
    pub const DOC_ID: &str = "docId";
    pub const EPOCH: &str = "epoch";
    pub const PARENT_BRANCH_ID: &str = "parentBranchId";
    pub const PARENT_SERIAL: &str = "parentSerial";
    pub const NAME: &str = "name";
    pub const CREATED_AT: &str = "createdAt";
}

/// A named timeline of a single document. Non-root branches record the point
/// on the parent they diverged from; the root of an epoch carries neither.
#[derive(Clone, Debug, PartialEq)]
pub struct ChronicleBranch {
    pub branch_id: BranchId,
    pub doc_id: DocumentId,
    pub epoch: Epoch,
    pub parent_branch_id: Option<BranchId>,
    pub parent_serial: Option<Serial>,
    pub name: String,
    pub created_at: Timestamp,
}

impl ChronicleBranch {
    pub fn is_root(&self) -> bool {
        self.parent_branch_id.is_none() && self.parent_serial.is_none()
    }

    pub fn to_attrs(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert(fields::BRANCH_ID, self.branch_id);
        attrs.insert(fields::DOC_ID, self.doc_id);
        attrs.insert(fields::EPOCH, self.epoch);
        attrs.insert(
            fields::PARENT_BRANCH_ID,
            self.parent_branch_id.map(Value::from).unwrap_or(Value::Undefined),
        );
        attrs.insert(
            fields::PARENT_SERIAL,
            self.parent_serial.map(Value::from).unwrap_or(Value::Undefined),
        );
        attrs.insert(fields::NAME, self.name.as_str());
        attrs.insert(fields::CREATED_AT, self.created_at);
        attrs
    }

    pub fn from_attrs(attrs: &AttrMap) -> Result<Self> {
        Ok(Self {
            branch_id: codec::parse(attrs, fields::BRANCH_ID)?,
            doc_id: codec::parse(attrs, fields::DOC_ID)?,
            epoch: Epoch(codec::unsigned(attrs, fields::EPOCH)? as u32),
            parent_branch_id: codec::parse_optional(attrs, fields::PARENT_BRANCH_ID)?,
            parent_serial: codec::optional_unsigned(attrs, fields::PARENT_SERIAL)?.map(Serial),
            name: codec::text(attrs, fields::NAME)?.to_string(),
            created_at: codec::instant(attrs, fields::CREATED_AT)?,
        })
    }
}
