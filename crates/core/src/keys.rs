// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use std::collections::BTreeMap;

use chronicle_type::{AttrMap, BranchId, DocumentId, Value};

use crate::{Result, codec};

/// Prefix under which declared unique fields are persisted in a key row,
/// e.g. the `email` field becomes the `key_email` attribute.
pub const KEY_FIELD_PREFIX: &str = "key_";

/// Wire attribute names of a persisted key row.
pub mod fields {
    pub const DOC_ID: &str = "docId";
    pub const BRANCH_ID: &str = "branchId";
    pub const BRANCH: &str = "branch";
    pub const IS_DELETED: &str = "isDeleted";
}

/// The persisted attribute name for one declared unique field.
pub fn key_field(field: &str) -> String {
    format!("{KEY_FIELD_PREFIX}{field}")
}

/// One row per `(docId, branchId)` carrying the live values of the declared
/// unique fields. Uniqueness is scoped by the branch *name* (`branch`):
/// branch ids are allocated per document, so the name is the only coordinate
/// comparable across documents.
#[derive(Clone, Debug, PartialEq)]
pub struct ChronicleKeyRow {
    pub doc_id: DocumentId,
    pub branch_id: BranchId,
    pub branch: String,
    pub is_deleted: bool,
    /// Current value per declared unique field, unprefixed. Absent fields
    /// are stored as explicit nulls (sparse uniqueness).
    pub keys: BTreeMap<String, Value>,
}

impl ChronicleKeyRow {
    pub fn to_attrs(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert(fields::DOC_ID, self.doc_id);
        attrs.insert(fields::BRANCH_ID, self.branch_id);
        attrs.insert(fields::BRANCH, self.branch.as_str());
        attrs.insert(fields::IS_DELETED, self.is_deleted);
        for (field, value) in &self.keys {
            attrs.insert(key_field(field), value.clone());
        }
        attrs
    }

    pub fn from_attrs(attrs: &AttrMap) -> Result<Self> {
        let mut keys = BTreeMap::new();
        for (name, value) in attrs.iter() {
            if let Some(field) = name.strip_prefix(KEY_FIELD_PREFIX) {
                keys.insert(field.to_string(), value.clone());
            }
        }
        Ok(Self {
            doc_id: codec::parse(attrs, fields::DOC_ID)?,
            branch_id: codec::parse(attrs, fields::BRANCH_ID)?,
            branch: codec::text(attrs, fields::BRANCH)?.to_string(),
            is_deleted: codec::boolean(attrs, fields::IS_DELETED)?,
            keys,
        })
    }
}
