// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_type::{AttrMap, Value};

use crate::{Result, codec};

/// Name of the global collection holding one config row per chronicled
/// collection.
pub const CONFIG_COLLECTION: &str = "chronicle_config";

/// Every how many serials a FULL chunk is written when the caller does not
/// say otherwise.
pub const DEFAULT_FULL_CHUNK_INTERVAL: u64 = 10;

/// Wire attribute names of a persisted config row.
pub mod fields {
    pub const COLLECTION_NAME: &str = "collectionName";
    pub const FULL_CHUNK_INTERVAL: &str = "fullChunkInterval";
    pub const PLUGIN_VERSION: &str = "pluginVersion";
    pub const INDEXED_FIELDS: &str = "indexedFields";
    pub const UNIQUE_FIELDS: &str = "uniqueFields";
}

/// Per-collection chronicle configuration, persisted at initialize time so
/// interval and index declarations survive process restarts.
#[derive(Clone, Debug, PartialEq)]
pub struct ChronicleConfig {
    pub collection_name: String,
    pub full_chunk_interval: u64,
    pub plugin_version: String,
    pub indexed_fields: Vec<String>,
    pub unique_fields: Vec<String>,
}

impl ChronicleConfig {
    pub fn chunks_collection(&self) -> String {
        format!("{}_chronicle_chunks", self.collection_name)
    }

    pub fn metadata_collection(&self) -> String {
        format!("{}_chronicle_metadata", self.collection_name)
    }

    pub fn branches_collection(&self) -> String {
        format!("{}_chronicle_branches", self.collection_name)
    }

    pub fn keys_collection(&self) -> String {
        format!("{}_chronicle_keys", self.collection_name)
    }

    pub fn to_attrs(&self) -> AttrMap {
        let mut attrs = AttrMap::new();
        attrs.insert(fields::COLLECTION_NAME, self.collection_name.as_str());
        attrs.insert(fields::FULL_CHUNK_INTERVAL, self.full_chunk_interval as i64);
        attrs.insert(fields::PLUGIN_VERSION, self.plugin_version.as_str());
        attrs.insert(
            fields::INDEXED_FIELDS,
            Value::List(self.indexed_fields.iter().map(|f| Value::from(f.as_str())).collect()),
        );
        attrs.insert(
            fields::UNIQUE_FIELDS,
            Value::List(self.unique_fields.iter().map(|f| Value::from(f.as_str())).collect()),
        );
        attrs
    }

    pub fn from_attrs(attrs: &AttrMap) -> Result<Self> {
        Ok(Self {
            collection_name: codec::text(attrs, fields::COLLECTION_NAME)?.to_string(),
            full_chunk_interval: codec::unsigned(attrs, fields::FULL_CHUNK_INTERVAL)?,
            plugin_version: codec::text(attrs, fields::PLUGIN_VERSION)?.to_string(),
            indexed_fields: codec::text_list(attrs, fields::INDEXED_FIELDS)?,
            unique_fields: codec::text_list(attrs, fields::UNIQUE_FIELDS)?,
        })
    }
}

#[cfg(test)]
mod test {
    use crate::config::ChronicleConfig;

    #[test]
    fn test_collection_names() {
        let config = ChronicleConfig {
            collection_name: "users".to_string(),
            full_chunk_interval: 10,
            plugin_version: "0.1.0".to_string(),
            indexed_fields: vec![],
            unique_fields: vec![],
        };
        assert_eq!(config.chunks_collection(), "users_chronicle_chunks");
        assert_eq!(config.metadata_collection(), "users_chronicle_metadata");
        assert_eq!(config.branches_collection(), "users_chronicle_branches");
        assert_eq!(config.keys_collection(), "users_chronicle_keys");
    }

    #[test]
    fn test_attrs_round_trip() {
        let config = ChronicleConfig {
            collection_name: "users".to_string(),
            full_chunk_interval: 5,
            plugin_version: "0.1.0".to_string(),
            indexed_fields: vec!["status".to_string()],
            unique_fields: vec!["email".to_string(), "handle".to_string()],
        };
        let decoded = ChronicleConfig::from_attrs(&config.to_attrs()).unwrap();
        assert_eq!(decoded, config);
    }
}
