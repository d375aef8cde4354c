// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

use chronicle_core::{
    CONFIG_COLLECTION, ChronicleBranch, ChronicleConfig, ChronicleMetadata, Collection,
    DEFAULT_FULL_CHUNK_INTERVAL, DocumentStore, Error, Filter, FindOptions, IndexSpec, Result,
    SortKey, UpdateDoc, branch, chunk, config, keys, metadata,
};
use chronicle_type::{BranchId, DocumentId, Value};
use tracing::{error, instrument};

use crate::branch_store::BranchStore;
use crate::chunk_store::ChunkStore;
use crate::key_index::{KeyIndex, unique_index_name};
use crate::metadata_store::MetadataStore;

/// Configuration handed to [`Chronicle::initialize`]. Unset options fall back
/// to a previously persisted config row, then to defaults.
#[derive(Clone, Debug)]
pub struct ChronicleOptions {
    pub collection: String,
    pub full_chunk_interval: Option<u64>,
    pub indexed_fields: Vec<String>,
    pub unique_fields: Vec<String>,
}

impl ChronicleOptions {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            full_chunk_interval: None,
            indexed_fields: Vec::new(),
            unique_fields: Vec::new(),
        }
    }

    pub fn full_chunk_interval(mut self, interval: u64) -> Self {
        self.full_chunk_interval = Some(interval);
        self
    }

    pub fn indexed_field(mut self, field: impl Into<String>) -> Self {
        self.indexed_fields.push(field.into());
        self
    }

    pub fn unique_field(mut self, field: impl Into<String>) -> Self {
        self.unique_fields.push(field.into());
        self
    }
}

/// The operation engine for one chronicled collection. Holds the four
/// chronicle collections and the resolved configuration; all mutable state
/// lives in the backing store.
pub struct Chronicle<C: Collection> {
    pub(crate) config: ChronicleConfig,
    pub(crate) chunks: C,
    pub(crate) branches: C,
    pub(crate) metadata: C,
    pub(crate) keys: C,
}

impl<C: Collection> Chronicle<C> {
    /// Ensures the chronicle collections, their indexes and the persisted
    /// config row exist, and returns the engine.
    #[instrument(name = "chronicle::initialize", level = "debug", skip(store, options), fields(collection = %options.collection))]
    pub fn initialize<S>(store: &S, options: ChronicleOptions) -> Result<Self>
    where
        S: DocumentStore<Collection = C>,
    {
        if options.collection.is_empty() {
            return Err(Error::InvalidConfiguration {
                detail: "collection name must not be empty".to_string(),
            });
        }
        if options.full_chunk_interval == Some(0) {
            return Err(Error::InvalidConfiguration {
                detail: "fullChunkInterval must be at least 1".to_string(),
            });
        }

        let configs = store.collection(CONFIG_COLLECTION);
        configs.create_index(
            IndexSpec::new(
                "collectionName_unique",
                vec![SortKey::asc(config::fields::COLLECTION_NAME)],
            )
            .unique(),
        )?;

        let existing = configs
            .find_one(
                &Filter::all().eq(config::fields::COLLECTION_NAME, options.collection.as_str()),
                &FindOptions::new(),
            )?
            .map(|attrs| ChronicleConfig::from_attrs(&attrs))
            .transpose()?;

        let config = ChronicleConfig {
            collection_name: options.collection.clone(),
            full_chunk_interval: options
                .full_chunk_interval
                .or(existing.as_ref().map(|c| c.full_chunk_interval))
                .unwrap_or(DEFAULT_FULL_CHUNK_INTERVAL),
            plugin_version: env!("CARGO_PKG_VERSION").to_string(),
            indexed_fields: if options.indexed_fields.is_empty() {
                existing
                    .as_ref()
                    .map(|c| c.indexed_fields.clone())
                    .unwrap_or_default()
            } else {
                options.indexed_fields
            },
            unique_fields: if options.unique_fields.is_empty() {
                existing
                    .as_ref()
                    .map(|c| c.unique_fields.clone())
                    .unwrap_or_default()
            } else {
                options.unique_fields
            },
        };

        let mut update = UpdateDoc::new();
        for (field, value) in config.to_attrs() {
            update = update.set(field, value);
        }
        configs.update_one(
            &Filter::all().eq(config::fields::COLLECTION_NAME, config.collection_name.as_str()),
            &update,
            true,
        )?;

        let engine = Self {
            chunks: store.collection(&config.chunks_collection()),
            branches: store.collection(&config.branches_collection()),
            metadata: store.collection(&config.metadata_collection()),
            keys: store.collection(&config.keys_collection()),
            config,
        };
        engine.ensure_indexes()?;
        Ok(engine)
    }

    pub fn config(&self) -> &ChronicleConfig {
        &self.config
    }

    fn ensure_indexes(&self) -> Result<()> {
        // chunks: primary lookup, latest flag, time scans, deleted listing
        self.chunks.create_index(
            IndexSpec::new(
                "docId_epoch_branchId_serial_unique",
                vec![
                    SortKey::asc(chunk::fields::DOC_ID),
                    SortKey::asc(chunk::fields::EPOCH),
                    SortKey::asc(chunk::fields::BRANCH_ID),
                    SortKey::desc(chunk::fields::SERIAL),
                ],
            )
            .unique(),
        )?;
        self.chunks.create_index(
            IndexSpec::new(
                "latest_partial",
                vec![
                    SortKey::asc(chunk::fields::DOC_ID),
                    SortKey::asc(chunk::fields::EPOCH),
                    SortKey::asc(chunk::fields::BRANCH_ID),
                ],
            )
            .partial(Filter::all().eq(chunk::fields::IS_LATEST, true)),
        )?;
        self.chunks.create_index(IndexSpec::new(
            "branchId_cTime",
            vec![
                SortKey::asc(chunk::fields::BRANCH_ID),
                SortKey::desc(chunk::fields::C_TIME),
            ],
        ))?;
        self.chunks.create_index(
            IndexSpec::new("deleted_latest_partial", vec![SortKey::desc(chunk::fields::C_TIME)])
                .partial(
                    Filter::all()
                        .eq(chunk::fields::IS_LATEST, true)
                        .eq(chunk::fields::IS_DELETED, true),
                ),
        )?;
        for field in &self.config.indexed_fields {
            self.chunks.create_index(
                IndexSpec::new(
                    format!("payload_{field}_branchId_partial"),
                    vec![
                        SortKey::asc(format!("{}.{field}", chunk::fields::PAYLOAD)),
                        SortKey::asc(chunk::fields::BRANCH_ID),
                    ],
                )
                .partial(
                    Filter::all()
                        .eq(chunk::fields::IS_LATEST, true)
                        .eq(chunk::fields::IS_DELETED, false),
                ),
            )?;
        }

        // metadata: one row per (docId, epoch)
        self.metadata.create_index(
            IndexSpec::new(
                "docId_epoch_unique",
                vec![
                    SortKey::asc(metadata::fields::DOC_ID),
                    SortKey::desc(metadata::fields::EPOCH),
                ],
            )
            .unique(),
        )?;

        // branches: identity plus per-document listing
        self.branches.create_index(
            IndexSpec::new("branchId_unique", vec![SortKey::asc(branch::fields::BRANCH_ID)])
                .unique(),
        )?;
        self.branches.create_index(IndexSpec::new(
            "docId_epoch",
            vec![
                SortKey::asc(branch::fields::DOC_ID),
                SortKey::asc(branch::fields::EPOCH),
            ],
        ))?;

        // keys: one row per (docId, branchId), per-branch partial uniqueness
        self.keys.create_index(
            IndexSpec::new(
                "docId_branchId_unique",
                vec![
                    SortKey::asc(keys::fields::DOC_ID),
                    SortKey::asc(keys::fields::BRANCH_ID),
                ],
            )
            .unique(),
        )?;
        for field in &self.config.unique_fields {
            self.keys.create_index(
                IndexSpec::new(
                    unique_index_name(field),
                    vec![
                        SortKey::asc(keys::key_field(field)),
                        SortKey::asc(keys::fields::BRANCH),
                    ],
                )
                .unique()
                .partial(
                    Filter::all()
                        .eq(keys::fields::IS_DELETED, false)
                        .ne(keys::key_field(field), Value::Undefined),
                ),
            )?;
        }
        Ok(())
    }

    pub(crate) fn chunk_store(&self) -> ChunkStore<'_, C> {
        ChunkStore::new(&self.chunks)
    }

    pub(crate) fn branch_store(&self) -> BranchStore<'_, C> {
        BranchStore::new(&self.branches)
    }

    pub(crate) fn metadata_store(&self) -> MetadataStore<'_, C> {
        MetadataStore::new(&self.metadata)
    }

    pub(crate) fn key_index(&self) -> KeyIndex<'_, C> {
        KeyIndex::new(&self.keys, &self.config.unique_fields)
    }

    /// Metadata of the highest epoch, or `NotFound`.
    pub(crate) fn require_latest_metadata(&self, doc_id: DocumentId) -> Result<ChronicleMetadata> {
        self.metadata_store()
            .find_latest(doc_id)?
            .ok_or(Error::NotFound { doc_id })
    }

    /// The branch record a metadata row points at. A dangling pointer means
    /// the stored chronicle is broken.
    pub(crate) fn active_branch_of(&self, metadata: &ChronicleMetadata) -> Result<ChronicleBranch> {
        let doc_id = metadata.doc_id;
        let branch_id = metadata.active_branch_id;
        self.branch_store().find(doc_id, branch_id)?.ok_or_else(|| {
            error!(%doc_id, %branch_id, "active branch record is missing");
            Error::Corrupt {
                doc_id,
                branch_id,
                detail: "metadata points at a branch record that does not exist".to_string(),
            }
        })
    }

    /// Resolves an explicitly requested branch of the document, or falls back
    /// to the active one.
    pub(crate) fn resolve_branch(
        &self,
        metadata: &ChronicleMetadata,
        branch_id: Option<BranchId>,
    ) -> Result<ChronicleBranch> {
        match branch_id {
            Some(branch_id) => self
                .branch_store()
                .find(metadata.doc_id, branch_id)?
                .ok_or(Error::BranchNotFound {
                    doc_id: metadata.doc_id,
                    branch_id,
                }),
            None => self.active_branch_of(metadata),
        }
    }
}
