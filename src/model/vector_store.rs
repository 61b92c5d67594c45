use crate::model::{
    Aliased, AuthCapable, AuthSpec, Credentials, Namespace, Passthrough, SchemaField, SchemaRef,
    TableModel, VolumeModel,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndpointType {
    Standard,
    OptimizedStorage,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorSearchEndpoint {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub endpoint_type: Option<EndpointType>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmbeddingModel {
    pub name: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// A path inside a Unity Catalog volume
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumePathModel {
    pub volume: VolumeModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

/// Persisted vector-store record. The configuration mode is implied:
/// a `source_table` means the index is provisioned from it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VectorStoreModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<VectorSearchEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<TableModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_source_column: Option<String>,
    /// `*llm_key` or an inline model name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<Aliased<EmbeddingModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<VolumePathModel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_path: Option<VolumePathModel>,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl AuthCapable for VectorStoreModel {
    const NAMESPACE: Namespace = Namespace::VectorStores;

    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn credentials_mut(&mut self) -> &mut Credentials {
        &mut self.credentials
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreMode {
    /// Point at an index that already exists
    #[default]
    UseExisting,
    /// Create the index from a source table
    Provision,
}

/// Form state for a volume path (`source_path` / `checkpoint_path`)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VolumePathForm {
    pub schema: Option<SchemaRef>,
    pub volume_name: String,
    pub path: String,
}

/// Edit state for a vector store. Fields of the inactive mode may be stale.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VectorStoreForm {
    pub config_mode: VectorStoreMode,
    pub endpoint_name: String,
    pub endpoint_type: Option<EndpointType>,
    pub index_name: String,
    pub index_schema: Option<SchemaRef>,
    pub source_table_name: String,
    pub source_table_schema: Option<SchemaRef>,
    pub embedding_source_column: String,
    pub embedding_model: Option<Aliased<EmbeddingModel>>,
    pub primary_key: String,
    pub columns: Vec<String>,
    pub doc_uri: String,
    pub source_path: VolumePathForm,
    pub checkpoint_path: VolumePathForm,
    pub auth: AuthSpec,
    /// Unmodelled keys of the record being edited
    pub extra: Passthrough,
}
