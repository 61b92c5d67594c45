use crate::model::{
    AppModel, ConnectionModel, DatabaseModel, FunctionModel, GenieRoomModel, LlmModel,
    SchemaModel, ServicePrincipalModel, TableModel, VariableValue, VectorStoreModel, VolumeModel,
    WarehouseModel,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Keys starting with this prefix are editor bookkeeping and never part of the canonical document
pub const RESERVED_KEY_PREFIX: &str = "_";

/// Every collection whose keys share one reference-name space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Namespace {
    Llms,
    GenieRooms,
    Tables,
    Volumes,
    Functions,
    Warehouses,
    Connections,
    Databases,
    VectorStores,
    Apps,
    ServicePrincipals,
    Agents,
    Tools,
    Guardrails,
    Retrievers,
    Schemas,
    Prompts,
    Variables,
}

impl Namespace {
    /// Fixed scan order for uniqueness checks
    pub const ALL: [Namespace; 18] = [
        Namespace::Llms,
        Namespace::GenieRooms,
        Namespace::Tables,
        Namespace::Volumes,
        Namespace::Functions,
        Namespace::Warehouses,
        Namespace::Connections,
        Namespace::Databases,
        Namespace::VectorStores,
        Namespace::Apps,
        Namespace::ServicePrincipals,
        Namespace::Agents,
        Namespace::Tools,
        Namespace::Guardrails,
        Namespace::Retrievers,
        Namespace::Schemas,
        Namespace::Prompts,
        Namespace::Variables,
    ];

    pub fn is_resource(self) -> bool {
        matches!(
            self,
            Namespace::Llms
                | Namespace::GenieRooms
                | Namespace::Tables
                | Namespace::Volumes
                | Namespace::Functions
                | Namespace::Warehouses
                | Namespace::Connections
                | Namespace::Databases
                | Namespace::VectorStores
                | Namespace::Apps
        )
    }

    pub fn key(self) -> &'static str {
        match self {
            Namespace::Llms => "llms",
            Namespace::GenieRooms => "genie_rooms",
            Namespace::Tables => "tables",
            Namespace::Volumes => "volumes",
            Namespace::Functions => "functions",
            Namespace::Warehouses => "warehouses",
            Namespace::Connections => "connections",
            Namespace::Databases => "databases",
            Namespace::VectorStores => "vector_stores",
            Namespace::Apps => "apps",
            Namespace::ServicePrincipals => "service_principals",
            Namespace::Agents => "agents",
            Namespace::Tools => "tools",
            Namespace::Guardrails => "guardrails",
            Namespace::Retrievers => "retrievers",
            Namespace::Schemas => "schemas",
            Namespace::Prompts => "prompts",
            Namespace::Variables => "variables",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_resource() {
            write!(f, "resources.{}", self.key())
        } else {
            f.write_str(self.key())
        }
    }
}

/// Address of one entry in the document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryKey {
    pub namespace: Namespace,
    pub key: String,
}

impl EntryKey {
    pub fn new(namespace: Namespace, key: impl Into<String>) -> Self {
        Self {
            namespace,
            key: key.into(),
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Resources {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub llms: BTreeMap<String, LlmModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub genie_rooms: BTreeMap<String, GenieRoomModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tables: BTreeMap<String, TableModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, VolumeModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub functions: BTreeMap<String, FunctionModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub warehouses: BTreeMap<String, WarehouseModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub connections: BTreeMap<String, ConnectionModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub databases: BTreeMap<String, DatabaseModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vector_stores: BTreeMap<String, VectorStoreModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub apps: BTreeMap<String, AppModel>,
}

impl Resources {
    pub fn is_empty(&self) -> bool {
        self == &Resources::default()
    }
}

/// The whole configuration being edited
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, VariableValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, SchemaModel>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub service_principals: BTreeMap<String, ServicePrincipalModel>,
    #[serde(default, skip_serializing_if = "Resources::is_empty")]
    pub resources: Resources,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub retrievers: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub guardrails: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prompts: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub agents: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app: Option<Value>,
    /// Sections this crate does not model (memory, evaluation, ...), passed through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One entry, ready to be stored under its namespace
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Llm(LlmModel),
    GenieRoom(GenieRoomModel),
    Table(TableModel),
    Volume(VolumeModel),
    Function(FunctionModel),
    Warehouse(WarehouseModel),
    Connection(ConnectionModel),
    Database(DatabaseModel),
    VectorStore(VectorStoreModel),
    App(AppModel),
    ServicePrincipal(ServicePrincipalModel),
    Schema(SchemaModel),
    Variable(VariableValue),
    Agent(Value),
    Tool(Value),
    Guardrail(Value),
    Retriever(Value),
    Prompt(Value),
}

impl Entry {
    pub fn namespace(&self) -> Namespace {
        match self {
            Entry::Llm(_) => Namespace::Llms,
            Entry::GenieRoom(_) => Namespace::GenieRooms,
            Entry::Table(_) => Namespace::Tables,
            Entry::Volume(_) => Namespace::Volumes,
            Entry::Function(_) => Namespace::Functions,
            Entry::Warehouse(_) => Namespace::Warehouses,
            Entry::Connection(_) => Namespace::Connections,
            Entry::Database(_) => Namespace::Databases,
            Entry::VectorStore(_) => Namespace::VectorStores,
            Entry::App(_) => Namespace::Apps,
            Entry::ServicePrincipal(_) => Namespace::ServicePrincipals,
            Entry::Schema(_) => Namespace::Schemas,
            Entry::Variable(_) => Namespace::Variables,
            Entry::Agent(_) => Namespace::Agents,
            Entry::Tool(_) => Namespace::Tools,
            Entry::Guardrail(_) => Namespace::Guardrails,
            Entry::Retriever(_) => Namespace::Retrievers,
            Entry::Prompt(_) => Namespace::Prompts,
        }
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid YAML document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot tell document format of '{0}'; use a .yaml, .yml or .json file")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Auto,
    Yaml,
    Json,
}

impl Document {
    pub fn from_yaml_str(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Read a document file; `Auto` picks the parser from the file extension
    pub fn load(path: impl AsRef<Path>, format: DocumentFormat) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let format = match format {
            DocumentFormat::Auto => match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => DocumentFormat::Yaml,
                Some("json") => DocumentFormat::Json,
                _ => return Err(DocumentError::UnsupportedFormat(path.display().to_string())),
            },
            explicit => explicit,
        };
        let source = std::fs::read_to_string(path)?;
        match format {
            DocumentFormat::Json => Self::from_json_str(&source),
            _ => Self::from_yaml_str(&source),
        }
    }

    /// Serializable form with all editor bookkeeping removed
    pub fn to_canonical_value(&self) -> Result<Value, DocumentError> {
        let mut value = serde_json::to_value(self)?;
        strip_reserved_keys(&mut value);
        Ok(value)
    }

    pub fn keys(&self, namespace: Namespace) -> Box<dyn Iterator<Item = &str> + '_> {
        fn names<V>(map: &BTreeMap<String, V>) -> Box<dyn Iterator<Item = &str> + '_> {
            Box::new(map.keys().map(String::as_str))
        }

        let resources = &self.resources;
        match namespace {
            Namespace::Llms => names(&resources.llms),
            Namespace::GenieRooms => names(&resources.genie_rooms),
            Namespace::Tables => names(&resources.tables),
            Namespace::Volumes => names(&resources.volumes),
            Namespace::Functions => names(&resources.functions),
            Namespace::Warehouses => names(&resources.warehouses),
            Namespace::Connections => names(&resources.connections),
            Namespace::Databases => names(&resources.databases),
            Namespace::VectorStores => names(&resources.vector_stores),
            Namespace::Apps => names(&resources.apps),
            Namespace::ServicePrincipals => names(&self.service_principals),
            Namespace::Agents => names(&self.agents),
            Namespace::Tools => names(&self.tools),
            Namespace::Guardrails => names(&self.guardrails),
            Namespace::Retrievers => names(&self.retrievers),
            Namespace::Schemas => names(&self.schemas),
            Namespace::Prompts => names(&self.prompts),
            Namespace::Variables => names(&self.variables),
        }
    }

    pub fn contains(&self, entry: &EntryKey) -> bool {
        self.keys(entry.namespace).any(|key| key == entry.key)
    }

    /// Store an entry, replacing whatever was under the same key in its namespace
    pub fn insert_entry(&mut self, key: String, entry: Entry) -> Option<Entry> {
        let resources = &mut self.resources;
        match entry {
            Entry::Llm(v) => resources.llms.insert(key, v).map(Entry::Llm),
            Entry::GenieRoom(v) => resources.genie_rooms.insert(key, v).map(Entry::GenieRoom),
            Entry::Table(v) => resources.tables.insert(key, v).map(Entry::Table),
            Entry::Volume(v) => resources.volumes.insert(key, v).map(Entry::Volume),
            Entry::Function(v) => resources.functions.insert(key, v).map(Entry::Function),
            Entry::Warehouse(v) => resources.warehouses.insert(key, v).map(Entry::Warehouse),
            Entry::Connection(v) => resources.connections.insert(key, v).map(Entry::Connection),
            Entry::Database(v) => resources.databases.insert(key, v).map(Entry::Database),
            Entry::VectorStore(v) => {
                resources.vector_stores.insert(key, v).map(Entry::VectorStore)
            }
            Entry::App(v) => resources.apps.insert(key, v).map(Entry::App),
            Entry::ServicePrincipal(v) => self
                .service_principals
                .insert(key, v)
                .map(Entry::ServicePrincipal),
            Entry::Schema(v) => self.schemas.insert(key, v).map(Entry::Schema),
            Entry::Variable(v) => self.variables.insert(key, v).map(Entry::Variable),
            Entry::Agent(v) => self.agents.insert(key, v).map(Entry::Agent),
            Entry::Tool(v) => self.tools.insert(key, v).map(Entry::Tool),
            Entry::Guardrail(v) => self.guardrails.insert(key, v).map(Entry::Guardrail),
            Entry::Retriever(v) => self.retrievers.insert(key, v).map(Entry::Retriever),
            Entry::Prompt(v) => self.prompts.insert(key, v).map(Entry::Prompt),
        }
    }

    /// Remove an entry. References to it elsewhere are left as they are.
    pub fn remove_entry(&mut self, entry: &EntryKey) -> Option<Entry> {
        let key = entry.key.as_str();
        let resources = &mut self.resources;
        match entry.namespace {
            Namespace::Llms => resources.llms.remove(key).map(Entry::Llm),
            Namespace::GenieRooms => resources.genie_rooms.remove(key).map(Entry::GenieRoom),
            Namespace::Tables => resources.tables.remove(key).map(Entry::Table),
            Namespace::Volumes => resources.volumes.remove(key).map(Entry::Volume),
            Namespace::Functions => resources.functions.remove(key).map(Entry::Function),
            Namespace::Warehouses => resources.warehouses.remove(key).map(Entry::Warehouse),
            Namespace::Connections => resources.connections.remove(key).map(Entry::Connection),
            Namespace::Databases => resources.databases.remove(key).map(Entry::Database),
            Namespace::VectorStores => resources.vector_stores.remove(key).map(Entry::VectorStore),
            Namespace::Apps => resources.apps.remove(key).map(Entry::App),
            Namespace::ServicePrincipals => {
                self.service_principals.remove(key).map(Entry::ServicePrincipal)
            }
            Namespace::Agents => self.agents.remove(key).map(Entry::Agent),
            Namespace::Tools => self.tools.remove(key).map(Entry::Tool),
            Namespace::Guardrails => self.guardrails.remove(key).map(Entry::Guardrail),
            Namespace::Retrievers => self.retrievers.remove(key).map(Entry::Retriever),
            Namespace::Schemas => self.schemas.remove(key).map(Entry::Schema),
            Namespace::Prompts => self.prompts.remove(key).map(Entry::Prompt),
            Namespace::Variables => self.variables.remove(key).map(Entry::Variable),
        }
    }

    /// Nothing has been configured yet
    pub fn is_empty(&self) -> bool {
        Namespace::ALL
            .iter()
            .all(|namespace| self.keys(*namespace).next().is_none())
            && self.app.is_none()
    }

    /// Still being assembled: no agents, tools or app section yet
    pub fn is_minimal(&self) -> bool {
        self.agents.is_empty() && self.tools.is_empty() && self.app.is_none()
    }
}

/// Drop reserved bookkeeping keys at any depth
pub fn strip_reserved_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|key, _| !key.starts_with(RESERVED_KEY_PREFIX));
            for nested in map.values_mut() {
                strip_reserved_keys(nested);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_reserved_keys(item);
            }
        }
        _ => {}
    }
}
