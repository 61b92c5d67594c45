use crate::model::{Aliased, Credentials, VariableValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Keys a record does not model, carried through load and save unchanged
pub type Passthrough = BTreeMap<String, Value>;

/// A configured catalog/schema pair, stored under `schemas.<key>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaModel {
    pub catalog_name: VariableValue,
    pub schema_name: VariableValue,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl SchemaModel {
    pub fn new(catalog: impl Into<VariableValue>, schema: impl Into<VariableValue>) -> Self {
        Self {
            catalog_name: catalog.into(),
            schema_name: schema.into(),
            extra: Passthrough::new(),
        }
    }

    /// `catalog.schema` using display values
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.catalog_name.display(), self.schema_name.display())
    }
}

/// A resource's `schema:` field: `*schema_key` or an inline pair
pub type SchemaField = Aliased<SchemaModel>;

/// How an edit form addresses a catalog/schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SchemaRef {
    Reference {
        key: String,
    },
    Direct {
        catalog: VariableValue,
        schema: VariableValue,
    },
}

impl SchemaRef {
    pub fn reference(key: impl Into<String>) -> Self {
        SchemaRef::Reference { key: key.into() }
    }

    pub fn direct(catalog: impl Into<VariableValue>, schema: impl Into<VariableValue>) -> Self {
        SchemaRef::Direct {
            catalog: catalog.into(),
            schema: schema.into(),
        }
    }

    /// Whether the operator filled in anything at all
    pub fn is_specified(&self) -> bool {
        match self {
            SchemaRef::Reference { key } => !key.is_empty(),
            SchemaRef::Direct { catalog, schema } => !catalog.is_empty() || !schema.is_empty(),
        }
    }
}

/// Named service-principal credentials, stored under `service_principals.<key>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePrincipalModel {
    pub client_id: VariableValue,
    pub client_secret: VariableValue,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl ServicePrincipalModel {
    pub fn new(
        client_id: impl Into<VariableValue>,
        client_secret: impl Into<VariableValue>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            extra: Passthrough::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_behalf_of_user: Option<bool>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenieRoomModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub space_id: VariableValue,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaField>,
    /// Absent means every table in the schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaField>,
    pub name: String,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub warehouse_id: VariableValue,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConnectionModel {
    pub name: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub extra: Passthrough,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppModel {
    pub name: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub extra: Passthrough,
}
