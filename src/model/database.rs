use crate::model::{AuthCapable, AuthSpec, Credentials, Namespace, Passthrough, VariableValue};
use serde::{Deserialize, Serialize};

/// Persisted database record.
///
/// The subtype is not stored: `instance_name` marks a Lakebase instance and
/// `host` marks a plain PostgreSQL server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatabaseModel {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pool_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub extra: Passthrough,
}

impl DatabaseModel {
    pub fn has_instance_name(&self) -> bool {
        self.instance_name.as_deref().is_some_and(|name| !name.is_empty())
    }

    pub fn has_host(&self) -> bool {
        self.host.as_ref().is_some_and(|host| !host.is_empty())
    }

    /// Subtype read from field presence alone; an unfilled record counts as Lakebase
    pub fn subtype(&self) -> DatabaseSubtype {
        if !self.has_instance_name() && self.has_host() {
            DatabaseSubtype::Postgres
        } else {
            DatabaseSubtype::Lakebase
        }
    }
}

impl AuthCapable for DatabaseModel {
    const NAMESPACE: Namespace = Namespace::Databases;

    fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    fn credentials_mut(&mut self) -> &mut Credentials {
        &mut self.credentials
    }

    fn supports_on_behalf_of_user(&self) -> bool {
        self.subtype() == DatabaseSubtype::Lakebase
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseSubtype {
    Lakebase,
    Postgres,
}

/// Lakebase-specific connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct LakebaseConnection {
    pub instance_name: String,
    pub capacity: Option<String>,
}

/// Plain PostgreSQL connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct PostgresConnection {
    pub host: VariableValue,
    pub port: Option<VariableValue>,
    pub database: Option<VariableValue>,
    pub user: Option<VariableValue>,
    pub password: Option<VariableValue>,
}

/// In-memory connection model; exactly one subtype's fields exist at a time
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseConnection {
    Lakebase(LakebaseConnection),
    Postgres(PostgresConnection),
}

impl DatabaseConnection {
    pub fn subtype(&self) -> DatabaseSubtype {
        match self {
            DatabaseConnection::Lakebase(_) => DatabaseSubtype::Lakebase,
            DatabaseConnection::Postgres(_) => DatabaseSubtype::Postgres,
        }
    }
}

/// Edit state for a database. May hold leftovers of both subtypes while the
/// operator switches back and forth; only the chosen subtype is ever emitted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatabaseForm {
    /// The operator's explicit subtype choice, if any
    pub subtype_hint: Option<DatabaseSubtype>,
    pub name: String,
    pub description: String,
    pub instance_name: String,
    pub capacity: String,
    pub host: Option<VariableValue>,
    pub port: Option<VariableValue>,
    pub database: Option<VariableValue>,
    pub user: Option<VariableValue>,
    pub password: Option<VariableValue>,
    pub max_pool_size: Option<u32>,
    pub timeout_seconds: Option<u32>,
    pub auth: AuthSpec,
    /// Unmodelled keys of the record being edited
    pub extra: Passthrough,
}
