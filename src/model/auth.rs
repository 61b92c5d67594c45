use crate::model::{
    Aliased, AppModel, ConnectionModel, GenieRoomModel, Namespace, ServicePrincipalModel, Sourced,
    VariableValue, WarehouseModel,
};
use serde::{Deserialize, Serialize};

/// Credential fields shared by every resource that can authenticate on its own.
/// Flattened into the resource record; unused fields are absent, never empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_behalf_of_user: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_principal: Option<Aliased<ServicePrincipalModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_host: Option<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pat: Option<VariableValue>,
}

impl Credentials {
    pub fn is_empty(&self) -> bool {
        self == &Credentials::default()
    }

    /// An explicit credential method is materialized
    pub fn has_explicit_method(&self) -> bool {
        self.service_principal.is_some()
            || self.client_id.is_some()
            || self.client_secret.is_some()
            || self.pat.is_some()
    }
}

/// Resource records that carry a `Credentials` block
pub trait AuthCapable: Clone {
    const NAMESPACE: Namespace;

    fn credentials(&self) -> &Credentials;
    fn credentials_mut(&mut self) -> &mut Credentials;

    fn supports_on_behalf_of_user(&self) -> bool {
        true
    }
}

macro_rules! auth_capable {
    ($model:ty, $namespace:expr, $obo:expr) => {
        impl AuthCapable for $model {
            const NAMESPACE: Namespace = $namespace;

            fn credentials(&self) -> &Credentials {
                &self.credentials
            }

            fn credentials_mut(&mut self) -> &mut Credentials {
                &mut self.credentials
            }

            fn supports_on_behalf_of_user(&self) -> bool {
                $obo
            }
        }
    };
}

auth_capable!(GenieRoomModel, Namespace::GenieRooms, true);
auth_capable!(WarehouseModel, Namespace::Warehouses, true);
auth_capable!(ConnectionModel, Namespace::Connections, true);
auth_capable!(AppModel, Namespace::Apps, false);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Ambient credentials of whoever runs the agent
    #[default]
    Default,
    ServicePrincipal,
    #[serde(rename = "oauth")]
    OAuth,
    Pat,
}

/// Edit-friendly, resource-agnostic view of a record's credentials
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthSpec {
    pub method: AuthMethod,
    #[serde(default)]
    pub on_behalf_of_user: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_principal: Option<Aliased<ServicePrincipalModel>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Sourced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<Sourced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_host: Option<Sourced>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pat: Option<Sourced>,
}

impl AuthSpec {
    pub fn service_principal(key: &str) -> Self {
        Self {
            method: AuthMethod::ServicePrincipal,
            service_principal: Some(Aliased::alias(key)),
            ..Self::default()
        }
    }

    pub fn oauth(client_id: Sourced, client_secret: Sourced) -> Self {
        Self {
            method: AuthMethod::OAuth,
            client_id: Some(client_id),
            client_secret: Some(client_secret),
            ..Self::default()
        }
    }

    pub fn pat(pat: Sourced) -> Self {
        Self {
            method: AuthMethod::Pat,
            pat: Some(pat),
            ..Self::default()
        }
    }

    pub fn on_behalf_of_user() -> Self {
        Self {
            on_behalf_of_user: true,
            ..Self::default()
        }
    }

    pub fn with_workspace_host(mut self, host: Sourced) -> Self {
        self.workspace_host = Some(host);
        self
    }

    /// Name of the referenced service principal, when it is an alias
    pub fn service_principal_key(&self) -> Option<&str> {
        self.service_principal.as_ref().and_then(Aliased::alias_name)
    }
}
