use crate::model::{
    field_convention, Aliased, AuthCapable, AuthMethod, AuthSpec, Credentials, Document,
    Namespace, ServicePrincipalModel, Sourced, ValueSources, VariableValue, WarehouseModel,
};

/// Read a stored field value using the reference convention of that field
pub fn read_sourced(namespace: Namespace, field: &str, value: &VariableValue) -> Sourced {
    Sourced::from_stored(value, field_convention(namespace, field))
}

/// Value to store for a field, or None when the field must be omitted
pub fn write_sourced(namespace: Namespace, field: &str, value: &Sourced) -> Option<VariableValue> {
    value.to_stored(field_convention(namespace, field))
}

/// Build the edit view of a record's credentials.
///
/// Method precedence: `service_principal`, then `client_id`/`client_secret`,
/// then `pat`, else the default ambient credentials.
pub fn parse<R: AuthCapable>(record: &R, document: &Document) -> AuthSpec {
    let credentials = record.credentials();
    let method = if credentials.service_principal.is_some() {
        AuthMethod::ServicePrincipal
    } else if credentials.client_id.is_some() || credentials.client_secret.is_some() {
        AuthMethod::OAuth
    } else if credentials.pat.is_some() {
        AuthMethod::Pat
    } else {
        AuthMethod::Default
    };

    let read = |field: &str, value: &Option<VariableValue>| {
        value
            .as_ref()
            .map(|value| read_sourced(R::NAMESPACE, field, value))
    };

    AuthSpec {
        method,
        on_behalf_of_user: credentials.on_behalf_of_user.unwrap_or(false),
        service_principal: credentials
            .service_principal
            .as_ref()
            .map(|principal| name_service_principal(principal, document)),
        client_id: read("client_id", &credentials.client_id),
        client_secret: read("client_secret", &credentials.client_secret),
        workspace_host: read("workspace_host", &credentials.workspace_host),
        pat: read("pat", &credentials.pat),
    }
}

/// Write an `AuthSpec` into a copy of the record.
///
/// Only the chosen method's fields are materialized; empty values are omitted.
/// When acting on behalf of the user (and the record allows it) every other
/// credential field is suppressed.
pub fn apply<R: AuthCapable>(record: &R, spec: &AuthSpec) -> R {
    let mut next = record.clone();
    let on_behalf_of_user = spec.on_behalf_of_user && next.supports_on_behalf_of_user();

    let write = |field: &str, value: &Option<Sourced>| {
        value
            .as_ref()
            .and_then(|value| write_sourced(R::NAMESPACE, field, value))
    };

    let mut credentials = Credentials::default();
    if on_behalf_of_user {
        credentials.on_behalf_of_user = Some(true);
    } else {
        // An explicit `false` in the stored record stays
        credentials.on_behalf_of_user = record.credentials().on_behalf_of_user.filter(|flag| !flag);
        credentials.workspace_host = write("workspace_host", &spec.workspace_host);
        match spec.method {
            AuthMethod::Default => {}
            AuthMethod::ServicePrincipal => {
                credentials.service_principal = spec.service_principal.clone().filter(
                    |principal| !matches!(principal, Aliased::Alias(raw) if raw.is_empty()),
                );
            }
            AuthMethod::OAuth => {
                credentials.client_id = write("client_id", &spec.client_id);
                credentials.client_secret = write("client_secret", &spec.client_secret);
            }
            AuthMethod::Pat => {
                credentials.pat = write("pat", &spec.pat);
            }
        }
    }

    *next.credentials_mut() = credentials;
    next
}

/// Inline service-principal credentials that equal a named entry become an alias to it
fn name_service_principal(
    principal: &Aliased<ServicePrincipalModel>,
    document: &Document,
) -> Aliased<ServicePrincipalModel> {
    let Aliased::Inline(inline) = principal else {
        return principal.clone();
    };
    document
        .service_principals
        .iter()
        .find(|(_, named)| {
            named.client_id == inline.client_id && named.client_secret == inline.client_secret
        })
        .map(|(key, _)| Aliased::alias(key))
        .unwrap_or_else(|| principal.clone())
}

/// The warehouse identifier as a manual value or a variable reference
pub fn warehouse_id_source(warehouse: &WarehouseModel) -> Sourced {
    read_sourced(Namespace::Warehouses, "warehouse_id", &warehouse.warehouse_id)
}

pub fn set_warehouse_id(warehouse: &mut WarehouseModel, value: &Sourced) {
    warehouse.warehouse_id = write_sourced(Namespace::Warehouses, "warehouse_id", value)
        .unwrap_or_else(|| VariableValue::literal(""));
}

/// Concrete client id and secret of a service-principal entry
pub fn resolve_service_principal(
    principal: &ServicePrincipalModel,
    sources: &ValueSources<'_>,
) -> (Option<String>, Option<String>) {
    (
        principal.client_id.resolve(sources),
        principal.client_secret.resolve(sources),
    )
}
