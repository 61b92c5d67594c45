use crate::logic::auth;
use crate::model::{
    DatabaseConnection, DatabaseForm, DatabaseModel, DatabaseSubtype, Document,
    LakebaseConnection, PostgresConnection, VariableValue,
};

/// Effective subtype of a stored record.
///
/// Field presence decides; the remembered editor hint only breaks the tie for
/// a record that has neither `instance_name` nor `host` yet.
pub fn infer_subtype(record: &DatabaseModel, hint: Option<DatabaseSubtype>) -> DatabaseSubtype {
    match (record.has_instance_name(), record.has_host()) {
        (true, _) => DatabaseSubtype::Lakebase,
        (false, true) => DatabaseSubtype::Postgres,
        (false, false) => hint.unwrap_or(DatabaseSubtype::Lakebase),
    }
}

impl DatabaseForm {
    /// Subtype the form will be saved as: the explicit choice, else whatever is filled in
    pub fn selected_subtype(&self) -> DatabaseSubtype {
        if let Some(hint) = self.subtype_hint {
            return hint;
        }
        let has_host = self.host.as_ref().is_some_and(|host| !host.is_empty());
        if self.instance_name.is_empty() && has_host {
            DatabaseSubtype::Postgres
        } else {
            DatabaseSubtype::Lakebase
        }
    }

    /// Typed connection for the selected subtype; the other subtype's fields are discarded
    pub fn connection(&self) -> DatabaseConnection {
        match self.selected_subtype() {
            DatabaseSubtype::Lakebase => DatabaseConnection::Lakebase(LakebaseConnection {
                instance_name: self.instance_name.clone(),
                capacity: non_empty(&self.capacity),
            }),
            DatabaseSubtype::Postgres => DatabaseConnection::Postgres(PostgresConnection {
                host: self
                    .host
                    .clone()
                    .unwrap_or_else(|| VariableValue::literal("")),
                port: filled(&self.port),
                database: filled(&self.database),
                user: filled(&self.user),
                password: filled(&self.password),
            }),
        }
    }
}

/// Assemble the persisted record from the form
pub fn build_database(form: &DatabaseForm) -> DatabaseModel {
    let mut record = DatabaseModel {
        name: form.name.clone(),
        description: non_empty(&form.description),
        max_pool_size: form.max_pool_size,
        timeout_seconds: form.timeout_seconds,
        extra: form.extra.clone(),
        ..DatabaseModel::default()
    };

    let connection = form.connection();
    match &connection {
        DatabaseConnection::Lakebase(lakebase) => {
            record.instance_name = non_empty(&lakebase.instance_name);
            record.capacity = lakebase.capacity.clone();
        }
        DatabaseConnection::Postgres(postgres) => {
            record.host = Some(postgres.host.clone()).filter(|host| !host.is_empty());
            record.port = postgres.port.clone();
            record.database = postgres.database.clone();
            record.user = postgres.user.clone();
            record.password = postgres.password.clone();
        }
    }

    // Acting on behalf of the user only exists for Lakebase
    let mut auth_spec = form.auth.clone();
    if connection.subtype() == DatabaseSubtype::Postgres {
        auth_spec.on_behalf_of_user = false;
    }
    auth::apply(&record, &auth_spec)
}

/// Load a stored record into an edit form
pub fn parse_database(
    record: &DatabaseModel,
    hint: Option<DatabaseSubtype>,
    document: &Document,
) -> DatabaseForm {
    let subtype = infer_subtype(record, hint);
    DatabaseForm {
        subtype_hint: Some(subtype),
        name: record.name.clone(),
        description: record.description.clone().unwrap_or_default(),
        instance_name: record.instance_name.clone().unwrap_or_default(),
        capacity: record.capacity.clone().unwrap_or_default(),
        host: record.host.clone(),
        port: record.port.clone(),
        database: record.database.clone(),
        user: record.user.clone(),
        password: record.password.clone(),
        max_pool_size: record.max_pool_size,
        timeout_seconds: record.timeout_seconds,
        auth: auth::parse(record, document),
        extra: record.extra.clone(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim().to_string()).filter(|value| !value.is_empty())
}

fn filled(value: &Option<VariableValue>) -> Option<VariableValue> {
    value.clone().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AuthSpec, Sourced};

    fn form_with_both_identifiers(hint: Option<DatabaseSubtype>) -> DatabaseForm {
        DatabaseForm {
            subtype_hint: hint,
            name: "memory".to_string(),
            instance_name: "a".to_string(),
            capacity: "CU_1".to_string(),
            host: Some(VariableValue::literal("b")),
            port: Some(VariableValue::literal("5432")),
            user: Some(VariableValue::env("PGUSER")),
            ..DatabaseForm::default()
        }
    }

    #[test]
    fn test_hint_selects_lakebase_fields_only() {
        let record = build_database(&form_with_both_identifiers(Some(DatabaseSubtype::Lakebase)));
        assert_eq!(record.instance_name.as_deref(), Some("a"));
        assert_eq!(record.capacity.as_deref(), Some("CU_1"));
        assert_eq!(record.host, None);
        assert_eq!(record.port, None);
        assert_eq!(record.user, None);
    }

    #[test]
    fn test_hint_selects_postgres_fields_only() {
        let record = build_database(&form_with_both_identifiers(Some(DatabaseSubtype::Postgres)));
        assert_eq!(record.host, Some(VariableValue::literal("b")));
        assert_eq!(record.port, Some(VariableValue::literal("5432")));
        assert_eq!(record.instance_name, None);
        assert_eq!(record.capacity, None);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("instance_name").is_none());
        assert!(json.get("subtype_hint").is_none());
    }

    #[test]
    fn test_postgres_clears_on_behalf_of_user() {
        let mut form = form_with_both_identifiers(Some(DatabaseSubtype::Postgres));
        form.auth = AuthSpec::on_behalf_of_user();
        let record = build_database(&form);
        assert_eq!(record.credentials.on_behalf_of_user, None);

        form.subtype_hint = Some(DatabaseSubtype::Lakebase);
        let record = build_database(&form);
        assert_eq!(record.credentials.on_behalf_of_user, Some(true));
    }

    #[test]
    fn test_unfilled_lakebase_keeps_on_behalf_of_user() {
        let form = DatabaseForm {
            subtype_hint: Some(DatabaseSubtype::Lakebase),
            name: "fresh".to_string(),
            auth: AuthSpec::on_behalf_of_user(),
            ..DatabaseForm::default()
        };
        let record = build_database(&form);
        assert_eq!(record.credentials.on_behalf_of_user, Some(true));
        assert_eq!(record.instance_name, None);
    }

    #[test]
    fn test_inference_ignores_hint_when_fields_decide() {
        let postgres = DatabaseModel {
            host: Some(VariableValue::literal("db.internal")),
            ..DatabaseModel::default()
        };
        assert_eq!(
            infer_subtype(&postgres, Some(DatabaseSubtype::Lakebase)),
            DatabaseSubtype::Postgres
        );

        let lakebase = DatabaseModel {
            instance_name: Some("instance".to_string()),
            ..DatabaseModel::default()
        };
        assert_eq!(
            infer_subtype(&lakebase, Some(DatabaseSubtype::Postgres)),
            DatabaseSubtype::Lakebase
        );

        let fresh = DatabaseModel::default();
        assert_eq!(
            infer_subtype(&fresh, Some(DatabaseSubtype::Postgres)),
            DatabaseSubtype::Postgres
        );
        assert_eq!(infer_subtype(&fresh, None), DatabaseSubtype::Lakebase);
    }

    #[test]
    fn test_parse_then_build_preserves_record() {
        let document = Document::default();
        let record = DatabaseModel {
            name: "orders".to_string(),
            host: Some(VariableValue::literal("db.internal")),
            port: Some(VariableValue::literal("5432")),
            database: Some(VariableValue::literal("orders")),
            user: Some(VariableValue::literal("svc")),
            password: Some(VariableValue::secret("db", "password")),
            credentials: crate::model::Credentials {
                pat: Some(VariableValue::literal("*token_var")),
                ..Default::default()
            },
            ..DatabaseModel::default()
        };
        let form = parse_database(&record, None, &document);
        assert_eq!(form.subtype_hint, Some(DatabaseSubtype::Postgres));
        assert_eq!(form.auth.pat, Some(Sourced::variable("token_var")));
        assert_eq!(build_database(&form), record);
    }
}
