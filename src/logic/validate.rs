use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::logic::registry::find_collision;
use crate::logic::{auth, database, vector_store};
use crate::model::{
    Aliased, AuthCapable, AuthMethod, AuthSpec, DatabaseForm, DatabaseModel, DatabaseSubtype,
    Document, EntryKey, Namespace, SchemaField, Sourced, VectorStoreForm, VectorStoreMode,
    VectorStoreModel,
};

/// Everything that makes a document (or a pending save) invalid.
/// These are reported as values and never propagated.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("{entry}: required field '{field}' is missing")]
    MissingField { entry: EntryKey, field: String },

    #[error("{entry}: reference name is already used in {existing}")]
    DuplicateName { entry: EntryKey, existing: Namespace },

    #[error("{entry}: {detail}")]
    ModeConflict { entry: EntryKey, detail: String },

    #[error("{entry}: field '{field}' refers to missing {target} '{name}'")]
    DanglingReference {
        entry: EntryKey,
        field: String,
        target: Namespace,
        name: String,
    },

    #[error("{entry}: field '{field}' has an unexpected shape ({detail})")]
    ShapeMismatch {
        entry: EntryKey,
        field: String,
        detail: String,
    },
}

impl ValidationIssue {
    /// Resolution and shape problems degrade gracefully; they do not block a save
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ValidationIssue::DanglingReference { .. } | ValidationIssue::ShapeMismatch { .. }
        )
    }

    pub fn entry(&self) -> &EntryKey {
        match self {
            ValidationIssue::MissingField { entry, .. }
            | ValidationIssue::DuplicateName { entry, .. }
            | ValidationIssue::ModeConflict { entry, .. }
            | ValidationIssue::DanglingReference { entry, .. }
            | ValidationIssue::ShapeMismatch { entry, .. } => entry,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Nothing configured yet
    Empty,
    /// No agents, tools or app yet; issues are informational
    Incomplete,
    Checked,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub status: DocumentStatus,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(status: DocumentStatus, issues: Vec<ValidationIssue>) -> Self {
        let (warnings, errors): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ValidationIssue::is_warning);
        Self {
            valid: errors.is_empty(),
            status,
            errors,
            warnings,
        }
    }

    /// Whether the document may be saved; strict mode also refuses warnings
    pub fn passes(&self, strict: bool) -> bool {
        self.valid && (!strict || self.warnings.is_empty())
    }

    pub fn summary(&self) -> String {
        if self.errors.is_empty() && self.warnings.is_empty() {
            return "no issues".to_string();
        }
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .map(ToString::to_string)
            .join("; ")
    }
}

/// Check a whole document
pub fn validate_document(document: &Document) -> ValidationReport {
    if document.is_empty() {
        return ValidationReport::from_issues(DocumentStatus::Empty, Vec::new());
    }

    let mut issues = Vec::new();
    check_duplicate_names(document, &mut issues);
    check_resources(document, &mut issues);

    let status = if document.is_minimal() {
        DocumentStatus::Incomplete
    } else {
        DocumentStatus::Checked
    };
    ValidationReport::from_issues(status, issues)
}

/// Reference name of a new or edited entry in `namespace`. `editing` is the
/// entry's current key when it already exists. `None` means it can be saved.
pub fn check_reference_name(
    candidate: &str,
    document: &Document,
    namespace: Namespace,
    editing: Option<&EntryKey>,
) -> Option<ValidationIssue> {
    let entry = EntryKey::new(namespace, candidate);
    if candidate.trim().is_empty() {
        return Some(missing(&entry, "name"));
    }
    find_collision(candidate, document, editing)
        .map(|existing| ValidationIssue::DuplicateName { entry, existing })
}

/// Issues that block saving a database form
pub fn database_form_issues(form: &DatabaseForm, key: &str) -> Vec<ValidationIssue> {
    let entry = EntryKey::new(Namespace::Databases, key);
    let mut issues = Vec::new();
    if form.name.trim().is_empty() {
        issues.push(missing(&entry, "name"));
    }
    match form.selected_subtype() {
        DatabaseSubtype::Lakebase if form.instance_name.trim().is_empty() => {
            issues.push(missing(&entry, "instance_name"))
        }
        DatabaseSubtype::Postgres if form.host.as_ref().map_or(true, |host| host.is_empty()) => {
            issues.push(missing(&entry, "host"))
        }
        _ => {}
    }
    auth_spec_issues(&form.auth, &entry, &mut issues);
    issues
}

/// Issues that block saving a vector-store form
pub fn vector_store_form_issues(form: &VectorStoreForm, key: &str) -> Vec<ValidationIssue> {
    let entry = EntryKey::new(Namespace::VectorStores, key);
    let mut issues = Vec::new();
    match form.config_mode {
        VectorStoreMode::UseExisting => {
            if form.index_name.trim().is_empty() {
                issues.push(missing(&entry, "index.name"));
            }
            if !form.index_schema.as_ref().is_some_and(|s| s.is_specified()) {
                issues.push(missing(&entry, "index.schema"));
            }
        }
        VectorStoreMode::Provision => {
            if form.source_table_name.trim().is_empty() {
                issues.push(missing(&entry, "source_table.name"));
            }
            if !form
                .source_table_schema
                .as_ref()
                .is_some_and(|s| s.is_specified())
            {
                issues.push(missing(&entry, "source_table.schema"));
            }
            if form.embedding_source_column.trim().is_empty() {
                issues.push(missing(&entry, "embedding_source_column"));
            }
        }
    }
    auth_spec_issues(&form.auth, &entry, &mut issues);
    issues
}

pub fn can_submit_database(
    form: &DatabaseForm,
    key: &str,
    editing: Option<&str>,
    document: &Document,
) -> bool {
    let namespace = Namespace::Databases;
    let editing = editing.map(|previous| EntryKey::new(namespace, previous));
    check_reference_name(key, document, namespace, editing.as_ref()).is_none()
        && database_form_issues(form, key).is_empty()
}

pub fn can_submit_vector_store(
    form: &VectorStoreForm,
    key: &str,
    editing: Option<&str>,
    document: &Document,
) -> bool {
    let namespace = Namespace::VectorStores;
    let editing = editing.map(|previous| EntryKey::new(namespace, previous));
    check_reference_name(key, document, namespace, editing.as_ref()).is_none()
        && vector_store_form_issues(form, key).is_empty()
}

fn auth_spec_issues(spec: &AuthSpec, entry: &EntryKey, issues: &mut Vec<ValidationIssue>) {
    if spec.on_behalf_of_user {
        return;
    }
    let blank = |slot: &Option<Sourced>| slot.as_ref().map_or(true, Sourced::is_empty);
    match spec.method {
        AuthMethod::Default => {}
        AuthMethod::ServicePrincipal => {
            if spec.service_principal.is_none() {
                issues.push(missing(entry, "service_principal"));
            }
        }
        AuthMethod::OAuth => {
            if blank(&spec.client_id) {
                issues.push(missing(entry, "client_id"));
            }
            if blank(&spec.client_secret) {
                issues.push(missing(entry, "client_secret"));
            }
        }
        AuthMethod::Pat => {
            if blank(&spec.pat) {
                issues.push(missing(entry, "pat"));
            }
        }
    }
}

fn check_duplicate_names(document: &Document, issues: &mut Vec<ValidationIssue>) {
    // Each key is compared against namespaces scanned before it; a clash is reported once
    let mut seen: BTreeMap<&str, Namespace> = BTreeMap::new();
    for namespace in Namespace::ALL {
        for key in document.keys(namespace) {
            if let Some(existing) = seen.get(key) {
                issues.push(ValidationIssue::DuplicateName {
                    entry: EntryKey::new(namespace, key),
                    existing: *existing,
                });
            } else {
                seen.insert(key, namespace);
            }
        }
    }
}

fn check_resources(document: &Document, issues: &mut Vec<ValidationIssue>) {
    let resources = &document.resources;

    for (key, llm) in &resources.llms {
        let entry = EntryKey::new(Namespace::Llms, key.as_str());
        if llm.name.trim().is_empty() {
            issues.push(missing(&entry, "name"));
        }
    }
    for (key, room) in &resources.genie_rooms {
        let entry = EntryKey::new(Namespace::GenieRooms, key.as_str());
        if room.space_id.is_empty() {
            issues.push(missing(&entry, "space_id"));
        }
        let space_id = auth::read_sourced(Namespace::GenieRooms, "space_id", &room.space_id);
        check_variable_ref(document, &entry, "space_id", &space_id, issues);
        check_credentials(document, &entry, room, issues);
    }
    for (key, table) in &resources.tables {
        let entry = EntryKey::new(Namespace::Tables, key.as_str());
        check_schema_field(document, &entry, "schema", table.schema.as_ref(), true, issues);
    }
    for (key, volume) in &resources.volumes {
        let entry = EntryKey::new(Namespace::Volumes, key.as_str());
        if volume.name.trim().is_empty() {
            issues.push(missing(&entry, "name"));
        }
        check_schema_field(document, &entry, "schema", volume.schema.as_ref(), true, issues);
    }
    for (key, function) in &resources.functions {
        let entry = EntryKey::new(Namespace::Functions, key.as_str());
        check_schema_field(document, &entry, "schema", function.schema.as_ref(), true, issues);
    }
    for (key, warehouse) in &resources.warehouses {
        let entry = EntryKey::new(Namespace::Warehouses, key.as_str());
        let warehouse_id = auth::warehouse_id_source(warehouse);
        if warehouse_id.is_empty() {
            issues.push(missing(&entry, "warehouse_id"));
        }
        check_variable_ref(document, &entry, "warehouse_id", &warehouse_id, issues);
        check_credentials(document, &entry, warehouse, issues);
    }
    for (key, connection) in &resources.connections {
        let entry = EntryKey::new(Namespace::Connections, key.as_str());
        if connection.name.trim().is_empty() {
            issues.push(missing(&entry, "name"));
        }
        check_credentials(document, &entry, connection, issues);
    }
    for (key, record) in &resources.databases {
        let entry = EntryKey::new(Namespace::Databases, key.as_str());
        check_database(document, &entry, record, issues);
    }
    for (key, record) in &resources.vector_stores {
        let entry = EntryKey::new(Namespace::VectorStores, key.as_str());
        check_vector_store(document, &entry, record, issues);
    }
    for (key, app) in &resources.apps {
        let entry = EntryKey::new(Namespace::Apps, key.as_str());
        if app.name.trim().is_empty() {
            issues.push(missing(&entry, "name"));
        }
        check_credentials(document, &entry, app, issues);
    }
}

fn check_database(
    document: &Document,
    entry: &EntryKey,
    record: &DatabaseModel,
    issues: &mut Vec<ValidationIssue>,
) {
    if record.has_instance_name() && record.has_host() {
        issues.push(ValidationIssue::ModeConflict {
            entry: entry.clone(),
            detail: "both 'instance_name' and 'host' are set".to_string(),
        });
    }
    match database::infer_subtype(record, None) {
        DatabaseSubtype::Lakebase if !record.has_instance_name() => {
            issues.push(missing(entry, "instance_name"))
        }
        DatabaseSubtype::Postgres if record.credentials.on_behalf_of_user == Some(true) => {
            issues.push(ValidationIssue::ModeConflict {
                entry: entry.clone(),
                detail: "on_behalf_of_user is only available for Lakebase".to_string(),
            })
        }
        _ => {}
    }
    check_credentials(document, entry, record, issues);
}

fn check_vector_store(
    document: &Document,
    entry: &EntryKey,
    record: &VectorStoreModel,
    issues: &mut Vec<ValidationIssue>,
) {
    match vector_store::infer_mode(record, None) {
        VectorStoreMode::UseExisting => {
            let index = record.index.clone().unwrap_or_default();
            if index.name.is_none() {
                issues.push(missing(entry, "index.name"));
            }
            let schema = index.schema.as_ref();
            check_schema_field(document, entry, "index.schema", schema, true, issues);
            let stray = [
                ("embedding_source_column", record.embedding_source_column.is_some()),
                ("doc_uri", record.doc_uri.is_some()),
                ("source_path", record.source_path.is_some()),
                ("checkpoint_path", record.checkpoint_path.is_some()),
            ];
            for (field, present) in stray {
                if present {
                    issues.push(ValidationIssue::ModeConflict {
                        entry: entry.clone(),
                        detail: format!("'{}' needs a source_table to provision from", field),
                    });
                }
            }
        }
        VectorStoreMode::Provision => {
            let table = record.source_table.clone().unwrap_or_default();
            if table.name.is_none() {
                issues.push(missing(entry, "source_table.name"));
            }
            let schema = table.schema.as_ref();
            check_schema_field(document, entry, "source_table.schema", schema, true, issues);
            if record.embedding_source_column.is_none() {
                issues.push(missing(entry, "embedding_source_column"));
            }
            if let Some(index) = &record.index {
                let schema = index.schema.as_ref();
                check_schema_field(document, entry, "index.schema", schema, false, issues);
            }
        }
    }
    for (field, path) in [
        ("source_path", &record.source_path),
        ("checkpoint_path", &record.checkpoint_path),
    ] {
        if let Some(path) = path {
            check_schema_field(document, entry, field, path.volume.schema.as_ref(), false, issues);
        }
    }
    if let Some(model) = &record.embedding_model {
        check_alias(document, entry, "embedding_model", model, Namespace::Llms, issues);
    }
    check_credentials(document, entry, record, issues);
}

fn check_credentials<R: AuthCapable>(
    document: &Document,
    entry: &EntryKey,
    record: &R,
    issues: &mut Vec<ValidationIssue>,
) {
    let credentials = record.credentials();
    if credentials.on_behalf_of_user == Some(true) && credentials.has_explicit_method() {
        issues.push(ValidationIssue::ModeConflict {
            entry: entry.clone(),
            detail: "on_behalf_of_user cannot be combined with explicit credentials".to_string(),
        });
    }
    if let Some(principal) = &credentials.service_principal {
        check_alias(
            document,
            entry,
            "service_principal",
            principal,
            Namespace::ServicePrincipals,
            issues,
        );
    }

    let spec = auth::parse(record, document);
    for (field, slot) in [
        ("client_id", &spec.client_id),
        ("client_secret", &spec.client_secret),
        ("workspace_host", &spec.workspace_host),
        ("pat", &spec.pat),
    ] {
        if let Some(slot) = slot {
            check_variable_ref(document, entry, field, slot, issues);
        }
    }
}

fn check_variable_ref(
    document: &Document,
    entry: &EntryKey,
    field: &str,
    value: &Sourced,
    issues: &mut Vec<ValidationIssue>,
) {
    if let Sourced::Variable(name) = value {
        if !document.variables.contains_key(name) {
            log::warn!("{}: variable '{}' referenced by '{}' is missing", entry, name, field);
            issues.push(ValidationIssue::DanglingReference {
                entry: entry.clone(),
                field: field.to_string(),
                target: Namespace::Variables,
                name: name.clone(),
            });
        }
    }
}

fn check_schema_field(
    document: &Document,
    entry: &EntryKey,
    field: &str,
    schema: Option<&SchemaField>,
    required: bool,
    issues: &mut Vec<ValidationIssue>,
) {
    match schema {
        None if required => issues.push(missing(entry, field)),
        None => {}
        Some(schema) => check_alias(document, entry, field, schema, Namespace::Schemas, issues),
    }
}

fn check_alias<T>(
    document: &Document,
    entry: &EntryKey,
    field: &str,
    value: &Aliased<T>,
    target: Namespace,
    issues: &mut Vec<ValidationIssue>,
) {
    if value.is_malformed() {
        issues.push(ValidationIssue::ShapeMismatch {
            entry: entry.clone(),
            field: field.to_string(),
            detail: "expected an object or a '*name' alias".to_string(),
        });
        return;
    }
    if let Some(name) = value.alias_name() {
        if !document.contains(&EntryKey::new(target, name)) {
            log::warn!("{}: alias '*{}' in '{}' points at nothing", entry, name, field);
            issues.push(ValidationIssue::DanglingReference {
                entry: entry.clone(),
                field: field.to_string(),
                target,
                name: name.to_string(),
            });
        }
    }
}

fn missing(entry: &EntryKey, field: &str) -> ValidationIssue {
    ValidationIssue::MissingField {
        entry: entry.clone(),
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Credentials, Entry, SchemaModel, SchemaRef, TableModel, VariableValue, WarehouseModel,
    };
    use serde_json::json;

    fn base_document() -> Document {
        let mut document = Document::default();
        document.insert_entry(
            "retail".to_string(),
            Entry::Schema(SchemaModel::new("main", "retail")),
        );
        document.insert_entry("assistant".to_string(), Entry::Agent(json!({"name": "assistant"})));
        document
    }

    #[test]
    fn test_empty_document_is_valid() {
        let report = validate_document(&Document::default());
        assert!(report.valid);
        assert_eq!(report.status, DocumentStatus::Empty);
    }

    #[test]
    fn test_cross_namespace_duplicates_are_errors() {
        let mut document = base_document();
        document.insert_entry("retail".to_string(), Entry::Tool(json!({"name": "retail"})));
        let report = validate_document(&document);
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            vec![ValidationIssue::DuplicateName {
                entry: EntryKey::new(Namespace::Schemas, "retail"),
                existing: Namespace::Tools,
            }]
        );
    }

    #[test]
    fn test_dangling_references_are_warnings() {
        let mut document = base_document();
        document.insert_entry(
            "orders".to_string(),
            Entry::Table(TableModel {
                schema: Some(Aliased::alias("finance")),
                name: Some("orders".to_string()),
                ..TableModel::default()
            }),
        );
        document.insert_entry(
            "wh".to_string(),
            Entry::Warehouse(WarehouseModel {
                name: "wh".to_string(),
                description: None,
                warehouse_id: VariableValue::literal("__REF__missing_var"),
                credentials: Credentials {
                    service_principal: Some(Aliased::alias("gone")),
                    ..Credentials::default()
                },
                extra: Default::default(),
            }),
        );

        let report = validate_document(&document);
        assert!(report.valid, "{}", report.summary());
        assert_eq!(report.warnings.len(), 3);
        assert!(!report.passes(true));
        assert!(report.passes(false));
    }

    #[test]
    fn test_bare_string_where_alias_expected_is_shape_mismatch() {
        let mut document = base_document();
        document.insert_entry(
            "orders".to_string(),
            Entry::Table(TableModel {
                schema: Some(Aliased::Alias("main.finance".to_string())),
                name: None,
                ..TableModel::default()
            }),
        );
        let report = validate_document(&document);
        assert!(matches!(
            report.warnings.as_slice(),
            [ValidationIssue::ShapeMismatch { .. }]
        ));
    }

    #[test]
    fn test_database_record_conflicts() {
        let mut document = base_document();
        document.insert_entry(
            "pg".to_string(),
            Entry::Database(DatabaseModel {
                name: "pg".to_string(),
                host: Some(VariableValue::literal("db.internal")),
                credentials: Credentials {
                    on_behalf_of_user: Some(true),
                    ..Credentials::default()
                },
                ..DatabaseModel::default()
            }),
        );
        let report = validate_document(&document);
        assert!(matches!(
            report.errors.as_slice(),
            [ValidationIssue::ModeConflict { .. }]
        ));
    }

    #[test]
    fn test_vector_store_mode_requirements() {
        let mut document = base_document();
        document.insert_entry(
            "stale".to_string(),
            Entry::VectorStore(VectorStoreModel {
                embedding_source_column: Some("text".to_string()),
                ..VectorStoreModel::default()
            }),
        );
        let report = validate_document(&document);
        let fields: Vec<String> = report
            .errors
            .iter()
            .filter_map(|issue| match issue {
                ValidationIssue::MissingField { field, .. } => Some(field.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec!["index.name", "index.schema"]);
        assert!(report
            .errors
            .iter()
            .any(|issue| matches!(issue, ValidationIssue::ModeConflict { .. })));
    }

    #[test]
    fn test_minimal_document_is_incomplete() {
        let mut document = Document::default();
        document.insert_entry(
            "retail".to_string(),
            Entry::Schema(SchemaModel::new("main", "retail")),
        );
        assert_eq!(validate_document(&document).status, DocumentStatus::Incomplete);
        assert_eq!(validate_document(&base_document()).status, DocumentStatus::Checked);
    }

    #[test]
    fn test_form_predicates() {
        let document = base_document();
        let mut form = VectorStoreForm {
            config_mode: VectorStoreMode::Provision,
            source_table_name: "products".to_string(),
            source_table_schema: Some(SchemaRef::reference("retail")),
            ..VectorStoreForm::default()
        };
        assert!(!can_submit_vector_store(&form, "products_vs", None, &document));
        form.embedding_source_column = "description".to_string();
        assert!(can_submit_vector_store(&form, "products_vs", None, &document));
        // `retail` is taken by the schema
        assert!(!can_submit_vector_store(&form, "retail", None, &document));
        assert!(!can_submit_vector_store(&form, "", None, &document));

        let mut database = DatabaseForm {
            subtype_hint: Some(DatabaseSubtype::Postgres),
            name: "orders".to_string(),
            ..DatabaseForm::default()
        };
        assert_eq!(
            database_form_issues(&database, "orders"),
            vec![missing(&EntryKey::new(Namespace::Databases, "orders"), "host")]
        );
        database.host = Some(VariableValue::literal("db.internal"));
        database.auth = AuthSpec {
            method: AuthMethod::OAuth,
            client_id: Some(Sourced::manual("id")),
            ..AuthSpec::default()
        };
        assert!(!can_submit_database(&database, "orders", None, &document));
        database.auth.client_secret = Some(Sourced::variable("sp_secret"));
        assert!(can_submit_database(&database, "orders", None, &document));
    }

    #[test]
    fn test_new_entry_collides_with_same_namespace_key() {
        let mut document = base_document();
        document.insert_entry(
            "orders_db".to_string(),
            Entry::Database(DatabaseModel {
                name: "orders_db".to_string(),
                host: Some(VariableValue::literal("db.internal")),
                ..DatabaseModel::default()
            }),
        );
        let namespace = Namespace::Databases;
        let own = EntryKey::new(namespace, "orders_db");

        assert_eq!(
            check_reference_name("orders_db", &document, namespace, None),
            Some(ValidationIssue::DuplicateName {
                entry: own.clone(),
                existing: namespace,
            })
        );
        assert_eq!(
            check_reference_name("orders_db", &document, namespace, Some(&own)),
            None
        );

        let form = DatabaseForm {
            subtype_hint: Some(DatabaseSubtype::Postgres),
            name: "orders_db".to_string(),
            host: Some(VariableValue::literal("db.internal")),
            ..DatabaseForm::default()
        };
        assert!(!can_submit_database(&form, "orders_db", None, &document));
        assert!(can_submit_database(&form, "orders_db", Some("orders_db"), &document));
    }
}
