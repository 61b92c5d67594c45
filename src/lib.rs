pub mod config;
pub mod logic;
pub mod model;
pub mod store;

// Export logic types
pub use logic::{
    find_collision, is_duplicate, normalize_reference_name, validate_document, DocumentController,
    DocumentEvent, DocumentStatus, MutationOutcome, SchemaMode, ValidationIssue, ValidationReport,
};

// Export all model types
pub use model::*;

// Export store types
pub use store::{sort_by_owner, CatalogBrowser, InventoryItem, InventorySource, SelectorCache};

#[cfg(test)]
mod tests {
    use crate::logic::{auth, database, schema_ref, vector_store};
    use crate::model::*;
    use crate::{DocumentController, MutationOutcome};
    use serde_json::json;

    #[tokio::test]
    async fn test_resolve_display_never_fails() {
        let cases = vec![
            (json!({"env": "FOO", "default_value": "bar"}), "bar"),
            (json!({"env": "FOO"}), "$FOO"),
            (json!({"scope": "s", "secret": "k"}), "{{secrets/s/k}}"),
            (json!(null), ""),
            (json!({"unexpected": true}), ""),
            (json!("plain"), "plain"),
        ];
        for (value, expected) in cases {
            assert_eq!(resolve_display(&value), expected, "display of {}", value);
            println!("✓ {} -> {:?}", value, expected);
        }
    }

    #[tokio::test]
    async fn test_uniqueness_is_symmetric_across_namespaces() {
        let mut controller = DocumentController::default();
        assert!(controller
            .upsert("x", Entry::Tool(json!({"name": "x"})), None)
            .is_applied());
        assert!(matches!(
            controller.upsert("x", Entry::Table(TableModel::default()), None),
            MutationOutcome::Rejected(_)
        ));
        println!("✓ tool then table rejected");

        let mut controller = DocumentController::default();
        assert!(controller
            .upsert("x", Entry::Table(TableModel::default()), None)
            .is_applied());
        assert!(matches!(
            controller.upsert("x", Entry::Tool(json!({"name": "x"})), None),
            MutationOutcome::Rejected(_)
        ));
        println!("✓ table then tool rejected");
    }

    #[tokio::test]
    async fn test_auth_round_trip_from_yaml_records() {
        let yaml = r#"
service_principals:
  app_sp:
    client_id: { scope: creds, secret: client_id }
    client_secret: { scope: creds, secret: client_secret }
resources:
  connections:
    ambient:
      name: ambient
    principal:
      name: principal
      service_principal: "*app_sp"
    oauth:
      name: oauth
      client_id: "*client_id_var"
      client_secret: { scope: creds, secret: client_secret }
    token:
      name: token
      pat: { env: DATABRICKS_TOKEN }
"#;
        let document = Document::from_yaml_str(yaml).unwrap();
        for (key, record) in &document.resources.connections {
            let spec = auth::parse(record, &document);
            assert_eq!(&auth::apply(record, &spec), record, "round trip of {}", key);
            println!("✓ {} round-trips as {:?}", key, spec.method);
        }
    }

    #[tokio::test]
    async fn test_database_subtype_exclusivity() {
        for subtype in [DatabaseSubtype::Lakebase, DatabaseSubtype::Postgres] {
            let form = DatabaseForm {
                subtype_hint: Some(subtype),
                name: "memory".to_string(),
                instance_name: "a".to_string(),
                host: Some(VariableValue::literal("b")),
                ..DatabaseForm::default()
            };
            let json = serde_json::to_value(database::build_database(&form)).unwrap();
            match subtype {
                DatabaseSubtype::Lakebase => {
                    assert_eq!(json["instance_name"], "a");
                    assert!(json.get("host").is_none());
                }
                DatabaseSubtype::Postgres => {
                    assert_eq!(json["host"], "b");
                    assert!(json.get("instance_name").is_none());
                }
            }
            println!("✓ {:?} keeps only its identifier", subtype);
        }
    }

    #[tokio::test]
    async fn test_vector_store_mode_switch_drops_provision_fields() {
        let mut form = VectorStoreForm {
            config_mode: VectorStoreMode::Provision,
            source_table_name: "products".to_string(),
            source_table_schema: Some(SchemaRef::direct("main", "retail")),
            embedding_source_column: "description".to_string(),
            ..VectorStoreForm::default()
        };
        let provisioned = serde_json::to_value(vector_store::build_vector_store(&form)).unwrap();
        assert!(provisioned.get("source_table").is_some());

        form.config_mode = VectorStoreMode::UseExisting;
        form.index_name = "products_index".to_string();
        form.index_schema = Some(SchemaRef::direct("main", "retail"));
        let existing = serde_json::to_value(vector_store::build_vector_store(&form)).unwrap();
        assert!(existing.get("source_table").is_none());
        assert!(existing.get("embedding_source_column").is_none());
        assert_eq!(existing["index"]["name"], "products_index");
        println!("✓ use_existing omits stale provision fields");
    }

    #[tokio::test]
    async fn test_schema_resolver_prefers_reference() {
        let document = Document::from_yaml_str(
            r#"
schemas:
  sales_schema:
    catalog_name: main
    schema_name: sales
"#,
        )
        .unwrap();
        let detected = schema_ref::detect_reference(&"main".into(), &"sales".into(), &document);
        assert_eq!(detected, SchemaRef::reference("sales_schema"));
        assert_eq!(
            serde_json::to_value(&detected).unwrap(),
            json!({"mode": "reference", "key": "sales_schema"})
        );
        println!("✓ main.sales resolves to *sales_schema");
    }
}
