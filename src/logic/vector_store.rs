use crate::logic::{auth, schema_ref};
use crate::model::{
    Document, IndexModel, SchemaField, TableModel, VectorSearchEndpoint, VectorStoreForm,
    VectorStoreMode, VectorStoreModel, VolumeModel, VolumePathForm, VolumePathModel,
};

/// Configuration mode implied by a stored record. A record with neither an
/// index nor a source table falls back to the remembered editor hint.
pub fn infer_mode(record: &VectorStoreModel, hint: Option<VectorStoreMode>) -> VectorStoreMode {
    if record.source_table.is_some() {
        VectorStoreMode::Provision
    } else if record.index.is_some() {
        VectorStoreMode::UseExisting
    } else {
        hint.unwrap_or_default()
    }
}

/// Assemble the persisted record for the form's configuration mode.
///
/// Fields belonging only to the other mode are dropped even when the form
/// still holds them from before a mode switch.
pub fn build_vector_store(form: &VectorStoreForm) -> VectorStoreModel {
    let mut record = VectorStoreModel {
        endpoint: non_empty(&form.endpoint_name).map(|name| VectorSearchEndpoint {
            name,
            endpoint_type: form.endpoint_type,
            ..VectorSearchEndpoint::default()
        }),
        embedding_model: form.embedding_model.clone(),
        primary_key: non_empty(&form.primary_key),
        columns: form
            .columns
            .iter()
            .filter(|column| !column.trim().is_empty())
            .cloned()
            .collect(),
        extra: form.extra.clone(),
        ..VectorStoreModel::default()
    };

    match form.config_mode {
        VectorStoreMode::UseExisting => {
            record.index = Some(IndexModel {
                schema: form.index_schema.as_ref().and_then(schema_ref::to_field),
                name: non_empty(&form.index_name),
                ..IndexModel::default()
            });
        }
        VectorStoreMode::Provision => {
            let source_schema = form
                .source_table_schema
                .as_ref()
                .and_then(schema_ref::to_field);
            let source_name = non_empty(&form.source_table_name);

            let explicit_index = !form.index_name.trim().is_empty()
                || form
                    .index_schema
                    .as_ref()
                    .is_some_and(|schema| schema.is_specified());
            if explicit_index {
                record.index = Some(IndexModel {
                    schema: form
                        .index_schema
                        .as_ref()
                        .and_then(schema_ref::to_field)
                        .or_else(|| source_schema.clone()),
                    name: non_empty(&form.index_name)
                        .or_else(|| source_name.as_ref().map(|name| default_index_name(name))),
                    ..IndexModel::default()
                });
            }

            record.source_table = Some(TableModel {
                schema: source_schema,
                name: source_name,
                ..TableModel::default()
            });
            record.embedding_source_column = non_empty(&form.embedding_source_column);
            record.doc_uri = non_empty(&form.doc_uri);
            record.source_path = build_volume_path(&form.source_path);
            record.checkpoint_path = build_volume_path(&form.checkpoint_path);
        }
    }

    auth::apply(&record, &form.auth)
}

/// Load a stored record into an edit form
pub fn parse_vector_store(
    record: &VectorStoreModel,
    hint: Option<VectorStoreMode>,
    document: &Document,
) -> VectorStoreForm {
    let detect = |field: &Option<SchemaField>| {
        field
            .as_ref()
            .map(|field| schema_ref::detect_field(field, document))
    };
    let index = record.index.clone().unwrap_or_default();
    let source_table = record.source_table.clone().unwrap_or_default();

    VectorStoreForm {
        config_mode: infer_mode(record, hint),
        endpoint_name: record
            .endpoint
            .as_ref()
            .map(|endpoint| endpoint.name.clone())
            .unwrap_or_default(),
        endpoint_type: record
            .endpoint
            .as_ref()
            .and_then(|endpoint| endpoint.endpoint_type),
        index_name: index.name.clone().unwrap_or_default(),
        index_schema: detect(&index.schema),
        source_table_name: source_table.name.clone().unwrap_or_default(),
        source_table_schema: detect(&source_table.schema),
        embedding_source_column: record.embedding_source_column.clone().unwrap_or_default(),
        embedding_model: record.embedding_model.clone(),
        primary_key: record.primary_key.clone().unwrap_or_default(),
        columns: record.columns.clone(),
        doc_uri: record.doc_uri.clone().unwrap_or_default(),
        source_path: parse_volume_path(record.source_path.as_ref(), document),
        checkpoint_path: parse_volume_path(record.checkpoint_path.as_ref(), document),
        auth: auth::parse(record, document),
        extra: record.extra.clone(),
    }
}

/// Index the serving side will end up with, filling in what provisioning derives
pub fn effective_index(record: &VectorStoreModel) -> Option<IndexModel> {
    let source_table = record.source_table.as_ref();
    let explicit = record.index.clone().unwrap_or_default();
    let schema = explicit
        .schema
        .or_else(|| source_table.and_then(|table| table.schema.clone()));
    let name = explicit.name.or_else(|| {
        source_table
            .and_then(|table| table.name.as_deref())
            .map(default_index_name)
    });
    if schema.is_none() && name.is_none() {
        return None;
    }
    Some(IndexModel {
        schema,
        name,
        extra: explicit.extra,
    })
}

pub fn default_index_name(source_table: &str) -> String {
    format!("{}_index", source_table)
}

fn build_volume_path(form: &VolumePathForm) -> Option<VolumePathModel> {
    let volume_name = non_empty(&form.volume_name)?;
    Some(VolumePathModel {
        volume: VolumeModel {
            schema: form.schema.as_ref().and_then(schema_ref::to_field),
            name: volume_name,
            ..VolumeModel::default()
        },
        path: non_empty(&form.path),
        ..VolumePathModel::default()
    })
}

fn parse_volume_path(path: Option<&VolumePathModel>, document: &Document) -> VolumePathForm {
    let Some(path) = path else {
        return VolumePathForm::default();
    };
    VolumePathForm {
        schema: path
            .volume
            .schema
            .as_ref()
            .map(|field| schema_ref::detect_field(field, document)),
        volume_name: path.volume.name.clone(),
        path: path.path.clone().unwrap_or_default(),
    }
}

fn non_empty(value: &str) -> Option<String> {
    Some(value.trim().to_string()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Aliased, Entry, SchemaModel, SchemaRef};

    fn provision_form() -> VectorStoreForm {
        VectorStoreForm {
            config_mode: VectorStoreMode::Provision,
            source_table_name: "products".to_string(),
            source_table_schema: Some(SchemaRef::reference("retail")),
            embedding_source_column: "description".to_string(),
            doc_uri: "url".to_string(),
            source_path: VolumePathForm {
                schema: Some(SchemaRef::reference("retail")),
                volume_name: "raw".to_string(),
                path: "docs/".to_string(),
            },
            ..VectorStoreForm::default()
        }
    }

    #[test]
    fn test_use_existing_drops_stale_provision_fields() {
        let mut form = provision_form();
        form.config_mode = VectorStoreMode::UseExisting;
        form.index_name = "products_index".to_string();
        form.index_schema = Some(SchemaRef::direct("main", "retail"));

        let record = build_vector_store(&form);
        assert_eq!(record.source_table, None);
        assert_eq!(record.embedding_source_column, None);
        assert_eq!(record.doc_uri, None);
        assert_eq!(record.source_path, None);
        assert_eq!(record.checkpoint_path, None);

        let index = record.index.unwrap();
        assert_eq!(index.name.as_deref(), Some("products_index"));
        assert_eq!(
            index.schema,
            Some(Aliased::Inline(SchemaModel::new("main", "retail")))
        );
    }

    #[test]
    fn test_provision_omits_index_unless_specified() {
        let record = build_vector_store(&provision_form());
        assert_eq!(record.index, None);
        assert_eq!(record.embedding_source_column.as_deref(), Some("description"));
        assert_eq!(
            record.source_table.as_ref().and_then(|t| t.name.as_deref()),
            Some("products")
        );

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("index").is_none());
    }

    #[test]
    fn test_provision_derives_missing_index_parts() {
        let mut form = provision_form();
        form.index_schema = Some(SchemaRef::direct("main", "vectors"));
        let record = build_vector_store(&form);
        let index = record.index.unwrap();
        assert_eq!(index.name.as_deref(), Some("products_index"));
        assert_eq!(
            index.schema,
            Some(Aliased::Inline(SchemaModel::new("main", "vectors")))
        );

        let mut form = provision_form();
        form.index_name = "custom".to_string();
        let index = build_vector_store(&form).index.unwrap();
        assert_eq!(index.name.as_deref(), Some("custom"));
        let schema = index.schema.as_ref().and_then(|schema| schema.alias_name());
        assert_eq!(schema, Some("retail"));
    }

    #[test]
    fn test_volume_paths_need_a_volume_name() {
        let mut form = provision_form();
        form.checkpoint_path = VolumePathForm {
            schema: Some(SchemaRef::reference("retail")),
            volume_name: String::new(),
            path: "checkpoints/".to_string(),
        };
        let record = build_vector_store(&form);
        assert_eq!(record.checkpoint_path, None);

        let source_path = record.source_path.unwrap();
        assert_eq!(source_path.volume.name, "raw");
        assert_eq!(source_path.path.as_deref(), Some("docs/"));
    }

    #[test]
    fn test_parse_infers_mode_and_schema_reference() {
        let mut document = Document::default();
        document.insert_entry(
            "retail".to_string(),
            Entry::Schema(SchemaModel::new("main", "retail")),
        );
        let record = VectorStoreModel {
            source_table: Some(TableModel {
                schema: Some(Aliased::Inline(SchemaModel::new("main", "retail"))),
                name: Some("products".to_string()),
                ..TableModel::default()
            }),
            embedding_source_column: Some("description".to_string()),
            ..VectorStoreModel::default()
        };

        let form = parse_vector_store(&record, Some(VectorStoreMode::UseExisting), &document);
        assert_eq!(form.config_mode, VectorStoreMode::Provision);
        assert_eq!(form.source_table_schema, Some(SchemaRef::reference("retail")));

        let empty = VectorStoreModel::default();
        assert_eq!(
            infer_mode(&empty, Some(VectorStoreMode::Provision)),
            VectorStoreMode::Provision
        );
        assert_eq!(infer_mode(&empty, None), VectorStoreMode::UseExisting);
    }

    #[test]
    fn test_effective_index_fills_defaults() {
        let record = build_vector_store(&provision_form());
        let index = effective_index(&record).unwrap();
        assert_eq!(index.name.as_deref(), Some("products_index"));
        assert_eq!(
            index.schema.as_ref().and_then(|s| s.alias_name()),
            Some("retail")
        );
    }
}
