use crate::model::{Aliased, Document, SchemaField, SchemaModel, SchemaRef, VariableValue};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaMode {
    Reference,
    Direct,
}

/// Modes the operator may choose from. Reference mode needs at least one configured schema.
pub fn available_modes(document: &Document) -> &'static [SchemaMode] {
    if document.schemas.is_empty() {
        &[SchemaMode::Direct]
    } else {
        &[SchemaMode::Reference, SchemaMode::Direct]
    }
}

/// Concrete catalog/schema pair for a form selection.
/// A reference to a schema that no longer exists yields `None`.
pub fn to_inline(schema_ref: &SchemaRef, document: &Document) -> Option<SchemaModel> {
    match schema_ref {
        SchemaRef::Reference { key } => {
            let resolved = document.schemas.get(key).cloned();
            if resolved.is_none() {
                log::warn!("schema reference '{}' does not name a configured schema", key);
            }
            resolved
        }
        SchemaRef::Direct { catalog, schema } => {
            Some(SchemaModel::new(catalog.clone(), schema.clone()))
        }
    }
}

/// Find the configured schema structurally equal to a catalog/schema pair.
///
/// Comparison uses display values, so `main` and `{value: main}` match. A match
/// is preferred over direct mode to keep the document free of repeated pairs.
pub fn detect_reference(
    catalog: &VariableValue,
    schema: &VariableValue,
    document: &Document,
) -> SchemaRef {
    let direct = || SchemaRef::Direct {
        catalog: catalog.clone(),
        schema: schema.clone(),
    };
    if document.schemas.is_empty() {
        return direct();
    }

    let catalog_display = catalog.display();
    let schema_display = schema.display();
    if catalog_display.is_empty() || schema_display.is_empty() {
        return direct();
    }

    document
        .schemas
        .iter()
        .find(|(_, configured)| {
            configured.catalog_name.display() == catalog_display
                && configured.schema_name.display() == schema_display
        })
        .map(|(key, _)| SchemaRef::Reference { key: key.clone() })
        .unwrap_or_else(direct)
}

/// Form selection for a stored `schema:` field
pub fn detect_field(field: &SchemaField, document: &Document) -> SchemaRef {
    match field {
        Aliased::Inline(model) => {
            detect_reference(&model.catalog_name, &model.schema_name, document)
        }
        Aliased::Alias(raw) => match field.alias_name() {
            Some(key) => SchemaRef::Reference {
                key: key.to_string(),
            },
            None => {
                // Not an alias and not a pair; keep the text so nothing is lost
                log::debug!("schema field holds a bare string '{}'", raw);
                SchemaRef::Direct {
                    catalog: VariableValue::literal(raw.clone()),
                    schema: VariableValue::literal(""),
                }
            }
        },
    }
}

/// Stored `schema:` field for a form selection. Reference mode is written as an
/// alias; a direct pair with nothing filled in is omitted.
pub fn to_field(schema_ref: &SchemaRef) -> Option<SchemaField> {
    match schema_ref {
        SchemaRef::Reference { key } if key.is_empty() => None,
        SchemaRef::Reference { key } => Some(Aliased::alias(key)),
        SchemaRef::Direct { .. } if !schema_ref.is_specified() => None,
        SchemaRef::Direct { catalog, schema } => Some(Aliased::Inline(SchemaModel::new(
            catalog.clone(),
            schema.clone(),
        ))),
    }
}

/// `catalog.schema` for display; an unresolvable reference shows its alias text
pub fn display_schema_ref(schema_ref: &SchemaRef, document: &Document) -> String {
    match to_inline(schema_ref, document) {
        Some(model) => model.full_name(),
        None => match schema_ref {
            SchemaRef::Reference { key } => format!("*{}", key),
            SchemaRef::Direct { .. } => String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, PrimitiveValue, Scalar};

    fn document_with_sales() -> Document {
        let mut document = Document::default();
        document.insert_entry(
            "sales_schema".to_string(),
            Entry::Schema(SchemaModel::new("main", "sales")),
        );
        document
    }

    #[test]
    fn test_detect_prefers_configured_schema() {
        let document = document_with_sales();
        let detected = detect_reference(&"main".into(), &"sales".into(), &document);
        assert_eq!(detected, SchemaRef::reference("sales_schema"));
    }

    #[test]
    fn test_detect_compares_display_values() {
        let document = document_with_sales();
        let wrapped = VariableValue::Primitive(PrimitiveValue {
            value: Scalar::String("main".to_string()),
        });
        let detected = detect_reference(&wrapped, &"sales".into(), &document);
        assert_eq!(detected, SchemaRef::reference("sales_schema"));
    }

    #[test]
    fn test_empty_registry_always_direct() {
        let document = Document::default();
        assert_eq!(available_modes(&document), &[SchemaMode::Direct]);
        let detected = detect_reference(&"main".into(), &"sales".into(), &document);
        assert_eq!(detected, SchemaRef::direct("main", "sales"));
    }

    #[test]
    fn test_no_match_falls_back_to_direct() {
        let document = document_with_sales();
        let detected = detect_reference(&"main".into(), &"finance".into(), &document);
        assert_eq!(detected, SchemaRef::direct("main", "finance"));
    }

    #[test]
    fn test_first_match_wins() {
        let mut document = document_with_sales();
        document.insert_entry(
            "another_sales".to_string(),
            Entry::Schema(SchemaModel::new("main", "sales")),
        );
        let detected = detect_reference(&"main".into(), &"sales".into(), &document);
        assert_eq!(detected, SchemaRef::reference("another_sales"));
    }

    #[test]
    fn test_to_inline_and_dangling_reference() {
        let document = document_with_sales();
        let inline = to_inline(&SchemaRef::reference("sales_schema"), &document).unwrap();
        assert_eq!(inline.full_name(), "main.sales");
        assert_eq!(to_inline(&SchemaRef::reference("gone"), &document), None);
        assert_eq!(
            display_schema_ref(&SchemaRef::reference("gone"), &document),
            "*gone"
        );
    }

    #[test]
    fn test_field_round_trip() {
        let document = document_with_sales();
        let field = to_field(&SchemaRef::reference("sales_schema")).unwrap();
        assert_eq!(field.alias_name(), Some("sales_schema"));
        assert_eq!(detect_field(&field, &document), SchemaRef::reference("sales_schema"));

        assert_eq!(to_field(&SchemaRef::direct("", "")), None);
    }
}
