use crate::model::{Document, EntryKey, Namespace};

/// Turn free text into a reference name: lowercase, runs of anything that is
/// not ASCII alphanumeric collapsed to `_`, no leading or trailing `_`.
pub fn normalize_reference_name(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('_');
            }
            pending_separator = false;
            normalized.push(ch);
        } else {
            pending_separator = true;
        }
    }
    normalized
}

/// First namespace in which `candidate` is already taken.
///
/// `editing` names the entry currently being edited; it is skipped only in
/// its own namespace, so reusing the same name for a different kind of
/// entry still collides.
pub fn find_collision(
    candidate: &str,
    document: &Document,
    editing: Option<&EntryKey>,
) -> Option<Namespace> {
    if candidate.is_empty() {
        return None;
    }
    Namespace::ALL.into_iter().find(|namespace| {
        document.keys(*namespace).any(|key| {
            key == candidate
                && !editing.is_some_and(|own| own.namespace == *namespace && own.key == key)
        })
    })
}

/// Whether `candidate` clashes with any existing reference name. Empty names are
/// left to the required-field check and never count as duplicates.
pub fn is_duplicate(candidate: &str, document: &Document, editing: Option<&EntryKey>) -> bool {
    find_collision(candidate, document, editing).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entry, SchemaModel, TableModel};
    use serde_json::json;

    fn document_with_tool(name: &str) -> Document {
        let mut document = Document::default();
        document.insert_entry(name.to_string(), Entry::Tool(json!({"name": name})));
        document
    }

    #[test]
    fn test_normalize_reference_name() {
        assert_eq!(normalize_reference_name("Sales Data (2024)"), "sales_data_2024");
        assert_eq!(normalize_reference_name("__leading--and trailing__"), "leading_and_trailing");
        assert_eq!(normalize_reference_name("already_ok"), "already_ok");
        assert_eq!(normalize_reference_name("!!!"), "");
    }

    #[test]
    fn test_normalized_names_are_ascii() {
        assert_eq!(normalize_reference_name("Café Bar"), "caf_bar");
        assert_eq!(normalize_reference_name("Ärger über Daten"), "rger_ber_daten");
        assert!(normalize_reference_name("東京 sales").is_ascii());
    }

    #[test]
    fn test_duplicates_span_namespaces() {
        let document = document_with_tool("x");
        assert!(is_duplicate("x", &document, None));
        // Editing a new table that would also be called `x`
        let editing_table = EntryKey::new(Namespace::Tables, "x");
        assert!(is_duplicate("x", &document, Some(&editing_table)));

        let mut document = Document::default();
        document.insert_entry("x".to_string(), Entry::Table(TableModel::default()));
        assert_eq!(find_collision("x", &document, None), Some(Namespace::Tables));
        let editing_tool = EntryKey::new(Namespace::Tools, "x");
        assert!(is_duplicate("x", &document, Some(&editing_tool)));
    }

    #[test]
    fn test_entry_never_collides_with_itself() {
        let mut document = Document::default();
        document.insert_entry(
            "retail".to_string(),
            Entry::Schema(SchemaModel::new("main", "retail")),
        );
        let editing = EntryKey::new(Namespace::Schemas, "retail");
        assert!(!is_duplicate("retail", &document, Some(&editing)));
    }

    #[test]
    fn test_empty_candidate_is_not_a_duplicate() {
        let mut document = Document::default();
        document.insert_entry(String::new(), Entry::Tool(json!({})));
        assert!(!is_duplicate("", &document, None));
    }

    #[test]
    fn test_first_hit_follows_fixed_order() {
        let mut document = document_with_tool("shared");
        document.insert_entry(
            "shared".to_string(),
            Entry::Schema(SchemaModel::new("main", "shared")),
        );
        assert_eq!(find_collision("shared", &document, None), Some(Namespace::Tools));
    }
}
