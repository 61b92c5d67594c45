use crate::model::{Namespace, VariableValue};
use serde::{Deserialize, Serialize};

/// Prefix of a named-entry alias, e.g. `*my_service_principal`
pub const ALIAS_PREFIX: &str = "*";

/// Prefix used by the SQL-warehouse identifier field only
pub const REF_MARKER_PREFIX: &str = "__REF__";

/// How a field encodes "this value comes from a named entry elsewhere in the document"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceConvention {
    Alias,
    RefMarker,
}

impl ReferenceConvention {
    pub fn prefix(self) -> &'static str {
        match self {
            ReferenceConvention::Alias => ALIAS_PREFIX,
            ReferenceConvention::RefMarker => REF_MARKER_PREFIX,
        }
    }

    pub fn encode(self, name: &str) -> String {
        format!("{}{}", self.prefix(), name)
    }

    /// Target name of a stored reference, or None for anything else
    pub fn decode(self, raw: &str) -> Option<&str> {
        raw.strip_prefix(self.prefix()).filter(|name| !name.is_empty())
    }
}

/// Convention for a given field of a given resource namespace.
///
/// The warehouse identifier keeps its historical `__REF__` marker because
/// downstream consumers of the document parse it that way.
pub fn field_convention(namespace: Namespace, field: &str) -> ReferenceConvention {
    match (namespace, field) {
        (Namespace::Warehouses, "warehouse_id") => ReferenceConvention::RefMarker,
        _ => ReferenceConvention::Alias,
    }
}

/// Where a credential or identifier value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Manual,
    Variable,
}

/// One representation for both string conventions: either a literal value,
/// or the name of an entry in the document's `variables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "lowercase")]
pub enum Sourced {
    #[serde(rename = "manual")]
    Literal(VariableValue),
    Variable(String),
}

impl Sourced {
    pub fn manual(value: impl Into<VariableValue>) -> Self {
        Sourced::Literal(value.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Sourced::Variable(name.into())
    }

    pub fn source(&self) -> ValueSource {
        match self {
            Sourced::Literal(_) => ValueSource::Manual,
            Sourced::Variable(_) => ValueSource::Variable,
        }
    }

    /// Read a stored field value using that field's convention
    pub fn from_stored(value: &VariableValue, convention: ReferenceConvention) -> Self {
        match value.as_str().and_then(|raw| convention.decode(raw)) {
            Some(name) => Sourced::Variable(name.to_string()),
            None => Sourced::Literal(value.clone()),
        }
    }

    /// Value to write back, or None when the field should be omitted
    pub fn to_stored(&self, convention: ReferenceConvention) -> Option<VariableValue> {
        match self {
            Sourced::Literal(value) if value.is_empty() => None,
            Sourced::Literal(value) => Some(value.clone()),
            Sourced::Variable(name) if name.is_empty() => None,
            Sourced::Variable(name) => Some(VariableValue::literal(convention.encode(name))),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Sourced::Literal(value) => value.is_empty(),
            Sourced::Variable(name) => name.is_empty(),
        }
    }

    /// Rendering for forms, with variable names in the field's own convention
    pub fn display(&self, convention: ReferenceConvention) -> String {
        match self {
            Sourced::Literal(value) => value.display(),
            Sourced::Variable(name) => convention.encode(name),
        }
    }
}

/// A field that is either an alias to a named entry or the entry itself inline.
/// The inline form is what a YAML parser produces after expanding an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Aliased<T> {
    Alias(String),
    Inline(T),
}

impl<T> Aliased<T> {
    pub fn alias(name: &str) -> Self {
        Aliased::Alias(ReferenceConvention::Alias.encode(name))
    }

    /// Target name when this is a well-formed `*name` alias
    pub fn alias_name(&self) -> Option<&str> {
        match self {
            Aliased::Alias(raw) => ReferenceConvention::Alias.decode(raw),
            Aliased::Inline(_) => None,
        }
    }

    /// A bare string that is not an alias where an object was expected
    pub fn is_malformed(&self) -> bool {
        matches!(self, Aliased::Alias(_)) && self.alias_name().is_none()
    }

    pub fn inline(&self) -> Option<&T> {
        match self {
            Aliased::Inline(value) => Some(value),
            Aliased::Alias(_) => None,
        }
    }
}
