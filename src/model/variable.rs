use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A bare scalar as it appears in the document: `name: foo`, `port: 5432`, `enabled: true`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => write!(f, "{}", value),
            Scalar::Number(value) => write!(f, "{}", value),
            Scalar::String(value) => f.write_str(value),
        }
    }
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(value) => Some(value),
            _ => None,
        }
    }
}

/// Environment variable reference: `{env: NAME, default_value: ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvRef {
    pub env: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Scalar>,
}

/// Secret reference: `{scope: s, secret: k, default_value: ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRef {
    pub scope: String,
    pub secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Scalar>,
}

/// Ordered fallbacks; the first option that resolves wins at runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeValue {
    pub options: Vec<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Scalar>,
}

/// Explicitly wrapped literal: `{value: ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveValue {
    pub value: Scalar,
}

/// Indirect value used anywhere the document accepts a configurable value.
///
/// Variant order matters for untagged deserialization: the keyed shapes are
/// tried before the bare literal shorthand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Env(EnvRef),
    Secret(SecretRef),
    Composite(CompositeValue),
    Primitive(PrimitiveValue),
    Literal(Scalar),
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        VariableValue::literal(value)
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        VariableValue::Literal(Scalar::String(value))
    }
}

impl VariableValue {
    pub fn literal(value: impl Into<String>) -> Self {
        VariableValue::Literal(Scalar::String(value.into()))
    }

    pub fn env(name: impl Into<String>) -> Self {
        VariableValue::Env(EnvRef {
            env: name.into(),
            default_value: None,
        })
    }

    pub fn secret(scope: impl Into<String>, secret: impl Into<String>) -> Self {
        VariableValue::Secret(SecretRef {
            scope: scope.into(),
            secret: secret.into(),
            default_value: None,
        })
    }

    /// Human-readable rendering for forms and summaries. Never mutates or resolves.
    pub fn display(&self) -> String {
        match self {
            VariableValue::Literal(scalar) => scalar.to_string(),
            VariableValue::Primitive(primitive) => primitive.value.to_string(),
            VariableValue::Env(env) => match &env.default_value {
                Some(default) => default.to_string(),
                None => format!("${}", env.env),
            },
            VariableValue::Secret(secret) => {
                format!("{{{{secrets/{}/{}}}}}", secret.scope, secret.secret)
            }
            VariableValue::Composite(composite) => {
                format!("composite ({} options)", composite.options.len())
            }
        }
    }

    /// The raw string when this value is a plain string literal
    pub fn as_str(&self) -> Option<&str> {
        match self {
            VariableValue::Literal(scalar) => scalar.as_str(),
            VariableValue::Primitive(primitive) => primitive.value.as_str(),
            _ => None,
        }
    }

    /// True for literals that carry no content. References are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            VariableValue::Literal(scalar) => matches!(scalar, Scalar::String(s) if s.is_empty()),
            VariableValue::Primitive(primitive) => {
                matches!(&primitive.value, Scalar::String(s) if s.is_empty())
            }
            _ => false,
        }
    }

    /// Resolve to the concrete value a deployment would see.
    pub fn resolve(&self, sources: &ValueSources<'_>) -> Option<String> {
        let resolved = match self {
            VariableValue::Literal(scalar) => Some(scalar.to_string()),
            VariableValue::Primitive(primitive) => Some(primitive.value.to_string()),
            VariableValue::Env(env) => sources
                .env
                .var(&env.env)
                .or_else(|| env.default_value.as_ref().map(Scalar::to_string)),
            VariableValue::Secret(secret) => sources
                .secrets
                .secret(&secret.scope, &secret.secret)
                .or_else(|| secret.default_value.as_ref().map(Scalar::to_string)),
            VariableValue::Composite(composite) => composite
                .options
                .iter()
                .find_map(|option| option.resolve(sources))
                .or_else(|| composite.default_value.as_ref().map(Scalar::to_string)),
        };
        resolved.filter(|value| !value.is_empty())
    }
}

/// Display a raw document value. Null, unknown shapes and objects that are not
/// variable values (e.g. an alias already expanded by the parser) render as "".
pub fn resolve_display(value: &serde_json::Value) -> String {
    if value.is_null() {
        return String::new();
    }
    match serde_json::from_value::<VariableValue>(value.clone()) {
        Ok(variable) => variable.display(),
        Err(_) => {
            log::debug!("value has no display form: {}", value);
            String::new()
        }
    }
}

/// Prefix test that only ever looks at strings
pub fn is_variable_reference(value: &serde_json::Value, prefix: &str) -> bool {
    value
        .as_str()
        .is_some_and(|raw| raw.len() > prefix.len() && raw.starts_with(prefix))
}

/// Lookup of environment variables during runtime resolution
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// Lookup of secret values; the real implementation talks to the workspace
pub trait SecretSource {
    fn secret(&self, scope: &str, key: &str) -> Option<String>;
}

/// Process environment
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Secret source that knows nothing; secrets fall back to their defaults
pub struct NoSecrets;

impl SecretSource for NoSecrets {
    fn secret(&self, _scope: &str, _key: &str) -> Option<String> {
        None
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl SecretSource for HashMap<(String, String), String> {
    fn secret(&self, scope: &str, key: &str) -> Option<String> {
        self.get(&(scope.to_string(), key.to_string())).cloned()
    }
}

pub struct ValueSources<'a> {
    pub env: &'a dyn EnvSource,
    pub secrets: &'a dyn SecretSource,
}

impl ValueSources<'static> {
    pub fn process() -> Self {
        Self {
            env: &ProcessEnv,
            secrets: &NoSecrets,
        }
    }
}
