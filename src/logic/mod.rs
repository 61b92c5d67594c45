pub mod auth;
pub mod controller;
pub mod database;
pub mod registry;
pub mod schema_ref;
pub mod validate;
pub mod vector_store;

pub use controller::{DocumentController, DocumentEvent, MutationOutcome};
pub use registry::{find_collision, is_duplicate, normalize_reference_name};
pub use schema_ref::SchemaMode;
pub use validate::{validate_document, DocumentStatus, ValidationIssue, ValidationReport};
