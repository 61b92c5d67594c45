pub mod auth;
pub mod database;
pub mod document;
pub mod reference;
pub mod resources;
pub mod session;
pub mod variable;
pub mod vector_store;

pub use auth::*;
pub use database::*;
pub use document::*;
pub use reference::*;
pub use resources::*;
pub use session::*;
pub use variable::*;
pub use vector_store::*;
