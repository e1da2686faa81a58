#![forbid(unsafe_code)]

pub mod json;
pub mod repository;
pub mod samples;
pub mod store;

pub use json::JsonCatalog;
pub use repository::{CatalogError, InMemoryCatalog, ScenarioCatalog};
pub use store::{JsonSessionStore, SessionStore};
