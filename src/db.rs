// src/db.rs

pub mod store;
pub use store::{EntityKind, EntityStore, Filter, Page, SortSpec};
pub mod memory_store;
pub use memory_store::MemoryStore;
pub mod pg_store;
pub use pg_store::PgStore;
pub mod repository;
pub use repository::{owned_by, Entity, Repository};
