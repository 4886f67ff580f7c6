//! Database Layer
//!
//! Storage seams and their implementations:
//!
//! - `node_store` - async store traits used by the tree service
//! - `extension_stores` - the per-type extension store bundle
//! - `memory_store` / `search_index` - in-memory backends
//! - `database` / `turso_store` / `turso_search_index` - embedded libsql backend

mod database;
mod error;
mod extension_stores;
mod memory_store;
mod node_store;
mod search_index;
mod turso_search_index;
mod turso_store;

pub use database::DatabaseService;
pub use error::DatabaseError;
pub use extension_stores::ExtensionStores;
pub use memory_store::{
    MemoryExtensionStore, MemoryNodeStore, MemorySkeletonStore, MemoryTrainingStore,
};
pub use node_store::{
    ExtensionStore, NodeStore, SearchIndex, SkeletonStore, TrainingStore,
};
pub use search_index::{
    MemorySearchIndex, SearchDocument, SearchQuery, SearchTerm, SEARCH_FIELDS,
};
pub use turso_search_index::TursoSearchIndex;
pub use turso_store::TursoStore;
