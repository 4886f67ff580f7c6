//! Store Traits - Collaborator Abstraction Layer
//!
//! These traits are the narrow interface between `TreeService` and whatever
//! persists training trees. Two backends implement them: the in-memory stores
//! in `memory_store` and the libsql-backed `TursoStore`.
//!
//! # Design Decisions
//!
//! 1. **Async-First**: All methods are async so embedded and networked
//!    backends share one interface
//! 2. **Ownership Semantics**: Writes take ownership of the value and return
//!    the stored version (with assigned ids)
//! 3. **Error Handling**: `anyhow::Result`; the service layer attaches the
//!    fan-out step that failed
//! 4. **No Transactions**: Every call is independent, the service sequences them
//!
//! # Examples
//!
//! ```rust,no_run
//! use trainingtree_core::db::{MemoryNodeStore, NodeStore};
//! use trainingtree_core::models::{NodeType, TreeNode};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = MemoryNodeStore::new();
//!     let root = store.insert_node(TreeNode::new(NodeType::CategoryNode)).await?;
//!     let children = store.get_children(root.id.unwrap()).await?;
//!     assert!(children.is_empty());
//!     Ok(())
//! }
//! ```

use crate::models::{ExtensionRecord, NodeId, RequirementSkeleton, Training, TreeNode};
use anyhow::Result;
use async_trait::async_trait;

/// Persistence of generic tree node rows
///
/// Implementations must be `Send + Sync` so a single store can back every
/// request handled by the HTTP layer.
#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Get node by ID
    ///
    /// - `Ok(Some(node))` if node exists
    /// - `Ok(None)` if node doesn't exist (not an error)
    /// - `Err(_)` if the backend fails
    async fn get_node(&self, id: NodeId) -> Result<Option<TreeNode>>;

    /// All nodes, ascending id
    async fn list_nodes(&self) -> Result<Vec<TreeNode>>;

    /// Direct children of `parent_id`
    ///
    /// Ordered by `sort_order` ascending with unordered nodes last, ties broken
    /// by id (see `TreeNode::child_order_key`).
    async fn get_children(&self, parent_id: NodeId) -> Result<Vec<TreeNode>>;

    /// Root node (no parent) of the given training
    ///
    /// Returns the lowest-id match if the data holds more than one.
    async fn get_training_root(&self, training_id: NodeId) -> Result<Option<TreeNode>>;

    /// Insert a node and assign its id
    ///
    /// # Errors
    ///
    /// Fails if `node.id` is already set; ids are assigned here only.
    async fn insert_node(&self, node: TreeNode) -> Result<TreeNode>;

    /// Replace the stored row with `node` (full replace, not a patch)
    ///
    /// # Errors
    ///
    /// Fails if `node.id` is unset or does not exist.
    async fn update_node(&self, node: TreeNode) -> Result<TreeNode>;

    /// Delete the row; children rows are left untouched
    ///
    /// Returns whether a row existed.
    async fn delete_node(&self, id: NodeId) -> Result<bool>;
}

/// Persistence of one kind of extension record
#[async_trait]
pub trait ExtensionStore<T: ExtensionRecord>: Send + Sync {
    /// Extension row attached to the generic node `node_id`
    async fn find_by_node(&self, node_id: NodeId) -> Result<Option<T>>;

    /// Insert (no id) or replace (id set) a record, returning it with its id
    async fn save(&self, record: T) -> Result<T>;

    /// Delete by extension record id; returns whether a row existed
    async fn delete(&self, id: NodeId) -> Result<bool>;
}

/// Lookup of catalogue requirement skeletons
#[async_trait]
pub trait SkeletonStore: Send + Sync {
    async fn get_skeleton(&self, id: NodeId) -> Result<Option<RequirementSkeleton>>;

    async fn save_skeleton(&self, skeleton: RequirementSkeleton) -> Result<RequirementSkeleton>;
}

/// Lookup of trainings
#[async_trait]
pub trait TrainingStore: Send + Sync {
    async fn get_training(&self, id: NodeId) -> Result<Option<Training>>;

    async fn save_training(&self, training: Training) -> Result<Training>;
}

/// Text-searchable mirror of tree nodes
///
/// Query syntax is described in `search_index::SearchQuery`.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Add or replace the entry for `node` (which must carry an id)
    async fn index(&self, node: &TreeNode) -> Result<()>;

    /// Remove the entry for `id`; missing entries are not an error
    async fn delete(&self, id: NodeId) -> Result<()>;

    /// Nodes matching `query`, ascending id
    async fn search(&self, query: &str) -> Result<Vec<TreeNode>>;
}
