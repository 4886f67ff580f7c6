//! Tree Service - Training Tree Composition
//!
//! Business logic over the store traits:
//!
//! - Hydration (generic node + extension + ordered subtree)
//! - Delete fan-out across extension store, node store and search index
//! - Create / update with search index mirroring
//! - Root, children, list and search lookups
//!
//! # Fan-out Ordering
//!
//! There is no transaction across stores. Operations touch them in a fixed
//! order and report the first failing call as `StorageFailure { step, .. }`:
//!
//! - delete: lookup node, lookup extension, delete extension, delete node,
//!   delete index entry
//! - create: insert node, save extension (when given), index node
//!
//! Deleting a node never touches its children. They keep their `parent_id`
//! and are reachable by id only.

use crate::config::TreeServiceConfig;
use crate::db::{
    DatabaseService, ExtensionStores, MemoryExtensionStore, MemoryNodeStore, MemorySearchIndex,
    MemorySkeletonStore, MemoryTrainingStore, NodeStore, SearchIndex, SearchQuery, SkeletonStore,
    TrainingStore, TursoSearchIndex, TursoStore,
};
use crate::models::{
    BranchNode, CategoryNode, CustomSlideNode, GeneratedSlideNode, HydratedNode, NodeExtension,
    NodeExtensionRecord, NodeId, NodeType, RequirementNode, RequirementNodeRecord, TreeNode,
};
use crate::services::error::{FanOutStep, StepContext, TreeServiceError};
use std::sync::Arc;

/// Every collaborator the tree service talks to
#[derive(Clone)]
pub struct TreeStores {
    pub nodes: Arc<dyn NodeStore>,
    pub extensions: ExtensionStores,
    pub skeletons: Arc<dyn SkeletonStore>,
    pub trainings: Arc<dyn TrainingStore>,
    pub search: Arc<dyn SearchIndex>,
}

impl TreeStores {
    /// Fresh in-memory stores
    pub fn in_memory() -> Self {
        Self {
            nodes: Arc::new(MemoryNodeStore::new()),
            extensions: ExtensionStores {
                custom_slides: Arc::new(MemoryExtensionStore::<CustomSlideNode>::new()),
                branches: Arc::new(MemoryExtensionStore::<BranchNode>::new()),
                requirements: Arc::new(MemoryExtensionStore::<RequirementNodeRecord>::new()),
                generated_slides: Arc::new(MemoryExtensionStore::<GeneratedSlideNode>::new()),
                categories: Arc::new(MemoryExtensionStore::<CategoryNode>::new()),
            },
            skeletons: Arc::new(MemorySkeletonStore::new()),
            trainings: Arc::new(MemoryTrainingStore::new()),
            search: Arc::new(MemorySearchIndex::new()),
        }
    }

    /// Stores backed by one libsql database
    pub fn turso(db: Arc<DatabaseService>) -> Self {
        let store = Arc::new(TursoStore::new(db.clone()));
        Self {
            nodes: store.clone(),
            extensions: ExtensionStores::from_backend(store.clone()),
            skeletons: store.clone(),
            trainings: store,
            search: Arc::new(TursoSearchIndex::new(db)),
        }
    }
}

/// Save request with the create/update intent made explicit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRequest {
    /// Insert a new node; a pre-assigned id is rejected
    Create(TreeNode),
    /// Replace an existing node, or create it when it has no id
    Update(TreeNode),
}

/// One visited node during hydration, before children are attached
struct Visited {
    node: TreeNode,
    extension: NodeExtension,
    children: Vec<usize>,
}

pub struct TreeService {
    stores: TreeStores,
    config: TreeServiceConfig,
}

impl TreeService {
    /// Create a service over `stores`
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` does not validate.
    pub fn new(stores: TreeStores, config: TreeServiceConfig) -> Result<Self, TreeServiceError> {
        config.validate().map_err(TreeServiceError::invalid_config)?;
        Ok(Self { stores, config })
    }

    pub fn stores(&self) -> &TreeStores {
        &self.stores
    }

    pub fn config(&self) -> &TreeServiceConfig {
        &self.config
    }

    async fn require_node(&self, id: NodeId) -> Result<TreeNode, TreeServiceError> {
        self.stores
            .nodes
            .get_node(id)
            .await
            .at_step(FanOutStep::LookupNode)?
            .ok_or_else(|| TreeServiceError::node_not_found(id))
    }

    /// Stored extension record of `node`, which must exist
    async fn require_extension_record(
        &self,
        node: &TreeNode,
        id: NodeId,
    ) -> Result<NodeExtensionRecord, TreeServiceError> {
        let record = self
            .stores
            .extensions
            .find(node.node_type, id)
            .await
            .at_step(FanOutStep::LookupExtension)?;

        record.ok_or_else(|| {
            tracing::warn!("{} node {} has no extension record", node.node_type, id);
            TreeServiceError::inconsistent_state(id, node.node_type, "missing extension record")
        })
    }

    /// Turn a stored record into its hydrated form
    async fn resolve_extension(
        &self,
        record: NodeExtensionRecord,
    ) -> Result<NodeExtension, TreeServiceError> {
        let extension = match record {
            NodeExtensionRecord::CustomSlideNode(r) => NodeExtension::CustomSlideNode(r),
            NodeExtensionRecord::BranchNode(r) => NodeExtension::BranchNode(r),
            NodeExtensionRecord::GeneratedSlideNode(r) => NodeExtension::GeneratedSlideNode(r),
            NodeExtensionRecord::CategoryNode(r) => NodeExtension::CategoryNode(r),
            NodeExtensionRecord::RequirementNode(r) => {
                let skeleton = self
                    .stores
                    .skeletons
                    .get_skeleton(r.requirement_skeleton_id)
                    .await
                    .at_step(FanOutStep::LookupSkeleton)?
                    .ok_or_else(|| {
                        tracing::warn!(
                            "Requirement node {} references missing skeleton {}",
                            r.node_id,
                            r.requirement_skeleton_id
                        );
                        TreeServiceError::inconsistent_state(
                            r.node_id,
                            NodeType::RequirementNode,
                            format!(
                                "requirement skeleton {} not found",
                                r.requirement_skeleton_id
                            ),
                        )
                    })?;
                NodeExtension::RequirementNode(RequirementNode::resolve(r, skeleton))
            }
        };
        Ok(extension)
    }

    /// Node `id` with its extension and its whole ordered subtree
    ///
    /// The subtree is walked depth-first with an explicit stack, so stack
    /// usage does not grow with tree depth.
    pub async fn hydrate(&self, id: NodeId) -> Result<HydratedNode, TreeServiceError> {
        tracing::debug!("Hydrating training tree node {}", id);

        let root = self.require_node(id).await?;

        let mut visited: Vec<Visited> = Vec::new();
        // (node, depth below the requested node, index of the visited parent)
        let mut stack: Vec<(TreeNode, usize, Option<usize>)> = vec![(root, 0, None)];

        while let Some((node, depth, parent)) = stack.pop() {
            let node_id = node
                .id
                .ok_or_else(|| anyhow::anyhow!("Stored node without id"))
                .at_step(FanOutStep::LookupNode)?;

            let record = self.require_extension_record(&node, node_id).await?;
            let extension = self.resolve_extension(record).await?;

            let index = visited.len();
            visited.push(Visited {
                node,
                extension,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                visited[parent].children.push(index);
            }

            let children = self
                .stores
                .nodes
                .get_children(node_id)
                .await
                .at_step(FanOutStep::LookupChildren)?;
            if children.is_empty() {
                continue;
            }

            if let Some(max_depth) = self.config.max_depth {
                if depth >= max_depth {
                    return Err(TreeServiceError::depth_limit_exceeded(node_id, max_depth));
                }
            }

            // Reversed so the first child is popped first
            for child in children.into_iter().rev() {
                stack.push((child, depth + 1, Some(index)));
            }
        }

        // Children always sit at higher indices than their parent
        let mut built: Vec<Option<HydratedNode>> = (0..visited.len()).map(|_| None).collect();
        for (index, entry) in visited.into_iter().enumerate().rev() {
            let children = entry
                .children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[index] = Some(HydratedNode {
                node: entry.node,
                extension: entry.extension,
                children,
            });
        }

        built
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| TreeServiceError::node_not_found(id))
    }

    /// Delete node `id`: extension record, then generic row, then index entry
    ///
    /// Children are left in place. A missing extension record aborts before
    /// anything is deleted.
    pub async fn delete_cascade(&self, id: NodeId) -> Result<(), TreeServiceError> {
        tracing::debug!("Deleting training tree node {}", id);

        let node = self.require_node(id).await?;
        let record = self.require_extension_record(&node, id).await?;

        let extension_deleted = self
            .stores
            .extensions
            .delete(&record)
            .await
            .at_step(FanOutStep::DeleteExtension)?;
        if !extension_deleted {
            tracing::warn!("{} extension of node {} was already gone", node.node_type, id);
        }

        let node_deleted = self
            .stores
            .nodes
            .delete_node(id)
            .await
            .at_step(FanOutStep::DeleteNode)?;
        if !node_deleted {
            tracing::warn!("Training tree node {} was already gone", id);
        }
        self.stores
            .search
            .delete(id)
            .await
            .at_step(FanOutStep::DeleteIndexEntry)?;

        Ok(())
    }

    async fn insert_and_index(&self, node: TreeNode) -> Result<TreeNode, TreeServiceError> {
        let stored = self
            .stores
            .nodes
            .insert_node(node)
            .await
            .at_step(FanOutStep::InsertNode)?;
        self.stores
            .search
            .index(&stored)
            .await
            .at_step(FanOutStep::IndexNode)?;
        Ok(stored)
    }

    /// Insert a new node and mirror it into the search index
    pub async fn create(&self, node: TreeNode) -> Result<TreeNode, TreeServiceError> {
        tracing::debug!("Creating {} node", node.node_type);

        if node.id.is_some() {
            return Err(TreeServiceError::invalid_request(
                "id must not be pre-assigned",
            ));
        }
        self.insert_and_index(node).await
    }

    /// Replace an existing node; a node without id is created instead
    ///
    /// `node_type` cannot change: the extension record lives in the table of
    /// the stored type.
    pub async fn update(&self, node: TreeNode) -> Result<TreeNode, TreeServiceError> {
        let Some(id) = node.id else {
            return self.create(node).await;
        };
        tracing::debug!("Updating training tree node {}", id);

        let existing = self.require_node(id).await?;
        if existing.node_type != node.node_type {
            return Err(TreeServiceError::invalid_request(format!(
                "node_type of node {} cannot change from {} to {}",
                id, existing.node_type, node.node_type
            )));
        }

        let stored = self
            .stores
            .nodes
            .update_node(node)
            .await
            .at_step(FanOutStep::UpdateNode)?;
        self.stores
            .search
            .index(&stored)
            .await
            .at_step(FanOutStep::IndexNode)?;
        Ok(stored)
    }

    pub async fn create_or_update(&self, request: SaveRequest) -> Result<TreeNode, TreeServiceError> {
        match request {
            SaveRequest::Create(node) => self.create(node).await,
            SaveRequest::Update(node) => self.update(node).await,
        }
    }

    /// Create a node together with its extension record
    ///
    /// Order: insert node, save extension with the new node id, index node.
    /// Returns the hydrated node.
    pub async fn create_with_extension(
        &self,
        node: TreeNode,
        mut extension: NodeExtensionRecord,
    ) -> Result<HydratedNode, TreeServiceError> {
        tracing::debug!("Creating {} node with extension", node.node_type);

        if node.id.is_some() {
            return Err(TreeServiceError::invalid_request(
                "id must not be pre-assigned",
            ));
        }
        if extension.node_type() != node.node_type {
            return Err(TreeServiceError::invalid_request(format!(
                "{} extension does not match node_type {}",
                extension.node_type(),
                node.node_type
            )));
        }
        if extension.id().is_some() {
            return Err(TreeServiceError::invalid_request(
                "extension id must not be pre-assigned",
            ));
        }

        let stored = self
            .stores
            .nodes
            .insert_node(node)
            .await
            .at_step(FanOutStep::InsertNode)?;
        let id = stored
            .id
            .ok_or_else(|| anyhow::anyhow!("Node store returned a node without id"))
            .at_step(FanOutStep::InsertNode)?;

        extension.set_node_id(id);
        self.stores
            .extensions
            .save(extension)
            .await
            .at_step(FanOutStep::SaveExtension)?;
        self.stores
            .search
            .index(&stored)
            .await
            .at_step(FanOutStep::IndexNode)?;

        self.hydrate(id).await
    }

    /// Root node of a training, unhydrated
    pub async fn root_of(&self, training_id: NodeId) -> Result<TreeNode, TreeServiceError> {
        tracing::debug!("Looking up root node of training {}", training_id);

        self.stores
            .trainings
            .get_training(training_id)
            .await
            .at_step(FanOutStep::LookupTraining)?
            .ok_or_else(|| TreeServiceError::training_not_found(training_id))?;

        self.stores
            .nodes
            .get_training_root(training_id)
            .await
            .at_step(FanOutStep::LookupRoot)?
            .ok_or_else(|| TreeServiceError::root_not_found(training_id))
    }

    /// Direct children of `node_id`, unhydrated, in sibling order
    pub async fn children_of(&self, node_id: NodeId) -> Result<Vec<TreeNode>, TreeServiceError> {
        tracing::debug!("Looking up children of node {}", node_id);

        self.require_node(node_id).await?;
        self.stores
            .nodes
            .get_children(node_id)
            .await
            .at_step(FanOutStep::LookupChildren)
    }

    /// Every stored node, ascending id
    pub async fn list_all(&self) -> Result<Vec<TreeNode>, TreeServiceError> {
        tracing::debug!("Listing all training tree nodes");

        self.stores
            .nodes
            .list_nodes()
            .await
            .at_step(FanOutStep::ListNodes)
    }

    /// Nodes matching `query`, ascending id
    pub async fn search(&self, query: &str) -> Result<Vec<TreeNode>, TreeServiceError> {
        tracing::debug!("Searching training tree nodes for '{}'", query);

        SearchQuery::parse(query)
            .map_err(|e| TreeServiceError::invalid_request(e.to_string()))?;

        self.stores
            .search
            .search(query)
            .await
            .at_step(FanOutStep::Search)
    }
}

#[cfg(test)]
#[path = "tree_service_test.rs"]
mod tree_service_test;
