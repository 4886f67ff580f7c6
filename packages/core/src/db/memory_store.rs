//! In-Memory Stores
//!
//! Map-backed implementations of every store trait. Used by tests and by the
//! server when no database path is configured. Each store assigns ids from its
//! own counter starting at 1, like an auto-increment column.

use crate::db::{ExtensionStore, NodeStore, SkeletonStore, TrainingStore};
use crate::models::{ExtensionRecord, NodeId, RequirementSkeleton, Training, TreeNode};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Rows keyed by id plus the next id to hand out
struct Table<T> {
    rows: BTreeMap<NodeId, T>,
    next_id: NodeId,
}

impl<T> Table<T> {
    fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Keep the counter ahead of explicitly keyed rows
    fn reserve(&mut self, id: NodeId) {
        if id >= self.next_id {
            self.next_id = id + 1;
        }
    }
}

fn lock<T>(table: &Arc<Mutex<Table<T>>>) -> Result<MutexGuard<'_, Table<T>>> {
    table
        .lock()
        .map_err(|_| anyhow::anyhow!("Failed to acquire store lock"))
}

/// In-memory `NodeStore`
#[derive(Clone)]
pub struct MemoryNodeStore {
    nodes: Arc<Mutex<Table<TreeNode>>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(Mutex::new(Table::new())),
        }
    }

    /// Seed the store with rows that already carry ids
    ///
    /// Rows without id get one assigned.
    pub fn with_nodes(nodes: Vec<TreeNode>) -> Self {
        let mut table = Table::new();
        for mut node in nodes {
            let id = match node.id {
                Some(id) => {
                    table.reserve(id);
                    id
                }
                None => table.allocate_id(),
            };
            node.id = Some(id);
            table.rows.insert(id, node);
        }
        Self {
            nodes: Arc::new(Mutex::new(table)),
        }
    }
}

impl Default for MemoryNodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeStore for MemoryNodeStore {
    async fn get_node(&self, id: NodeId) -> Result<Option<TreeNode>> {
        Ok(lock(&self.nodes)?.rows.get(&id).cloned())
    }

    async fn list_nodes(&self) -> Result<Vec<TreeNode>> {
        Ok(lock(&self.nodes)?.rows.values().cloned().collect())
    }

    async fn get_children(&self, parent_id: NodeId) -> Result<Vec<TreeNode>> {
        let mut children: Vec<TreeNode> = lock(&self.nodes)?
            .rows
            .values()
            .filter(|node| node.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by_key(TreeNode::child_order_key);
        Ok(children)
    }

    async fn get_training_root(&self, training_id: NodeId) -> Result<Option<TreeNode>> {
        Ok(lock(&self.nodes)?
            .rows
            .values()
            .find(|node| node.training_id == Some(training_id) && node.is_root())
            .cloned())
    }

    async fn insert_node(&self, mut node: TreeNode) -> Result<TreeNode> {
        if let Some(id) = node.id {
            anyhow::bail!("Cannot insert node with pre-assigned id {}", id);
        }
        let mut table = lock(&self.nodes)?;
        let id = table.allocate_id();
        node.id = Some(id);
        table.rows.insert(id, node.clone());
        Ok(node)
    }

    async fn update_node(&self, node: TreeNode) -> Result<TreeNode> {
        let id = node
            .id
            .ok_or_else(|| anyhow::anyhow!("Cannot update node without id"))?;
        let mut table = lock(&self.nodes)?;
        match table.rows.get_mut(&id) {
            Some(row) => {
                *row = node.clone();
                Ok(node)
            }
            None => anyhow::bail!("Node not found: {}", id),
        }
    }

    async fn delete_node(&self, id: NodeId) -> Result<bool> {
        Ok(lock(&self.nodes)?.rows.remove(&id).is_some())
    }
}

/// In-memory `ExtensionStore` for one record type
pub struct MemoryExtensionStore<T> {
    records: Arc<Mutex<Table<T>>>,
}

impl<T: ExtensionRecord> MemoryExtensionStore<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Table::new())),
        }
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .map(|table| table.rows.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ExtensionRecord> Default for MemoryExtensionStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for MemoryExtensionStore<T> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

#[async_trait]
impl<T: ExtensionRecord> ExtensionStore<T> for MemoryExtensionStore<T> {
    async fn find_by_node(&self, node_id: NodeId) -> Result<Option<T>> {
        Ok(lock(&self.records)?
            .rows
            .values()
            .find(|record| record.node_id() == node_id)
            .cloned())
    }

    async fn save(&self, mut record: T) -> Result<T> {
        let mut table = lock(&self.records)?;
        let id = match record.id() {
            Some(id) => {
                table.reserve(id);
                id
            }
            None => table.allocate_id(),
        };
        record.set_id(id);
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: NodeId) -> Result<bool> {
        Ok(lock(&self.records)?.rows.remove(&id).is_some())
    }
}

/// In-memory `SkeletonStore`
#[derive(Clone)]
pub struct MemorySkeletonStore {
    skeletons: Arc<Mutex<Table<RequirementSkeleton>>>,
}

impl MemorySkeletonStore {
    pub fn new() -> Self {
        Self {
            skeletons: Arc::new(Mutex::new(Table::new())),
        }
    }
}

impl Default for MemorySkeletonStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SkeletonStore for MemorySkeletonStore {
    async fn get_skeleton(&self, id: NodeId) -> Result<Option<RequirementSkeleton>> {
        Ok(lock(&self.skeletons)?.rows.get(&id).cloned())
    }

    async fn save_skeleton(
        &self,
        mut skeleton: RequirementSkeleton,
    ) -> Result<RequirementSkeleton> {
        let mut table = lock(&self.skeletons)?;
        let id = match skeleton.id {
            Some(id) => {
                table.reserve(id);
                id
            }
            None => table.allocate_id(),
        };
        skeleton.id = Some(id);
        table.rows.insert(id, skeleton.clone());
        Ok(skeleton)
    }
}

/// In-memory `TrainingStore`
#[derive(Clone)]
pub struct MemoryTrainingStore {
    trainings: Arc<Mutex<Table<Training>>>,
}

impl MemoryTrainingStore {
    pub fn new() -> Self {
        Self {
            trainings: Arc::new(Mutex::new(Table::new())),
        }
    }
}

impl Default for MemoryTrainingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrainingStore for MemoryTrainingStore {
    async fn get_training(&self, id: NodeId) -> Result<Option<Training>> {
        Ok(lock(&self.trainings)?.rows.get(&id).cloned())
    }

    async fn save_training(&self, mut training: Training) -> Result<Training> {
        let mut table = lock(&self.trainings)?;
        let id = match training.id {
            Some(id) => {
                table.reserve(id);
                id
            }
            None => table.allocate_id(),
        };
        training.id = Some(id);
        table.rows.insert(id, training.clone());
        Ok(training)
    }
}
