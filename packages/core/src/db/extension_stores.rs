//! Extension Store Bundle
//!
//! Holds the five per-type extension stores and owns the single place where a
//! `NodeType` is dispatched to its store. Callers work with
//! `NodeExtensionRecord` and never match on the node type themselves.

use crate::db::ExtensionStore;
use crate::models::{
    BranchNode, CategoryNode, CustomSlideNode, GeneratedSlideNode, NodeExtensionRecord, NodeId,
    NodeType, RequirementNodeRecord,
};
use anyhow::Result;
use std::sync::Arc;

/// The five extension stores, one per node type
#[derive(Clone)]
pub struct ExtensionStores {
    pub custom_slides: Arc<dyn ExtensionStore<CustomSlideNode>>,
    pub branches: Arc<dyn ExtensionStore<BranchNode>>,
    pub requirements: Arc<dyn ExtensionStore<RequirementNodeRecord>>,
    pub generated_slides: Arc<dyn ExtensionStore<GeneratedSlideNode>>,
    pub categories: Arc<dyn ExtensionStore<CategoryNode>>,
}

impl ExtensionStores {
    /// Bundle a single backend implementing every extension store
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: ExtensionStore<CustomSlideNode>
            + ExtensionStore<BranchNode>
            + ExtensionStore<RequirementNodeRecord>
            + ExtensionStore<GeneratedSlideNode>
            + ExtensionStore<CategoryNode>
            + 'static,
    {
        Self {
            custom_slides: backend.clone(),
            branches: backend.clone(),
            requirements: backend.clone(),
            generated_slides: backend.clone(),
            categories: backend,
        }
    }

    /// Extension row of `node_id` from the store selected by `node_type`
    pub async fn find(
        &self,
        node_type: NodeType,
        node_id: NodeId,
    ) -> Result<Option<NodeExtensionRecord>> {
        let record = match node_type {
            NodeType::CustomSlideNode => self
                .custom_slides
                .find_by_node(node_id)
                .await?
                .map(NodeExtensionRecord::CustomSlideNode),
            NodeType::BranchNode => self
                .branches
                .find_by_node(node_id)
                .await?
                .map(NodeExtensionRecord::BranchNode),
            NodeType::RequirementNode => self
                .requirements
                .find_by_node(node_id)
                .await?
                .map(NodeExtensionRecord::RequirementNode),
            NodeType::GeneratedSlideNode => self
                .generated_slides
                .find_by_node(node_id)
                .await?
                .map(NodeExtensionRecord::GeneratedSlideNode),
            NodeType::CategoryNode => self
                .categories
                .find_by_node(node_id)
                .await?
                .map(NodeExtensionRecord::CategoryNode),
        };
        Ok(record)
    }

    /// Save a record into the store matching its variant
    pub async fn save(&self, record: NodeExtensionRecord) -> Result<NodeExtensionRecord> {
        let saved = match record {
            NodeExtensionRecord::CustomSlideNode(r) => {
                NodeExtensionRecord::CustomSlideNode(self.custom_slides.save(r).await?)
            }
            NodeExtensionRecord::BranchNode(r) => {
                NodeExtensionRecord::BranchNode(self.branches.save(r).await?)
            }
            NodeExtensionRecord::RequirementNode(r) => {
                NodeExtensionRecord::RequirementNode(self.requirements.save(r).await?)
            }
            NodeExtensionRecord::GeneratedSlideNode(r) => {
                NodeExtensionRecord::GeneratedSlideNode(self.generated_slides.save(r).await?)
            }
            NodeExtensionRecord::CategoryNode(r) => {
                NodeExtensionRecord::CategoryNode(self.categories.save(r).await?)
            }
        };
        Ok(saved)
    }

    /// Delete a stored record from the store matching its variant
    ///
    /// # Errors
    ///
    /// Fails if the record was never saved (no id).
    pub async fn delete(&self, record: &NodeExtensionRecord) -> Result<bool> {
        let id = record.id().ok_or_else(|| {
            anyhow::anyhow!(
                "{} extension of node {} has no id",
                record.node_type(),
                record.node_id()
            )
        })?;

        match record.node_type() {
            NodeType::CustomSlideNode => self.custom_slides.delete(id).await,
            NodeType::BranchNode => self.branches.delete(id).await,
            NodeType::RequirementNode => self.requirements.delete(id).await,
            NodeType::GeneratedSlideNode => self.generated_slides.delete(id).await,
            NodeType::CategoryNode => self.categories.delete(id).await,
        }
    }
}
