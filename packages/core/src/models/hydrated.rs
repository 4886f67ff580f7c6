//! Hydrated Tree Representation
//!
//! A `HydratedNode` is what the tree service hands out for a single node read:
//! the generic row, its resolved extension and every descendant, recursively.

use crate::models::{
    BranchNode, CategoryNode, CustomSlideNode, GeneratedSlideNode, NodeExtension, NodeId,
    NodeType, RequirementNode, TreeNode,
};
use serde::{Deserialize, Serialize};

/// Fully composed tree node
///
/// Serializes with the generic fields and the single extension key flattened
/// into one object, followed by `children`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HydratedNode {
    #[serde(flatten)]
    pub node: TreeNode,
    #[serde(flatten)]
    pub extension: NodeExtension,
    pub children: Vec<HydratedNode>,
}

impl HydratedNode {
    pub fn id(&self) -> Option<NodeId> {
        self.node.id
    }

    pub fn node_type(&self) -> NodeType {
        self.node.node_type
    }

    pub fn custom_slide_node(&self) -> Option<&CustomSlideNode> {
        match &self.extension {
            NodeExtension::CustomSlideNode(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn branch_node(&self) -> Option<&BranchNode> {
        match &self.extension {
            NodeExtension::BranchNode(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn requirement_node(&self) -> Option<&RequirementNode> {
        match &self.extension {
            NodeExtension::RequirementNode(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn generated_slide_node(&self) -> Option<&GeneratedSlideNode> {
        match &self.extension {
            NodeExtension::GeneratedSlideNode(ext) => Some(ext),
            _ => None,
        }
    }

    pub fn category_node(&self) -> Option<&CategoryNode> {
        match &self.extension {
            NodeExtension::CategoryNode(ext) => Some(ext),
            _ => None,
        }
    }

    /// Number of nodes in this subtree, including `self`
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(node.children.iter());
        }
        count
    }

    /// Depth of this subtree; a leaf has depth 1
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            pending.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}
