//! Generic Training Tree Node
//!
//! Every node in a training tree is stored as one generic `TreeNode` row plus
//! exactly one extension record whose kind matches `node_type`. The generic row
//! only carries the tree structure; presentation data lives in the extension.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier assigned by the node store (and by every other store for its rows)
pub type NodeId = i64;

/// Presentation type of a tree node
///
/// Serialized with the variant name (`"CategoryNode"`, ...), matching both the
/// stored column value and the JSON exchanged over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    CustomSlideNode,
    BranchNode,
    RequirementNode,
    GeneratedSlideNode,
    CategoryNode,
}

impl NodeType {
    /// All node types, in declaration order
    pub const ALL: [NodeType; 5] = [
        NodeType::CustomSlideNode,
        NodeType::BranchNode,
        NodeType::RequirementNode,
        NodeType::GeneratedSlideNode,
        NodeType::CategoryNode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomSlideNode => "CustomSlideNode",
            Self::BranchNode => "BranchNode",
            Self::RequirementNode => "RequirementNode",
            Self::GeneratedSlideNode => "GeneratedSlideNode",
            Self::CategoryNode => "CategoryNode",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid node type: {}", s))
    }
}

/// Generic tree node row
///
/// `id` is `None` until the node store assigns one on insert. Children are not
/// part of the row; they are derived from `parent_id` of other rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub id: Option<NodeId>,
    pub node_type: NodeType,
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub training_id: Option<NodeId>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub anchor: Option<i32>,
}

impl TreeNode {
    /// Create an unsaved node of the given type
    pub fn new(node_type: NodeType) -> Self {
        Self {
            id: None,
            node_type,
            parent_id: None,
            training_id: None,
            sort_order: None,
            anchor: None,
        }
    }

    /// Create an unsaved root node for a training
    pub fn root(node_type: NodeType, training_id: NodeId) -> Self {
        Self {
            training_id: Some(training_id),
            ..Self::new(node_type)
        }
    }

    /// Create an unsaved child node under `parent_id`
    pub fn child(node_type: NodeType, parent_id: NodeId) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(node_type)
        }
    }

    pub fn with_training(mut self, training_id: NodeId) -> Self {
        self.training_id = Some(training_id);
        self
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_anchor(mut self, anchor: i32) -> Self {
        self.anchor = Some(anchor);
        self
    }

    /// A node without parent is the root of its training tree
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Sibling ordering key: nodes with a sort order first, then by id
    pub fn child_order_key(&self) -> (bool, Option<i32>, Option<NodeId>) {
        (self.sort_order.is_none(), self.sort_order, self.id)
    }
}
