//! Node Extension Records
//!
//! Each `NodeType` has its own extension table holding the presentation data of
//! a node. The stored shapes are the `*Node` structs below (plus
//! `RequirementNodeRecord`); `NodeExtensionRecord` is the sum over the stored
//! shapes and `NodeExtension` the sum over the hydrated shapes handed to
//! callers.
//!
//! The only difference between stored and hydrated shapes is the requirement
//! extension: the stored record references its skeleton by id, the hydrated
//! `RequirementNode` carries the resolved `RequirementSkeleton`.

use crate::models::{NodeId, NodeType};
use serde::{Deserialize, Serialize};

/// Common accessors over extension rows, used by the generic stores
pub trait ExtensionRecord: Clone + Send + Sync + 'static {
    /// Node type this extension belongs to
    const NODE_TYPE: NodeType;

    fn id(&self) -> Option<NodeId>;
    fn set_id(&mut self, id: NodeId);
    fn node_id(&self) -> NodeId;
    fn set_node_id(&mut self, node_id: NodeId);
}

/// Free-form slide written by the training author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSlideNode {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub node_id: NodeId,
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub anchor: Option<i32>,
}

/// Named branch grouping further slides
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchNode {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub node_id: NodeId,
    pub name: String,
    #[serde(default)]
    pub anchor: Option<i32>,
}

/// Stored requirement extension, referencing its skeleton by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementNodeRecord {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub node_id: NodeId,
    pub requirement_skeleton_id: NodeId,
    #[serde(default)]
    pub anchor: Option<i32>,
}

/// Slide generated from a requirement option column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedSlideNode {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub node_id: NodeId,
    #[serde(default)]
    pub opt_column_id: Option<NodeId>,
    #[serde(default)]
    pub anchor: Option<i32>,
}

/// Category heading, optionally bound to a catalogue category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub node_id: NodeId,
    pub name: String,
    #[serde(default)]
    pub category_id: Option<NodeId>,
    #[serde(default)]
    pub anchor: Option<i32>,
}

/// Catalogue requirement presented by a requirement node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSkeleton {
    #[serde(default)]
    pub id: Option<NodeId>,
    #[serde(default)]
    pub universal_id: Option<String>,
    pub short_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub show_order: Option<i32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl RequirementSkeleton {
    pub fn new(short_name: impl Into<String>) -> Self {
        Self {
            id: None,
            universal_id: None,
            short_name: short_name.into(),
            description: None,
            show_order: None,
            active: true,
        }
    }
}

/// Hydrated requirement extension with the skeleton resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementNode {
    pub id: Option<NodeId>,
    #[serde(default)]
    pub node_id: NodeId,
    pub requirement_skeleton: RequirementSkeleton,
    pub anchor: Option<i32>,
}

impl RequirementNode {
    pub fn resolve(record: RequirementNodeRecord, skeleton: RequirementSkeleton) -> Self {
        Self {
            id: record.id,
            node_id: record.node_id,
            requirement_skeleton: skeleton,
            anchor: record.anchor,
        }
    }
}

macro_rules! impl_extension_record {
    ($ty:ty, $node_type:expr) => {
        impl ExtensionRecord for $ty {
            const NODE_TYPE: NodeType = $node_type;

            fn id(&self) -> Option<NodeId> {
                self.id
            }

            fn set_id(&mut self, id: NodeId) {
                self.id = Some(id);
            }

            fn node_id(&self) -> NodeId {
                self.node_id
            }

            fn set_node_id(&mut self, node_id: NodeId) {
                self.node_id = node_id;
            }
        }
    };
}

impl_extension_record!(CustomSlideNode, NodeType::CustomSlideNode);
impl_extension_record!(BranchNode, NodeType::BranchNode);
impl_extension_record!(RequirementNodeRecord, NodeType::RequirementNode);
impl_extension_record!(GeneratedSlideNode, NodeType::GeneratedSlideNode);
impl_extension_record!(CategoryNode, NodeType::CategoryNode);

/// Stored extension row of any node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeExtensionRecord {
    CustomSlideNode(CustomSlideNode),
    BranchNode(BranchNode),
    RequirementNode(RequirementNodeRecord),
    GeneratedSlideNode(GeneratedSlideNode),
    CategoryNode(CategoryNode),
}

impl NodeExtensionRecord {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::CustomSlideNode(_) => CustomSlideNode::NODE_TYPE,
            Self::BranchNode(_) => BranchNode::NODE_TYPE,
            Self::RequirementNode(_) => RequirementNodeRecord::NODE_TYPE,
            Self::GeneratedSlideNode(_) => GeneratedSlideNode::NODE_TYPE,
            Self::CategoryNode(_) => CategoryNode::NODE_TYPE,
        }
    }

    pub fn id(&self) -> Option<NodeId> {
        match self {
            Self::CustomSlideNode(r) => r.id(),
            Self::BranchNode(r) => r.id(),
            Self::RequirementNode(r) => r.id(),
            Self::GeneratedSlideNode(r) => r.id(),
            Self::CategoryNode(r) => r.id(),
        }
    }

    pub fn node_id(&self) -> NodeId {
        match self {
            Self::CustomSlideNode(r) => r.node_id(),
            Self::BranchNode(r) => r.node_id(),
            Self::RequirementNode(r) => r.node_id(),
            Self::GeneratedSlideNode(r) => r.node_id(),
            Self::CategoryNode(r) => r.node_id(),
        }
    }

    pub fn set_node_id(&mut self, node_id: NodeId) {
        match self {
            Self::CustomSlideNode(r) => r.set_node_id(node_id),
            Self::BranchNode(r) => r.set_node_id(node_id),
            Self::RequirementNode(r) => r.set_node_id(node_id),
            Self::GeneratedSlideNode(r) => r.set_node_id(node_id),
            Self::CategoryNode(r) => r.set_node_id(node_id),
        }
    }
}

/// Hydrated extension attached to a node handed out by the tree service
///
/// Flattened into the node JSON, so exactly one of `customSlideNode`,
/// `branchNode`, `requirementNode`, `generatedSlideNode` or `categoryNode`
/// appears next to the generic fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeExtension {
    CustomSlideNode(CustomSlideNode),
    BranchNode(BranchNode),
    RequirementNode(RequirementNode),
    GeneratedSlideNode(GeneratedSlideNode),
    CategoryNode(CategoryNode),
}

impl NodeExtension {
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::CustomSlideNode(_) => NodeType::CustomSlideNode,
            Self::BranchNode(_) => NodeType::BranchNode,
            Self::RequirementNode(_) => NodeType::RequirementNode,
            Self::GeneratedSlideNode(_) => NodeType::GeneratedSlideNode,
            Self::CategoryNode(_) => NodeType::CategoryNode,
        }
    }
}
