//! Data Models
//!
//! - `TreeNode` - generic tree row shared by all node types
//! - Extension records - one shape per `NodeType`, stored in separate tables
//! - `HydratedNode` - generic row + resolved extension + children
//! - `Training` - aggregate owning a training tree

mod extension;
mod hydrated;
mod training;
mod tree_node;

pub use extension::{
    BranchNode, CategoryNode, CustomSlideNode, ExtensionRecord, GeneratedSlideNode,
    NodeExtension, NodeExtensionRecord, RequirementNode, RequirementNodeRecord,
    RequirementSkeleton,
};
pub use hydrated::HydratedNode;
pub use training::Training;
pub use tree_node::{NodeId, NodeType, TreeNode};
