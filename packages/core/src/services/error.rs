//! Service Layer Error Types
//!
//! Errors reported by `TreeService`. Collaborator failures are wrapped in
//! `StorageFailure` together with the fan-out step that produced them.

use crate::models::{NodeId, NodeType};
use std::fmt;
use thiserror::Error;

/// Collaborator call made by a `TreeService` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOutStep {
    LookupNode,
    LookupChildren,
    LookupExtension,
    LookupSkeleton,
    LookupTraining,
    LookupRoot,
    ListNodes,
    InsertNode,
    UpdateNode,
    SaveExtension,
    DeleteExtension,
    DeleteNode,
    IndexNode,
    DeleteIndexEntry,
    Search,
}

impl FanOutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LookupNode => "lookup node",
            Self::LookupChildren => "lookup children",
            Self::LookupExtension => "lookup extension",
            Self::LookupSkeleton => "lookup requirement skeleton",
            Self::LookupTraining => "lookup training",
            Self::LookupRoot => "lookup root",
            Self::ListNodes => "list nodes",
            Self::InsertNode => "insert node",
            Self::UpdateNode => "update node",
            Self::SaveExtension => "save extension",
            Self::DeleteExtension => "delete extension",
            Self::DeleteNode => "delete node",
            Self::IndexNode => "index node",
            Self::DeleteIndexEntry => "delete index entry",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for FanOutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tree service operation errors
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Node not found by ID
    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// Training not found by ID
    #[error("Training not found: {id}")]
    TrainingNotFound { id: NodeId },

    /// Training exists but has no root node
    #[error("No root node for training {training_id}")]
    RootNotFound { training_id: NodeId },

    /// Stored data violates the one-extension-per-node rule
    #[error("Inconsistent state for {node_type} node {node_id}: {context}")]
    InconsistentState {
        node_id: NodeId,
        node_type: NodeType,
        context: String,
    },

    /// Request rejected before touching any store
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A collaborator call failed; earlier steps are not rolled back
    #[error("Storage failure during {step}: {source}")]
    StorageFailure {
        step: FanOutStep,
        #[source]
        source: anyhow::Error,
    },

    /// Hydration walked deeper than the configured bound
    #[error("Depth limit {max_depth} exceeded below node {node_id}")]
    DepthLimitExceeded { node_id: NodeId, max_depth: usize },

    /// Service configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl TreeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: NodeId) -> Self {
        Self::NodeNotFound { id }
    }

    /// Create a training not found error
    pub fn training_not_found(id: NodeId) -> Self {
        Self::TrainingNotFound { id }
    }

    /// Create a root not found error
    pub fn root_not_found(training_id: NodeId) -> Self {
        Self::RootNotFound { training_id }
    }

    /// Create an inconsistent state error
    pub fn inconsistent_state(
        node_id: NodeId,
        node_type: NodeType,
        context: impl Into<String>,
    ) -> Self {
        Self::InconsistentState {
            node_id,
            node_type,
            context: context.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a storage failure error for `step`
    pub fn storage_failure(step: FanOutStep, source: anyhow::Error) -> Self {
        Self::StorageFailure { step, source }
    }

    /// Create a depth limit error
    pub fn depth_limit_exceeded(node_id: NodeId, max_depth: usize) -> Self {
        Self::DepthLimitExceeded { node_id, max_depth }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True for the not-found family of errors
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NodeNotFound { .. } | Self::TrainingNotFound { .. } | Self::RootNotFound { .. }
        )
    }

    /// Fan-out step of a storage failure
    pub fn failed_step(&self) -> Option<FanOutStep> {
        match self {
            Self::StorageFailure { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Attach a fan-out step to a collaborator result
pub(crate) trait StepContext<T> {
    fn at_step(self, step: FanOutStep) -> Result<T, TreeServiceError>;
}

impl<T> StepContext<T> for anyhow::Result<T> {
    fn at_step(self, step: FanOutStep) -> Result<T, TreeServiceError> {
        self.map_err(|e| TreeServiceError::storage_failure(step, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TreeServiceError::node_not_found(42);
        assert_eq!(err.to_string(), "Node not found: 42");
        assert!(err.is_not_found());

        let err = TreeServiceError::inconsistent_state(7, NodeType::BranchNode, "missing extension");
        assert_eq!(
            err.to_string(),
            "Inconsistent state for BranchNode node 7: missing extension"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_storage_failure_names_step() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("disk full"));
        let err = result.at_step(FanOutStep::DeleteNode).unwrap_err();

        assert_eq!(err.failed_step(), Some(FanOutStep::DeleteNode));
        assert_eq!(err.to_string(), "Storage failure during delete node: disk full");
    }
}
