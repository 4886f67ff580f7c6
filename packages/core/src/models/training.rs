use crate::models::NodeId;
use serde::{Deserialize, Serialize};

/// Training aggregate owning exactly one root tree node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Training {
    #[serde(default)]
    pub id: Option<NodeId>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Training {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: None,
        }
    }
}
