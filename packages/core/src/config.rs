/// Configuration for the tree service
use serde::{Deserialize, Serialize};

/// Tuning knobs for `TreeService`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeServiceConfig {
    /// Deepest level hydration may reach below the requested node
    ///
    /// `None` walks the whole subtree. A cyclic parent graph then never
    /// terminates, so set a bound when stored data is not trusted.
    #[serde(default)]
    pub max_depth: Option<usize>,
}

impl TreeServiceConfig {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == Some(0) {
            return Err("max_depth must be greater than 0 when set".to_string());
        }
        Ok(())
    }
}
