//! Search index persisted in the `tree_node_search` table
//!
//! Each indexed node is stored as a JSON document keyed by node id. Queries
//! are parsed with `SearchQuery` and evaluated over the stored documents.

use crate::db::{DatabaseError, DatabaseService, SearchIndex, SearchQuery};
use crate::models::{NodeId, TreeNode};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Clone)]
pub struct TursoSearchIndex {
    db: Arc<DatabaseService>,
}

impl TursoSearchIndex {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SearchIndex for TursoSearchIndex {
    async fn index(&self, node: &TreeNode) -> Result<()> {
        let id = node
            .id
            .ok_or_else(|| anyhow::anyhow!("Cannot index a node without id"))?;
        let document = serde_json::to_string(node).context("Failed to serialize search document")?;

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO tree_node_search (node_id, document) VALUES (?, ?)
             ON CONFLICT(node_id) DO UPDATE SET document = excluded.document",
            (id, document),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to index node {}: {}", id, e)))?;
        Ok(())
    }

    async fn delete(&self, id: NodeId) -> Result<()> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute("DELETE FROM tree_node_search WHERE node_id = ?", [id])
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to unindex node {}: {}", id, e))
            })?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<TreeNode>> {
        let query = SearchQuery::parse(query)?;

        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query("SELECT document FROM tree_node_search ORDER BY node_id", ())
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to read search index: {}", e)))?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next().await? {
            let raw: String = row.get(0).context("Failed to get document")?;
            let node: TreeNode = serde_json::from_str(&raw).map_err(|_| {
                DatabaseError::invalid_stored_value("tree_node_search", "document", raw.clone())
            })?;
            documents.push(node);
        }

        Ok(query.filter(documents))
    }
}
