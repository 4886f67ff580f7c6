//! TursoStore - Store Implementations for the libsql Backend
//!
//! Implements `NodeStore`, every `ExtensionStore<T>`, `SkeletonStore` and
//! `TrainingStore` on top of `DatabaseService`. Each method opens its own
//! connection and runs exactly one logical statement; there is no transaction
//! spanning several calls.
//!
//! # Examples
//!
//! ```rust,no_run
//! use trainingtree_core::db::{DatabaseService, NodeStore, TursoStore};
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(DatabaseService::new(PathBuf::from("./data/trainingtree.db")).await?);
//!     let store = TursoStore::new(db);
//!     let node = store.get_node(1).await?;
//!     Ok(())
//! }
//! ```

use crate::db::{
    DatabaseError, DatabaseService, ExtensionStore, NodeStore, SkeletonStore, TrainingStore,
};
use crate::models::{
    BranchNode, CategoryNode, CustomSlideNode, ExtensionRecord, GeneratedSlideNode, NodeId,
    NodeType, RequirementNodeRecord, RequirementSkeleton, Training, TreeNode,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use libsql::{Row, Value};
use std::sync::Arc;

const TREE_NODE_COLUMNS: &str = "id, node_type, parent_id, training_id, sort_order, anchor";

fn opt_int<T: Into<i64>>(value: Option<T>) -> Value {
    value
        .map(|v| Value::Integer(v.into()))
        .unwrap_or(Value::Null)
}

fn opt_text(value: Option<&str>) -> Value {
    value
        .map(|v| Value::Text(v.to_string()))
        .unwrap_or(Value::Null)
}

fn opt_i32(
    row: &Row,
    idx: i32,
    table: &'static str,
    column: &'static str,
) -> Result<Option<i32>> {
    let raw: Option<i64> = row
        .get(idx)
        .with_context(|| format!("Failed to get {}.{}", table, column))?;
    raw.map(|v| {
        i32::try_from(v).map_err(|_| {
            anyhow::Error::from(DatabaseError::invalid_stored_value(table, column, v.to_string()))
        })
    })
    .transpose()
}

/// Mapping between an extension record type and its table
///
/// Rows are always selected as `id, node_id, <COLUMNS...>`.
pub trait ExtensionTable: ExtensionRecord {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];

    /// Values for `COLUMNS`, in order
    fn column_values(&self) -> Vec<Value>;

    fn from_row(row: &Row) -> Result<Self>;
}

impl ExtensionTable for CustomSlideNode {
    const TABLE: &'static str = "training_custom_slide_node";
    const COLUMNS: &'static [&'static str] = &["name", "content", "anchor"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            opt_text(self.content.as_deref()),
            opt_int(self.anchor),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: Some(row.get(0).context("Failed to get id")?),
            node_id: row.get(1).context("Failed to get node_id")?,
            name: row.get(2).context("Failed to get name")?,
            content: row.get(3).context("Failed to get content")?,
            anchor: opt_i32(row, 4, Self::TABLE, "anchor")?,
        })
    }
}

impl ExtensionTable for BranchNode {
    const TABLE: &'static str = "training_branch_node";
    const COLUMNS: &'static [&'static str] = &["name", "anchor"];

    fn column_values(&self) -> Vec<Value> {
        vec![Value::Text(self.name.clone()), opt_int(self.anchor)]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: Some(row.get(0).context("Failed to get id")?),
            node_id: row.get(1).context("Failed to get node_id")?,
            name: row.get(2).context("Failed to get name")?,
            anchor: opt_i32(row, 3, Self::TABLE, "anchor")?,
        })
    }
}

impl ExtensionTable for RequirementNodeRecord {
    const TABLE: &'static str = "training_requirement_node";
    const COLUMNS: &'static [&'static str] = &["requirement_skeleton_id", "anchor"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Integer(self.requirement_skeleton_id),
            opt_int(self.anchor),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: Some(row.get(0).context("Failed to get id")?),
            node_id: row.get(1).context("Failed to get node_id")?,
            requirement_skeleton_id: row
                .get(2)
                .context("Failed to get requirement_skeleton_id")?,
            anchor: opt_i32(row, 3, Self::TABLE, "anchor")?,
        })
    }
}

impl ExtensionTable for GeneratedSlideNode {
    const TABLE: &'static str = "training_generated_slide_node";
    const COLUMNS: &'static [&'static str] = &["opt_column_id", "anchor"];

    fn column_values(&self) -> Vec<Value> {
        vec![opt_int(self.opt_column_id), opt_int(self.anchor)]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: Some(row.get(0).context("Failed to get id")?),
            node_id: row.get(1).context("Failed to get node_id")?,
            opt_column_id: row.get(2).context("Failed to get opt_column_id")?,
            anchor: opt_i32(row, 3, Self::TABLE, "anchor")?,
        })
    }
}

impl ExtensionTable for CategoryNode {
    const TABLE: &'static str = "training_category_node";
    const COLUMNS: &'static [&'static str] = &["name", "category_id", "anchor"];

    fn column_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            opt_int(self.category_id),
            opt_int(self.anchor),
        ]
    }

    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: Some(row.get(0).context("Failed to get id")?),
            node_id: row.get(1).context("Failed to get node_id")?,
            name: row.get(2).context("Failed to get name")?,
            category_id: row.get(3).context("Failed to get category_id")?,
            anchor: opt_i32(row, 4, Self::TABLE, "anchor")?,
        })
    }
}

/// libsql-backed implementation of every store trait
#[derive(Clone)]
pub struct TursoStore {
    db: Arc<DatabaseService>,
}

impl TursoStore {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    /// Convert a `training_tree_node` row (selected as `TREE_NODE_COLUMNS`)
    fn row_to_node(row: &Row) -> Result<TreeNode> {
        let id: i64 = row.get(0).context("Failed to get id")?;
        let node_type_str: String = row.get(1).context("Failed to get node_type")?;
        let node_type: NodeType = node_type_str.parse().map_err(|_| {
            DatabaseError::invalid_stored_value("training_tree_node", "node_type", node_type_str)
        })?;

        Ok(TreeNode {
            id: Some(id),
            node_type,
            parent_id: row.get(2).context("Failed to get parent_id")?,
            training_id: row.get(3).context("Failed to get training_id")?,
            sort_order: opt_i32(row, 4, "training_tree_node", "sort_order")?,
            anchor: opt_i32(row, 5, "training_tree_node", "anchor")?,
        })
    }

    async fn query_nodes(&self, sql: &str, params: Vec<Value>) -> Result<Vec<TreeNode>> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(sql, params)
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query nodes: {}", e)))?;

        let mut nodes = Vec::new();
        while let Some(row) = rows.next().await? {
            nodes.push(Self::row_to_node(&row)?);
        }
        Ok(nodes)
    }

    fn node_values(node: &TreeNode) -> Vec<Value> {
        vec![
            Value::Text(node.node_type.to_string()),
            opt_int(node.parent_id),
            opt_int(node.training_id),
            opt_int(node.sort_order),
            opt_int(node.anchor),
        ]
    }
}

#[async_trait]
impl NodeStore for TursoStore {
    async fn get_node(&self, id: NodeId) -> Result<Option<TreeNode>> {
        let sql = format!(
            "SELECT {} FROM training_tree_node WHERE id = ?",
            TREE_NODE_COLUMNS
        );
        Ok(self
            .query_nodes(&sql, vec![Value::Integer(id)])
            .await?
            .into_iter()
            .next())
    }

    async fn list_nodes(&self) -> Result<Vec<TreeNode>> {
        let sql = format!(
            "SELECT {} FROM training_tree_node ORDER BY id",
            TREE_NODE_COLUMNS
        );
        self.query_nodes(&sql, Vec::new()).await
    }

    async fn get_children(&self, parent_id: NodeId) -> Result<Vec<TreeNode>> {
        let sql = format!(
            "SELECT {} FROM training_tree_node WHERE parent_id = ?
             ORDER BY sort_order IS NULL, sort_order, id",
            TREE_NODE_COLUMNS
        );
        self.query_nodes(&sql, vec![Value::Integer(parent_id)])
            .await
    }

    async fn get_training_root(&self, training_id: NodeId) -> Result<Option<TreeNode>> {
        let sql = format!(
            "SELECT {} FROM training_tree_node
             WHERE training_id = ? AND parent_id IS NULL
             ORDER BY id LIMIT 1",
            TREE_NODE_COLUMNS
        );
        Ok(self
            .query_nodes(&sql, vec![Value::Integer(training_id)])
            .await?
            .into_iter()
            .next())
    }

    async fn insert_node(&self, mut node: TreeNode) -> Result<TreeNode> {
        if let Some(id) = node.id {
            anyhow::bail!("Cannot insert node with pre-assigned id {}", id);
        }

        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT INTO training_tree_node (node_type, parent_id, training_id, sort_order, anchor)
             VALUES (?, ?, ?, ?, ?)",
            Self::node_values(&node),
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to insert node: {}", e)))?;

        node.id = Some(conn.last_insert_rowid());
        Ok(node)
    }

    async fn update_node(&self, node: TreeNode) -> Result<TreeNode> {
        let id = node
            .id
            .ok_or_else(|| anyhow::anyhow!("Cannot update node without id"))?;

        let mut params = Self::node_values(&node);
        params.push(Value::Integer(id));

        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute(
                "UPDATE training_tree_node
                 SET node_type = ?, parent_id = ?, training_id = ?, sort_order = ?, anchor = ?
                 WHERE id = ?",
                params,
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to update node: {}", e)))?;

        if affected == 0 {
            anyhow::bail!("Node not found: {}", id);
        }
        Ok(node)
    }

    async fn delete_node(&self, id: NodeId) -> Result<bool> {
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn
            .execute("DELETE FROM training_tree_node WHERE id = ?", [id])
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to delete node: {}", e)))?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl<T: ExtensionTable> ExtensionStore<T> for TursoStore {
    async fn find_by_node(&self, node_id: NodeId) -> Result<Option<T>> {
        let sql = format!(
            "SELECT id, node_id, {} FROM {} WHERE node_id = ? ORDER BY id LIMIT 1",
            T::COLUMNS.join(", "),
            T::TABLE
        );
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn.query(&sql, [node_id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to query {}: {}", T::TABLE, e))
        })?;

        match rows.next().await? {
            Some(row) => Ok(Some(T::from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, mut record: T) -> Result<T> {
        let conn = self.db.connect_with_timeout().await?;

        let mut values = vec![Value::Integer(record.node_id())];
        values.extend(record.column_values());

        match record.id() {
            Some(id) => {
                let assignments = std::iter::once("node_id")
                    .chain(T::COLUMNS.iter().copied())
                    .map(|column| format!("{} = ?", column))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!("UPDATE {} SET {} WHERE id = ?", T::TABLE, assignments);

                let mut params = values.clone();
                params.push(Value::Integer(id));
                let affected = conn.execute(&sql, params).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to update {}: {}", T::TABLE, e))
                })?;

                if affected == 0 {
                    let sql = format!(
                        "INSERT INTO {} (id, node_id, {}) VALUES (?, ?, {})",
                        T::TABLE,
                        T::COLUMNS.join(", "),
                        vec!["?"; T::COLUMNS.len()].join(", ")
                    );
                    let mut params = vec![Value::Integer(id)];
                    params.extend(values);
                    conn.execute(&sql, params).await.map_err(|e| {
                        DatabaseError::sql_execution(format!(
                            "Failed to insert {}: {}",
                            T::TABLE,
                            e
                        ))
                    })?;
                }
            }
            None => {
                let sql = format!(
                    "INSERT INTO {} (node_id, {}) VALUES (?, {})",
                    T::TABLE,
                    T::COLUMNS.join(", "),
                    vec!["?"; T::COLUMNS.len()].join(", ")
                );
                conn.execute(&sql, values).await.map_err(|e| {
                    DatabaseError::sql_execution(format!("Failed to insert {}: {}", T::TABLE, e))
                })?;
                record.set_id(conn.last_insert_rowid());
            }
        }

        Ok(record)
    }

    async fn delete(&self, id: NodeId) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
        let conn = self.db.connect_with_timeout().await?;
        let affected = conn.execute(&sql, [id]).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to delete from {}: {}", T::TABLE, e))
        })?;
        Ok(affected > 0)
    }
}

#[async_trait]
impl SkeletonStore for TursoStore {
    async fn get_skeleton(&self, id: NodeId) -> Result<Option<RequirementSkeleton>> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                "SELECT id, universal_id, short_name, description, show_order, active
                 FROM requirement_skeleton WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| {
                DatabaseError::sql_execution(format!("Failed to query requirement_skeleton: {}", e))
            })?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let active: i64 = row.get(5).context("Failed to get active")?;
        Ok(Some(RequirementSkeleton {
            id: Some(row.get(0).context("Failed to get id")?),
            universal_id: row.get(1).context("Failed to get universal_id")?,
            short_name: row.get(2).context("Failed to get short_name")?,
            description: row.get(3).context("Failed to get description")?,
            show_order: opt_i32(&row, 4, "requirement_skeleton", "show_order")?,
            active: active != 0,
        }))
    }

    async fn save_skeleton(
        &self,
        mut skeleton: RequirementSkeleton,
    ) -> Result<RequirementSkeleton> {
        let conn = self.db.connect_with_timeout().await?;
        let values = vec![
            opt_int(skeleton.id),
            opt_text(skeleton.universal_id.as_deref()),
            Value::Text(skeleton.short_name.clone()),
            opt_text(skeleton.description.as_deref()),
            opt_int(skeleton.show_order),
            Value::Integer(i64::from(skeleton.active)),
        ];
        conn.execute(
            "INSERT OR REPLACE INTO requirement_skeleton
                (id, universal_id, short_name, description, show_order, active)
             VALUES (?, ?, ?, ?, ?, ?)",
            values,
        )
        .await
        .map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to save requirement_skeleton: {}", e))
        })?;

        if skeleton.id.is_none() {
            skeleton.id = Some(conn.last_insert_rowid());
        }
        Ok(skeleton)
    }
}

#[async_trait]
impl TrainingStore for TursoStore {
    async fn get_training(&self, id: NodeId) -> Result<Option<Training>> {
        let conn = self.db.connect_with_timeout().await?;
        let mut rows = conn
            .query(
                "SELECT id, name, description FROM training WHERE id = ?",
                [id],
            )
            .await
            .map_err(|e| DatabaseError::sql_execution(format!("Failed to query training: {}", e)))?;

        match rows.next().await? {
            Some(row) => Ok(Some(Training {
                id: Some(row.get(0).context("Failed to get id")?),
                name: row.get(1).context("Failed to get name")?,
                description: row.get(2).context("Failed to get description")?,
            })),
            None => Ok(None),
        }
    }

    async fn save_training(&self, mut training: Training) -> Result<Training> {
        let conn = self.db.connect_with_timeout().await?;
        conn.execute(
            "INSERT OR REPLACE INTO training (id, name, description) VALUES (?, ?, ?)",
            vec![
                opt_int(training.id),
                Value::Text(training.name.clone()),
                opt_text(training.description.as_deref()),
            ],
        )
        .await
        .map_err(|e| DatabaseError::sql_execution(format!("Failed to save training: {}", e)))?;

        if training.id.is_none() {
            training.id = Some(conn.last_insert_rowid());
        }
        Ok(training)
    }
}
