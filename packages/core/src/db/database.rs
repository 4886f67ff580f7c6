//! Database Service - libsql Connection and Schema Management
//!
//! Owns the embedded libsql database file and creates the relational schema
//! mirrored from the SecurityRAT tables:
//!
//! - `training` and `requirement_skeleton` (referenced aggregates)
//! - `training_tree_node` (generic rows)
//! - one table per node type for extension rows
//! - `tree_node_search` (search index documents)
//!
//! `training_tree_node.parent_id` deliberately carries no foreign key: deleting
//! a node leaves its children pointing at the removed id.

use crate::db::DatabaseError;
use libsql::{Builder, Database};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SCHEMA: &[(&str, &str)] = &[
    (
        "training",
        "CREATE TABLE IF NOT EXISTS training (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT
        )",
    ),
    (
        "requirement_skeleton",
        "CREATE TABLE IF NOT EXISTS requirement_skeleton (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            universal_id TEXT,
            short_name TEXT NOT NULL,
            description TEXT,
            show_order INTEGER,
            active INTEGER NOT NULL DEFAULT 1
        )",
    ),
    (
        "training_tree_node",
        "CREATE TABLE IF NOT EXISTS training_tree_node (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            node_type TEXT NOT NULL,
            parent_id INTEGER,
            training_id INTEGER,
            sort_order INTEGER,
            anchor INTEGER
        )",
    ),
    (
        "training_custom_slide_node",
        "CREATE TABLE IF NOT EXISTS training_custom_slide_node (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            node_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            content TEXT,
            anchor INTEGER
        )",
    ),
    (
        "training_branch_node",
        "CREATE TABLE IF NOT EXISTS training_branch_node (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            node_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            anchor INTEGER
        )",
    ),
    (
        "training_requirement_node",
        "CREATE TABLE IF NOT EXISTS training_requirement_node (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            node_id INTEGER NOT NULL,
            requirement_skeleton_id INTEGER NOT NULL,
            anchor INTEGER
        )",
    ),
    (
        "training_generated_slide_node",
        "CREATE TABLE IF NOT EXISTS training_generated_slide_node (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            node_id INTEGER NOT NULL,
            opt_column_id INTEGER,
            anchor INTEGER
        )",
    ),
    (
        "training_category_node",
        "CREATE TABLE IF NOT EXISTS training_category_node (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            node_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            category_id INTEGER,
            anchor INTEGER
        )",
    ),
    (
        "tree_node_search",
        "CREATE TABLE IF NOT EXISTS tree_node_search (
            node_id INTEGER PRIMARY KEY,
            document TEXT NOT NULL
        )",
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_tree_node_parent ON training_tree_node(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_tree_node_training ON training_tree_node(training_id)",
    "CREATE INDEX IF NOT EXISTS idx_custom_slide_node ON training_custom_slide_node(node_id)",
    "CREATE INDEX IF NOT EXISTS idx_branch_node ON training_branch_node(node_id)",
    "CREATE INDEX IF NOT EXISTS idx_requirement_node ON training_requirement_node(node_id)",
    "CREATE INDEX IF NOT EXISTS idx_generated_slide_node ON training_generated_slide_node(node_id)",
    "CREATE INDEX IF NOT EXISTS idx_category_node ON training_category_node(node_id)",
];

/// Embedded libsql database holding training trees
#[derive(Clone)]
pub struct DatabaseService {
    db: Arc<Database>,
    db_path: PathBuf,
}

impl DatabaseService {
    /// Open (or create) the database file and initialize the schema
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory cannot be created, the file cannot
    /// be opened, or schema creation fails.
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::PermissionDenied {
                        DatabaseError::permission_denied(db_path.clone())
                    } else {
                        DatabaseError::DirectoryCreationFailed(e)
                    }
                })?;
            }
        }

        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        let service = Self {
            db: Arc::new(db),
            db_path,
        };
        service.initialize_schema().await?;

        tracing::debug!("Training tree database ready at {}", service.db_path.display());
        Ok(service)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so they go through query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let mut stmt = conn.prepare(pragma).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        let _ = stmt.query(()).await.map_err(|e| {
            DatabaseError::sql_execution(format!("Failed to execute '{}': {}", pragma, e))
        })?;
        Ok(())
    }

    /// Create tables and indexes; safe to call repeatedly
    async fn initialize_schema(&self) -> Result<(), DatabaseError> {
        let conn = self.connect_with_timeout().await?;

        self.execute_pragma(&conn, "PRAGMA journal_mode = WAL")
            .await?;

        for (table, ddl) in SCHEMA {
            conn.execute(ddl, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!(
                    "Failed to create table {}: {}",
                    table, e
                ))
            })?;
        }

        for ddl in INDEXES {
            conn.execute(ddl, ()).await.map_err(|e| {
                DatabaseError::initialization_failed(format!("Failed to create index: {}", e))
            })?;
        }

        Ok(())
    }

    /// Get a raw connection handle
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db.connect().map_err(DatabaseError::LibsqlError)
    }

    /// Get a connection with a 5 second busy timeout
    ///
    /// Every store operation opens its own connection through this method, so
    /// concurrent requests wait on the SQLite lock instead of failing.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;
        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;
        Ok(conn)
    }
}
