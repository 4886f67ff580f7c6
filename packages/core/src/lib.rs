//! Training Tree Core Business Logic Layer
//!
//! This crate provides the data model, storage seams and composition logic for
//! SecurityRAT training trees.
//!
//! # Architecture
//!
//! - **Generic row + extension**: every node is one `TreeNode` row plus exactly
//!   one type-specific extension record
//! - **Store traits**: `TreeService` only talks to async store traits, with
//!   in-memory and libsql implementations provided
//! - **Explicit fan-out**: multi-store operations run in a fixed order and name
//!   the failing step
//!
//! # Modules
//!
//! - [`models`] - Data structures (TreeNode, extension records, HydratedNode)
//! - [`db`] - Store traits and their in-memory and libsql implementations
//! - [`services`] - `TreeService` and its error type
//! - [`config`] - Service configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::TreeServiceConfig;
pub use models::*;
pub use services::*;
