//! Business Services
//!
//! - `TreeService` - hydration, delete fan-out, create/update and lookups
//!   over the store traits
//!
//! Services coordinate between the database layer and callers such as the
//! HTTP server, enforcing the tree rules the stores know nothing about.

pub mod error;
pub mod tree_service;

pub use error::{FanOutStep, TreeServiceError};
pub use tree_service::{SaveRequest, TreeService, TreeStores};
