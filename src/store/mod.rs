//! Graph store interface
//!
//! The model layer talks to the database through one call: execute a named,
//! parameterized AQL statement and get its rows back together with the
//! number of documents it wrote. Traversal, sorting and aggregation all
//! happen inside the engine.

pub mod arango;
mod errors;
mod statement;

pub use arango::ArangoStore;
pub use errors::{StoreError, StoreResult};
pub use statement::{QueryOutcome, Statement};

use async_trait::async_trait;

/// Executes statements against the graph database
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn execute(&self, statement: &Statement) -> StoreResult<QueryOutcome>;
}
