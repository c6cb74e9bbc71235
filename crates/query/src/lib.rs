// query/src/lib.rs

//! Read-only views over hub state
//!
//! Typed accessors for off-chain tooling plus a small JSON method
//! dispatcher used by the node.

pub mod methods;
pub mod query;
pub mod types;

pub use query::HubQuery;
pub use types::{AssetInfo, RemoteLinkInfo};

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while answering queries
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
