//! Query Result Caching
//!
//! Caches parsed query results keyed by SQL text. Query execution itself is a
//! collaborator supplied through [`QueryRunner`].

mod result_cache;

pub use result_cache::{count_cache, single_integer, QueryResultCache, ResultParser};

use serde_json::Value;
use thiserror::Error;

/// One result row, columns in select order.
pub type ResultRow = Vec<Value>;

// == Query Error ==
/// Failures raised by a query collaborator or a result parser.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// The statement could not be executed
    #[error("Failed to execute {sql_name}: {message}")]
    Execution { sql_name: String, message: String },

    /// The result set did not have the shape the parser expects
    #[error("Unexpected result shape: {0}")]
    UnexpectedShape(String),
}

// == Query Runner ==
/// Executes a named SQL statement and returns its rows.
pub trait QueryRunner: Send + Sync {
    fn execute(&self, sql: &str, sql_name: &str) -> Result<Vec<ResultRow>, QueryError>;
}

impl<F> QueryRunner for F
where
    F: Fn(&str, &str) -> Result<Vec<ResultRow>, QueryError> + Send + Sync,
{
    fn execute(&self, sql: &str, sql_name: &str) -> Result<Vec<ResultRow>, QueryError> {
        self(sql, sql_name)
    }
}
