//! Query Result Cache
//!
//! Runs a query only when its SQL text is not cached yet, parses the rows and
//! caches the parsed value.

use serde_json::Value;
use tracing::debug;

use super::{QueryError, QueryRunner, ResultRow};
use crate::cache::FetchCache;
use crate::error::Result;

/// Turns a result set into the cached value.
pub type ResultParser<T> =
    Box<dyn Fn(&[ResultRow]) -> std::result::Result<T, QueryError> + Send + Sync>;

// == Query Result Cache ==
/// Cache of parsed query results keyed by SQL text.
pub struct QueryResultCache<T, R> {
    cache: FetchCache<String, T>,
    runner: R,
    parser: ResultParser<T>,
}

impl<T, R> QueryResultCache<T, R>
where
    T: Clone,
    R: QueryRunner,
{
    /// Creates a query cache with the default capacity and eviction target.
    pub fn new<P>(runner: R, parser: P) -> Self
    where
        P: Fn(&[ResultRow]) -> std::result::Result<T, QueryError> + Send + Sync + 'static,
    {
        Self::with_cache(runner, parser, FetchCache::with_defaults())
    }

    /// Creates a query cache backed by an existing cache handle.
    pub fn with_cache<P>(runner: R, parser: P, cache: FetchCache<String, T>) -> Self
    where
        P: Fn(&[ResultRow]) -> std::result::Result<T, QueryError> + Send + Sync + 'static,
    {
        Self {
            cache,
            runner,
            parser: Box::new(parser),
        }
    }

    // == Get ==
    /// Returns the parsed result of `sql`, running it on a miss.
    ///
    /// `sql_name` only labels the query for the runner and for logs.
    ///
    /// # Errors
    /// `CacheError::UnfetchableItem` with the `QueryError` as its source.
    pub fn get(&self, sql: &str, sql_name: &str) -> Result<T> {
        self.cache
            .get_or_fetch(sql.to_string(), |sql: &String| -> std::result::Result<T, QueryError> {
                debug!("Running query {}", sql_name);
                let rows = self.runner.execute(sql, sql_name)?;
                (self.parser)(rows.as_slice())
            })
    }

    /// The underlying cache, for sizing and invalidation.
    pub fn cache(&self) -> &FetchCache<String, T> {
        &self.cache
    }
}

// == Single Integer Parser ==
/// Parses a one-row, one-column integer result such as `SELECT COUNT(*)`.
pub fn single_integer(rows: &[ResultRow]) -> std::result::Result<i64, QueryError> {
    let row = match rows {
        [row] => row,
        _ => {
            return Err(QueryError::UnexpectedShape(format!(
                "expected exactly one row, got {}",
                rows.len()
            )))
        }
    };
    match row.first() {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            QueryError::UnexpectedShape(format!("{} is not an integer", n))
        }),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| QueryError::UnexpectedShape(format!("{:?} is not an integer", s))),
        Some(other) => Err(QueryError::UnexpectedShape(format!(
            "{} is not an integer",
            other
        ))),
        None => Err(QueryError::UnexpectedShape(
            "row has no columns".to_string(),
        )),
    }
}

/// Creates a cache of integer counts, one per SQL statement.
pub fn count_cache<R: QueryRunner>(runner: R) -> QueryResultCache<i64, R> {
    QueryResultCache::new(runner, single_integer)
}
