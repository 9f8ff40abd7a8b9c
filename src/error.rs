//! Error types for the fetch cache
//!
//! Provides unified error handling using thiserror.

use std::error::Error as StdError;
use std::fmt::Debug;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error produced by a value producer.
pub type ProducerError = Box<dyn StdError + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for the fetch cache.
///
/// `Clone` so that a single fetch outcome can be handed to every caller
/// waiting on the same key.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The producer failed (or panicked) while fetching a key
    #[error("Unable to fetch item {key}: {source}")]
    UnfetchableItem {
        key: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync + 'static>,
    },

    /// Capacity or eviction target rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Key not present in the cache
    #[error("Key not found: {0}")]
    NotFound(String),
}

impl CacheError {
    /// Wraps a producer failure for `key`.
    pub fn unfetchable<K, E>(key: &K, err: E) -> Self
    where
        K: Debug + ?Sized,
        E: Into<ProducerError>,
    {
        let source: ProducerError = err.into();
        CacheError::UnfetchableItem {
            key: format!("{:?}", key),
            source: Arc::from(source),
        }
    }

    /// Returns true if this error came from the producer boundary.
    pub fn is_unfetchable(&self) -> bool {
        matches!(self, CacheError::UnfetchableItem { .. })
    }
}

// == Result Type Alias ==
/// Convenience Result type for the fetch cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_unfetchable_keeps_source() {
        let err = CacheError::unfetchable(&42u32, io::Error::new(io::ErrorKind::Other, "db down"));

        assert!(err.is_unfetchable());
        assert_eq!(err.to_string(), "Unable to fetch item 42: db down");
        let source = err.source().expect("source should be kept");
        assert_eq!(source.to_string(), "db down");
    }

    #[test]
    fn test_unfetchable_from_str() {
        let err = CacheError::unfetchable("users", "no rows");
        assert_eq!(err.to_string(), "Unable to fetch item \"users\": no rows");
    }

    #[test]
    fn test_clone_shares_source() {
        let err = CacheError::unfetchable(&1, "boom");
        let copy = err.clone();
        assert_eq!(err.to_string(), copy.to_string());
    }

    #[test]
    fn test_invalid_config_is_not_unfetchable() {
        let err = CacheError::InvalidConfig("capacity must be positive".to_string());
        assert!(!err.is_unfetchable());
        assert!(err.to_string().contains("capacity must be positive"));
    }
}
