//! Error handling for the trial-charts engine.

use thiserror::Error;

/// Specialized error type for filter and chart operations
#[derive(Debug, Error)]
pub enum Error {
    /// A grouping or filter references a field the entity descriptor does not declare
    #[error("unknown field '{field}' for entity '{entity}'")]
    UnknownField {
        /// Entity type whose descriptor was consulted
        entity: String,
        /// The undeclared field name
        field: String,
    },

    /// An entity descriptor declares the same field name twice
    #[error("duplicate field '{field}' in descriptor for entity '{entity}'")]
    DuplicateField {
        /// Entity type whose descriptor is invalid
        entity: String,
        /// The duplicated field name
        field: String,
    },

    /// Error loading data from an upstream provider
    #[error("data access error: {0}")]
    DataAccess(#[from] anyhow::Error),
}

/// Result type for trial-charts operations
pub type Result<T> = std::result::Result<T, Error>;
