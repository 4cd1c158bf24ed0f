//! Upstream data loading seam
//!
//! The engine never performs I/O itself; dataset loading happens strictly
//! before it is invoked. This module only fixes the interface a backing
//! store must expose and the error kind it reports.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifies the dataset a provider should load
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetSelector {
    /// Study the dataset belongs to
    pub study: String,
    /// Dataset name within the study
    pub dataset: String,
}

impl DatasetSelector {
    /// Create a selector for the given study and dataset
    #[must_use]
    pub fn new(study: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            study: study.into(),
            dataset: dataset.into(),
        }
    }
}

/// A backing store that can materialize record collections
pub trait DataProvider<R> {
    /// Load all records of the selected dataset into memory
    ///
    /// # Errors
    /// Returns [`crate::error::Error::DataAccess`] when the store cannot be
    /// read; the filter engine treats this as an opaque precondition
    /// failure and is never invoked on partial data.
    fn load_data(&self, selector: &DatasetSelector) -> Result<Vec<R>>;
}
