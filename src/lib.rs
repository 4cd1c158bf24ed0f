//! A Rust library for filtering clinical-trial event collections and
//! computing chart-ready statistical aggregates with deterministic
//! category coloring.

pub mod chart;
pub mod error;
pub mod filter;
pub mod models;
pub mod provider;

// Re-export the most common types for easier use
// Core types
pub use error::{Error, Result};
pub use models::{AdverseEvent, Event, FieldValue, LabResult, ScalarValue, Subject,
    SubjectCollection};

// Filtering capabilities
pub use filter::{
    EntityDescriptor, FilterEngine, FilterPrimitive, FilterQuery, FilterResult,
    FilterSpecification, PopulationEngine,
};

// Chart aggregation
pub use chart::{
    AxisOptions, AxisRole, ChartGroupByOptions, ColoringService, CountType, GroupByKey,
    GroupKeyMapper, TimestampType,
};

// Upstream loading seam
pub use provider::{DataProvider, DatasetSelector};
