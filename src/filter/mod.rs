//! Filtering framework
//!
//! This module provides the filter primitives, the per-entity descriptor
//! registry, and the generic engine that executes AND-combination matching
//! and "available values" recomputation over any entity type.

pub mod descriptor;
pub mod engine;
pub mod population;
pub mod primitives;
pub mod spec;

pub use descriptor::{EntityDescriptor, FieldDescriptor};
pub use engine::FilterEngine;
pub use population::{PopulationEngine, resolve_population_ids};
pub use primitives::{
    DateRangeFilter, FilterKind, FilterPrimitive, MapFilter, MultiValueIntRangeFilter,
    MultiValueSetFilter, RangeFilter, SetFilter,
};
pub use spec::{FilterQuery, FilterResult, FilterSpecification};
