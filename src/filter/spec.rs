//! Filter specification, query, and result value objects
//!
//! These are created fresh per request and discarded after the response is
//! built; nothing here holds state across calls.

use std::collections::BTreeMap;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::filter::primitives::FilterPrimitive;
use crate::models::subject::SubjectCollection;

/// An entity-type-specific bag of named filter primitives
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpecification {
    filters: BTreeMap<String, FilterPrimitive>,
    matched_items_count: usize,
}

impl FilterSpecification {
    /// Create a specification imposing no restrictions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field criterion
    #[must_use]
    pub fn with_filter(mut self, name: impl Into<String>, primitive: FilterPrimitive) -> Self {
        self.filters.insert(name.into(), primitive);
        self
    }

    /// Set or replace the criterion for a field
    pub fn set_filter(&mut self, name: impl Into<String>, primitive: FilterPrimitive) {
        self.filters.insert(name.into(), primitive);
    }

    /// The criterion for a field, if one was set
    #[must_use]
    pub fn filter(&self, name: &str) -> Option<&FilterPrimitive> {
        self.filters.get(name)
    }

    /// Iterate over all named criteria
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FilterPrimitive)> {
        self.filters.iter()
    }

    /// Names of fields that currently impose no restriction
    #[must_use]
    pub fn empty_filter_names(&self) -> Vec<String> {
        self.filters
            .iter()
            .filter(|(_, primitive)| primitive.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Size of the last-computed filtered result
    #[must_use]
    pub fn matched_items_count(&self) -> usize {
        self.matched_items_count
    }

    pub(crate) fn set_matched_items_count(&mut self, count: usize) {
        self.matched_items_count = count;
    }
}

/// One filtering request: records, criteria, and population context
#[derive(Debug, Clone)]
pub struct FilterQuery<'a, R> {
    /// The full unfiltered event collection
    pub records: &'a [R],
    /// Field criteria for the event entity
    pub filters: &'a FilterSpecification,
    /// The population the events belong to
    pub population: &'a SubjectCollection,
    /// Field criteria applied at the population level
    pub population_filters: &'a FilterSpecification,
    /// Pre-narrowed subject ids, when the caller has already resolved the
    /// population filter; used as-is instead of re-deriving it
    pub preselected_subject_ids: Option<&'a FxHashSet<String>>,
}

impl<'a, R> FilterQuery<'a, R> {
    /// Create a query over the given records and population
    #[must_use]
    pub fn new(
        records: &'a [R],
        filters: &'a FilterSpecification,
        population: &'a SubjectCollection,
        population_filters: &'a FilterSpecification,
    ) -> Self {
        Self {
            records,
            filters,
            population,
            population_filters,
            preselected_subject_ids: None,
        }
    }

    /// Use an explicit, already-filtered subject id set
    #[must_use]
    pub fn with_preselected_subjects(mut self, ids: &'a FxHashSet<String>) -> Self {
        self.preselected_subject_ids = Some(ids);
        self
    }
}

/// The outcome of one filtering pass
///
/// `all_events` keeps the unfiltered input as the "total available"
/// baseline; `filters` carries the recomputed observed domains and the
/// matched count.
#[derive(Debug, Clone, Serialize)]
pub struct FilterResult<R> {
    /// The unfiltered input collection
    pub all_events: Vec<R>,
    /// Records matching the population join and every non-empty criterion
    pub filtered_result: Vec<R>,
    /// The specification, updated with matched count and observed domains
    pub filters: FilterSpecification,
}

impl<R> FilterResult<R> {
    /// Number of records that matched all active criteria
    #[must_use]
    pub fn matched_count(&self) -> usize {
        self.filtered_result.len()
    }
}
