//! Generic filter engine
//!
//! Executes AND-combination matching over an entity descriptor and
//! recomputes the "available values" feedback for every declared field.
//! One engine instance serves one entity type; the algorithm is identical
//! across all of them.

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::filter::descriptor::EntityDescriptor;
use crate::filter::population::resolve_population_ids;
use crate::filter::spec::{FilterQuery, FilterResult, FilterSpecification};
use crate::models::event::FilterTarget;
use crate::models::types::FieldValue;

/// Filter engine for one entity type
#[derive(Debug, Clone)]
pub struct FilterEngine<R: FilterTarget> {
    descriptor: EntityDescriptor<R>,
}

impl<R: FilterTarget> FilterEngine<R> {
    /// Create an engine over a validated entity descriptor
    ///
    /// # Errors
    /// Returns an error if the descriptor declares duplicate fields.
    pub fn new(descriptor: EntityDescriptor<R>) -> Result<Self> {
        descriptor.validate()?;
        Ok(Self { descriptor })
    }

    /// The descriptor this engine filters against
    #[must_use]
    pub fn descriptor(&self) -> &EntityDescriptor<R> {
        &self.descriptor
    }

    /// Whether a single record passes the population join and all criteria
    fn record_matches(
        &self,
        record: &R,
        filters: &FilterSpecification,
        population_ids: Option<&FxHashSet<String>>,
    ) -> bool {
        if let Some(ids) = population_ids {
            if !ids.contains(record.subject_id()) {
                return false;
            }
        }
        filters
            .iter()
            .filter(|(_, primitive)| !primitive.is_empty())
            .all(|(name, primitive)| {
                // A criterion naming an undeclared field reads as null
                let value = self
                    .descriptor
                    .get(name)
                    .map_or(FieldValue::Empty, |field| field.extract(record));
                primitive.matches(&value)
            })
    }

    /// Apply the filter specification to a record collection
    ///
    /// A record matches iff its subject id is in `population_ids` (when
    /// given) and every non-empty criterion matches the record's field
    /// value. The unfiltered input is kept as the "total available"
    /// baseline.
    #[must_use]
    pub fn apply(
        &self,
        records: &[R],
        filters: &FilterSpecification,
        population_ids: Option<&FxHashSet<String>>,
    ) -> FilterResult<R> {
        let filtered_result: Vec<R> = records
            .par_iter()
            .filter(|record| self.record_matches(record, filters, population_ids))
            .cloned()
            .collect();

        let active = filters
            .iter()
            .filter(|(_, primitive)| !primitive.is_empty())
            .count();
        debug!(
            "{}: {} of {} records matched {} active criteria",
            self.descriptor.entity(),
            filtered_result.len(),
            records.len(),
            active
        );

        let mut filters = filters.clone();
        filters.set_matched_items_count(filtered_result.len());
        FilterResult {
            all_events: records.to_vec(),
            filtered_result,
            filters,
        }
    }

    /// Apply the specification, then recompute every field's observed domain
    ///
    /// The full match pass runs first and all availability summaries are
    /// derived from the resulting filtered collection, never from the
    /// pre-filter input. A restrictive criterion therefore narrows the
    /// reported available values of its own field too.
    #[must_use]
    pub fn apply_with_availability(
        &self,
        records: &[R],
        filters: &FilterSpecification,
        population_ids: Option<&FxHashSet<String>>,
    ) -> FilterResult<R> {
        let mut result = self.apply(records, filters, population_ids);
        for field in self.descriptor.iter() {
            // Preserve the caller's criterion (accepted subset, bounds,
            // include_empty); only the observed domain is recomputed.
            let mut primitive = filters
                .filter(field.name)
                .cloned()
                .unwrap_or_else(|| field.kind.default_primitive());
            primitive.reset_observed();
            for record in &result.filtered_result {
                primitive.observe(&field.extract(record), &field.kind);
            }
            result.filters.set_filter(field.name, primitive);
        }
        result
            .filters
            .set_matched_items_count(result.filtered_result.len());
        result
    }

    /// Resolve the population, filter the events, and recompute availability
    ///
    /// This is the full filter-widget refresh operation: population filters
    /// run first (or a pre-narrowed subject set is used as-is), events are
    /// intersected on subject id, and every declared field's observed
    /// values are derived from the matched subset.
    ///
    /// # Errors
    /// Returns an error if the population descriptor fails validation.
    pub fn available_filters(&self, query: &FilterQuery<'_, R>) -> Result<FilterResult<R>> {
        let population_ids = resolve_population_ids(query)?;
        Ok(self.apply_with_availability(query.records, query.filters, Some(&population_ids)))
    }
}
