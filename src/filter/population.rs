//! Population-level filtering
//!
//! Population filtering runs as its own instance of the generic filter
//! engine over subject records; event-type engines call this first and
//! intersect on subject id before applying field-level criteria.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::filter::engine::FilterEngine;
use crate::filter::spec::{FilterQuery, FilterResult, FilterSpecification};
use crate::models::subject::{Subject, SubjectCollection};

/// Filter engine over the subject entity
#[derive(Debug, Clone)]
pub struct PopulationEngine {
    engine: FilterEngine<Arc<Subject>>,
}

impl PopulationEngine {
    /// Create a population engine over the subject descriptor
    ///
    /// # Errors
    /// Returns an error if the subject descriptor fails validation.
    pub fn new() -> Result<Self> {
        Ok(Self {
            engine: FilterEngine::new(Subject::descriptor())?,
        })
    }

    /// Filter the population by subject-level criteria
    ///
    /// Subjects are their own population, so no id join applies here.
    #[must_use]
    pub fn apply(
        &self,
        population: &SubjectCollection,
        filters: &FilterSpecification,
    ) -> FilterResult<Arc<Subject>> {
        let subjects = population.all();
        self.engine.apply(&subjects, filters, None)
    }

    /// Filter the population and recompute subject-field availability
    #[must_use]
    pub fn available_filters(
        &self,
        population: &SubjectCollection,
        filters: &FilterSpecification,
    ) -> FilterResult<Arc<Subject>> {
        let subjects = population.all();
        self.engine.apply_with_availability(&subjects, filters, None)
    }
}

/// The subject ids an event query is allowed to match
///
/// A pre-narrowed id set carried by the query is used as-is; re-deriving
/// population filters on top of it would re-filter an already-filtered
/// explicit set.
pub fn resolve_population_ids<R>(query: &FilterQuery<'_, R>) -> Result<FxHashSet<String>> {
    if let Some(ids) = query.preselected_subject_ids {
        return Ok(ids.clone());
    }
    let engine = PopulationEngine::new()?;
    let result = engine.apply(query.population, query.population_filters);
    Ok(result
        .filtered_result
        .iter()
        .map(|subject| subject.id.clone())
        .collect())
}
