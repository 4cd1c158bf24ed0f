//! Subject (population) entity
//!
//! This module provides the population-level entity that every clinical
//! event references, plus a collection type for storing and querying
//! subjects efficiently.

use std::sync::Arc;

use chrono::NaiveDate;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::filter::descriptor::{EntityDescriptor, FilterKind};
use crate::models::event::FilterTarget;
use crate::models::types::FieldValue;

/// A study participant with demographic and treatment fields
///
/// Subjects are produced by the upstream population loader; the engine
/// never mutates them. Identity is the stable subject id string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Stable subject identifier
    pub id: String,
    /// Sex of the subject
    pub sex: Option<String>,
    /// Race of the subject
    pub race: Option<String>,
    /// Country of enrollment
    pub country: Option<String>,
    /// Treatment arm assignment
    pub arm: Option<String>,
    /// Age at enrollment, in years
    pub age: Option<i64>,
    /// Date of first study drug dose
    pub first_dose_date: Option<NaiveDate>,
    /// Randomization date
    pub randomization_date: Option<NaiveDate>,
    /// Study part (e.g. dose escalation vs expansion)
    pub study_part: Option<String>,
}

impl Subject {
    /// Minimal constructor used when only identity matters
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sex: None,
            race: None,
            country: None,
            arm: None,
            age: None,
            first_dose_date: None,
            randomization_date: None,
            study_part: None,
        }
    }

    /// The compile-time filter descriptor for the subject entity
    ///
    /// One declarative registry entry per filterable field; this replaces
    /// runtime introspection with an explicit list built once at startup.
    #[must_use]
    pub fn descriptor() -> EntityDescriptor<Arc<Self>> {
        EntityDescriptor::new("subject")
            .field("subject_id", FilterKind::Set, |s: &Arc<Self>| {
                FieldValue::from(Some(s.id.as_str()))
            })
            .field("sex", FilterKind::Set, |s: &Arc<Self>| {
                FieldValue::from(s.sex.as_deref())
            })
            .field("race", FilterKind::Set, |s: &Arc<Self>| {
                FieldValue::from(s.race.as_deref())
            })
            .field("country", FilterKind::Set, |s: &Arc<Self>| {
                FieldValue::from(s.country.as_deref())
            })
            .field("arm", FilterKind::Set, |s: &Arc<Self>| {
                FieldValue::from(s.arm.as_deref())
            })
            .field("age", FilterKind::Range, |s: &Arc<Self>| {
                FieldValue::from(s.age)
            })
            .field("first_dose_date", FilterKind::DateRange, |s: &Arc<Self>| {
                FieldValue::from(s.first_dose_date)
            })
            .field(
                "randomization_date",
                FilterKind::DateRange,
                |s: &Arc<Self>| FieldValue::from(s.randomization_date),
            )
            .field("study_part", FilterKind::Set, |s: &Arc<Self>| {
                FieldValue::from(s.study_part.as_deref())
            })
    }
}

impl FilterTarget for Arc<Subject> {
    fn subject_id(&self) -> &str {
        &self.id
    }
}

/// A collection of subjects that can be efficiently queried
#[derive(Debug, Default, Clone)]
pub struct SubjectCollection {
    /// Subjects indexed by subject id
    subjects: FxHashMap<String, Arc<Subject>>,
}

impl SubjectCollection {
    /// Create a new empty `SubjectCollection`
    #[must_use]
    pub fn new() -> Self {
        Self {
            subjects: FxHashMap::default(),
        }
    }

    /// Create a new `SubjectCollection` with an initial set of subjects
    #[must_use]
    pub fn with_subjects(subjects: Vec<Subject>) -> Self {
        let mut collection = Self::new();
        for subject in subjects {
            collection.add(subject);
        }
        collection
    }

    /// Add a subject to the collection
    pub fn add(&mut self, subject: Subject) {
        let id = subject.id.clone();
        self.subjects.insert(id, Arc::new(subject));
    }

    /// Get a subject by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Subject>> {
        self.subjects.get(id).cloned()
    }

    /// All subjects in the collection
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Subject>> {
        self.subjects.values().cloned().collect()
    }

    /// Subjects matching a predicate
    #[must_use]
    pub fn filter<F>(&self, predicate: F) -> Vec<Arc<Subject>>
    where
        F: Fn(&Subject) -> bool,
    {
        self.subjects
            .values()
            .filter(|subject| predicate(subject))
            .cloned()
            .collect()
    }

    /// The set of all subject ids in the collection
    #[must_use]
    pub fn ids(&self) -> FxHashSet<String> {
        self.subjects.keys().cloned().collect()
    }

    /// Number of subjects in the collection
    #[must_use]
    pub fn count(&self) -> usize {
        self.subjects.len()
    }
}
