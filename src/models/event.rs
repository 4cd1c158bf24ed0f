//! Clinical event entities
//!
//! Events are immutable domain records (adverse events, lab results, …)
//! that hold a shared reference to their owning subject. Each entity type
//! publishes a declarative filter descriptor; beyond that the filter and
//! chart engines treat all event types identically.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::filter::descriptor::{EntityDescriptor, FilterKind};
use crate::models::subject::Subject;
use crate::models::types::{FieldValue, Severity};

/// Anything the filter engine can match against a population
pub trait FilterTarget: Clone + Send + Sync {
    /// The id of the subject this record belongs to
    fn subject_id(&self) -> &str;
}

/// A clinical event record owned by a subject
pub trait Event: FilterTarget {
    /// The subject this event belongs to
    fn subject(&self) -> &Arc<Subject>;

    /// Stable identifier of the event itself
    fn event_id(&self) -> &str;
}

/// An adverse event reported for a subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdverseEvent {
    /// Stable event identifier
    pub id: String,
    /// Owning subject
    pub subject: Arc<Subject>,
    /// Preferred term describing the event
    pub term: Option<String>,
    /// Maximum reported severity
    pub severity: Option<Severity>,
    /// Whether the event was classified as serious
    pub serious: Option<bool>,
    /// Causality assessment per study drug
    pub causality: BTreeMap<String, String>,
    /// Special interest groups the event term belongs to
    pub special_interest_groups: Vec<String>,
    /// Occurrence numbers of the repeated episodes of this event
    pub occurrence_numbers: Vec<i64>,
    /// Onset date
    pub start_date: Option<NaiveDate>,
    /// Resolution date, if resolved
    pub end_date: Option<NaiveDate>,
}

impl AdverseEvent {
    /// Create a new adverse event with only identity fields set
    #[must_use]
    pub fn new(id: impl Into<String>, subject: Arc<Subject>) -> Self {
        Self {
            id: id.into(),
            subject,
            term: None,
            severity: None,
            serious: None,
            causality: BTreeMap::new(),
            special_interest_groups: Vec::new(),
            occurrence_numbers: Vec::new(),
            start_date: None,
            end_date: None,
        }
    }

    /// Days from the subject's first dose to event onset
    #[must_use]
    pub fn days_on_study(&self) -> Option<i64> {
        match (self.start_date, self.subject.first_dose_date) {
            (Some(start), Some(dose)) => Some((start - dose).num_days()),
            _ => None,
        }
    }

    /// The compile-time filter descriptor for the adverse event entity
    #[must_use]
    pub fn descriptor() -> EntityDescriptor<Self> {
        EntityDescriptor::new("adverse_event")
            .field("term", FilterKind::Set, |e: &Self| {
                FieldValue::from(e.term.as_deref())
            })
            .field("severity", FilterKind::Set, |e: &Self| {
                FieldValue::from(e.severity.map(|s| s.to_string()))
            })
            .field("serious", FilterKind::Set, |e: &Self| {
                FieldValue::from(e.serious)
            })
            .field("start_date", FilterKind::DateRange, |e: &Self| {
                FieldValue::from(e.start_date)
            })
            .field("end_date", FilterKind::DateRange, |e: &Self| {
                FieldValue::from(e.end_date)
            })
            .field("days_on_study", FilterKind::Range, |e: &Self| {
                FieldValue::from(e.days_on_study())
            })
            .field(
                "causality",
                FilterKind::Map(Box::new(FilterKind::Set)),
                |e: &Self| {
                    FieldValue::mapped(
                        e.causality
                            .iter()
                            .map(|(drug, assessment)| {
                                (drug.clone(), FieldValue::from(Some(assessment.as_str())))
                            })
                            .collect(),
                    )
                },
            )
            .field(
                "special_interest_group",
                FilterKind::MultiValueSet,
                |e: &Self| FieldValue::many(e.special_interest_groups.iter().map(String::as_str)),
            )
            .field("occurrence", FilterKind::MultiValueIntRange, |e: &Self| {
                FieldValue::many(e.occurrence_numbers.iter().copied())
            })
    }
}

impl FilterTarget for AdverseEvent {
    fn subject_id(&self) -> &str {
        &self.subject.id
    }
}

impl Event for AdverseEvent {
    fn subject(&self) -> &Arc<Subject> {
        &self.subject
    }

    fn event_id(&self) -> &str {
        &self.id
    }
}

/// A laboratory measurement for a subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabResult {
    /// Stable event identifier
    pub id: String,
    /// Owning subject
    pub subject: Arc<Subject>,
    /// Laboratory test code
    pub lab_code: Option<String>,
    /// Test category (e.g. haematology, biochemistry)
    pub category: Option<String>,
    /// Measured value in the reported unit
    pub value: Option<f64>,
    /// Unit of measurement
    pub unit: Option<String>,
    /// Protocol visit number
    pub visit_number: Option<f64>,
    /// Time the sample was taken
    pub measurement_date: Option<NaiveDateTime>,
    /// Originating data source
    pub source: Option<String>,
}

impl LabResult {
    /// Create a new lab result with only identity fields set
    #[must_use]
    pub fn new(id: impl Into<String>, subject: Arc<Subject>) -> Self {
        Self {
            id: id.into(),
            subject,
            lab_code: None,
            category: None,
            value: None,
            unit: None,
            visit_number: None,
            measurement_date: None,
            source: None,
        }
    }

    /// The compile-time filter descriptor for the lab result entity
    #[must_use]
    pub fn descriptor() -> EntityDescriptor<Self> {
        EntityDescriptor::new("lab_result")
            .field("lab_code", FilterKind::Set, |e: &Self| {
                FieldValue::from(e.lab_code.as_deref())
            })
            .field("category", FilterKind::Set, |e: &Self| {
                FieldValue::from(e.category.as_deref())
            })
            .field("value", FilterKind::Range, |e: &Self| {
                FieldValue::from(e.value)
            })
            .field("unit", FilterKind::Set, |e: &Self| {
                FieldValue::from(e.unit.as_deref())
            })
            .field("visit_number", FilterKind::Range, |e: &Self| {
                FieldValue::from(e.visit_number)
            })
            .field("measurement_date", FilterKind::DateRange, |e: &Self| {
                FieldValue::from(e.measurement_date)
            })
            .field("source", FilterKind::Set, |e: &Self| {
                FieldValue::from(e.source.as_deref())
            })
    }
}

impl FilterTarget for LabResult {
    fn subject_id(&self) -> &str {
        &self.subject.id
    }
}

impl Event for LabResult {
    fn subject(&self) -> &Arc<Subject> {
        &self.subject
    }

    fn event_id(&self) -> &str {
        &self.id
    }
}
