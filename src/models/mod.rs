//! Domain models for clinical-trial data
//!
//! This module contains the subject (population) entity, the clinical event
//! entities, and the shared dynamic value types the filter engine operates
//! on.

pub mod event;
pub mod subject;
pub mod types;

pub use event::{AdverseEvent, Event, FilterTarget, LabResult};
pub use subject::{Subject, SubjectCollection};
pub use types::{FieldValue, ScalarValue, Severity};
