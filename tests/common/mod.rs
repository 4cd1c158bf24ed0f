//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::NaiveDate;
use trial_charts::models::{AdverseEvent, LabResult, Severity, Subject, SubjectCollection};

/// Initialize test logging once per process
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn subject(
    id: &str,
    arm: &str,
    sex: &str,
    first_dose_date: Option<NaiveDate>,
    age: i64,
) -> Subject {
    Subject {
        id: id.to_string(),
        sex: Some(sex.to_string()),
        race: None,
        country: Some("DK".to_string()),
        arm: Some(arm.to_string()),
        age: Some(age),
        first_dose_date,
        randomization_date: first_dose_date,
        study_part: Some("A".to_string()),
    }
}

/// Four subjects across two arms; S4 has no dose date
pub fn test_population() -> SubjectCollection {
    SubjectCollection::with_subjects(vec![
        subject("S1", "Arm A", "F", Some(date(2023, 1, 1)), 34),
        subject("S2", "Arm A", "M", Some(date(2023, 1, 10)), 40),
        subject("S3", "Arm B", "F", Some(date(2023, 1, 5)), 55),
        subject("S4", "Arm B", "M", None, 61),
    ])
}

pub fn adverse_event(
    id: &str,
    subject: Arc<Subject>,
    term: &str,
    severity: Option<Severity>,
    start_date: Option<NaiveDate>,
) -> AdverseEvent {
    let mut event = AdverseEvent::new(id, subject);
    event.term = Some(term.to_string());
    event.severity = severity;
    event.start_date = start_date;
    event
}

/// Five adverse events spread over the test population
///
/// Onsets fall 7, 14, 10, and 1 days after the respective first doses;
/// E5 has neither a date nor a severity.
pub fn test_adverse_events(population: &SubjectCollection) -> Vec<AdverseEvent> {
    let s1 = population.get("S1").unwrap();
    let s2 = population.get("S2").unwrap();
    let s3 = population.get("S3").unwrap();
    let s4 = population.get("S4").unwrap();

    let mut e1 = adverse_event(
        "E1",
        s1.clone(),
        "Headache",
        Some(Severity::Mild),
        Some(date(2023, 1, 8)),
    );
    e1.special_interest_groups = vec!["Neuro".to_string(), "Pain".to_string()];
    e1.causality
        .insert("Drug X".to_string(), "Related".to_string());
    e1.occurrence_numbers = vec![1];

    let mut e2 = adverse_event(
        "E2",
        s1,
        "Nausea",
        Some(Severity::Moderate),
        Some(date(2023, 1, 15)),
    );
    e2.special_interest_groups = vec!["GI".to_string()];
    e2.causality
        .insert("Drug X".to_string(), "Not related".to_string());
    e2.occurrence_numbers = vec![1, 2];

    let mut e3 = adverse_event(
        "E3",
        s2,
        "Headache",
        Some(Severity::Severe),
        Some(date(2023, 1, 20)),
    );
    e3.special_interest_groups = vec!["Neuro".to_string()];
    e3.occurrence_numbers = vec![3];

    let mut e4 = adverse_event(
        "E4",
        s3,
        "Fatigue",
        Some(Severity::Mild),
        Some(date(2023, 1, 6)),
    );
    e4.special_interest_groups = vec!["General".to_string(), "Pain".to_string()];
    e4.occurrence_numbers = vec![1];

    let e5 = adverse_event("E5", s4, "Headache", None, None);

    vec![e1, e2, e3, e4, e5]
}

pub fn lab_result(
    id: &str,
    subject: Arc<Subject>,
    lab_code: &str,
    value: f64,
    visit_number: f64,
) -> LabResult {
    let mut result = LabResult::new(id, subject);
    result.lab_code = Some(lab_code.to_string());
    result.category = Some("Haematology".to_string());
    result.value = Some(value);
    result.unit = Some("g/L".to_string());
    result.visit_number = Some(visit_number);
    result.source = Some("Central Lab".to_string());
    result
}
