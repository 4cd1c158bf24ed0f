//! Tests for observed-domain recomputation after filtering

mod common;

use std::collections::BTreeSet;

use trial_charts::filter::SetFilter;
use trial_charts::models::{AdverseEvent, ScalarValue};
use trial_charts::{FilterEngine, FilterPrimitive, FilterQuery, FilterSpecification};

use common::{date, init_logging, test_adverse_events, test_population};

fn str_set(values: &[&str]) -> BTreeSet<ScalarValue> {
    values.iter().map(|v| ScalarValue::from(*v)).collect()
}

fn set_without_empty(values: &[&str]) -> FilterPrimitive {
    let mut filter = SetFilter::with_values(values.iter().copied());
    filter.include_empty = false;
    FilterPrimitive::Set(filter)
}

fn available_set(spec: &FilterSpecification, field: &str) -> BTreeSet<ScalarValue> {
    match spec.filter(field) {
        Some(FilterPrimitive::Set(f)) => f.available_values.clone(),
        Some(FilterPrimitive::MultiValueSet(f)) => f.available_values.clone(),
        other => panic!("{field}: unexpected primitive {other:?}"),
    }
}

#[test]
fn availability_is_derived_from_the_filtered_subset() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec =
        FilterSpecification::new().with_filter("severity", set_without_empty(&["Mild"]));
    let pop_spec = FilterSpecification::new();
    let query = FilterQuery::new(&events, &spec, &population, &pop_spec);
    let result = engine.available_filters(&query).unwrap();

    // Only E1 and E4 are mild; the term domain shrinks accordingly
    assert_eq!(
        available_set(&result.filters, "term"),
        str_set(&["Fatigue", "Headache"])
    );
    // The restrictive criterion narrows its own field's domain too
    assert_eq!(
        available_set(&result.filters, "severity"),
        str_set(&["Mild"])
    );
    assert_eq!(result.filters.matched_items_count(), 2);
}

#[test]
fn caller_criterion_survives_the_recomputation() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec =
        FilterSpecification::new().with_filter("severity", set_without_empty(&["Mild"]));
    let pop_spec = FilterSpecification::new();
    let query = FilterQuery::new(&events, &spec, &population, &pop_spec);
    let result = engine.available_filters(&query).unwrap();

    let Some(FilterPrimitive::Set(severity)) = result.filters.filter("severity") else {
        panic!("severity criterion missing from result");
    };
    assert_eq!(severity.values, str_set(&["Mild"]));
    assert!(!severity.include_empty);
}

#[test]
fn multi_value_availability_unions_all_elements_of_matched_records() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new().with_filter(
        "special_interest_group",
        FilterPrimitive::MultiValueSet(
            trial_charts::filter::MultiValueSetFilter::with_values(["Pain"]),
        ),
    );
    let pop_spec = FilterSpecification::new();
    let query = FilterQuery::new(&events, &spec, &population, &pop_spec);
    let result = engine.available_filters(&query).unwrap();

    // E1 and E4 match on "Pain" but contribute their other groups as well
    assert_eq!(
        available_set(&result.filters, "special_interest_group"),
        str_set(&["General", "Neuro", "Pain"])
    );
}

#[test]
fn range_fields_report_observed_bounds() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new();
    let pop_spec = FilterSpecification::new();
    let query = FilterQuery::new(&events, &spec, &population, &pop_spec);
    let result = engine.available_filters(&query).unwrap();

    let Some(FilterPrimitive::Range(days)) = result.filters.filter("days_on_study") else {
        panic!("days_on_study domain missing from result");
    };
    assert_eq!(days.observed_min, Some(ScalarValue::Int(1)));
    assert_eq!(days.observed_max, Some(ScalarValue::Int(14)));

    let Some(FilterPrimitive::DateRange(onset)) = result.filters.filter("start_date") else {
        panic!("start_date domain missing from result");
    };
    assert_eq!(onset.observed_min, date(2023, 1, 6).and_hms_opt(0, 0, 0));
    assert_eq!(onset.observed_max, date(2023, 1, 20).and_hms_opt(0, 0, 0));

    // Unfiltered population and empty criteria: every event matched
    assert_eq!(result.filters.matched_items_count(), events.len());
}

#[test]
fn map_availability_collects_per_key_domains() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new();
    let pop_spec = FilterSpecification::new();
    let query = FilterQuery::new(&events, &spec, &population, &pop_spec);
    let result = engine.available_filters(&query).unwrap();

    let Some(FilterPrimitive::Map(causality)) = result.filters.filter("causality") else {
        panic!("causality domain missing from result");
    };
    let Some(FilterPrimitive::Set(drug_x)) = causality.filters.get("Drug X") else {
        panic!("Drug X sub-filter missing");
    };
    assert_eq!(
        drug_x.available_values,
        str_set(&["Not related", "Related"])
    );
}

#[test]
fn narrowed_population_narrows_the_observed_domains() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new();
    let pop_spec =
        FilterSpecification::new().with_filter("arm", set_without_empty(&["Arm A"]));
    let query = FilterQuery::new(&events, &spec, &population, &pop_spec);
    let result = engine.available_filters(&query).unwrap();

    assert_eq!(
        available_set(&result.filters, "term"),
        str_set(&["Headache", "Nausea"])
    );
    assert_eq!(result.filters.matched_items_count(), 3);
}

#[test]
fn empty_filter_names_lists_inert_criteria() {
    let spec = FilterSpecification::new()
        .with_filter("term", FilterPrimitive::Set(SetFilter::default()))
        .with_filter("severity", set_without_empty(&["Mild"]));
    assert_eq!(spec.empty_filter_names(), vec!["term".to_string()]);
}
