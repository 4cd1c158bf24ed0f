//! Tests for AND-combination matching and the population join

mod common;

use rustc_hash::FxHashSet;
use trial_charts::filter::SetFilter;
use trial_charts::filter::descriptor::FilterKind;
use trial_charts::models::{AdverseEvent, FieldValue};
use trial_charts::{
    EntityDescriptor, FilterEngine, FilterPrimitive, FilterQuery, FilterResult,
    FilterSpecification,
};

use common::{init_logging, test_adverse_events, test_population};

fn matched_ids(result: &FilterResult<AdverseEvent>) -> Vec<&str> {
    let mut ids: Vec<&str> = result
        .filtered_result
        .iter()
        .map(|event| event.id.as_str())
        .collect();
    ids.sort_unstable();
    ids
}

fn set_without_empty(values: &[&str]) -> FilterPrimitive {
    let mut filter = SetFilter::with_values(values.iter().copied());
    filter.include_empty = false;
    FilterPrimitive::Set(filter)
}

#[test]
fn empty_specification_matches_the_whole_collection() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new();
    let result = engine.apply(&events, &spec, Some(&population.ids()));

    assert_eq!(result.matched_count(), events.len());
    assert_eq!(result.all_events.len(), events.len());
    assert_eq!(result.filters.matched_items_count(), events.len());
}

#[test]
fn criteria_combine_conjunctively() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new()
        .with_filter("severity", set_without_empty(&["Mild"]))
        .with_filter("term", set_without_empty(&["Headache"]));
    let result = engine.apply(&events, &spec, Some(&population.ids()));

    assert_eq!(matched_ids(&result), ["E1"]);
}

#[test]
fn population_filters_narrow_the_event_collection() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new();
    let pop_spec =
        FilterSpecification::new().with_filter("sex", set_without_empty(&["F"]));
    let query = FilterQuery::new(&events, &spec, &population, &pop_spec);
    let result = engine.available_filters(&query).unwrap();

    // S1 and S3 are the female subjects
    assert_eq!(matched_ids(&result), ["E1", "E2", "E4"]);
    assert_eq!(result.filters.matched_items_count(), 3);
}

#[test]
fn preselected_subject_ids_bypass_population_filters() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new();
    // Contradicts the preselected set; it must not be re-applied
    let pop_spec =
        FilterSpecification::new().with_filter("sex", set_without_empty(&["F"]));
    let preselected: FxHashSet<String> = std::iter::once("S4".to_string()).collect();
    let query = FilterQuery::new(&events, &spec, &population, &pop_spec)
        .with_preselected_subjects(&preselected);
    let result = engine.available_filters(&query).unwrap();

    assert_eq!(matched_ids(&result), ["E5"]);
}

#[test]
fn criterion_on_an_undeclared_field_reads_as_null() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let spec = FilterSpecification::new().with_filter("bogus", set_without_empty(&["x"]));
    let result = engine.apply(&events, &spec, Some(&population.ids()));
    assert_eq!(result.matched_count(), 0);

    // With the null gate open, the unknown field no longer excludes anything
    let spec = FilterSpecification::new().with_filter(
        "bogus",
        FilterPrimitive::Set(SetFilter::with_values(["x"])),
    );
    let result = engine.apply(&events, &spec, Some(&population.ids()));
    assert_eq!(result.matched_count(), events.len());
}

#[test]
fn multi_value_criteria_run_through_the_engine() {
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
    let result = engine.apply(&events, &spec, Some(&population.ids()));
    assert_eq!(matched_ids(&result), ["E1", "E4"]);
}

#[test]
fn filter_results_serialize_with_their_owned_subjects() {
    init_logging();
    let population = test_population();
    let events = test_adverse_events(&population);
    let engine = FilterEngine::new(AdverseEvent::descriptor()).unwrap();

    let result = engine.apply(&events, &FilterSpecification::new(), None);
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["filtered_result"][0]["id"], "E1");
    assert_eq!(json["filtered_result"][0]["subject"]["id"], "S1");

    let round_trip: AdverseEvent =
        serde_json::from_value(json["filtered_result"][0].clone()).unwrap();
    assert_eq!(round_trip.id, "E1");
    assert_eq!(round_trip.subject.id, "S1");
}

#[test]
fn duplicate_descriptor_fields_fail_validation() {
    let descriptor = EntityDescriptor::new("adverse_event")
        .field("term", FilterKind::Set, |e: &AdverseEvent| {
            FieldValue::from(e.term.as_deref())
        })
        .field("term", FilterKind::Set, |e: &AdverseEvent| {
            FieldValue::from(e.term.as_deref())
        });
    assert!(FilterEngine::new(descriptor).is_err());
}
