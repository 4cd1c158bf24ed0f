//! Tests for bar-chart aggregation and subject-count semantics

mod common;

use trial_charts::chart::bar;
use trial_charts::chart::{GroupValue, tally_events};
use trial_charts::models::Severity;
use trial_charts::{
    AxisOptions, AxisRole, ChartGroupByOptions, ColoringService, CountType, GroupByKey,
    GroupKeyMapper,
};

use common::{adverse_event, init_logging, test_population};

/// S1 reports a mild and a severe headache; S2 a severe headache and a
/// mild nausea. The same subject under two color groups must count once.
fn overlap_events() -> (trial_charts::SubjectCollection, Vec<trial_charts::AdverseEvent>) {
    let population = test_population();
    let s1 = population.get("S1").unwrap();
    let s2 = population.get("S2").unwrap();
    let events = vec![
        adverse_event("E1", s1.clone(), "Headache", Some(Severity::Mild), None),
        adverse_event("E2", s1, "Headache", Some(Severity::Severe), None),
        adverse_event("E3", s2.clone(), "Headache", Some(Severity::Severe), None),
        adverse_event("E4", s2, "Nausea", Some(Severity::Mild), None),
    ];
    (population, events)
}

fn headache_mapper(
) -> (GroupKeyMapper<trial_charts::AdverseEvent>, ChartGroupByOptions) {
    let descriptor = trial_charts::AdverseEvent::descriptor();
    let options = ChartGroupByOptions::new()
        .with_axis(AxisRole::XAxis, AxisOptions::categorical("term"))
        .with_axis(AxisRole::ColorBy, AxisOptions::categorical("severity"));
    let mapper = GroupKeyMapper::new(&descriptor, &options).unwrap();
    (mapper, options)
}

#[test]
fn subject_counts_union_across_color_groups() {
    init_logging();
    let (_population, events) = overlap_events();
    let (mapper, _) = headache_mapper();
    let tallies = tally_events(&events, &mapper);

    let mut colors = ColoringService::new();
    let charts = bar::aggregate(&tallies, CountType::CountOfSubjects, &mut colors);
    assert_eq!(charts.len(), 1);

    let headache = charts[0]
        .categories
        .iter()
        .find(|c| c.category == "Headache")
        .unwrap();
    // S1 appears in both the Mild and the Severe segment
    assert_eq!(headache.total, 2.0);
    assert_eq!(headache.segments.len(), 2);
    let mild = headache.segments.iter().find(|s| s.color_by == "Mild").unwrap();
    let severe = headache
        .segments
        .iter()
        .find(|s| s.color_by == "Severe")
        .unwrap();
    assert_eq!(mild.value, 1.0);
    assert_eq!(severe.value, 2.0);
}

#[test]
fn event_counts_sum_across_color_groups() {
    init_logging();
    let (_population, events) = overlap_events();
    let (mapper, _) = headache_mapper();
    let tallies = tally_events(&events, &mapper);

    let mut colors = ColoringService::new();
    let charts = bar::aggregate(&tallies, CountType::CountOfEvents, &mut colors);

    let headache = charts[0]
        .categories
        .iter()
        .find(|c| c.category == "Headache")
        .unwrap();
    assert_eq!(headache.total, 3.0);
}

#[test]
fn categories_are_ranked_by_total_descending() {
    init_logging();
    let (_population, events) = overlap_events();
    let (mapper, _) = headache_mapper();
    let tallies = tally_events(&events, &mapper);

    let mut colors = ColoringService::new();
    let charts = bar::aggregate(&tallies, CountType::CountOfEvents, &mut colors);

    let labels: Vec<(&str, usize)> = charts[0]
        .categories
        .iter()
        .map(|c| (c.category.as_str(), c.rank))
        .collect();
    assert_eq!(labels, [("Headache", 0), ("Nausea", 1)]);
}

#[test]
fn segment_colors_are_stable_within_a_chart() {
    init_logging();
    let (_population, events) = overlap_events();
    let (mapper, _) = headache_mapper();
    let tallies = tally_events(&events, &mapper);

    let mut colors = ColoringService::new();
    let charts = bar::aggregate(&tallies, CountType::CountOfEvents, &mut colors);

    let color_of = |category: &str, color_by: &str| -> String {
        charts[0]
            .categories
            .iter()
            .find(|c| c.category == category)
            .unwrap()
            .segments
            .iter()
            .find(|s| s.color_by == color_by)
            .unwrap()
            .color
            .clone()
    };
    // The same severity renders identically in every category
    assert_eq!(color_of("Headache", "Mild"), color_of("Nausea", "Mild"));
    assert_ne!(color_of("Headache", "Mild"), color_of("Headache", "Severe"));
}

#[test]
fn trellised_tallies_split_into_labeled_panels() {
    init_logging();
    // Hand-built buckets: one per (trellis arm, category)
    let mut tallies = rustc_hash::FxHashMap::default();
    for (arm, category, subject) in [
        ("Arm A", "Headache", "S1"),
        ("Arm B", "Headache", "S3"),
        ("Arm B", "Nausea", "S4"),
    ] {
        let mut key = GroupByKey::new();
        key.insert(
            AxisRole::Trellis(0),
            GroupValue::Category(arm.to_string()),
        );
        key.insert(
            AxisRole::XAxis,
            GroupValue::Category(category.to_string()),
        );
        let tally = tallies
            .entry(key)
            .or_insert_with(trial_charts::chart::GroupTally::default);
        tally.subject_ids.insert(subject.to_string());
        tally.event_count += 1;
    }

    let mut colors = ColoringService::new();
    let charts = bar::aggregate(&tallies, CountType::CountOfSubjects, &mut colors);

    assert_eq!(charts.len(), 2);
    assert_eq!(charts[0].trellis[0].value, "Arm A");
    assert_eq!(charts[1].trellis[0].value, "Arm B");
    assert_eq!(charts[0].categories.len(), 1);
    assert_eq!(charts[1].categories.len(), 2);
}

#[test]
fn bar_chart_serializes_to_json() {
    init_logging();
    let (_population, events) = overlap_events();
    let (mapper, _) = headache_mapper();
    let tallies = tally_events(&events, &mapper);

    let mut colors = ColoringService::new();
    let charts = bar::aggregate(&tallies, CountType::CountOfSubjects, &mut colors);

    let json = serde_json::to_value(&charts).unwrap();
    let first = &json[0]["categories"][0];
    assert_eq!(first["category"], "Headache");
    assert_eq!(first["total"], 2.0);
    assert!(first["segments"][0]["color"].as_str().unwrap().starts_with('#'));
}
