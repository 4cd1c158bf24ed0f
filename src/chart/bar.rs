//! Bar-chart aggregation
//!
//! Counts grouped events per (X category, color group) pair within each
//! trellis panel. Subject counts are unioned per category so a subject
//! appearing under several color groups is never double counted.

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::chart::color::ColoringService;
use crate::chart::group::{AxisRole, GroupByKey, GroupTally, order_categories};

/// The metric a bar chart reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountType {
    /// Distinct subjects per category (set union across color groups)
    CountOfSubjects,
    /// Literal event counts per (category, color group) pair
    CountOfEvents,
}

/// One trellis axis assignment, for labeling a panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrellisOption {
    /// The trellis axis
    pub axis: String,
    /// The panel's value on that axis
    pub value: String,
}

/// Build panel labels from the trellis components of a group key
#[must_use]
pub fn trellis_options(trellis: &GroupByKey) -> Vec<TrellisOption> {
    trellis
        .iter()
        .map(|(role, value)| TrellisOption {
            axis: role.to_string(),
            value: value.label().to_string(),
        })
        .collect()
}

pub(crate) fn trellis_context(trellis: &GroupByKey) -> String {
    trellis.iter().map(|(_, value)| value.label()).join("/")
}

/// One colored segment of a bar
#[derive(Debug, Clone, Serialize)]
pub struct BarSegment {
    /// The color-by group this segment belongs to
    pub color_by: String,
    /// The segment's reported count
    pub value: f64,
    /// Assigned color code
    pub color: String,
}

/// One X-axis category of a bar chart
#[derive(Debug, Clone, Serialize)]
pub struct BarCategory {
    /// Category label
    pub category: String,
    /// Presentation position among the panel's categories
    pub rank: usize,
    /// The category's reported total (subject union or event sum)
    pub total: f64,
    /// Per-color-group segments
    pub segments: Vec<BarSegment>,
}

/// One trellis panel of bar-chart output
#[derive(Debug, Clone, Serialize)]
pub struct TrellisedBarChart {
    /// Panel labels
    pub trellis: Vec<TrellisOption>,
    /// Ordered categories with their segments
    pub categories: Vec<BarCategory>,
}

/// Aggregate grouped tallies into per-trellis bar series
#[must_use]
pub fn aggregate(
    tallies: &FxHashMap<GroupByKey, GroupTally>,
    count_type: CountType,
    colors: &mut ColoringService,
) -> Vec<TrellisedBarChart> {
    // Partition buckets into trellis panels
    let mut panels: FxHashMap<GroupByKey, Vec<(&GroupByKey, &GroupTally)>> = FxHashMap::default();
    for (key, tally) in tallies {
        panels.entry(key.trellis_part()).or_default().push((key, tally));
    }

    panels
        .into_iter()
        .sorted_by_key(|(trellis, _)| trellis_context(trellis))
        .map(|(trellis, buckets)| {
            let context = trellis_context(&trellis);
            build_panel(&trellis, &buckets, count_type, colors, &context)
        })
        .collect()
}

fn build_panel(
    trellis: &GroupByKey,
    buckets: &[(&GroupByKey, &GroupTally)],
    count_type: CountType,
    colors: &mut ColoringService,
    context: &str,
) -> TrellisedBarChart {
    // Per category: color group -> tally, plus the category-wide subject union
    let mut segments: FxHashMap<String, FxHashMap<String, &GroupTally>> = FxHashMap::default();
    let mut category_subjects: FxHashMap<String, FxHashSet<&str>> = FxHashMap::default();
    let mut category_events: FxHashMap<String, usize> = FxHashMap::default();

    for (key, tally) in buckets {
        let category = key
            .get(AxisRole::XAxis)
            .map_or("All", |value| value.label())
            .to_string();
        let color_by = key
            .get(AxisRole::ColorBy)
            .map_or("All", |value| value.label())
            .to_string();
        segments
            .entry(category.clone())
            .or_default()
            .insert(color_by, tally);
        category_subjects
            .entry(category.clone())
            .or_default()
            .extend(tally.subject_ids.iter().map(String::as_str));
        *category_events.entry(category).or_default() += tally.event_count;
    }

    // The union (not the sum) is the subject count for a category
    let totals: FxHashMap<String, f64> = segments
        .keys()
        .map(|category| {
            let total = match count_type {
                CountType::CountOfSubjects => {
                    category_subjects.get(category).map_or(0, FxHashSet::len) as f64
                }
                CountType::CountOfEvents => {
                    *category_events.get(category).unwrap_or(&0) as f64
                }
            };
            (category.clone(), total)
        })
        .collect();

    let categories = order_categories(&totals)
        .into_iter()
        .enumerate()
        .map(|(rank, category)| {
            let groups = &segments[&category];
            let segments = groups
                .iter()
                .sorted_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(color_by, tally)| {
                    let value = match count_type {
                        CountType::CountOfSubjects => tally.subject_ids.len() as f64,
                        CountType::CountOfEvents => tally.event_count as f64,
                    };
                    BarSegment {
                        color_by: color_by.clone(),
                        value,
                        color: colors.color_for(color_by, context),
                    }
                })
                .collect();
            BarCategory {
                rank,
                total: totals[&category],
                category,
                segments,
            }
        })
        .collect();

    TrellisedBarChart {
        trellis: trellis_options(trellis),
        categories,
    }
}
