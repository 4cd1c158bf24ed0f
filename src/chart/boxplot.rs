//! Box-plot aggregation
//!
//! Computes quartiles and IQR-bounded whiskers per (trellis, X bin) group.
//! A bin with no events in one panel still appears there with null
//! statistics when a sibling panel has data at that bin, so panels stay
//! positionally comparable.

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::chart::bar::{TrellisOption, trellis_context, trellis_options};
use crate::chart::group::{AxisRole, GroupByKey, GroupValue, order_x_values};
use crate::chart::stats::percentile;

/// Box-plot statistics for one X bin
///
/// All five statistics are null for an empty bin; outliers beyond the
/// whiskers stay included in `event_count`.
#[derive(Debug, Clone, Serialize)]
pub struct BoxPlotStats {
    /// X bin or category label
    pub x: String,
    /// The bin's sort index (bin index for continuous axes, category
    /// position for categorical axes)
    pub x_rank: i64,
    /// Lower whisker: max(min, q1 − 1.5·IQR)
    pub lower_whisker: Option<f64>,
    /// First quartile
    pub lower_quartile: Option<f64>,
    /// Median
    pub median: Option<f64>,
    /// Third quartile
    pub upper_quartile: Option<f64>,
    /// Upper whisker: min(max, q3 + 1.5·IQR)
    pub upper_whisker: Option<f64>,
    /// Number of events in the bin, outliers included
    pub event_count: usize,
}

/// One trellis panel of box-plot output
#[derive(Debug, Clone, Serialize)]
pub struct TrellisedBoxPlot {
    /// Panel labels
    pub trellis: Vec<TrellisOption>,
    /// Per-bin statistics in X order
    pub stats: Vec<BoxPlotStats>,
}

/// Aggregate grouped values into per-trellis box-plot statistics
#[must_use]
pub fn aggregate(grouped: &FxHashMap<GroupByKey, Vec<f64>>) -> Vec<TrellisedBoxPlot> {
    // Panel partition plus the global bin set shared by all panels
    let mut panels: FxHashMap<GroupByKey, FxHashMap<GroupValue, &Vec<f64>>> = FxHashMap::default();
    let mut x_weights: FxHashMap<GroupValue, f64> = FxHashMap::default();
    for (key, values) in grouped {
        let x = key
            .get(AxisRole::XAxis)
            .cloned()
            .unwrap_or(GroupValue::Empty);
        *x_weights.entry(x.clone()).or_default() += values.len() as f64;
        panels.entry(key.trellis_part()).or_default().insert(x, values);
    }

    let x_order = order_x_values(&x_weights);

    panels
        .into_iter()
        .sorted_by_key(|(trellis, _)| trellis_context(trellis))
        .map(|(trellis, bins)| {
            let stats = x_order
                .iter()
                .enumerate()
                .map(|(position, x)| {
                    let x_rank = x.bin_index().unwrap_or(position as i64);
                    match bins.get(x) {
                        Some(values) => bin_stats(x.label(), x_rank, values),
                        None => empty_bin(x.label(), x_rank),
                    }
                })
                .collect();
            TrellisedBoxPlot {
                trellis: trellis_options(&trellis),
                stats,
            }
        })
        .collect()
}

fn bin_stats(x: &str, x_rank: i64, values: &[f64]) -> BoxPlotStats {
    if values.is_empty() {
        return empty_bin(x, x_rank);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let q1 = percentile(&sorted, 0.25);
    let median = percentile(&sorted, 0.5);
    let q3 = percentile(&sorted, 0.75);
    let (lower_whisker, upper_whisker) = match (q1, q3) {
        (Some(q1), Some(q3)) => {
            let iqr = q3 - q1;
            let min = sorted[0];
            let max = sorted[sorted.len() - 1];
            (
                Some(min.max(q1 - 1.5 * iqr)),
                Some(max.min(q3 + 1.5 * iqr)),
            )
        }
        _ => (None, None),
    };

    BoxPlotStats {
        x: x.to_string(),
        x_rank,
        lower_whisker,
        lower_quartile: q1,
        median,
        upper_quartile: q3,
        upper_whisker,
        event_count: values.len(),
    }
}

fn empty_bin(x: &str, x_rank: i64) -> BoxPlotStats {
    BoxPlotStats {
        x: x.to_string(),
        x_rank,
        lower_whisker: None,
        lower_quartile: None,
        median: None,
        upper_quartile: None,
        upper_whisker: None,
        event_count: 0,
    }
}
