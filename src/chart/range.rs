//! Range-plot aggregation
//!
//! Computes mean and spread per (trellis, series, X bin) group. Error-bar
//! bounds are mean ± standard error; series with no data points are
//! omitted rather than zero-filled.

use itertools::Itertools;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::chart::bar::{TrellisOption, trellis_context, trellis_options};
use crate::chart::group::{AxisRole, GroupByKey, GroupValue, order_x_values};
use crate::chart::stats::{mean, sample_std_dev};

/// One X position of a range-plot series
#[derive(Debug, Clone, Serialize)]
pub struct RangePoint {
    /// X bin or category label
    pub x: String,
    /// The bin's sort index
    pub x_rank: i64,
    /// Number of values aggregated into this point
    pub data_points: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Lower error-bar bound: mean − standard error
    pub min: f64,
    /// Upper error-bar bound: mean + standard error
    pub max: f64,
    /// Sample standard deviation (n − 1); null for a single value
    pub std_dev: Option<f64>,
    /// Standard error of the mean; null for a single value
    pub std_err: Option<f64>,
}

/// One named series of a range plot
#[derive(Debug, Clone, Serialize)]
pub struct RangeSeries {
    /// Series name composed from the series-by and name axes
    pub name: String,
    /// Points in X order
    pub points: Vec<RangePoint>,
}

/// One trellis panel of range-plot output
#[derive(Debug, Clone, Serialize)]
pub struct TrellisedRangePlot {
    /// Panel labels
    pub trellis: Vec<TrellisOption>,
    /// Named series with at least one data point each
    pub series: Vec<RangeSeries>,
}

/// Aggregate grouped values into per-trellis named range-plot series
#[must_use]
pub fn aggregate(grouped: &FxHashMap<GroupByKey, Vec<f64>>) -> Vec<TrellisedRangePlot> {
    let mut panels: FxHashMap<GroupByKey, FxHashMap<String, FxHashMap<GroupValue, &Vec<f64>>>> =
        FxHashMap::default();
    let mut x_weights: FxHashMap<GroupValue, f64> = FxHashMap::default();
    for (key, values) in grouped {
        if values.is_empty() {
            continue;
        }
        let x = key
            .get(AxisRole::XAxis)
            .cloned()
            .unwrap_or(GroupValue::Empty);
        *x_weights.entry(x.clone()).or_default() += values.len() as f64;
        panels
            .entry(key.trellis_part())
            .or_default()
            .entry(series_name(key))
            .or_default()
            .insert(x, values);
    }

    let x_order = order_x_values(&x_weights);

    panels
        .into_iter()
        .sorted_by_key(|(trellis, _)| trellis_context(trellis))
        .map(|(trellis, series_map)| {
            let series = series_map
                .into_iter()
                .sorted_by(|(a, _), (b, _)| a.cmp(b))
                .map(|(name, bins)| RangeSeries {
                    name,
                    points: series_points(&x_order, &bins),
                })
                .collect();
            TrellisedRangePlot {
                trellis: trellis_options(&trellis),
                series,
            }
        })
        .collect()
}

/// Compose the series name from the series-by and name axis values
fn series_name(key: &GroupByKey) -> String {
    let series = key.get(AxisRole::SeriesBy).map(GroupValue::label);
    let name = key.get(AxisRole::Name).map(GroupValue::label);
    match (series, name) {
        (Some(series), Some(name)) => format!("{series} ({name})"),
        (Some(series), None) => series.to_string(),
        (None, Some(name)) => name.to_string(),
        (None, None) => "All".to_string(),
    }
}

fn series_points(
    x_order: &[GroupValue],
    bins: &FxHashMap<GroupValue, &Vec<f64>>,
) -> Vec<RangePoint> {
    x_order
        .iter()
        .enumerate()
        .filter_map(|(position, x)| {
            let values = bins.get(x)?;
            let x_rank = x.bin_index().unwrap_or(position as i64);
            Some(point_stats(x.label(), x_rank, values))
        })
        .collect()
}

fn point_stats(x: &str, x_rank: i64, values: &[f64]) -> RangePoint {
    // Callers never pass an empty group, so the mean is always defined
    let mean = mean(values).unwrap_or(0.0);
    let std_dev = sample_std_dev(values);
    let std_err = std_dev.map(|sd| sd / (values.len() as f64).sqrt());
    let spread = std_err.unwrap_or(0.0);
    RangePoint {
        x: x.to_string(),
        x_rank,
        data_points: values.len(),
        mean,
        min: mean - spread,
        max: mean + spread,
        std_dev,
        std_err,
    }
}
