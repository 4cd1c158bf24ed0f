//! Grouping and trellising
//!
//! Maps each record to a composite key along the configured chart axes,
//! including continuous-value binning and days-since-dose normalization.
//! The key is what all three statistical aggregators bucket by.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::Result;
use crate::filter::descriptor::{EntityDescriptor, FieldDescriptor};
use crate::models::event::Event;
use crate::models::types::{FieldValue, ScalarValue, Severity};

/// Label reported for records with no value on a grouping axis
pub const EMPTY_LABEL: &str = "(Empty)";

/// The chart role a grouping axis plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AxisRole {
    /// Horizontal axis of the chart
    XAxis,
    /// Sub-grouping rendered as color within a bar or series
    ColorBy,
    /// Named series split (e.g. one series per treatment arm)
    SeriesBy,
    /// Secondary series naming (e.g. data source)
    Name,
    /// Facet/panel dimension; several trellis levels are allowed
    Trellis(u8),
}

impl fmt::Display for AxisRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XAxis => write!(f, "x-axis"),
            Self::ColorBy => write!(f, "color-by"),
            Self::SeriesBy => write!(f, "series-by"),
            Self::Name => write!(f, "name"),
            Self::Trellis(level) => write!(f, "trellis-{level}"),
        }
    }
}

/// One component of a group key: a categorical label or a binned interval
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupValue {
    /// The record had no value on this axis
    Empty,
    /// Raw categorical value
    Category(String),
    /// Binned continuous value; `index` orders bins, `label` renders them
    Bin {
        /// Bin index = floor(value / bin size)
        index: i64,
        /// Human-readable interval label
        label: String,
    },
}

impl GroupValue {
    /// The rendering label for this component
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Empty => EMPTY_LABEL,
            Self::Category(label) => label,
            Self::Bin { label, .. } => label,
        }
    }

    /// The bin index, when this component is a binned interval
    #[must_use]
    pub fn bin_index(&self) -> Option<i64> {
        match self {
            Self::Bin { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Composite key identifying one aggregation bucket across all axes
///
/// Entries are kept sorted by role, so equality and hashing are stable
/// regardless of configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct GroupByKey {
    entries: SmallVec<[(AxisRole, GroupValue); 4]>,
}

impl GroupByKey {
    /// Create an empty key
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value for a role
    pub fn insert(&mut self, role: AxisRole, value: GroupValue) {
        match self.entries.binary_search_by_key(&role, |(r, _)| *r) {
            Ok(pos) => self.entries[pos].1 = value,
            Err(pos) => self.entries.insert(pos, (role, value)),
        }
    }

    /// The value for a role, if present
    #[must_use]
    pub fn get(&self, role: AxisRole) -> Option<&GroupValue> {
        self.entries
            .binary_search_by_key(&role, |(r, _)| *r)
            .ok()
            .map(|pos| &self.entries[pos].1)
    }

    /// Iterate over (role, value) entries in role order
    pub fn iter(&self) -> impl Iterator<Item = &(AxisRole, GroupValue)> {
        self.entries.iter()
    }

    /// The sub-key of all trellis components
    #[must_use]
    pub fn trellis_part(&self) -> Self {
        self.project(|role| matches!(role, AxisRole::Trellis(_)))
    }

    /// A sub-key keeping only the roles accepted by the predicate
    #[must_use]
    pub fn project<F: Fn(AxisRole) -> bool>(&self, keep: F) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(role, _)| keep(*role))
                .cloned()
                .collect(),
        }
    }
}

/// How a timestamp axis is normalized before binning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampType {
    /// Raw calendar date
    Date,
    /// Days from the subject's first dose to the event
    DaysSinceFirstDose,
    /// Days from the subject's randomization to the event
    DaysSinceRandomization,
}

/// Configuration of a single grouping axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisOptions {
    /// Record field feeding this axis
    pub field: String,
    /// Bin width; absent means the axis is categorical
    pub bin_size: Option<f64>,
    /// Timestamp normalization applied before binning
    pub timestamp_type: Option<TimestampType>,
}

impl AxisOptions {
    /// A categorical axis over the given field
    #[must_use]
    pub fn categorical(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            bin_size: None,
            timestamp_type: None,
        }
    }

    /// A binned continuous axis over the given field
    #[must_use]
    pub fn binned(field: impl Into<String>, bin_size: f64) -> Self {
        Self {
            field: field.into(),
            bin_size: Some(bin_size),
            timestamp_type: None,
        }
    }

    /// A binned timestamp axis with the given normalization
    #[must_use]
    pub fn timeline(field: impl Into<String>, bin_size: f64, timestamp_type: TimestampType) -> Self {
        Self {
            field: field.into(),
            bin_size: Some(bin_size),
            timestamp_type: Some(timestamp_type),
        }
    }
}

/// Declares which record field feeds which axis role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartGroupByOptions {
    axes: Vec<(AxisRole, AxisOptions)>,
}

impl ChartGroupByOptions {
    /// Create options with no axes configured
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style axis configuration
    #[must_use]
    pub fn with_axis(mut self, role: AxisRole, options: AxisOptions) -> Self {
        self.axes.push((role, options));
        self
    }

    /// The configuration for a role, if present
    #[must_use]
    pub fn axis(&self, role: AxisRole) -> Option<&AxisOptions> {
        self.axes
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, options)| options)
    }

    /// Iterate over the configured axes
    pub fn iter(&self) -> impl Iterator<Item = &(AxisRole, AxisOptions)> {
        self.axes.iter()
    }
}

/// Maps records to group keys along resolved, validated axes
///
/// Construction resolves every configured field against the entity
/// descriptor, so a misconfigured axis fails here rather than per record.
#[derive(Debug, Clone)]
pub struct GroupKeyMapper<R> {
    axes: Vec<(AxisRole, FieldDescriptor<R>, AxisOptions)>,
}

impl<R: Event> GroupKeyMapper<R> {
    /// Resolve chart options against an entity descriptor
    ///
    /// # Errors
    /// Returns an error if an axis names a field the descriptor does not
    /// declare.
    pub fn new(descriptor: &EntityDescriptor<R>, options: &ChartGroupByOptions) -> Result<Self> {
        let mut axes = Vec::new();
        for (role, axis) in options.iter() {
            let field = descriptor.require(&axis.field)?.clone();
            axes.push((*role, field, axis.clone()));
        }
        Ok(Self { axes })
    }

    /// Compute the composite group key for one record
    #[must_use]
    pub fn key_of(&self, record: &R) -> GroupByKey {
        let mut key = GroupByKey::new();
        for (role, field, options) in &self.axes {
            let value = field.extract(record);
            let component = match options.bin_size {
                Some(bin_size) => bin_component(record, &value, bin_size, options.timestamp_type),
                None => category_component(&value),
            };
            key.insert(*role, component);
        }
        key
    }
}

/// The categorical key component for a raw field value
fn category_component(value: &FieldValue) -> GroupValue {
    match value {
        FieldValue::Scalar(v) => GroupValue::Category(v.to_string()),
        FieldValue::Many(items) if !items.is_empty() => {
            GroupValue::Category(items.iter().map(ToString::to_string).join(", "))
        }
        _ => GroupValue::Empty,
    }
}

/// The binned key component for a continuous field value
fn bin_component<R: Event>(
    record: &R,
    value: &FieldValue,
    bin_size: f64,
    timestamp_type: Option<TimestampType>,
) -> GroupValue {
    if bin_size <= 0.0 {
        return category_component(value);
    }
    let Some(scalar) = value.as_scalar() else {
        return GroupValue::Empty;
    };
    let Some(numeric) = axis_value(record, scalar, timestamp_type) else {
        return GroupValue::Empty;
    };
    let index = (numeric / bin_size).floor() as i64;
    let label = bin_label(index, bin_size, timestamp_type);
    GroupValue::Bin { index, label }
}

/// The continuous value a scalar contributes to a binned axis
fn axis_value<R: Event>(
    record: &R,
    scalar: &ScalarValue,
    timestamp_type: Option<TimestampType>,
) -> Option<f64> {
    match timestamp_type {
        None => scalar.as_f64(),
        Some(TimestampType::Date) => scalar
            .as_datetime()
            .map(|dt| f64::from(dt.date().num_days_from_ce())),
        Some(TimestampType::DaysSinceFirstDose) => {
            days_since(scalar, record.subject().first_dose_date)
        }
        Some(TimestampType::DaysSinceRandomization) => {
            days_since(scalar, record.subject().randomization_date)
        }
    }
}

fn days_since(scalar: &ScalarValue, origin: Option<NaiveDate>) -> Option<f64> {
    let event_day = scalar.as_datetime()?.date();
    let origin = origin?;
    Some((event_day - origin).num_days() as f64)
}

/// Human-readable label for a bin
fn bin_label(index: i64, bin_size: f64, timestamp_type: Option<TimestampType>) -> String {
    let integral = bin_size.fract() == 0.0;
    if timestamp_type == Some(TimestampType::Date) && integral {
        let width = bin_size as i64;
        let start = NaiveDate::from_num_days_from_ce_opt((index * width) as i32);
        let end = NaiveDate::from_num_days_from_ce_opt(((index + 1) * width - 1) as i32);
        if let (Some(start), Some(end)) = (start, end) {
            return if width == 1 {
                format!("{start}")
            } else {
                format!("{start} - {end}")
            };
        }
    }
    if integral {
        let width = bin_size as i64;
        let lo = index * width;
        if width == 1 {
            format!("{lo}")
        } else {
            format!("{lo} - {}", lo + width - 1)
        }
    } else {
        let start = index as f64 * bin_size;
        format!("{start} - {}", start + bin_size)
    }
}

/// Per-bucket tallies feeding the bar-chart aggregator
#[derive(Debug, Clone, Default)]
pub struct GroupTally {
    /// Distinct subject ids contributing to the bucket
    pub subject_ids: FxHashSet<String>,
    /// Literal event count in the bucket
    pub event_count: usize,
}

/// Bucket every record by its group key, tallying subjects and events
#[must_use]
pub fn tally_events<R: Event>(
    records: &[R],
    mapper: &GroupKeyMapper<R>,
) -> FxHashMap<GroupByKey, GroupTally> {
    let mut tallies: FxHashMap<GroupByKey, GroupTally> = FxHashMap::default();
    for record in records {
        let tally = tallies.entry(mapper.key_of(record)).or_default();
        tally.subject_ids.insert(record.subject_id().to_string());
        tally.event_count += 1;
    }
    tallies
}

/// Bucket a numeric field's values by group key
///
/// Records without a numeric value on the field contribute nothing.
#[must_use]
pub fn group_numeric_values<R: Event>(
    records: &[R],
    mapper: &GroupKeyMapper<R>,
    value_field: &FieldDescriptor<R>,
) -> FxHashMap<GroupByKey, Vec<f64>> {
    let mut groups: FxHashMap<GroupByKey, Vec<f64>> = FxHashMap::default();
    for record in records {
        let Some(value) = value_field.extract(record).as_scalar().and_then(ScalarValue::as_f64)
        else {
            continue;
        };
        groups.entry(mapper.key_of(record)).or_default().push(value);
    }
    groups
}

/// Order X-axis group values for presentation
///
/// Binned values sort by bin index; categorical values follow
/// [`order_categories`] with the given per-value weights. Binned values
/// come first when the two are mixed.
#[must_use]
pub fn order_x_values(weights: &FxHashMap<GroupValue, f64>) -> Vec<GroupValue> {
    let (bins, categories): (Vec<&GroupValue>, Vec<&GroupValue>) = weights
        .keys()
        .partition(|value| matches!(value, GroupValue::Bin { .. }));

    let mut ordered: Vec<GroupValue> = bins
        .into_iter()
        .sorted_by_key(|value| value.bin_index())
        .cloned()
        .collect();

    let category_weights: FxHashMap<String, f64> = categories
        .iter()
        .map(|value| (value.label().to_string(), weights[*value]))
        .collect();
    for label in order_categories(&category_weights) {
        if let Some(value) = categories.iter().find(|value| value.label() == label) {
            ordered.push((*value).clone());
        }
    }
    ordered
}

/// Order category labels for presentation
///
/// Labels on a known clinical scale (severity) sort by that precedence;
/// otherwise categories sort by total aggregate value descending with an
/// alphabetical tie-break. The empty marker always sorts last.
#[must_use]
pub fn order_categories(totals: &FxHashMap<String, f64>) -> Vec<String> {
    let known_scale = totals
        .keys()
        .filter(|label| label.as_str() != EMPTY_LABEL)
        .all(|label| Severity::from(label.as_str()).precedence().is_some());
    let on_scale = !totals.is_empty() && known_scale;

    totals
        .iter()
        .sorted_by(|(a_label, a_total), (b_label, b_total)| {
            let a_empty = a_label.as_str() == EMPTY_LABEL;
            let b_empty = b_label.as_str() == EMPTY_LABEL;
            if a_empty != b_empty {
                return a_empty.cmp(&b_empty);
            }
            if on_scale {
                let a_rank = Severity::from(a_label.as_str()).precedence();
                let b_rank = Severity::from(b_label.as_str()).precedence();
                return a_rank.cmp(&b_rank).then_with(|| a_label.cmp(b_label));
            }
            b_total
                .total_cmp(a_total)
                .then_with(|| a_label.cmp(b_label))
        })
        .map(|(label, _)| label.clone())
        .collect()
}
