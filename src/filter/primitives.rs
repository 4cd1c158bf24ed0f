//! Filter primitive value-matching predicates
//!
//! Each primitive carries two things: the caller-set criterion (accepted
//! values or bounds) and the observed domain the engine recomputes from a
//! filtered subset (`available_values` / `observed_*`). An empty criterion
//! never restricts anything; null field values are admitted or rejected
//! explicitly through `include_empty`, never through errors.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::types::{FieldValue, ScalarValue};

/// The primitive kind a descriptor declares for a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    /// Accepted-value set matching
    Set,
    /// Inclusive range matching over ordered scalars
    Range,
    /// Inclusive range matching with day-granularity date semantics
    DateRange,
    /// Intersection matching against a set-valued field
    MultiValueSet,
    /// Range matching against a set-valued integer field
    MultiValueIntRange,
    /// Keyed sub-filters, one per map key
    Map(Box<FilterKind>),
}

impl FilterKind {
    /// A fresh, unrestricted primitive of this kind
    #[must_use]
    pub fn default_primitive(&self) -> FilterPrimitive {
        match self {
            Self::Set => FilterPrimitive::Set(SetFilter::default()),
            Self::Range => FilterPrimitive::Range(RangeFilter::default()),
            Self::DateRange => FilterPrimitive::DateRange(DateRangeFilter::default()),
            Self::MultiValueSet => FilterPrimitive::MultiValueSet(MultiValueSetFilter::default()),
            Self::MultiValueIntRange => {
                FilterPrimitive::MultiValueIntRange(MultiValueIntRangeFilter::default())
            }
            Self::Map(_) => FilterPrimitive::Map(MapFilter::default()),
        }
    }
}

/// Compare two scalars with numeric and temporal coercion
///
/// Range bounds are often supplied as a different scalar variant than the
/// extracted field value (integer bound against a real field, date bound
/// against a date-time field), so plain variant ordering is not enough.
pub(crate) fn compare_scalars(a: &ScalarValue, b: &ScalarValue) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        x.total_cmp(&y)
    } else if let (Some(x), Some(y)) = (a.as_datetime(), b.as_datetime()) {
        x.cmp(&y)
    } else {
        a.cmp(b)
    }
}

/// Accepted-value set filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetFilter {
    /// Accepted values; empty means no restriction
    pub values: BTreeSet<ScalarValue>,
    /// Whether records with an empty field value are accepted
    pub include_empty: bool,
    /// Distinct values observed across the last filtered subset
    pub available_values: BTreeSet<ScalarValue>,
}

impl Default for SetFilter {
    fn default() -> Self {
        Self {
            values: BTreeSet::new(),
            include_empty: true,
            available_values: BTreeSet::new(),
        }
    }
}

impl SetFilter {
    /// Create a filter accepting exactly the given values
    #[must_use]
    pub fn with_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn matches(&self, value: &FieldValue) -> bool {
        // An empty criterion matches everything, empties included
        if self.values.is_empty() {
            return true;
        }
        match value {
            FieldValue::Empty => self.include_empty,
            FieldValue::Scalar(v) => self.values.contains(v),
            FieldValue::Many(items) => items.iter().any(|v| self.values.contains(v)),
            FieldValue::Mapped(_) => false,
        }
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn observe(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Scalar(v) => {
                self.available_values.insert(v.clone());
            }
            FieldValue::Many(items) => {
                self.available_values.extend(items.iter().cloned());
            }
            FieldValue::Empty | FieldValue::Mapped(_) => {}
        }
    }
}

/// Inclusive range filter over ordered scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeFilter {
    /// Lower bound (inclusive), if any
    pub from: Option<ScalarValue>,
    /// Upper bound (inclusive), if any
    pub to: Option<ScalarValue>,
    /// Whether records with an empty field value are accepted
    pub include_empty: bool,
    /// Smallest value observed across the last filtered subset
    pub observed_min: Option<ScalarValue>,
    /// Largest value observed across the last filtered subset
    pub observed_max: Option<ScalarValue>,
}

impl Default for RangeFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            include_empty: true,
            observed_min: None,
            observed_max: None,
        }
    }
}

impl RangeFilter {
    /// Create a filter with the given inclusive bounds
    #[must_use]
    pub fn between<V: Into<ScalarValue>>(from: Option<V>, to: Option<V>) -> Self {
        Self {
            from: from.map(Into::into),
            to: to.map(Into::into),
            ..Self::default()
        }
    }

    fn matches(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Scalar(v) => self.in_bounds(v),
            // include_empty governs nulls even when both bounds are absent
            _ => self.include_empty && value.is_empty(),
        }
    }

    fn in_bounds(&self, v: &ScalarValue) -> bool {
        let above = self
            .from
            .as_ref()
            .is_none_or(|from| compare_scalars(v, from) != Ordering::Less);
        let below = self
            .to
            .as_ref()
            .is_none_or(|to| compare_scalars(v, to) != Ordering::Greater);
        above && below
    }

    fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.include_empty
    }

    fn observe(&mut self, value: &FieldValue) {
        if let FieldValue::Scalar(v) = value {
            let lower = self
                .observed_min
                .as_ref()
                .is_none_or(|min| compare_scalars(v, min) == Ordering::Less);
            if lower {
                self.observed_min = Some(v.clone());
            }
            let higher = self
                .observed_max
                .as_ref()
                .is_none_or(|max| compare_scalars(v, max) == Ordering::Greater);
            if higher {
                self.observed_max = Some(v.clone());
            }
        }
    }
}

/// Inclusive date range filter with day-granularity semantics
///
/// The upper bound is normalized to 23:59:59.999 of its day, so a `to`
/// date admits every timestamp falling on that calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeFilter {
    /// First accepted day, if any
    pub from: Option<NaiveDate>,
    /// Last accepted day, if any
    pub to: Option<NaiveDate>,
    /// Whether records with an empty field value are accepted
    pub include_empty: bool,
    /// Earliest timestamp observed across the last filtered subset
    pub observed_min: Option<NaiveDateTime>,
    /// Latest timestamp observed across the last filtered subset
    pub observed_max: Option<NaiveDateTime>,
}

impl Default for DateRangeFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            include_empty: true,
            observed_min: None,
            observed_max: None,
        }
    }
}

impl DateRangeFilter {
    /// Create a filter accepting the given inclusive day range
    #[must_use]
    pub fn between(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self {
            from,
            to,
            ..Self::default()
        }
    }

    fn matches(&self, value: &FieldValue) -> bool {
        let Some(instant) = value.as_scalar().and_then(ScalarValue::as_datetime) else {
            // Non-temporal values read as empty for a date filter
            return self.include_empty && value.is_empty();
        };
        let after_start = self
            .from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .is_none_or(|start| instant >= start);
        let before_end = self
            .to
            .and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999))
            .is_none_or(|end| instant <= end);
        after_start && before_end
    }

    fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.include_empty
    }

    fn observe(&mut self, value: &FieldValue) {
        if let Some(instant) = value.as_scalar().and_then(ScalarValue::as_datetime) {
            if self.observed_min.is_none_or(|min| instant < min) {
                self.observed_min = Some(instant);
            }
            if self.observed_max.is_none_or(|max| instant > max) {
                self.observed_max = Some(instant);
            }
        }
    }
}

/// Intersection filter for set-valued fields
///
/// A record matches when any element of its field value is in the accepted
/// set. Availability is the union of all elements across matched records:
/// a record matching on one element still contributes its other elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MultiValueSetFilter {
    /// Accepted values; empty means no restriction
    pub values: BTreeSet<ScalarValue>,
    /// Union of field elements observed across the last filtered subset
    pub available_values: BTreeSet<ScalarValue>,
}

impl MultiValueSetFilter {
    /// Create a filter accepting records intersecting the given values
    #[must_use]
    pub fn with_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
            available_values: BTreeSet::new(),
        }
    }

    fn matches(&self, value: &FieldValue) -> bool {
        if self.values.is_empty() {
            return true;
        }
        match value {
            FieldValue::Many(items) => items.iter().any(|v| self.values.contains(v)),
            FieldValue::Scalar(v) => self.values.contains(v),
            FieldValue::Empty | FieldValue::Mapped(_) => false,
        }
    }

    fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn observe(&mut self, value: &FieldValue) {
        match value {
            FieldValue::Many(items) => self.available_values.extend(items.iter().cloned()),
            FieldValue::Scalar(v) => {
                self.available_values.insert(v.clone());
            }
            FieldValue::Empty | FieldValue::Mapped(_) => {}
        }
    }
}

/// Range filter against a set-valued integer field
///
/// A record matches when any element of the field falls inside the bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiValueIntRangeFilter {
    /// Lower bound (inclusive), if any
    pub from: Option<i64>,
    /// Upper bound (inclusive), if any
    pub to: Option<i64>,
    /// Whether records with an empty field value are accepted
    pub include_empty: bool,
    /// Smallest element observed across the last filtered subset
    pub observed_min: Option<i64>,
    /// Largest element observed across the last filtered subset
    pub observed_max: Option<i64>,
}

impl Default for MultiValueIntRangeFilter {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            include_empty: true,
            observed_min: None,
            observed_max: None,
        }
    }
}

impl MultiValueIntRangeFilter {
    /// Create a filter with the given inclusive bounds
    #[must_use]
    pub fn between(from: Option<i64>, to: Option<i64>) -> Self {
        Self {
            from,
            to,
            ..Self::default()
        }
    }

    fn element_in_bounds(&self, v: i64) -> bool {
        self.from.is_none_or(|from| v >= from) && self.to.is_none_or(|to| v <= to)
    }

    fn matches(&self, value: &FieldValue) -> bool {
        match value {
            FieldValue::Many(items) => items
                .iter()
                .any(|v| matches!(v, ScalarValue::Int(i) if self.element_in_bounds(*i))),
            FieldValue::Scalar(ScalarValue::Int(i)) => self.element_in_bounds(*i),
            _ => self.include_empty && value.is_empty(),
        }
    }

    fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none() && self.include_empty
    }

    fn observe(&mut self, value: &FieldValue) {
        let elements: &[ScalarValue] = match value {
            FieldValue::Many(items) => items,
            FieldValue::Scalar(v) => std::slice::from_ref(v),
            FieldValue::Empty | FieldValue::Mapped(_) => &[],
        };
        for element in elements {
            if let ScalarValue::Int(i) = element {
                if self.observed_min.is_none_or(|min| *i < min) {
                    self.observed_min = Some(*i);
                }
                if self.observed_max.is_none_or(|max| *i > max) {
                    self.observed_max = Some(*i);
                }
            }
        }
    }
}

/// A mapping of key to sub-filter (e.g. per-drug sub-criteria)
///
/// A record matches iff every non-empty sub-filter matches the record's
/// value for that key; a key absent from the record reads as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapFilter {
    /// Sub-filters keyed by the map key they apply to
    pub filters: BTreeMap<String, FilterPrimitive>,
}

impl MapFilter {
    /// Create a filter from the given keyed sub-filters
    #[must_use]
    pub fn with_filters<I>(filters: I) -> Self
    where
        I: IntoIterator<Item = (String, FilterPrimitive)>,
    {
        Self {
            filters: filters.into_iter().collect(),
        }
    }

    fn matches(&self, value: &FieldValue) -> bool {
        let empty = FieldValue::Empty;
        self.filters
            .iter()
            .filter(|(_, sub)| !sub.is_empty())
            .all(|(key, sub)| {
                let keyed = match value {
                    FieldValue::Mapped(entries) => entries.get(key).unwrap_or(&empty),
                    _ => &empty,
                };
                sub.matches(keyed)
            })
    }

    fn is_empty(&self) -> bool {
        self.filters.values().all(FilterPrimitive::is_empty)
    }

    fn reset_observed(&mut self) {
        for sub in self.filters.values_mut() {
            sub.reset_observed();
        }
    }

    fn observe(&mut self, value: &FieldValue, sub_kind: &FilterKind) {
        if let FieldValue::Mapped(entries) = value {
            for (key, keyed) in entries {
                let sub = self
                    .filters
                    .entry(key.clone())
                    .or_insert_with(|| sub_kind.default_primitive());
                sub.observe(keyed, sub_kind);
            }
        }
    }
}

/// One value-matching predicate attached to a named filter field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterPrimitive {
    /// Accepted-value set matching
    Set(SetFilter),
    /// Inclusive range matching
    Range(RangeFilter),
    /// Day-granular date range matching
    DateRange(DateRangeFilter),
    /// Intersection matching against a set-valued field
    MultiValueSet(MultiValueSetFilter),
    /// Range matching against a set-valued integer field
    MultiValueIntRange(MultiValueIntRangeFilter),
    /// Keyed sub-filters
    Map(MapFilter),
}

impl FilterPrimitive {
    /// Whether the record's field value satisfies this criterion
    #[must_use]
    pub fn matches(&self, value: &FieldValue) -> bool {
        match self {
            Self::Set(f) => f.matches(value),
            Self::Range(f) => f.matches(value),
            Self::DateRange(f) => f.matches(value),
            Self::MultiValueSet(f) => f.matches(value),
            Self::MultiValueIntRange(f) => f.matches(value),
            Self::Map(f) => f.matches(value),
        }
    }

    /// Whether this criterion currently imposes no restriction at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Set(f) => f.is_empty(),
            Self::Range(f) => f.is_empty(),
            Self::DateRange(f) => f.is_empty(),
            Self::MultiValueSet(f) => f.is_empty(),
            Self::MultiValueIntRange(f) => f.is_empty(),
            Self::Map(f) => f.is_empty(),
        }
    }

    /// Clear the observed domain ahead of a fresh recomputation pass
    pub fn reset_observed(&mut self) {
        match self {
            Self::Set(f) => f.available_values.clear(),
            Self::Range(f) => {
                f.observed_min = None;
                f.observed_max = None;
            }
            Self::DateRange(f) => {
                f.observed_min = None;
                f.observed_max = None;
            }
            Self::MultiValueSet(f) => f.available_values.clear(),
            Self::MultiValueIntRange(f) => {
                f.observed_min = None;
                f.observed_max = None;
            }
            Self::Map(f) => f.reset_observed(),
        }
    }

    /// Fold one matched record's field value into the observed domain
    ///
    /// `kind` supplies the sub-filter kind for map entries first seen during
    /// the pass; other primitives ignore it.
    pub fn observe(&mut self, value: &FieldValue, kind: &FilterKind) {
        match self {
            Self::Set(f) => f.observe(value),
            Self::Range(f) => f.observe(value),
            Self::DateRange(f) => f.observe(value),
            Self::MultiValueSet(f) => f.observe(value),
            Self::MultiValueIntRange(f) => f.observe(value),
            Self::Map(f) => match kind {
                FilterKind::Map(sub_kind) => f.observe(value, sub_kind),
                // Fall back to set semantics when the declared kind is not a map
                _ => f.observe(value, &FilterKind::Set),
            },
        }
    }
}
