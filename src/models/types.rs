//! Common domain value types
//!
//! This module contains the dynamic field value representation shared by all
//! entity descriptors, plus common clinical enum types. A single `FieldValue`
//! shape is what lets one generic filter engine serve dozens of unrelated
//! record types without per-type matching logic.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single scalar value observed on a record field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScalarValue {
    /// Free-text or coded string value
    Str(String),
    /// Integer value
    Int(i64),
    /// Floating point value
    Real(f64),
    /// Calendar date value
    Date(NaiveDate),
    /// Date and time value
    DateTime(NaiveDateTime),
    /// Boolean value
    Bool(bool),
}

impl ScalarValue {
    /// Rank used to order values of different variants deterministically
    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Str(_) => 0,
            Self::Int(_) => 1,
            Self::Real(_) => 2,
            Self::Date(_) => 3,
            Self::DateTime(_) => 4,
            Self::Bool(_) => 5,
        }
    }

    /// Numeric view of the value, if it has one
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Date-time view of the value, if it has one
    ///
    /// Plain dates are promoted to midnight so date and date-time values
    /// compare on a common axis.
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => d.and_hms_opt(0, 0, 0),
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{v}"),
            Self::DateTime(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{}", if *v { "Yes" } else { "No" }),
        }
    }
}

impl PartialEq for ScalarValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScalarValue {}

impl PartialOrd for ScalarValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScalarValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Real(a), Self::Real(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::DateTime(a), Self::DateTime(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl Hash for ScalarValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Self::Str(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Real(v) => v.to_bits().hash(state),
            Self::Date(v) => v.hash(state),
            Self::DateTime(v) => v.hash(state),
            Self::Bool(v) => v.hash(state),
        }
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<NaiveDate> for ScalarValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for ScalarValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// A field value extracted from a record by an entity descriptor
///
/// `Empty` stands in for null, missing, and unknown values alike; filter
/// primitives handle it explicitly via their `include_empty` semantics
/// rather than through errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldValue {
    /// No value present on the record
    Empty,
    /// A single scalar value
    Scalar(ScalarValue),
    /// A set-valued field (zero or more elements)
    Many(Vec<ScalarValue>),
    /// A keyed field (e.g. per-drug causality), one sub-value per key
    Mapped(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Whether the value counts as empty for `include_empty` handling
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Scalar(_) => false,
            Self::Many(items) => items.is_empty(),
            Self::Mapped(entries) => entries.is_empty(),
        }
    }

    /// Build a set-valued field, canonicalizing an empty list to `Empty`
    #[must_use]
    pub fn many<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let items: Vec<ScalarValue> = items.into_iter().map(Into::into).collect();
        if items.is_empty() {
            Self::Empty
        } else {
            Self::Many(items)
        }
    }

    /// Build a keyed field, canonicalizing an empty map to `Empty`
    #[must_use]
    pub fn mapped(entries: BTreeMap<String, FieldValue>) -> Self {
        if entries.is_empty() {
            Self::Empty
        } else {
            Self::Mapped(entries)
        }
    }

    /// The scalar inside a `Scalar` value, if any
    #[must_use]
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Scalar(v) => Some(v),
            _ => None,
        }
    }

    /// Human-readable label for grouping and display
    #[must_use]
    pub fn label(&self) -> Option<String> {
        self.as_scalar().map(ToString::to_string)
    }
}

impl From<ScalarValue> for FieldValue {
    fn from(v: ScalarValue) -> Self {
        Self::Scalar(v)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Empty, |v| Self::Scalar(v.into()))
    }
}

/// Adverse event severity using the standard five-point scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Grade 1: mild
    Mild,
    /// Grade 2: moderate
    Moderate,
    /// Grade 3: severe
    Severe,
    /// Grade 4: life-threatening
    LifeThreatening,
    /// Grade 5: fatal
    Fatal,
    /// Severity not recorded or not recognized
    Unknown,
}

impl Severity {
    /// Position on the clinical severity scale, lowest first
    ///
    /// `Unknown` has no position and sorts by the fallback rules instead.
    #[must_use]
    pub fn precedence(self) -> Option<usize> {
        match self {
            Self::Mild => Some(0),
            Self::Moderate => Some(1),
            Self::Severe => Some(2),
            Self::LifeThreatening => Some(3),
            Self::Fatal => Some(4),
            Self::Unknown => None,
        }
    }
}

impl From<&str> for Severity {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mild" | "grade 1" | "1" => Self::Mild,
            "moderate" | "grade 2" | "2" => Self::Moderate,
            "severe" | "grade 3" | "3" => Self::Severe,
            "life-threatening" | "life threatening" | "grade 4" | "4" => Self::LifeThreatening,
            "fatal" | "death" | "grade 5" | "5" => Self::Fatal,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Mild => "Mild",
            Self::Moderate => "Moderate",
            Self::Severe => "Severe",
            Self::LifeThreatening => "Life-threatening",
            Self::Fatal => "Fatal",
            Self::Unknown => "Unknown",
        };
        write!(f, "{label}")
    }
}
