//! Chart aggregation
//!
//! This module provides the grouping/trellising abstraction, the three
//! statistical aggregators (bar counts, box-plot quartiles, range-plot
//! mean/variance), and the deterministic coloring service.

pub mod bar;
pub mod boxplot;
pub mod color;
pub mod group;
pub mod range;
pub mod stats;

pub use bar::{BarCategory, BarSegment, CountType, TrellisOption, TrellisedBarChart};
pub use boxplot::{BoxPlotStats, TrellisedBoxPlot};
pub use color::{ColoringService, PaletteVariant, is_valid_color};
pub use group::{
    AxisOptions, AxisRole, ChartGroupByOptions, GroupByKey, GroupKeyMapper, GroupTally,
    GroupValue, TimestampType, group_numeric_values, tally_events,
};
pub use range::{RangePoint, RangeSeries, TrellisedRangePlot};
