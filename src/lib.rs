//! Imihigo progress engine.
//!
//! Turns submitted indicator values into capped 0-100% completion scores per
//! indicator and quarter, then rolls those up into pillar and district-wide
//! progress.
//!
//! Leaf to root: [`util::parse_value`] normalizes curated values,
//! [`catalogue::Catalogue`] holds the resolved indicator definitions,
//! [`progress`] scores one indicator for one quarter, and [`reports`]
//! aggregates pillars.
pub mod catalogue;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod progress;
pub mod reports;
pub mod types;
pub mod util;

pub use catalogue::{Catalogue, CatalogueIssue, IssueKind, Pillar};
pub use error::LoadError;
pub use progress::{annual_progress, calculate_quarter_progress, score_indicator};
pub use reports::{district_summary, indicator_rows, pillar_rows};
pub use types::{
    Entry, Indicator, IndicatorKind, MeasurementType, PillarProgressRow, PillarRecord, Quarter,
    QuarterProgress, SubIndicator, Targets, Trend,
};
