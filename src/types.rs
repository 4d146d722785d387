use chrono::Month;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

use crate::util::parse_value;

/// A target or actual exactly as curated by hand: either a number or free
/// text such as `"80%"`, `"1,000"` or the `"-"` placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTargets {
    pub q1: Option<RawValue>,
    pub q2: Option<RawValue>,
    pub q3: Option<RawValue>,
    pub q4: Option<RawValue>,
    pub annual: Option<RawValue>,
}

/// Reporting quarter of the fiscal year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    pub fn id(self) -> &'static str {
        match self {
            Quarter::Q1 => "q1",
            Quarter::Q2 => "q2",
            Quarter::Q3 => "q3",
            Quarter::Q4 => "q4",
        }
    }

    /// Accepts `q1`..`q4` in any case, surrounding whitespace ignored.
    pub fn parse(s: &str) -> Option<Quarter> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q1" => Some(Quarter::Q1),
            "q2" => Some(Quarter::Q2),
            "q3" => Some(Quarter::Q3),
            "q4" => Some(Quarter::Q4),
            _ => None,
        }
    }

    /// Zero-based position within the year.
    pub fn index(self) -> usize {
        match self {
            Quarter::Q1 => 0,
            Quarter::Q2 => 1,
            Quarter::Q3 => 2,
            Quarter::Q4 => 3,
        }
    }

    /// Months of the quarter. The fiscal year runs July to June.
    pub fn months(self) -> [Month; 3] {
        match self {
            Quarter::Q1 => [Month::July, Month::August, Month::September],
            Quarter::Q2 => [Month::October, Month::November, Month::December],
            Quarter::Q3 => [Month::January, Month::February, Month::March],
            Quarter::Q4 => [Month::April, Month::May, Month::June],
        }
    }

    pub fn contains_month(self, month: Month) -> bool {
        self.months().contains(&month)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Targets after normalization. Placeholders and unparseable text are `0`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Targets {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
    pub q4: f64,
    pub annual: f64,
}

impl Targets {
    pub fn from_raw(raw: &RawTargets) -> Self {
        Targets {
            q1: parse_value(raw.q1.as_ref()),
            q2: parse_value(raw.q2.as_ref()),
            q3: parse_value(raw.q3.as_ref()),
            q4: parse_value(raw.q4.as_ref()),
            annual: parse_value(raw.annual.as_ref()),
        }
    }

    /// Target set for the quarter alone.
    pub fn quarter(&self, quarter: Quarter) -> f64 {
        match quarter {
            Quarter::Q1 => self.q1,
            Quarter::Q2 => self.q2,
            Quarter::Q3 => self.q3,
            Quarter::Q4 => self.q4,
        }
    }

    /// Running total of quarterly targets up to and including `quarter`.
    pub fn through(&self, quarter: Quarter) -> f64 {
        Quarter::ALL[..=quarter.index()]
            .iter()
            .map(|q| self.quarter(*q))
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementType {
    #[default]
    Cumulative,
    Percentage,
    Decreasing,
}

impl MeasurementType {
    /// Unknown or missing tags fall back to `Cumulative`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(|t| t.trim().to_ascii_lowercase()).as_deref() {
            Some("percentage") => MeasurementType::Percentage,
            Some("decreasing") => MeasurementType::Decreasing,
            _ => MeasurementType::Cumulative,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trend {
    OnTrack,
    Improving,
    NeedsAttention,
}

impl Trend {
    pub fn classify(performance: f64) -> Self {
        if performance >= 90.0 {
            Trend::OnTrack
        } else if performance >= 50.0 {
            Trend::Improving
        } else {
            Trend::NeedsAttention
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Trend::OnTrack => "on-track",
            Trend::Improving => "improving",
            Trend::NeedsAttention => "needs-attention",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A named component of a composite indicator, e.g. `maize` under a crop
/// productivity indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct SubIndicator {
    pub key: String,
    /// Catalogue id when the component is also reported under its own id.
    pub id: Option<String>,
    pub name: String,
    pub measurement: MeasurementType,
    pub targets: Targets,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorKind {
    Simple,
    Composite(Vec<SubIndicator>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub id: String,
    pub name: String,
    pub measurement: MeasurementType,
    pub targets: Targets,
    pub kind: IndicatorKind,
    /// Marked dual (or declaring children) but with none resolvable; scored
    /// on its own targets.
    pub standalone_dual: bool,
}

impl Indicator {
    pub fn simple(id: &str, measurement: MeasurementType, targets: Targets) -> Self {
        Indicator {
            id: id.to_string(),
            name: id.to_string(),
            measurement,
            targets,
            kind: IndicatorKind::Simple,
            standalone_dual: false,
        }
    }
}

/// One submitted observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub indicator_id: String,
    pub quarter: Quarter,
    pub month: String,
    pub value: f64,
    pub sub_values: BTreeMap<String, f64>,
    pub is_deleted: bool,
}

impl Entry {
    pub fn new(indicator_id: &str, quarter: Quarter, month: &str, value: f64) -> Self {
        Entry {
            indicator_id: indicator_id.to_string(),
            quarter,
            month: month.to_string(),
            value,
            sub_values: BTreeMap::new(),
            is_deleted: false,
        }
    }

    pub fn with_sub_value(mut self, key: &str, value: f64) -> Self {
        self.sub_values.insert(key.to_string(), value);
        self
    }

    /// Live entry submitted for `indicator_id` in `quarter`.
    pub fn counts_for(&self, indicator_id: &str, quarter: Quarter) -> bool {
        !self.is_deleted && self.quarter == quarter && self.indicator_id == indicator_id
    }
}

/// Submission row as exported by the collection service.
#[derive(Debug, Deserialize)]
pub struct RawEntryRow {
    #[serde(rename = "IndicatorId")]
    pub indicator_id: Option<String>,
    #[serde(rename = "QuarterId")]
    pub quarter_id: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Value")]
    pub value: Option<String>,
    #[serde(rename = "SubValues")]
    pub sub_values: Option<String>,
    #[serde(rename = "IsDeleted")]
    pub is_deleted: Option<String>,
}

/// A persisted pillar as stored by the reporting service. Its id must map to
/// a pillar of the catalogue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PillarRecord {
    #[serde(rename = "PillarId")]
    pub id: String,
    #[serde(rename = "PillarName")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterProgress {
    pub total_actual: f64,
    pub target: f64,
    pub performance: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentScore {
    pub key: String,
    pub name: String,
    pub progress: QuarterProgress,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorScore {
    pub progress: QuarterProgress,
    pub components: Vec<ComponentScore>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorProgressRow {
    #[tabled(rename = "Pillar")]
    pub pillar_id: String,
    #[tabled(rename = "Indicator")]
    pub indicator_id: String,
    #[tabled(rename = "Name")]
    pub indicator_name: String,
    #[tabled(rename = "Quarter")]
    pub quarter_id: Quarter,
    #[tabled(rename = "Actual")]
    pub total_actual: f64,
    #[tabled(rename = "Target")]
    pub target: f64,
    #[tabled(rename = "Performance")]
    pub performance: f64,
    #[tabled(rename = "Trend")]
    pub trend: Trend,
    /// Mean of the indicator's four quarter performances.
    #[tabled(rename = "Annual")]
    pub annual_performance: f64,
    #[tabled(rename = "Components")]
    pub components: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PillarProgressRow {
    #[tabled(rename = "Pillar")]
    pub pillar_id: String,
    #[tabled(rename = "PillarName")]
    pub pillar_name: String,
    #[tabled(rename = "Quarter")]
    pub quarter_id: Quarter,
    #[tabled(rename = "PillarProgress")]
    pub pillar_progress: f64,
    #[tabled(rename = "AnnualProgress")]
    pub annual_progress: f64,
    #[tabled(rename = "IndicatorSum")]
    pub indicator_sum: f64,
    #[tabled(rename = "Indicators")]
    pub pillar_indicator_count: usize,
    #[tabled(rename = "AllIndicators")]
    pub total_indicators_across_all_pillars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[tabled(rename = "Error", display_with = "display_error")]
    pub error: Option<String>,
    /// Sum of performances before rounding, for district totals.
    #[serde(skip)]
    #[tabled(skip)]
    pub unrounded_sum: f64,
}

fn display_error(error: &Option<String>) -> String {
    error.clone().unwrap_or_default()
}

#[derive(Debug, Serialize, Tabled, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DistrictQuarterRow {
    #[tabled(rename = "Quarter")]
    pub quarter_id: Quarter,
    #[tabled(rename = "DistrictProgress")]
    pub district_progress: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictSummary {
    pub quarters: Vec<DistrictQuarterRow>,
    /// Mean across the reported quarters.
    pub annual_average: f64,
    pub pillar_count: usize,
    pub degraded_pillars: usize,
    pub total_indicators: usize,
}
