use crate::catalogue::{Catalogue, Pillar};
use crate::progress::{annual_progress, score_indicator};
use crate::types::{
    DistrictQuarterRow, DistrictSummary, Entry, IndicatorProgressRow, PillarProgressRow,
    PillarRecord, Quarter,
};
use crate::util::{average, round2};
use rayon::prelude::*;
use std::collections::HashSet;

fn quarters(filter: Option<Quarter>) -> Vec<Quarter> {
    match filter {
        Some(q) => vec![q],
        None => Quarter::ALL.to_vec(),
    }
}

/// One row per indicator per requested quarter, in catalogue order. Every
/// row also carries the indicator's annual figure.
pub fn indicator_rows(
    catalogue: &Catalogue,
    entries: &[Entry],
    quarter: Option<Quarter>,
) -> Vec<IndicatorProgressRow> {
    let qs = quarters(quarter);
    let mut rows = Vec::new();
    for pillar in catalogue.pillars() {
        for indicator in &pillar.indicators {
            let annual = round2(annual_progress(indicator, entries));
            for q in &qs {
                let score = score_indicator(indicator, entries, *q);
                rows.push(IndicatorProgressRow {
                    pillar_id: pillar.id.clone(),
                    indicator_id: indicator.id.clone(),
                    indicator_name: indicator.name.clone(),
                    quarter_id: *q,
                    total_actual: round2(score.progress.total_actual),
                    target: round2(score.progress.target),
                    performance: round2(score.progress.performance),
                    trend: score.progress.trend,
                    annual_performance: annual,
                    components: score.components.len(),
                });
            }
        }
    }
    rows
}

fn pillar_row(
    record: &PillarRecord,
    pillar: &Pillar,
    total_indicators: usize,
    entries: &[Entry],
    quarter: Quarter,
) -> PillarProgressRow {
    // Indicators without entries contribute 0 and stay in the denominator.
    let indicator_sum: f64 = pillar
        .indicators
        .iter()
        .map(|i| score_indicator(i, entries, quarter).progress.performance)
        .sum();
    let count = pillar.indicators.len();
    let pillar_progress = if count == 0 {
        0.0
    } else {
        indicator_sum / count as f64
    };
    let annual_progress = if total_indicators == 0 {
        0.0
    } else {
        indicator_sum / total_indicators as f64
    };
    tracing::debug!(
        pillar = %record.id,
        %quarter,
        indicator_sum,
        pillar_progress,
        annual_progress,
        "pillar progress"
    );
    PillarProgressRow {
        pillar_id: record.id.clone(),
        pillar_name: record.name.clone(),
        quarter_id: quarter,
        pillar_progress: round2(pillar_progress),
        annual_progress: round2(annual_progress),
        indicator_sum: round2(indicator_sum),
        pillar_indicator_count: count,
        total_indicators_across_all_pillars: total_indicators,
        error: None,
        unrounded_sum: indicator_sum,
    }
}

fn degraded_row(record: &PillarRecord, total_indicators: usize, quarter: Quarter) -> PillarProgressRow {
    PillarProgressRow {
        pillar_id: record.id.clone(),
        pillar_name: record.name.clone(),
        quarter_id: quarter,
        pillar_progress: 0.0,
        annual_progress: 0.0,
        indicator_sum: 0.0,
        pillar_indicator_count: 0,
        total_indicators_across_all_pillars: total_indicators,
        error: Some(format!("no catalogue pillar matches record `{}`", record.id)),
        unrounded_sum: 0.0,
    }
}

/// Pillar and district contribution rows for each record and each requested
/// quarter (all four when `quarter` is `None`).
///
/// Pillars are computed in parallel. A record with no catalogue pillar
/// yields zeroed rows carrying an `error` and never affects its siblings.
pub fn pillar_rows(
    records: &[PillarRecord],
    catalogue: &Catalogue,
    entries: &[Entry],
    quarter: Option<Quarter>,
) -> Vec<PillarProgressRow> {
    let qs = quarters(quarter);
    let total = catalogue.total_indicator_count();

    records
        .par_iter()
        .map(|record| match catalogue.pillar(&record.id) {
            Some(pillar) => qs
                .iter()
                .map(|q| pillar_row(record, pillar, total, entries, *q))
                .collect::<Vec<_>>(),
            None => {
                tracing::warn!(pillar = %record.id, "no catalogue definition for pillar record");
                qs.iter().map(|q| degraded_row(record, total, *q)).collect()
            }
        })
        .collect::<Vec<Vec<PillarProgressRow>>>()
        .into_iter()
        .flatten()
        .collect()
}

/// District-wide progress per quarter: the pillars' contributions added up.
/// `annual_average` is the explicit cross-quarter mean.
pub fn district_summary(rows: &[PillarProgressRow]) -> DistrictSummary {
    let mut qs: Vec<Quarter> = rows.iter().map(|r| r.quarter_id).collect();
    qs.sort();
    qs.dedup();

    let total_indicators = rows
        .iter()
        .map(|r| r.total_indicators_across_all_pillars)
        .max()
        .unwrap_or(0);

    let mut raw = Vec::with_capacity(qs.len());
    let quarters: Vec<DistrictQuarterRow> = qs
        .iter()
        .map(|q| {
            let sum: f64 = rows
                .iter()
                .filter(|r| r.quarter_id == *q)
                .map(|r| r.unrounded_sum)
                .sum();
            let progress = if total_indicators == 0 {
                0.0
            } else {
                sum / total_indicators as f64
            };
            raw.push(progress);
            DistrictQuarterRow {
                quarter_id: *q,
                district_progress: round2(progress),
            }
        })
        .collect();

    let pillars: HashSet<&str> = rows.iter().map(|r| r.pillar_id.as_str()).collect();
    let degraded: HashSet<&str> = rows
        .iter()
        .filter(|r| r.error.is_some())
        .map(|r| r.pillar_id.as_str())
        .collect();

    DistrictSummary {
        quarters,
        annual_average: round2(average(&raw)),
        pillar_count: pillars.len(),
        degraded_pillars: degraded.len(),
        total_indicators,
    }
}
