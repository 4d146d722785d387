// Quarter progress calculation.
//
// Every function here is pure and total: entries and indicators are only
// read, and any combination of inputs yields a performance in 0..=100.
use crate::types::{
    ComponentScore, Entry, Indicator, IndicatorKind, IndicatorScore, MeasurementType, Quarter,
    QuarterProgress, SubIndicator, Targets, Trend,
};
use crate::util::average;

/// Reduce one quarter's submitted values to the quarter actual.
///
/// Percentages are snapshots (mean), cumulative values already include
/// earlier progress (max), decreasing counts add up over the months (sum).
pub fn reduce_actuals(measurement: MeasurementType, values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match measurement {
        MeasurementType::Percentage => average(values),
        MeasurementType::Cumulative => values.iter().copied().fold(f64::MIN, f64::max),
        MeasurementType::Decreasing => values.iter().sum(),
    }
}

/// Denominator for the quarter. A zero target is floored to `1`.
pub fn quarter_target(measurement: MeasurementType, targets: &Targets, quarter: Quarter) -> f64 {
    let target = match measurement {
        MeasurementType::Percentage | MeasurementType::Decreasing => targets.quarter(quarter),
        MeasurementType::Cumulative => targets.through(quarter),
    };
    if target == 0.0 {
        1.0
    } else {
        target
    }
}

fn capped(performance: f64) -> f64 {
    if performance.is_nan() {
        0.0
    } else {
        performance.clamp(0.0, 100.0)
    }
}

/// Score one series of values for `quarter` against `targets`.
pub fn calculate_quarter_progress(
    measurement: MeasurementType,
    targets: &Targets,
    values: &[f64],
    quarter: Quarter,
) -> QuarterProgress {
    let total_actual = reduce_actuals(measurement, values);
    let target = quarter_target(measurement, targets, quarter);

    let performance = match measurement {
        MeasurementType::Decreasing if total_actual > 0.0 => (target / total_actual) * 100.0,
        // Nothing reported against a reduction goal counts as on target.
        MeasurementType::Decreasing => 100.0,
        _ => (total_actual / target) * 100.0,
    };
    let performance = capped(performance);

    QuarterProgress {
        total_actual,
        target,
        performance,
        trend: Trend::classify(performance),
    }
}

fn indicator_values(indicator_id: &str, entries: &[Entry], quarter: Quarter) -> Vec<f64> {
    entries
        .iter()
        .filter(|e| e.counts_for(indicator_id, quarter))
        .map(|e| e.value)
        .collect()
}

/// A component's series: `sub_values[key]` of the parent's entries plus
/// entries filed directly under the component's own id.
fn component_values(
    parent_id: &str,
    sub: &SubIndicator,
    entries: &[Entry],
    quarter: Quarter,
) -> Vec<f64> {
    let mut values: Vec<f64> = entries
        .iter()
        .filter(|e| e.counts_for(parent_id, quarter))
        .filter_map(|e| e.sub_values.get(&sub.key).copied())
        .collect();
    if let Some(id) = sub.id.as_deref().filter(|id| *id != parent_id) {
        values.extend(indicator_values(id, entries, quarter));
    }
    values
}

/// Score an indicator for one quarter, dispatching on its composition.
///
/// A composite's performance is the mean of its components' capped
/// performances; its actual and target are the sums of theirs.
pub fn score_indicator(indicator: &Indicator, entries: &[Entry], quarter: Quarter) -> IndicatorScore {
    match &indicator.kind {
        IndicatorKind::Simple => IndicatorScore {
            progress: calculate_quarter_progress(
                indicator.measurement,
                &indicator.targets,
                &indicator_values(&indicator.id, entries, quarter),
                quarter,
            ),
            components: Vec::new(),
        },
        IndicatorKind::Composite(children) => {
            let components: Vec<ComponentScore> = children
                .iter()
                .map(|sub| ComponentScore {
                    key: sub.key.clone(),
                    name: sub.name.clone(),
                    progress: calculate_quarter_progress(
                        sub.measurement,
                        &sub.targets,
                        &component_values(&indicator.id, sub, entries, quarter),
                        quarter,
                    ),
                })
                .collect();
            let performances: Vec<f64> =
                components.iter().map(|c| c.progress.performance).collect();
            let performance = capped(average(&performances));
            IndicatorScore {
                progress: QuarterProgress {
                    total_actual: components.iter().map(|c| c.progress.total_actual).sum(),
                    target: components.iter().map(|c| c.progress.target).sum(),
                    performance,
                    trend: Trend::classify(performance),
                },
                components,
            }
        }
    }
}

/// Quarter performance of an indicator, the figure pillars aggregate.
pub fn indicator_performance(indicator: &Indicator, entries: &[Entry], quarter: Quarter) -> f64 {
    score_indicator(indicator, entries, quarter).progress.performance
}

/// Annual progress of one indicator: mean of its four quarter performances.
pub fn annual_progress(indicator: &Indicator, entries: &[Entry]) -> f64 {
    let per_quarter: Vec<f64> = Quarter::ALL
        .iter()
        .map(|q| indicator_performance(indicator, entries, *q))
        .collect();
    average(&per_quarter)
}
