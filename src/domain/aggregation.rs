//! Bottom-up metric aggregation
//!
//! Rolls monthly economic series and weighted personnel/production figures
//! up through an arbitrary subtree. Internal units have no metrics row of
//! their own; everything is derived from the leaf cost centers beneath them.

use crate::domain::entities::{
    EconomyData, MetricsDocument, OrgUnit, PersonnelData, ProductionData, Track, TrackedSeries,
    UnitData, ACCOUNT_GROUPS, REVENUE_GROUP,
};
use crate::domain::query;

/// Aggregation scope of a unit: the leaf cost centers beneath it, a leaf
/// being its own scope.
pub fn resolve_scope(unit: &OrgUnit) -> Vec<String> {
    query::leaf_cost_centers(unit)
}

/// Roll up the metrics for a unit from the flat per-cost-center map.
///
/// Cost centers without a record are skipped, not treated as zero-valued.
/// A scope with no usable records yields a fully zeroed/null result.
pub fn aggregate(unit: &OrgUnit, metrics: &MetricsDocument) -> UnitData {
    let scope = resolve_scope(unit);

    // True-leaf fast path: a single cost center with a direct record is
    // returned unchanged.
    if scope.len() == 1 {
        if let Some(record) = metrics.values.get(&scope[0]) {
            return record.clone();
        }
    }

    let records: Vec<&UnitData> = scope
        .iter()
        .filter_map(|cc| metrics.values.get(cc))
        .collect();
    if records.is_empty() {
        return UnitData::empty();
    }

    let personnel: Vec<&PersonnelData> = records.iter().map(|r| &r.personnel).collect();
    UnitData {
        economy: aggregate_economy(&records),
        personnel: aggregate_personnel(&personnel),
        production: aggregate_production(&records),
    }
}

/// Sum yearly and each monthly entry element-wise per account group and
/// track. Groups missing in a record contribute zero.
fn aggregate_economy(records: &[&UnitData]) -> EconomyData {
    let mut result = EconomyData::zeroed();
    for group in ACCOUNT_GROUPS {
        let series = result.0.get_mut(group).expect("zeroed has all groups");
        for record in records {
            if let Some(found) = record.economy.get(group) {
                series.budget.add(&found.budget);
                series.actual.add(&found.actual);
            }
        }
    }
    result
}

/// Headcount is summed; turnover and sick-leave rates are headcount-weighted
/// averages rounded to one decimal. Zero total headcount defines both rates
/// as zero.
fn aggregate_personnel(records: &[&PersonnelData]) -> PersonnelData {
    let total_headcount: u32 = records.iter().map(|p| p.headcount).sum();
    if total_headcount == 0 {
        return PersonnelData::default();
    }
    let total = f64::from(total_headcount);
    let turnover = records
        .iter()
        .map(|p| p.turnover_rate * f64::from(p.headcount))
        .sum::<f64>()
        / total;
    let sick_leave = records
        .iter()
        .map(|p| p.sick_leave_rate * f64::from(p.headcount))
        .sum::<f64>()
        / total;
    PersonnelData {
        headcount: total_headcount,
        turnover_rate: round_to_decimal(turnover),
        sick_leave_rate: round_to_decimal(sick_leave),
    }
}

/// Case volume is summed. The rate/index metrics are headcount-weighted over
/// only the records that supply a non-null value; when none does, the result
/// stays null. Zero is a valid measurement distinct from absence.
fn aggregate_production(records: &[&UnitData]) -> ProductionData {
    let case_volume = records.iter().map(|r| r.production.case_volume).sum();
    ProductionData {
        case_volume,
        delivery_time: weighted_optional(records, |p| p.delivery_time)
            .map(round_to_decimal),
        satisfaction: weighted_optional(records, |p| p.satisfaction).map(f64::round),
        quality_index: weighted_optional(records, |p| p.quality_index).map(f64::round),
    }
}

/// Headcount-weighted mean over the records where `metric` is present.
/// Falls back to the plain mean when the contributing headcounts sum to
/// zero, so a present value never turns into NaN.
fn weighted_optional(
    records: &[&UnitData],
    metric: impl Fn(&ProductionData) -> Option<f64>,
) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = records
        .iter()
        .filter_map(|r| metric(&r.production).map(|v| (v, f64::from(r.personnel.headcount))))
        .collect();
    if pairs.is_empty() {
        return None;
    }
    let weight_sum: f64 = pairs.iter().map(|(_, w)| w).sum();
    if weight_sum > 0.0 {
        Some(pairs.iter().map(|(v, w)| v * w).sum::<f64>() / weight_sum)
    } else {
        Some(pairs.iter().map(|(v, _)| v).sum::<f64>() / pairs.len() as f64)
    }
}

/// Yearly result: revenue minus the sum of all cost-group totals for the
/// given track.
pub fn calculate_result(economy: &EconomyData, track: Track) -> f64 {
    let revenue = economy
        .get(REVENUE_GROUP)
        .map(|s| s.track(track).yearly)
        .unwrap_or(0.0);
    revenue - cost_groups(economy, track).map(|v| v.yearly).sum::<f64>()
}

/// Month-by-month result: same formula as [`calculate_result`] applied per
/// month index; always twelve entries.
pub fn monthly_result(economy: &EconomyData, track: Track) -> [f64; 12] {
    let mut result = [0.0; 12];
    if let Some(revenue) = economy.get(REVENUE_GROUP) {
        result.copy_from_slice(&revenue.track(track).monthly);
    }
    for series in cost_groups(economy, track) {
        for (r, c) in result.iter_mut().zip(series.monthly.iter()) {
            *r -= c;
        }
    }
    result
}

fn cost_groups<'a>(
    economy: &'a EconomyData,
    track: Track,
) -> impl Iterator<Item = &'a crate::domain::entities::MonthlyValue> {
    ACCOUNT_GROUPS
        .iter()
        .filter(|g| **g != REVENUE_GROUP)
        .filter_map(move |g| economy.get(g).map(|s: &TrackedSeries| s.track(track)))
}

/// Budget variance in percent, one decimal: `(actual - budget) / budget`.
/// Defined as exactly zero when budget is zero.
pub fn calculate_variance(budget: f64, actual: f64) -> f64 {
    if budget == 0.0 {
        return 0.0;
    }
    ((actual - budget) / budget * 1000.0).round() / 10.0
}

fn round_to_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
