//! Dashboard report service
//!
//! Rolls up a unit's metrics and pairs the figures with their presentation
//! band from the threshold table. Thresholds color the output only; they
//! never gate a mutation.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::application::ApplicationResult;
use crate::config::{load_thresholds, MetricStatus, Thresholds};
use crate::domain::aggregation::{self, calculate_result, calculate_variance};
use crate::domain::query;
use crate::domain::{DomainError, Track, TypeRules, UnitData, ACCOUNT_GROUPS};
use crate::infrastructure::store::OrgStore;

/// One yearly budget/actual/variance row per account group.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomyRow {
    pub group: String,
    pub budget: f64,
    pub actual: f64,
    pub variance: f64,
}

/// A personnel or production figure with its presentation band.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFigure {
    pub key: String,
    pub value: Option<f64>,
    pub status: Option<MetricStatus>,
}

/// Rolled-up dashboard view of one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitReport {
    pub unit_id: String,
    pub unit_name: String,
    pub type_label: String,
    pub year: String,
    /// Leaf cost centers the figures were derived from
    pub scope: Vec<String>,
    pub data: UnitData,
    pub economy_rows: Vec<EconomyRow>,
    pub result_budget: f64,
    pub result_actual: f64,
    pub result_variance: f64,
    pub personnel_figures: Vec<MetricFigure>,
    pub production_figures: Vec<MetricFigure>,
}

/// Service producing per-unit roll-up reports.
pub struct ReportService {
    store: Arc<OrgStore>,
    rules: Arc<TypeRules>,
    metrics_file: PathBuf,
    thresholds_file: PathBuf,
}

impl ReportService {
    pub fn new(
        store: Arc<OrgStore>,
        rules: Arc<TypeRules>,
        metrics_file: PathBuf,
        thresholds_file: PathBuf,
    ) -> Self {
        Self {
            store,
            rules,
            metrics_file,
            thresholds_file,
        }
    }

    /// Aggregate the unit's subtree and classify the figures.
    pub fn unit_report(&self, id: &str) -> ApplicationResult<UnitReport> {
        debug!("unit_report: id={id}");
        let tree = self.store.read()?;
        let unit = query::find_by_id(&tree, id)
            .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;
        let metrics = self.store.read_metrics(&self.metrics_file)?;
        let thresholds = load_thresholds(&self.thresholds_file)?;

        let scope = aggregation::resolve_scope(unit);
        let data = aggregation::aggregate(unit, &metrics);

        let economy_rows = ACCOUNT_GROUPS
            .iter()
            .map(|group| {
                let (budget, actual) = data
                    .economy
                    .get(group)
                    .map(|s| (s.budget.yearly, s.actual.yearly))
                    .unwrap_or((0.0, 0.0));
                EconomyRow {
                    group: group.to_string(),
                    budget,
                    actual,
                    variance: calculate_variance(budget, actual),
                }
            })
            .collect();

        let result_budget = calculate_result(&data.economy, Track::Budget);
        let result_actual = calculate_result(&data.economy, Track::Actual);

        let personnel_figures = vec![
            figure(&thresholds, "antal_anstallda", Some(f64::from(data.personnel.headcount))),
            figure(&thresholds, "personalomsattning", Some(data.personnel.turnover_rate)),
            figure(&thresholds, "sjukfranvaro", Some(data.personnel.sick_leave_rate)),
        ];
        let production_figures = vec![
            figure(&thresholds, "arenden", Some(data.production.case_volume)),
            figure(&thresholds, "leveranstid", data.production.delivery_time),
            figure(&thresholds, "kundnojdhet", data.production.satisfaction),
            figure(&thresholds, "kvalitetsindex", data.production.quality_index),
        ];

        Ok(UnitReport {
            unit_id: unit.id.clone(),
            unit_name: unit.name.clone(),
            type_label: self
                .rules
                .label_of(&unit.unit_type)
                .unwrap_or(&unit.unit_type)
                .to_string(),
            year: metrics.year.clone(),
            scope,
            economy_rows,
            result_budget,
            result_actual,
            result_variance: calculate_variance(result_budget, result_actual),
            personnel_figures,
            production_figures,
            data,
        })
    }
}

fn figure(thresholds: &Thresholds, key: &str, value: Option<f64>) -> MetricFigure {
    MetricFigure {
        key: key.to_string(),
        value,
        status: value.and_then(|v| thresholds.classify(key, v)),
    }
}
