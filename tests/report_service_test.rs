//! End-to-end tests for ReportService: roll-ups and threshold classification

use std::collections::BTreeMap;
use std::sync::Arc;

use tempfile::TempDir;

use orgctl::application::ApplicationError;
use orgctl::config::{MetricStatus, Settings};
use orgctl::domain::{
    DomainError, EconomyData, MetricsDocument, MonthlyValue, PersonnelData, ProductionData,
    TrackedSeries, UnitData,
};
use orgctl::infrastructure::di::ServiceContainer;
use orgctl::infrastructure::traits::RealFileSystem;

const TYPE_RULES: &str = r#"{
    "koncern":   {"label": "Koncern",   "allowedChildren": ["division"],          "allowedAtDepth": [0]},
    "division":  {"label": "Division",  "allowedChildren": ["avdelning", "stab"], "allowedAtDepth": [1]},
    "avdelning": {"label": "Avdelning", "allowedChildren": ["enhet"],             "allowedAtDepth": [2]},
    "enhet":     {"label": "Enhet",     "allowedChildren": [],                    "allowedAtDepth": [3]},
    "stab":      {"label": "Stab",      "allowedChildren": [],                    "allowedAtDepth": [2]}
}"#;

const ORGANIZATION: &str = r#"{
    "id": "group",
    "name": "Group AB",
    "type": "koncern",
    "costCenter": "0001",
    "children": [
        {
            "id": "ops",
            "name": "Operations",
            "type": "division",
            "costCenter": "0002",
            "children": [
                {
                    "id": "support",
                    "name": "Support",
                    "type": "avdelning",
                    "costCenter": "0003",
                    "children": [
                        {"id": "desk", "name": "Service Desk", "type": "enhet", "costCenter": "0005"}
                    ]
                },
                {"id": "staff", "name": "Staff", "type": "stab", "costCenter": "0004"}
            ]
        }
    ]
}"#;

const THRESHOLDS: &str = r#"{
    "personalomsattning": {"good": 10.0, "warning": 15.0, "higherIsBetter": false},
    "sjukfranvaro":       {"good": 4.0,  "warning": 6.0,  "higherIsBetter": false},
    "kundnojdhet":        {"good": 80.0, "warning": 60.0, "higherIsBetter": true}
}"#;

fn settings(temp: &TempDir) -> Settings {
    Settings {
        data_dir: temp.path().join("data"),
        backup_dir: temp.path().join("backups"),
        type_rules_file: temp.path().join("type_rules.json"),
        thresholds_file: temp.path().join("thresholds.json"),
        metrics_file: temp.path().join("metrics.json"),
        backup_retention: 10,
    }
}

fn monthly(yearly: f64) -> MonthlyValue {
    MonthlyValue {
        yearly,
        monthly: [yearly / 12.0; 12],
    }
}

fn record(
    revenue: f64,
    personnel_cost: f64,
    headcount: u32,
    turnover: f64,
    satisfaction: Option<f64>,
) -> UnitData {
    let mut economy = BTreeMap::new();
    economy.insert(
        "intakter".to_string(),
        TrackedSeries {
            budget: monthly(revenue),
            actual: monthly(revenue * 1.1),
        },
    );
    economy.insert(
        "personal".to_string(),
        TrackedSeries {
            budget: monthly(personnel_cost),
            actual: monthly(personnel_cost),
        },
    );
    UnitData {
        economy: EconomyData(economy),
        personnel: PersonnelData {
            headcount,
            turnover_rate: turnover,
            sick_leave_rate: 3.0,
        },
        production: ProductionData {
            case_volume: 250.0,
            delivery_time: None,
            satisfaction,
            quality_index: None,
        },
    }
}

fn seed_container(temp: &TempDir) -> ServiceContainer {
    let settings = settings(temp);
    std::fs::create_dir_all(&settings.data_dir).unwrap();
    std::fs::write(&settings.type_rules_file, TYPE_RULES).unwrap();
    std::fs::write(&settings.thresholds_file, THRESHOLDS).unwrap();
    std::fs::write(settings.organization_file(), ORGANIZATION).unwrap();

    // Leaf cost centers under ops: 0005 (desk) and 0004 (staff)
    let metrics = MetricsDocument {
        year: "2024".to_string(),
        values: [
            ("0005".to_string(), record(12000.0, 6000.0, 150, 10.0, Some(82.0))),
            ("0004".to_string(), record(0.0, 2000.0, 50, 20.0, None)),
        ]
        .into_iter()
        .collect(),
    };
    std::fs::write(
        &settings.metrics_file,
        serde_json::to_string_pretty(&metrics).unwrap(),
    )
    .unwrap();

    ServiceContainer::with_deps(settings, Arc::new(RealFileSystem)).unwrap()
}

#[test]
fn given_internal_unit_when_reporting_then_scope_is_leaf_cost_centers() {
    let temp = TempDir::new().unwrap();
    let container = seed_container(&temp);

    let report = container.report.unit_report("ops").unwrap();

    // support (0003) is internal; only its leaf contributes
    assert_eq!(report.scope, vec!["0005".to_string(), "0004".to_string()]);
    assert_eq!(report.year, "2024");
    assert_eq!(report.type_label, "Division");
}

#[test]
fn given_two_leaves_when_reporting_then_headcount_summed_and_rates_weighted() {
    let temp = TempDir::new().unwrap();
    let container = seed_container(&temp);

    let report = container.report.unit_report("ops").unwrap();

    assert_eq!(report.data.personnel.headcount, 200);
    // (150*10 + 50*20) / 200 = 12.5
    assert_eq!(report.data.personnel.turnover_rate, 12.5);
}

#[test]
fn given_economy_records_when_reporting_then_rows_cover_all_groups_with_variance() {
    let temp = TempDir::new().unwrap();
    let container = seed_container(&temp);

    let report = container.report.unit_report("ops").unwrap();

    assert_eq!(report.economy_rows.len(), 6);
    let revenue = report
        .economy_rows
        .iter()
        .find(|r| r.group == "intakter")
        .unwrap();
    assert_eq!(revenue.budget, 12000.0);
    assert!((revenue.actual - 13200.0).abs() < 1e-9);
    assert_eq!(revenue.variance, 10.0);
    // Groups with no records roll up as zero, not as an error
    let unused = report
        .economy_rows
        .iter()
        .find(|r| r.group == "lokaler")
        .unwrap();
    assert_eq!(unused.budget, 0.0);
    assert_eq!(unused.variance, 0.0);

    // result = revenue - costs
    assert_eq!(report.result_budget, 4000.0);
}

#[test]
fn given_thresholds_when_reporting_then_figures_classified() {
    let temp = TempDir::new().unwrap();
    let container = seed_container(&temp);

    let report = container.report.unit_report("ops").unwrap();

    let turnover = report
        .personnel_figures
        .iter()
        .find(|f| f.key == "personalomsattning")
        .unwrap();
    // 12.5 sits between good (10) and warning (15), lower is better
    assert_eq!(turnover.value, Some(12.5));
    assert_eq!(turnover.status, Some(MetricStatus::Warning));

    // headcount has no configured band
    let headcount = report
        .personnel_figures
        .iter()
        .find(|f| f.key == "antal_anstallda")
        .unwrap();
    assert_eq!(headcount.value, Some(200.0));
    assert_eq!(headcount.status, None);
}

#[test]
fn given_metric_absent_everywhere_when_reporting_then_figure_stays_null() {
    let temp = TempDir::new().unwrap();
    let container = seed_container(&temp);

    let report = container.report.unit_report("ops").unwrap();

    let delivery = report
        .production_figures
        .iter()
        .find(|f| f.key == "leveranstid")
        .unwrap();
    assert_eq!(delivery.value, None);
    assert_eq!(delivery.status, None);

    // satisfaction is present in one record only and still classified
    let satisfaction = report
        .production_figures
        .iter()
        .find(|f| f.key == "kundnojdhet")
        .unwrap();
    assert_eq!(satisfaction.value, Some(82.0));
    assert_eq!(satisfaction.status, Some(MetricStatus::Good));
}

#[test]
fn given_unknown_unit_when_reporting_then_not_found() {
    let temp = TempDir::new().unwrap();
    let container = seed_container(&temp);

    let err = container.report.unit_report("ghost").unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::UnitNotFound(_))
    ));
}

#[test]
fn given_missing_thresholds_file_when_reporting_then_config_error_not_fallback() {
    let temp = TempDir::new().unwrap();
    let container = seed_container(&temp);
    std::fs::remove_file(settings(&temp).thresholds_file).unwrap();

    let err = container.report.unit_report("ops").unwrap_err();

    assert!(matches!(err, ApplicationError::Config { .. }));
}
