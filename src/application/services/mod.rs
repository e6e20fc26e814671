//! Application services

pub mod organization;
pub mod report;

pub use organization::OrganizationService;
pub use report::{EconomyRow, MetricFigure, ReportService, UnitReport};
