//! Domain entities: core data structures

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Account groups carried per unit in the economy series.
/// `intakter` is the revenue group; the remaining five are cost groups.
pub const ACCOUNT_GROUPS: [&str; 6] = [
    "intakter", "personal", "lokaler", "material", "externa", "ovrigt",
];

/// The revenue account group.
pub const REVENUE_GROUP: &str = "intakter";

/// A node in the organization tree.
///
/// The whole organization is one rooted tree persisted as a single JSON
/// document; serde renames keep the persisted field names stable
/// (`costCenter`, `type`, nested `children`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgUnit {
    /// Globally unique, immutable identifier (lowercase alnum and hyphens)
    pub id: String,
    /// Display name, 1-100 chars
    pub name: String,
    /// Unit type, must exist in the type rules table
    #[serde(rename = "type")]
    pub unit_type: String,
    /// Globally unique 4-digit financial identifier
    #[serde(rename = "costCenter")]
    pub cost_center: String,
    /// Responsible manager, <=100 chars
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    /// Child units, owned exclusively by this parent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OrgUnit>,
}

impl OrgUnit {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Fields for a unit to be created (always as a child of an existing unit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUnit {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    #[serde(rename = "costCenter")]
    pub cost_center: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
}

impl NewUnit {
    pub fn into_unit(self) -> OrgUnit {
        OrgUnit {
            id: self.id,
            name: self.name,
            unit_type: self.unit_type,
            cost_center: self.cost_center,
            manager: self.manager,
            children: Vec::new(),
        }
    }
}

/// Partial update applied to an existing unit.
///
/// Convention: an omitted (`None`) field is untouched. Clearing the optional
/// `manager` requires the explicit `clear_manager` signal; `manager: Some(_)`
/// together with `clear_manager` is rejected at schema validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitUpdate {
    pub name: Option<String>,
    pub manager: Option<String>,
    pub clear_manager: bool,
    pub cost_center: Option<String>,
    pub unit_type: Option<String>,
}

impl UnitUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.manager.is_none()
            && !self.clear_manager
            && self.cost_center.is_none()
            && self.unit_type.is_none()
    }
}

/// Nesting rule for one unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRule {
    /// Human-readable label
    pub label: String,
    /// Types permitted as direct children
    #[serde(rename = "allowedChildren")]
    pub allowed_children: BTreeSet<String>,
    /// Depths (root = 0) at which this type may appear
    #[serde(rename = "allowedAtDepth")]
    pub allowed_at_depth: BTreeSet<usize>,
}

/// The per-type nesting rule table, loaded once at startup and read-only
/// for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRules(BTreeMap<String, TypeRule>);

/// A `{value, label}` row for type catalogues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeOption {
    pub value: String,
    pub label: String,
}

impl TypeRules {
    pub fn new(rules: BTreeMap<String, TypeRule>) -> Self {
        Self(rules)
    }

    pub fn get(&self, unit_type: &str) -> Option<&TypeRule> {
        self.0.get(unit_type)
    }

    pub fn contains(&self, unit_type: &str) -> bool {
        self.0.contains_key(unit_type)
    }

    pub fn label_of(&self, unit_type: &str) -> Option<&str> {
        self.0.get(unit_type).map(|r| r.label.as_str())
    }

    /// Whether `child_type` may nest directly under `parent_type`.
    pub fn allows_child(&self, parent_type: &str, child_type: &str) -> bool {
        self.0
            .get(parent_type)
            .is_some_and(|r| r.allowed_children.contains(child_type))
    }

    /// Whether `unit_type` may appear at the given depth (root = 0).
    pub fn allowed_at_depth(&self, unit_type: &str, depth: usize) -> bool {
        self.0
            .get(unit_type)
            .is_some_and(|r| r.allowed_at_depth.contains(&depth))
    }

    /// A type whose only permitted depth is 0 can exist solely as the root.
    pub fn is_root_only(&self, unit_type: &str) -> bool {
        self.0
            .get(unit_type)
            .is_some_and(|r| r.allowed_at_depth.len() == 1 && r.allowed_at_depth.contains(&0))
    }

    /// All types as `{value, label}` rows, sorted by type name.
    pub fn type_options(&self) -> Vec<TypeOption> {
        self.0
            .iter()
            .map(|(value, rule)| TypeOption {
                value: value.clone(),
                label: rule.label.clone(),
            })
            .collect()
    }

    /// Types permitted as direct children of `parent_type`.
    /// Returns `None` when the parent type itself is unknown.
    pub fn child_type_options(&self, parent_type: &str) -> Option<Vec<TypeOption>> {
        let rule = self.0.get(parent_type)?;
        Some(
            rule.allowed_children
                .iter()
                .filter_map(|t| {
                    self.label_of(t).map(|label| TypeOption {
                        value: t.clone(),
                        label: label.to_string(),
                    })
                })
                .collect(),
        )
    }

    /// Schema validation at load time: referenced child types must exist,
    /// every type needs at least one permitted depth, and some type must be
    /// permitted at the root. Violations are all reported at once.
    pub fn check(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();
        for (name, rule) in &self.0 {
            if rule.allowed_at_depth.is_empty() {
                issues.push(format!("type {name}: no permitted depth"));
            }
            for child in &rule.allowed_children {
                if !self.0.contains_key(child) {
                    issues.push(format!("type {name}: unknown child type {child}"));
                }
            }
        }
        if !self.0.values().any(|r| r.allowed_at_depth.contains(&0)) {
            issues.push("no type is permitted at the root (depth 0)".to_string());
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

/// The two parallel series carried per economic account group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Budget,
    Actual,
}

/// A yearly total plus twelve monthly values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyValue {
    pub yearly: f64,
    pub monthly: [f64; 12],
}

impl Default for MonthlyValue {
    fn default() -> Self {
        Self {
            yearly: 0.0,
            monthly: [0.0; 12],
        }
    }
}

impl MonthlyValue {
    /// Element-wise sum of `other` onto `self`.
    pub fn add(&mut self, other: &MonthlyValue) {
        self.yearly += other.yearly;
        for (m, o) in self.monthly.iter_mut().zip(other.monthly.iter()) {
            *m += o;
        }
    }
}

/// Budget and actual series for one account group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackedSeries {
    #[serde(default)]
    pub budget: MonthlyValue,
    #[serde(default, rename = "utfall")]
    pub actual: MonthlyValue,
}

impl TrackedSeries {
    pub fn track(&self, track: Track) -> &MonthlyValue {
        match track {
            Track::Budget => &self.budget,
            Track::Actual => &self.actual,
        }
    }
}

/// Economic series keyed by account group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EconomyData(pub BTreeMap<String, TrackedSeries>);

impl EconomyData {
    pub fn get(&self, group: &str) -> Option<&TrackedSeries> {
        self.0.get(group)
    }

    /// Zero-filled series for every fixed account group.
    pub fn zeroed() -> Self {
        Self(
            ACCOUNT_GROUPS
                .iter()
                .map(|g| (g.to_string(), TrackedSeries::default()))
                .collect(),
        )
    }
}

/// Personnel figures for one cost center.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonnelData {
    #[serde(rename = "antal_anstallda")]
    pub headcount: u32,
    #[serde(rename = "personalomsattning")]
    pub turnover_rate: f64,
    #[serde(rename = "sjukfranvaro")]
    pub sick_leave_rate: f64,
}

/// Production figures for one cost center. The rate/index metrics are
/// legitimately absent (`null`) when not measured; absence is distinct
/// from a zero measurement and must survive aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionData {
    #[serde(rename = "arenden")]
    pub case_volume: f64,
    #[serde(rename = "leveranstid")]
    pub delivery_time: Option<f64>,
    #[serde(rename = "kundnojdhet")]
    pub satisfaction: Option<f64>,
    #[serde(rename = "kvalitetsindex")]
    pub quality_index: Option<f64>,
}

/// Per-cost-center metric record, and the shape of a rolled-up result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitData {
    #[serde(rename = "ekonomi")]
    pub economy: EconomyData,
    #[serde(rename = "personal")]
    pub personnel: PersonnelData,
    #[serde(rename = "produktion")]
    pub production: ProductionData,
}

impl UnitData {
    /// Fully zeroed/null result for a scope with no usable records.
    pub fn empty() -> Self {
        Self {
            economy: EconomyData::zeroed(),
            personnel: PersonnelData::default(),
            production: ProductionData::default(),
        }
    }
}

/// Flat per-cost-center metrics map supplied externally; never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsDocument {
    pub year: String,
    pub values: BTreeMap<String, UnitData>,
}

/// Result of a cost center availability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostCenterCheck {
    pub available: bool,
    #[serde(rename = "conflictingUnit", skip_serializing_if = "Option::is_none")]
    pub conflicting_unit: Option<ConflictingUnit>,
}

/// Identity of the unit already holding a probed cost center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictingUnit {
    pub id: String,
    pub name: String,
}
