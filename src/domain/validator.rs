//! Organization tree validation
//!
//! Stateless checks over the tree plus field-level schema validation for
//! create/update payloads. Whole-tree validation accumulates every issue
//! instead of stopping at the first one; it is the final gate after every
//! mutation and callers need the complete list.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::domain::entities::{NewUnit, OrgUnit, TypeRules, UnitUpdate};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::query;

static ID_PATTERN: OnceLock<Regex> = OnceLock::new();
static COST_CENTER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn id_pattern() -> &'static Regex {
    ID_PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9-]+$").expect("static pattern"))
}

fn cost_center_pattern() -> &'static Regex {
    COST_CENTER_PATTERN.get_or_init(|| Regex::new(r"^\d{4}$").expect("static pattern"))
}

/// Outcome of a validation check: `issues` is empty iff `valid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl ValidationOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            issues: Vec::new(),
        }
    }

    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            valid: issues.is_empty(),
            issues,
        }
    }

    /// Convert into a `DomainResult`, surfacing the accumulated issues.
    pub fn into_result(self) -> DomainResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(DomainError::validation(self.issues))
        }
    }
}

/// Stateless tree validator, parameterized by the type rule table.
#[derive(Debug, Clone)]
pub struct OrgValidator {
    rules: Arc<TypeRules>,
}

impl OrgValidator {
    pub fn new(rules: Arc<TypeRules>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &TypeRules {
        &self.rules
    }

    /// Id must not appear anywhere in the tree other than at `exclude_id`.
    pub fn validate_unique_id(
        &self,
        root: &OrgUnit,
        id: &str,
        exclude_id: Option<&str>,
    ) -> ValidationOutcome {
        let mut issues = Vec::new();
        if query::collect_ids(root, exclude_id).contains(id) {
            issues.push(format!("id {id} already exists"));
        }
        ValidationOutcome::from_issues(issues)
    }

    /// Cost center must not appear anywhere in the tree other than at `exclude_id`.
    pub fn validate_unique_cost_center(
        &self,
        root: &OrgUnit,
        cost_center: &str,
        exclude_id: Option<&str>,
    ) -> ValidationOutcome {
        let mut issues = Vec::new();
        if query::collect_cost_centers(root, exclude_id).contains(cost_center) {
            issues.push(format!("cost center {cost_center} already exists"));
        }
        ValidationOutcome::from_issues(issues)
    }

    /// Child type must be in the parent type's allowed children.
    pub fn validate_child_type(&self, parent_type: &str, child_type: &str) -> ValidationOutcome {
        let mut issues = Vec::new();
        if !self.rules.contains(child_type) {
            issues.push(format!("unknown unit type: {child_type}"));
        } else if !self.rules.allows_child(parent_type, child_type) {
            issues.push(format!(
                "type {child_type} is not allowed under {parent_type}"
            ));
        }
        ValidationOutcome::from_issues(issues)
    }

    /// Changing a unit's type must keep the unit legal under its parent and
    /// must not orphan-by-rule any existing child.
    pub fn validate_type_change(
        &self,
        unit: &OrgUnit,
        new_type: &str,
        parent_type: Option<&str>,
    ) -> ValidationOutcome {
        let mut issues = Vec::new();
        if !self.rules.contains(new_type) {
            issues.push(format!("unknown unit type: {new_type}"));
            return ValidationOutcome::from_issues(issues);
        }
        if let Some(parent_type) = parent_type {
            if !self.rules.allows_child(parent_type, new_type) {
                issues.push(format!(
                    "type {new_type} is not allowed under {parent_type}"
                ));
            }
        }
        for child in &unit.children {
            if !self.rules.allows_child(new_type, &child.unit_type) {
                issues.push(format!(
                    "existing child {} of type {} would be illegal under {new_type}",
                    child.id, child.unit_type
                ));
            }
        }
        ValidationOutcome::from_issues(issues)
    }

    /// Move legality: no self-moves, no moves into the unit's own subtree,
    /// root-only types stay put, and the unit's type must be legal under the
    /// new parent's type.
    pub fn validate_move(&self, unit: &OrgUnit, new_parent: &OrgUnit) -> ValidationOutcome {
        let mut issues = Vec::new();
        if unit.id == new_parent.id {
            issues.push("cannot move a unit into itself".to_string());
            return ValidationOutcome::from_issues(issues);
        }
        if query::is_descendant(unit, new_parent) {
            issues.push(format!(
                "cannot move {} into its own subtree ({})",
                unit.id, new_parent.id
            ));
        }
        if self.rules.is_root_only(&unit.unit_type) {
            issues.push(format!("cannot move a {} unit", unit.unit_type));
        }
        if !self.rules.allows_child(&new_parent.unit_type, &unit.unit_type) {
            issues.push(format!(
                "type {} is not allowed under {}",
                unit.unit_type, new_parent.unit_type
            ));
        }
        ValidationOutcome::from_issues(issues)
    }

    /// A unit with children can only be deleted when a reassignment target
    /// is supplied.
    pub fn validate_delete(&self, unit: &OrgUnit, has_reassign_target: bool) -> ValidationOutcome {
        let mut issues = Vec::new();
        if !unit.children.is_empty() && !has_reassign_target {
            issues.push(format!(
                "unit {} has {} children; supply a reassignment target to delete it",
                unit.name,
                unit.children.len()
            ));
        }
        ValidationOutcome::from_issues(issues)
    }

    /// Full-tree re-validation: one walk computing depth and parent-type
    /// context, accumulating every violation of the structural invariants
    /// (duplicate id, duplicate cost center, unknown type, type not allowed
    /// at depth, type not allowed under parent).
    pub fn validate_organization(&self, root: &OrgUnit) -> ValidationOutcome {
        let mut issues = Vec::new();
        let mut ids = BTreeSet::new();
        let mut cost_centers = BTreeSet::new();
        self.walk(root, 0, None, &mut ids, &mut cost_centers, &mut issues);
        ValidationOutcome::from_issues(issues)
    }

    fn walk(
        &self,
        unit: &OrgUnit,
        depth: usize,
        parent_type: Option<&str>,
        ids: &mut BTreeSet<String>,
        cost_centers: &mut BTreeSet<String>,
        issues: &mut Vec<String>,
    ) {
        if !ids.insert(unit.id.clone()) {
            issues.push(format!("duplicate id: {} (unit: {})", unit.id, unit.name));
        }
        if !cost_centers.insert(unit.cost_center.clone()) {
            issues.push(format!(
                "duplicate cost center: {} (unit: {})",
                unit.cost_center, unit.name
            ));
        }
        if !self.rules.contains(&unit.unit_type) {
            issues.push(format!(
                "unknown unit type: {} (unit: {})",
                unit.unit_type, unit.name
            ));
        } else {
            if !self.rules.allowed_at_depth(&unit.unit_type, depth) {
                issues.push(format!(
                    "type {} is not allowed at depth {depth} (unit: {})",
                    unit.unit_type, unit.name
                ));
            }
            if let Some(parent_type) = parent_type {
                if !self.rules.allows_child(parent_type, &unit.unit_type) {
                    issues.push(format!(
                        "type {} is not allowed under {parent_type} (unit: {})",
                        unit.unit_type, unit.name
                    ));
                }
            }
        }
        for child in &unit.children {
            self.walk(
                child,
                depth + 1,
                Some(&unit.unit_type),
                ids,
                cost_centers,
                issues,
            );
        }
    }

    /// Field-level schema validation for a create payload. All violations
    /// are accumulated; nothing is silently corrected.
    pub fn validate_new_unit_fields(&self, fields: &NewUnit) -> ValidationOutcome {
        let mut issues = Vec::new();
        if !id_pattern().is_match(&fields.id) {
            issues.push("id may only contain lowercase letters, digits and hyphens".to_string());
        }
        check_name(&fields.name, &mut issues);
        if !self.rules.contains(&fields.unit_type) {
            issues.push(format!("unknown unit type: {}", fields.unit_type));
        }
        check_cost_center(&fields.cost_center, &mut issues);
        if let Some(manager) = &fields.manager {
            check_manager(manager, &mut issues);
        }
        ValidationOutcome::from_issues(issues)
    }

    /// Field-level schema validation for an update payload: only the fields
    /// present are checked.
    pub fn validate_update_fields(&self, update: &UnitUpdate) -> ValidationOutcome {
        let mut issues = Vec::new();
        if update.is_empty() {
            issues.push("update contains no fields".to_string());
        }
        if let Some(name) = &update.name {
            check_name(name, &mut issues);
        }
        if let Some(manager) = &update.manager {
            check_manager(manager, &mut issues);
            if update.clear_manager {
                issues.push("cannot both set and clear manager".to_string());
            }
        }
        if let Some(cc) = &update.cost_center {
            check_cost_center(cc, &mut issues);
        }
        if let Some(t) = &update.unit_type {
            if !self.rules.contains(t) {
                issues.push(format!("unknown unit type: {t}"));
            }
        }
        ValidationOutcome::from_issues(issues)
    }
}

fn check_name(name: &str, issues: &mut Vec<String>) {
    if name.is_empty() {
        issues.push("name is required".to_string());
    } else if name.chars().count() > 100 {
        issues.push("name may be at most 100 characters".to_string());
    }
}

fn check_cost_center(cc: &str, issues: &mut Vec<String>) {
    if !cost_center_pattern().is_match(cc) {
        issues.push("cost center must be exactly 4 digits".to_string());
    }
}

fn check_manager(manager: &str, issues: &mut Vec<String>) {
    if manager.chars().count() > 100 {
        issues.push("manager may be at most 100 characters".to_string());
    }
}
