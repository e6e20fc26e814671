//! Organization editing service
//!
//! Orchestrates the single-shot mutation pattern: read the whole tree,
//! mutate in memory, re-validate, write the whole tree back. A validation
//! failure never reaches the write step; the mutated tree is simply
//! dropped. Concurrent writers are not coordinated (last write wins on the
//! single document).

use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::query;
use crate::domain::{
    ConflictingUnit, CostCenterCheck, DomainError, NewUnit, OrgMutator, OrgUnit, OrgValidator,
    TypeOption, TypeRules, UnitUpdate, ValidationOutcome,
};
use crate::infrastructure::store::OrgStore;

/// Service exposing the logical operations of the editing half.
pub struct OrganizationService {
    store: Arc<OrgStore>,
    rules: Arc<TypeRules>,
    validator: OrgValidator,
    mutator: OrgMutator,
}

impl OrganizationService {
    pub fn new(store: Arc<OrgStore>, rules: Arc<TypeRules>) -> Self {
        let validator = OrgValidator::new(Arc::clone(&rules));
        let mutator = OrgMutator::new(Arc::clone(&rules));
        Self {
            store,
            rules,
            validator,
            mutator,
        }
    }

    /// The whole organization tree.
    pub fn get_tree(&self) -> ApplicationResult<OrgUnit> {
        self.store.read()
    }

    /// A single unit (with its subtree).
    pub fn get_unit(&self, id: &str) -> ApplicationResult<OrgUnit> {
        let tree = self.store.read()?;
        query::find_by_id(&tree, id)
            .cloned()
            .ok_or_else(|| DomainError::UnitNotFound(id.to_string()).into())
    }

    /// Create a unit under `parent_id` and persist the new tree.
    pub fn create_unit(&self, parent_id: &str, fields: NewUnit) -> ApplicationResult<OrgUnit> {
        debug!("create_unit: parent={parent_id} id={}", fields.id);
        let mut tree = self.store.read()?;
        let created = self.mutator.create_child(&mut tree, parent_id, fields)?;
        self.store.write(&tree)?;
        Ok(created)
    }

    /// Apply a partial update to a unit and persist the new tree.
    pub fn update_unit(&self, id: &str, update: UnitUpdate) -> ApplicationResult<OrgUnit> {
        debug!("update_unit: id={id}");
        let mut tree = self.store.read()?;
        let updated = self.mutator.update_fields(&mut tree, id, update)?;
        self.store.write(&tree)?;
        Ok(updated)
    }

    /// Delete a unit, reassigning its children to `reassign_children_to`
    /// when it has any, and persist the new tree.
    pub fn delete_unit(
        &self,
        id: &str,
        reassign_children_to: Option<&str>,
    ) -> ApplicationResult<()> {
        debug!("delete_unit: id={id}");
        let mut tree = self.store.read()?;
        self.mutator
            .delete_unit(&mut tree, id, reassign_children_to)?;
        self.store.write(&tree)?;
        Ok(())
    }

    /// Move a unit (with its subtree) under a new parent and persist.
    pub fn move_unit(&self, id: &str, new_parent_id: &str) -> ApplicationResult<OrgUnit> {
        debug!("move_unit: id={id} new_parent={new_parent_id}");
        let mut tree = self.store.read()?;
        let moved = self.mutator.move_unit(&mut tree, id, new_parent_id)?;
        self.store.write(&tree)?;
        Ok(moved)
    }

    /// Probe whether a cost center is free, reporting the conflicting unit
    /// when it is not.
    pub fn check_cost_center(&self, cost_center: &str) -> ApplicationResult<CostCenterCheck> {
        let tree = self.store.read()?;
        Ok(match query::find_by_cost_center(&tree, cost_center) {
            Some(unit) => CostCenterCheck {
                available: false,
                conflicting_unit: Some(ConflictingUnit {
                    id: unit.id.clone(),
                    name: unit.name.clone(),
                }),
            },
            None => CostCenterCheck {
                available: true,
                conflicting_unit: None,
            },
        })
    }

    /// All known unit types as `{value, label}` rows.
    pub fn list_types(&self) -> Vec<TypeOption> {
        self.rules.type_options()
    }

    /// Types permitted as direct children of `parent_type`.
    pub fn list_allowed_child_types(&self, parent_type: &str) -> ApplicationResult<Vec<TypeOption>> {
        self.rules
            .child_type_options(parent_type)
            .ok_or_else(|| ApplicationError::config(format!("unknown unit type: {parent_type}")))
    }

    /// Whole-tree validation report for the stored document.
    pub fn validate(&self) -> ApplicationResult<ValidationOutcome> {
        let tree = self.store.read()?;
        Ok(self.validator.validate_organization(&tree))
    }

    /// Manual snapshot of the stored document.
    pub fn snapshot(&self) -> ApplicationResult<std::path::PathBuf> {
        self.store.create_snapshot()
    }

    /// All backups, newest first.
    pub fn list_backups(&self) -> ApplicationResult<Vec<String>> {
        self.store.list_backups()
    }
}
