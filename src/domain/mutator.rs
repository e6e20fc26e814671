//! Tree mutation: the only component that changes tree shape
//!
//! Every mutation validates its preconditions, applies the change to the
//! in-memory tree, then re-runs whole-tree validation as a final gate. On
//! any error the caller must discard the mutated tree; nothing here is
//! written to storage, so a rejected mutation never reaches it.
//!
//! Units are located via explicit index paths (`query::find_path`), which
//! hand the mutation direct access to unit, parent and position in the
//! parent's children list.

use std::sync::Arc;

use tracing::debug;

use crate::domain::entities::{NewUnit, OrgUnit, TypeRules, UnitUpdate};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::query;
use crate::domain::validator::OrgValidator;

/// Mutation engine over an owned organization tree.
#[derive(Debug, Clone)]
pub struct OrgMutator {
    validator: OrgValidator,
}

impl OrgMutator {
    pub fn new(rules: Arc<TypeRules>) -> Self {
        Self {
            validator: OrgValidator::new(rules),
        }
    }

    /// Append a new childless unit under `parent_id`.
    ///
    /// Preconditions: parent exists, id and cost center are unique, the
    /// child type is legal under the parent type.
    pub fn create_child(
        &self,
        root: &mut OrgUnit,
        parent_id: &str,
        fields: NewUnit,
    ) -> DomainResult<OrgUnit> {
        debug!("create_child: parent={parent_id} id={}", fields.id);
        self.validator.validate_new_unit_fields(&fields).into_result()?;

        let parent_path = query::find_path(root, parent_id)
            .ok_or_else(|| DomainError::UnitNotFound(parent_id.to_string()))?;

        let mut issues = Vec::new();
        issues.extend(self.validator.validate_unique_id(root, &fields.id, None).issues);
        issues.extend(
            self.validator
                .validate_unique_cost_center(root, &fields.cost_center, None)
                .issues,
        );
        let parent_type = query::node_at(root, &parent_path)
            .ok_or_else(|| DomainError::UnitNotFound(parent_id.to_string()))?
            .unit_type
            .clone();
        issues.extend(
            self.validator
                .validate_child_type(&parent_type, &fields.unit_type)
                .issues,
        );
        if !issues.is_empty() {
            return Err(DomainError::validation(issues));
        }

        let new_unit = fields.into_unit();
        let parent = query::node_at_mut(root, &parent_path)
            .ok_or_else(|| DomainError::UnitNotFound(parent_id.to_string()))?;
        parent.children.push(new_unit.clone());

        self.validator.validate_organization(root).into_result()?;
        Ok(new_unit)
    }

    /// Apply a partial update to the unit with the given id. Omitted fields
    /// stay untouched; clearing `manager` requires the explicit signal.
    pub fn update_fields(
        &self,
        root: &mut OrgUnit,
        id: &str,
        update: UnitUpdate,
    ) -> DomainResult<OrgUnit> {
        debug!("update_fields: id={id}");
        self.validator.validate_update_fields(&update).into_result()?;

        let path = query::find_path(root, id)
            .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;

        let mut issues = Vec::new();
        {
            let unit = query::node_at(root, &path)
                .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;
            if let Some(cc) = &update.cost_center {
                if cc != &unit.cost_center {
                    issues.extend(
                        self.validator
                            .validate_unique_cost_center(root, cc, Some(id))
                            .issues,
                    );
                }
            }
            if let Some(new_type) = &update.unit_type {
                if new_type != &unit.unit_type {
                    let parent_type = query::find_parent(root, id).map(|p| p.unit_type.clone());
                    issues.extend(
                        self.validator
                            .validate_type_change(unit, new_type, parent_type.as_deref())
                            .issues,
                    );
                }
            }
        }
        if !issues.is_empty() {
            return Err(DomainError::validation(issues));
        }

        let unit = query::node_at_mut(root, &path)
            .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;
        if let Some(name) = update.name {
            unit.name = name;
        }
        if update.clear_manager {
            unit.manager = None;
        } else if let Some(manager) = update.manager {
            unit.manager = Some(manager);
        }
        if let Some(cc) = update.cost_center {
            unit.cost_center = cc;
        }
        if let Some(t) = update.unit_type {
            unit.unit_type = t;
        }
        let updated = unit.clone();

        self.validator.validate_organization(root).into_result()?;
        Ok(updated)
    }

    /// Remove the unit with the given id. A unit with children requires a
    /// reassignment target that receives all children (re-parented, their
    /// own subtrees preserved). A supplied target is resolved even when the
    /// unit is a leaf, so a mistyped target id is rejected instead of
    /// silently ignored. The reassignment is followed by whole-tree
    /// validation, so children whose type is illegal under the target
    /// reject the delete.
    pub fn delete_unit(
        &self,
        root: &mut OrgUnit,
        id: &str,
        reassign_children_to: Option<&str>,
    ) -> DomainResult<()> {
        debug!("delete_unit: id={id} reassign_to={reassign_children_to:?}");
        if root.id == id {
            return Err(DomainError::validation(vec![
                "cannot delete the top level unit".to_string(),
            ]));
        }
        let path = query::find_path(root, id)
            .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;

        {
            let unit = query::node_at(root, &path)
                .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;
            self.validator
                .validate_delete(unit, reassign_children_to.is_some())
                .into_result()?;

            // A supplied target must exist and must survive the delete,
            // even for a leaf where no children will actually move.
            if let Some(target_id) = reassign_children_to {
                let target = query::find_by_id(root, target_id)
                    .ok_or_else(|| DomainError::UnitNotFound(target_id.to_string()))?;
                if target.id == unit.id || query::is_descendant(unit, target) {
                    return Err(DomainError::validation(vec![format!(
                        "cannot reassign children to {target_id}: it is removed by this delete"
                    )]));
                }
            }
        }

        // Detach the unit, then hand its children to the target.
        let (last, parent_path) = path.split_last().expect("non-root path is never empty");
        let parent = query::node_at_mut(root, parent_path)
            .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;
        let removed = parent.children.remove(*last);

        if !removed.children.is_empty() {
            let target_id = reassign_children_to.unwrap_or_default();
            let target_path = query::find_path(root, target_id)
                .ok_or_else(|| DomainError::UnitNotFound(target_id.to_string()))?;
            let target = query::node_at_mut(root, &target_path)
                .ok_or_else(|| DomainError::UnitNotFound(target_id.to_string()))?;
            target.children.extend(removed.children);
        }

        self.validator.validate_organization(root).into_result()?;
        Ok(())
    }

    /// Relocate a unit (and its entire subtree) under a new parent.
    pub fn move_unit(
        &self,
        root: &mut OrgUnit,
        id: &str,
        new_parent_id: &str,
    ) -> DomainResult<OrgUnit> {
        debug!("move_unit: id={id} new_parent={new_parent_id}");
        if root.id == id {
            return Err(DomainError::validation(vec![
                "cannot move the top level unit".to_string(),
            ]));
        }
        let path = query::find_path(root, id)
            .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;

        {
            let unit = query::node_at(root, &path)
                .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;
            let new_parent = query::find_by_id(root, new_parent_id)
                .ok_or_else(|| DomainError::UnitNotFound(new_parent_id.to_string()))?;
            self.validator.validate_move(unit, new_parent).into_result()?;
        }

        let (last, parent_path) = path.split_last().expect("non-root path is never empty");
        let parent = query::node_at_mut(root, parent_path)
            .ok_or_else(|| DomainError::UnitNotFound(id.to_string()))?;
        let moved = parent.children.remove(*last);

        // Indices may have shifted; locate the target afresh.
        let target_path = query::find_path(root, new_parent_id)
            .ok_or_else(|| DomainError::UnitNotFound(new_parent_id.to_string()))?;
        let target = query::node_at_mut(root, &target_path)
            .ok_or_else(|| DomainError::UnitNotFound(new_parent_id.to_string()))?;
        target.children.push(moved);
        let moved = target
            .children
            .last()
            .expect("just pushed")
            .clone();

        self.validator.validate_organization(root).into_result()?;
        Ok(moved)
    }
}
