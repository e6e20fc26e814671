//! Read-only tree traversal utilities
//!
//! All functions are pure and return references into the existing tree.
//! The mutator builds on `find_path`, which locates a unit as an explicit
//! index path from the root instead of capturing found-node references in
//! closures.

use std::collections::BTreeSet;

use crate::domain::entities::OrgUnit;

/// Depth-first search by id. Ids are unique in a valid tree, so the first
/// match is the only match.
pub fn find_by_id<'a>(root: &'a OrgUnit, id: &str) -> Option<&'a OrgUnit> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_by_id(c, id))
}

/// Depth-first search by cost center.
pub fn find_by_cost_center<'a>(root: &'a OrgUnit, cost_center: &str) -> Option<&'a OrgUnit> {
    if root.cost_center == cost_center {
        return Some(root);
    }
    root.children
        .iter()
        .find_map(|c| find_by_cost_center(c, cost_center))
}

/// Direct parent of the unit with the given id, or `None` when `id` names
/// the root or nothing at all.
pub fn find_parent<'a>(root: &'a OrgUnit, id: &str) -> Option<&'a OrgUnit> {
    if root.children.iter().any(|c| c.id == id) {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_parent(c, id))
}

/// Whether `descendant` is reachable from `ancestor` via the children
/// relation. A unit is not its own descendant; callers decide whether
/// self-reference counts (the move check tests it separately).
pub fn is_descendant(ancestor: &OrgUnit, descendant: &OrgUnit) -> bool {
    ancestor
        .children
        .iter()
        .any(|c| c.id == descendant.id || is_descendant(c, descendant))
}

/// Leaf cost centers beneath a unit, in child order. A leaf's scope is its
/// own cost center; an internal unit has no own metrics row and its scope
/// is the concatenation over its children.
pub fn leaf_cost_centers(unit: &OrgUnit) -> Vec<String> {
    if unit.is_leaf() {
        return vec![unit.cost_center.clone()];
    }
    unit.children.iter().flat_map(leaf_cost_centers).collect()
}

/// All ids in the tree, optionally excluding one unit's id (used by
/// uniqueness checks during update so a no-op update stays legal).
pub fn collect_ids(root: &OrgUnit, exclude_id: Option<&str>) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    collect_into(root, exclude_id, &mut ids, &|u| u.id.clone());
    ids
}

/// All cost centers in the tree, optionally excluding one unit.
pub fn collect_cost_centers(root: &OrgUnit, exclude_id: Option<&str>) -> BTreeSet<String> {
    let mut centers = BTreeSet::new();
    collect_into(root, exclude_id, &mut centers, &|u| u.cost_center.clone());
    centers
}

fn collect_into(
    unit: &OrgUnit,
    exclude_id: Option<&str>,
    out: &mut BTreeSet<String>,
    key: &dyn Fn(&OrgUnit) -> String,
) {
    if exclude_id != Some(unit.id.as_str()) {
        out.insert(key(unit));
    }
    for child in &unit.children {
        collect_into(child, exclude_id, out, key);
    }
}

/// Index path from the root to the unit with the given id: each entry is a
/// position in the parent's `children` list. The empty path names the root.
pub fn find_path(root: &OrgUnit, id: &str) -> Option<Vec<usize>> {
    if root.id == id {
        return Some(Vec::new());
    }
    for (i, child) in root.children.iter().enumerate() {
        if let Some(mut rest) = find_path(child, id) {
            rest.insert(0, i);
            return Some(rest);
        }
    }
    None
}

/// Resolve an index path to a node reference.
pub fn node_at<'a>(root: &'a OrgUnit, path: &[usize]) -> Option<&'a OrgUnit> {
    let mut current = root;
    for &i in path {
        current = current.children.get(i)?;
    }
    Some(current)
}

/// Resolve an index path to a mutable node reference.
pub fn node_at_mut<'a>(root: &'a mut OrgUnit, path: &[usize]) -> Option<&'a mut OrgUnit> {
    let mut current = root;
    for &i in path {
        current = current.children.get_mut(i)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, cc: &str, children: Vec<OrgUnit>) -> OrgUnit {
        OrgUnit {
            id: id.to_string(),
            name: id.to_uppercase(),
            unit_type: "enhet".to_string(),
            cost_center: cc.to_string(),
            manager: None,
            children,
        }
    }

    fn sample_tree() -> OrgUnit {
        unit(
            "root",
            "0001",
            vec![
                unit(
                    "ops",
                    "0002",
                    vec![unit("ops-a", "0010", vec![]), unit("ops-b", "0020", vec![])],
                ),
                unit("hr", "0003", vec![]),
            ],
        )
    }

    #[test]
    fn given_nested_tree_when_finding_by_id_then_returns_unit() {
        let tree = sample_tree();
        assert_eq!(find_by_id(&tree, "ops-b").map(|u| u.cost_center.as_str()), Some("0020"));
        assert!(find_by_id(&tree, "missing").is_none());
    }

    #[test]
    fn given_nested_tree_when_finding_by_cost_center_then_returns_unit() {
        let tree = sample_tree();
        assert_eq!(find_by_cost_center(&tree, "0010").map(|u| u.id.as_str()), Some("ops-a"));
    }

    #[test]
    fn given_nested_tree_when_finding_parent_then_returns_direct_parent() {
        let tree = sample_tree();
        assert_eq!(find_parent(&tree, "ops-a").map(|u| u.id.as_str()), Some("ops"));
        assert!(find_parent(&tree, "root").is_none());
    }

    #[test]
    fn given_subtree_when_checking_descendant_then_excludes_self() {
        let tree = sample_tree();
        let ops = find_by_id(&tree, "ops").unwrap();
        let ops_a = find_by_id(&tree, "ops-a").unwrap();
        assert!(is_descendant(&tree, ops_a));
        assert!(is_descendant(ops, ops_a));
        assert!(!is_descendant(ops_a, ops));
        assert!(!is_descendant(ops, ops));
    }

    #[test]
    fn given_internal_unit_when_collecting_leaf_cost_centers_then_skips_own() {
        let tree = sample_tree();
        let ops = find_by_id(&tree, "ops").unwrap();
        assert_eq!(leaf_cost_centers(ops), vec!["0010", "0020"]);
        assert_eq!(leaf_cost_centers(&tree), vec!["0010", "0020", "0003"]);
    }

    #[test]
    fn given_leaf_unit_when_collecting_leaf_cost_centers_then_returns_itself() {
        let tree = sample_tree();
        let hr = find_by_id(&tree, "hr").unwrap();
        assert_eq!(leaf_cost_centers(hr), vec!["0003"]);
    }

    #[test]
    fn given_exclude_id_when_collecting_then_omits_that_unit() {
        let tree = sample_tree();
        let ids = collect_ids(&tree, Some("hr"));
        assert!(!ids.contains("hr"));
        assert!(ids.contains("ops-a"));
        let ccs = collect_cost_centers(&tree, Some("hr"));
        assert!(!ccs.contains("0003"));
    }

    #[test]
    fn given_index_path_when_resolving_then_reaches_same_unit() {
        let tree = sample_tree();
        let path = find_path(&tree, "ops-b").unwrap();
        assert_eq!(path, vec![0, 1]);
        assert_eq!(node_at(&tree, &path).map(|u| u.id.as_str()), Some("ops-b"));
        assert_eq!(find_path(&tree, "root"), Some(vec![]));
        assert!(find_path(&tree, "missing").is_none());
    }
}
