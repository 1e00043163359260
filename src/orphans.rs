//! Seed-reachability analysis and orphan cleanup.
//!
//! A node is retained only while a chain of parent links connects it to a
//! seed. Seeds are recognized here by `generation == 0` alone; a node whose
//! parent link dangles, or whose whole subtree hangs off such a node, is an
//! orphan no matter what its own fields claim. `find_orphans` is pure;
//! `cleanup_orphans` drives the store deletion and reports what went.
//!
//! Reachability is computed as a BFS from all seeds over a parent->children
//! index. That reaches the same fixed point as repeatedly rescanning the
//! table for nodes whose parent is already connected, in O(N) instead of
//! O(N²), and is insensitive to snapshot order.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::db::{Database, Knowledge, StoreResult};

/// Outcome of a reachability pass. `orphan_ids` keeps the snapshot's order.
#[derive(Debug, Clone, Serialize)]
pub struct OrphanReport {
    #[serde(rename = "connectedIds")]
    pub connected_ids: HashSet<String>,
    #[serde(rename = "orphanIds")]
    pub orphan_ids: Vec<String>,
}

/// Outcome of an orphan deletion run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    #[serde(rename = "deletedCount")]
    pub deleted_count: usize,
    #[serde(rename = "deletedIds")]
    pub deleted_ids: Vec<String>,
}

/// Split the snapshot into seed-connected nodes and orphans.
///
/// With no generation-0 node present everything is an orphan; an empty
/// snapshot yields an empty report. Neither case is an error.
pub fn find_orphans(all: &[Knowledge]) -> OrphanReport {
    let mut children_by_parent: HashMap<&str, Vec<&str>> = HashMap::new();
    for k in all {
        if let Some(parent_id) = &k.parent_id {
            children_by_parent
                .entry(parent_id.as_str())
                .or_default()
                .push(k.id.as_str());
        }
    }

    let mut connected: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for k in all {
        if k.generation == 0 && connected.insert(k.id.clone()) {
            queue.push_back(k.id.as_str());
        }
    }

    while let Some(current) = queue.pop_front() {
        if let Some(children) = children_by_parent.get(current) {
            for &child in children {
                if connected.insert(child.to_string()) {
                    queue.push_back(child);
                }
            }
        }
    }

    let orphan_ids = all
        .iter()
        .filter(|k| !connected.contains(&k.id))
        .map(|k| k.id.clone())
        .collect();

    OrphanReport {
        connected_ids: connected,
        orphan_ids,
    }
}

/// Delete every orphan from the store in one batch.
pub fn cleanup_orphans(db: &Database) -> StoreResult<CleanupReport> {
    let all = db.list_all()?;
    let report = find_orphans(&all);
    let deleted_count = db.delete_by_ids(&report.orphan_ids)?;
    Ok(CleanupReport {
        deleted_count,
        deleted_ids: report.orphan_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Category;

    fn make_nodes(specs: Vec<(&str, Option<&str>, i32)>) -> Vec<Knowledge> {
        specs
            .into_iter()
            .map(|(id, parent, generation)| Knowledge {
                id: id.to_string(),
                title: format!("Knowledge {}", id),
                category: Category::Misc,
                description: String::new(),
                parent_id: parent.map(|p| p.to_string()),
                generation,
                created_at: "2025-06-01T00:00:00Z".to_string(),
                created_by: "system".to_string(),
                chat_log: Vec::new(),
                times_shown: 0,
                children_count: 0,
            })
            .collect()
    }

    #[test]
    fn test_dangling_parent_is_orphaned() {
        // Node 4 points at a parent that does not exist, so it never
        // connects.
        let nodes = make_nodes(vec![
            ("1", None, 0),
            ("2", Some("1"), 1),
            ("3", Some("2"), 2),
            ("4", Some("99"), 1),
        ]);

        let report = find_orphans(&nodes);
        assert_eq!(report.orphan_ids, ["4"]);
        for id in ["1", "2", "3"] {
            assert!(report.connected_ids.contains(id), "{} reaches the seed", id);
        }
        assert!(!report.connected_ids.contains("4"));
    }

    #[test]
    fn test_detection_is_idempotent() {
        let nodes = make_nodes(vec![
            ("1", None, 0),
            ("2", Some("1"), 1),
            ("stray", Some("ghost"), 3),
        ]);

        let first = find_orphans(&nodes);
        let second = find_orphans(&nodes);
        assert_eq!(first.orphan_ids, second.orphan_ids);
        assert_eq!(first.connected_ids, second.connected_ids);
    }

    #[test]
    fn test_seeds_are_never_orphaned() {
        // Generation alone marks a seed here; even a seed carrying a
        // dangling parent link stays connected.
        let nodes = make_nodes(vec![
            ("normal-seed", None, 0),
            ("odd-seed", Some("ghost"), 0),
            ("stray", Some("nowhere"), 2),
        ]);

        let report = find_orphans(&nodes);
        assert!(report.connected_ids.contains("normal-seed"));
        assert!(report.connected_ids.contains("odd-seed"));
        assert_eq!(report.orphan_ids, ["stray"]);
    }

    #[test]
    fn test_no_seeds_means_everything_is_orphaned() {
        let nodes = make_nodes(vec![("a", None, 1), ("b", Some("a"), 2)]);
        let report = find_orphans(&nodes);
        assert!(report.connected_ids.is_empty());
        assert_eq!(report.orphan_ids, ["a", "b"]);
    }

    #[test]
    fn test_empty_snapshot() {
        let report = find_orphans(&[]);
        assert!(report.connected_ids.is_empty());
        assert!(report.orphan_ids.is_empty());
    }

    #[test]
    fn test_snapshot_order_does_not_matter() {
        // Child rows listed before their parents must still connect.
        let nodes = make_nodes(vec![
            ("grandchild", Some("child"), 2),
            ("child", Some("seed"), 1),
            ("seed", None, 0),
        ]);

        let report = find_orphans(&nodes);
        assert!(report.orphan_ids.is_empty());
        assert_eq!(report.connected_ids.len(), 3);
    }

    #[test]
    fn test_subtree_behind_dangling_link_falls_together() {
        let nodes = make_nodes(vec![
            ("seed", None, 0),
            ("d1", Some("ghost"), 1),
            ("d2", Some("d1"), 2),
            ("d3", Some("d2"), 3),
        ]);

        let report = find_orphans(&nodes);
        assert_eq!(report.orphan_ids, ["d1", "d2", "d3"], "snapshot order preserved");
    }

    #[test]
    fn test_unreachable_cycle_is_orphaned() {
        let nodes = make_nodes(vec![
            ("seed", None, 0),
            ("x", Some("y"), 1),
            ("y", Some("x"), 2),
        ]);

        let report = find_orphans(&nodes);
        assert_eq!(report.orphan_ids, ["x", "y"]);
    }

    #[test]
    fn test_two_seed_forest_has_no_orphans() {
        let nodes = make_nodes(vec![
            ("s1", None, 0),
            ("s2", None, 0),
            ("c1", Some("s1"), 1),
            ("c2", Some("s2"), 1),
        ]);

        let report = find_orphans(&nodes);
        assert!(report.orphan_ids.is_empty());
        assert_eq!(report.connected_ids.len(), 4);
    }

    #[test]
    fn test_cleanup_deletes_from_store() {
        let db = Database::in_memory().unwrap();

        let mut rows = make_nodes(vec![
            ("gen-1-abc", Some("seed-001"), 1),
            ("stray-1", Some("ghost"), 1),
            ("stray-2", Some("stray-1"), 2),
        ]);
        for k in rows.drain(..) {
            db.insert_if_absent(&k).unwrap();
        }

        let report = cleanup_orphans(&db).unwrap();
        assert_eq!(report.deleted_count, 2);
        assert!(report.deleted_ids.contains(&"stray-1".to_string()));
        assert!(report.deleted_ids.contains(&"stray-2".to_string()));

        // Seeds and the connected child survive; a second pass is a no-op.
        assert!(db.get_by_id("gen-1-abc").unwrap().is_some());
        assert_eq!(db.list_seeds().unwrap().len(), 5);
        let again = cleanup_orphans(&db).unwrap();
        assert_eq!(again.deleted_count, 0);
        assert!(again.deleted_ids.is_empty());
    }
}
