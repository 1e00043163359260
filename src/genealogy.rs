//! Pure lineage resolution over a knowledge snapshot.
//!
//! Given the full node set and a target id, reconstructs the genealogy view:
//! the ancestor chain (oldest first), the target itself, then every
//! descendant in breadth-first order. All functions are pure: they take a
//! snapshot slice and return owned report structs. No I/O, no println.
//!
//! Roots are recognized here by parent resolution alone: a null `parentId`
//! and a dangling one end the walk the same way. Generation numbers are
//! read for the `totalGenerations` summary but never drive the traversal.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::db::Knowledge;

/// Which part of the lineage the caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ancestors,
    Descendants,
    Both,
}

impl Direction {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ancestors" => Some(Direction::Ancestors),
            "descendants" => Some(Direction::Descendants),
            "both" => Some(Direction::Both),
            _ => None,
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Both
    }
}

/// Lineage view for one target node.
///
/// `genealogy` holds ancestors oldest-first, then the target, then
/// descendants in BFS order. An unknown target yields the empty view; that
/// is a normal outcome, not a fault.
#[derive(Debug, Clone, Serialize)]
pub struct GenealogyView {
    pub target: Option<Knowledge>,
    pub genealogy: Vec<Knowledge>,
    #[serde(rename = "totalGenerations")]
    pub total_generations: i32,
}

impl GenealogyView {
    fn empty() -> Self {
        GenealogyView {
            target: None,
            genealogy: Vec::new(),
            total_generations: 0,
        }
    }
}

/// Resolve the lineage of `target_id` within `all`.
///
/// The snapshot is indexed once (id map + children map), so one call is
/// O(N) in the snapshot size. The ancestor walk carries a visited set and
/// stops silently on a cycle or a dangling parent reference, keeping the
/// partial chain found so far. The descendant walk is a visited-set BFS;
/// children inherit the snapshot's relative order within each level.
pub fn resolve_genealogy(
    all: &[Knowledge],
    target_id: &str,
    direction: Direction,
) -> GenealogyView {
    let by_id: HashMap<&str, &Knowledge> = all.iter().map(|k| (k.id.as_str(), k)).collect();

    let target = match by_id.get(target_id) {
        Some(k) => *k,
        None => return GenealogyView::empty(),
    };

    let mut children_by_parent: HashMap<&str, Vec<&Knowledge>> = HashMap::new();
    for k in all {
        if let Some(parent_id) = &k.parent_id {
            children_by_parent.entry(parent_id.as_str()).or_default().push(k);
        }
    }

    let mut genealogy: Vec<&Knowledge> = Vec::new();

    if matches!(direction, Direction::Ancestors | Direction::Both) {
        let mut chain: Vec<&Knowledge> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(target.id.as_str());

        let mut current = target;
        while let Some(parent_id) = &current.parent_id {
            if !visited.insert(parent_id.as_str()) {
                break; // cycle; keep what was found so far
            }
            match by_id.get(parent_id.as_str()) {
                Some(parent) => {
                    chain.push(parent);
                    current = parent;
                }
                None => break, // dangling reference ends the walk
            }
        }

        chain.reverse();
        genealogy.extend(chain);
    }

    genealogy.push(target);

    if matches!(direction, Direction::Descendants | Direction::Both) {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(target.id.as_str());

        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(target.id.as_str());

        while let Some(current_id) = queue.pop_front() {
            if let Some(children) = children_by_parent.get(current_id) {
                for child in children {
                    if visited.insert(child.id.as_str()) {
                        genealogy.push(child);
                        queue.push_back(child.id.as_str());
                    }
                }
            }
        }
    }

    let total_generations = genealogy
        .iter()
        .map(|k| k.generation)
        .max()
        .map(|max| max + 1)
        .unwrap_or(0);

    GenealogyView {
        target: Some(target.clone()),
        genealogy: genealogy.into_iter().cloned().collect(),
        total_generations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Category;

    /// Helper to build a test snapshot from compact descriptions.
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

    fn ids(view: &GenealogyView) -> Vec<&str> {
        view.genealogy.iter().map(|k| k.id.as_str()).collect()
    }

    #[test]
    fn test_unknown_target_is_empty_not_error() {
        let nodes = make_nodes(vec![("1", None, 0)]);
        let view = resolve_genealogy(&nodes, "missing", Direction::Both);
        assert!(view.target.is_none());
        assert!(view.genealogy.is_empty());
        assert_eq!(view.total_generations, 0);
    }

    #[test]
    fn test_empty_snapshot() {
        let view = resolve_genealogy(&[], "1", Direction::Both);
        assert!(view.target.is_none());
        assert!(view.genealogy.is_empty());
        assert_eq!(view.total_generations, 0);
    }

    #[test]
    fn test_ancestor_chain_oldest_first() {
        // Unbroken chain: seed -> g1 -> g2 -> g3. Insertion order scrambled.
        let nodes = make_nodes(vec![
            ("g2", Some("g1"), 2),
            ("seed", None, 0),
            ("g3", Some("g2"), 3),
            ("g1", Some("seed"), 1),
        ]);

        let view = resolve_genealogy(&nodes, "g3", Direction::Ancestors);
        assert_eq!(ids(&view), ["seed", "g1", "g2", "g3"], "generation ascending, target last");

        let generations: Vec<i32> = view.genealogy.iter().map(|k| k.generation).collect();
        assert_eq!(generations, [0, 1, 2, 3]);
        assert_eq!(view.total_generations, 4);
    }

    #[test]
    fn test_lineage_with_dangling_parent() {
        // 3's chain resolves fully; 4's parent does not exist anywhere in
        // the snapshot.
        let nodes = make_nodes(vec![
            ("1", None, 0),
            ("2", Some("1"), 1),
            ("3", Some("2"), 2),
            ("4", Some("99"), 1),
        ]);

        let view = resolve_genealogy(&nodes, "3", Direction::Both);
        assert_eq!(ids(&view), ["1", "2", "3"]);
        assert_eq!(view.total_generations, 3);

        // The dangling node still resolves as itself, walk ends silently.
        let view = resolve_genealogy(&nodes, "4", Direction::Both);
        assert_eq!(ids(&view), ["4"]);
        assert_eq!(view.total_generations, 2);
    }

    #[test]
    fn test_descendants_in_bfs_order() {
        // root -> (a, b); a -> (a1, a2); b -> (b1)
        let nodes = make_nodes(vec![
            ("root", None, 0),
            ("a", Some("root"), 1),
            ("b", Some("root"), 1),
            ("a1", Some("a"), 2),
            ("a2", Some("a"), 2),
            ("b1", Some("b"), 2),
        ]);

        let view = resolve_genealogy(&nodes, "root", Direction::Descendants);
        assert_eq!(ids(&view), ["root", "a", "b", "a1", "a2", "b1"], "level order after the target");
    }

    #[test]
    fn test_descendants_complete_regardless_of_input_order() {
        let forward = make_nodes(vec![
            ("root", None, 0),
            ("a", Some("root"), 1),
            ("a1", Some("a"), 2),
        ]);
        let mut shuffled = forward.clone();
        shuffled.reverse();

        let a = resolve_genealogy(&forward, "root", Direction::Descendants);
        let b = resolve_genealogy(&shuffled, "root", Direction::Descendants);

        let mut a_ids = ids(&a);
        let mut b_ids = ids(&b);
        a_ids.sort_unstable();
        b_ids.sort_unstable();
        assert_eq!(a_ids, b_ids, "same member set in any insertion order");
        assert_eq!(a.genealogy.len(), 3);
        assert_eq!(b.genealogy.len(), 3);
    }

    #[test]
    fn test_self_parent_terminates() {
        let nodes = make_nodes(vec![("loop", Some("loop"), 1)]);
        let view = resolve_genealogy(&nodes, "loop", Direction::Both);
        assert_eq!(ids(&view), ["loop"], "self-reference must not hang the walk");
    }

    #[test]
    fn test_two_node_cycle_terminates() {
        let nodes = make_nodes(vec![("x", Some("y"), 1), ("y", Some("x"), 2)]);

        let view = resolve_genealogy(&nodes, "x", Direction::Ancestors);
        // y is reached once; the step back to x hits the visited set.
        assert_eq!(ids(&view), ["y", "x"]);

        // The descendant side is equally guarded.
        let view = resolve_genealogy(&nodes, "x", Direction::Both);
        let count = view.genealogy.iter().filter(|k| k.id == "x").count();
        assert_eq!(count, 1, "each node appears at most once");
    }

    #[test]
    fn test_direction_limits_the_view() {
        let nodes = make_nodes(vec![
            ("seed", None, 0),
            ("mid", Some("seed"), 1),
            ("leaf", Some("mid"), 2),
        ]);

        let up = resolve_genealogy(&nodes, "mid", Direction::Ancestors);
        assert_eq!(ids(&up), ["seed", "mid"]);

        let down = resolve_genealogy(&nodes, "mid", Direction::Descendants);
        assert_eq!(ids(&down), ["mid", "leaf"]);

        let both = resolve_genealogy(&nodes, "mid", Direction::Both);
        assert_eq!(ids(&both), ["seed", "mid", "leaf"]);
    }

    #[test]
    fn test_total_generations_follows_max_not_length() {
        // Malformed generation data flows through uncorrected.
        let nodes = make_nodes(vec![("seed", None, 0), ("odd", Some("seed"), 7)]);
        let view = resolve_genealogy(&nodes, "seed", Direction::Both);
        assert_eq!(view.total_generations, 8);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!(Direction::from_str("ancestors"), Some(Direction::Ancestors));
        assert_eq!(Direction::from_str("descendants"), Some(Direction::Descendants));
        assert_eq!(Direction::from_str("both"), Some(Direction::Both));
        assert_eq!(Direction::from_str("sideways"), None);
        assert_eq!(Direction::default(), Direction::Both);
    }
}
