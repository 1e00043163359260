//! Tree layout for the genealogy view.
//!
//! Turns a filtered knowledge snapshot into positioned boxes and resolved
//! parent->child edges on one shared canvas. Pure computation: snapshot in,
//! coordinates out, no I/O.
//!
//! Two interchangeable strategies:
//!
//! - [`LayoutStrategy::Layered`] ranks nodes top-to-bottom by longest path
//!   from their layout root, reduces edge crossings with barycenter sweeps,
//!   and centers parents over their children where the row allows. The
//!   general-purpose mode, tolerant of any forest shape on one canvas.
//! - [`LayoutStrategy::Centered`] is the deterministic recursive mode: slot
//!   widths are summed bottom-up, every parent sits at the midpoint of its
//!   first and last child, root trees stand side by side.
//!
//! Edges are emitted only where both endpoints are inside the filtered set.
//! A child whose parent fell outside the filter is laid out as a root of its
//! own tree; that says nothing about it being a true seed.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::db::Knowledge;

/// Node box and spacing geometry, matching the client's rendering grid.
pub const NODE_WIDTH: f64 = 180.0;
pub const NODE_HEIGHT: f64 = 70.0;
/// Vertical gap between consecutive depths.
pub const RANK_GAP: f64 = 80.0;
/// Horizontal gap between neighboring boxes in a row.
pub const SIBLING_GAP: f64 = 40.0;
/// Extra horizontal margin between root trees in centered mode.
pub const TREE_GAP: f64 = 80.0;

/// One horizontal slot: a box plus its sibling gap.
const SLOT_WIDTH: f64 = NODE_WIDTH + SIBLING_GAP;
/// One vertical step: a box plus the rank gap.
const ROW_HEIGHT: f64 = NODE_HEIGHT + RANK_GAP;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStrategy {
    Layered,
    Centered,
}

impl LayoutStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutStrategy::Layered => "layered",
            LayoutStrategy::Centered => "centered",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "layered" => Some(LayoutStrategy::Layered),
            "centered" => Some(LayoutStrategy::Centered),
            _ => None,
        }
    }
}

impl Default for LayoutStrategy {
    fn default() -> Self {
        LayoutStrategy::Layered
    }
}

/// A node box placed on the canvas; `x`/`y` is the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// A parent->child link whose endpoints both survived the filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LayoutEdge>,
    #[serde(rename = "canvasWidth")]
    pub canvas_width: f64,
    #[serde(rename = "canvasHeight")]
    pub canvas_height: f64,
}

impl TreeLayout {
    fn empty() -> Self {
        TreeLayout {
            nodes: Vec::new(),
            edges: Vec::new(),
            canvas_width: 0.0,
            canvas_height: 0.0,
        }
    }
}

/// Lay out the given snapshot with the chosen strategy.
pub fn build_layout(nodes: &[Knowledge], strategy: LayoutStrategy) -> TreeLayout {
    if nodes.is_empty() {
        return TreeLayout::empty();
    }

    let present: HashSet<&str> = nodes.iter().map(|k| k.id.as_str()).collect();
    let edges: Vec<LayoutEdge> = nodes
        .iter()
        .filter_map(|k| {
            k.parent_id
                .as_deref()
                .filter(|p| present.contains(p))
                .map(|p| LayoutEdge {
                    source: p.to_string(),
                    target: k.id.to_string(),
                })
        })
        .collect();

    let positioned = match strategy {
        LayoutStrategy::Layered => layered_positions(nodes, &present),
        LayoutStrategy::Centered => centered_positions(nodes, &present),
    };

    let canvas_width = positioned
        .iter()
        .map(|n| n.x + NODE_WIDTH)
        .fold(0.0f64, f64::max);
    let canvas_height = positioned
        .iter()
        .map(|n| n.y + NODE_HEIGHT)
        .fold(0.0f64, f64::max);

    TreeLayout {
        nodes: positioned,
        edges,
        canvas_width,
        canvas_height,
    }
}

/// In-set parent of a node, if any. A parent outside the filtered set counts
/// as absent, which is what makes its children de-facto roots.
fn resolved_parent<'a>(k: &'a Knowledge, present: &HashSet<&'a str>) -> Option<&'a str> {
    k.parent_id.as_deref().filter(|p| present.contains(p))
}

// ---------------------------------------------------------------------------
// Layered strategy
// ---------------------------------------------------------------------------

/// Longest-path rank per node. Each node has at most one in-set parent, so
/// ranks follow the parent chain; the visited set bounds the walk on a
/// parent cycle, which then starts a rank of its own.
fn compute_ranks<'a>(
    nodes: &'a [Knowledge],
    parents: &HashMap<&'a str, &'a str>,
) -> HashMap<&'a str, usize> {
    let mut ranks: HashMap<&'a str, usize> = HashMap::new();

    for k in nodes {
        if ranks.contains_key(k.id.as_str()) {
            continue;
        }

        let mut chain: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = k.id.as_str();
        let base = loop {
            if let Some(&r) = ranks.get(current) {
                break r + 1;
            }
            if !seen.insert(current) {
                break 0;
            }
            chain.push(current);
            match parents.get(current) {
                Some(&p) => current = p,
                None => break 0,
            }
        };

        let mut rank = base;
        for &id in chain.iter().rev() {
            ranks.insert(id, rank);
            rank += 1;
        }
    }

    ranks
}

fn layered_positions(nodes: &[Knowledge], present: &HashSet<&str>) -> Vec<PositionedNode> {
    let parents: HashMap<&str, &str> = nodes
        .iter()
        .filter_map(|k| resolved_parent(k, present).map(|p| (k.id.as_str(), p)))
        .collect();
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for k in nodes {
        if let Some(p) = resolved_parent(k, present) {
            children.entry(p).or_default().push(k.id.as_str());
        }
    }

    let ranks = compute_ranks(nodes, &parents);
    let max_rank = ranks.values().copied().max().unwrap_or(0);

    // Rows start in snapshot order, then barycenter sweeps pull each node
    // toward the mean index of its neighbors in the adjacent row. Best
    // effort only; two down-up rounds settle small forests.
    let mut rows: Vec<Vec<&str>> = vec![Vec::new(); max_rank + 1];
    for k in nodes {
        rows[ranks[k.id.as_str()]].push(k.id.as_str());
    }
    let mut index_in_row: HashMap<&str, usize> = HashMap::new();
    for row in &rows {
        for (i, &id) in row.iter().enumerate() {
            index_in_row.insert(id, i);
        }
    }

    for _ in 0..2 {
        // Downward: follow parent positions.
        for r in 1..=max_rank {
            let mut keyed: Vec<(f64, &str)> = rows[r]
                .iter()
                .enumerate()
                .map(|(i, &id)| {
                    let bary = parents
                        .get(id)
                        .and_then(|p| index_in_row.get(p))
                        .map(|&pi| pi as f64)
                        .unwrap_or(i as f64);
                    (bary, id)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            rows[r] = keyed.into_iter().map(|(_, id)| id).collect();
            for (i, &id) in rows[r].iter().enumerate() {
                index_in_row.insert(id, i);
            }
        }
        // Upward: follow mean child positions.
        for r in (0..max_rank).rev() {
            let mut keyed: Vec<(f64, &str)> = rows[r]
                .iter()
                .enumerate()
                .map(|(i, &id)| {
                    let kids = children.get(id);
                    let bary = match kids {
                        Some(kids) if !kids.is_empty() => {
                            let sum: f64 = kids
                                .iter()
                                .filter_map(|c| index_in_row.get(c))
                                .map(|&ci| ci as f64)
                                .sum();
                            sum / kids.len() as f64
                        }
                        _ => i as f64,
                    };
                    (bary, id)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            rows[r] = keyed.into_iter().map(|(_, id)| id).collect();
            for (i, &id) in rows[r].iter().enumerate() {
                index_in_row.insert(id, i);
            }
        }
    }

    // Horizontal centers, bottom row first. Higher rows aim for the mean of
    // their children's centers; a left-to-right sweep restores the minimum
    // slot separation whenever targets collide.
    let mut center_x: HashMap<&str, f64> = HashMap::new();
    for r in (0..=max_rank).rev() {
        let mut prev: Option<f64> = None;
        let row = &rows[r];
        for (i, &id) in row.iter().enumerate() {
            let fallback = NODE_WIDTH / 2.0 + i as f64 * SLOT_WIDTH;
            let desired = match children.get(id) {
                Some(kids) if !kids.is_empty() => {
                    let centers: Vec<f64> = kids
                        .iter()
                        .filter_map(|c| center_x.get(c).copied())
                        .collect();
                    if centers.is_empty() {
                        fallback
                    } else {
                        centers.iter().sum::<f64>() / centers.len() as f64
                    }
                }
                _ => fallback,
            };
            let min_allowed = match prev {
                Some(p) => p + SLOT_WIDTH,
                None => NODE_WIDTH / 2.0,
            };
            let x = desired.max(min_allowed);
            center_x.insert(id, x);
            prev = Some(x);
        }
    }

    nodes
        .iter()
        .map(|k| {
            let id = k.id.as_str();
            PositionedNode {
                id: k.id.clone(),
                x: center_x[id] - NODE_WIDTH / 2.0,
                y: ranks[id] as f64 * ROW_HEIGHT,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Centered strategy
// ---------------------------------------------------------------------------

/// Slot width of a subtree: leaves take one slot, inner nodes the sum of
/// their children (never less than one). The visited set keeps malformed
/// data from recursing forever; a node is measured at most once.
fn subtree_slots<'a>(
    id: &'a str,
    children: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
    widths: &mut HashMap<&'a str, f64>,
) -> f64 {
    if !visited.insert(id) {
        return 0.0;
    }
    let width = match children.get(id) {
        Some(kids) if !kids.is_empty() => {
            let sum: f64 = kids
                .iter()
                .map(|&c| subtree_slots(c, children, visited, widths))
                .sum();
            sum.max(1.0)
        }
        _ => 1.0,
    };
    widths.insert(id, width);
    width
}

/// Place a subtree whose left edge sits at `left` slots; returns the node's
/// own center. Children are placed first so the parent can take the midpoint
/// of its first and last child.
fn place_subtree<'a>(
    id: &'a str,
    left: f64,
    depth: usize,
    children: &HashMap<&'a str, Vec<&'a str>>,
    widths: &HashMap<&'a str, f64>,
    visited: &mut HashSet<&'a str>,
    out: &mut Vec<(&'a str, f64, usize)>,
) -> f64 {
    if !visited.insert(id) {
        return left + 0.5;
    }

    let kids: Vec<&str> = children.get(id).cloned().unwrap_or_default();
    let center = if kids.is_empty() {
        left + 0.5
    } else {
        let mut cursor = left;
        let mut child_centers: Vec<f64> = Vec::new();
        for &child in &kids {
            if visited.contains(child) {
                continue;
            }
            let child_center =
                place_subtree(child, cursor, depth + 1, children, widths, visited, out);
            cursor += widths.get(child).copied().unwrap_or(1.0);
            child_centers.push(child_center);
        }
        match (child_centers.first(), child_centers.last()) {
            (Some(first), Some(last)) => (first + last) / 2.0,
            _ => left + 0.5,
        }
    };

    out.push((id, center, depth));
    center
}

fn centered_positions(nodes: &[Knowledge], present: &HashSet<&str>) -> Vec<PositionedNode> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for k in nodes {
        if let Some(p) = resolved_parent(k, present) {
            children.entry(p).or_default().push(k.id.as_str());
        }
    }

    // De-facto roots: no parent, or a parent the filter removed.
    let roots: Vec<&str> = nodes
        .iter()
        .filter(|k| resolved_parent(k, present).is_none())
        .map(|k| k.id.as_str())
        .collect();

    let mut widths: HashMap<&str, f64> = HashMap::new();
    {
        let mut measured: HashSet<&str> = HashSet::new();
        for &root in &roots {
            subtree_slots(root, &children, &mut measured, &mut widths);
        }
    }

    // Trees stand left to right; tree i also carries i extra margins.
    let mut placed: Vec<(&str, f64, usize)> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut tree_index = 0usize;
    let mut slots_so_far = 0.0f64;
    for &root in &roots {
        let mut tree_nodes: Vec<(&str, f64, usize)> = Vec::new();
        let _ = place_subtree(
            root,
            slots_so_far,
            0,
            &children,
            &widths,
            &mut visited,
            &mut tree_nodes,
        );
        if tree_nodes.is_empty() {
            continue;
        }
        let base_px = TREE_GAP * tree_index as f64;
        for (id, center_slots, depth) in tree_nodes {
            // A node centered in slot k has its pixel center at (k + 0.5)
            // slot widths; `center_slots` is already in that form.
            placed.push((id, center_slots * SLOT_WIDTH + base_px, depth));
        }
        slots_so_far += widths.get(root).copied().unwrap_or(1.0);
        tree_index += 1;
    }

    // Nodes unreachable from any root (parent cycles) have no place in a
    // tree; they are dropped here and left for the orphan collector.
    placed
        .into_iter()
        .map(|(id, center_px, depth)| PositionedNode {
            id: id.to_string(),
            x: center_px - NODE_WIDTH / 2.0,
            y: depth as f64 * ROW_HEIGHT,
        })
        .collect()
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

    fn position<'a>(layout: &'a TreeLayout, id: &str) -> &'a PositionedNode {
        layout
            .nodes
            .iter()
            .find(|n| n.id == id)
            .unwrap_or_else(|| panic!("node {} missing from layout", id))
    }

    fn assert_no_overlap_in_rows(layout: &TreeLayout) {
        for a in &layout.nodes {
            for b in &layout.nodes {
                if a.id < b.id && (a.y - b.y).abs() < f64::EPSILON {
                    let gap_ok = a.x + NODE_WIDTH <= b.x || b.x + NODE_WIDTH <= a.x;
                    assert!(
                        gap_ok,
                        "{} at x={} and {} at x={} overlap in the same row",
                        a.id, a.x, b.id, b.x
                    );
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Shared behavior
    // -----------------------------------------------------------------------

    #[test]
    fn test_empty_input_means_empty_canvas() {
        for strategy in [LayoutStrategy::Layered, LayoutStrategy::Centered] {
            let layout = build_layout(&[], strategy);
            assert!(layout.nodes.is_empty());
            assert!(layout.edges.is_empty());
            assert_eq!(layout.canvas_width, 0.0);
            assert_eq!(layout.canvas_height, 0.0);
        }
    }

    #[test]
    fn test_edges_need_both_endpoints() {
        let nodes = make_nodes(vec![
            ("seed", None, 0),
            ("kept", Some("seed"), 1),
            ("cut", Some("elsewhere"), 1),
        ]);

        for strategy in [LayoutStrategy::Layered, LayoutStrategy::Centered] {
            let layout = build_layout(&nodes, strategy);
            assert_eq!(layout.edges.len(), 1, "only the resolvable link survives");
            assert_eq!(layout.edges[0].source, "seed");
            assert_eq!(layout.edges[0].target, "kept");

            // The node with the filtered-out parent becomes a top-row root.
            assert_eq!(position(&layout, "cut").y, 0.0);
        }
    }

    #[test]
    fn test_single_node_canvas_extents() {
        let nodes = make_nodes(vec![("only", None, 0)]);
        for strategy in [LayoutStrategy::Layered, LayoutStrategy::Centered] {
            let layout = build_layout(&nodes, strategy);
            assert_eq!(layout.nodes.len(), 1);
            assert_eq!(layout.canvas_width, position(&layout, "only").x + NODE_WIDTH);
            assert_eq!(layout.canvas_height, NODE_HEIGHT);
        }
    }

    // -----------------------------------------------------------------------
    // Centered strategy
    // -----------------------------------------------------------------------

    #[test]
    fn test_centered_parent_sits_at_child_midpoint() {
        let nodes = make_nodes(vec![
            ("root", None, 0),
            ("a", Some("root"), 1),
            ("b", Some("root"), 1),
            ("c", Some("root"), 1),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Centered);
        let root = position(&layout, "root");
        let first = position(&layout, "a");
        let last = position(&layout, "c");
        let mid = (first.x + last.x) / 2.0;
        assert!(
            (root.x - mid).abs() < 1e-9,
            "root x {} must be the midpoint {} of its first and last child",
            root.x,
            mid
        );

        assert_eq!(root.y, 0.0);
        for id in ["a", "b", "c"] {
            assert_eq!(position(&layout, id).y, ROW_HEIGHT);
        }
    }

    #[test]
    fn test_centered_sibling_subtrees_do_not_overlap() {
        // Left subtree is wide (three leaves), right subtree narrow.
        let nodes = make_nodes(vec![
            ("root", None, 0),
            ("wide", Some("root"), 1),
            ("w1", Some("wide"), 2),
            ("w2", Some("wide"), 2),
            ("w3", Some("wide"), 2),
            ("narrow", Some("root"), 1),
            ("n1", Some("narrow"), 2),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Centered);
        assert_no_overlap_in_rows(&layout);

        // Every node of the wide subtree stays strictly left of the narrow one.
        let wide_max = ["wide", "w1", "w2", "w3"]
            .iter()
            .map(|id| position(&layout, id).x + NODE_WIDTH)
            .fold(0.0f64, f64::max);
        let narrow_min = ["narrow", "n1"]
            .iter()
            .map(|id| position(&layout, id).x)
            .fold(f64::INFINITY, f64::min);
        assert!(
            wide_max <= narrow_min,
            "sibling subtree ranges may not overlap ({} > {})",
            wide_max,
            narrow_min
        );
    }

    #[test]
    fn test_centered_two_seed_forest_side_by_side() {
        let nodes = make_nodes(vec![
            ("s1", None, 0),
            ("c1", Some("s1"), 1),
            ("s2", None, 0),
            ("c2", Some("s2"), 1),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Centered);
        assert_no_overlap_in_rows(&layout);

        let first_tree_max = ["s1", "c1"]
            .iter()
            .map(|id| position(&layout, id).x + NODE_WIDTH)
            .fold(0.0f64, f64::max);
        let second_tree_min = ["s2", "c2"]
            .iter()
            .map(|id| position(&layout, id).x)
            .fold(f64::INFINITY, f64::min);
        assert!(first_tree_max <= second_tree_min, "trees must not interleave");
        assert!(
            second_tree_min - first_tree_max >= TREE_GAP - 1e-9,
            "second tree carries the inter-tree margin"
        );

        assert_eq!(layout.edges.len(), 2);
    }

    #[test]
    fn test_centered_depth_follows_tree_not_generation() {
        // Generation numbers are data; depth comes from the realized tree.
        let nodes = make_nodes(vec![("root", Some("gone"), 4), ("kid", Some("root"), 5)]);
        let layout = build_layout(&nodes, LayoutStrategy::Centered);
        assert_eq!(position(&layout, "root").y, 0.0);
        assert_eq!(position(&layout, "kid").y, ROW_HEIGHT);
    }

    #[test]
    fn test_centered_drops_parent_cycles() {
        let nodes = make_nodes(vec![
            ("seed", None, 0),
            ("x", Some("y"), 1),
            ("y", Some("x"), 2),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Centered);
        let placed: Vec<&str> = layout.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(placed, ["seed"], "cycle members have no tree to stand in");
    }

    #[test]
    fn test_centered_canvas_covers_all_boxes() {
        let nodes = make_nodes(vec![
            ("r", None, 0),
            ("a", Some("r"), 1),
            ("b", Some("r"), 1),
        ]);
        let layout = build_layout(&nodes, LayoutStrategy::Centered);
        for n in &layout.nodes {
            assert!(n.x >= 0.0);
            assert!(n.x + NODE_WIDTH <= layout.canvas_width + 1e-9);
            assert!(n.y + NODE_HEIGHT <= layout.canvas_height + 1e-9);
        }
        assert_eq!(layout.canvas_height, ROW_HEIGHT + NODE_HEIGHT);
    }

    // -----------------------------------------------------------------------
    // Layered strategy
    // -----------------------------------------------------------------------

    #[test]
    fn test_layered_edges_step_one_rank_down() {
        let nodes = make_nodes(vec![
            ("seed", None, 0),
            ("a", Some("seed"), 1),
            ("b", Some("seed"), 1),
            ("a1", Some("a"), 2),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Layered);
        for edge in &layout.edges {
            let parent = position(&layout, &edge.source);
            let child = position(&layout, &edge.target);
            assert!(
                (child.y - parent.y - ROW_HEIGHT).abs() < 1e-9,
                "edge {}->{} must span exactly one rank",
                edge.source,
                edge.target
            );
        }
    }

    #[test]
    fn test_layered_rows_keep_slot_separation() {
        let nodes = make_nodes(vec![
            ("seed", None, 0),
            ("a", Some("seed"), 1),
            ("b", Some("seed"), 1),
            ("c", Some("seed"), 1),
            ("a1", Some("a"), 2),
            ("b1", Some("b"), 2),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Layered);
        assert_no_overlap_in_rows(&layout);

        // Same-row neighbors keep at least the sibling gap.
        let mut row1: Vec<f64> = ["a", "b", "c"]
            .iter()
            .map(|id| position(&layout, id).x)
            .collect();
        row1.sort_by(f64::total_cmp);
        assert!(row1[1] - row1[0] >= SLOT_WIDTH - 1e-9);
        assert!(row1[2] - row1[1] >= SLOT_WIDTH - 1e-9);
    }

    #[test]
    fn test_layered_multiple_roots_share_the_canvas() {
        let nodes = make_nodes(vec![
            ("s1", None, 0),
            ("s2", None, 0),
            ("c1", Some("s1"), 1),
            ("c2", Some("s2"), 1),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Layered);
        assert_eq!(layout.nodes.len(), 4);
        assert_no_overlap_in_rows(&layout);
        assert_eq!(position(&layout, "s1").y, 0.0);
        assert_eq!(position(&layout, "s2").y, 0.0);
    }

    #[test]
    fn test_layered_positions_every_node_even_in_cycles() {
        let nodes = make_nodes(vec![
            ("seed", None, 0),
            ("x", Some("y"), 1),
            ("y", Some("x"), 2),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Layered);
        assert_eq!(layout.nodes.len(), 3, "layered mode places all input nodes");
        assert_no_overlap_in_rows(&layout);
    }

    #[test]
    fn test_layered_parent_centered_over_children_when_free() {
        let nodes = make_nodes(vec![
            ("root", None, 0),
            ("a", Some("root"), 1),
            ("b", Some("root"), 1),
        ]);

        let layout = build_layout(&nodes, LayoutStrategy::Layered);
        let root = position(&layout, "root");
        let a = position(&layout, "a");
        let b = position(&layout, "b");
        let mid = (a.x + b.x) / 2.0;
        assert!(
            (root.x - mid).abs() < 1e-9,
            "lone root should center over its two children"
        );
    }
}
