//! Hierarchical layout: breadth-first levels from the in-degree-zero roots.

use std::collections::{BTreeMap, VecDeque};

use topology_types::{Edge, Node, Position};

use crate::canvas::CENTER;

/// Horizontal spacing between nodes on one level.
pub const NODE_WIDTH: f64 = 200.0;

/// Vertical spacing between levels.
pub const LEVEL_HEIGHT: f64 = 130.0;

/// y coordinate of level 0.
pub const TOP_MARGIN: f64 = 100.0;

/// Assign each node a level.
///
/// Roots are nodes with in-degree zero. A multi-source BFS from every root
/// gives each reachable node its shortest distance from any root. Nodes no
/// root reaches get level 0.
///
/// The returned list is in first-discovery order: roots in input order, then
/// nodes as the BFS reaches them, then unreachable nodes in input order.
/// Edges whose endpoints are not in `nodes` are ignored.
pub fn hierarchy_levels(nodes: &[Node], edges: &[Edge]) -> Vec<(String, usize)> {
    let mut in_degree: BTreeMap<&str, usize> =
        nodes.iter().map(|n| (n.id.as_str(), 0_usize)).collect();
    let mut children: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for edge in edges {
        let source = edge.source_id.as_str();
        let target = edge.target_id.as_str();
        if !in_degree.contains_key(source) {
            continue;
        }
        let Some(degree) = in_degree.get_mut(target) else {
            continue;
        };
        *degree = degree.saturating_add(1);
        children.entry(source).or_default().push(target);
    }

    let mut levels: BTreeMap<&str, usize> = BTreeMap::new();
    let mut order: Vec<&str> = Vec::with_capacity(nodes.len());
    let mut queue: VecDeque<&str> = VecDeque::new();

    for node in nodes {
        let id = node.id.as_str();
        if in_degree.get(id) == Some(&0) && !levels.contains_key(id) {
            levels.insert(id, 0);
            order.push(id);
            queue.push_back(id);
        }
    }

    while let Some(current) = queue.pop_front() {
        let next_level = levels.get(current).copied().unwrap_or(0).saturating_add(1);
        for &child in children.get(current).into_iter().flatten() {
            if levels.contains_key(child) {
                continue;
            }
            levels.insert(child, next_level);
            order.push(child);
            queue.push_back(child);
        }
    }

    for node in nodes {
        let id = node.id.as_str();
        if !levels.contains_key(id) {
            levels.insert(id, 0);
            order.push(id);
        }
    }

    order
        .into_iter()
        .map(|id| (id.to_owned(), levels.get(id).copied().unwrap_or(0)))
        .collect()
}

/// Lay nodes out in horizontally centred rows, one row per level.
pub fn hierarchical(nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
    let levels = hierarchy_levels(nodes, edges);

    let mut rows: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for (id, level) in &levels {
        rows.entry(*level).or_default().push(id.as_str());
    }

    let mut positions: BTreeMap<&str, Position> = BTreeMap::new();
    for (level, ids) in &rows {
        let count = ids.len();
        for (slot, id) in ids.iter().enumerate() {
            positions.insert(id, slot_position(*level, slot, count));
        }
    }

    nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            if let Some(&position) = positions.get(node.id.as_str()) {
                node.position = Some(position);
            }
            node
        })
        .collect()
}

/// Position of `slot` within a level holding `count` nodes.
#[allow(clippy::cast_precision_loss)]
fn slot_position(level: usize, slot: usize, count: usize) -> Position {
    let centre_offset = (count.saturating_sub(1) as f64) / 2.0;
    Position::new(
        (slot as f64 - centre_offset).mul_add(NODE_WIDTH, CENTER.x),
        (level as f64).mul_add(LEVEL_HEIGHT, TOP_MARGIN),
    )
}

#[cfg(test)]
mod tests {
    use topology_types::NodeKind;

    use super::*;

    fn node(id: &str) -> Node {
        Node::new(id, id.to_uppercase(), NodeKind::Compute)
    }

    fn level_of(levels: &[(String, usize)], id: &str) -> Option<usize> {
        levels.iter().find(|(n, _)| n == id).map(|(_, l)| *l)
    }

    #[test]
    fn chain_gets_consecutive_levels() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let edges = vec![Edge::new("ab", "a", "b"), Edge::new("bc", "b", "c")];
        let levels = hierarchy_levels(&nodes, &edges);
        assert_eq!(
            levels,
            vec![
                (String::from("a"), 0),
                (String::from("b"), 1),
                (String::from("c"), 2),
            ]
        );
    }

    #[test]
    fn level_is_shortest_path_from_any_root() {
        // a -> b -> c -> d and a -> d: d sits on level 1.
        let nodes = vec![node("a"), node("b"), node("c"), node("d")];
        let edges = vec![
            Edge::new("ab", "a", "b"),
            Edge::new("bc", "b", "c"),
            Edge::new("cd", "c", "d"),
            Edge::new("ad", "a", "d"),
        ];
        let levels = hierarchy_levels(&nodes, &edges);
        assert_eq!(level_of(&levels, "d"), Some(1));
        assert_eq!(level_of(&levels, "c"), Some(2));
    }

    #[test]
    fn pure_cycle_falls_back_to_level_zero() {
        let nodes = vec![node("x"), node("y")];
        let edges = vec![Edge::new("xy", "x", "y"), Edge::new("yx", "y", "x")];
        let levels = hierarchy_levels(&nodes, &edges);
        assert_eq!(level_of(&levels, "x"), Some(0));
        assert_eq!(level_of(&levels, "y"), Some(0));
    }

    #[test]
    fn same_level_keeps_discovery_order() {
        // Root r discovers z before m; alphabetical order would flip them.
        let nodes = vec![node("m"), node("z"), node("r")];
        let edges = vec![Edge::new("rz", "r", "z"), Edge::new("rm", "r", "m")];
        let out = hierarchical(&nodes, &edges);
        let x_of = |id: &str| {
            out.iter()
                .find(|n| n.id == id)
                .and_then(|n| n.position)
                .map_or(f64::NAN, |p| p.x)
        };
        assert!(x_of("z") < x_of("m"));
    }

    #[test]
    fn rows_are_centred_on_canvas() {
        let nodes = vec![node("root"), node("l"), node("r")];
        let edges = vec![Edge::new("e1", "root", "l"), Edge::new("e2", "root", "r")];
        let out = hierarchical(&nodes, &edges);

        assert_eq!(out[0].position, Some(Position::new(450.0, 100.0)));
        assert_eq!(out[1].position, Some(Position::new(350.0, 230.0)));
        assert_eq!(out[2].position, Some(Position::new(550.0, 230.0)));
    }

    #[test]
    fn self_loop_makes_node_unreachable_not_lost() {
        let nodes = vec![node("solo")];
        let edges = vec![Edge::new("loop", "solo", "solo")];
        let levels = hierarchy_levels(&nodes, &edges);
        assert_eq!(levels, vec![(String::from("solo"), 0)]);
    }
}
