//! Layout properties checked across whole graphs.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use topology_graph::starting_topology;
use topology_layout::canvas::{CENTER, FORCE_BOUNDS};
use topology_layout::{
    ForceConfig, LayoutAlgorithm, LayoutOptions, hierarchy_levels, layout, layout_with_options,
};
use topology_types::{Edge, Environment, Node, NodeKind, Position};

fn nodes(n: usize) -> Vec<Node> {
    (0..n)
        .map(|i| Node::new(format!("n{i}"), format!("Node {i}"), NodeKind::Compute))
        .collect()
}

fn complete_graph(n: usize) -> (Vec<Node>, Vec<Edge>) {
    let nodes = nodes(n);
    let mut edges = Vec::new();
    for (i, a) in nodes.iter().enumerate() {
        for b in nodes.iter().skip(i + 1) {
            edges.push(Edge::new(format!("{}-{}", a.id, b.id), &*a.id, &*b.id));
        }
    }
    (nodes, edges)
}

fn all_inside_force_bounds(out: &[Node]) -> bool {
    out.iter()
        .all(|n| n.position.is_some_and(|p| FORCE_BOUNDS.contains(p)))
}

#[test]
fn chain_levels_are_zero_one_two() {
    let nodes = vec![
        Node::new("a", "A", NodeKind::Gateway),
        Node::new("b", "B", NodeKind::Compute),
        Node::new("c", "C", NodeKind::Database),
    ];
    let edges = vec![Edge::new("ab", "a", "b"), Edge::new("bc", "b", "c")];
    let levels: Vec<usize> = hierarchy_levels(&nodes, &edges)
        .into_iter()
        .map(|(_, level)| level)
        .collect();
    assert_eq!(levels, vec![0, 1, 2]);
}

#[test]
fn circular_four_nodes_at_right_angles() {
    let out = layout(&nodes(4), &[], LayoutAlgorithm::Circular, &BTreeMap::new());
    let expected = [-90.0_f64, 0.0, 90.0, 180.0];
    for (node, want) in out.iter().zip(expected) {
        let p = node.position.unwrap();
        let got = (p.y - CENTER.y).atan2(p.x - CENTER.x).to_degrees();
        let diff = (got - want).rem_euclid(360.0);
        assert!(diff < 1e-6 || 360.0 - diff < 1e-6, "{}: {got} vs {want}", node.id);
    }
}

#[test]
fn grid_ten_nodes_has_four_columns() {
    let out = layout(&nodes(10), &[], LayoutAlgorithm::Grid, &BTreeMap::new());
    let first_row: Vec<&Node> = out
        .iter()
        .filter(|n| n.position.is_some_and(|p| (p.y - 50.0).abs() < 1e-9))
        .collect();
    assert_eq!(first_row.len(), 4);
    assert_eq!(out[4].position, Some(Position::new(50.0, 170.0)));
}

#[test]
fn force_keeps_isolated_node_in_bounds() {
    let fresh = vec![Node::new("solo", "Solo", NodeKind::External)];
    let out = layout(&fresh, &[], LayoutAlgorithm::ForceDirected, &BTreeMap::new());
    assert!(all_inside_force_bounds(&out));

    let lone = vec![Node::new("far", "Far", NodeKind::External).at(-5000.0, 9000.0)];
    let pair = vec![
        lone[0].clone(),
        Node::new("near", "Near", NodeKind::External).at(450.0, 350.0),
    ];
    let out = layout(&pair, &[], LayoutAlgorithm::ForceDirected, &BTreeMap::new());
    assert!(all_inside_force_bounds(&out));
}

#[test]
fn force_keeps_complete_graph_in_bounds() {
    for n in [2, 5, 12, 30] {
        let (nodes, edges) = complete_graph(n);
        let out = layout(&nodes, &edges, LayoutAlgorithm::ForceDirected, &BTreeMap::new());
        assert!(all_inside_force_bounds(&out), "complete graph of {n} escaped");
    }
}

#[test]
fn force_survives_extreme_constants() {
    let (nodes, edges) = complete_graph(8);
    let options = LayoutOptions {
        force: ForceConfig {
            repulsion: 1e12,
            spring: 5.0,
            ..ForceConfig::default()
        },
    };
    let out = layout_with_options(
        &nodes,
        &edges,
        LayoutAlgorithm::ForceDirected,
        &BTreeMap::new(),
        &options,
    );
    assert!(all_inside_force_bounds(&out));
}

#[test]
fn force_is_deterministic_for_unpositioned_input() {
    let graph = starting_topology(Environment::Production).unwrap();
    let unplaced: Vec<Node> = graph
        .nodes()
        .iter()
        .cloned()
        .map(|mut n| {
            n.position = None;
            n
        })
        .collect();
    let run = || {
        layout(
            &unplaced,
            graph.edges(),
            LayoutAlgorithm::ForceDirected,
            &BTreeMap::new(),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn different_seeds_give_different_layouts() {
    let (nodes, edges) = complete_graph(6);
    let with_seed = |seed| {
        let options = LayoutOptions {
            force: ForceConfig {
                seed,
                ..ForceConfig::default()
            },
        };
        layout_with_options(
            &nodes,
            &edges,
            LayoutAlgorithm::ForceDirected,
            &BTreeMap::new(),
            &options,
        )
    };
    assert_ne!(with_seed(1), with_seed(2));
}

#[test]
fn self_loop_contributes_no_force() {
    let nodes = vec![
        Node::new("a", "A", NodeKind::Compute).at(200.0, 200.0),
        Node::new("b", "B", NodeKind::Compute).at(600.0, 500.0),
    ];
    let plain = layout(&nodes, &[], LayoutAlgorithm::ForceDirected, &BTreeMap::new());
    let looped = layout(
        &nodes,
        &[Edge::new("aa", "a", "a"), Edge::new("bb", "b", "b")],
        LayoutAlgorithm::ForceDirected,
        &BTreeMap::new(),
    );
    assert_eq!(plain, looped);
}

#[test]
fn manual_restores_after_another_layout() {
    let graph = starting_topology(Environment::Staging).unwrap();
    let originals = layout(
        graph.nodes(),
        graph.edges(),
        LayoutAlgorithm::Grid,
        &BTreeMap::new(),
    );
    let original_positions: BTreeMap<String, Position> = originals
        .iter()
        .filter_map(|n| Some((n.id.clone(), n.position?)))
        .collect();

    let moved = layout(&originals, graph.edges(), LayoutAlgorithm::Circular, &BTreeMap::new());
    assert_ne!(moved, originals);

    let restored = layout(&moved, graph.edges(), LayoutAlgorithm::Manual, &original_positions);
    assert_eq!(restored, originals);
}

#[test]
fn every_algorithm_places_every_production_node() {
    let graph = starting_topology(Environment::Production).unwrap();
    for algorithm in LayoutAlgorithm::ALL {
        if algorithm == LayoutAlgorithm::Manual {
            continue;
        }
        let out = layout(graph.nodes(), graph.edges(), algorithm, &BTreeMap::new());
        assert_eq!(out.len(), graph.node_count());
        assert!(out.iter().all(|n| n.position.is_some()), "{algorithm}");
    }
}
