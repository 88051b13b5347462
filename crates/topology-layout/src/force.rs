//! Force-directed layout.
//!
//! Every pair of nodes repels with `repulsion / dist^2`; every edge is a
//! linear spring with no rest length pulling its endpoints together with
//! `spring * dist`. Each iteration damps velocity, integrates, and clamps
//! positions into [`ForceConfig::bounds`].
//!
//! [`ForceSimulation`] holds the state between iterations so callers can
//! advance it in chunks with [`ForceSimulation::step`] instead of blocking
//! for the whole run.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use topology_types::{Edge, Node, Position};

use crate::canvas::{Bounds, FORCE_BOUNDS};

/// Default iteration count.
pub const DEFAULT_ITERATIONS: usize = 50;

/// Default seed for nodes that enter the simulation without a position.
pub const DEFAULT_SEED: u64 = 42;

/// Below this separation two nodes are treated as coincident.
const COINCIDENT_EPSILON: f64 = 1e-9;

/// Golden angle in radians; spreads coincident pairs in distinct directions.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;

/// Tunables for the force-directed simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceConfig {
    /// Iterations a full run performs.
    pub iterations: usize,
    /// Pairwise repulsion constant.
    pub repulsion: f64,
    /// Edge spring constant.
    pub spring: f64,
    /// Velocity damping factor applied every iteration.
    pub damping: f64,
    /// Box positions are clamped into after each iteration.
    pub bounds: Bounds,
    /// Seed for placing nodes that have no position yet.
    pub seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            repulsion: 8000.0,
            spring: 0.05,
            damping: 0.85,
            bounds: FORCE_BOUNDS,
            seed: DEFAULT_SEED,
        }
    }
}

/// A 2D force or velocity vector.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Vector {
    dx: f64,
    dy: f64,
}

impl Vector {
    fn accumulate(&mut self, dx: f64, dy: f64) {
        self.dx += dx;
        self.dy += dy;
    }
}

/// In-progress force-directed run.
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    config: ForceConfig,
    ids: Vec<String>,
    positions: Vec<Position>,
    velocities: Vec<Vector>,
    /// `(source, target)` index pairs; self-loops and dangling edges excluded.
    springs: Vec<(usize, usize)>,
    remaining: usize,
}

impl ForceSimulation {
    /// Prepare a simulation over `nodes` and `edges`.
    ///
    /// Nodes without a position are seeded uniformly inside the bounds from
    /// a `StdRng` seeded with [`ForceConfig::seed`], in input order.
    pub fn new(nodes: &[Node], edges: &[Edge], config: ForceConfig) -> Self {
        let positions = seeded_positions(nodes, &config);
        let index: BTreeMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        let springs = edges
            .iter()
            .filter(|e| !e.is_self_loop())
            .filter_map(|e| {
                Some((
                    *index.get(e.source_id.as_str())?,
                    *index.get(e.target_id.as_str())?,
                ))
            })
            .collect();

        Self {
            config,
            ids: nodes.iter().map(|n| n.id.clone()).collect(),
            velocities: vec![Vector::default(); positions.len()],
            positions,
            springs,
            remaining: config.iterations,
        }
    }

    /// Run up to `iterations` iterations. Returns how many actually ran.
    pub fn step(&mut self, iterations: usize) -> usize {
        let run = iterations.min(self.remaining);
        for _ in 0..run {
            self.iterate();
        }
        self.remaining = self.remaining.saturating_sub(run);
        run
    }

    /// Run every remaining iteration.
    pub fn run(&mut self) {
        self.step(self.remaining);
    }

    /// Whether every configured iteration has run.
    pub const fn is_finished(&self) -> bool {
        self.remaining == 0
    }

    /// Iterations still to run.
    pub const fn remaining(&self) -> usize {
        self.remaining
    }

    /// Current position of every node, keyed by id.
    pub fn positions(&self) -> impl Iterator<Item = (&str, Position)> + '_ {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.positions.iter().copied())
    }

    /// Copy the current positions onto `nodes`, matching by id.
    pub fn apply_to(&self, nodes: &[Node]) -> Vec<Node> {
        let current: BTreeMap<&str, Position> = self.positions().collect();
        nodes
            .iter()
            .map(|node| {
                let mut node = node.clone();
                if let Some(&position) = current.get(node.id.as_str()) {
                    node.position = Some(position);
                }
                node
            })
            .collect()
    }

    fn iterate(&mut self) {
        let mut forces = vec![Vector::default(); self.positions.len()];

        for (i, &a) in self.positions.iter().enumerate() {
            for (j, &b) in self.positions.iter().enumerate().skip(i.saturating_add(1)) {
                let (ux, uy, distance) = direction(a, b, i);
                let magnitude = self.config.repulsion / distance.max(1.0).powi(2);
                if let Some(f) = forces.get_mut(i) {
                    f.accumulate(ux * magnitude, uy * magnitude);
                }
                if let Some(f) = forces.get_mut(j) {
                    f.accumulate(-ux * magnitude, -uy * magnitude);
                }
            }
        }

        for &(source, target) in &self.springs {
            let (Some(&s), Some(&t)) = (self.positions.get(source), self.positions.get(target))
            else {
                continue;
            };
            let fx = (t.x - s.x) * self.config.spring;
            let fy = (t.y - s.y) * self.config.spring;
            if let Some(f) = forces.get_mut(source) {
                f.accumulate(fx, fy);
            }
            if let Some(f) = forces.get_mut(target) {
                f.accumulate(-fx, -fy);
            }
        }

        let damping = self.config.damping;
        let bounds = self.config.bounds;
        for ((position, velocity), force) in self
            .positions
            .iter_mut()
            .zip(self.velocities.iter_mut())
            .zip(forces)
        {
            velocity.dx = (velocity.dx + force.dx) * damping;
            velocity.dy = (velocity.dy + force.dy) * damping;
            if !velocity.dx.is_finite() || !velocity.dy.is_finite() {
                *velocity = Vector::default();
            }
            *position = bounds.clamp(Position::new(
                position.x + velocity.dx,
                position.y + velocity.dy,
            ));
        }
    }
}

/// Unit vector pointing from `b` to `a`, and their distance.
///
/// Coincident points get a direction derived from `index` so the pair still
/// separates, and the same input always separates the same way.
#[allow(clippy::cast_precision_loss)]
fn direction(a: Position, b: Position, index: usize) -> (f64, f64, f64) {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let distance = dx.hypot(dy);
    if distance < COINCIDENT_EPSILON || !distance.is_finite() {
        let angle = (index as f64) * GOLDEN_ANGLE;
        return (angle.cos(), angle.sin(), 0.0);
    }
    (dx / distance, dy / distance, distance)
}

/// Positions for `nodes`, drawing missing ones from the seeded generator.
fn seeded_positions(nodes: &[Node], config: &ForceConfig) -> Vec<Position> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let b = config.bounds;
    nodes
        .iter()
        .map(|node| {
            node.position.unwrap_or_else(|| {
                Position::new(
                    rng.random_range(b.min_x..=b.max_x),
                    rng.random_range(b.min_y..=b.max_y),
                )
            })
        })
        .collect()
}

/// Fill in missing positions with the seeding rule and leave the rest alone.
pub fn seed_missing(nodes: &[Node], config: &ForceConfig) -> Vec<Node> {
    nodes
        .iter()
        .zip(seeded_positions(nodes, config))
        .map(|(node, position)| {
            let mut node = node.clone();
            node.position = Some(position);
            node
        })
        .collect()
}

/// Run a complete force-directed layout.
pub fn force_directed(nodes: &[Node], edges: &[Edge], config: ForceConfig) -> Vec<Node> {
    let mut simulation = ForceSimulation::new(nodes, edges, config);
    simulation.run();
    simulation.apply_to(nodes)
}

#[cfg(test)]
mod tests {
    use topology_types::NodeKind;

    use super::*;

    fn node(id: &str) -> Node {
        Node::new(id, id, NodeKind::Compute)
    }

    #[test]
    fn seeding_is_reproducible() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let first = seed_missing(&nodes, &ForceConfig::default());
        let second = seed_missing(&nodes, &ForceConfig::default());
        assert_eq!(first, second);
        assert!(first.iter().all(|n| n.position.is_some()));
    }

    #[test]
    fn seeding_keeps_existing_positions() {
        let nodes = vec![node("a").at(123.0, 456.0), node("b")];
        let out = seed_missing(&nodes, &ForceConfig::default());
        assert_eq!(out[0].position, Some(Position::new(123.0, 456.0)));
        assert!(out[1].position.is_some_and(|p| FORCE_BOUNDS.contains(p)));
    }

    #[test]
    fn step_runs_in_chunks() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![Edge::new("ab", "a", "b")];
        let mut sim = ForceSimulation::new(&nodes, &edges, ForceConfig::default());

        assert_eq!(sim.step(20), 20);
        assert_eq!(sim.remaining(), 30);
        assert_eq!(sim.step(100), 30);
        assert!(sim.is_finished());
        assert_eq!(sim.step(5), 0);
    }

    #[test]
    fn chunked_run_matches_full_run() {
        let nodes = vec![node("a"), node("b"), node("c"), node("d")];
        let edges = vec![Edge::new("ab", "a", "b"), Edge::new("cd", "c", "d")];
        let full = force_directed(&nodes, &edges, ForceConfig::default());

        let mut sim = ForceSimulation::new(&nodes, &edges, ForceConfig::default());
        while !sim.is_finished() {
            sim.step(7);
        }
        assert_eq!(sim.apply_to(&nodes), full);
    }

    #[test]
    fn coincident_nodes_separate() {
        let nodes = vec![node("a").at(400.0, 300.0), node("b").at(400.0, 300.0)];
        let out = force_directed(&nodes, &[], ForceConfig::default());
        let a = out[0].position.unwrap_or_default();
        let b = out[1].position.unwrap_or_default();
        assert!(a.distance_to(b) > 1.0);
    }

    #[test]
    fn connected_pair_ends_closer_than_unconnected_pair() {
        let nodes = vec![node("a").at(100.0, 350.0), node("b").at(800.0, 350.0)];
        let linked = force_directed(&nodes, &[Edge::new("ab", "a", "b")], ForceConfig::default());
        let free = force_directed(&nodes, &[], ForceConfig::default());

        let gap = |out: &[Node]| {
            let a = out[0].position.unwrap_or_default();
            let b = out[1].position.unwrap_or_default();
            a.distance_to(b)
        };
        assert!(gap(&linked) < gap(&free));
    }
}
