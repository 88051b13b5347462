//! Layout engine for the live topology view.
//!
//! Every algorithm is a pure function from `(nodes, edges)` to a new node
//! list with positions filled in. Only `position` changes; ids, metrics and
//! status are carried through untouched. Nothing here reads a clock or
//! global state, so layouts can run on any thread and repeat exactly.
//!
//! [`layout`] is the single entry point and dispatches on
//! [`LayoutAlgorithm`].

pub mod canvas;
pub mod circular;
pub mod force;
pub mod grid;
pub mod hierarchical;
pub mod manual;

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use topology_types::{Edge, Node, Position};
use tracing::debug;
use ts_rs::TS;

pub use force::{ForceConfig, ForceSimulation};
pub use hierarchical::hierarchy_levels;

/// The layout algorithms a viewer can pick from.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum LayoutAlgorithm {
    /// Restore the positions captured when the environment was loaded.
    Manual,
    /// Rows by BFS depth from the roots.
    #[default]
    Hierarchical,
    /// One ring around the canvas center.
    Circular,
    /// Row-major square-ish grid.
    Grid,
    /// Physics simulation with repulsion and edge springs.
    ForceDirected,
}

impl LayoutAlgorithm {
    /// Every algorithm, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Manual,
        Self::Hierarchical,
        Self::Circular,
        Self::Grid,
        Self::ForceDirected,
    ];

    /// Wire name of the algorithm.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Hierarchical => "hierarchical",
            Self::Circular => "circular",
            Self::Grid => "grid",
            Self::ForceDirected => "force-directed",
        }
    }
}

impl fmt::Display for LayoutAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layout algorithm: {0}")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for LayoutAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "hierarchical" | "tree" => Ok(Self::Hierarchical),
            "circular" | "circle" => Ok(Self::Circular),
            "grid" => Ok(Self::Grid),
            "force-directed" | "force_directed" | "force" => Ok(Self::ForceDirected),
            other => Err(UnknownAlgorithm(other.to_owned())),
        }
    }
}

/// Knobs that only some algorithms read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LayoutOptions {
    /// Force-directed tunables, also used to seed missing positions.
    pub force: ForceConfig,
}

/// Compute a layout with default options.
pub fn layout(
    nodes: &[Node],
    edges: &[Edge],
    algorithm: LayoutAlgorithm,
    original_positions: &BTreeMap<String, Position>,
) -> Vec<Node> {
    layout_with_options(
        nodes,
        edges,
        algorithm,
        original_positions,
        &LayoutOptions::default(),
    )
}

/// Compute a layout.
///
/// With zero or one node every algorithm except [`LayoutAlgorithm::Manual`]
/// returns the input as is, apart from seeding a missing position. This
/// takes precedence over the force-directed bounding box: a lone node that
/// already has a position keeps it even when it lies outside
/// [`canvas::FORCE_BOUNDS`]. A seeded position always lies inside.
pub fn layout_with_options(
    nodes: &[Node],
    edges: &[Edge],
    algorithm: LayoutAlgorithm,
    original_positions: &BTreeMap<String, Position>,
    options: &LayoutOptions,
) -> Vec<Node> {
    let laid_out = match algorithm {
        LayoutAlgorithm::Manual => manual::manual(nodes, original_positions),
        _ if nodes.len() <= 1 => force::seed_missing(nodes, &options.force),
        LayoutAlgorithm::Hierarchical => hierarchical::hierarchical(nodes, edges),
        LayoutAlgorithm::Circular => circular::circular(nodes),
        LayoutAlgorithm::Grid => grid::grid(nodes),
        LayoutAlgorithm::ForceDirected => force::force_directed(nodes, edges, options.force),
    };
    debug!(
        algorithm = %algorithm,
        nodes = nodes.len(),
        edges = edges.len(),
        "layout computed"
    );
    laid_out
}
