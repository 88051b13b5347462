//! Circular layout: evenly spaced around one ring, starting at 12 o'clock
//! and proceeding clockwise.

use std::f64::consts::{FRAC_PI_2, TAU};

use topology_types::{Node, Position};

use crate::canvas::CENTER;

/// Largest ring radius.
pub const MAX_RADIUS: f64 = 300.0;

/// Ring radius for `n` nodes: `min(300, 50 + 25 n)`.
#[allow(clippy::cast_precision_loss)]
pub fn radius(n: usize) -> f64 {
    (n as f64).mul_add(25.0, 50.0).min(MAX_RADIUS)
}

/// Angle in radians of slot `k` out of `n`: `-pi/2 + k * 2pi / n`.
///
/// Screen y grows downward, so increasing angles run clockwise.
#[allow(clippy::cast_precision_loss)]
pub fn slot_angle(k: usize, n: usize) -> f64 {
    if n == 0 {
        return -FRAC_PI_2;
    }
    (k as f64).mul_add(TAU / n as f64, -FRAC_PI_2)
}

/// Place nodes on a ring around the canvas center.
pub fn circular(nodes: &[Node]) -> Vec<Node> {
    let n = nodes.len();
    let r = radius(n);
    nodes
        .iter()
        .enumerate()
        .map(|(k, node)| {
            let angle = slot_angle(k, n);
            let mut node = node.clone();
            node.position = Some(Position::new(
                r.mul_add(angle.cos(), CENTER.x),
                r.mul_add(angle.sin(), CENTER.y),
            ));
            node
        })
        .collect()
}
