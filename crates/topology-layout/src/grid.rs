//! Grid layout: row-major cells in input order.

use topology_types::{Node, Position};

/// Width of one grid cell.
pub const CELL_WIDTH: f64 = 200.0;

/// Height of one grid cell.
pub const CELL_HEIGHT: f64 = 120.0;

/// Offset of the first cell from the canvas origin.
pub const PADDING: f64 = 50.0;

/// Number of columns for `n` nodes: the smallest `c` with `c * c >= n`,
/// i.e. `ceil(sqrt(n))` without going through floating point.
pub fn column_count(n: usize) -> usize {
    let mut columns: usize = 0;
    while columns.saturating_mul(columns) < n {
        columns = columns.saturating_add(1);
    }
    columns
}

/// Place nodes row-major on a `ceil(sqrt(n))`-column grid.
pub fn grid(nodes: &[Node]) -> Vec<Node> {
    let columns = column_count(nodes.len()).max(1);
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let col = i.checked_rem(columns).unwrap_or(0);
            let row = i.checked_div(columns).unwrap_or(0);
            let mut node = node.clone();
            node.position = Some(cell_origin(row, col));
            node
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn cell_origin(row: usize, col: usize) -> Position {
    Position::new(
        (col as f64).mul_add(CELL_WIDTH, PADDING),
        (row as f64).mul_add(CELL_HEIGHT, PADDING),
    )
}
