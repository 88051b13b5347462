//! Fixed canvas geometry shared by every layout.
//!
//! The dashboard draws on a 900x700 canvas. Force-directed output is held
//! inside [`FORCE_BOUNDS`]; the static layouts are anchored on
//! [`CENTER`].

use topology_types::Position;

/// Canvas width.
pub const WIDTH: f64 = 900.0;

/// Canvas height.
pub const HEIGHT: f64 = 700.0;

/// Canvas midpoint.
pub const CENTER: Position = Position::new(WIDTH / 2.0, HEIGHT / 2.0);

/// Axis-aligned rectangle that positions can be clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest allowed x.
    pub min_x: f64,
    /// Largest allowed x.
    pub max_x: f64,
    /// Smallest allowed y.
    pub min_y: f64,
    /// Largest allowed y.
    pub max_y: f64,
}

impl Bounds {
    /// Clamp a position into the rectangle. `NaN` coordinates snap to the
    /// lower edge.
    pub fn clamp(self, position: Position) -> Position {
        let axis = |v: f64, lo: f64, hi: f64| if v.is_nan() { lo } else { v.clamp(lo, hi) };
        Position::new(
            axis(position.x, self.min_x, self.max_x),
            axis(position.y, self.min_y, self.max_y),
        )
    }

    /// Whether a position lies inside the rectangle, edges included.
    pub fn contains(self, position: Position) -> bool {
        (self.min_x..=self.max_x).contains(&position.x)
            && (self.min_y..=self.max_y).contains(&position.y)
    }
}

/// Box the force-directed simulation is clamped into after every iteration.
pub const FORCE_BOUNDS: Bounds = Bounds {
    min_x: 50.0,
    max_x: 850.0,
    min_y: 50.0,
    max_y: 650.0,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_pulls_points_inside() {
        let clamped = FORCE_BOUNDS.clamp(Position::new(-10.0, 9000.0));
        assert_eq!(clamped, Position::new(50.0, 650.0));
        assert!(FORCE_BOUNDS.contains(clamped));
    }

    #[test]
    fn clamp_handles_nan() {
        let clamped = FORCE_BOUNDS.clamp(Position::new(f64::NAN, 300.0));
        assert_eq!(clamped, Position::new(50.0, 300.0));
    }

    #[test]
    fn center_is_canvas_midpoint() {
        assert_eq!(CENTER, Position::new(450.0, 350.0));
    }
}
