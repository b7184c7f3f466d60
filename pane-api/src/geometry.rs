//! Window and widget geometry.

use serde::{Deserialize, Serialize};

/// Position and size in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same position, new size.
    pub fn resized(self, width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }

    /// Whether the point lies inside. Right and bottom edges are exclusive.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let right = i64::from(self.x) + i64::from(self.width);
        let bottom = i64::from(self.y) + i64::from(self.height);
        x >= self.x && y >= self.y && i64::from(x) < right && i64::from(y) < bottom
    }

    pub fn same_size(&self, other: &Geometry) -> bool {
        self.width == other.width && self.height == other.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_excludes_far_edges() {
        let g = Geometry::new(10, 10, 20, 5);
        assert!(g.contains(10, 10));
        assert!(g.contains(29, 14));
        assert!(!g.contains(30, 14));
        assert!(!g.contains(29, 15));
        assert!(!g.contains(9, 12));
    }

    #[test]
    fn test_contains_near_coordinate_limit() {
        let g = Geometry::new(i32::MAX - 10, 0, 100, 100);
        assert!(g.contains(i32::MAX - 5, 5));
        assert!(g.contains(i32::MAX, 99));
        assert!(!g.contains(i32::MAX - 11, 5));

        let negative = Geometry::new(i32::MIN, i32::MIN, 10, 10);
        assert!(negative.contains(i32::MIN + 9, i32::MIN));
        assert!(!negative.contains(i32::MIN + 10, i32::MIN));
    }

    #[test]
    fn test_resized_keeps_origin() {
        let g = Geometry::new(3, 4, 100, 100).resized(640, 480);
        assert_eq!(g, Geometry::new(3, 4, 640, 480));
        assert!(!g.same_size(&Geometry::new(3, 4, 100, 100)));
    }
}
