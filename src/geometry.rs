//! 2D geometry primitives for the reference robot.
//!
//! This module is intentionally lightweight: it provides the vector type used both
//! as a point and as a direction encoding, the ray-casting polygon containment
//! test, and the inclusive axis-aligned table test used as an independently
//! written cross-check for the ray caster.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A simple 2D coordinate wrapper.
///
/// Internally uses [`nalgebra::Vector2<f64>`] for downstream math convenience.
/// When used as a direction its magnitude is 1 and stays 1 under [`Vec2::rotated`],
/// because rotation is multiplication by another unit vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2(pub Vector2<f64>);

impl Vec2 {
    /// Convenience constructor.
    pub fn new(x: f64, y: f64) -> Self {
        Self(Vector2::new(x, y))
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    /// Component-wise sum.
    pub fn plus(&self, other: Vec2) -> Self {
        Self(self.0 + other.0)
    }

    /// Rotates by `other`, treating both values as complex numbers
    /// (`self.x + self.y*i` times `other.x + other.y*i`).
    ///
    /// Rotating by (0,1) turns 90° counter-clockwise, by (0,-1) clockwise.
    /// Negative zero is flushed to +0 so formatted status text stays stable
    /// across turn sequences.
    pub fn rotated(&self, other: Vec2) -> Self {
        let x = self.0.x * other.0.x - self.0.y * other.0.y;
        let y = self.0.x * other.0.y + self.0.y * other.0.x;
        Self::new(x + 0.0, y + 0.0)
    }

    /// One 90° counter-clockwise turn.
    pub fn turned_left(&self) -> Self {
        self.rotated(Self::new(0.0, 1.0))
    }

    /// One 90° clockwise turn.
    pub fn turned_right(&self) -> Self {
        self.rotated(Self::new(0.0, -1.0))
    }

    /// Dot product, used for nearest-compass-label classification.
    pub fn dot(&self, other: Vec2) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn magnitude(&self) -> f64 {
        self.0.norm()
    }
}

/// A closed polygon over an ordered vertex list.
///
/// Edges connect consecutive vertices, with the last vertex implicitly
/// connected back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Ray-casting containment test.
    ///
    /// Every vertex is shifted down by the query y so the query row becomes the
    /// zero line; an edge counts as a crossing only when its shifted endpoints
    /// have strictly opposite signs, so a query point lying exactly on an edge
    /// is classified *outside*. That boundary policy is intentional and must
    /// not be reconciled with the inclusive [`Table::hit_test`] comparison.
    pub fn contains(&self, point: Vec2) -> bool {
        // Fewer than 3 vertices cannot enclose anything.
        if self.vertices.len() < 3 {
            return false;
        }

        let shifted: Vec<Vec2> = self
            .vertices
            .iter()
            .map(|v| Vec2::new(v.x(), v.y() - point.y()))
            .collect();

        let mut crossings = Vec::new();
        for (i, a) in shifted.iter().enumerate() {
            let b = shifted[(i + 1) % shifted.len()];
            if a.y() * b.y() < 0.0 {
                // Linear interpolation for the x where this edge meets the zero line.
                crossings.push(a.x() - (a.x() - b.x()) / (a.y() - b.y()) * a.y());
            }
        }

        crossings.sort_by(|l, r| l.total_cmp(r));
        crossings.iter().filter(|&&x| x < point.x()).count() % 2 == 1
    }
}

/// Inclusive axis-aligned bounds, the second containment algorithm.
///
/// Kept deliberately independent of [`Polygon::contains`] so the two can be
/// compared against each other by the hit-test self-check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Table {
    pub fn hit_test(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square_around_origin() -> Polygon {
        Polygon::new(vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, -1.0),
        ])
    }

    #[test]
    fn four_left_turns_restore_the_vector() {
        let start = Vec2::new(0.0, 1.0);
        let mut v = start;
        for _ in 0..4 {
            v = v.turned_left();
        }
        assert!((v.x() - start.x()).abs() < 1e-12);
        assert!((v.y() - start.y()).abs() < 1e-12);
    }

    #[test]
    fn four_right_turns_restore_the_vector() {
        let start = Vec2::new(1.0, 0.0);
        let mut v = start;
        for _ in 0..4 {
            v = v.turned_right();
        }
        assert_eq!(v, start);
    }

    #[test]
    fn rotation_preserves_unit_magnitude() {
        let mut v = Vec2::new(0.0, 1.0);
        for _ in 0..7 {
            v = v.turned_left();
            assert!((v.magnitude() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rotation_never_leaves_a_negative_zero_component() {
        // WEST turned left passes through a -0.0 intermediate product.
        let v = Vec2::new(-1.0, 0.0).turned_left();
        assert_eq!(format!("{},{}", v.x(), v.y()), "0,-1");
    }

    #[test]
    fn degenerate_polygons_report_outside_everywhere() {
        for n in 0..3 {
            let polygon = Polygon::new(vec![Vec2::new(0.0, 0.0); n]);
            assert!(!polygon.contains(Vec2::new(0.0, 0.0)));
            assert!(!polygon.contains(Vec2::new(5.0, -3.0)));
        }
    }

    #[test]
    fn square_contains_interior_points_only() {
        let polygon = unit_square_around_origin();
        assert!(polygon.contains(Vec2::new(0.0, 0.0)));
        assert!(polygon.contains(Vec2::new(0.9, -0.9)));
        assert!(!polygon.contains(Vec2::new(2.0, 0.0)));
        assert!(!polygon.contains(Vec2::new(0.0, -1.5)));
    }

    #[test]
    fn boundary_points_follow_the_strict_crossing_policy() {
        let polygon = unit_square_around_origin();
        // A query row that runs along a horizontal edge produces no strict
        // sign changes at all, so points on that edge read as outside.
        assert!(!polygon.contains(Vec2::new(0.0, 1.0)));
        assert!(!polygon.contains(Vec2::new(0.5, -1.0)));
        // On the left vertical edge the coincident crossing is excluded by the
        // strict `< x` filter, leaving an even count.
        assert!(!polygon.contains(Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn ray_caster_agrees_with_inclusive_table_off_the_boundary() {
        let polygon = Polygon::new(vec![
            Vec2::new(-0.5, -0.5),
            Vec2::new(-0.5, 9.5),
            Vec2::new(9.5, 9.5),
            Vec2::new(9.5, -0.5),
        ]);
        let table = Table {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 9.0,
            max_y: 9.0,
        };
        // Integer grid points never land on the half-offset boundary, so the
        // two algorithms must agree on all of them.
        for x in -3..13 {
            for y in -3..13 {
                let p = Vec2::new(x as f64, y as f64);
                assert_eq!(
                    polygon.contains(p),
                    table.hit_test(p.x(), p.y()),
                    "disagreement at ({x},{y})"
                );
            }
        }
    }
}
