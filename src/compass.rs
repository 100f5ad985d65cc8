//! Compass directions and their unit-vector encoding.
//!
//! Two independent representations of the same rotation semantics live here on
//! purpose: the vector codec (rotation by complex multiplication, see
//! [`crate::geometry::Vec2`]) and a discrete four-state turn table. The
//! direction self-check cross-validates one against the other.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// The only orientations a robot can face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompassDirection {
    North,
    South,
    West,
    East,
}

impl CompassDirection {
    /// All labels, in the order used for tie-breaking by [`CompassDirection::from_vector`].
    pub const ALL: [CompassDirection; 4] = [
        CompassDirection::North,
        CompassDirection::South,
        CompassDirection::West,
        CompassDirection::East,
    ];

    /// The canonical unit vector for this label. Returns a fresh value, never a
    /// shared reference into a table.
    pub fn to_vector(self) -> Vec2 {
        match self {
            CompassDirection::North => Vec2::new(0.0, 1.0),
            CompassDirection::South => Vec2::new(0.0, -1.0),
            CompassDirection::West => Vec2::new(-1.0, 0.0),
            CompassDirection::East => Vec2::new(1.0, 0.0),
        }
    }

    /// Classifies an arbitrary vector as its nearest compass label by maximum
    /// dot product against the four canonical vectors.
    ///
    /// Ties (possible for diagonal inputs, never for axis-aligned ones) resolve
    /// to the earliest label in [`CompassDirection::ALL`] order: the comparison
    /// is strict, so a later label must beat the current best outright.
    pub fn from_vector(v: Vec2) -> CompassDirection {
        let mut best = CompassDirection::ALL[0];
        let mut best_dot = v.dot(best.to_vector());
        for candidate in &CompassDirection::ALL[1..] {
            let d = v.dot(candidate.to_vector());
            if d > best_dot {
                best = *candidate;
                best_dot = d;
            }
        }
        best
    }

    /// Discrete turn table, 90° counter-clockwise.
    pub fn turned_left(self) -> CompassDirection {
        match self {
            CompassDirection::North => CompassDirection::West,
            CompassDirection::West => CompassDirection::South,
            CompassDirection::South => CompassDirection::East,
            CompassDirection::East => CompassDirection::North,
        }
    }

    /// Discrete turn table, 90° clockwise.
    pub fn turned_right(self) -> CompassDirection {
        match self {
            CompassDirection::North => CompassDirection::East,
            CompassDirection::East => CompassDirection::South,
            CompassDirection::South => CompassDirection::West,
            CompassDirection::West => CompassDirection::North,
        }
    }
}

impl std::fmt::Display for CompassDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            CompassDirection::North => "NORTH",
            CompassDirection::South => "SOUTH",
            CompassDirection::West => "WEST",
            CompassDirection::East => "EAST",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_vectors_round_trip_through_the_classifier() {
        for d in CompassDirection::ALL {
            assert_eq!(CompassDirection::from_vector(d.to_vector()), d);
        }
    }

    #[test]
    fn left_turns_match_the_discrete_table_from_north() {
        let mut v = CompassDirection::North.to_vector();
        let mut label = CompassDirection::North;
        for _ in 0..4 {
            v = v.turned_left();
            label = label.turned_left();
            assert_eq!(CompassDirection::from_vector(v), label);
            assert!((v.magnitude() - 1.0).abs() < 1e-12);
        }
        assert_eq!(label, CompassDirection::North);
    }

    #[test]
    fn right_turns_match_the_discrete_table_from_north() {
        let mut v = CompassDirection::North.to_vector();
        let mut label = CompassDirection::North;
        for _ in 0..4 {
            v = v.turned_right();
            label = label.turned_right();
            assert_eq!(CompassDirection::from_vector(v), label);
        }
        assert_eq!(label, CompassDirection::North);
    }

    #[test]
    fn diagonal_ties_resolve_in_declaration_order() {
        // (1,1) scores equally against NORTH and EAST; NORTH wins because it
        // comes first and the comparison is strict.
        assert_eq!(
            CompassDirection::from_vector(Vec2::new(1.0, 1.0)),
            CompassDirection::North
        );
        // (-1,-1) ties SOUTH against WEST; SOUTH comes first.
        assert_eq!(
            CompassDirection::from_vector(Vec2::new(-1.0, -1.0)),
            CompassDirection::South
        );
    }

    #[test]
    fn labels_serialize_uppercase() {
        let json = serde_json::to_string(&CompassDirection::North).expect("serialize");
        assert_eq!(json, "\"NORTH\"");
        let back: CompassDirection = serde_json::from_str("\"WEST\"").expect("deserialize");
        assert_eq!(back, CompassDirection::West);
    }
}
