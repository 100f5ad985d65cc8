//! Commands and the reference robot state machine.
//!
//! The state machine here is the oracle the differential harness trusts: it
//! executes the same command stream that is forwarded to the implementation
//! under test, and its status snapshots are what the external log comparison
//! is diffed against.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compass::CompassDirection;
use crate::geometry::{Polygon, Vec2};

/// The five command kinds, as a closed tagged variant.
///
/// Only DROP carries payload fields; the active case is always determined by
/// the `command` tag, never inferred from which optional fields are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "UPPERCASE")]
pub enum CommandKind {
    Drop {
        x: i64,
        y: i64,
        direction: CompassDirection,
    },
    Move,
    Left,
    Right,
    Report,
}

impl std::fmt::Display for CommandKind {
    /// The log-record text for a command. DROP always renders its fields,
    /// including zero coordinates.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::Drop { x, y, direction } => write!(f, "DROP{x},{y},{direction}"),
            CommandKind::Move => f.write_str("MOVE"),
            CommandKind::Left => f.write_str("LEFT"),
            CommandKind::Right => f.write_str("RIGHT"),
            CommandKind::Report => f.write_str("REPORT"),
        }
    }
}

/// A command plus the sequence index assigned at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(flatten)]
    pub kind: CommandKind,
    pub index: usize,
}

/// The reference robot.
///
/// Starts Invalid (no location, no direction) and becomes Valid only through a
/// successful DROP; once Valid it never reverts. The polygon is fixed at
/// construction and gates every DROP and MOVE.
#[derive(Debug, Clone)]
pub struct RobotState {
    location: Option<Vec2>,
    direction: Option<Vec2>,
    polygon: Polygon,
}

impl RobotState {
    pub fn new(polygon: Polygon) -> Self {
        Self {
            location: None,
            direction: None,
            polygon,
        }
    }

    pub fn polygon(&self) -> &Polygon {
        &self.polygon
    }

    pub fn location(&self) -> Option<Vec2> {
        self.location
    }

    pub fn direction(&self) -> Option<Vec2> {
        self.direction
    }

    /// True until the first DROP lands inside the polygon.
    pub fn is_invalid(&self) -> bool {
        self.location.is_none() || self.direction.is_none()
    }

    /// Single mutation entry point; dispatch is exhaustive over the kind.
    pub fn execute(&mut self, command: &CommandKind) {
        match command {
            CommandKind::Drop { x, y, direction } => self.drop(*x, *y, *direction),
            CommandKind::Move => self.move_forward(),
            CommandKind::Left => self.turn_left(),
            CommandKind::Right => self.turn_right(),
            CommandKind::Report => self.report(),
        }
    }

    /// Places (or re-seats) the robot if the target point is inside the
    /// polygon. A rejected DROP changes nothing, validity included.
    fn drop(&mut self, x: i64, y: i64, direction: CompassDirection) {
        let target = Vec2::new(x as f64, y as f64);
        if !self.polygon.contains(target) {
            return;
        }
        self.location = Some(target);
        self.direction = Some(direction.to_vector());
    }

    /// Advances one step along the current direction, unless the candidate
    /// point falls outside the polygon. Direction is never touched.
    fn move_forward(&mut self) {
        let (Some(location), Some(direction)) = (self.location, self.direction) else {
            return;
        };
        let candidate = location.plus(direction);
        if !self.polygon.contains(candidate) {
            return;
        }
        self.location = Some(candidate);
    }

    fn turn_left(&mut self) {
        if let Some(direction) = self.direction {
            self.direction = Some(direction.turned_left());
        }
    }

    fn turn_right(&mut self) {
        if let Some(direction) = self.direction {
            self.direction = Some(direction.turned_right());
        }
    }

    /// Emits the observable report. No state change; a no-op while Invalid.
    fn report(&self) {
        let (Some(location), Some(direction)) = (self.location, self.direction) else {
            return;
        };
        info!(
            x = location.x(),
            y = location.y(),
            direction = %CompassDirection::from_vector(direction),
            "tester report"
        );
    }

    /// Status snapshot for the log stream.
    ///
    /// The raw direction components ride along after the compass label so an
    /// external diff can catch drift even when two distinct vectors round to
    /// the same label.
    pub fn status(&self) -> String {
        let (Some(location), Some(direction)) = (self.location, self.direction) else {
            return "?,?,?".to_string();
        };
        format!(
            "{},{},{},{},{}",
            location.x(),
            location.y(),
            CompassDirection::from_vector(direction),
            direction.x(),
            direction.y()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_table_polygon() -> Polygon {
        Polygon::new(vec![
            Vec2::new(-0.5, -0.5),
            Vec2::new(-0.5, 9.5),
            Vec2::new(9.5, 9.5),
            Vec2::new(9.5, -0.5),
        ])
    }

    fn robot() -> RobotState {
        RobotState::new(standard_table_polygon())
    }

    #[test]
    fn starts_invalid_with_placeholder_status() {
        let robot = robot();
        assert!(robot.is_invalid());
        assert_eq!(robot.status(), "?,?,?");
    }

    #[test]
    fn commands_before_a_successful_drop_are_no_ops() {
        let mut robot = robot();
        for kind in [
            CommandKind::Move,
            CommandKind::Left,
            CommandKind::Right,
            CommandKind::Report,
        ] {
            robot.execute(&kind);
            assert!(robot.is_invalid());
        }
        assert_eq!(robot.status(), "?,?,?");
    }

    #[test]
    fn rejected_drop_leaves_state_untouched() {
        let mut robot = robot();
        robot.execute(&CommandKind::Drop {
            x: 20,
            y: 20,
            direction: CompassDirection::North,
        });
        assert!(robot.is_invalid());

        // Same while Valid: a later out-of-bounds DROP must not move anything.
        robot.execute(&CommandKind::Drop {
            x: 3,
            y: 4,
            direction: CompassDirection::East,
        });
        let before = robot.status();
        robot.execute(&CommandKind::Drop {
            x: -9,
            y: 0,
            direction: CompassDirection::South,
        });
        assert_eq!(robot.status(), before);
    }

    #[test]
    fn drop_move_report_scenario() {
        let mut robot = robot();
        robot.execute(&CommandKind::Drop {
            x: 0,
            y: 0,
            direction: CompassDirection::North,
        });
        assert!(!robot.is_invalid());
        assert_eq!(robot.location(), Some(Vec2::new(0.0, 0.0)));
        assert_eq!(robot.direction(), Some(Vec2::new(0.0, 1.0)));

        robot.execute(&CommandKind::Move);
        robot.execute(&CommandKind::Report);
        assert_eq!(robot.status(), "0,1,NORTH,0,1");
    }

    #[test]
    fn blocked_move_changes_neither_location_nor_direction() {
        let mut robot = robot();
        robot.execute(&CommandKind::Drop {
            x: 0,
            y: 9,
            direction: CompassDirection::North,
        });
        robot.execute(&CommandKind::Move);
        assert_eq!(robot.status(), "0,9,NORTH,0,1");
    }

    #[test]
    fn a_later_drop_re_seats_a_valid_robot() {
        let mut robot = robot();
        robot.execute(&CommandKind::Drop {
            x: 1,
            y: 1,
            direction: CompassDirection::North,
        });
        robot.execute(&CommandKind::Drop {
            x: 7,
            y: 2,
            direction: CompassDirection::West,
        });
        assert_eq!(robot.status(), "7,2,WEST,-1,0");
    }

    #[test]
    fn turning_cycles_through_all_labels() {
        let mut robot = robot();
        robot.execute(&CommandKind::Drop {
            x: 5,
            y: 5,
            direction: CompassDirection::North,
        });
        let mut seen = Vec::new();
        for _ in 0..4 {
            robot.execute(&CommandKind::Left);
            seen.push(robot.status());
        }
        assert_eq!(
            seen,
            vec![
                "5,5,WEST,-1,0",
                "5,5,SOUTH,0,-1",
                "5,5,EAST,1,0",
                "5,5,NORTH,0,1",
            ]
        );
    }

    #[test]
    fn command_wire_format_is_flat_and_tagged() {
        let cmd = Command {
            kind: CommandKind::Drop {
                x: 3,
                y: 4,
                direction: CompassDirection::East,
            },
            index: 2,
        };
        let json = serde_json::to_value(&cmd).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "command": "DROP", "x": 3, "y": 4, "direction": "EAST", "index": 2
            })
        );

        let back: Command =
            serde_json::from_value(serde_json::json!({ "command": "MOVE", "index": 0 }))
                .expect("deserialize");
        assert_eq!(back.kind, CommandKind::Move);
    }

    #[test]
    fn command_log_text_always_renders_drop_fields() {
        let kind = CommandKind::Drop {
            x: 0,
            y: 0,
            direction: CompassDirection::North,
        };
        assert_eq!(kind.to_string(), "DROP0,0,NORTH");
        assert_eq!(CommandKind::Report.to_string(), "REPORT");
    }
}
