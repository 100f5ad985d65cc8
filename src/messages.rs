//! Wire schemas for the inter-process message bus.
//!
//! Every payload crossing a process boundary is one of the typed shapes below,
//! serialized as a single JSON line. Nothing at the boundary is duck-typed: the
//! hosting controller routes on [`Route`] and collaborators deserialize through
//! these schemas.

use serde::{Deserialize, Serialize};

use crate::robot::Command;

/// Run-mode selector for the functional differential test.
pub const MODE_FUNCTIONAL: &str = "Functional";
/// Run-mode selector for the direction/rotation self-check.
pub const MODE_UNIT_DIRECTION: &str = "Unit Direction";
/// Run-mode selector for the containment self-check.
pub const MODE_UNIT_HITTEST: &str = "Unit HitTest";

/// Source tag of the record announcing the desired command count.
pub const SOURCE_DESIRED: &str = "DESIRED";
/// Source tag of per-command log records.
pub const SOURCE_COMMAND: &str = "command";
/// Source tag of reference-status log records.
pub const SOURCE_TESTER: &str = "tester";

/// Where the hosting controller should deliver an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// The implementation under test.
    #[serde(rename = "robot")]
    Robot,
    /// The log sink that records commands and statuses for external diffing.
    #[serde(rename = "logger")]
    Logger,
    /// The cluster controller.
    #[serde(rename = "<MASTER>")]
    Master,
}

/// One append-only line for the log sink. Never read back by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub source: String,
    pub index: usize,
    pub status: String,
}

/// Asks the cluster controller to tear everything down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationDirective {
    pub directive: String,
}

impl TerminationDirective {
    pub fn exit() -> Self {
        Self {
            directive: "exit".to_string(),
        }
    }
}

/// The sole inbound control message: selects a run mode.
///
/// `key` stays a plain string so an unrecognized selector deserializes fine
/// and can be ignored instead of failing the parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

/// Union of the outbound payload shapes.
///
/// Untagged works here because the three schemas have disjoint required
/// fields (`command`, `source`, `directive`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Command(Command),
    Log(LogRecord),
    Directive(TerminationDirective),
}

/// The routed message envelope handed to the hosting controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub data: Payload,
    pub target: Route,
}

impl Envelope {
    pub fn to_robot(command: Command) -> Self {
        Self {
            data: Payload::Command(command),
            target: Route::Robot,
        }
    }

    pub fn to_logger(record: LogRecord) -> Self {
        Self {
            data: Payload::Log(record),
            target: Route::Logger,
        }
    }

    pub fn to_master(directive: TerminationDirective) -> Self {
        Self {
            data: Payload::Directive(directive),
            target: Route::Master,
        }
    }
}
