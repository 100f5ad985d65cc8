//! Differential test harness core for the bounded-table robot puzzle.
//!
//! This crate defines:
//! - [`Tester`]: the orchestrator that drives a robot implementation under test
//!   through randomized command sequences while executing the same commands on
//!   its own reference state machine.
//! - [`MessageSink`]: the async contract for the outbound message channel to
//!   the hosting cluster controller.
//! - The wire schemas in [`messages`] and the reference engine in [`geometry`],
//!   [`compass`] and [`robot`].
//!
//! The harness never judges correctness itself: it forwards each command to the
//! implementation under test and reports the reference-computed status to the
//! log sink, so mismatches can be diffed externally. Its two built-in
//! self-checks cross-validate pairs of independently written algorithms
//! (ray casting vs inclusive bounds, complex rotation vs a discrete turn table)
//! and record advisory Success/Failed verdicts only.

use async_trait::async_trait;
use interprocess::local_socket::{LocalSocketListener, LocalSocketStream};
use rand::Rng;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

pub mod compass;
pub mod geometry;
pub mod messages;
pub mod robot;

pub use compass::CompassDirection;
pub use geometry::{Polygon, Table, Vec2};
pub use messages::{Envelope, LogRecord, Payload, Route, RunOptions, TerminationDirective};
pub use robot::{Command, CommandKind, RobotState};

use messages::{
    MODE_FUNCTIONAL, MODE_UNIT_DIRECTION, MODE_UNIT_HITTEST, SOURCE_COMMAND, SOURCE_DESIRED,
    SOURCE_TESTER,
};

/// Default inbound control channel name (local socket / pipe).
///
/// The hosting controller connects to this socket to deliver [`RunOptions`]
/// messages, one JSON line per run.
///
/// On Unix we use a filesystem-backed socket in `/tmp` so separate processes
/// can discover it.
#[cfg(unix)]
pub const CONTROL_IPC_NAME: &str = "/tmp/robot_tester_pipe";

/// Default inbound control channel name (non-Unix platforms).
#[cfg(not(unix))]
pub const CONTROL_IPC_NAME: &str = "robot_tester_pipe";

/// Default outbound channel name where the hosting controller listens for
/// routed envelopes.
#[cfg(unix)]
pub const CONTROLLER_IPC_NAME: &str = "/tmp/robot_controller_pipe";

/// Default outbound channel name (non-Unix platforms).
#[cfg(not(unix))]
pub const CONTROLLER_IPC_NAME: &str = "robot_controller_pipe";

/// Inclusive integer bounds of the standard table.
pub const TABLE_MIN: f64 = 0.0;
pub const TABLE_MAX: f64 = 9.0;

/// The polygon hangs half a cell beyond the integer bounds so every integer
/// grid point of the table is strictly interior to it.
const TABLE_MARGIN: f64 = 0.5;

/// Commands generated when a Functional control message omits its count.
const DEFAULT_COMMAND_COUNT: usize = 10;

/// Samples drawn by each self-check.
const SELF_CHECK_SAMPLES: usize = 10;

/// Half-open coordinate range DROP targets are sampled from. Wider than the
/// table so rejected drops occur regularly.
const DROP_SAMPLE_MIN: i64 = -5;
const DROP_SAMPLE_MAX: i64 = 15;

/// Half-open coordinate range the hit-test self-check samples points from.
const POINT_SAMPLE_MIN: i64 = -10;
const POINT_SAMPLE_MAX: i64 = 20;

/// The outbound contract for all harness messages.
///
/// One implementation per deployment: an in-process channel for tests and
/// embedding, a local-socket writer for the multi-process cluster. Sends must
/// preserve submission order; the harness relies on FIFO delivery per route.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Asynchronously delivers one routed envelope to the hosting controller.
    async fn send(&self, envelope: Envelope) -> Result<(), String>;
}

/// [`MessageSink`] backed by an in-process unbounded channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl ChannelSink {
    /// Creates the sink together with the receiving half.
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn send(&self, envelope: Envelope) -> Result<(), String> {
        self.tx
            .send(envelope)
            .map_err(|e| format!("outbound channel closed: {e}"))
    }
}

/// [`MessageSink`] that writes each envelope as one JSON line to the hosting
/// controller's local socket.
pub struct IpcSink {
    name: String,
}

impl IpcSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IpcSink {
    fn default() -> Self {
        Self::new(CONTROLLER_IPC_NAME)
    }
}

#[async_trait]
impl MessageSink for IpcSink {
    async fn send(&self, envelope: Envelope) -> Result<(), String> {
        let line = serde_json::to_string(&envelope)
            .map_err(|e| format!("failed to serialize envelope: {e}"))?;
        let mut stream = LocalSocketStream::connect(self.name.as_str())
            .map_err(|e| format!("failed to connect controller channel ({}): {e}", self.name))?;
        stream
            .write_all(line.as_bytes())
            .and_then(|_| stream.write_all(b"\n"))
            .map_err(|e| format!("failed to write envelope: {e}"))?;
        Ok(())
    }
}

/// The differential test orchestrator.
///
/// Owns the reference robot over the standard table polygon and the injected
/// outbound sink. There is no global state: construct one value, hand it the
/// control messages, and it executes each selected run to completion before
/// returning.
pub struct Tester {
    robot: RobotState,
    commands: Vec<Command>,
    sink: Box<dyn MessageSink>,

    /// Inbound control listener.
    ///
    /// This is intentionally an `Option` so the harness can be constructed
    /// without immediately binding a system resource.
    control_listener: Option<LocalSocketListener>,

    /// The bound control channel name (may be a platform-specific path).
    control_name: String,

    /// Tracks whether this instance bound the control socket, so only the
    /// binding instance unlinks the path on drop.
    control_initialized: bool,
}

impl Drop for Tester {
    fn drop(&mut self) {
        // Close the listener before attempting to unlink the socket path.
        let _ = self.control_listener.take();

        #[cfg(unix)]
        if self.control_initialized {
            let _ = std::fs::remove_file(&self.control_name);
        }
    }
}

impl std::fmt::Debug for Tester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tester")
            .field("control_name", &self.control_name)
            .field("control_listener_bound", &self.control_listener.is_some())
            .field("commands_len", &self.commands.len())
            .field("robot_status", &self.robot.status())
            .finish()
    }
}

impl Tester {
    /// Constructs the harness over the standard table with injected outbound
    /// routing.
    pub fn new(sink: Box<dyn MessageSink>) -> Self {
        Self {
            robot: RobotState::new(Self::standard_polygon()),
            commands: Vec::new(),
            sink,
            control_listener: None,
            control_name: CONTROL_IPC_NAME.to_string(),
            control_initialized: false,
        }
    }

    /// The rectangle the reference robot roams: the integer table
    /// `[TABLE_MIN, TABLE_MAX]²` widened by half a cell on every side.
    pub fn standard_polygon() -> Polygon {
        let lo = TABLE_MIN - TABLE_MARGIN;
        let hi = TABLE_MAX + TABLE_MARGIN;
        Polygon::new(vec![
            Vec2::new(lo, lo),
            Vec2::new(lo, hi),
            Vec2::new(hi, hi),
            Vec2::new(hi, lo),
        ])
    }

    /// Read-only view of the reference robot.
    pub fn robot(&self) -> &RobotState {
        &self.robot
    }

    /// The command sequence generated by the most recent functional run.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Initializes the inbound control listener.
    ///
    /// The listener is stored internally and can be extracted using
    /// [`Tester::take_control_listener`] so the hosting process can run the
    /// accept/read loop and feed each line to [`Tester::handle_control`].
    pub fn init_control_listener(&mut self) -> Result<(), String> {
        if self.control_listener.is_some() {
            return Ok(());
        }

        // Best-effort cleanup on Unix if a prior run left the socket path behind.
        #[cfg(unix)]
        {
            let _ = std::fs::remove_file(CONTROL_IPC_NAME);
        }

        let listener = LocalSocketListener::bind(CONTROL_IPC_NAME)
            .map_err(|e| format!("Failed to bind control channel ({CONTROL_IPC_NAME}): {e}"))?;

        self.control_name = CONTROL_IPC_NAME.to_string();
        self.control_listener = Some(listener);
        self.control_initialized = true;
        Ok(())
    }

    /// Returns the control channel name the hosting controller should connect to.
    pub fn control_name(&self) -> &str {
        &self.control_name
    }

    /// Takes ownership of the control listener for the hosting accept loop.
    pub fn take_control_listener(&mut self) -> Option<LocalSocketListener> {
        self.control_listener.take()
    }

    /// Handles one serialized control message; the single entry point.
    ///
    /// An unrecognized run-mode selector is ignored. Only a malformed message
    /// or a failed outbound send surfaces as an error.
    pub async fn handle_control(&mut self, raw: &str) -> Result<(), String> {
        let options: RunOptions =
            serde_json::from_str(raw).map_err(|e| format!("malformed control message: {e}"))?;
        match options.key.as_str() {
            MODE_UNIT_DIRECTION => self.direction_and_rotation_check().await,
            MODE_UNIT_HITTEST => self.hit_test_check().await,
            MODE_FUNCTIONAL => {
                self.start(options.count.unwrap_or(DEFAULT_COMMAND_COUNT))
                    .await
            }
            other => {
                debug!(key = other, "ignoring unrecognized run mode");
                Ok(())
            }
        }
    }

    /// Draws one command, uniform over the five kinds.
    fn random_command() -> CommandKind {
        let mut rng = rand::thread_rng();
        match rng.gen_range(0..5u8) {
            0 => CommandKind::Drop {
                x: rng.gen_range(DROP_SAMPLE_MIN..DROP_SAMPLE_MAX),
                y: rng.gen_range(DROP_SAMPLE_MIN..DROP_SAMPLE_MAX),
                direction: CompassDirection::ALL[rng.gen_range(0..CompassDirection::ALL.len())],
            },
            1 => CommandKind::Move,
            2 => CommandKind::Left,
            3 => CommandKind::Right,
            _ => CommandKind::Report,
        }
    }

    /// Runs one functional differential test of `command_count` commands.
    ///
    /// Sequence indices are assigned at generation; the final command is always
    /// a forced REPORT so every run ends with an observable status. For each
    /// command, in index order, the harness emits exactly: the forwarded
    /// command to the robot route, the command log record, then the
    /// post-execution reference status record. The exit directive is last.
    #[instrument(skip(self))]
    pub async fn start(&mut self, command_count: usize) -> Result<(), String> {
        // A run always contains at least its forced terminal REPORT.
        let command_count = command_count.max(1);

        self.commands.clear();
        for index in 0..command_count - 1 {
            self.commands.push(Command {
                kind: Self::random_command(),
                index,
            });
        }
        self.commands.push(Command {
            kind: CommandKind::Report,
            index: command_count - 1,
        });

        self.sink
            .send(Envelope::to_logger(LogRecord {
                source: SOURCE_DESIRED.to_string(),
                index: command_count,
                status: String::new(),
            }))
            .await?;

        let commands = self.commands.clone();
        for command in commands {
            self.sink.send(Envelope::to_robot(command.clone())).await?;
            self.robot.execute(&command.kind);
            self.sink
                .send(Envelope::to_logger(LogRecord {
                    source: SOURCE_COMMAND.to_string(),
                    index: command.index,
                    status: command.kind.to_string(),
                }))
                .await?;
            self.sink
                .send(Envelope::to_logger(LogRecord {
                    source: SOURCE_TESTER.to_string(),
                    index: command.index,
                    status: self.robot.status(),
                }))
                .await?;
        }

        self.exit().await
    }

    /// Self-check: ray-casting containment vs inclusive bounds comparison.
    ///
    /// Samples integer points from a range wider than the table so both inside
    /// and outside cases occur, and records an advisory verdict per point.
    /// Mismatches never abort the run.
    #[instrument(skip(self))]
    pub async fn hit_test_check(&mut self) -> Result<(), String> {
        info!(
            samples = SELF_CHECK_SAMPLES,
            "unit check: inclusive table bounds vs ray-casting polygon"
        );
        let table = Table {
            min_x: TABLE_MIN,
            min_y: TABLE_MIN,
            max_x: TABLE_MAX,
            max_y: TABLE_MAX,
        };
        let mut rng = rand::thread_rng();
        for _ in 0..SELF_CHECK_SAMPLES {
            let x = rng.gen_range(POINT_SAMPLE_MIN..POINT_SAMPLE_MAX) as f64;
            let y = rng.gen_range(POINT_SAMPLE_MIN..POINT_SAMPLE_MAX) as f64;
            let bounds = table.hit_test(x, y);
            let ray_caster = self.robot.polygon().contains(Vec2::new(x, y));
            info!(
                x,
                y,
                bounds,
                ray_caster,
                verdict = verdict(bounds == ray_caster),
                "hit test comparison"
            );
        }
        self.exit().await
    }

    /// Self-check: complex-multiplication rotation vs the discrete turn table.
    ///
    /// Applies the same random left/right turns to both representations,
    /// starting from NORTH, and records an advisory verdict per turn.
    #[instrument(skip(self))]
    pub async fn direction_and_rotation_check(&mut self) -> Result<(), String> {
        info!(
            turns = SELF_CHECK_SAMPLES,
            "unit check: complex rotation vs discrete turn table"
        );
        let mut vector = CompassDirection::North.to_vector();
        let mut label = CompassDirection::North;
        info!(x = vector.x(), y = vector.y(), label = %label, "begin direction");

        let mut rng = rand::thread_rng();
        for _ in 0..SELF_CHECK_SAMPLES {
            let turn = if rng.gen_bool(0.5) {
                vector = vector.turned_left();
                label = label.turned_left();
                "left"
            } else {
                vector = vector.turned_right();
                label = label.turned_right();
                "right"
            };
            let derived = CompassDirection::from_vector(vector);
            info!(
                turn,
                x = vector.x(),
                y = vector.y(),
                derived = %derived,
                table = %label,
                verdict = verdict(derived == label),
                "turn comparison"
            );
        }
        self.exit().await
    }

    /// Asks the cluster controller to terminate everything. Always the last
    /// message of any run.
    async fn exit(&self) -> Result<(), String> {
        self.sink
            .send(Envelope::to_master(TerminationDirective::exit()))
            .await
    }
}

fn verdict(ok: bool) -> &'static str {
    if ok {
        "Success"
    } else {
        "Failed"
    }
}
