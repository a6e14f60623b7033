#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Algorun puzzle engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative puzzle session, and the level progression system. Adapters
//! submit [`Action`] values describing desired mutations, the world executes
//! those actions via its `apply` entry point, and then broadcasts [`Event`]
//! values that presentation sinks render. The cursor, tile and level types
//! defined here are plain values with no side effects so the interpreter can
//! be exercised headlessly.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of subroutine slots available to a program.
pub const SUBROUTINE_COUNT: usize = 3;

/// Delay inserted before each executed command unless configured otherwise.
pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_millis(300);

/// Facing of the cursor on the grid.
///
/// Variants are ordered clockwise; rotation arithmetic relies on that order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing column indices.
    Right,
    /// Toward increasing row indices.
    Down,
    /// Toward decreasing column indices.
    Left,
}

impl Direction {
    /// All directions in rotation order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Returns the direction reached by applying `turn` to `self`.
    #[must_use]
    pub const fn rotate(self, turn: Turn) -> Self {
        let index = self.index();
        let rotated = match turn {
            Turn::Left => (index + 3) % 4,
            Turn::Right => (index + 1) % 4,
        };
        Self::ALL[rotated]
    }

    /// Lowercase label used by level files and text adapters.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Right => "right",
            Self::Down => "down",
            Self::Left => "left",
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Up => 0,
            Self::Right => 1,
            Self::Down => 2,
            Self::Left => 3,
        }
    }
}

/// Quarter turn applied to a [`Direction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Turn {
    /// Counter-clockwise quarter turn.
    Left,
    /// Clockwise quarter turn.
    Right,
}

/// Position and facing of the player-controlled token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    x: u32,
    y: u32,
    #[serde(rename = "dir")]
    direction: Direction,
}

impl Cursor {
    /// Creates a cursor at the provided column, row and facing.
    #[must_use]
    pub const fn new(x: u32, y: u32, direction: Direction) -> Self {
        Self { x, y, direction }
    }

    /// Zero-based column occupied by the cursor.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row occupied by the cursor.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Direction the cursor currently faces.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Moves the cursor one cell in its facing direction.
    ///
    /// Upward and leftward motion stops at zero. Downward and rightward
    /// motion is not bounded by the grid, so the cursor may step onto cells
    /// that only exist as void reads.
    pub fn move_forward(&mut self) {
        match self.direction {
            Direction::Up => self.y = self.y.saturating_sub(1),
            Direction::Right => self.x = self.x.saturating_add(1),
            Direction::Down => self.y = self.y.saturating_add(1),
            Direction::Left => self.x = self.x.saturating_sub(1),
        }
    }

    /// Rotates the cursor in place.
    pub fn rotate(&mut self, turn: Turn) {
        self.direction = self.direction.rotate(turn);
    }
}

/// Color marking carried by path tiles and named by command conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// Unmarked path. As a condition it always passes.
    Grey,
    /// Green marking.
    Green,
    /// Red marking.
    Red,
    /// Blue marking.
    Blue,
}

impl Color {
    /// All colors in declaration order.
    pub const ALL: [Color; 4] = [Self::Grey, Self::Green, Self::Red, Self::Blue];

    /// Lowercase label used by command sources.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Grey => "grey",
            Self::Green => "green",
            Self::Red => "red",
            Self::Blue => "blue",
        }
    }

    /// Parses a color label, ignoring surrounding whitespace and case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.label().eq_ignore_ascii_case(label))
    }
}

/// Semantic type of a single grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tile {
    /// Nothing here. Reads outside the grid resolve to this value.
    Void,
    /// Walkable path with the provided marking.
    Path(Color),
    /// Success tile.
    Goal,
}

impl Tile {
    /// Decodes the numeric tile codes used by level files.
    ///
    /// `0` void, `1` grey, `2` green, `3` red, `4` blue, `9` goal.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Void),
            1 => Some(Self::Path(Color::Grey)),
            2 => Some(Self::Path(Color::Green)),
            3 => Some(Self::Path(Color::Red)),
            4 => Some(Self::Path(Color::Blue)),
            9 => Some(Self::Goal),
            _ => None,
        }
    }

    /// Marking carried by the tile, if any.
    #[must_use]
    pub const fn color(self) -> Option<Color> {
        match self {
            Self::Path(color) => Some(color),
            Self::Void | Self::Goal => None,
        }
    }

    /// Reports whether a command carrying `condition` may run on this tile.
    ///
    /// No condition and the grey condition always pass.
    #[must_use]
    pub fn satisfies(self, condition: Option<Color>) -> bool {
        match condition {
            None | Some(Color::Grey) => true,
            Some(color) => self.color() == Some(color),
        }
    }
}

/// Named subroutine slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subroutine {
    /// Entry subroutine executed by the start trigger.
    F1,
    /// Second subroutine.
    F2,
    /// Third subroutine.
    F3,
}

impl Subroutine {
    /// All subroutines in slot order.
    pub const ALL: [Subroutine; SUBROUTINE_COUNT] = [Self::F1, Self::F2, Self::F3];

    /// Zero-based slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::F1 => 0,
            Self::F2 => 1,
            Self::F3 => 2,
        }
    }

    /// Display name of the slot.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::F1 => "F1",
            Self::F2 => "F2",
            Self::F3 => "F3",
        }
    }

    /// Parses a slot name such as `F2`, ignoring case.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|subroutine| subroutine.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Subroutine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operation performed by a queued command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Moves the cursor one cell forward.
    MoveForward,
    /// Rotates the cursor counter-clockwise.
    TurnLeft,
    /// Rotates the cursor clockwise.
    TurnRight,
    /// Runs the named subroutine to completion before continuing.
    Call(Subroutine),
    /// Kind named by a command source that the engine does not recognise.
    /// Executing it does nothing and costs no time.
    Unknown,
}

impl CommandKind {
    /// Label understood by [`CommandKind::from_label`].
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MoveForward => "move forward",
            Self::TurnLeft => "turn left",
            Self::TurnRight => "turn right",
            Self::Call(Subroutine::F1) => "function 1",
            Self::Call(Subroutine::F2) => "function 2",
            Self::Call(Subroutine::F3) => "function 3",
            Self::Unknown => "unknown",
        }
    }

    /// Maps a command-source label to a kind.
    ///
    /// Matching ignores case and surrounding whitespace. Labels that name no
    /// kind resolve to [`CommandKind::Unknown`].
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        const KNOWN: [CommandKind; 6] = [
            CommandKind::MoveForward,
            CommandKind::TurnLeft,
            CommandKind::TurnRight,
            CommandKind::Call(Subroutine::F1),
            CommandKind::Call(Subroutine::F2),
            CommandKind::Call(Subroutine::F3),
        ];

        let label = label.trim();
        KNOWN
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(label))
            .unwrap_or(Self::Unknown)
    }
}

/// Single queued instruction, optionally gated by a tile color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Command {
    /// Operation to perform.
    pub kind: CommandKind,
    /// Marking the tile under the cursor must carry for the command to run.
    pub condition: Option<Color>,
}

impl Command {
    /// Creates an unconditional command.
    #[must_use]
    pub const fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            condition: None,
        }
    }

    /// Creates a command gated on the provided color.
    #[must_use]
    pub const fn when(kind: CommandKind, condition: Color) -> Self {
        Self {
            kind,
            condition: Some(condition),
        }
    }

    /// Builds a command from command-source labels.
    ///
    /// An empty kind or an unrecognised color is malformed input. An empty
    /// condition label is treated as no condition.
    pub fn from_labels(kind: &str, condition: Option<&str>) -> Result<Self, RejectionReason> {
        if kind.trim().is_empty() {
            return Err(RejectionReason::Malformed {
                input: kind.to_owned(),
            });
        }

        let condition = match condition.map(str::trim) {
            None | Some("") => None,
            Some(label) => Some(Color::from_label(label).ok_or_else(|| {
                RejectionReason::Malformed {
                    input: format!("{kind} [{label}]"),
                }
            })?),
        };

        Ok(Self {
            kind: CommandKind::from_label(kind),
            condition,
        })
    }
}

/// Immutable puzzle definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    grid: Vec<Vec<Tile>>,
    start: Cursor,
    max_commands: [usize; SUBROUTINE_COUNT],
    enabled_subroutines: Option<Vec<Subroutine>>,
    description: String,
}

impl Level {
    /// Creates a level from its rows of tiles, start pose and per-slot capacities.
    #[must_use]
    pub fn new(
        grid: Vec<Vec<Tile>>,
        start: Cursor,
        max_commands: [usize; SUBROUTINE_COUNT],
    ) -> Self {
        Self {
            grid,
            start,
            max_commands,
            enabled_subroutines: None,
            description: String::new(),
        }
    }

    /// Restricts which subroutines commands may call.
    #[must_use]
    pub fn with_enabled_subroutines(mut self, enabled: Vec<Subroutine>) -> Self {
        self.enabled_subroutines = Some(enabled);
        self
    }

    /// Attaches a player-facing description.
    #[must_use]
    pub fn with_description<T>(mut self, description: T) -> Self
    where
        T: Into<String>,
    {
        self.description = description.into();
        self
    }

    /// Tile at the provided cell. Cells outside the grid are [`Tile::Void`].
    #[must_use]
    pub fn tile_at(&self, x: u32, y: u32) -> Tile {
        let (Ok(column), Ok(row)) = (usize::try_from(x), usize::try_from(y)) else {
            return Tile::Void;
        };
        self.grid
            .get(row)
            .and_then(|cells| cells.get(column))
            .copied()
            .unwrap_or(Tile::Void)
    }

    /// Rows of the grid in top-to-bottom order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Tile>] {
        &self.grid
    }

    /// Number of columns in the widest row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.grid.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Number of rows in the grid.
    #[must_use]
    pub fn height(&self) -> usize {
        self.grid.len()
    }

    /// Pose the cursor takes whenever the level is loaded or reset.
    #[must_use]
    pub const fn start(&self) -> Cursor {
        self.start
    }

    /// Capacity of every subroutine slot in slot order.
    #[must_use]
    pub const fn max_commands(&self) -> [usize; SUBROUTINE_COUNT] {
        self.max_commands
    }

    /// Capacity of a single subroutine slot.
    #[must_use]
    pub const fn capacity(&self, subroutine: Subroutine) -> usize {
        self.max_commands[subroutine.index()]
    }

    /// Reports whether commands may call `subroutine` on this level.
    #[must_use]
    pub fn is_enabled(&self, subroutine: Subroutine) -> bool {
        self.enabled_subroutines
            .as_ref()
            .map_or(true, |enabled| enabled.contains(&subroutine))
    }

    /// Player-facing description of the level.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Identifier under which a [`LevelProvider`] stores a level.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelKey(String);

impl LevelKey {
    /// Wraps the provided key.
    #[must_use]
    pub fn new<T>(key: T) -> Self
    where
        T: Into<String>,
    {
        Self(key.into())
    }

    /// Borrowed form of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source of level definitions consumed by the progression system.
pub trait LevelProvider {
    /// Keys of every known level in play order.
    fn level_keys(&self) -> Vec<LevelKey>;

    /// Level stored under `key`, if any.
    fn level(&self, key: &LevelKey) -> Option<Level>;
}

/// How the queue store picks the subroutine that receives a new command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    /// First subroutine, scanning F1 to F3, with spare capacity.
    FirstAvailable,
    /// The named subroutine only.
    Subroutine(Subroutine),
}

/// Actions that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Installs a level, resetting the cursor, queues and cancellation flag.
    LoadLevel {
        /// Level to install.
        level: Level,
    },
    /// Appends an already parsed command.
    AddCommand {
        /// Command to queue.
        command: Command,
        /// Queue selection policy.
        placement: Placement,
    },
    /// Appends a command described by command-source labels.
    SubmitCommand {
        /// Kind label, such as `move forward`.
        kind: String,
        /// Optional color label.
        condition: Option<String>,
        /// Queue selection policy.
        placement: Placement,
    },
    /// Removes the most recently queued command, scanning F3 back to F1.
    RemoveLastCommand,
    /// Clears all queues and returns the cursor to the start pose.
    ResetCommands,
    /// Starts executing F1.
    StartRun,
    /// Raises the cancellation flag, stopping any in-flight run.
    AbortRun,
    /// Changes the delay inserted before each executed command.
    ConfigurePacing {
        /// New pacing interval. Must be non-zero.
        interval: Duration,
    },
    /// Advances the session clock by the provided delta time.
    Tick {
        /// Duration of time that elapsed since the previous tick.
        dt: Duration,
    },
}

/// Events broadcast by the session after processing actions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A level was installed and should be drawn.
    LevelRendered {
        /// Installed level.
        level: Level,
    },
    /// The cursor changed position or facing.
    CursorMoved {
        /// Cursor after the change.
        cursor: Cursor,
    },
    /// A subroutine queue changed.
    CommandListChanged {
        /// Queue that changed.
        subroutine: Subroutine,
        /// Snapshot of the queue after the change.
        commands: Vec<Command>,
    },
    /// Input was refused without changing state.
    CommandRejected {
        /// Why the input was refused.
        reason: RejectionReason,
    },
    /// A run of F1 began.
    RunStarted,
    /// The cursor reached the goal.
    Victory,
    /// A run reached a terminal state.
    RunFinished {
        /// How the run ended.
        termination: Termination,
        /// Number of commands executed, calls included.
        executed_steps: u32,
    },
    /// Every level of the campaign has been completed.
    AllLevelsComplete,
}

/// Terminal states of an interpreter run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Termination {
    /// A step began with the cursor on a void tile.
    AbortedVoid,
    /// A step left the cursor on the goal.
    Won,
    /// F1 ran out of commands without reaching void or goal.
    Exhausted,
    /// The cancellation flag was raised by something other than the run.
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::AbortedVoid => "cursor left the path",
            Self::Won => "goal reached",
            Self::Exhausted => "program finished",
            Self::Cancelled => "run cancelled",
        };
        f.write_str(text)
    }
}

/// Reasons the session refuses input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error)]
pub enum RejectionReason {
    /// The command source produced something that is not a command.
    #[error("malformed command input '{input}'")]
    Malformed {
        /// Offending input, as received.
        input: String,
    },
    /// The targeted subroutine is at capacity.
    #[error("{subroutine} is full")]
    QueueFull {
        /// Subroutine that had no room.
        subroutine: Subroutine,
    },
    /// Every subroutine is at capacity.
    #[error("all subroutines are full")]
    QueuesFull,
    /// The level does not allow calls to the subroutine.
    #[error("{subroutine} is not available on this level")]
    SubroutineDisabled {
        /// Subroutine the command tried to call.
        subroutine: Subroutine,
    },
    /// Queues cannot change while a run is in flight.
    #[error("queues are locked while the program runs")]
    ExecutionInProgress,
    /// The pacing interval must be positive.
    #[error("pacing interval must be positive")]
    InvalidPacing,
    /// No level is loaded.
    #[error("no level is loaded")]
    NoLevelLoaded,
}
