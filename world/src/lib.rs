#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative puzzle session for Algorun.
//!
//! The [`World`] bundles the cursor, the three subroutine queues, the
//! cancellation flag and the interpreter run into one value. Adapters mutate
//! it exclusively through [`apply`] and observe it through [`query`] and the
//! emitted [`Event`] stream.

mod interpreter;
mod queues;

use std::time::Duration;

use algorun_core::{
    Action, Command, CommandKind, Cursor, Direction, Event, Level, Placement, RejectionReason,
    Subroutine, Termination, Tile, DEFAULT_PACING_INTERVAL,
};
use log::{debug, info, warn};
use thiserror::Error;

use self::{
    interpreter::{Interpreter, Progress},
    queues::QueueStore,
};

/// Tunable parameters applied when a world is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    pacing_interval: Duration,
}

impl Config {
    /// Creates a configuration with the provided pacing interval.
    pub fn new(pacing_interval: Duration) -> Result<Self, ConfigError> {
        if pacing_interval.is_zero() {
            return Err(ConfigError::ZeroPacingInterval);
        }
        Ok(Self { pacing_interval })
    }

    /// Delay inserted before each executed command.
    #[must_use]
    pub const fn pacing_interval(&self) -> Duration {
        self.pacing_interval
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pacing_interval: DEFAULT_PACING_INTERVAL,
        }
    }
}

/// Errors raised while building a [`Config`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A zero interval would let unbounded programs spin without yielding.
    #[error("pacing interval must be positive")]
    ZeroPacingInterval,
}

/// Mutable state shared by the queue store and the interpreter.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) level: Option<Level>,
    pub(crate) cursor: Cursor,
    pub(crate) queues: QueueStore,
    pub(crate) cancelled: bool,
    pub(crate) pacing_interval: Duration,
}

impl Session {
    pub(crate) fn tile_at(&self, x: u32, y: u32) -> Tile {
        self.level
            .as_ref()
            .map_or(Tile::Void, |level| level.tile_at(x, y))
    }

    pub(crate) fn tile_under_cursor(&self) -> Tile {
        self.tile_at(self.cursor.x(), self.cursor.y())
    }
}

/// Represents the authoritative Algorun session state.
#[derive(Debug)]
pub struct World {
    session: Session,
    run: Option<Interpreter>,
    last_termination: Option<Termination>,
}

impl World {
    /// Creates an empty session using the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty session using the provided configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            session: Session {
                level: None,
                cursor: Cursor::new(0, 0, Direction::Up),
                queues: QueueStore::default(),
                cancelled: false,
                pacing_interval: config.pacing_interval(),
            },
            run: None,
            last_termination: None,
        }
    }

    fn reject(&self, reason: RejectionReason, out_events: &mut Vec<Event>) {
        warn!("input rejected: {reason}");
        out_events.push(Event::CommandRejected { reason });
    }

    fn load_level(&mut self, level: Level, out_events: &mut Vec<Event>) {
        self.cancel_run(out_events);
        debug!(
            "loading {}x{} level starting at ({}, {})",
            level.width(),
            level.height(),
            level.start().x(),
            level.start().y()
        );

        self.session.queues = QueueStore::new(level.max_commands());
        self.session.cursor = level.start();
        self.session.cancelled = false;
        self.last_termination = None;
        out_events.push(Event::LevelRendered {
            level: level.clone(),
        });
        self.session.level = Some(level);
        out_events.push(Event::CursorMoved {
            cursor: self.session.cursor,
        });
        self.broadcast_queues(out_events);
    }

    fn add_command(&mut self, command: Command, placement: Placement, out_events: &mut Vec<Event>) {
        let Some(level) = self.session.level.as_ref() else {
            self.reject(RejectionReason::NoLevelLoaded, out_events);
            return;
        };
        if self.run.is_some() {
            self.reject(RejectionReason::ExecutionInProgress, out_events);
            return;
        }
        if let CommandKind::Call(subroutine) = command.kind {
            if !level.is_enabled(subroutine) {
                self.reject(RejectionReason::SubroutineDisabled { subroutine }, out_events);
                return;
            }
        }

        match self.session.queues.insert(command, placement) {
            Ok(subroutine) => {
                debug!("queued {:?} into {subroutine}", command.kind);
                self.broadcast_queue(subroutine, out_events);
            }
            Err(reason) => self.reject(reason, out_events),
        }
    }

    fn remove_last_command(&mut self, out_events: &mut Vec<Event>) {
        if self.run.is_some() {
            self.reject(RejectionReason::ExecutionInProgress, out_events);
            return;
        }
        if let Some(subroutine) = self.session.queues.remove_last() {
            debug!("removed last command of {subroutine}");
            self.broadcast_queue(subroutine, out_events);
        }
    }

    fn reset_commands(&mut self, out_events: &mut Vec<Event>) {
        self.cancel_run(out_events);
        self.session.queues.clear();
        self.session.cancelled = false;
        self.broadcast_queues(out_events);

        if let Some(level) = self.session.level.as_ref() {
            self.session.cursor = level.start();
            out_events.push(Event::CursorMoved {
                cursor: self.session.cursor,
            });
        }
    }

    fn start_run(&mut self, out_events: &mut Vec<Event>) {
        if self.session.level.is_none() {
            self.reject(RejectionReason::NoLevelLoaded, out_events);
            return;
        }
        self.cancel_run(out_events);

        debug!("starting run from {}", Subroutine::F1);
        out_events.push(Event::RunStarted);
        let mut run = Interpreter::start();
        let progress = run.advance(&mut self.session, out_events);
        self.settle(run, progress, out_events);
    }

    fn abort_run(&mut self, out_events: &mut Vec<Event>) {
        self.session.cancelled = true;
        self.cancel_run(out_events);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if let Some(mut run) = self.run.take() {
            let progress = run.tick(dt, &mut self.session, out_events);
            self.settle(run, progress, out_events);
        }
    }

    fn settle(&mut self, run: Interpreter, progress: Progress, out_events: &mut Vec<Event>) {
        match progress {
            Progress::Suspended => self.run = Some(run),
            Progress::Finished(termination) => self.finish(&run, termination, out_events),
        }
    }

    fn cancel_run(&mut self, out_events: &mut Vec<Event>) {
        if let Some(run) = self.run.take() {
            self.finish(&run, Termination::Cancelled, out_events);
        }
    }

    fn finish(&mut self, run: &Interpreter, termination: Termination, out_events: &mut Vec<Event>) {
        let executed_steps = run.executed_steps();
        match termination {
            Termination::Won | Termination::Exhausted => {
                info!("run finished after {executed_steps} steps: {termination}");
            }
            Termination::AbortedVoid | Termination::Cancelled => {
                debug!("run stopped after {executed_steps} steps: {termination}");
            }
        }
        self.last_termination = Some(termination);
        out_events.push(Event::RunFinished {
            termination,
            executed_steps,
        });
    }

    fn broadcast_queue(&self, subroutine: Subroutine, out_events: &mut Vec<Event>) {
        out_events.push(Event::CommandListChanged {
            subroutine,
            commands: self.session.queues.commands(subroutine).to_vec(),
        });
    }

    fn broadcast_queues(&self, out_events: &mut Vec<Event>) {
        for subroutine in Subroutine::ALL {
            self.broadcast_queue(subroutine, out_events);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided action to the world, mutating state deterministically.
pub fn apply(world: &mut World, action: Action, out_events: &mut Vec<Event>) {
    match action {
        Action::LoadLevel { level } => world.load_level(level, out_events),
        Action::AddCommand { command, placement } => {
            world.add_command(command, placement, out_events);
        }
        Action::SubmitCommand {
            kind,
            condition,
            placement,
        } => match Command::from_labels(&kind, condition.as_deref()) {
            Ok(command) => world.add_command(command, placement, out_events),
            Err(reason) => world.reject(reason, out_events),
        },
        Action::RemoveLastCommand => world.remove_last_command(out_events),
        Action::ResetCommands => world.reset_commands(out_events),
        Action::StartRun => world.start_run(out_events),
        Action::AbortRun => world.abort_run(out_events),
        Action::ConfigurePacing { interval } => {
            if interval.is_zero() {
                world.reject(RejectionReason::InvalidPacing, out_events);
            } else {
                debug!("pacing interval set to {} ms", interval.as_millis());
                world.session.pacing_interval = interval;
            }
        }
        Action::Tick { dt } => world.tick(dt, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::World;
    use algorun_core::{Command, Cursor, Level, Subroutine, Termination, Tile};

    /// Level currently installed, if any.
    #[must_use]
    pub fn level(world: &World) -> Option<&Level> {
        world.session.level.as_ref()
    }

    /// Current cursor pose.
    #[must_use]
    pub fn cursor(world: &World) -> Cursor {
        world.session.cursor
    }

    /// Commands queued in the provided subroutine.
    #[must_use]
    pub fn commands(world: &World, subroutine: Subroutine) -> &[Command] {
        world.session.queues.commands(subroutine)
    }

    /// Tile at the provided cell, void when no level is installed.
    #[must_use]
    pub fn tile_at(world: &World, x: u32, y: u32) -> Tile {
        world.session.tile_at(x, y)
    }

    /// Tile currently under the cursor.
    #[must_use]
    pub fn tile_under_cursor(world: &World) -> Tile {
        world.session.tile_under_cursor()
    }

    /// Reports whether a run is suspended waiting for time to pass.
    #[must_use]
    pub fn is_running(world: &World) -> bool {
        world.run.is_some()
    }

    /// Reports whether the cancellation flag is raised.
    #[must_use]
    pub fn is_cancelled(world: &World) -> bool {
        world.session.cancelled
    }

    /// Delay inserted before each executed command.
    #[must_use]
    pub fn pacing_interval(world: &World) -> Duration {
        world.session.pacing_interval
    }

    /// Time that must still elapse before the pending command executes.
    #[must_use]
    pub fn time_until_next_step(world: &World) -> Option<Duration> {
        world
            .run
            .as_ref()
            .and_then(|run| run.time_until_next_step(world.session.pacing_interval))
    }

    /// How the most recent run ended, cleared whenever a level loads.
    #[must_use]
    pub fn last_termination(world: &World) -> Option<Termination> {
        world.last_termination
    }
}
