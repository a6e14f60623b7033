#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation contracts for Algorun adapters.
//!
//! The session never draws anything itself. Adapters feed the emitted
//! [`Event`] stream through [`dispatch`] into a [`PresentationSink`], which
//! turns each event into whatever the adapter's medium needs.

use std::io::{self, Write};

use algorun_core::{
    Color, Command, CommandKind, Cursor, Direction, Event, Level, RejectionReason, Subroutine,
    Termination, Tile, SUBROUTINE_COUNT,
};
use anyhow::{Context, Result as AnyResult};

/// Receiver for every observable change of a puzzle session.
pub trait PresentationSink {
    /// A level was installed.
    fn on_level_rendered(&mut self, level: &Level);

    /// The cursor moved or turned.
    fn on_cursor_moved(&mut self, cursor: Cursor);

    /// A subroutine queue changed; `commands` is its full contents.
    fn on_command_list_changed(&mut self, subroutine: Subroutine, commands: &[Command]);

    /// The goal was reached.
    fn on_victory(&mut self);

    /// The final level has been passed.
    fn on_all_levels_complete(&mut self);

    /// Input was refused.
    fn on_command_rejected(&mut self, reason: &RejectionReason);

    /// A run of F1 began.
    fn on_run_started(&mut self) {}

    /// A run ended.
    fn on_run_finished(&mut self, _termination: Termination, _executed_steps: u32) {}
}

/// Forwards each event to the matching sink callback, in order.
pub fn dispatch<S>(events: &[Event], sink: &mut S)
where
    S: PresentationSink + ?Sized,
{
    for event in events {
        match event {
            Event::LevelRendered { level } => sink.on_level_rendered(level),
            Event::CursorMoved { cursor } => sink.on_cursor_moved(*cursor),
            Event::CommandListChanged {
                subroutine,
                commands,
            } => sink.on_command_list_changed(*subroutine, commands),
            Event::CommandRejected { reason } => sink.on_command_rejected(reason),
            Event::RunStarted => sink.on_run_started(),
            Event::Victory => sink.on_victory(),
            Event::RunFinished {
                termination,
                executed_steps,
            } => sink.on_run_finished(*termination, *executed_steps),
            Event::AllLevelsComplete => sink.on_all_levels_complete(),
        }
    }
}

/// Glyph used for a tile in text frames.
#[must_use]
pub const fn tile_glyph(tile: Tile) -> char {
    match tile {
        Tile::Void => '#',
        Tile::Path(Color::Grey) => '.',
        Tile::Path(Color::Green) => 'g',
        Tile::Path(Color::Red) => 'r',
        Tile::Path(Color::Blue) => 'b',
        Tile::Goal => '*',
    }
}

/// Glyph used for the cursor in text frames.
#[must_use]
pub const fn cursor_glyph(direction: Direction) -> char {
    match direction {
        Direction::Up => '^',
        Direction::Right => '>',
        Direction::Down => 'v',
        Direction::Left => '<',
    }
}

/// Renders the level as rows of glyphs with the cursor drawn on top.
///
/// A cursor outside the grid is not drawn.
#[must_use]
pub fn render_frame(level: &Level, cursor: Option<Cursor>) -> String {
    let mut frame = String::new();
    for (row_index, row) in level.rows().iter().enumerate() {
        for column_index in 0..level.width() {
            let tile = row.get(column_index).copied().unwrap_or(Tile::Void);
            let glyph = match cursor {
                Some(cursor)
                    if usize::try_from(cursor.x()).ok() == Some(column_index)
                        && usize::try_from(cursor.y()).ok() == Some(row_index) =>
                {
                    cursor_glyph(cursor.direction())
                }
                _ => tile_glyph(tile),
            };
            frame.push(glyph);
        }
        frame.push('\n');
    }
    frame
}

/// Formats a command the way command sources label it, condition first.
#[must_use]
pub fn describe_command(command: &Command) -> String {
    match command.condition {
        Some(color) => format!("{}: {}", color.label(), command.kind.label()),
        None => command.kind.label().to_owned(),
    }
}

/// Summarises the start pose and the room each subroutine offers.
///
/// Subroutines without capacity are left out.
#[must_use]
pub fn describe_setup(level: &Level) -> String {
    let start = level.start();
    let slots = Subroutine::ALL
        .into_iter()
        .filter(|subroutine| level.capacity(*subroutine) > 0)
        .map(|subroutine| format!("{subroutine} holds {}", level.capacity(subroutine)))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Start at ({}, {}) facing {}; {slots}.",
        start.x(),
        start.y(),
        start.direction().label()
    )
}

/// Plain-text presentation that writes frames and messages to a writer.
///
/// Write failures do not interrupt the session; the first one is kept and
/// reported by [`TextPresentation::finish`].
#[derive(Debug)]
pub struct TextPresentation<W> {
    out: W,
    level: Option<Level>,
    cursor: Option<Cursor>,
    queues: [Vec<Command>; SUBROUTINE_COUNT],
    error: Option<io::Error>,
}

impl<W: Write> TextPresentation<W> {
    /// Creates a presentation writing into `out`.
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out,
            level: None,
            cursor: None,
            queues: Default::default(),
            error: None,
        }
    }

    /// Commands last reported for `subroutine`.
    #[must_use]
    pub fn commands(&self, subroutine: Subroutine) -> &[Command] {
        &self.queues[subroutine.index()]
    }

    /// Flushes the writer and hands it back, surfacing any write failure.
    pub fn finish(mut self) -> AnyResult<W> {
        if let Some(error) = self.error.take() {
            return Err(error).context("failed to write presentation output");
        }
        self.out
            .flush()
            .context("failed to flush presentation output")?;
        Ok(self.out)
    }

    fn emit(&mut self, text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(error) = writeln!(self.out, "{text}") {
            self.error = Some(error);
        }
    }

    fn emit_frame(&mut self) {
        if let Some(level) = self.level.as_ref() {
            let frame = render_frame(level, self.cursor);
            self.emit(frame.trim_end_matches('\n'));
        }
    }
}

impl<W: Write> PresentationSink for TextPresentation<W> {
    fn on_level_rendered(&mut self, level: &Level) {
        self.level = Some(level.clone());
        self.cursor = None;
        if !level.description().is_empty() {
            self.emit(level.description());
        }
        self.emit(&describe_setup(level));
    }

    fn on_cursor_moved(&mut self, cursor: Cursor) {
        self.cursor = Some(cursor);
        self.emit("");
        self.emit_frame();
    }

    fn on_command_list_changed(&mut self, subroutine: Subroutine, commands: &[Command]) {
        self.queues[subroutine.index()] = commands.to_vec();
        if commands.is_empty() {
            return;
        }
        let listing = commands
            .iter()
            .filter(|command| command.kind != CommandKind::Unknown)
            .map(describe_command)
            .collect::<Vec<_>>()
            .join(", ");
        self.emit(&format!("{subroutine}: {listing}"));
    }

    fn on_victory(&mut self) {
        self.emit("Goal reached!");
    }

    fn on_all_levels_complete(&mut self) {
        self.emit("All levels complete.");
    }

    fn on_command_rejected(&mut self, reason: &RejectionReason) {
        self.emit(&format!("rejected: {reason}"));
    }

    fn on_run_started(&mut self) {
        self.emit("Running F1...");
    }

    fn on_run_finished(&mut self, termination: Termination, executed_steps: u32) {
        self.emit(&format!("{termination} after {executed_steps} steps"));
    }
}

/// Sink that records every callback, for assertions in tests and tooling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordingSink {
    /// Callbacks received so far, oldest first.
    pub calls: Vec<SinkCall>,
}

/// One callback observed by a [`RecordingSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkCall {
    /// [`PresentationSink::on_level_rendered`].
    LevelRendered(Level),
    /// [`PresentationSink::on_cursor_moved`].
    CursorMoved(Cursor),
    /// [`PresentationSink::on_command_list_changed`].
    CommandListChanged(Subroutine, Vec<Command>),
    /// [`PresentationSink::on_victory`].
    Victory,
    /// [`PresentationSink::on_all_levels_complete`].
    AllLevelsComplete,
    /// [`PresentationSink::on_command_rejected`].
    CommandRejected(RejectionReason),
    /// [`PresentationSink::on_run_started`].
    RunStarted,
    /// [`PresentationSink::on_run_finished`].
    RunFinished(Termination, u32),
}

impl PresentationSink for RecordingSink {
    fn on_level_rendered(&mut self, level: &Level) {
        self.calls.push(SinkCall::LevelRendered(level.clone()));
    }

    fn on_cursor_moved(&mut self, cursor: Cursor) {
        self.calls.push(SinkCall::CursorMoved(cursor));
    }

    fn on_command_list_changed(&mut self, subroutine: Subroutine, commands: &[Command]) {
        self.calls
            .push(SinkCall::CommandListChanged(subroutine, commands.to_vec()));
    }

    fn on_victory(&mut self) {
        self.calls.push(SinkCall::Victory);
    }

    fn on_all_levels_complete(&mut self) {
        self.calls.push(SinkCall::AllLevelsComplete);
    }

    fn on_command_rejected(&mut self, reason: &RejectionReason) {
        self.calls.push(SinkCall::CommandRejected(reason.clone()));
    }

    fn on_run_started(&mut self) {
        self.calls.push(SinkCall::RunStarted);
    }

    fn on_run_finished(&mut self, termination: Termination, executed_steps: u32) {
        self.calls
            .push(SinkCall::RunFinished(termination, executed_steps));
    }
}
