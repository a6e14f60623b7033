//! Step engine that replays subroutine queues against the cursor.
//!
//! A run is an explicit stack of frames, one per active subroutine call. The
//! interpreter walks the top frame until it reaches a command worth
//! executing, then suspends for the pacing interval. Time delivered through
//! [`Interpreter::tick`] resumes the pending command. The session's
//! cancellation flag is consulted before every step and again on resume, so a
//! raised flag unwinds every frame at once.

use std::time::Duration;

use algorun_core::{Command, CommandKind, Event, Subroutine, Termination, Tile, Turn};
use log::trace;

use crate::Session;

/// Outcome of driving the interpreter as far as it can go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Progress {
    /// A command is waiting for the pacing interval to elapse.
    Suspended,
    /// The run reached a terminal state.
    Finished(Termination),
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    subroutine: Subroutine,
    next: usize,
    /// Entered through a call command, so the caller's goal check runs when
    /// this frame runs dry.
    called: bool,
}

#[derive(Clone, Copy, Debug)]
struct PendingStep {
    command: Command,
    elapsed: Duration,
}

#[derive(Debug)]
pub(crate) struct Interpreter {
    frames: Vec<Frame>,
    pending: Option<PendingStep>,
    executed_steps: u32,
}

impl Interpreter {
    /// Creates a run positioned at the first command of F1.
    pub(crate) fn start() -> Self {
        Self {
            frames: vec![Frame {
                subroutine: Subroutine::F1,
                next: 0,
                called: false,
            }],
            pending: None,
            executed_steps: 0,
        }
    }

    pub(crate) fn executed_steps(&self) -> u32 {
        self.executed_steps
    }

    pub(crate) fn time_until_next_step(&self, pacing_interval: Duration) -> Option<Duration> {
        self.pending
            .map(|pending| pacing_interval.saturating_sub(pending.elapsed))
    }

    /// Walks frames until a command is ready to execute or the run ends.
    pub(crate) fn advance(&mut self, session: &mut Session, out_events: &mut Vec<Event>) -> Progress {
        loop {
            if session.cancelled {
                return Progress::Finished(Termination::Cancelled);
            }

            let Some(frame) = self.frames.last().copied() else {
                return Progress::Finished(Termination::Exhausted);
            };

            let Some(command) = session.queues.command(frame.subroutine, frame.next) else {
                let _ = self.frames.pop();
                trace!("{} ran out of commands", frame.subroutine);
                if frame.called && session.tile_under_cursor() == Tile::Goal {
                    return Progress::Finished(win(session, out_events));
                }
                continue;
            };

            if let Some(top) = self.frames.last_mut() {
                top.next += 1;
            }

            let tile = session.tile_under_cursor();
            if command.kind == CommandKind::Unknown || !tile.satisfies(command.condition) {
                trace!(
                    "skipping {:?} at {}[{}] on {tile:?}",
                    command.kind,
                    frame.subroutine,
                    frame.next
                );
                continue;
            }

            if tile == Tile::Void {
                session.cancelled = true;
                return Progress::Finished(Termination::AbortedVoid);
            }

            self.pending = Some(PendingStep {
                command,
                elapsed: Duration::ZERO,
            });
            return Progress::Suspended;
        }
    }

    /// Delivers elapsed time, executing every command whose delay has passed.
    pub(crate) fn tick(
        &mut self,
        dt: Duration,
        session: &mut Session,
        out_events: &mut Vec<Event>,
    ) -> Progress {
        let mut carry = dt;
        loop {
            let Some(pending) = self.pending.as_mut() else {
                return self.advance(session, out_events);
            };

            pending.elapsed = pending.elapsed.saturating_add(carry);
            if pending.elapsed < session.pacing_interval {
                return Progress::Suspended;
            }
            carry = pending.elapsed - session.pacing_interval;

            if let Some(termination) = self.resume(session, out_events) {
                return Progress::Finished(termination);
            }
            if let finished @ Progress::Finished(_) = self.advance(session, out_events) {
                return finished;
            }
        }
    }

    fn resume(&mut self, session: &mut Session, out_events: &mut Vec<Event>) -> Option<Termination> {
        let step = self.pending.take()?;
        if session.cancelled {
            return Some(Termination::Cancelled);
        }

        self.executed_steps = self.executed_steps.saturating_add(1);
        trace!("executing {:?}", step.command.kind);
        match step.command.kind {
            CommandKind::MoveForward => session.cursor.move_forward(),
            CommandKind::TurnLeft => session.cursor.rotate(Turn::Left),
            CommandKind::TurnRight => session.cursor.rotate(Turn::Right),
            CommandKind::Call(subroutine) => {
                self.enter(subroutine, session);
                return None;
            }
            CommandKind::Unknown => return None,
        }
        out_events.push(Event::CursorMoved {
            cursor: session.cursor,
        });

        (session.tile_under_cursor() == Tile::Goal).then(|| win(session, out_events))
    }

    fn enter(&mut self, subroutine: Subroutine, session: &Session) {
        // A call in tail position replaces its caller instead of nesting.
        if let Some(top) = self.frames.last().copied() {
            if session.queues.command(top.subroutine, top.next).is_none() {
                let _ = self.frames.pop();
            }
        }
        self.frames.push(Frame {
            subroutine,
            next: 0,
            called: true,
        });
    }
}

fn win(session: &mut Session, out_events: &mut Vec<Event>) -> Termination {
    out_events.push(Event::Victory);
    session.cancelled = true;
    Termination::Won
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::QueueStore;
    use algorun_core::{Color, Cursor, Direction, Level, Placement};

    fn session(level: Level, program: &[(Subroutine, Command)]) -> Session {
        let mut queues = QueueStore::new([8, 8, 8]);
        for (subroutine, command) in program {
            let _ = queues
                .insert(*command, Placement::Subroutine(*subroutine))
                .expect("room in queue");
        }
        Session {
            cursor: level.start(),
            level: Some(level),
            queues,
            cancelled: false,
            pacing_interval: Duration::from_millis(100),
        }
    }

    fn spinner() -> Level {
        Level::new(
            vec![vec![Tile::Path(Color::Grey)]],
            Cursor::new(0, 0, Direction::Up),
            [8, 8, 8],
        )
    }

    #[test]
    fn tail_calls_do_not_grow_the_frame_stack() {
        let mut session = session(
            spinner(),
            &[
                (Subroutine::F1, Command::new(CommandKind::TurnLeft)),
                (Subroutine::F1, Command::new(CommandKind::Call(Subroutine::F1))),
            ],
        );
        let mut events = Vec::new();
        let mut run = Interpreter::start();

        assert_eq!(run.advance(&mut session, &mut events), Progress::Suspended);
        for _ in 0..50 {
            assert_eq!(
                run.tick(Duration::from_millis(100), &mut session, &mut events),
                Progress::Suspended
            );
            assert!(run.frames.len() <= 1, "tail call nested a frame");
        }
        assert_eq!(run.executed_steps(), 50);
    }

    #[test]
    fn nested_calls_keep_caller_frames() {
        let mut session = session(
            spinner(),
            &[
                (Subroutine::F1, Command::new(CommandKind::Call(Subroutine::F2))),
                (Subroutine::F1, Command::new(CommandKind::TurnRight)),
                (Subroutine::F2, Command::new(CommandKind::TurnLeft)),
            ],
        );
        let mut events = Vec::new();
        let mut run = Interpreter::start();

        assert_eq!(run.advance(&mut session, &mut events), Progress::Suspended);
        assert_eq!(
            run.tick(Duration::from_millis(100), &mut session, &mut events),
            Progress::Suspended
        );
        assert_eq!(run.frames.len(), 2);

        assert_eq!(
            run.tick(Duration::from_millis(200), &mut session, &mut events),
            Progress::Finished(Termination::Exhausted)
        );
        assert_eq!(session.cursor.direction(), Direction::Up);
        assert_eq!(run.executed_steps(), 3);
    }

    #[test]
    fn cancellation_is_observed_on_resume() {
        let mut session = session(
            spinner(),
            &[(Subroutine::F1, Command::new(CommandKind::TurnLeft))],
        );
        let mut events = Vec::new();
        let mut run = Interpreter::start();

        assert_eq!(run.advance(&mut session, &mut events), Progress::Suspended);
        session.cancelled = true;

        assert_eq!(
            run.tick(Duration::from_millis(100), &mut session, &mut events),
            Progress::Finished(Termination::Cancelled)
        );
        assert_eq!(run.executed_steps(), 0);
        assert!(events.is_empty());
    }
}
