//! Capacity-bounded storage for the three subroutine queues.

use algorun_core::{Command, Placement, RejectionReason, Subroutine, SUBROUTINE_COUNT};

/// Ordered command lists for F1 to F3, each capped by the level.
///
/// Every insertion resolves exactly one target queue and checks its capacity
/// once; the placement only decides how that target is chosen.
#[derive(Clone, Debug, Default)]
pub(crate) struct QueueStore {
    queues: [Vec<Command>; SUBROUTINE_COUNT],
    capacities: [usize; SUBROUTINE_COUNT],
}

impl QueueStore {
    pub(crate) fn new(capacities: [usize; SUBROUTINE_COUNT]) -> Self {
        Self {
            queues: Default::default(),
            capacities,
        }
    }

    pub(crate) fn commands(&self, subroutine: Subroutine) -> &[Command] {
        &self.queues[subroutine.index()]
    }

    pub(crate) fn command(&self, subroutine: Subroutine, index: usize) -> Option<Command> {
        self.queues[subroutine.index()].get(index).copied()
    }

    pub(crate) fn capacity(&self, subroutine: Subroutine) -> usize {
        self.capacities[subroutine.index()]
    }

    /// Appends `command` to the queue chosen by `placement`.
    pub(crate) fn insert(
        &mut self,
        command: Command,
        placement: Placement,
    ) -> Result<Subroutine, RejectionReason> {
        let target = self.target(placement)?;
        self.queues[target.index()].push(command);
        Ok(target)
    }

    /// Pops the last command of the highest-numbered non-empty queue.
    pub(crate) fn remove_last(&mut self) -> Option<Subroutine> {
        let subroutine = Subroutine::ALL
            .into_iter()
            .rev()
            .find(|subroutine| !self.commands(*subroutine).is_empty())?;
        let _ = self.queues[subroutine.index()].pop();
        Some(subroutine)
    }

    pub(crate) fn clear(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
    }

    fn target(&self, placement: Placement) -> Result<Subroutine, RejectionReason> {
        match placement {
            Placement::FirstAvailable => Subroutine::ALL
                .into_iter()
                .find(|subroutine| self.has_room(*subroutine))
                .ok_or(RejectionReason::QueuesFull),
            Placement::Subroutine(subroutine) if self.has_room(subroutine) => Ok(subroutine),
            Placement::Subroutine(subroutine) => Err(RejectionReason::QueueFull { subroutine }),
        }
    }

    fn has_room(&self, subroutine: Subroutine) -> bool {
        self.commands(subroutine).len() < self.capacity(subroutine)
    }
}
