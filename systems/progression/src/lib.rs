#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level progression controller that walks a provider's levels in order.
//!
//! [`Progression`] owns the Algorun [`World`] and decides which level is
//! installed in it. Reaching the goal never advances on its own; it only
//! unlocks the next-level affordance that an adapter may act upon.

use algorun_core::{Action, Event, LevelKey, LevelProvider};
use algorun_world::{self as world, World};
use log::{info, warn};

/// Tracks the active level and forwards player actions to the session.
#[derive(Debug)]
pub struct Progression<P> {
    provider: P,
    keys: Vec<LevelKey>,
    world: World,
    current: Option<usize>,
    next_unlocked: bool,
    complete: bool,
}

impl<P: LevelProvider> Progression<P> {
    /// Creates a controller over the provided levels. No level is loaded yet.
    #[must_use]
    pub fn new(provider: P, world: World) -> Self {
        let keys = provider.level_keys();
        Self {
            provider,
            keys,
            world,
            current: None,
            next_unlocked: false,
            complete: false,
        }
    }

    /// Installs the level stored at `index` in the provider's key order.
    ///
    /// Out-of-range indexes and keys the provider cannot resolve leave the
    /// session untouched and return `false`.
    pub fn load_level_by_index(&mut self, index: usize, out_events: &mut Vec<Event>) -> bool {
        let Some(key) = self.keys.get(index) else {
            warn!(
                "level index {index} is out of range for {} levels",
                self.keys.len()
            );
            return false;
        };
        let Some(level) = self.provider.level(key) else {
            warn!("level provider has no level stored under `{key}`");
            return false;
        };

        info!("loading level {} (`{key}`)", index + 1);
        world::apply(&mut self.world, Action::LoadLevel { level }, out_events);
        self.current = Some(index);
        self.next_unlocked = false;
        self.complete = false;
        true
    }

    /// Moves on to the level after the current one.
    ///
    /// Once the last level has been passed a single
    /// [`Event::AllLevelsComplete`] is emitted and further calls do nothing
    /// until a level is loaded by index again.
    pub fn load_next_level(&mut self, out_events: &mut Vec<Event>) -> bool {
        if self.complete {
            return false;
        }

        let next = self.current.map_or(0, |index| index + 1);
        if next < self.keys.len() {
            return self.load_level_by_index(next, out_events);
        }

        info!("all {} levels complete", self.keys.len());
        self.complete = true;
        self.next_unlocked = false;
        out_events.push(Event::AllLevelsComplete);
        false
    }

    /// Forwards an action to the session and tracks victories it produces.
    ///
    /// [`Action::LoadLevel`] is refused; levels change only through
    /// [`Progression::load_level_by_index`] and [`Progression::load_next_level`].
    pub fn apply(&mut self, action: Action, out_events: &mut Vec<Event>) {
        if matches!(action, Action::LoadLevel { .. }) {
            warn!("ignoring direct level load; use the progression navigation instead");
            return;
        }

        let first_new = out_events.len();
        world::apply(&mut self.world, action, out_events);

        if out_events[first_new..]
            .iter()
            .any(|event| matches!(event, Event::Victory))
        {
            self.next_unlocked = !self.complete;
        }
    }

    /// Session owned by the controller.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Zero-based index of the installed level.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Provider key of the installed level.
    #[must_use]
    pub fn current_key(&self) -> Option<&LevelKey> {
        self.current.and_then(|index| self.keys.get(index))
    }

    /// Number of levels the provider offers.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.keys.len()
    }

    /// Reports whether the goal was reached since the last level load.
    #[must_use]
    pub fn next_level_unlocked(&self) -> bool {
        self.next_unlocked
    }

    /// Reports whether advancement ran past the final level.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.complete
    }
}
