use serde::{Deserialize, Serialize};

use crate::events::{Outcome, SimEvent};
use crate::input::InputEvent;
use crate::timer::{TimerArm, TimerFired};

/// Core trait implemented by a level simulation.
///
/// The host owns the window, audio, timers and persistence. It forwards
/// resolved input and timer fires, calls `update` once per rendered frame and
/// reacts to the returned events. Nothing here blocks or performs I/O.
pub trait RunnerGame {
    /// Static description for menus and presence.
    fn metadata(&self) -> GameMetadata;

    /// Apply one logical input edge.
    fn handle_input(&mut self, input: InputEvent) -> Vec<SimEvent>;

    /// Deliver a fire of the timer described by [`RunnerGame::spawn_timer`].
    /// Stale or unexpected fires must be ignored.
    fn handle_timer(&mut self, fired: TimerFired) -> Vec<SimEvent>;

    /// Advance the simulation by `dt` seconds.
    fn update(&mut self, dt: f32) -> Vec<SimEvent>;

    /// Tear the attempt down and start a fresh one.
    fn reset(&mut self) -> Vec<SimEvent>;

    /// The spawn timer the host should currently be running.
    fn spawn_timer(&self) -> TimerArm;

    /// Serialize the full attempt state.
    fn serialize_state(&self) -> Vec<u8>;

    /// Replace the attempt state with a snapshot from `serialize_state`.
    fn apply_state(&mut self, state: &[u8]);

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;

    /// `Some` once the attempt has ended.
    fn outcome(&self) -> Option<Outcome>;

    fn score(&self) -> u32;

    fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// Decode and apply a msgpack-encoded [`InputEvent`]. Undecodable bytes
    /// are dropped.
    fn apply_input(&mut self, bytes: &[u8]) -> Vec<SimEvent> {
        match InputEvent::decode(bytes) {
            Some(input) => self.handle_input(input),
            None => Vec::new(),
        }
    }
}

/// Level metadata for menus and rich presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub level_id: u8,
    pub name: String,
    pub description: String,
    pub has_chaser: bool,
    pub finale_score: u32,
}

/// Generates the `RunnerGame` methods that only shuffle the state snapshot:
/// `serialize_state`, `apply_state`, `pause`, `resume`, `is_paused`.
///
/// Requires the implementing struct to have `state: $StateType` and
/// `paused: bool` fields.
#[macro_export]
macro_rules! runner_game_boilerplate {
    (state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            match $crate::rmp_serde::to_vec(&self.state) {
                Ok(bytes) => bytes,
                Err(e) => {
                    $crate::tracing::debug!("State snapshot failed to encode: {e}");
                    Vec::new()
                },
            }
        }

        fn apply_state(&mut self, state: &[u8]) {
            match $crate::rmp_serde::from_slice::<$StateType>(state) {
                Ok(s) => self.state = s,
                Err(e) => {
                    $crate::tracing::debug!("Dropping malformed state snapshot: {e}");
                },
            }
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn is_paused(&self) -> bool {
            self.paused
        }
    };
}
