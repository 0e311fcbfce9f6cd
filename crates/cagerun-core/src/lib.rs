pub mod anim;
pub mod countdown;
pub mod events;
pub mod game_trait;
pub mod geom;
pub mod input;
pub mod progress;
pub mod timer;

#[doc(hidden)]
pub use rmp_serde;
#[doc(hidden)]
pub use tracing;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::events::SimEvent;
    use crate::game_trait::RunnerGame;
    use crate::input::{GameAction, InputEvent};
    use crate::timer::{ExternalTimer, TimerFired};

    /// Run N ticks with no input and no timer delivery, returning all events.
    pub fn run_ticks(game: &mut dyn RunnerGame, n: usize, dt: f32) -> Vec<SimEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(game.update(dt));
        }
        all_events
    }

    /// Run N ticks the way a host does: mirror the spawn timer, deliver its
    /// fires, then update. Stops early once the attempt has finished.
    pub fn run_ticks_with_timer(
        game: &mut dyn RunnerGame,
        timer: &mut ExternalTimer,
        n: usize,
        dt: f32,
    ) -> Vec<SimEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            timer.sync(&game.spawn_timer());
            if let Some(fired) = timer.tick(dt) {
                all_events.extend(game.handle_timer(fired));
            }
            all_events.extend(game.update(dt));
            if game.is_finished() {
                break;
            }
        }
        all_events
    }

    /// Assert that the game's serialized state differs from `before`.
    pub fn assert_game_state_changed(game: &dyn RunnerGame, before: &[u8]) {
        let after = game.serialize_state();
        assert_ne!(
            before,
            &after[..],
            "Game state should have changed after operation"
        );
    }

    // ================================================================
    // Game Trait Contract Tests
    // ================================================================
    // Every RunnerGame implementation must pass these. Level crates call
    // them from their own #[cfg(test)] modules with a concrete game.

    /// A fresh attempt has a non-empty snapshot, no outcome and no score.
    pub fn contract_reset_starts_clean(game: &mut dyn RunnerGame) {
        let events = game.reset();
        assert!(
            events.contains(&SimEvent::Restarted),
            "reset() must report Restarted"
        );
        assert!(
            !game.serialize_state().is_empty(),
            "serialize_state() must return non-empty bytes after reset"
        );
        assert!(game.outcome().is_none(), "a fresh attempt has no outcome");
        assert_eq!(game.score(), 0, "a fresh attempt has no score");
        assert!(
            game.spawn_timer().is_armed(),
            "a fresh attempt arms its spawn timer"
        );
    }

    /// update() with dt>0 must advance state.
    pub fn contract_update_advances_state(game: &mut dyn RunnerGame) {
        let before = game.serialize_state();
        game.update(1.0 / 60.0);
        assert_game_state_changed(game, &before);
    }

    /// handle_input() with a valid action followed by update() must change state.
    pub fn contract_input_changes_state(game: &mut dyn RunnerGame, action: GameAction) {
        let before = game.serialize_state();
        game.handle_input(InputEvent::press(action));
        game.update(1.0 / 60.0);
        assert_game_state_changed(game, &before);
    }

    /// serialize → apply → serialize must be stable.
    pub fn contract_state_roundtrip_preserves(game: &mut dyn RunnerGame) {
        let state_a = game.serialize_state();
        game.apply_state(&state_a);
        let state_b = game.serialize_state();
        game.apply_state(&state_b);
        let state_c = game.serialize_state();
        assert_eq!(state_a, state_b, "applying a snapshot must restore it");
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// apply_state() with garbage must leave the state untouched.
    pub fn contract_malformed_state_ignored(game: &mut dyn RunnerGame) {
        let before = game.serialize_state();
        game.apply_state(&[0xc1, 0xff, 0x00]);
        assert_eq!(before, game.serialize_state());
    }

    /// pause() must freeze state, resume() must unfreeze it.
    pub fn contract_pause_stops_updates(game: &mut dyn RunnerGame) {
        game.pause();
        assert!(game.is_paused());
        let before = game.serialize_state();
        let events = game.update(1.0 / 60.0);
        assert!(events.is_empty(), "no events while paused");
        let during_pause = game.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        game.resume();
        game.update(1.0 / 60.0);
        let after_resume = game.serialize_state();
        assert_ne!(during_pause, after_resume, "State must change after resume");
    }

    /// A fire from a superseded generation must be a no-op.
    pub fn contract_stale_timer_ignored(game: &mut dyn RunnerGame) {
        let Some(current) = game.spawn_timer().generation() else {
            panic!("contract requires an armed spawn timer");
        };
        let before = game.serialize_state();
        let events = game.handle_timer(TimerFired {
            generation: current.wrapping_add(1),
        });
        assert!(events.is_empty(), "stale fire must not emit events");
        assert_eq!(before, game.serialize_state(), "stale fire must not mutate");
    }

    /// Left alone with its timer running, an attempt must end within
    /// `max_ticks` frames of 1/60 s, and the final event must be terminal.
    pub fn contract_attempt_eventually_ends(game: &mut dyn RunnerGame, max_ticks: usize) {
        let mut timer = ExternalTimer::new();
        let events = run_ticks_with_timer(game, &mut timer, max_ticks, 1.0 / 60.0);
        assert!(
            game.is_finished(),
            "attempt must end within {max_ticks} ticks"
        );
        let terminal: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
        assert_eq!(terminal.len(), 1, "exactly one terminal event per attempt");
        assert!(
            !game.spawn_timer().is_armed(),
            "a finished attempt disables its spawn timer"
        );
    }

    /// Once finished, gameplay input and timer fires are no-ops and Restart
    /// starts a new attempt.
    pub fn contract_finished_attempt_is_inert(game: &mut dyn RunnerGame) {
        assert!(game.is_finished(), "contract requires a finished attempt");
        let before = game.serialize_state();
        for action in [GameAction::Jump, GameAction::Slide, GameAction::Shoot] {
            assert!(game.handle_input(InputEvent::press(action)).is_empty());
        }
        assert!(game.handle_timer(TimerFired { generation: 0 }).is_empty());
        assert!(game.update(1.0 / 60.0).is_empty());
        assert_eq!(before, game.serialize_state());

        let events = game.handle_input(InputEvent::press(GameAction::Restart));
        assert!(events.contains(&SimEvent::Restarted));
        assert!(!game.is_finished());
        assert_eq!(game.score(), 0);
    }
}
