//! The session engine
//!
//! [`Game`] owns the session state, the timer queue and the RNG. Transitions
//! live in `session`, `scheduler` and `encounter`; `tick` fires timers.
//!
//! Public operations take the caller's clock (`now_ms`, monotonic milliseconds),
//! first fire every timer due by then, apply themselves, and return the side
//! effects they produced.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::state::{GameEvent, Screen, SessionState, Snapshot};
use super::timers::{TimerQueue, TimerSlot};
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Deterministic session engine
#[derive(Debug, Clone)]
pub struct Game {
    pub(super) state: SessionState,
    pub(super) timers: TimerQueue,
    pub(super) tuning: Tuning,
    pub(super) settings: Settings,
    pub(super) rng: Pcg32,
    seed: u64,
    /// Clock reached by the last `advance`
    pub(super) now_ms: u64,
    /// Id given to the next spawned encounter
    pub(super) next_encounter_id: u32,
    /// Effects collected since the last public call
    pub(super) events: Vec<GameEvent>,
}

impl Game {
    /// Boot on the splash screen at `now_ms`. Invalid tuning falls back to defaults.
    pub fn new(seed: u64, tuning: Tuning, settings: Settings, now_ms: u64) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(err) => {
                log::warn!("Ignoring tuning: {}", err);
                Tuning::default()
            }
        };
        let mut game = Self {
            state: SessionState::new(Screen::Splash, tuning.session_duration_secs),
            timers: TimerQueue::new(),
            tuning,
            settings,
            rng: Pcg32::seed_from_u64(seed),
            seed,
            now_ms,
            next_encounter_id: 1,
            events: Vec::new(),
        };
        game.timers
            .arm(TimerSlot::Splash, now_ms, game.tuning.splash_ms, None);
        log::info!("Game booted with seed {}", seed);
        game
    }

    /// Default tuning and settings
    pub fn with_seed(seed: u64) -> Self {
        Self::new(seed, Tuning::default(), Settings::default(), 0)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Earliest pending timer deadline, for drivers that sleep between events
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// View for the HUD and overlays
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            now_ms: self.now_ms,
            screen: self.state.screen,
            time_remaining: self.state.time_remaining,
            time_low: self.state.is_time_low(),
            stats: self.state.stats,
            streak: self.state.streak,
            streak_banner: self.state.show_streak_banner(),
            paused: self.state.paused,
            encounter: self.state.encounter.clone(),
            feedback: self.state.feedback.clone(),
        }
    }

    pub(super) fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(super) fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(super) fn set_screen(&mut self, screen: Screen) {
        if self.state.screen != screen {
            log::info!("Screen {:?} -> {:?}", self.state.screen, screen);
            self.state.screen = screen;
            self.emit(GameEvent::ScreenChanged(screen));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_spawn_range_falls_back_to_defaults() {
        let tuning = Tuning {
            spawn_min_interval_ms: 6000,
            spawn_max_interval_ms: 5000,
            ..Tuning::default()
        };
        let mut game = Game::new(1, tuning, Settings::default(), 0);
        assert_eq!(game.tuning(), &Tuning::default());

        game.start_session(0);
        let spawn = game.timers().get(TimerSlot::Spawn).unwrap();
        assert!((2000..=5000).contains(&spawn.due_ms));
    }

    #[test]
    fn test_valid_tuning_is_kept() {
        let tuning = Tuning {
            session_duration_secs: 15,
            ..Tuning::default()
        };
        let game = Game::new(1, tuning.clone(), Settings::default(), 0);
        assert_eq!(game.tuning(), &tuning);
        assert_eq!(game.state().time_remaining, 15);
    }
}
