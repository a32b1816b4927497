//! Session controller: countdown, start/end, pause and screen navigation

use super::engine::Game;
use super::scoring::average_reaction_ms;
use super::state::{GameEvent, Screen, SessionState};
use super::timers::TimerSlot;
use crate::audio::SoundCue;
use crate::settings::SettingToggle;

impl Game {
    /// Start (or restart) a session: fresh stats, full countdown, first spawn scheduled
    pub fn start_session(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let at = self.fire_due(now_ms);
        self.begin_session(at);
        self.take_events()
    }

    /// One second of countdown. Ends the session when it reaches zero.
    ///
    /// The countdown timer calls this on its own; drivers only need it when they
    /// keep time themselves. A manual tick stands in for the pending timer tick
    /// and restarts the second from `now_ms`. No-op unless playing and not paused.
    pub fn tick_second(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.timers.cancel(TimerSlot::Countdown);
        let at = self.fire_due(now_ms);
        self.on_countdown(at);
        self.take_events()
    }

    /// End the session now. Safe to call repeatedly; only the first call has effects.
    pub fn end_session(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let at = self.fire_due(now_ms);
        self.finish_session(at);
        self.take_events()
    }

    /// Leave the splash screen early
    pub fn skip_splash(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let at = self.fire_due(now_ms);
        self.on_splash_done(at);
        self.take_events()
    }

    pub fn open_how_to(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.open_from_menu(Screen::HowTo, now_ms)
    }

    pub fn open_settings(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.open_from_menu(Screen::Settings, now_ms)
    }

    /// Back to the menu from anywhere, discarding the current session
    pub fn return_to_menu(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.fire_due(now_ms);
        if self.state.screen != Screen::Menu {
            self.timers.clear();
            let previous = self.state.screen;
            self.state = SessionState::new(previous, self.tuning.session_duration_secs);
            self.emit(GameEvent::Sound(SoundCue::Click));
            self.set_screen(Screen::Menu);
        }
        self.take_events()
    }

    /// Flip a player preference
    pub fn toggle_setting(&mut self, which: SettingToggle, now_ms: u64) -> Vec<GameEvent> {
        self.fire_due(now_ms);
        self.settings.toggle(which);
        self.emit(GameEvent::Sound(SoundCue::Click));
        self.take_events()
    }

    pub(super) fn begin_session(&mut self, at: u64) {
        self.timers.clear();
        let previous = self.state.screen;
        self.state = SessionState::new(previous, self.tuning.session_duration_secs);
        self.emit(GameEvent::Sound(SoundCue::Click));
        self.set_screen(Screen::Playing);
        self.timers
            .arm(TimerSlot::Countdown, at, self.tuning.countdown_tick_ms, None);
        log::info!(
            "Session started ({}s, seed {})",
            self.state.time_remaining,
            self.seed()
        );
        self.schedule_next(at);
    }

    pub(super) fn on_countdown(&mut self, at: u64) {
        if self.count_down(at) && self.state.is_playing() && !self.state.paused {
            self.timers
                .arm(TimerSlot::Countdown, at, self.tuning.countdown_tick_ms, None);
        }
    }

    /// Returns true if a second was taken off the clock
    pub(super) fn count_down(&mut self, at: u64) -> bool {
        if !self.state.is_playing() || self.state.paused {
            return false;
        }
        self.state.time_remaining = self.state.time_remaining.saturating_sub(1);
        if self.state.time_remaining == 0 {
            self.finish_session(at);
        }
        true
    }

    pub(super) fn finish_session(&mut self, _at: u64) {
        if !self.state.is_playing() {
            return;
        }

        self.timers.clear();
        self.state.paused = false;
        self.state.feedback = None;
        self.state.encounter.visible = false;
        self.state.encounter.message = None;
        self.state.stats.average_reaction_time_ms = average_reaction_ms(&self.state.reaction_times);

        self.emit(GameEvent::Sound(SoundCue::GameOver));
        self.set_screen(Screen::Results);
        self.emit(GameEvent::SessionEnded(self.state.stats));

        let stats = &self.state.stats;
        log::info!(
            "Session over: score {} ({} hits, {} misses, best streak {}, avg {} ms)",
            stats.score,
            stats.successful_hits,
            stats.misses,
            stats.longest_streak,
            stats.average_reaction_time_ms
        );
    }

    /// Freeze or resume the countdown. Encounter timers are unaffected.
    pub(super) fn set_paused(&mut self, paused: bool, at: u64) {
        if self.state.paused == paused {
            return;
        }
        self.state.paused = paused;
        if paused {
            self.timers.cancel(TimerSlot::Countdown);
        } else if self.state.is_playing() {
            self.timers
                .arm(TimerSlot::Countdown, at, self.tuning.countdown_tick_ms, None);
        }
        log::debug!("Countdown {}", if paused { "paused" } else { "resumed" });
    }

    pub(super) fn on_splash_done(&mut self, _at: u64) {
        self.timers.cancel(TimerSlot::Splash);
        if self.state.screen == Screen::Splash {
            self.set_screen(Screen::Menu);
        }
    }

    fn open_from_menu(&mut self, screen: Screen, now_ms: u64) -> Vec<GameEvent> {
        self.fire_due(now_ms);
        if self.state.screen == Screen::Menu {
            self.emit(GameEvent::Sound(SoundCue::Click));
            self.set_screen(screen);
        }
        self.take_events()
    }
}
