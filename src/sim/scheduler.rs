//! Spawn scheduler: when and where the next alien appears

use glam::Vec2;
use rand::Rng;

use super::engine::Game;
use super::state::{AlienStatus, Encounter, GameEvent};
use super::timers::TimerSlot;
use crate::audio::SoundCue;
use crate::consts::{SPAWN_X_RANGE, SPAWN_Y_RANGE};

impl Game {
    /// Arm the spawn timer with a random delay. Replaces any pending spawn.
    pub(super) fn schedule_next(&mut self, at: u64) {
        if !self.state.is_playing() {
            return;
        }
        let delay = self.rng.random_range(
            self.tuning.spawn_min_interval_ms..=self.tuning.spawn_max_interval_ms,
        );
        self.timers.arm(TimerSlot::Spawn, at, delay, None);
        log::debug!("Next alien in {} ms", delay);
    }

    /// Bring a new alien through the portal
    pub(super) fn spawn(&mut self, at: u64) {
        // Session may have ended while we waited
        if !self.state.is_playing() {
            return;
        }
        if self.state.encounter.visible {
            log::warn!(
                "Spawn skipped: encounter {} still visible",
                self.state.encounter.id
            );
            return;
        }

        let id = self.next_encounter_id;
        self.next_encounter_id += 1;
        let position = self.random_position();

        self.state.encounter = Encounter {
            id,
            visible: true,
            status: AlienStatus::Idle,
            position,
            spawned_at_ms: at,
            message: None,
        };
        self.state.stats.encounters += 1;

        self.emit(GameEvent::Sound(SoundCue::Portal));
        self.timers
            .arm(TimerSlot::SpawnCue, at, self.tuning.spawn_cue_delay_ms, Some(id));
        self.timers
            .arm(TimerSlot::MissTimeout, at, self.tuning.miss_timeout_ms, Some(id));

        log::debug!(
            "Alien {} spawned at ({:.2}, {:.2})",
            id,
            position.x,
            position.y
        );
    }

    pub(super) fn on_spawn_cue(&mut self, encounter: u32) {
        if self.owns(encounter) {
            self.emit(GameEvent::Sound(SoundCue::Spawn));
        }
    }

    /// Hide the alien and queue the next one
    pub(super) fn hide_and_reschedule(&mut self, at: u64) {
        let id = self.state.encounter.id;
        self.timers.cancel_encounter(id);
        self.state.encounter.visible = false;
        self.state.encounter.message = None;
        log::debug!("Alien {} departed", id);
        self.schedule_next(at);
    }

    fn random_position(&mut self) -> Vec2 {
        let x = self.rng.random_range(SPAWN_X_RANGE.0..=SPAWN_X_RANGE.1);
        let y = self.rng.random_range(SPAWN_Y_RANGE.0..=SPAWN_Y_RANGE.1);
        Vec2::new(x, y)
    }
}
