//! Interaction state machine for the live alien
//!
//! ```text
//! Idle -> Missed -> (grace) -> gone
//! Idle -> Hit -> Listening -> Thinking -> Talking -> Hit (goodbye) -> gone
//!             \-> Hit (goodbye, when conversation is off) -> gone
//! ```
//!
//! Every timer-driven transition re-checks the encounter id and status before
//! mutating, so whichever of two same-instant events commits first wins and the
//! other is a no-op.

use super::engine::Game;
use super::scoring::points_for_hit;
use super::state::{AlienStatus, Feedback, FeedbackKind, GameEvent};
use super::timers::TimerSlot;
use crate::audio::SoundCue;
use crate::chat::{FALLBACK_REPLY, build_prompt};
use crate::error::ChatError;

/// Outcome of a successful wave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub encounter_id: u32,
    pub reaction_ms: u64,
    pub points: u64,
    /// Streak after this hit
    pub streak: u32,
}

impl Game {
    /// Player waved. Timers due by `now_ms` fire first, so a miss timeout at the
    /// same instant wins. Returns the hit, if the wave landed.
    pub fn wave(&mut self, now_ms: u64) -> (Option<Hit>, Vec<GameEvent>) {
        let at = self.fire_due(now_ms);
        let hit = self.register_hit(at);
        (hit, self.take_events())
    }

    /// Player submitted a question while the alien was listening.
    /// Returns false (and does nothing) otherwise, or for blank questions.
    pub fn submit_question(&mut self, question: &str, now_ms: u64) -> (bool, Vec<GameEvent>) {
        let at = self.fire_due(now_ms);
        let accepted = self.ask(question, at);
        (accepted, self.take_events())
    }

    /// Chat collaborator answered (or failed) for `encounter_id`.
    /// Late answers for a departed encounter are dropped.
    pub fn chat_reply(
        &mut self,
        encounter_id: u32,
        reply: Result<String, ChatError>,
        now_ms: u64,
    ) -> Vec<GameEvent> {
        let at = self.fire_due(now_ms);
        if self.owns(encounter_id) && self.state.encounter.status == AlienStatus::Thinking {
            self.timers.cancel(TimerSlot::ChatDeadline);
            self.apply_reply(reply, at);
        } else {
            log::debug!("Dropped chat reply for encounter {}", encounter_id);
        }
        self.take_events()
    }

    /// Player closed the chat box without asking anything
    pub fn dismiss_chat(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let at = self.fire_due(now_ms);
        if self.state.is_playing()
            && self.state.encounter.visible
            && self.state.encounter.status == AlienStatus::Listening
        {
            self.depart(at);
        }
        self.take_events()
    }

    /// Live encounter matches `encounter` and the session is still running
    pub(super) fn owns(&self, encounter: u32) -> bool {
        self.state.is_playing()
            && self.state.encounter.visible
            && self.state.encounter.id == encounter
    }

    fn register_hit(&mut self, at: u64) -> Option<Hit> {
        if !self.state.is_playing() || !self.state.encounter.is_waiting() {
            return None;
        }

        self.timers.cancel(TimerSlot::MissTimeout);

        let encounter_id = self.state.encounter.id;
        let reaction_ms = at.saturating_sub(self.state.encounter.spawned_at_ms);
        self.state.reaction_times.push(reaction_ms);

        let points = points_for_hit(reaction_ms, self.state.streak);
        self.state.streak += 1;
        let stats = &mut self.state.stats;
        stats.score += points;
        stats.successful_hits += 1;
        stats.longest_streak = stats.longest_streak.max(self.state.streak);
        self.state.encounter.status = AlienStatus::Hit;

        self.emit(GameEvent::Sound(SoundCue::Success));
        if self.settings.vibration_enabled {
            self.emit(GameEvent::Vibrate {
                ms: self.tuning.haptic_pulse_ms,
            });
        }
        self.show_feedback(
            FeedbackKind::Points,
            format!("+{points}"),
            self.tuning.hit_feedback_ms,
            at,
        );
        self.timers.arm(
            TimerSlot::HitFollowUp,
            at,
            self.tuning.hit_follow_up_ms,
            Some(encounter_id),
        );

        log::debug!(
            "Alien {} hit after {} ms: +{} (streak {})",
            encounter_id,
            reaction_ms,
            points,
            self.state.streak
        );

        Some(Hit {
            encounter_id,
            reaction_ms,
            points,
            streak: self.state.streak,
        })
    }

    pub(super) fn on_miss_timeout(&mut self, encounter: u32, at: u64) {
        if !self.owns(encounter) || self.state.encounter.status != AlienStatus::Idle {
            return;
        }

        self.state.encounter.status = AlienStatus::Missed;
        self.state.streak = 0;
        self.state.stats.misses += 1;

        self.emit(GameEvent::Sound(SoundCue::Miss));
        self.show_feedback(
            FeedbackKind::TooSlow,
            "Too Slow!".to_string(),
            self.tuning.miss_feedback_ms,
            at,
        );
        self.timers.arm(
            TimerSlot::MissGrace,
            at,
            self.tuning.miss_grace_ms,
            Some(encounter),
        );
        log::debug!("Alien {} missed", encounter);
    }

    pub(super) fn on_miss_grace(&mut self, encounter: u32, at: u64) {
        if self.owns(encounter) && self.state.encounter.status == AlienStatus::Missed {
            self.hide_and_reschedule(at);
        }
    }

    pub(super) fn on_hit_follow_up(&mut self, encounter: u32, at: u64) {
        if !self.owns(encounter) || self.state.encounter.status != AlienStatus::Hit {
            return;
        }
        if !self.tuning.conversation_enabled {
            self.depart(at);
            return;
        }

        self.state.encounter.status = AlienStatus::Listening;
        self.set_paused(true, at);
        self.emit(GameEvent::FocusChatInput);
        self.timers.arm(
            TimerSlot::Patience,
            at,
            self.tuning.patience_ms,
            Some(encounter),
        );
    }

    pub(super) fn on_patience(&mut self, encounter: u32, at: u64) {
        if self.owns(encounter) && self.state.encounter.status == AlienStatus::Listening {
            log::debug!("Alien {} got bored waiting for a question", encounter);
            self.depart(at);
        }
    }

    pub(super) fn on_chat_deadline(&mut self, encounter: u32, at: u64) {
        if self.owns(encounter) && self.state.encounter.status == AlienStatus::Thinking {
            let deadline = self.tuning.chat_deadline_ms;
            self.apply_reply(Err(ChatError::Timeout(deadline)), at);
        }
    }

    pub(super) fn on_departure(&mut self, encounter: u32, at: u64) {
        if self.owns(encounter) && self.state.encounter.status == AlienStatus::Talking {
            self.depart(at);
        }
    }

    pub(super) fn on_goodbye(&mut self, encounter: u32, at: u64) {
        if self.owns(encounter) && self.state.encounter.status == AlienStatus::Hit {
            self.hide_and_reschedule(at);
        }
    }

    fn ask(&mut self, question: &str, at: u64) -> bool {
        if !self.state.is_playing()
            || !self.state.encounter.visible
            || self.state.encounter.status != AlienStatus::Listening
        {
            return false;
        }
        let question = question.trim();
        if question.is_empty() {
            return false;
        }

        let encounter_id = self.state.encounter.id;
        self.timers.cancel(TimerSlot::Patience);
        self.state.encounter.status = AlienStatus::Thinking;
        self.emit(GameEvent::ChatRequest {
            encounter_id,
            prompt: build_prompt(question),
        });
        self.timers.arm(
            TimerSlot::ChatDeadline,
            at,
            self.tuning.chat_deadline_ms,
            Some(encounter_id),
        );
        true
    }

    fn apply_reply(&mut self, reply: Result<String, ChatError>, at: u64) {
        let encounter_id = self.state.encounter.id;
        let reply = reply.and_then(|text| {
            let text = text.trim();
            if text.is_empty() {
                Err(ChatError::Empty)
            } else {
                Ok(text.to_string())
            }
        });

        let reading_ms = match reply {
            Ok(text) => {
                let reading_ms = self.tuning.reading_time_ms(&text);
                self.state.encounter.message = Some(text);
                self.emit(GameEvent::Sound(SoundCue::Talk));
                reading_ms
            }
            Err(err) => {
                log::warn!("Alien {} chat failed: {}", encounter_id, err);
                self.state.encounter.message = Some(FALLBACK_REPLY.to_string());
                self.tuning.fallback_reading_ms
            }
        };

        self.state.encounter.status = AlienStatus::Talking;
        self.timers
            .arm(TimerSlot::Departure, at, reading_ms, Some(encounter_id));
    }

    /// Wave goodbye: drop the message, resume the countdown, vanish shortly after
    fn depart(&mut self, at: u64) {
        if !self.state.encounter.visible {
            return;
        }
        let encounter_id = self.state.encounter.id;
        for slot in [
            TimerSlot::HitFollowUp,
            TimerSlot::Patience,
            TimerSlot::ChatDeadline,
            TimerSlot::Departure,
        ] {
            self.timers.cancel(slot);
        }

        self.state.encounter.message = None;
        self.state.encounter.status = AlienStatus::Hit;
        self.set_paused(false, at);
        self.timers.arm(
            TimerSlot::Goodbye,
            at,
            self.tuning.goodbye_ms,
            Some(encounter_id),
        );
    }

    fn show_feedback(&mut self, kind: FeedbackKind, text: String, duration_ms: u64, at: u64) {
        self.state.feedback = Some(Feedback { kind, text });
        self.timers.arm(TimerSlot::Feedback, at, duration_ms, None);
    }

    pub(super) fn on_feedback_expired(&mut self) {
        self.state.feedback = None;
    }
}
