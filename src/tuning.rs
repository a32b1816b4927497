//! Data-driven game balance
//!
//! Every timing the session engine uses lives here so that tests (and the demo)
//! can compress or stretch a session without touching the state machine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;

/// Timings, scoring and cosmetic limits for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub session_duration_secs: u32,
    pub countdown_tick_ms: u64,
    pub splash_ms: u64,

    // === Spawning ===
    pub spawn_min_interval_ms: u64,
    pub spawn_max_interval_ms: u64,
    pub miss_timeout_ms: u64,
    pub spawn_cue_delay_ms: u64,

    // === Encounter ===
    pub miss_grace_ms: u64,
    pub miss_feedback_ms: u64,
    pub hit_feedback_ms: u64,
    pub hit_follow_up_ms: u64,
    /// Hit aliens stop to chat when enabled; otherwise they wave goodbye right away
    pub conversation_enabled: bool,
    pub patience_ms: u64,
    pub chat_deadline_ms: u64,
    pub reading_ms_per_char: u64,
    pub min_reading_ms: u64,
    pub fallback_reading_ms: u64,
    pub goodbye_ms: u64,

    // === Feedback ===
    pub haptic_pulse_ms: u32,

    // === Parallax ===
    pub parallax_limit: f32,
    pub parallax_scale: f32,
    pub parallax_neutral_beta: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            session_duration_secs: SESSION_DURATION_SECS,
            countdown_tick_ms: COUNTDOWN_TICK_MS,
            splash_ms: SPLASH_MS,

            spawn_min_interval_ms: SPAWN_MIN_INTERVAL_MS,
            spawn_max_interval_ms: SPAWN_MAX_INTERVAL_MS,
            miss_timeout_ms: MISS_TIMEOUT_MS,
            spawn_cue_delay_ms: SPAWN_CUE_DELAY_MS,

            miss_grace_ms: MISS_GRACE_MS,
            miss_feedback_ms: MISS_FEEDBACK_MS,
            hit_feedback_ms: HIT_FEEDBACK_MS,
            hit_follow_up_ms: HIT_FOLLOW_UP_MS,
            conversation_enabled: true,
            patience_ms: PATIENCE_MS,
            chat_deadline_ms: CHAT_DEADLINE_MS,
            reading_ms_per_char: READING_MS_PER_CHAR,
            min_reading_ms: MIN_READING_MS,
            fallback_reading_ms: FALLBACK_READING_MS,
            goodbye_ms: GOODBYE_MS,

            haptic_pulse_ms: HAPTIC_PULSE_MS,

            parallax_limit: PARALLAX_LIMIT,
            parallax_scale: PARALLAX_SCALE,
            parallax_neutral_beta: PARALLAX_NEUTRAL_BETA,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the session engine cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.session_duration_secs == 0 {
            return Err(invalid("session_duration_secs", "must be greater than zero"));
        }
        if self.countdown_tick_ms == 0 {
            return Err(invalid("countdown_tick_ms", "must be greater than zero"));
        }
        if self.spawn_min_interval_ms > self.spawn_max_interval_ms {
            return Err(invalid(
                "spawn_min_interval_ms",
                format!(
                    "{} exceeds spawn_max_interval_ms {}",
                    self.spawn_min_interval_ms, self.spawn_max_interval_ms
                ),
            ));
        }
        if self.miss_timeout_ms == 0 {
            return Err(invalid("miss_timeout_ms", "must be greater than zero"));
        }
        if self.chat_deadline_ms == 0 {
            return Err(invalid("chat_deadline_ms", "must be greater than zero"));
        }
        if !(self.parallax_limit.is_finite() && self.parallax_limit >= 0.0) {
            return Err(invalid("parallax_limit", "must be a non-negative number"));
        }
        Ok(())
    }

    /// Reading time before a replying alien departs
    pub fn reading_time_ms(&self, reply: &str) -> u64 {
        let chars = reply.chars().count() as u64;
        chars
            .saturating_mul(self.reading_ms_per_char)
            .max(self.min_reading_ms)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TuningError {
    TuningError::Invalid {
        field,
        reason: reason.into(),
    }
}
