//! Wave Back - wave at the alien hiding in your camera feed
//!
//! Core modules:
//! - `sim`: Deterministic session engine (timers, encounters, scoring)
//! - `tuning`: Data-driven timings and balance
//! - `settings`: Player preferences
//! - `audio` / `haptics` / `chat`: Injected collaborators
//! - `runtime`: Native tokio driver (not built for wasm)

pub mod audio;
pub mod chat;
pub mod error;
pub mod haptics;
#[cfg(not(target_arch = "wasm32"))]
pub mod runtime;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{ChatError, TuningError};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants (defaults for [`Tuning`])
pub mod consts {
    /// Session length in seconds
    pub const SESSION_DURATION_SECS: u32 = 60;
    /// Countdown granularity
    pub const COUNTDOWN_TICK_MS: u64 = 1000;
    /// Splash screen hold before the menu appears
    pub const SPLASH_MS: u64 = 2000;

    /// Delay between encounters is drawn uniformly from this range
    pub const SPAWN_MIN_INTERVAL_MS: u64 = 2000;
    pub const SPAWN_MAX_INTERVAL_MS: u64 = 5000;
    /// How long an idle alien waits for a wave before leaving
    pub const MISS_TIMEOUT_MS: u64 = 4000;
    /// Portal cue plays at spawn, the spawn ping this much later
    pub const SPAWN_CUE_DELAY_MS: u64 = 300;

    /// Alien lingers this long after a miss before vanishing
    pub const MISS_GRACE_MS: u64 = 600;
    pub const MISS_FEEDBACK_MS: u64 = 1000;
    pub const HIT_FEEDBACK_MS: u64 = 800;
    /// Hit pose hold before the alien starts listening
    pub const HIT_FOLLOW_UP_MS: u64 = 800;
    /// Time the player has to type a question
    pub const PATIENCE_MS: u64 = 8000;
    /// Upper bound on a pending chat reply
    pub const CHAT_DEADLINE_MS: u64 = 8000;
    /// Reading time per reply character, with a floor
    pub const READING_MS_PER_CHAR: u64 = 100;
    pub const MIN_READING_MS: u64 = 2000;
    /// Reading time for the fallback line when chat fails
    pub const FALLBACK_READING_MS: u64 = 2000;
    /// Goodbye pose hold before the alien vanishes
    pub const GOODBYE_MS: u64 = 500;

    /// Scoring
    pub const BASE_POINTS: u64 = 100;
    pub const MAX_TIME_BONUS: u64 = 500;
    pub const STREAK_BONUS: u64 = 50;
    pub const POINTS_ROUNDING: u64 = 10;

    /// Haptic pulse on a successful hit
    pub const HAPTIC_PULSE_MS: u32 = 50;

    /// HUD warns when this many seconds remain
    pub const LOW_TIME_SECS: u32 = 10;
    /// HUD shows the streak banner above this streak
    pub const STREAK_BANNER_MIN: u32 = 2;

    /// Spawn area in normalized screen space (x = left, y = top)
    pub const SPAWN_X_RANGE: (f32, f32) = (0.20, 0.80);
    pub const SPAWN_Y_RANGE: (f32, f32) = (0.20, 0.60);

    /// Device tilt is clamped to +/- this many degrees per axis
    pub const PARALLAX_LIMIT: f32 = 20.0;
    pub const PARALLAX_SCALE: f32 = 0.6;
    /// Front/back tilt considered "level" when holding a phone
    pub const PARALLAX_NEUTRAL_BETA: f32 = 45.0;
}

/// Parallax offset from device orientation (gamma = left/right, beta = front/back)
///
/// Purely cosmetic: the session engine never reads it.
#[inline]
pub fn parallax_offset(gamma: f32, beta: f32, tuning: &Tuning) -> Vec2 {
    let limit = tuning.parallax_limit;
    let clamp = |v: f32| {
        if v.is_finite() {
            v.clamp(-limit, limit)
        } else {
            0.0
        }
    };
    Vec2::new(
        clamp(gamma) * tuning.parallax_scale,
        clamp(beta - tuning.parallax_neutral_beta) * tuning.parallax_scale,
    )
}

/// Map a normalized position to CSS percentages (`left`, `top`)
#[inline]
pub fn to_percent(pos: Vec2) -> (f32, f32) {
    ((pos.x * 100.0).round(), (pos.y * 100.0).round())
}
