//! Sound cues
//!
//! The session engine only names cues; a [`CueSink`] decides what to do with
//! them. On the web the cues are generated procedurally with Web Audio
//! oscillators - no external files needed!

use serde::{Deserialize, Serialize};

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundCue {
    /// Portal opens where the alien will appear
    Portal,
    /// Alien pops out of the portal
    Spawn,
    /// Player waved in time
    Success,
    /// Alien left without a wave
    Miss,
    /// Menu / start button
    Click,
    /// Session over
    GameOver,
    /// Alien starts talking
    Talk,
}

impl SoundCue {
    pub const ALL: [SoundCue; 7] = [
        SoundCue::Portal,
        SoundCue::Spawn,
        SoundCue::Success,
        SoundCue::Miss,
        SoundCue::Click,
        SoundCue::GameOver,
        SoundCue::Talk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Portal => "portal",
            SoundCue::Spawn => "spawn",
            SoundCue::Success => "success",
            SoundCue::Miss => "miss",
            SoundCue::Click => "click",
            SoundCue::GameOver => "gameover",
            SoundCue::Talk => "talk",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cue| cue.as_str().eq_ignore_ascii_case(s))
    }
}

/// Fire-and-forget cue playback. Implementations must swallow their own failures.
pub trait CueSink {
    fn play(&self, cue: SoundCue);
}

/// Plays nothing (tests, headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCueSink;

impl CueSink for NullCueSink {
    fn play(&self, _cue: SoundCue) {}
}

/// Writes cues to the log instead of a speaker
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCueSink;

impl CueSink for LogCueSink {
    fn play(&self, cue: SoundCue) {
        log::debug!("cue: {}", cue.as_str());
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{CueSink, SoundCue};
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        volume: f32,
        sound_enabled: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Web Audio API not supported - audio disabled");
            }
            Self {
                ctx,
                volume: 1.0,
                sound_enabled: true,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        /// Pick up the sound toggle from player settings
        pub fn apply_settings(&mut self, settings: &Settings) {
            self.sound_enabled = settings.sound_enabled;
        }

        fn effective_volume(&self) -> f32 {
            if self.sound_enabled { self.volume } else { 0.0 }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Portal - swirling sweep up and back down
        fn play_portal(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 100.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(100.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(800.0, t + 0.3)
                .ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(100.0, t + 0.6)
                .ok();
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(vol * 0.3, t + 0.1)
                .ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.6).ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.6).ok();
        }

        /// Spawn - high ping
        fn play_spawn(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 800.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(800.0, t).ok();
            osc.frequency()
                .linear_ramp_to_value_at_time(1200.0, t + 0.1)
                .ok();
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(vol * 0.2, t + 0.05)
                .ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        /// Success - major chord arpeggio (C5 E5 G5)
        fn play_success(&self, ctx: &AudioContext, vol: f32) {
            for (freq, offset, duration) in [(523.25, 0.0, 0.1), (659.25, 0.1, 0.1), (783.99, 0.2, 0.2)]
            {
                self.play_note(ctx, vol, freq, offset, duration, OscillatorType::Sine);
            }
        }

        /// Miss - low disappointed buzz
        fn play_miss(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 150.0, OscillatorType::Sawtooth) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(150.0, t).ok();
            osc.frequency()
                .linear_ramp_to_value_at_time(100.0, t + 0.3)
                .ok();
            gain.gain().set_value_at_time(vol * 0.2, t).ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.3).ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        /// Click - short blip
        fn play_click(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 800.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.1, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.05)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.05).ok();
        }

        /// Game over - long slide down
        fn play_game_over(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 400.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            osc.frequency().set_value_at_time(400.0, t).ok();
            osc.frequency()
                .linear_ramp_to_value_at_time(100.0, t + 1.0)
                .ok();
            gain.gain().set_value_at_time(vol * 0.3, t).ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 1.0).ok();

            osc.start().ok();
            osc.stop_with_when(t + 1.0).ok();
        }

        /// Talk - alien chatter blips
        fn play_talk(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [660.0, 520.0, 740.0, 600.0].iter().enumerate() {
                let offset = i as f64 * 0.07;
                self.play_note(ctx, vol * 0.6, *freq, offset, 0.06, OscillatorType::Square);
            }
        }

        fn play_note(
            &self,
            ctx: &AudioContext,
            vol: f32,
            freq: f32,
            offset: f64,
            duration: f64,
            osc_type: OscillatorType,
        ) {
            let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + offset;

            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(vol * 0.2, t + 0.05)
                .ok();
            gain.gain()
                .linear_ramp_to_value_at_time(0.0, t + duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + duration).ok();
        }
    }

    impl CueSink for AudioManager {
        fn play(&self, cue: SoundCue) {
            let vol = self.effective_volume();
            if vol <= 0.0 {
                return;
            }

            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match cue {
                SoundCue::Portal => self.play_portal(ctx, vol),
                SoundCue::Spawn => self.play_spawn(ctx, vol),
                SoundCue::Success => self.play_success(ctx, vol),
                SoundCue::Miss => self.play_miss(ctx, vol),
                SoundCue::Click => self.play_click(ctx, vol),
                SoundCue::GameOver => self.play_game_over(ctx, vol),
                SoundCue::Talk => self.play_talk(ctx, vol),
            }
        }
    }
}
