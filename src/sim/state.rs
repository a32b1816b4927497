//! Session state and core data types
//!
//! Plain data only; every mutation goes through the transitions on [`super::Game`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::audio::SoundCue;
use crate::consts::{LOW_TIME_SECS, SESSION_DURATION_SECS, STREAK_BANNER_MIN};

/// Which screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Screen {
    /// Title card while the camera warms up
    Splash,
    Menu,
    HowTo,
    Settings,
    /// Session running, aliens spawning
    Playing,
    /// Session over, stats on display
    Results,
}

/// Behavioral state of the alien
///
/// "Departed" is not a status: a departed alien is simply not visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlienStatus {
    /// Waving, waiting for the player to wave back
    #[default]
    Idle,
    /// Waved back in time (also the goodbye pose)
    Hit,
    /// Gave up waiting
    Missed,
    /// Waiting for a question
    Listening,
    /// Waiting on the chat backend
    Thinking,
    /// Showing its reply
    Talking,
}

impl AlienStatus {
    /// Listening, Thinking or Talking
    pub fn is_conversational(&self) -> bool {
        matches!(
            self,
            AlienStatus::Listening | AlienStatus::Thinking | AlienStatus::Talking
        )
    }
}

/// One alien, from portal to departure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Encounter {
    /// Increases with every spawn; 0 before the first
    pub id: u32,
    pub visible: bool,
    pub status: AlienStatus,
    /// Normalized screen position (x = left, y = top)
    pub position: Vec2,
    /// Clock time the alien became visible
    pub spawned_at_ms: u64,
    /// Reply text, only while Talking
    pub message: Option<String>,
}

impl Encounter {
    /// Visible and still waiting for a wave
    pub fn is_waiting(&self) -> bool {
        self.visible && self.status == AlienStatus::Idle
    }
}

/// Running totals for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GameStats {
    pub score: u64,
    pub successful_hits: u32,
    pub misses: u32,
    pub longest_streak: u32,
    /// Filled in when the session ends
    pub average_reaction_time_ms: u64,
    /// Aliens spawned this session
    pub encounters: u32,
}

/// Flavor of transient feedback text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    Points,
    TooSlow,
}

/// Transient text over the alien ("+600", "Too Slow!")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub text: String,
}

/// Complete session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub screen: Screen,
    /// Whole seconds left on the countdown
    pub time_remaining: u32,
    pub stats: GameStats,
    /// Consecutive hits without a miss
    pub streak: u32,
    /// Countdown frozen while the alien chats
    pub paused: bool,
    pub encounter: Encounter,
    /// Reaction latency of every hit, in order
    pub reaction_times: Vec<u64>,
    pub feedback: Option<Feedback>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            screen: Screen::Splash,
            time_remaining: SESSION_DURATION_SECS,
            stats: GameStats::default(),
            streak: 0,
            paused: false,
            encounter: Encounter::default(),
            reaction_times: Vec::new(),
            feedback: None,
        }
    }
}

impl SessionState {
    /// Fresh session on the given screen
    pub fn new(screen: Screen, duration_secs: u32) -> Self {
        Self {
            screen,
            time_remaining: duration_secs,
            ..Default::default()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.screen == Screen::Playing
    }

    /// HUD: timer turns red
    pub fn is_time_low(&self) -> bool {
        self.is_playing() && self.time_remaining <= LOW_TIME_SECS
    }

    /// HUD: "STREAK!" banner
    pub fn show_streak_banner(&self) -> bool {
        self.streak > STREAK_BANNER_MIN
    }
}

/// Side effects produced by a transition, for the driver to carry out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Play a sound cue
    Sound(SoundCue),
    /// Vibrate for this many milliseconds
    Vibrate { ms: u32 },
    /// Give the chat box keyboard focus
    FocusChatInput,
    /// Ask the chat collaborator; answer with [`super::Game::chat_reply`]
    ChatRequest { encounter_id: u32, prompt: String },
    /// Screen changed
    ScreenChanged(Screen),
    /// Session finished with these final stats
    SessionEnded(GameStats),
}

/// Serializable view of the session for HUD/overlay rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub now_ms: u64,
    pub screen: Screen,
    pub time_remaining: u32,
    pub time_low: bool,
    pub stats: GameStats,
    pub streak: u32,
    pub streak_banner: bool,
    pub paused: bool,
    pub encounter: Encounter,
    pub feedback: Option<Feedback>,
}
