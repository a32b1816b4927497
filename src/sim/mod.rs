//! Deterministic session engine
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied clock only
//! - Seeded RNG only
//! - Timers fire in (deadline, arm order)
//! - No DOM, audio or network dependencies

pub mod encounter;
pub mod engine;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod state;
pub mod tick;
pub mod timers;

pub use encounter::Hit;
pub use engine::Game;
pub use scoring::{average_reaction_ms, points_for_hit};
pub use state::{
    AlienStatus, Encounter, Feedback, FeedbackKind, GameEvent, GameStats, Screen, SessionState,
    Snapshot,
};
pub use tick::{InputOutcome, PlayerInput};
pub use timers::{Timer, TimerId, TimerQueue, TimerSlot};
