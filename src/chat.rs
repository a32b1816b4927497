//! Chat with the alien
//!
//! After a successful wave the alien listens for a question. The session engine
//! only builds the prompt and waits for an answer; whoever drives the engine
//! calls a [`ChatClient`] and hands the result back.

use std::sync::Mutex;

use async_trait::async_trait;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::ChatError;

/// Line shown when the chat backend fails or runs out of time
pub const FALLBACK_REPLY: &str = "Bzzt... my translator is glitching. Gotta zoom, human!";

/// Longest question forwarded to the backend, in characters
pub const MAX_QUESTION_CHARS: usize = 200;

const PERSONA: &str = "You are a small, friendly alien who just popped out of a portal \
    in a human's camera feed. Answer in one or two short, playful sentences \
    (under 25 words). Never break character.";

const QUESTION_MARKER: &str = "Human asks:";

/// Wrap the player's question in the alien persona
pub fn build_prompt(question: &str) -> String {
    let question: String = question.trim().chars().take(MAX_QUESTION_CHARS).collect();
    format!("{PERSONA}\n{QUESTION_MARKER} {question}\nAlien replies:")
}

/// Recover the player's question from a prompt built by [`build_prompt`]
pub fn question_from_prompt(prompt: &str) -> &str {
    prompt
        .rsplit_once(QUESTION_MARKER)
        .map(|(_, rest)| rest)
        .unwrap_or(prompt)
        .split('\n')
        .next()
        .unwrap_or("")
        .trim()
}

/// Prompt in, reply out. May fail; failures are never fatal to a session.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn ask(&self, prompt: &str) -> Result<String, ChatError>;
}

/// Offline chat: canned alien lines, picked by keyword or at random
pub struct PhrasebookChat {
    rng: Mutex<Pcg32>,
}

const GREETINGS: &[&str] = &[
    "Greetings, carbon friend! Your planet smells like toast.",
    "Blip blop! I come in peace and also for snacks.",
    "Your waving technique is excellent. Ten out of ten tentacles.",
    "I must return to the mothership before my parking meter expires.",
];

const KEYWORDS: &[(&[&str], &str)] = &[
    (&["name", "who are"], "I am Zib of the Seventh Nebula. You may call me Zib."),
    (&["where", "from", "home"], "Far, far away. Left at Jupiter, then straight on till morning."),
    (&["eat", "food", "hungry"], "Mostly starlight. Sometimes pizza, when nobody is looking."),
    (&["why", "here"], "Research! Humans waving at screens is fascinating behavior."),
    (&["friend", "love", "like"], "Yes! You are now my favorite human on this rock."),
];

impl PhrasebookChat {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(Pcg32::seed_from_u64(seed)),
        }
    }

    /// Pick the reply for a question (no I/O, no delay)
    pub fn reply_to(&self, question: &str) -> String {
        let lowered = question.to_lowercase();
        if let Some((_, reply)) = KEYWORDS
            .iter()
            .find(|(words, _)| words.iter().any(|w| lowered.contains(w)))
        {
            return (*reply).to_string();
        }

        let idx = match self.rng.lock() {
            Ok(mut rng) => rng.random_range(0..GREETINGS.len()),
            Err(_) => 0,
        };
        GREETINGS[idx].to_string()
    }
}

impl Default for PhrasebookChat {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl ChatClient for PhrasebookChat {
    async fn ask(&self, prompt: &str) -> Result<String, ChatError> {
        let question = question_from_prompt(prompt);
        if question.is_empty() {
            return Err(ChatError::Empty);
        }
        Ok(self.reply_to(question))
    }
}

/// No backend configured; every request fails and the fallback line is used
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableChat;

#[async_trait]
impl ChatClient for UnavailableChat {
    async fn ask(&self, _prompt: &str) -> Result<String, ChatError> {
        Err(ChatError::Failed("no chat backend configured".to_string()))
    }
}
