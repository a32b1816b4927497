//! Clock advance and input dispatch
//!
//! Drivers call [`Game::advance`] whenever time passes (every animation frame, or
//! when the next deadline is reached) and [`Game::handle`] for player input.

use super::encounter::Hit;
use super::engine::Game;
use super::state::GameEvent;
use super::timers::{Timer, TimerSlot};
use crate::settings::SettingToggle;

/// Player input, as delivered by the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerInput {
    /// Tap on the splash screen
    SkipSplash,
    /// Play / play again
    Start,
    HowTo,
    OpenSettings,
    Menu,
    Toggle(SettingToggle),
    /// The big "Wave Back" button
    Wave,
    /// Question typed into the chat box
    Ask(String),
    /// Chat box closed without asking
    DismissChat,
    /// In-game quit button
    Quit,
}

/// What an input did, beyond its side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    Hit(Hit),
    QuestionAccepted,
    Ignored,
    Applied,
}

impl Game {
    /// Fire every timer due by `now_ms`, oldest deadline first
    pub fn advance(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.fire_due(now_ms);
        self.take_events()
    }

    /// Route one player input to its transition
    pub fn handle(&mut self, input: PlayerInput, now_ms: u64) -> (InputOutcome, Vec<GameEvent>) {
        match input {
            PlayerInput::SkipSplash => (InputOutcome::Applied, self.skip_splash(now_ms)),
            PlayerInput::Start => (InputOutcome::Applied, self.start_session(now_ms)),
            PlayerInput::HowTo => (InputOutcome::Applied, self.open_how_to(now_ms)),
            PlayerInput::OpenSettings => (InputOutcome::Applied, self.open_settings(now_ms)),
            PlayerInput::Menu => (InputOutcome::Applied, self.return_to_menu(now_ms)),
            PlayerInput::Toggle(which) => {
                (InputOutcome::Applied, self.toggle_setting(which, now_ms))
            }
            PlayerInput::Wave => match self.wave(now_ms) {
                (Some(hit), events) => (InputOutcome::Hit(hit), events),
                (None, events) => (InputOutcome::Ignored, events),
            },
            PlayerInput::Ask(question) => match self.submit_question(&question, now_ms) {
                (true, events) => (InputOutcome::QuestionAccepted, events),
                (false, events) => (InputOutcome::Ignored, events),
            },
            PlayerInput::DismissChat => (InputOutcome::Applied, self.dismiss_chat(now_ms)),
            PlayerInput::Quit => (InputOutcome::Applied, self.end_session(now_ms)),
        }
    }

    /// Fire due timers and move the clock to `now_ms` (never backwards).
    /// Returns the clock value transitions should use.
    pub(super) fn fire_due(&mut self, now_ms: u64) -> u64 {
        let target = now_ms.max(self.now_ms);
        while let Some(timer) = self.timers.pop_due(target) {
            self.now_ms = self.now_ms.max(timer.due_ms);
            self.dispatch(timer);
        }
        self.now_ms = target;
        target
    }

    fn dispatch(&mut self, timer: Timer) {
        let at = self.now_ms;
        let encounter = timer.encounter.unwrap_or_default();
        match timer.slot {
            TimerSlot::Splash => self.on_splash_done(at),
            TimerSlot::Countdown => self.on_countdown(at),
            TimerSlot::Spawn => self.spawn(at),
            TimerSlot::SpawnCue => self.on_spawn_cue(encounter),
            TimerSlot::MissTimeout => self.on_miss_timeout(encounter, at),
            TimerSlot::MissGrace => self.on_miss_grace(encounter, at),
            TimerSlot::HitFollowUp => self.on_hit_follow_up(encounter, at),
            TimerSlot::Patience => self.on_patience(encounter, at),
            TimerSlot::ChatDeadline => self.on_chat_deadline(encounter, at),
            TimerSlot::Departure => self.on_departure(encounter, at),
            TimerSlot::Goodbye => self.on_goodbye(encounter, at),
            TimerSlot::Feedback => self.on_feedback_expired(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SoundCue;
    use crate::error::ChatError;
    use crate::settings::Settings;
    use crate::sim::{AlienStatus, FeedbackKind, Screen};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn playing(seed: u64, tuning: Tuning) -> (Game, u64) {
        let mut game = Game::new(seed, tuning, Settings::default(), 0);
        game.start_session(0);
        let due = game.timers().get(TimerSlot::Spawn).unwrap().due_ms;
        game.advance(due);
        assert!(game.state().encounter.is_waiting());
        (game, due)
    }

    fn chat_request(events: &[GameEvent]) -> Option<(u32, String)> {
        events.iter().find_map(|e| match e {
            GameEvent::ChatRequest {
                encounter_id,
                prompt,
            } => Some((*encounter_id, prompt.clone())),
            _ => None,
        })
    }

    #[test]
    fn test_instant_wave_scores_600() {
        let (mut game, spawned) = playing(1, Tuning::default());
        let (hit, events) = game.wave(spawned);
        let hit = hit.unwrap();
        assert_eq!(hit.reaction_ms, 0);
        assert_eq!(hit.points, 600);
        assert_eq!(game.state().stats.score, 600);
        assert_eq!(game.state().stats.successful_hits, 1);
        assert_eq!(game.state().stats.longest_streak, 1);
        assert_eq!(game.state().encounter.status, AlienStatus::Hit);
        assert!(events.contains(&GameEvent::Sound(SoundCue::Success)));
        assert!(events.contains(&GameEvent::Vibrate { ms: 50 }));
        assert!(!game.timers().is_armed(TimerSlot::MissTimeout));

        let feedback = game.state().feedback.clone().unwrap();
        assert_eq!(feedback.kind, FeedbackKind::Points);
        assert_eq!(feedback.text, "+600");
        game.advance(spawned + 800);
        assert_eq!(game.state().feedback, None);
    }

    #[test]
    fn test_vibration_setting_gates_pulse() {
        let settings = Settings {
            vibration_enabled: false,
            ..Settings::default()
        };
        let mut game = Game::new(1, Tuning::default(), settings, 0);
        game.start_session(0);
        let due = game.timers().get(TimerSlot::Spawn).unwrap().due_ms;
        game.advance(due);
        let (hit, events) = game.wave(due + 100);
        assert!(hit.is_some());
        assert!(!events.iter().any(|e| matches!(e, GameEvent::Vibrate { .. })));
    }

    #[test]
    fn test_wave_at_miss_boundary_is_a_miss() {
        let (mut game, spawned) = playing(2, Tuning::default());
        let (hit, events) = game.wave(spawned + 4000);
        assert_eq!(hit, None);
        assert_eq!(game.state().encounter.status, AlienStatus::Missed);
        assert_eq!(game.state().stats.misses, 1);
        assert_eq!(game.state().stats.successful_hits, 0);
        assert!(events.contains(&GameEvent::Sound(SoundCue::Miss)));
    }

    #[test]
    fn test_wave_just_before_boundary_is_a_hit() {
        let (mut game, spawned) = playing(2, Tuning::default());
        let (hit, _) = game.wave(spawned + 3999);
        assert_eq!(hit.unwrap().points, 100);
        // The cancelled timeout never fires
        game.advance(spawned + 5000);
        assert_eq!(game.state().stats.misses, 0);
    }

    #[test]
    fn test_miss_resets_streak_and_reschedules() {
        let (mut game, spawned) = playing(4, Tuning::default());
        game.state.streak = 3;
        game.advance(spawned + 4000);
        assert_eq!(game.state().streak, 0);
        assert_eq!(
            game.state().feedback.as_ref().map(|f| f.kind),
            Some(FeedbackKind::TooSlow)
        );
        assert!(game.state().encounter.visible);

        game.advance(spawned + 4600);
        assert!(!game.state().encounter.visible);
        let spawn = game.timers().get(TimerSlot::Spawn).unwrap();
        assert!((spawned + 6600..=spawned + 9600).contains(&spawn.due_ms));
    }

    #[test]
    fn test_double_wave_counts_once() {
        let (mut game, spawned) = playing(6, Tuning::default());
        assert!(game.wave(spawned + 200).0.is_some());
        assert!(game.wave(spawned + 210).0.is_none());
        assert_eq!(game.state().stats.successful_hits, 1);
        assert_eq!(game.state().streak, 1);
    }

    #[test]
    fn test_conversation_happy_path() {
        let (mut game, spawned) = playing(8, Tuning::default());
        game.wave(spawned + 100);

        let events = game.advance(spawned + 900);
        assert_eq!(game.state().encounter.status, AlienStatus::Listening);
        assert!(game.state().paused);
        assert!(events.contains(&GameEvent::FocusChatInput));
        assert!(!game.timers().is_armed(TimerSlot::Countdown));

        let (accepted, events) = game.submit_question("where are you from?", spawned + 2000);
        assert!(accepted);
        assert_eq!(game.state().encounter.status, AlienStatus::Thinking);
        let (encounter_id, prompt) = chat_request(&events).unwrap();
        assert!(prompt.contains("where are you from?"));
        assert!(!game.timers().is_armed(TimerSlot::Patience));

        let reply = "Left at Jupiter!".to_string();
        let events = game.chat_reply(encounter_id, Ok(reply.clone()), spawned + 2500);
        assert_eq!(game.state().encounter.status, AlienStatus::Talking);
        assert_eq!(game.state().encounter.message.as_deref(), Some("Left at Jupiter!"));
        assert!(events.contains(&GameEvent::Sound(SoundCue::Talk)));
        // 16 chars -> 2000 ms floor
        assert_eq!(
            game.timers().get(TimerSlot::Departure).unwrap().due_ms,
            spawned + 4500
        );

        game.advance(spawned + 4500);
        assert_eq!(game.state().encounter.status, AlienStatus::Hit);
        assert_eq!(game.state().encounter.message, None);
        assert!(!game.state().paused);
        assert!(game.state().encounter.visible);

        game.advance(spawned + 5000);
        assert!(!game.state().encounter.visible);
        assert!(game.timers().is_armed(TimerSlot::Spawn));
        // Conversation does not touch the streak
        assert_eq!(game.state().streak, 1);
    }

    #[test]
    fn test_long_reply_reads_longer() {
        let (mut game, spawned) = playing(9, Tuning::default());
        game.wave(spawned);
        game.advance(spawned + 800);
        let (_, events) = game.submit_question("tell me everything", spawned + 1000);
        let (id, _) = chat_request(&events).unwrap();
        game.chat_reply(id, Ok("z".repeat(45)), spawned + 1200);
        assert_eq!(
            game.timers().get(TimerSlot::Departure).unwrap().due_ms,
            spawned + 1200 + 4500
        );
    }

    #[test]
    fn test_chat_failure_uses_fallback_and_departs() {
        let (mut game, spawned) = playing(10, Tuning::default());
        game.wave(spawned);
        game.advance(spawned + 800);
        let (_, events) = game.submit_question("hello?", spawned + 1000);
        let (id, _) = chat_request(&events).unwrap();

        let events = game.chat_reply(id, Err(ChatError::Failed("503".into())), spawned + 1500);
        assert!(!events.contains(&GameEvent::Sound(SoundCue::Talk)));
        assert_eq!(game.state().encounter.status, AlienStatus::Talking);
        assert_eq!(
            game.state().encounter.message.as_deref(),
            Some(crate::chat::FALLBACK_REPLY)
        );

        game.advance(spawned + 3500);
        assert_eq!(game.state().encounter.status, AlienStatus::Hit);
        game.advance(spawned + 4000);
        assert!(!game.state().encounter.visible);
        assert!(game.timers().is_armed(TimerSlot::Spawn));
    }

    #[test]
    fn test_empty_reply_counts_as_failure() {
        let (mut game, spawned) = playing(10, Tuning::default());
        game.wave(spawned);
        game.advance(spawned + 800);
        let (_, events) = game.submit_question("hi", spawned + 900);
        let (id, _) = chat_request(&events).unwrap();
        game.chat_reply(id, Ok("   ".into()), spawned + 1000);
        assert_eq!(
            game.state().encounter.message.as_deref(),
            Some(crate::chat::FALLBACK_REPLY)
        );
    }

    #[test]
    fn test_chat_deadline_bounds_thinking() {
        let (mut game, spawned) = playing(12, Tuning::default());
        game.wave(spawned);
        game.advance(spawned + 800);
        let (_, events) = game.submit_question("are you there?", spawned + 1000);
        let (id, _) = chat_request(&events).unwrap();

        game.advance(spawned + 9000);
        assert_eq!(game.state().encounter.status, AlienStatus::Talking);
        assert_eq!(
            game.state().encounter.message.as_deref(),
            Some(crate::chat::FALLBACK_REPLY)
        );

        // The real reply arrives too late and is dropped
        let events = game.chat_reply(id, Ok("sorry, lag".into()), spawned + 9100);
        assert!(events.is_empty());
        assert_eq!(
            game.state().encounter.message.as_deref(),
            Some(crate::chat::FALLBACK_REPLY)
        );
    }

    #[test]
    fn test_patience_runs_out() {
        let (mut game, spawned) = playing(14, Tuning::default());
        game.wave(spawned);
        game.advance(spawned + 800);
        assert!(game.state().paused);
        game.advance(spawned + 800 + 8000);
        assert_eq!(game.state().encounter.status, AlienStatus::Hit);
        assert!(!game.state().paused);
        game.advance(spawned + 800 + 8500);
        assert!(!game.state().encounter.visible);
    }

    #[test]
    fn test_blank_question_is_ignored() {
        let (mut game, spawned) = playing(15, Tuning::default());
        game.wave(spawned);
        game.advance(spawned + 800);
        let (accepted, events) = game.submit_question("   ", spawned + 900);
        assert!(!accepted);
        assert!(events.is_empty());
        assert_eq!(game.state().encounter.status, AlienStatus::Listening);
    }

    #[test]
    fn test_dismiss_chat_departs() {
        let (mut game, spawned) = playing(16, Tuning::default());
        game.wave(spawned);
        game.advance(spawned + 800);
        game.dismiss_chat(spawned + 1000);
        assert_eq!(game.state().encounter.status, AlienStatus::Hit);
        assert!(!game.timers().is_armed(TimerSlot::Patience));
    }

    #[test]
    fn test_conversation_disabled_departs_after_hit() {
        let tuning = Tuning {
            conversation_enabled: false,
            ..Tuning::default()
        };
        let (mut game, spawned) = playing(17, tuning);
        game.wave(spawned + 250);
        let events = game.advance(spawned + 1050);
        assert!(!events.contains(&GameEvent::FocusChatInput));
        assert!(!game.state().paused);
        assert_eq!(game.state().encounter.status, AlienStatus::Hit);
        game.advance(spawned + 1550);
        assert!(!game.state().encounter.visible);
    }

    #[test]
    fn test_countdown_frozen_while_chatting() {
        let (mut game, spawned) = playing(18, Tuning::default());
        game.wave(spawned);
        game.advance(spawned + 800);
        let frozen = game.state().time_remaining;
        game.advance(spawned + 6000);
        assert_eq!(game.state().time_remaining, frozen);
    }

    #[test]
    fn test_end_session_mid_conversation() {
        let (mut game, spawned) = playing(20, Tuning::default());
        game.wave(spawned + 300);
        game.advance(spawned + 1100);
        let (_, events) = game.submit_question("bye?", spawned + 1200);
        let (id, _) = chat_request(&events).unwrap();

        game.end_session(spawned + 1300);
        assert_eq!(game.state().screen, Screen::Results);
        assert!(!game.state().encounter.visible);
        assert!(!game.state().paused);
        assert!(game.timers().is_empty());
        assert_eq!(game.state().stats.average_reaction_time_ms, 300);

        // Nothing from the interrupted encounter runs afterwards
        let stats = game.state().stats;
        assert!(game.chat_reply(id, Ok("hi".into()), spawned + 1400).is_empty());
        assert!(game.advance(spawned + 60_000).is_empty());
        assert_eq!(game.state().stats, stats);
    }

    #[test]
    fn test_stale_encounter_timer_is_ignored() {
        let (mut game, spawned) = playing(21, Tuning::default());
        let first = game.state().encounter.id;
        // A timer for an encounter that no longer exists
        game.timers
            .arm(TimerSlot::MissTimeout, spawned, 10, Some(first + 40));
        game.advance(spawned + 10);
        assert_eq!(game.state().encounter.status, AlienStatus::Idle);
        assert_eq!(game.state().stats.misses, 0);
    }

    #[test]
    fn test_handle_routes_inputs() {
        let mut game = Game::with_seed(30);
        let (outcome, events) = game.handle(PlayerInput::SkipSplash, 0);
        assert_eq!(outcome, InputOutcome::Applied);
        assert!(events.contains(&GameEvent::ScreenChanged(Screen::Menu)));

        game.handle(PlayerInput::Start, 10);
        let due = game.timers().get(TimerSlot::Spawn).unwrap().due_ms;
        assert_eq!(game.handle(PlayerInput::Wave, due - 1).0, InputOutcome::Ignored);
        game.advance(due);
        assert!(matches!(
            game.handle(PlayerInput::Wave, due + 100).0,
            InputOutcome::Hit(Hit { points: 500, .. })
        ));
        game.advance(due + 900);
        assert_eq!(
            game.handle(PlayerInput::Ask("name?".into()), due + 1000).0,
            InputOutcome::QuestionAccepted
        );
        game.handle(PlayerInput::Quit, due + 1100);
        assert_eq!(game.state().screen, Screen::Results);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Wait(u64),
        Wave(u64),
        Ask(u64),
        Reply(u64, bool),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (1u64..6000).prop_map(Step::Wait),
            (0u64..1500).prop_map(Step::Wave),
            (0u64..1500).prop_map(Step::Ask),
            ((0u64..3000), any::<bool>()).prop_map(|(d, ok)| Step::Reply(d, ok)),
        ]
    }

    proptest! {
        #[test]
        fn prop_session_invariants(seed in any::<u64>(), steps in proptest::collection::vec(step(), 1..80)) {
            let mut game = Game::with_seed(seed);
            game.start_session(0);
            let mut now = 0u64;
            let mut hits = 0u32;
            let mut misses = 0u32;
            let mut longest = 0u32;
            let mut pending_chat: Option<u32> = None;

            for step in steps {
                let before = game.state().clone();
                let events = match step {
                    Step::Wait(d) => { now += d; game.advance(now) }
                    Step::Wave(d) => {
                        now += d;
                        let (hit, events) = game.wave(now);
                        if let Some(hit) = hit {
                            prop_assert_eq!(hit.streak, game.state().streak);
                        }
                        events
                    }
                    Step::Ask(d) => { now += d; game.submit_question("hello", now).1 }
                    Step::Reply(d, ok) => {
                        now += d;
                        match pending_chat.take() {
                            Some(id) => {
                                let reply = if ok { Ok("hi human".to_string()) } else { Err(ChatError::Empty) };
                                game.chat_reply(id, reply, now)
                            }
                            None => game.advance(now),
                        }
                    }
                };
                if let Some((id, _)) = chat_request(&events) {
                    pending_chat = Some(id);
                }

                let state = game.state();
                let stats = state.stats;
                let new_hits = stats.successful_hits - before.stats.successful_hits;
                let new_misses = stats.misses - before.stats.misses;
                hits += new_hits;
                misses += new_misses;

                if new_misses > 0 {
                    // A miss may be followed by hits in the same step only if more aliens spawned
                    prop_assert!(state.streak <= new_hits);
                }
                if new_hits > 0 && new_misses == 0 {
                    prop_assert_eq!(state.streak, before.streak + new_hits);
                }
                prop_assert!(stats.longest_streak >= longest);
                longest = stats.longest_streak;
                prop_assert!(stats.successful_hits + stats.misses <= stats.encounters);
                prop_assert_eq!(stats.successful_hits as usize, state.reaction_times.len());

                if state.screen != Screen::Playing {
                    prop_assert!(game.timers().iter().all(|t| !t.slot.is_gameplay()));
                    prop_assert!(!state.encounter.visible);
                }
                if state.paused {
                    prop_assert!(state.encounter.status.is_conversational());
                    prop_assert!(!game.timers().is_armed(TimerSlot::Countdown));
                }
            }

            prop_assert_eq!(game.state().stats.successful_hits, hits);
            prop_assert_eq!(game.state().stats.misses, misses);

            let score = game.state().stats.score;
            game.end_session(now + 1);
            let first = game.state().clone();
            let events = game.end_session(now + 2);
            prop_assert!(events.is_empty());
            prop_assert_eq!(game.state(), &first);
            prop_assert_eq!(first.stats.score, score);
            let expected = crate::sim::scoring::average_reaction_ms(&first.reaction_times);
            prop_assert_eq!(first.stats.average_reaction_time_ms, expected);
        }
    }
}
