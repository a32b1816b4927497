//! Native session driver
//!
//! Owns a [`Game`] behind a tokio mutex and a driver task that sleeps until the
//! next timer deadline (or until an input wakes it), then advances the engine.
//! Effects are routed to the injected sound/haptics sinks; chat requests run as
//! their own tasks under a deadline and report back with `chat_reply`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::audio::CueSink;
use crate::chat::ChatClient;
use crate::error::{ChatError, RuntimeError};
use crate::haptics::Haptics;
use crate::settings::Settings;
use crate::sim::{Game, GameEvent, GameStats, Hit, Screen, Snapshot};

/// Cue sink shareable across tasks
pub type SharedCues = Arc<dyn CueSink + Send + Sync>;
/// Haptics shareable across tasks
pub type SharedHaptics = Arc<dyn Haptics + Send + Sync>;

#[derive(Clone)]
pub struct SessionRunner {
    game: Arc<Mutex<Game>>,
    chat: Arc<dyn ChatClient>,
    cues: SharedCues,
    haptics: SharedHaptics,
    /// Instant matching the engine's `offset_ms`
    origin: Instant,
    offset_ms: u64,
    wake: Arc<Notify>,
    snapshots: Arc<watch::Sender<Snapshot>>,
    driver: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionRunner {
    /// Wrap a booted engine. Its current clock becomes "now".
    pub fn new(
        game: Game,
        chat: Arc<dyn ChatClient>,
        cues: SharedCues,
        haptics: SharedHaptics,
    ) -> Self {
        let offset_ms = game.now_ms();
        let (snapshots, _) = watch::channel(game.snapshot());
        Self {
            game: Arc::new(Mutex::new(game)),
            chat,
            cues,
            haptics,
            origin: Instant::now(),
            offset_ms,
            wake: Arc::new(Notify::new()),
            snapshots: Arc::new(snapshots),
            driver: Arc::new(Mutex::new(None)),
        }
    }

    /// Engine clock for the current instant
    pub fn now_ms(&self) -> u64 {
        self.offset_ms + self.origin.elapsed().as_millis() as u64
    }

    /// Latest snapshot, updated after every transition
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.game.lock().await.snapshot()
    }

    /// Start the driver task and a fresh session
    pub async fn start(&self) -> Result<(), RuntimeError> {
        let mut driver = self.driver.lock().await;
        if driver.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(RuntimeError::AlreadyRunning);
        }

        self.apply(|game, now| ((), game.start_session(now))).await;
        *driver = Some(tokio::spawn(self.clone().drive()));
        log::info!("Session driver started");
        Ok(())
    }

    /// Restart the session with the driver already running
    pub async fn play_again(&self) {
        self.apply(|game, now| ((), game.start_session(now))).await;
    }

    pub async fn wave(&self) -> Option<Hit> {
        self.apply(|game, now| game.wave(now)).await
    }

    pub async fn ask(&self, question: &str) -> bool {
        self.apply(|game, now| game.submit_question(question, now))
            .await
    }

    pub async fn dismiss_chat(&self) {
        self.apply(|game, now| ((), game.dismiss_chat(now))).await;
    }

    /// End the session early and return the final stats
    pub async fn end(&self) -> GameStats {
        self.apply(|game, now| {
            let events = game.end_session(now);
            (game.state().stats, events)
        })
        .await
    }

    /// Wait until the session reaches the results screen
    pub async fn finished(&self) -> GameStats {
        let mut rx = self.subscribe();
        let stats = match rx.wait_for(|s| s.screen == Screen::Results).await {
            Ok(snapshot) => Some(snapshot.stats),
            Err(_) => None,
        };
        match stats {
            Some(stats) => stats,
            // Sender lives as long as `self`
            None => self.snapshot().await.stats,
        }
    }

    /// Abort the driver task
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let handle = self.driver.lock().await.take();
        if let Some(handle) = handle {
            handle.abort();
            match handle.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(err) => return Err(err.into()),
            }
            log::info!("Session driver stopped");
        }
        Ok(())
    }

    /// Run one transition under the lock, publish the snapshot, route effects
    async fn apply<R>(&self, f: impl FnOnce(&mut Game, u64) -> (R, Vec<GameEvent>)) -> R {
        let (result, events, settings) = {
            let mut game = self.game.lock().await;
            let (result, events) = f(&mut game, self.now_ms());
            self.snapshots.send_replace(game.snapshot());
            (result, events, *game.settings())
        };
        self.route(events, settings);
        // Deadlines may have moved
        self.wake.notify_one();
        result
    }

    async fn drive(self) {
        loop {
            let next = self.game.lock().await.next_deadline();
            match next {
                Some(due) => {
                    let at = self.origin
                        + Duration::from_millis(due.saturating_sub(self.offset_ms));
                    tokio::select! {
                        _ = time::sleep_until(at) => {}
                        _ = self.wake.notified() => continue,
                    }
                }
                None => {
                    self.wake.notified().await;
                    continue;
                }
            }

            let (events, settings) = {
                let mut game = self.game.lock().await;
                let events = game.advance(self.now_ms());
                self.snapshots.send_replace(game.snapshot());
                (events, *game.settings())
            };
            self.route(events, settings);
        }
    }

    fn route(&self, events: Vec<GameEvent>, settings: Settings) {
        for event in events {
            match event {
                GameEvent::Sound(cue) => {
                    if settings.sound_enabled {
                        self.cues.play(cue);
                    }
                }
                GameEvent::Vibrate { ms } => self.haptics.pulse(ms),
                GameEvent::ChatRequest {
                    encounter_id,
                    prompt,
                } => self.spawn_chat(encounter_id, prompt),
                GameEvent::SessionEnded(stats) => {
                    log::debug!("Final stats: {:?}", stats);
                }
                GameEvent::FocusChatInput | GameEvent::ScreenChanged(_) => {}
            }
        }
    }

    fn spawn_chat(&self, encounter_id: u32, prompt: String) {
        let runner = self.clone();
        tokio::spawn(async move {
            let deadline_ms = runner.game.lock().await.tuning().chat_deadline_ms;
            let reply =
                match time::timeout(Duration::from_millis(deadline_ms), runner.chat.ask(&prompt))
                    .await
                {
                    Ok(reply) => reply,
                    Err(_) => Err(ChatError::Timeout(deadline_ms)),
                };
            runner
                .apply(|game, now| ((), game.chat_reply(encounter_id, reply, now)))
                .await;
        });
    }
}
