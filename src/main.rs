//! Wave Back entry point
//!
//! Web: binds the engine to the DOM overlay, Web Audio and the vibration API.
//! Native: runs one headless session with a simulated player and prints the results.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlInputElement, KeyboardEvent};

    use wave_back::audio::{AudioManager, CueSink};
    use wave_back::chat::{ChatClient, PhrasebookChat};
    use wave_back::haptics::{Haptics, WebHaptics};
    use wave_back::settings::{SettingToggle, Settings};
    use wave_back::sim::{AlienStatus, FeedbackKind, Game, GameEvent, PlayerInput, Screen};
    use wave_back::{Tuning, parallax_offset, to_percent};

    const SCREENS: [(Screen, &str); 6] = [
        (Screen::Splash, "screen-splash"),
        (Screen::Menu, "screen-menu"),
        (Screen::HowTo, "screen-howto"),
        (Screen::Settings, "screen-settings"),
        (Screen::Playing, "screen-playing"),
        (Screen::Results, "screen-results"),
    ];

    struct App {
        game: Game,
        audio: AudioManager,
        haptics: WebHaptics,
        chat: Rc<PhrasebookChat>,
        /// performance.now() at boot
        origin: f64,
        parallax: Vec2,
    }

    type Shared = Rc<RefCell<App>>;

    fn now() -> f64 {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
            .unwrap_or_default()
    }

    impl App {
        fn clock(&self) -> u64 {
            (now() - self.origin).max(0.0) as u64
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    /// Apply one input and route its effects
    fn input(app: &Shared, input: PlayerInput) {
        let (events, settings) = {
            let mut a = app.borrow_mut();
            if matches!(input, PlayerInput::Start | PlayerInput::Wave) {
                a.audio.resume();
            }
            let toggled = matches!(input, PlayerInput::Toggle(_));
            let now = a.clock();
            let (_, events) = a.game.handle(input, now);
            let settings = *a.game.settings();
            if toggled {
                a.audio.apply_settings(&settings);
                settings.save();
                render_settings(&settings);
            }
            (events, settings)
        };
        route(app, events, settings);
    }

    fn route(app: &Shared, events: Vec<GameEvent>, settings: Settings) {
        for event in events {
            match event {
                GameEvent::Sound(cue) => app.borrow().audio.play(cue),
                GameEvent::Vibrate { ms } => app.borrow().haptics.pulse(ms),
                GameEvent::FocusChatInput => focus_chat_input(),
                GameEvent::ChatRequest {
                    encounter_id,
                    prompt,
                } => {
                    let chat = app.borrow().chat.clone();
                    let app = app.clone();
                    wasm_bindgen_futures::spawn_local(async move {
                        let reply = chat.ask(&prompt).await;
                        let (events, settings) = {
                            let mut a = app.borrow_mut();
                            let now = a.clock();
                            let events = a.game.chat_reply(encounter_id, reply, now);
                            (events, *a.game.settings())
                        };
                        route(&app, events, settings);
                    });
                }
                GameEvent::ScreenChanged(screen) => {
                    if screen == Screen::Settings {
                        render_settings(&settings);
                    }
                }
                GameEvent::SessionEnded(stats) => {
                    log::info!("Session ended with score {}", stats.score);
                }
            }
        }
    }

    fn focus_chat_input() {
        if let Some(el) = document().and_then(|d| d.get_element_by_id("chat-input")) {
            if let Ok(input) = el.dyn_into::<HtmlInputElement>() {
                input.set_value("");
                let _ = input.focus();
            }
        }
    }

    fn set_text(doc: &Document, id: &str, text: &str) {
        if let Some(el) = doc.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(doc: &Document, id: &str, visible: bool) {
        if let Some(el) = doc.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn render_settings(settings: &Settings) {
        let Some(doc) = document() else { return };
        for (which, enabled) in [
            (SettingToggle::Sound, settings.sound_enabled),
            (SettingToggle::Music, settings.music_enabled),
            (SettingToggle::Vibration, settings.vibration_enabled),
        ] {
            let id = format!("toggle-{}", which.as_str());
            set_text(&doc, &id, if enabled { "ON" } else { "OFF" });
        }
    }

    /// Sync the DOM overlay with the engine
    fn render(app: &App) {
        let Some(doc) = document() else { return };
        let snap = app.game.snapshot();

        for (screen, id) in SCREENS {
            set_visible(&doc, id, snap.screen == screen);
        }

        set_text(&doc, "hud-time", &snap.time_remaining.to_string());
        if let Some(el) = doc.get_element_by_id("hud-time") {
            let _ = el.set_attribute("class", if snap.time_low { "low" } else { "" });
        }
        set_text(&doc, "hud-score", &snap.stats.score.to_string());
        set_text(
            &doc,
            "hud-hits",
            &format!(
                "HIT: {} | MISS: {}",
                snap.stats.successful_hits, snap.stats.misses
            ),
        );
        set_text(&doc, "hud-streak-count", &format!("x{}", snap.streak));
        set_visible(&doc, "hud-streak", snap.streak_banner);
        set_text(&doc, "hud-streak-value", &format!("{} STREAK!", snap.streak));

        let enc = &snap.encounter;
        set_visible(&doc, "alien", enc.visible);
        if let Some(el) = doc.get_element_by_id("alien") {
            let (x, y) = to_percent(enc.position);
            let style = format!(
                "left: {x}%; top: {y}%; transform: translate({:.1}px, {:.1}px)",
                app.parallax.x, app.parallax.y
            );
            let _ = el.set_attribute("style", &style);
            let _ = el.set_attribute("data-status", status_name(enc.status));
        }

        set_visible(
            &doc,
            "chat-box",
            enc.visible && enc.status == AlienStatus::Listening,
        );
        set_visible(&doc, "chat-thinking", enc.status == AlienStatus::Thinking);
        match &enc.message {
            Some(message) if enc.visible => {
                set_text(&doc, "chat-bubble", message);
                set_visible(&doc, "chat-bubble", true);
            }
            _ => set_visible(&doc, "chat-bubble", false),
        }

        match &snap.feedback {
            Some(feedback) => {
                set_text(&doc, "feedback", &feedback.text);
                if let Some(el) = doc.get_element_by_id("feedback") {
                    let class = match feedback.kind {
                        FeedbackKind::Points => "points",
                        FeedbackKind::TooSlow => "too-slow",
                    };
                    let _ = el.set_attribute("class", class);
                }
            }
            None => set_visible(&doc, "feedback", false),
        }

        if snap.screen == Screen::Results {
            set_text(&doc, "final-score", &snap.stats.score.to_string());
            set_text(&doc, "final-hits", &snap.stats.successful_hits.to_string());
            set_text(&doc, "final-misses", &snap.stats.misses.to_string());
            set_text(&doc, "final-streak", &snap.stats.longest_streak.to_string());
            set_text(
                &doc,
                "final-reaction",
                &format!("{} ms", snap.stats.average_reaction_time_ms),
            );
        }
    }

    fn status_name(status: AlienStatus) -> &'static str {
        match status {
            AlienStatus::Idle => "idle",
            AlienStatus::Hit => "hit",
            AlienStatus::Missed => "missed",
            AlienStatus::Listening => "listening",
            AlienStatus::Thinking => "thinking",
            AlienStatus::Talking => "talking",
        }
    }

    fn on_click(doc: &Document, id: &str, app: &Shared, make: impl Fn() -> PlayerInput + 'static) {
        let Some(el) = doc.get_element_by_id(id) else {
            log::warn!("Missing element #{}", id);
            return;
        };
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            input(&app, make());
        });
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(doc: &Document, app: &Shared) {
        on_click(doc, "screen-splash", app, || PlayerInput::SkipSplash);
        on_click(doc, "btn-start", app, || PlayerInput::Start);
        on_click(doc, "btn-again", app, || PlayerInput::Start);
        on_click(doc, "btn-howto", app, || PlayerInput::HowTo);
        on_click(doc, "btn-settings", app, || PlayerInput::OpenSettings);
        on_click(doc, "btn-howto-back", app, || PlayerInput::Menu);
        on_click(doc, "btn-settings-back", app, || PlayerInput::Menu);
        on_click(doc, "btn-results-menu", app, || PlayerInput::Menu);
        on_click(doc, "btn-wave", app, || PlayerInput::Wave);
        on_click(doc, "btn-quit", app, || PlayerInput::Quit);
        on_click(doc, "btn-chat-close", app, || PlayerInput::DismissChat);
        for which in [
            SettingToggle::Sound,
            SettingToggle::Music,
            SettingToggle::Vibration,
        ] {
            let id = format!("toggle-{}", which.as_str());
            on_click(doc, &id, app, move || PlayerInput::Toggle(which));
        }
    }

    fn setup_keys(app: &Shared) {
        let Some(window) = web_sys::window() else { return };
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let listening = {
                let a = app.borrow();
                a.game.state().encounter.status == AlienStatus::Listening
            };
            match event.key().as_str() {
                "Enter" if listening => {
                    let question = document()
                        .and_then(|d| d.get_element_by_id("chat-input"))
                        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                        .map(|field| field.value())
                        .unwrap_or_default();
                    input(&app, PlayerInput::Ask(question));
                }
                "Escape" if listening => input(&app, PlayerInput::DismissChat),
                " " if !listening => {
                    event.prevent_default();
                    input(&app, PlayerInput::Wave);
                }
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_orientation(app: &Shared) {
        let Some(window) = web_sys::window() else { return };
        let app = app.clone();
        let closure =
            Closure::<dyn FnMut(_)>::new(move |event: web_sys::DeviceOrientationEvent| {
                let gamma = event.gamma().unwrap_or_default() as f32;
                let beta = event.beta().unwrap_or_default() as f32;
                let mut a = app.borrow_mut();
                a.parallax = parallax_offset(gamma, beta, a.game.tuning());
            });
        let _ = window
            .add_event_listener_with_callback("deviceorientation", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Shared) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |_time: f64| {
            frame(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Shared) {
        let (events, settings) = {
            let mut a = app.borrow_mut();
            let now = a.clock();
            (a.game.advance(now), *a.game.settings())
        };
        route(&app, events, settings);
        render(&app.borrow());
        request_animation_frame(app);
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }
        log::info!("Wave Back starting...");

        let Some(doc) = document() else {
            log::error!("No document available");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let settings = Settings::load();
        let mut audio = AudioManager::new();
        audio.apply_settings(&settings);

        let origin = now();
        let app = Rc::new(RefCell::new(App {
            game: Game::new(seed, Tuning::default(), settings, 0),
            audio,
            haptics: WebHaptics,
            chat: Rc::new(PhrasebookChat::new(seed)),
            origin,
            parallax: Vec2::ZERO,
        }));

        setup_buttons(&doc, &app);
        setup_keys(&app);
        setup_orientation(&app);
        render(&app.borrow());
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::sync::Arc;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use wave_back::audio::LogCueSink;
    use wave_back::chat::PhrasebookChat;
    use wave_back::haptics::NullHaptics;
    use wave_back::runtime::SessionRunner;
    use wave_back::sim::{AlienStatus, Game, GameStats, Screen};
    use wave_back::{Settings, Tuning};

    const QUESTIONS: &[&str] = &[
        "What's your name?",
        "Where are you from?",
        "Are you hungry?",
        "Why are you here?",
        "Do you like it here?",
    ];

    /// Seed from `WAVE_BACK_SEED`, else the wall clock
    pub fn seed() -> u64 {
        std::env::var("WAVE_BACK_SEED")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or_else(|| {
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or_default()
            })
    }

    /// Tuning from the JSON file named by `WAVE_BACK_TUNING`, else defaults
    pub fn tuning() -> Tuning {
        let Ok(path) = std::env::var("WAVE_BACK_TUNING") else {
            return Tuning::default();
        };
        match Tuning::load(&path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path);
                tuning
            }
            Err(err) => {
                log::warn!("Ignoring tuning file {}: {}", path, err);
                Tuning::default()
            }
        }
    }

    /// Play one session with a simulated player
    pub async fn play(seed: u64, tuning: Tuning) -> Result<GameStats, wave_back::error::RuntimeError> {
        let mut game = Game::new(seed, tuning, Settings::load(), 0);
        game.skip_splash(0);
        let runner = SessionRunner::new(
            game,
            Arc::new(PhrasebookChat::new(seed)),
            Arc::new(LogCueSink),
            Arc::new(NullHaptics),
        );
        let mut rng = Pcg32::seed_from_u64(seed.rotate_left(17));
        let mut rx = runner.subscribe();
        runner.start().await?;

        let mut waved = 0;
        let mut asked = 0;
        let mut heard = 0;
        while rx.changed().await.is_ok() {
            let snap = rx.borrow_and_update().clone();
            if snap.screen == Screen::Results {
                break;
            }
            let enc = snap.encounter;
            if !enc.visible {
                continue;
            }
            if enc.status == AlienStatus::Idle && enc.id != waved {
                waved = enc.id;
                // Sometimes too slow on purpose
                let delay = rng.random_range(150..=4500);
                let runner = runner.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    if let Some(hit) = runner.wave().await {
                        println!("Wave! +{} ({} ms)", hit.points, hit.reaction_ms);
                    }
                });
            } else if enc.status == AlienStatus::Listening && enc.id != asked {
                asked = enc.id;
                let question = QUESTIONS[rng.random_range(0..QUESTIONS.len())];
                let runner = runner.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis(1000)).await;
                    println!("You: {}", question);
                    runner.ask(question).await;
                });
            } else if enc.status == AlienStatus::Talking && enc.id != heard {
                heard = enc.id;
                if let Some(message) = enc.message {
                    println!("Alien: {}", message);
                }
            }
        }

        let stats = runner.finished().await;
        runner.stop().await?;
        Ok(stats)
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("Wave Back (native) starting...");
    log::info!("The playable version is the wasm32 build; this runs a headless demo");

    let seed = demo::seed();
    let tuning = demo::tuning();
    println!("Headless session, seed {} ({}s)", seed, tuning.session_duration_secs);

    let stats = demo::play(seed, tuning).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
