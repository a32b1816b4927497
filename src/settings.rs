//! Player preferences
//!
//! Persisted separately from the session in LocalStorage. The session engine only
//! reads `vibration_enabled`; the audio sink reads the sound toggles.

use serde::{Deserialize, Serialize};

/// Which preference a menu toggle flips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettingToggle {
    Sound,
    Music,
    Vibration,
}

impl SettingToggle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingToggle::Sound => "Sound",
            SettingToggle::Music => "Music",
            SettingToggle::Vibration => "Vibration",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sound" | "sfx" => Some(SettingToggle::Sound),
            "music" => Some(SettingToggle::Music),
            "vibration" | "haptics" => Some(SettingToggle::Vibration),
            _ => None,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Sound effect cues
    pub sound_enabled: bool,
    /// Background music
    pub music_enabled: bool,
    /// Haptic pulse on a successful wave
    pub vibration_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            music_enabled: true,
            vibration_enabled: true,
        }
    }
}

impl Settings {
    /// Flip a preference, returning its new value
    pub fn toggle(&mut self, which: SettingToggle) -> bool {
        let slot = match which {
            SettingToggle::Sound => &mut self.sound_enabled,
            SettingToggle::Music => &mut self.music_enabled,
            SettingToggle::Vibration => &mut self.vibration_enabled,
        };
        *slot = !*slot;
        log::info!("{} {}", which.as_str(), if *slot { "on" } else { "off" });
        *slot
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "wave_back_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_flips_one_setting() {
        let mut settings = Settings::default();
        assert!(!settings.toggle(SettingToggle::Vibration));
        assert!(settings.sound_enabled);
        assert!(settings.music_enabled);
        assert!(!settings.vibration_enabled);
        assert!(settings.toggle(SettingToggle::Vibration));
    }

    #[test]
    fn test_missing_fields_default_on() {
        let settings: Settings = serde_json::from_str(r#"{ "sound_enabled": false }"#).unwrap();
        assert!(!settings.sound_enabled);
        assert!(settings.music_enabled);
        assert!(settings.vibration_enabled);
    }

    #[test]
    fn test_toggle_names() {
        assert_eq!(SettingToggle::from_str("HAPTICS"), Some(SettingToggle::Vibration));
        assert_eq!(SettingToggle::from_str("volume"), None);
    }
}
