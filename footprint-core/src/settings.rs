//! Persistent voice settings (JSON value in the key-value store).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::recognizer::ListenOptions;
use crate::storage::KeyValueStore;

pub const VOICE_SETTINGS_KEY: &str = "voice_settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct VoiceSettings {
    /// Speak each response through the synthesizer.
    pub voice_feedback_enabled: bool,
    /// Post a toast for each executed command.
    pub notifications_enabled: bool,
    /// Ask the recognizer for partial segments.
    pub partial_results: bool,
    pub language: String,
    pub listen_for_secs: u64,
    pub pause_for_secs: u64,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_feedback_enabled: true,
            notifications_enabled: true,
            partial_results: true,
            language: "tr-TR".into(),
            listen_for_secs: 10,
            pause_for_secs: 3,
        }
    }
}

impl VoiceSettings {
    pub fn normalize(&mut self) {
        self.language = normalize_language(&self.language);
        self.listen_for_secs = self.listen_for_secs.clamp(1, 60);
        self.pause_for_secs = self.pause_for_secs.clamp(1, self.listen_for_secs);
    }

    pub fn listen_options(&self) -> ListenOptions {
        ListenOptions {
            listen_for: Duration::from_secs(self.listen_for_secs),
            pause_for: Duration::from_secs(self.pause_for_secs),
            locale: self.language.clone(),
            partial_results: self.partial_results,
        }
    }
}

pub fn normalize_language(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        "en" | "eng" | "english" | "en-us" | "en_us" | "en-gb" => "en-US".into(),
        _ => "tr-TR".into(),
    }
}

/// Load settings, falling back to defaults when missing or unreadable.
pub fn load_voice_settings(store: &dyn KeyValueStore) -> VoiceSettings {
    let mut settings = match store.get(VOICE_SETTINGS_KEY) {
        Ok(Some(raw)) => serde_json::from_str::<VoiceSettings>(&raw).unwrap_or_else(|e| {
            warn!("voice settings unreadable, using defaults: {e}");
            VoiceSettings::default()
        }),
        Ok(None) => VoiceSettings::default(),
        Err(e) => {
            warn!("voice settings load failed, using defaults: {e}");
            VoiceSettings::default()
        }
    };
    settings.normalize();
    settings
}

pub fn save_voice_settings(store: &dyn KeyValueStore, settings: &VoiceSettings) -> Result<()> {
    let json = serde_json::to_string(settings)?;
    store.set(VOICE_SETTINGS_KEY, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn defaults_match_listening_limits() {
        let options = VoiceSettings::default().listen_options();
        assert_eq!(options.listen_for, Duration::from_secs(10));
        assert_eq!(options.pause_for, Duration::from_secs(3));
        assert_eq!(options.locale, "tr-TR");
    }

    #[test]
    fn normalize_clamps_timeouts_and_language() {
        let mut settings = VoiceSettings {
            language: " English ".into(),
            listen_for_secs: 600,
            pause_for_secs: 0,
            ..VoiceSettings::default()
        };
        settings.normalize();
        assert_eq!(settings.language, "en-US");
        assert_eq!(settings.listen_for_secs, 60);
        assert_eq!(settings.pause_for_secs, 1);

        let mut settings = VoiceSettings {
            listen_for_secs: 4,
            pause_for_secs: 9,
            ..VoiceSettings::default()
        };
        settings.normalize();
        assert_eq!(settings.pause_for_secs, 4);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let store = MemoryStore::new();
        store
            .set(VOICE_SETTINGS_KEY, r#"{"voiceFeedbackEnabled":false}"#)
            .expect("set");
        let settings = load_voice_settings(&store);
        assert!(!settings.voice_feedback_enabled);
        assert!(settings.notifications_enabled);
        assert_eq!(settings.listen_for_secs, 10);
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let store = MemoryStore::new();
        let settings = VoiceSettings {
            notifications_enabled: false,
            language: "en-US".into(),
            ..VoiceSettings::default()
        };
        save_voice_settings(&store, &settings).expect("save");
        assert_eq!(load_voice_settings(&store), settings);
    }
}
