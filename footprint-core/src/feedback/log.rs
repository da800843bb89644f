//! Tracing-backed feedback sinks for headless hosts.

use tracing::info;

use super::{Notifier, SpeechSynthesizer};
use crate::error::Result;

/// Logs what would have been spoken.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSynthesizer;

impl SpeechSynthesizer for LogSynthesizer {
    fn speak(&self, text: &str) -> Result<()> {
        info!(target: "footprint::speech", text, "speak");
        Ok(())
    }
}

/// Logs notifications instead of posting them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_smart_suggestion(&self, text: &str) {
        info!(target: "footprint::notify", text, "notification");
    }
}
