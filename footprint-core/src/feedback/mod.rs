//! User-visible feedback channels: spoken replies and short-lived toasts.
//!
//! Both are fire-and-forget from the engine's point of view. A synthesis
//! failure is logged and never affects the command outcome.

pub mod log;

pub use log::{LogNotifier, LogSynthesizer};

use crate::error::Result;

/// Prefix for notifications about commands that succeeded.
pub const SUCCESS_GLYPH: &str = "✅";
/// Prefix for notifications about commands that failed.
pub const FAILURE_GLYPH: &str = "❌";

/// Text-to-speech engine.
pub trait SpeechSynthesizer: Send + Sync {
    fn speak(&self, text: &str) -> Result<()>;
}

/// Platform notification surface.
pub trait Notifier: Send + Sync {
    fn show_smart_suggestion(&self, text: &str);
}

/// Notification body for a finished command.
pub fn notification_text(response: &str, succeeded: bool) -> String {
    let glyph = if succeeded {
        SUCCESS_GLYPH
    } else {
        FAILURE_GLYPH
    };
    format!("{glyph} {response}")
}
