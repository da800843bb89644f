//! Speech recognizer abstraction.
//!
//! The `SpeechRecognizer` trait decouples the engine from any specific STT
//! backend (platform speech service, cloud API, console input, scripted
//! test input). A backend pushes `RecognizerEvent`s into the channel it is
//! handed on `start`; the engine drains that channel.
//!
//! Each session gets a fresh channel, so events a backend emits after `stop`
//! land in a dropped receiver and can never leak into the next session.

pub mod scripted;

pub use scripted::ScriptedRecognizer;

use std::time::Duration;

use crossbeam_channel::Sender;

use crate::error::Result;
use crate::ipc::events::TranscriptSegment;

/// Upper bound on a single listening session.
pub const DEFAULT_LISTEN_FOR: Duration = Duration::from_secs(10);
/// Trailing silence after which the recognizer finalises.
pub const DEFAULT_PAUSE_FOR: Duration = Duration::from_secs(3);

/// Per-session recognizer options.
#[derive(Debug, Clone, PartialEq)]
pub struct ListenOptions {
    pub listen_for: Duration,
    pub pause_for: Duration,
    /// BCP-47 locale, e.g. `tr-TR`.
    pub locale: String,
    /// Whether partial segments should be emitted.
    pub partial_results: bool,
}

impl Default for ListenOptions {
    fn default() -> Self {
        Self {
            listen_for: DEFAULT_LISTEN_FOR,
            pause_for: DEFAULT_PAUSE_FOR,
            locale: "tr-TR".into(),
            partial_results: true,
        }
    }
}

/// Events a recognizer backend reports during a session.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    Transcript(TranscriptSegment),
    Error(String),
    /// The backend stopped on its own (silence timeout, end of input).
    Ended,
}

/// Contract for speech-to-text backends.
pub trait SpeechRecognizer: Send + 'static {
    /// Begin capturing. Events for this session go to `events`.
    ///
    /// # Errors
    /// Returns an error if the backend cannot open its input.
    fn start(&mut self, options: &ListenOptions, events: Sender<RecognizerEvent>) -> Result<()>;

    /// Stop capturing. Must be safe to call when already stopped.
    fn stop(&mut self);
}
