//! Event types broadcast by the voice engine.
//!
//! Each type travels on its own broadcast channel, see
//! `VoiceEngine::subscribe_transcripts`, `subscribe_status` and
//! `subscribe_commands`. Partial transcripts are for live echo only; nothing
//! downstream classifies them.

use serde::{Deserialize, Serialize};

use crate::command::VoiceCommand;

// ---------------------------------------------------------------------------
// Transcript events
// ---------------------------------------------------------------------------

/// Emitted for every transcript segment the recognizer produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEvent {
    /// Monotonically increasing event sequence number.
    pub seq: u64,
    pub segments: Vec<TranscriptSegment>,
}

/// A single recognised speech segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Utterance id, stable across partial→final updates.
    pub id: String,
    pub text: String,
    pub kind: SegmentKind,
    /// Recognizer confidence in [0.0, 1.0], if available.
    pub confidence: Option<f32>,
}

impl TranscriptSegment {
    pub fn partial(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: SegmentKind::Partial,
            confidence: None,
        }
    }

    pub fn final_with_confidence(
        id: impl Into<String>,
        text: impl Into<String>,
        confidence: Option<f32>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind: SegmentKind::Final,
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Text may still change under the same `id`.
    Partial,
    /// The utterance is complete.
    Final,
}

// ---------------------------------------------------------------------------
// Session status events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusEvent {
    pub status: SessionStatus,
    /// Optional human-readable detail (e.g. recognizer error).
    pub detail: Option<String>,
}

/// Listening session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// No session has been started yet.
    Idle,
    /// Recognizer is capturing speech.
    Listening,
    /// A final transcript is being classified and executed.
    Processing,
    /// Session ended; a new one may start.
    Stopped,
    /// Recognizer failed; the next start resets this.
    Error,
}

// ---------------------------------------------------------------------------
// Command events
// ---------------------------------------------------------------------------

/// Emitted after a command has been executed and its history entry persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEvent {
    pub seq: u64,
    pub command: VoiceCommand,
    pub succeeded: bool,
}
