//! Replays queued utterances without a microphone.
//!
//! Used by tests and the host's one-shot `--say` mode. On every `start` it
//! pops the next script and sends its events synchronously:
//! 1. a partial segment with the first word (when partials are enabled)
//! 2. the final segment with the full text
//!
//! An empty queue ends the session immediately. The event sender is held
//! until `stop`, so a session that only produced a partial stays open.

use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::debug;

use super::{ListenOptions, RecognizerEvent, SpeechRecognizer};
use crate::error::{FootprintError, Result};
use crate::ipc::events::TranscriptSegment;

/// What one scripted session produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Script {
    Utterance { text: String, confidence: f32 },
    /// Emit a partial and nothing else; the session stays open until stopped.
    PartialOnly(String),
    Failure(String),
    FailToStart(String),
}

#[derive(Debug, Default)]
pub struct ScriptedRecognizer {
    queue: Arc<Mutex<VecDeque<Script>>>,
    sessions: u32,
    events: Option<Sender<RecognizerEvent>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_utterances<I, S>(utterances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let recognizer = Self::new();
        for text in utterances {
            recognizer.push(Script::Utterance {
                text: text.into(),
                confidence: 0.92,
            });
        }
        recognizer
    }

    /// Queue handle that stays valid after the recognizer is boxed.
    pub fn queue(&self) -> Arc<Mutex<VecDeque<Script>>> {
        Arc::clone(&self.queue)
    }

    pub fn push(&self, script: Script) {
        self.queue.lock().push_back(script);
    }

    pub fn is_active(&self) -> bool {
        self.events.is_some()
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(&mut self, options: &ListenOptions, events: Sender<RecognizerEvent>) -> Result<()> {
        let next = self.queue.lock().pop_front();
        self.sessions += 1;
        let id = format!("scripted-{}", self.sessions);
        debug!(session = %id, "ScriptedRecognizer::start");

        match next {
            None => {
                let _ = events.send(RecognizerEvent::Ended);
            }
            Some(Script::FailToStart(reason)) => {
                return Err(FootprintError::Recognizer(reason));
            }
            Some(Script::Failure(reason)) => {
                let _ = events.send(RecognizerEvent::Error(reason));
            }
            Some(Script::PartialOnly(text)) => {
                let _ = events.send(RecognizerEvent::Transcript(TranscriptSegment::partial(
                    id, text,
                )));
            }
            Some(Script::Utterance { text, confidence }) => {
                if options.partial_results {
                    if let Some(first) = text.split_whitespace().next() {
                        let _ = events.send(RecognizerEvent::Transcript(
                            TranscriptSegment::partial(id.clone(), first),
                        ));
                    }
                }
                let _ = events.send(RecognizerEvent::Transcript(
                    TranscriptSegment::final_with_confidence(id, text, Some(confidence)),
                ));
            }
        }

        self.events = Some(events);
        Ok(())
    }

    fn stop(&mut self) {
        self.events = None;
    }
}
