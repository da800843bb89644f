//! `VoiceEngine`: top-level listening and command lifecycle controller.
//!
//! ## Lifecycle
//!
//! ```text
//! VoiceEngine::new()               history + settings loaded, status = Idle
//!     └─► start_listening()        fresh event channel, status = Listening
//!         └─► await_command()      partials broadcast, final → process_transcript
//!             └─► (pause_for quiet) last partial taken as the final transcript
//!             └─► (session ends)   status = Processing → Stopped
//!         └─► stop_listening()     partial discarded, status = Stopped
//! ```
//!
//! `start_listening()` while a session is open is a no-op that returns
//! `Ok(false)`; `stop_listening()` while idle is `NotListening`.
//!
//! ## Ordering
//!
//! `process_transcript` persists history before any observer sees the
//! command: persist → broadcast `CommandEvent` → speak → notify.

pub mod diagnostics;

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    command::VoiceCommand,
    error::{FootprintError, Result},
    executor::CommandExecutor,
    feedback::{notification_text, Notifier, SpeechSynthesizer},
    goals::GoalTracker,
    history::CommandHistory,
    interpreter::CommandInterpreter,
    ipc::events::{
        CommandEvent, SegmentKind, SessionStatus, SessionStatusEvent, TranscriptEvent,
        TranscriptSegment,
    },
    recognizer::{RecognizerEvent, SpeechRecognizer},
    settings::{load_voice_settings, save_voice_settings, VoiceSettings},
    storage::{ActivityStore, KeyValueStore},
};

pub use diagnostics::{DiagnosticsSnapshot, EngineDiagnostics};

/// Broadcast channel capacity: events buffered for slow consumers.
const BROADCAST_CAP: usize = 256;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Per-channel broadcast buffer. Default: 256.
    pub broadcast_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: BROADCAST_CAP,
        }
    }
}

/// Everything the engine talks to, constructed by the host.
pub struct Collaborators {
    pub activities: Arc<dyn ActivityStore>,
    pub goals: Arc<dyn GoalTracker>,
    /// Durable store for command history and voice settings.
    pub kv: Arc<dyn KeyValueStore>,
    pub recognizer: Box<dyn SpeechRecognizer>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub notifier: Arc<dyn Notifier>,
}

/// Recognizer plus the state of the open session, if any.
struct Session {
    recognizer: Box<dyn SpeechRecognizer>,
    /// Bumped on every start so a stale waiter cannot end a newer session.
    id: u64,
    events: Option<Receiver<RecognizerEvent>>,
    deadline: Instant,
    /// Trailing silence after a partial that finalises it.
    pause_for: Duration,
    partial: Option<String>,
}

impl Session {
    fn is_open(&self) -> bool {
        self.events.is_some()
    }

    fn close(&mut self) {
        self.events = None;
        if let Some(partial) = self.partial.take() {
            debug!(partial = %partial, "discarding partial transcript");
        }
        self.recognizer.stop();
    }
}

/// The top-level engine handle.
///
/// `VoiceEngine` is `Send + Sync`; wrap it in an `Arc` to share between the
/// host's input loop and event-forwarding tasks.
pub struct VoiceEngine {
    interpreter: CommandInterpreter,
    executor: CommandExecutor,
    kv: Arc<dyn KeyValueStore>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    notifier: Arc<dyn Notifier>,
    session: Mutex<Session>,
    history: Mutex<CommandHistory>,
    settings: RwLock<VoiceSettings>,
    status: Mutex<SessionStatus>,
    transcript_tx: broadcast::Sender<TranscriptEvent>,
    status_tx: broadcast::Sender<SessionStatusEvent>,
    command_tx: broadcast::Sender<CommandEvent>,
    /// Monotonically increasing event sequence counter.
    seq: AtomicU64,
    diagnostics: EngineDiagnostics,
}

impl VoiceEngine {
    /// Build an engine, loading history and voice settings from `kv`.
    ///
    /// # Errors
    /// Returns an error if the key-value store cannot be read.
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Result<Self> {
        let Collaborators {
            activities,
            goals,
            kv,
            recognizer,
            synthesizer,
            notifier,
        } = collaborators;

        let history = CommandHistory::load(kv.as_ref())?;
        let settings = load_voice_settings(kv.as_ref());
        info!(
            history = history.len(),
            language = %settings.language,
            "voice engine ready"
        );

        let capacity = config.broadcast_capacity.max(1);
        let (transcript_tx, _) = broadcast::channel(capacity);
        let (status_tx, _) = broadcast::channel(capacity);
        let (command_tx, _) = broadcast::channel(capacity);

        Ok(Self {
            interpreter: CommandInterpreter::new(),
            executor: CommandExecutor::new(activities, goals),
            kv,
            synthesizer,
            notifier,
            session: Mutex::new(Session {
                recognizer,
                id: 0,
                events: None,
                deadline: Instant::now(),
                pause_for: Duration::ZERO,
                partial: None,
            }),
            history: Mutex::new(history),
            settings: RwLock::new(settings),
            status: Mutex::new(SessionStatus::Idle),
            transcript_tx,
            status_tx,
            command_tx,
            seq: AtomicU64::new(0),
            diagnostics: EngineDiagnostics::default(),
        })
    }

    /// Open a listening session.
    ///
    /// Returns `Ok(false)` without touching the recognizer if a session is
    /// already open.
    ///
    /// # Errors
    /// Propagates the recognizer's start failure; status becomes `Error`.
    pub fn start_listening(&self) -> Result<bool> {
        let mut session = self.session.lock();
        if session.is_open() {
            debug!("start_listening ignored: already listening");
            return Ok(false);
        }

        let options = self.settings.read().listen_options();
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        if let Err(e) = session.recognizer.start(&options, events_tx) {
            EngineDiagnostics::bump(&self.diagnostics.recognizer_errors);
            warn!("recognizer failed to start: {e}");
            self.set_status(SessionStatus::Error, Some(e.to_string()));
            return Err(e);
        }

        session.id += 1;
        session.events = Some(events_rx);
        session.deadline = Instant::now() + options.listen_for;
        session.pause_for = options.pause_for;
        session.partial = None;
        EngineDiagnostics::bump(&self.diagnostics.sessions_started);
        self.set_status(SessionStatus::Listening, None);
        info!(
            session = session.id,
            locale = %options.locale,
            listen_for_ms = options.listen_for.as_millis() as u64,
            "listening"
        );
        Ok(true)
    }

    /// Close the open session, discarding any partial transcript.
    ///
    /// # Errors
    /// - `FootprintError::NotListening` if no session is open.
    pub fn stop_listening(&self) -> Result<()> {
        let mut session = self.session.lock();
        if !session.is_open() {
            return Err(FootprintError::NotListening);
        }
        session.close();
        self.set_status(SessionStatus::Stopped, None);
        info!(session = session.id, "listening stopped");
        Ok(())
    }

    pub fn is_listening(&self) -> bool {
        self.session.lock().is_open()
    }

    /// Wait for the open session to produce a command.
    ///
    /// Waits at most `timeout`, and never past the session's listening limit.
    /// A partial transcript followed by `pause_for` of silence is processed
    /// as if it were final. Returns `Ok(None)` when the session ends without
    /// a usable transcript (listening limit, end of input, recognizer error,
    /// empty text).
    ///
    /// # Errors
    /// - `FootprintError::NotListening` if no session is open.
    pub fn await_command(&self, timeout: Duration) -> Result<Option<VoiceCommand>> {
        let (id, events, deadline, pause_for) = {
            let session = self.session.lock();
            let Some(events) = session.events.clone() else {
                return Err(FootprintError::NotListening);
            };
            let deadline = Instant::now()
                .checked_add(timeout)
                .map_or(session.deadline, |limit| limit.min(session.deadline));
            (session.id, events, deadline, session.pause_for)
        };
        let mut silence_deadline: Option<Instant> = None;

        loop {
            let wait_until = silence_deadline.map_or(deadline, |quiet| quiet.min(deadline));
            match events.recv_deadline(wait_until) {
                Ok(RecognizerEvent::Transcript(segment)) => {
                    EngineDiagnostics::bump(&self.diagnostics.transcripts_received);
                    self.broadcast_transcript(segment.clone());

                    if segment.kind == SegmentKind::Partial {
                        let mut session = self.session.lock();
                        if session.id == id {
                            session.partial = Some(segment.text);
                        }
                        silence_deadline = Instant::now().checked_add(pause_for);
                        continue;
                    }

                    if !self.end_session(id, SessionStatus::Processing, None) {
                        return Ok(None);
                    }
                    return Ok(self.finish_transcript(&segment.text));
                }
                Ok(RecognizerEvent::Error(reason)) => {
                    EngineDiagnostics::bump(&self.diagnostics.recognizer_errors);
                    warn!(session = id, "recognizer error: {reason}");
                    self.end_session(id, SessionStatus::Error, Some(reason));
                    return Ok(None);
                }
                Ok(RecognizerEvent::Ended) | Err(RecvTimeoutError::Disconnected) => {
                    debug!(session = id, "recognizer ended the session");
                    self.end_session(id, SessionStatus::Stopped, None);
                    return Ok(None);
                }
                Err(RecvTimeoutError::Timeout)
                    if silence_deadline.is_some_and(|quiet| quiet <= deadline) =>
                {
                    debug!(session = id, "pause after partial transcript");
                    let Some(partial) = self.take_partial_and_end(id) else {
                        return Ok(None);
                    };
                    return Ok(self.finish_transcript(&partial));
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!(session = id, "listening deadline elapsed");
                    self.end_session(id, SessionStatus::Stopped, None);
                    return Ok(None);
                }
            }
        }
    }

    /// Interpret and execute one transcript, then record and report it.
    pub fn process_transcript(&self, transcript: &str) -> VoiceCommand {
        self.set_status(SessionStatus::Processing, None);
        let command = self.interpreter.interpret(transcript);

        {
            let mut history = self.history.lock();
            history.push(command.clone());
            self.persist_history(&history);
        }

        let result = self.executor.execute(&command);
        let completed = command.completed(result.response.as_str());
        EngineDiagnostics::bump(&self.diagnostics.commands_executed);
        if !result.succeeded {
            EngineDiagnostics::bump(&self.diagnostics.commands_failed);
        }

        {
            let mut history = self.history.lock();
            history.complete(completed.clone());
            self.persist_history(&history);
        }

        info!(
            intent = ?completed.intent,
            succeeded = result.succeeded,
            "command processed"
        );
        let _ = self.command_tx.send(CommandEvent {
            seq: self.next_seq(),
            command: completed.clone(),
            succeeded: result.succeeded,
        });

        let settings = self.settings.read().clone();
        if settings.voice_feedback_enabled {
            if let Err(e) = self.synthesizer.speak(&result.response) {
                warn!("speech synthesis failed: {e}");
            }
        }
        if settings.notifications_enabled {
            self.notifier
                .show_smart_suggestion(&notification_text(&result.response, result.succeeded));
        }

        if !self.is_listening() {
            self.set_status(SessionStatus::Stopped, None);
        }
        completed
    }

    /// Most-recent-first command history.
    pub fn history(&self) -> Vec<VoiceCommand> {
        self.history.lock().to_vec()
    }

    /// # Errors
    /// Returns an error if the cleared history cannot be persisted.
    pub fn clear_history(&self) -> Result<()> {
        let mut history = self.history.lock();
        history.clear();
        history.persist(self.kv.as_ref()).inspect_err(|_| {
            EngineDiagnostics::bump(&self.diagnostics.persistence_failures);
        })?;
        info!("command history cleared");
        Ok(())
    }

    pub fn settings(&self) -> VoiceSettings {
        self.settings.read().clone()
    }

    /// Normalise, persist and apply new voice settings. The next session
    /// picks up changed listening options.
    ///
    /// # Errors
    /// Returns an error if the settings cannot be persisted; the previous
    /// settings stay in effect.
    pub fn update_settings(&self, mut settings: VoiceSettings) -> Result<VoiceSettings> {
        settings.normalize();
        save_voice_settings(self.kv.as_ref(), &settings).inspect_err(|_| {
            EngineDiagnostics::bump(&self.diagnostics.persistence_failures);
        })?;
        *self.settings.write() = settings.clone();
        debug!(?settings, "voice settings updated");
        Ok(settings)
    }

    /// Current session status (snapshot).
    pub fn status(&self) -> SessionStatus {
        *self.status.lock()
    }

    pub fn subscribe_commands(&self) -> broadcast::Receiver<CommandEvent> {
        self.command_tx.subscribe()
    }

    /// Subscribe to live transcript events (partials included).
    pub fn subscribe_transcripts(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.transcript_tx.subscribe()
    }

    pub fn subscribe_status(&self) -> broadcast::Receiver<SessionStatusEvent> {
        self.status_tx.subscribe()
    }

    pub fn diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ── Internal helpers ─────────────────────────────────────────────────────

    /// Close session `id` if it is still the open one. Returns whether it was.
    fn end_session(&self, id: u64, status: SessionStatus, detail: Option<String>) -> bool {
        let mut session = self.session.lock();
        if session.id != id || !session.is_open() {
            return false;
        }
        session.close();
        self.set_status(status, detail);
        true
    }

    /// Close session `id` keeping its last partial transcript for processing.
    fn take_partial_and_end(&self, id: u64) -> Option<String> {
        let mut session = self.session.lock();
        if session.id != id || !session.is_open() {
            return None;
        }
        let partial = session.partial.take();
        session.close();
        self.set_status(SessionStatus::Processing, None);
        Some(partial.unwrap_or_default())
    }

    /// Run a finished utterance; empty text ends the session quietly.
    fn finish_transcript(&self, text: &str) -> Option<VoiceCommand> {
        let text = text.trim();
        if text.is_empty() {
            debug!("ignoring empty final transcript");
            self.set_status(SessionStatus::Stopped, None);
            return None;
        }
        Some(self.process_transcript(text))
    }

    fn persist_history(&self, history: &CommandHistory) {
        if let Err(e) = history.persist(self.kv.as_ref()) {
            EngineDiagnostics::bump(&self.diagnostics.persistence_failures);
            warn!("failed to persist command history: {e}");
        }
    }

    fn broadcast_transcript(&self, segment: TranscriptSegment) {
        let _ = self.transcript_tx.send(TranscriptEvent {
            seq: self.next_seq(),
            segments: vec![segment],
        });
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn set_status(&self, new_status: SessionStatus, detail: Option<String>) {
        *self.status.lock() = new_status;
        let _ = self.status_tx.send(SessionStatusEvent {
            status: new_status,
            detail,
        });
    }
}
