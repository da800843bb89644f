//! Console stand-in for a speech recognizer.
//!
//! A background thread reads stdin line by line into a channel. Each
//! listening session spawns a worker that takes exactly one line and reports
//! it as a partial (first word) followed by a final segment. Lines starting
//! with `:` are host directives: they are handed to the REPL through
//! [`ConsoleHandle`] and end the session without a transcript.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::debug;

use footprint_core::error::{FootprintError, Result};
use footprint_core::feedback::SpeechSynthesizer;
use footprint_core::ipc::events::TranscriptSegment;
use footprint_core::recognizer::{ListenOptions, RecognizerEvent, SpeechRecognizer};

/// How often a waiting worker checks for cancellation.
const POLL_SLICE: Duration = Duration::from_millis(50);

/// Prefix marking a console directive rather than an utterance.
pub const DIRECTIVE_PREFIX: char = ':';

/// Host side of the console recognizer.
#[derive(Debug, Clone)]
pub struct ConsoleHandle {
    directives: Receiver<String>,
    closed: Arc<AtomicBool>,
}

impl ConsoleHandle {
    pub fn next_directive(&self) -> Option<String> {
        self.directives.try_recv().ok()
    }

    /// Input reached end of file.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct ConsoleRecognizer {
    lines: Receiver<String>,
    /// Lines taken by a worker after its session was cancelled.
    pending: Arc<Mutex<VecDeque<String>>>,
    directives: Sender<String>,
    closed: Arc<AtomicBool>,
    cancel: Option<Arc<AtomicBool>>,
    sessions: u64,
}

impl ConsoleRecognizer {
    /// Recognizer fed from the process's stdin.
    pub fn stdin() -> Result<(Self, ConsoleHandle)> {
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::Builder::new()
            .name("console-stdin".into())
            .spawn(move || {
                for line in std::io::stdin().lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                debug!("stdin closed");
            })?;
        Ok(Self::from_lines(rx))
    }

    /// Recognizer fed from any line channel; disconnection means end of input.
    pub fn from_lines(lines: Receiver<String>) -> (Self, ConsoleHandle) {
        let (directives_tx, directives_rx) = crossbeam_channel::unbounded();
        let closed = Arc::new(AtomicBool::new(false));
        let recognizer = Self {
            lines,
            pending: Arc::new(Mutex::new(VecDeque::new())),
            directives: directives_tx,
            closed: Arc::clone(&closed),
            cancel: None,
            sessions: 0,
        };
        let handle = ConsoleHandle {
            directives: directives_rx,
            closed,
        };
        (recognizer, handle)
    }
}

impl SpeechRecognizer for ConsoleRecognizer {
    fn start(&mut self, options: &ListenOptions, events: Sender<RecognizerEvent>) -> Result<()> {
        self.stop();
        if self.closed.load(Ordering::SeqCst) && self.pending.lock().is_empty() {
            let _ = events.send(RecognizerEvent::Ended);
            return Ok(());
        }

        self.sessions += 1;
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(Arc::clone(&cancel));

        let worker = SessionWorker {
            id: format!("console-{}", self.sessions),
            lines: self.lines.clone(),
            pending: Arc::clone(&self.pending),
            directives: self.directives.clone(),
            closed: Arc::clone(&self.closed),
            cancel,
            events,
            deadline: Instant::now() + options.listen_for,
            partial_results: options.partial_results,
        };
        thread::Builder::new()
            .name("console-session".into())
            .spawn(move || worker.run())
            .map_err(|e| FootprintError::Recognizer(e.to_string()))?;
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::SeqCst);
        }
    }
}

struct SessionWorker {
    id: String,
    lines: Receiver<String>,
    pending: Arc<Mutex<VecDeque<String>>>,
    directives: Sender<String>,
    closed: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    events: Sender<RecognizerEvent>,
    deadline: Instant,
    partial_results: bool,
}

impl SessionWorker {
    fn run(self) {
        loop {
            if self.cancel.load(Ordering::SeqCst) {
                return;
            }
            if let Some(line) = self.pending.lock().pop_front() {
                self.deliver(line);
                return;
            }
            let now = Instant::now();
            if now >= self.deadline {
                let _ = self.events.send(RecognizerEvent::Ended);
                return;
            }

            match self.lines.recv_timeout((self.deadline - now).min(POLL_SLICE)) {
                Ok(line) => {
                    if self.cancel.load(Ordering::SeqCst) {
                        self.pending.lock().push_back(line);
                        return;
                    }
                    self.deliver(line);
                    return;
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    self.closed.store(true, Ordering::SeqCst);
                    let _ = self.events.send(RecognizerEvent::Ended);
                    return;
                }
            }
        }
    }

    fn deliver(&self, line: String) {
        let text = line.trim();
        if text.starts_with(DIRECTIVE_PREFIX) {
            let _ = self.directives.send(text.to_string());
            let _ = self.events.send(RecognizerEvent::Ended);
            return;
        }

        if self.partial_results {
            if let Some(first) = text.split_whitespace().next() {
                let _ = self.events.send(RecognizerEvent::Transcript(
                    TranscriptSegment::partial(self.id.clone(), first),
                ));
            }
        }
        let _ = self.events.send(RecognizerEvent::Transcript(
            TranscriptSegment::final_with_confidence(self.id.clone(), text, Some(1.0)),
        ));
    }
}

/// Prints spoken replies to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSpeaker;

impl SpeechSynthesizer for ConsoleSpeaker {
    fn speak(&self, text: &str) -> Result<()> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "🔊 {text}")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use footprint_core::ipc::events::SegmentKind;

    fn options(listen_for: Duration) -> ListenOptions {
        ListenOptions {
            listen_for,
            ..ListenOptions::default()
        }
    }

    fn start(recognizer: &mut ConsoleRecognizer, listen_for: Duration) -> Receiver<RecognizerEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        recognizer.start(&options(listen_for), tx).expect("start");
        rx
    }

    fn recv(rx: &Receiver<RecognizerEvent>) -> RecognizerEvent {
        rx.recv_timeout(Duration::from_secs(2)).expect("recognizer event")
    }

    #[test]
    fn line_becomes_partial_then_final() {
        let (lines_tx, lines_rx) = crossbeam_channel::unbounded();
        let (mut recognizer, _handle) = ConsoleRecognizer::from_lines(lines_rx);
        lines_tx.send("  log 5 km ".to_string()).expect("send");

        let rx = start(&mut recognizer, Duration::from_secs(2));
        match (recv(&rx), recv(&rx)) {
            (RecognizerEvent::Transcript(partial), RecognizerEvent::Transcript(fin)) => {
                assert_eq!(partial.kind, SegmentKind::Partial);
                assert_eq!(partial.text, "log");
                assert_eq!(fin.kind, SegmentKind::Final);
                assert_eq!(fin.text, "log 5 km");
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn directives_go_to_the_host() {
        let (lines_tx, lines_rx) = crossbeam_channel::unbounded();
        let (mut recognizer, handle) = ConsoleRecognizer::from_lines(lines_rx);
        lines_tx.send(":history".to_string()).expect("send");

        let rx = start(&mut recognizer, Duration::from_secs(2));
        assert_eq!(recv(&rx), RecognizerEvent::Ended);
        assert_eq!(handle.next_directive().as_deref(), Some(":history"));
    }

    #[test]
    fn end_of_input_ends_the_session_and_closes_the_handle() {
        let (lines_tx, lines_rx) = crossbeam_channel::unbounded::<String>();
        let (mut recognizer, handle) = ConsoleRecognizer::from_lines(lines_rx);
        drop(lines_tx);

        let rx = start(&mut recognizer, Duration::from_secs(2));
        assert_eq!(recv(&rx), RecognizerEvent::Ended);
        assert!(handle.is_closed());

        let rx = start(&mut recognizer, Duration::from_secs(2));
        assert_eq!(recv(&rx), RecognizerEvent::Ended);
    }

    #[test]
    fn silent_session_ends_at_deadline() {
        let (_lines_tx, lines_rx) = crossbeam_channel::unbounded::<String>();
        let (mut recognizer, handle) = ConsoleRecognizer::from_lines(lines_rx);

        let rx = start(&mut recognizer, Duration::from_millis(20));
        assert_eq!(recv(&rx), RecognizerEvent::Ended);
        assert!(!handle.is_closed());
    }

    #[test]
    fn stopped_session_leaves_the_next_line_for_the_next_session() {
        let (lines_tx, lines_rx) = crossbeam_channel::unbounded();
        let (mut recognizer, _handle) = ConsoleRecognizer::from_lines(lines_rx);

        let stale = start(&mut recognizer, Duration::from_secs(2));
        recognizer.stop();
        lines_tx.send("karbon ayak izi nedir".to_string()).expect("send");

        let rx = start(&mut recognizer, Duration::from_secs(2));
        let final_text = loop {
            match recv(&rx) {
                RecognizerEvent::Transcript(s) if s.kind == SegmentKind::Final => break s.text,
                RecognizerEvent::Transcript(_) => continue,
                other => panic!("unexpected event: {other:?}"),
            }
        };
        assert_eq!(final_text, "karbon ayak izi nedir");
        assert!(stale.try_recv().is_err());
    }
}
