use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use chrono::Duration as ChronoDuration;
use parking_lot::Mutex;
use tokio::sync::broadcast::error::TryRecvError;

use footprint_core::command::{CommandParams, GoalPeriod};
use footprint_core::executor::{knowledge, HELP_MESSAGE};
use footprint_core::feedback::{Notifier, SpeechSynthesizer};
use footprint_core::goals::{GoalType, MemoryGoalTracker};
use footprint_core::history::HISTORY_STORAGE_KEY;
use footprint_core::recognizer::scripted::Script;
use footprint_core::recognizer::ScriptedRecognizer;
use footprint_core::storage::MemoryStore;
use footprint_core::{
    ActivityCategory, Collaborators, EngineConfig, FootprintError, Intent, KeyValueStore,
    SessionStatus, Unit, VoiceEngine, VoiceSettings, HISTORY_CAPACITY,
};

#[derive(Default)]
struct RecordingSpeech {
    spoken: Mutex<Vec<String>>,
    fail: bool,
}

impl SpeechSynthesizer for RecordingSpeech {
    fn speak(&self, text: &str) -> footprint_core::Result<()> {
        if self.fail {
            return Err(FootprintError::Synthesis("no voice installed".into()));
        }
        self.spoken.lock().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    shown: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn show_smart_suggestion(&self, text: &str) {
        self.shown.lock().push(text.to_string());
    }
}

struct Harness {
    engine: VoiceEngine,
    store: Arc<MemoryStore>,
    goals: Arc<MemoryGoalTracker>,
    speech: Arc<RecordingSpeech>,
    notifier: Arc<RecordingNotifier>,
    script: Arc<Mutex<std::collections::VecDeque<Script>>>,
}

fn harness_with_speech(speech: RecordingSpeech) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let goals = Arc::new(MemoryGoalTracker::new());
    let speech = Arc::new(speech);
    let notifier = Arc::new(RecordingNotifier::default());
    let recognizer = ScriptedRecognizer::new();
    let script = recognizer.queue();

    let engine = VoiceEngine::new(
        EngineConfig::default(),
        Collaborators {
            activities: store.clone(),
            goals: goals.clone(),
            kv: store.clone(),
            recognizer: Box::new(recognizer),
            synthesizer: speech.clone(),
            notifier: notifier.clone(),
        },
    )
    .expect("engine");

    Harness {
        engine,
        store,
        goals,
        speech,
        notifier,
        script,
    }
}

fn harness() -> Harness {
    harness_with_speech(RecordingSpeech::default())
}

impl Harness {
    fn say(&self, text: &str) {
        self.script.lock().push_back(Script::Utterance {
            text: text.into(),
            confidence: 0.9,
        });
    }

    fn listen(&self) -> Option<footprint_core::VoiceCommand> {
        assert!(self.engine.start_listening().expect("start listening"));
        self.engine
            .await_command(Duration::from_secs(2))
            .expect("await command")
    }
}

#[test]
fn turkish_activity_is_logged_spoken_and_notified() {
    let h = harness();
    h.say("bugün 5 kilometre araç kullandım");

    let command = h.listen().expect("command");
    assert_eq!(command.intent, Intent::AddActivity);
    let CommandParams::AddActivity(params) = &command.parameters else {
        panic!("expected activity params, got {:?}", command.parameters);
    };
    assert_eq!(params.category, Some(ActivityCategory::Transport));
    assert_eq!(params.unit, Some(Unit::Kilometer));
    assert_relative_eq!(params.original_amount.expect("quantity"), 5.0);
    assert_relative_eq!(params.amount.expect("co2"), 1.0);

    let response = "Logged 5 km of transport: 1.00 kg CO2.";
    assert!(command.executed);
    assert_eq!(command.response.as_deref(), Some(response));
    assert_eq!(h.store.activity_count(), 1);
    assert_eq!(*h.speech.spoken.lock(), vec![response.to_string()]);
    assert_eq!(*h.notifier.shown.lock(), vec![format!("✅ {response}")]);
}

#[test]
fn carbon_footprint_question_gets_definition() {
    let h = harness();
    h.say("karbon ayak izi nedir");

    let command = h.listen().expect("command");
    assert_eq!(command.intent, Intent::AskQuestion);
    assert_eq!(
        command.response.as_deref(),
        Some(knowledge::CARBON_FOOTPRINT_DEFINITION)
    );
}

#[test]
fn daily_goal_is_created_for_one_day() {
    let h = harness();
    h.say("günlük 12 kilogram hedef belirle");

    let command = h.listen().expect("command");
    assert_eq!(command.intent, Intent::SetGoal);
    match command.parameters {
        CommandParams::SetGoal(params) => {
            assert_eq!(params.period, GoalPeriod::Daily);
            assert_relative_eq!(params.amount.expect("amount"), 12.0);
        }
        other => panic!("expected goal params, got {other:?}"),
    }

    let goals = h.goals.goals();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].goal_type, GoalType::Daily);
    assert_eq!(goals[0].ends_at - goals[0].started_at, ChronoDuration::days(1));
}

#[test]
fn gibberish_gets_help_with_failure_glyph() {
    let h = harness();
    h.say("asdkjf");

    let command = h.listen().expect("command");
    assert_eq!(command.intent, Intent::Unknown);
    assert_eq!(command.response.as_deref(), Some(HELP_MESSAGE));
    assert_eq!(*h.notifier.shown.lock(), vec![format!("❌ {HELP_MESSAGE}")]);
    assert_eq!(h.engine.diagnostics_snapshot().commands_failed, 1);
}

#[test]
fn history_keeps_fifty_most_recent_and_persists_them() {
    let h = harness();
    for n in 0..60 {
        h.engine.process_transcript(&format!("log {n} km"));
    }

    let history = h.engine.history();
    assert_eq!(history.len(), HISTORY_CAPACITY);
    assert_eq!(history[0].transcript, "log 59 km");
    assert_eq!(history[HISTORY_CAPACITY - 1].transcript, "log 10 km");
    assert!(history.iter().all(|c| c.executed));

    let raw = h
        .store
        .get(HISTORY_STORAGE_KEY)
        .expect("kv read")
        .expect("history stored");
    let stored: Vec<serde_json::Value> = serde_json::from_str(&raw).expect("json array");
    assert_eq!(stored.len(), HISTORY_CAPACITY);
    assert_eq!(stored[0]["transcript"], "log 59 km");
}

#[test]
fn starting_twice_is_a_no_op() {
    let h = harness();
    h.script.lock().push_back(Script::PartialOnly("log".into()));

    assert!(h.engine.start_listening().expect("first start"));
    assert!(!h.engine.start_listening().expect("second start"));
    assert_eq!(h.engine.diagnostics_snapshot().sessions_started, 1);
    assert_eq!(h.engine.status(), SessionStatus::Listening);
}

#[test]
fn stopping_discards_partial_transcript() {
    let h = harness();
    let mut transcripts = h.engine.subscribe_transcripts();
    h.script
        .lock()
        .push_back(Script::PartialOnly("bugün 5".into()));
    h.say("karbon ayak izi nedir");

    assert!(h.engine.start_listening().expect("start"));
    h.engine.stop_listening().expect("stop");
    assert_eq!(h.engine.status(), SessionStatus::Stopped);
    assert!(h.engine.history().is_empty());
    assert!(matches!(
        h.engine.stop_listening(),
        Err(FootprintError::NotListening)
    ));

    let command = h.listen().expect("command");
    assert_eq!(command.transcript, "karbon ayak izi nedir");
    assert_eq!(h.engine.history().len(), 1);
    assert_eq!(h.store.activity_count(), 0);

    let first = transcripts.try_recv().expect("partial of second session");
    assert_eq!(first.segments[0].text, "karbon");
}

#[test]
fn recognizer_error_yields_no_command_and_error_status() {
    let h = harness();
    let mut statuses = h.engine.subscribe_status();
    h.script
        .lock()
        .push_back(Script::Failure("network unavailable".into()));

    assert!(h.engine.start_listening().expect("start"));
    let outcome = h
        .engine
        .await_command(Duration::from_secs(1))
        .expect("await");
    assert!(outcome.is_none());
    assert_eq!(h.engine.status(), SessionStatus::Error);
    assert!(!h.engine.is_listening());
    assert_eq!(h.engine.diagnostics_snapshot().recognizer_errors, 1);

    let listening = statuses.try_recv().expect("listening status");
    assert_eq!(listening.status, SessionStatus::Listening);
    let failed = statuses.try_recv().expect("error status");
    assert_eq!(failed.status, SessionStatus::Error);
    assert_eq!(failed.detail.as_deref(), Some("network unavailable"));

    h.say("asdkjf");
    assert!(h.listen().is_some());
}

#[test]
fn exhausted_input_ends_session_without_command() {
    let h = harness();
    assert!(h.listen().is_none());
    assert_eq!(h.engine.status(), SessionStatus::Stopped);
}

#[test]
fn empty_final_transcript_is_ignored() {
    let h = harness();
    h.say("   ");
    assert!(h.listen().is_none());
    assert!(h.engine.history().is_empty());
    assert_eq!(h.engine.diagnostics_snapshot().commands_executed, 0);
}

#[test]
fn feedback_channels_follow_voice_settings() {
    let h = harness();
    h.engine
        .update_settings(VoiceSettings {
            voice_feedback_enabled: false,
            notifications_enabled: false,
            ..VoiceSettings::default()
        })
        .expect("update settings");

    h.engine.process_transcript("log 3 km");
    assert!(h.speech.spoken.lock().is_empty());
    assert!(h.notifier.shown.lock().is_empty());
    assert_eq!(h.store.activity_count(), 1);
}

#[test]
fn synthesis_failure_does_not_affect_the_command() {
    let h = harness_with_speech(RecordingSpeech {
        fail: true,
        ..RecordingSpeech::default()
    });
    let command = h.engine.process_transcript("log 3 km");
    assert!(command.executed);
    assert_eq!(h.store.activity_count(), 1);
    assert_eq!(h.notifier.shown.lock().len(), 1);
}

#[test]
fn command_event_is_broadcast_after_history_is_persisted() {
    let h = harness();
    let mut commands = h.engine.subscribe_commands();

    h.engine.process_transcript("how much today");
    let event = commands.try_recv().expect("command event");
    assert!(event.succeeded);
    assert_eq!(event.command.intent, Intent::GetStats);

    let raw = h
        .store
        .get(HISTORY_STORAGE_KEY)
        .expect("kv read")
        .expect("history stored");
    assert!(raw.contains("how much today"));
    assert!(matches!(commands.try_recv(), Err(TryRecvError::Empty)));
}
