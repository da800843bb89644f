//! # footprint-core
//!
//! Voice command pipeline for carbon-footprint tracking.
//!
//! ## Architecture
//!
//! ```text
//! SpeechRecognizer → crossbeam channel → VoiceEngine::await_command
//!                                              │
//!                                   CommandInterpreter::interpret
//!                                              │
//!                                    CommandExecutor::execute ──► ActivityStore / GoalTracker
//!                                              │
//!                        CommandHistory (persisted) → broadcast::Sender<CommandEvent>
//!                                              │
//!                                SpeechSynthesizer / Notifier
//! ```
//!
//! Storage, goal tracking, speech and notifications are collaborator traits;
//! the host constructs them once and hands them to `VoiceEngine::new`.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod command;
pub mod emissions;
pub mod engine;
pub mod error;
pub mod executor;
pub mod feedback;
pub mod goals;
pub mod history;
pub mod interpreter;
pub mod ipc;
pub mod recognizer;
pub mod settings;
pub mod storage;

// Convenience re-exports for downstream crates
pub use command::{CommandParams, ExecutionResult, Intent, VoiceCommand};
pub use emissions::{ActivityCategory, Unit};
pub use engine::{Collaborators, DiagnosticsSnapshot, EngineConfig, VoiceEngine};
pub use error::{FootprintError, Result};
pub use executor::CommandExecutor;
pub use goals::{GoalProgress, GoalTracker, NewGoal};
pub use history::{CommandHistory, HISTORY_CAPACITY};
pub use interpreter::CommandInterpreter;
pub use ipc::events::{CommandEvent, SessionStatus, SessionStatusEvent, TranscriptEvent};
pub use recognizer::{ListenOptions, RecognizerEvent, SpeechRecognizer};
pub use settings::VoiceSettings;
pub use storage::{ActivityRecord, ActivityStore, DashboardStats, KeyValueStore};
