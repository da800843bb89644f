//! Footprint console host.
//!
//! Each line typed on stdin stands in for one spoken utterance. Lines
//! starting with `:` are console commands (`:help` lists them). Replies are
//! printed with a 🔊 prefix where a phone would speak them.

mod commands;
mod console;
mod settings;
mod state;
mod storage;

use std::fmt::Debug;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use footprint_core::feedback::{LogSynthesizer, SpeechSynthesizer};
use footprint_core::ipc::events::SegmentKind;
use footprint_core::recognizer::ScriptedRecognizer;
use footprint_core::VoiceCommand;

use commands::{ConsoleCommand, Flow, CONSOLE_HELP};
use console::{ConsoleHandle, ConsoleRecognizer, ConsoleSpeaker};
use settings::{default_settings_path, load_settings, save_settings, DEFAULT_LOG_FILTER};
use state::AppState;

/// Extra wait past the recognizer's own deadline before giving up on a session.
const AWAIT_SLACK: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(name = "footprint", version, about = "Voice commands for carbon-footprint tracking")]
struct Cli {
    /// Path to settings.json.
    #[arg(long, env = "FOOTPRINT_SETTINGS")]
    settings: Option<PathBuf>,

    /// SQLite database path, or `:memory:` for a throwaway session.
    #[arg(long, env = "FOOTPRINT_DB")]
    db: Option<PathBuf>,

    /// Run a single transcript and exit.
    #[arg(long, value_name = "TEXT")]
    say: Option<String>,

    /// Do not speak replies in this session.
    #[arg(long)]
    quiet: bool,
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Drain a broadcast channel on its own thread until the engine goes away.
fn spawn_observer<T, F>(name: &str, mut rx: broadcast::Receiver<T>, mut handle: F) -> io::Result<()>
where
    T: Clone + Debug + Send + 'static,
    F: FnMut(T) + Send + 'static,
{
    thread::Builder::new().name(name.into()).spawn(move || loop {
        match rx.blocking_recv() {
            Ok(event) => handle(event),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "observer lagged"),
            Err(RecvError::Closed) => break,
        }
    })?;
    Ok(())
}

fn print_reply(out: &mut impl Write, command: &VoiceCommand) -> io::Result<()> {
    if let Some(response) = &command.response {
        writeln!(out, "{response}")?;
    }
    Ok(())
}

fn repl(state: &AppState, console: &ConsoleHandle, speaks: bool) -> anyhow::Result<()> {
    let mut out = io::stdout();
    writeln!(out, "{CONSOLE_HELP}")?;
    let mut prompt = true;

    loop {
        if prompt {
            write!(out, "🎤 ")?;
            out.flush()?;
        }
        state
            .engine
            .start_listening()
            .context("starting a listening session")?;

        let listen_for = Duration::from_secs(state.engine.settings().listen_for_secs);
        prompt = false;
        if let Some(command) = state.engine.await_command(listen_for + AWAIT_SLACK)? {
            if !(speaks && state.engine.settings().voice_feedback_enabled) {
                print_reply(&mut out, &command)?;
            }
            prompt = true;
            continue;
        }

        while let Some(line) = console.next_directive() {
            prompt = true;
            match line.parse::<ConsoleCommand>() {
                Ok(command) => {
                    if commands::run(state, command, &mut out)? == Flow::Quit {
                        return Ok(());
                    }
                }
                Err(e) => writeln!(out, "{e}")?,
            }
        }

        if console.is_closed() {
            writeln!(out)?;
            return Ok(());
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);
    let mut app_settings = load_settings(&settings_path);
    init_tracing(&app_settings.log_filter);

    info!("Footprint starting");
    if !settings_path.exists() {
        if let Err(e) = save_settings(&settings_path, &app_settings) {
            warn!("could not write default settings: {e}");
        }
    }
    if let Some(db) = cli.db {
        app_settings.database_path = Some(db);
    }
    let database_path = app_settings.resolve_database_path(&settings_path);
    info!(
        settings_path = %settings_path.display(),
        database = %database_path.display(),
        speak_responses = app_settings.speak_responses,
        "settings loaded"
    );

    let speaks = app_settings.speak_responses && !cli.quiet;
    let synthesizer: Arc<dyn SpeechSynthesizer> = if speaks {
        Arc::new(ConsoleSpeaker)
    } else {
        Arc::new(LogSynthesizer)
    };

    if let Some(text) = cli.say {
        let state = AppState::build(
            settings_path,
            database_path,
            Box::new(ScriptedRecognizer::new()),
            synthesizer,
        )?;
        let command = state.engine.process_transcript(&text);
        if !(speaks && state.engine.settings().voice_feedback_enabled) {
            print_reply(&mut io::stdout(), &command)?;
        }
        return Ok(());
    }

    let (recognizer, console) = ConsoleRecognizer::stdin().context("reading stdin")?;
    let state = AppState::build(
        settings_path,
        database_path,
        Box::new(recognizer),
        synthesizer,
    )?;

    spawn_observer(
        "transcript-observer",
        state.engine.subscribe_transcripts(),
        |event| {
            for segment in event.segments {
                if segment.kind == SegmentKind::Partial {
                    debug!(seq = event.seq, text = %segment.text, "partial transcript");
                }
            }
        },
    )?;
    spawn_observer("status-observer", state.engine.subscribe_status(), |event| {
        debug!(status = ?event.status, detail = ?event.detail, "session status");
    })?;

    repl(&state, &console, speaks)?;

    let diag = state.engine.diagnostics_snapshot();
    info!(
        sessions_started = diag.sessions_started,
        commands_executed = diag.commands_executed,
        commands_failed = diag.commands_failed,
        recognizer_errors = diag.recognizer_errors,
        persistence_failures = diag.persistence_failures,
        "Footprint exiting"
    );
    Ok(())
}
