//! Console meta-commands.
//!
//! Lines starting with `:` never reach the interpreter; they are parsed into
//! a [`ConsoleCommand`] and run against [`AppState`] directly.

use std::io::Write;
use std::str::FromStr;

use anyhow::Context;
use thiserror::Error;
use tracing::info;

use crate::console::DIRECTIVE_PREFIX;
use crate::state::AppState;

pub const CONSOLE_HELP: &str = "\
Speak by typing a sentence, e.g. \"bugün 5 kilometre araç kullandım\".
  :history        recent commands, newest first
  :clear          forget the command history
  :stats          today / week / month totals
  :goals          active goals and their progress
  :speak on|off   spoken replies
  :notify on|off  notifications
  :diag           engine counters
  :help           this text
  :quit           exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    History,
    Clear,
    Stats,
    Goals,
    Speak(bool),
    Notify(bool),
    Diag,
    Help,
    Quit,
}

/// Whether the REPL keeps running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown console command {0:?} (try :help)")]
pub struct ParseCommandError(String);

fn parse_switch(arg: Option<&str>) -> Option<bool> {
    match arg?.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

impl FromStr for ConsoleCommand {
    type Err = ParseCommandError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let err = || ParseCommandError(raw.trim().to_string());
        let line = raw.trim().strip_prefix(DIRECTIVE_PREFIX).ok_or_else(err)?;
        let mut words = line.split_whitespace();
        let name = words.next().ok_or_else(err)?.to_ascii_lowercase();
        let arg = words.next();
        if words.next().is_some() {
            return Err(err());
        }

        let command = match (name.as_str(), arg) {
            ("history", None) => Self::History,
            ("clear", None) => Self::Clear,
            ("stats", None) => Self::Stats,
            ("goals", None) => Self::Goals,
            ("speak", arg) => Self::Speak(parse_switch(arg).ok_or_else(err)?),
            ("notify", arg) => Self::Notify(parse_switch(arg).ok_or_else(err)?),
            ("diag", None) => Self::Diag,
            ("help" | "?", None) => Self::Help,
            ("quit" | "exit" | "q", None) => Self::Quit,
            _ => return Err(err()),
        };
        Ok(command)
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Run one console command, writing its output to `out`.
pub fn run(state: &AppState, command: ConsoleCommand, out: &mut impl Write) -> anyhow::Result<Flow> {
    match command {
        ConsoleCommand::History => {
            let history = state.engine.history();
            if history.is_empty() {
                writeln!(out, "No commands yet.")?;
            }
            for entry in history {
                writeln!(
                    out,
                    "{}  {:<12} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    format!("{:?}", entry.intent),
                    entry.transcript
                )?;
                if let Some(response) = &entry.response {
                    writeln!(out, "                   → {response}")?;
                }
            }
        }
        ConsoleCommand::Clear => {
            state
                .engine
                .clear_history()
                .context("clearing command history")?;
            writeln!(out, "History cleared.")?;
        }
        ConsoleCommand::Stats => {
            let stats = state
                .activities
                .dashboard_stats()
                .context("reading dashboard statistics")?;
            writeln!(out, "Today:     {:>8.2} kg CO2", stats.today_total)?;
            writeln!(out, "Yesterday: {:>8.2} kg CO2", stats.yesterday_total)?;
            writeln!(
                out,
                "Week:      {:>8.2} kg CO2 (avg {:.2}/day)",
                stats.week_total, stats.weekly_average
            )?;
            writeln!(out, "Month:     {:>8.2} kg CO2", stats.month_total)?;
            writeln!(out, "Activities logged: {}", stats.activity_count)?;
        }
        ConsoleCommand::Goals => {
            let goals = state.goals.active_goals().context("reading active goals")?;
            if goals.is_empty() {
                writeln!(out, "No active goals.")?;
            }
            for goal in goals {
                writeln!(
                    out,
                    "{}: {:.2} / {} kg CO2 ({:.0}%), ends {}",
                    goal.title,
                    goal.current_value,
                    goal.target_value,
                    goal.progress_percent(),
                    goal.ends_at.format("%Y-%m-%d %H:%M")
                )?;
            }
        }
        ConsoleCommand::Speak(enabled) => {
            let mut settings = state.engine.settings();
            settings.voice_feedback_enabled = enabled;
            state
                .engine
                .update_settings(settings)
                .context("saving voice settings")?;
            info!(enabled, "voice feedback toggled");
            writeln!(out, "Spoken replies {}.", on_off(enabled))?;
        }
        ConsoleCommand::Notify(enabled) => {
            let mut settings = state.engine.settings();
            settings.notifications_enabled = enabled;
            state
                .engine
                .update_settings(settings)
                .context("saving voice settings")?;
            info!(enabled, "notifications toggled");
            writeln!(out, "Notifications {}.", on_off(enabled))?;
        }
        ConsoleCommand::Diag => {
            let snapshot = state.engine.diagnostics_snapshot();
            writeln!(out, "Settings: {}", state.settings_path.display())?;
            writeln!(out, "Database: {}", state.database_path.display())?;
            writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
        }
        ConsoleCommand::Help => writeln!(out, "{CONSOLE_HELP}")?,
        ConsoleCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}
