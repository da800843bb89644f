//! Rolling voice command history.
//!
//! Most-recent-first, capped at [`HISTORY_CAPACITY`]; the oldest entry is
//! evicted on overflow. Persisted as a JSON array under
//! [`HISTORY_STORAGE_KEY`] after every mutation.

use std::collections::VecDeque;

use tracing::warn;

use crate::command::VoiceCommand;
use crate::error::Result;
use crate::storage::KeyValueStore;

pub const HISTORY_CAPACITY: usize = 50;
pub const HISTORY_STORAGE_KEY: &str = "voice_command_history";

#[derive(Debug, Clone, Default)]
pub struct CommandHistory {
    entries: VecDeque<VoiceCommand>,
}

impl CommandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the stored history. A missing key yields an empty history; a
    /// corrupt value is logged and discarded.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let Some(raw) = store.get(HISTORY_STORAGE_KEY)? else {
            return Ok(Self::new());
        };
        match serde_json::from_str::<Vec<VoiceCommand>>(&raw) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_CAPACITY);
                Ok(Self {
                    entries: entries.into(),
                })
            }
            Err(e) => {
                warn!("discarding unreadable command history: {e}");
                Ok(Self::new())
            }
        }
    }

    pub fn persist(&self, store: &dyn KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        store.set(HISTORY_STORAGE_KEY, &json)
    }

    /// Insert at the front, evicting the oldest entry past capacity.
    pub fn push(&mut self, command: VoiceCommand) {
        self.entries.push_front(command);
        self.entries.truncate(HISTORY_CAPACITY);
    }

    /// Replace the in-progress entry recorded at the same timestamp. If it was
    /// evicted or never recorded, the completed command is pushed instead.
    pub fn complete(&mut self, command: VoiceCommand) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.timestamp == command.timestamp && !e.executed)
        {
            Some(slot) => *slot = command,
            None => self.push(command),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &VoiceCommand> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<VoiceCommand> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandParams;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn command_at(n: i64) -> VoiceCommand {
        let ts = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(n);
        VoiceCommand::at(format!("command {n}"), CommandParams::Unknown, ts)
    }

    #[test]
    fn keeps_the_fifty_most_recent_newest_first() {
        let mut history = CommandHistory::new();
        for n in 0..75 {
            history.push(command_at(n));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        let transcripts: Vec<_> = history.entries().map(|c| c.transcript.clone()).collect();
        assert_eq!(transcripts.first().map(String::as_str), Some("command 74"));
        assert_eq!(transcripts.last().map(String::as_str), Some("command 25"));
    }

    #[test]
    fn complete_replaces_pending_entry_in_place() {
        let mut history = CommandHistory::new();
        let older = command_at(1);
        let pending = command_at(2);
        history.push(older.clone());
        history.push(pending.clone());

        history.complete(pending.completed("done"));

        assert_eq!(history.len(), 2);
        let latest = history.entries().next().expect("latest");
        assert!(latest.executed);
        assert_eq!(latest.response.as_deref(), Some("done"));
        assert!(!history.to_vec()[1].executed);
    }

    #[test]
    fn complete_without_pending_entry_pushes() {
        let mut history = CommandHistory::new();
        history.complete(command_at(1).completed("done"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn persists_as_json_array_under_fixed_key() {
        let store = MemoryStore::new();
        let mut history = CommandHistory::new();
        history.push(command_at(1));
        history.push(command_at(2));
        history.persist(&store).expect("persist");

        let raw = store
            .get(HISTORY_STORAGE_KEY)
            .expect("get")
            .expect("history stored");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
        let array = json.as_array().expect("array");
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["transcript"], "command 2");

        let loaded = CommandHistory::load(&store).expect("load");
        assert_eq!(loaded.to_vec(), history.to_vec());
    }

    #[test]
    fn corrupt_history_loads_empty() {
        let store = MemoryStore::new();
        store.set(HISTORY_STORAGE_KEY, "{not json").expect("set");
        let loaded = CommandHistory::load(&store).expect("load");
        assert!(loaded.is_empty());
    }
}
