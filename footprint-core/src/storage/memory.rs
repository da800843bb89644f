//! Process-local store for tests and `--db :memory:` sessions.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};

use super::{ActivityRecord, ActivityStore, DashboardStats, KeyValueStore};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct MemoryStore {
    activities: RwLock<Vec<(String, ActivityRecord)>>,
    values: Mutex<HashMap<String, String>>,
    next_id: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of stored activities, oldest first.
    pub fn activities(&self) -> Vec<ActivityRecord> {
        self.activities
            .read()
            .iter()
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub fn activity_count(&self) -> usize {
        self.activities.read().len()
    }
}

impl ActivityStore for MemoryStore {
    fn add_activity(&self, record: ActivityRecord) -> Result<String> {
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            format!("act-{}", *next)
        };
        self.activities.write().push((id.clone(), record));
        Ok(id)
    }

    fn dashboard_stats(&self) -> Result<DashboardStats> {
        let guard = self.activities.read();
        Ok(DashboardStats::from_records(
            guard.iter().map(|(_, record)| record),
            Utc::now(),
        ))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}
