//! Host application state.
//!
//! `AppState` owns the engine and the collaborators it was built from, so
//! console commands can query storage directly without going through speech.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use footprint_core::feedback::log::LogNotifier;
use footprint_core::feedback::SpeechSynthesizer;
use footprint_core::goals::MemoryGoalTracker;
use footprint_core::storage::MemoryStore;
use footprint_core::{
    ActivityStore, Collaborators, EngineConfig, GoalTracker, KeyValueStore, SpeechRecognizer,
    VoiceEngine,
};

use crate::settings::MEMORY_DATABASE;
use crate::storage::LocalStore;

/// Shared application state, available to every console command.
pub struct AppState {
    pub engine: Arc<VoiceEngine>,
    pub activities: Arc<dyn ActivityStore>,
    pub goals: Arc<dyn GoalTracker>,
    /// Absolute path to `settings.json`.
    pub settings_path: PathBuf,
    pub database_path: PathBuf,
}

struct Stores {
    activities: Arc<dyn ActivityStore>,
    goals: Arc<dyn GoalTracker>,
    kv: Arc<dyn KeyValueStore>,
}

fn open_stores(database_path: &Path) -> anyhow::Result<Stores> {
    if database_path.as_os_str() == MEMORY_DATABASE {
        let store = Arc::new(MemoryStore::new());
        return Ok(Stores {
            activities: store.clone(),
            goals: Arc::new(MemoryGoalTracker::new()),
            kv: store,
        });
    }

    let store = Arc::new(
        LocalStore::new(database_path.to_path_buf())
            .with_context(|| format!("opening database {}", database_path.display()))?,
    );
    Ok(Stores {
        activities: store.clone(),
        goals: store.clone(),
        kv: store,
    })
}

impl AppState {
    pub fn build(
        settings_path: PathBuf,
        database_path: PathBuf,
        recognizer: Box<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> anyhow::Result<Self> {
        let stores = open_stores(&database_path)?;
        let engine = VoiceEngine::new(
            EngineConfig::default(),
            Collaborators {
                activities: stores.activities.clone(),
                goals: stores.goals.clone(),
                kv: stores.kv,
                recognizer,
                synthesizer,
                notifier: Arc::new(LogNotifier),
            },
        )
        .context("starting voice engine")?;

        info!(database = %database_path.display(), "app state ready");
        Ok(Self {
            engine: Arc::new(engine),
            activities: stores.activities,
            goals: stores.goals,
            settings_path,
            database_path,
        })
    }
}
