//! SQLite-backed collaborators: activities, goals and the encrypted
//! key-value store the engine keeps history and voice settings in.

use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use footprint_core::emissions::ActivityCategory;
use footprint_core::error::{FootprintError, Result};
use footprint_core::goals::{GoalCategory, GoalProgress, GoalTracker, GoalType, NewGoal};
use footprint_core::storage::{
    ActivityRecord, ActivityStore, DashboardStats, KeyValueStore, MONTH_DAYS, WEEK_DAYS,
};

#[derive(Debug, Clone)]
pub struct LocalStore {
    db_path: PathBuf,
    cipher: TextCipher,
}

#[derive(Debug, Clone)]
struct TextCipher {
    key: [u8; 32],
}

impl TextCipher {
    fn new(scope: &Path) -> Self {
        let username = std::env::var("USERNAME")
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_default();
        let computer = std::env::var("COMPUTERNAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_default();
        let material = format!(
            "{username}|{computer}|{}|footprint-kv-v1",
            scope.to_string_lossy()
        );
        let mut hasher = Sha256::new();
        hasher.update(material.as_bytes());
        let digest = hasher.finalize();
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest[..32]);
        Self { key }
    }

    fn encrypt(&self, plain: &str) -> Result<String> {
        if plain.is_empty() {
            return Ok(String::new());
        }
        let cipher = Aes256Gcm::new_from_slice(&self.key).map_err(storage_err)?;
        let mut nonce_bytes = [0u8; 12];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let encrypted = cipher
            .encrypt(nonce, plain.as_bytes())
            .map_err(storage_err)?;
        let mut out = Vec::with_capacity(12 + encrypted.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&encrypted);
        Ok(BASE64.encode(out))
    }

    fn decrypt(&self, encoded: &str) -> Option<String> {
        if encoded.is_empty() {
            return Some(String::new());
        }
        let bytes = BASE64.decode(encoded).ok()?;
        if bytes.len() <= 12 {
            return None;
        }
        let (nonce_bytes, cipher_bytes) = bytes.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);
        let cipher = Aes256Gcm::new_from_slice(&self.key).ok()?;
        let plain = cipher.decrypt(nonce, cipher_bytes).ok()?;
        String::from_utf8(plain).ok()
    }
}

impl LocalStore {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            cipher: TextCipher::new(&db_path),
            db_path,
        };
        store.init_schema()?;
        debug!(path = %store.db_path.display(), "local store ready");
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path).map_err(storage_err)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS activities (
              id TEXT PRIMARY KEY,
              created_at INTEGER NOT NULL,
              category TEXT NOT NULL,
              quantity REAL NOT NULL,
              co2_amount REAL NOT NULL,
              note TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS goals (
              id TEXT PRIMARY KEY,
              title TEXT NOT NULL,
              description TEXT NOT NULL DEFAULT '',
              goal_type TEXT NOT NULL,
              category TEXT NOT NULL,
              target_value REAL NOT NULL,
              current_value REAL NOT NULL DEFAULT 0,
              started_at INTEGER NOT NULL,
              ends_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv_store (
              key TEXT PRIMARY KEY,
              value_enc TEXT NOT NULL,
              updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_activities_created_at ON activities(created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_goals_window ON goals(started_at, ends_at);
            "#,
        )
        .map_err(storage_err)?;
        Ok(())
    }

    /// Aggregates relative to an explicit `now` (UTC calendar days).
    pub fn dashboard_stats_at(&self, now: DateTime<Utc>) -> Result<DashboardStats> {
        let today = now.date_naive();
        let day_start = |days_back: i64| {
            (today - Duration::days(days_back))
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_micros())
                .unwrap_or_default()
        };
        let tomorrow = day_start(-1);
        let today_start = day_start(0);
        let yesterday_start = day_start(1);
        let week_start = day_start(WEEK_DAYS - 1);
        let month_start = day_start(MONTH_DAYS - 1);

        let conn = self.open()?;
        let (today_total, yesterday_total, week_total, month_total, count) = conn
            .query_row(
                r#"
                SELECT
                  COALESCE(SUM(CASE WHEN created_at >= ?1 AND created_at < ?2 THEN co2_amount END), 0.0),
                  COALESCE(SUM(CASE WHEN created_at >= ?3 AND created_at < ?1 THEN co2_amount END), 0.0),
                  COALESCE(SUM(CASE WHEN created_at >= ?4 AND created_at < ?2 THEN co2_amount END), 0.0),
                  COALESCE(SUM(CASE WHEN created_at >= ?5 AND created_at < ?2 THEN co2_amount END), 0.0),
                  COUNT(CASE WHEN created_at < ?2 THEN 1 END)
                FROM activities
                "#,
                params![today_start, tomorrow, yesterday_start, week_start, month_start],
                |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, f64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .map_err(storage_err)?;

        Ok(DashboardStats {
            today_total,
            yesterday_total,
            week_total,
            month_total,
            weekly_average: week_total / WEEK_DAYS as f64,
            activity_count: count.max(0) as usize,
        })
    }

    /// Goals whose window contains `now`, oldest first.
    pub fn active_goals_at(&self, now: DateTime<Utc>) -> Result<Vec<GoalProgress>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, title, description, goal_type, category, target_value, current_value, started_at, ends_at
                 FROM goals WHERE started_at <= ?1 AND ends_at > ?1 ORDER BY started_at ASC, rowid ASC",
            )
            .map_err(storage_err)?;
        let mut rows = stmt
            .query(params![now.timestamp_micros()])
            .map_err(storage_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(storage_err)? {
            match goal_from_row(row)? {
                Some(goal) => out.push(goal),
                None => warn!("skipping goal row with unknown type or category"),
            }
        }
        Ok(out)
    }
}

impl ActivityStore for LocalStore {
    fn add_activity(&self, record: ActivityRecord) -> Result<String> {
        let id = new_id("act");
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO activities (id, created_at, category, quantity, co2_amount, note)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                id,
                record.created_at.timestamp_micros(),
                record.category.as_str(),
                record.quantity,
                record.co2_amount,
                record.note,
            ],
        )
        .map_err(storage_err)?;
        Ok(id)
    }

    fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.dashboard_stats_at(Utc::now())
    }
}

impl GoalTracker for LocalStore {
    fn update_all_goals_progress(&self, amount: f64, category: ActivityCategory) -> Result<()> {
        let conn = self.open()?;
        let changed = conn
            .execute(
                r#"
                UPDATE goals SET current_value = current_value + ?1
                WHERE started_at <= ?2 AND ends_at > ?2 AND (category = 'total' OR category = ?3)
                "#,
                params![amount, Utc::now().timestamp_micros(), category.as_str()],
            )
            .map_err(storage_err)?;
        debug!(changed, category = category.as_str(), "goal progress updated");
        Ok(())
    }

    fn create_goal(&self, goal: NewGoal) -> Result<GoalProgress> {
        let created = GoalProgress::from_new(new_id("goal"), goal, Utc::now());
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO goals
            (id, title, description, goal_type, category, target_value, current_value, started_at, ends_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                created.id,
                created.title,
                created.description,
                created.goal_type.as_str(),
                created.category.as_str(),
                created.target_value,
                created.current_value,
                created.started_at.timestamp_micros(),
                created.ends_at.timestamp_micros(),
            ],
        )
        .map_err(storage_err)?;
        Ok(created)
    }

    fn active_goals(&self) -> Result<Vec<GoalProgress>> {
        self.active_goals_at(Utc::now())
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let encoded: Option<String> = conn
            .query_row(
                "SELECT value_enc FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(storage_err)?;
        let Some(encoded) = encoded else {
            return Ok(None);
        };
        match self.cipher.decrypt(&encoded) {
            Some(value) => Ok(Some(value)),
            None => {
                warn!(key, "stored value cannot be decrypted; treating as missing");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let value_enc = self.cipher.encrypt(value)?;
        let conn = self.open()?;
        conn.execute(
            r#"
            INSERT INTO kv_store (key, value_enc, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value_enc = excluded.value_enc,
                updated_at = excluded.updated_at
            "#,
            params![key, value_enc, Utc::now().timestamp()],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(storage_err)?;
        Ok(())
    }
}

fn goal_from_row(row: &Row<'_>) -> Result<Option<GoalProgress>> {
    let goal_type: String = row.get(3).map_err(storage_err)?;
    let category: String = row.get(4).map_err(storage_err)?;
    let (Some(goal_type), Some(category)) = (GoalType::parse(&goal_type), GoalCategory::parse(&category))
    else {
        return Ok(None);
    };
    Ok(Some(GoalProgress {
        id: row.get(0).map_err(storage_err)?,
        title: row.get(1).map_err(storage_err)?,
        description: row.get(2).map_err(storage_err)?,
        goal_type,
        category,
        target_value: row.get(5).map_err(storage_err)?,
        current_value: row.get(6).map_err(storage_err)?,
        started_at: micros_to_datetime(row.get(7).map_err(storage_err)?),
        ends_at: micros_to_datetime(row.get(8).map_err(storage_err)?),
    }))
}

fn micros_to_datetime(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_else(Utc::now)
}

fn storage_err(e: impl std::fmt::Display) -> FootprintError {
    FootprintError::Storage(e.to_string())
}

fn new_id(prefix: &str) -> String {
    format!(
        "{prefix}-{}-{:08x}",
        Utc::now().timestamp_micros(),
        rand::random::<u32>()
    )
}
