use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, instrument};

pub mod keys {
    pub const GITHUB_TOKEN: &str = "githubToken";
    pub const GITHUB_OWNER: &str = "githubOwner";
    pub const GITHUB_REPO: &str = "githubRepo";

    pub const DAILY_SUBMISSIONS: &str = "dailySubmissions";
    pub const TOTAL_SOLVED: &str = "totalSolved";
    pub const EASY: &str = "easy";
    pub const MEDIUM: &str = "medium";
    pub const HARD: &str = "hard";
    pub const STREAK: &str = "streak";
    pub const LONGEST_STREAK: &str = "longestStreak";
    pub const LAST_PUSH_DATE: &str = "lastPushDate";
    pub const UNLOCKED_ACHIEVEMENTS: &str = "unlockedAchievements";
    pub const SOLVED_PROBLEMS: &str = "solvedProblems";

    pub const NOTIFICATIONS: &str = "notifications";
    pub const REPO_CHECK: &str = "repoCheck";
    pub const LAST_REMINDER_DATE: &str = "lastReminderDate";
}

/// Keys changed by a single write.
pub type Change = Vec<String>;

/// JSON file backed key-value store. Every write replaces the file atomically,
/// so readers never observe half of a multi-key update.
pub struct Store {
    path: PathBuf,
    values: RwLock<BTreeMap<String, Value>>,
    changes: broadcast::Sender<Change>,
}

impl Store {
    pub async fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let values = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse store {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read store {}", path.display()))
            }
        };
        debug!("Opened store {} with {} keys", path.display(), values.len());

        let (changes, _) = broadcast::channel(64);
        Ok(Self {
            path,
            values: RwLock::new(values),
            changes,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        let values = self.values.read().await;
        values
            .get(key)
            .filter(|value| !value.is_null())
            .map(|value| {
                serde_json::from_value(value.clone())
                    .with_context(|| format!("Malformed value for key {key}"))
            })
            .transpose()
    }

    pub async fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> anyhow::Result<T> {
        Ok(self.get(key).await?.unwrap_or(default))
    }

    pub async fn get_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> anyhow::Result<T> {
        self.get_or(key, T::default()).await
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        self.set_many(vec![(key, serde_json::to_value(value)?)])
            .await
    }

    /// Writes all entries or none of them.
    #[instrument(skip_all, fields(keys = entries.len()))]
    pub async fn set_many(&self, entries: Vec<(&str, Value)>) -> anyhow::Result<()> {
        let mut values = self.values.write().await;
        let mut updated = values.clone();
        let mut changed = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            changed.push(key.to_string());
            updated.insert(key.to_string(), value);
        }

        let payload = serde_json::to_string_pretty(&updated)?;
        write_atomic(&self.path, &payload).await?;
        *values = updated;
        drop(values);

        // Nobody listening is fine
        let _ = self.changes.send(changed);
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }
}

async fn write_atomic(path: &Path, payload: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create parent directory {}", parent.display()))?;
    }

    let temp_path = match path.file_name() {
        Some(name) => path.with_file_name(format!("{}.tmp", name.to_string_lossy())),
        None => path.with_extension("tmp"),
    };

    tokio::fs::write(&temp_path, payload)
        .await
        .with_context(|| format!("Failed to write temp file {}", temp_path.display()))?;
    tokio::fs::rename(&temp_path, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
