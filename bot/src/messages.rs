use rand::seq::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use shared::{Achievement, SubmissionRecord};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::error;

const BUNDLED_MESSAGES: &str = include_str!("../Messages.toml");

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum MsgCategory {
    SolutionSaved,
    StreakStarted,
    StreakContinued,
    AchievementUnlocked,
    SaveFailed,
    ConfigMissing,
    RepositoryReady,
    DailyReminder,
    DailyReminderNoStreak,
    RepoCheckFailed,
}

impl MsgCategory {
    pub const fn title(&self) -> &'static str {
        match self {
            MsgCategory::SolutionSaved => "Solution saved",
            MsgCategory::StreakStarted | MsgCategory::StreakContinued => "Streak",
            MsgCategory::AchievementUnlocked => "Achievement unlocked",
            MsgCategory::SaveFailed => "Save failed",
            MsgCategory::ConfigMissing => "Setup required",
            MsgCategory::RepositoryReady => "Repository ready",
            MsgCategory::DailyReminder | MsgCategory::DailyReminderNoStreak => "Daily reminder",
            MsgCategory::RepoCheckFailed => "Repository check failed",
        }
    }
}

impl std::fmt::Display for MsgCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Variants of one notification text. `variables` lists the placeholders the
/// texts still expect.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Messages {
    message: Vec<String>,
    #[serde(default)]
    variables: HashSet<String>,
}

pub type Values<'a> = &'a [(&'static str, String)];

impl Messages {
    /// Picks a variant at random and fills in `values`.
    pub fn render(&self, values: Values<'_>) -> String {
        let Some(text) = self.message.choose(&mut thread_rng()) else {
            error!("No message variants to choose from");
            return String::new();
        };
        let mut text = text.clone();
        for key in &self.variables {
            match values.iter().find(|(name, _)| *name == key.as_str()) {
                Some((_, value)) => text = text.replace(&format!("{{{key}}}"), value),
                None => error!("Message expects variable {key}, but it wasn't provided"),
            }
        }
        text
    }

    pub fn to_notification(&self, category: MsgCategory, values: Values<'_>) -> Notification {
        Notification {
            title: category.title().to_string(),
            message: self.render(values),
        }
    }

    /// Substitutes a value known at load time in every variant.
    fn fill(&mut self, key: &str, value: &str) {
        let placeholder = format!("{{{key}}}");
        for message in self.message.iter_mut() {
            *message = message.replace(&placeholder, value);
        }
        self.variables.remove(key);
    }
}

/// A ready to send notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageLoader {
    pub app_name: String,

    pub solution_saved: Messages,
    pub streak_started: Messages,
    pub streak_continued: Messages,
    pub achievement_unlocked: Messages,
    pub save_failed: Messages,
    pub config_missing: Messages,
    pub repository_ready: Messages,
    pub daily_reminder: Messages,
    pub daily_reminder_no_streak: Messages,
    pub repo_check_failed: Messages,
}

impl MessageLoader {
    pub fn load_from_file(file_path: &PathBuf) -> anyhow::Result<Self> {
        let file_content = fs::read_to_string(file_path)?;
        Self::from_toml_str(&file_content)
    }

    /// The texts shipped with the binary.
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_toml_str(BUNDLED_MESSAGES)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut result: Self = toml::from_str(content)?;
        result.postprocess_messages();
        tracing::trace!("Loaded messages: {:#?}", result);
        Ok(result)
    }

    fn postprocess_messages(&mut self) {
        let app_name = self.app_name.clone();
        for message in [
            &mut self.solution_saved,
            &mut self.streak_started,
            &mut self.streak_continued,
            &mut self.achievement_unlocked,
            &mut self.save_failed,
            &mut self.config_missing,
            &mut self.repository_ready,
            &mut self.daily_reminder,
            &mut self.daily_reminder_no_streak,
            &mut self.repo_check_failed,
        ] {
            message.fill("app_name", &app_name);
        }
    }

    pub fn get_message(&self, category: MsgCategory) -> &Messages {
        match category {
            MsgCategory::SolutionSaved => &self.solution_saved,
            MsgCategory::StreakStarted => &self.streak_started,
            MsgCategory::StreakContinued => &self.streak_continued,
            MsgCategory::AchievementUnlocked => &self.achievement_unlocked,
            MsgCategory::SaveFailed => &self.save_failed,
            MsgCategory::ConfigMissing => &self.config_missing,
            MsgCategory::RepositoryReady => &self.repository_ready,
            MsgCategory::DailyReminder => &self.daily_reminder,
            MsgCategory::DailyReminderNoStreak => &self.daily_reminder_no_streak,
            MsgCategory::RepoCheckFailed => &self.repo_check_failed,
        }
    }

    fn notification(&self, category: MsgCategory, values: Values<'_>) -> Notification {
        self.get_message(category).to_notification(category, values)
    }

    pub fn streak_message(&self, streak: u32) -> String {
        if streak <= 1 {
            return self.streak_started.render(&[]);
        }
        self.streak_continued
            .render(&[("streak", streak.to_string())])
    }

    /// `streak` is `None` when the statistics could not be updated.
    pub fn solution_saved(
        &self,
        record: &SubmissionRecord,
        path: &str,
        streak: Option<u32>,
    ) -> Notification {
        let problem = record
            .title
            .clone()
            .unwrap_or_else(|| record.problem_id.clone());
        self.notification(
            MsgCategory::SolutionSaved,
            &[
                ("problem", problem),
                ("platform", record.platform.display_name().to_string()),
                ("path", path.to_string()),
                (
                    "streak_message",
                    streak
                        .map(|streak| self.streak_message(streak))
                        .unwrap_or_default(),
                ),
            ],
        )
    }

    pub fn achievement_unlocked(&self, achievement: &Achievement) -> Notification {
        self.notification(
            MsgCategory::AchievementUnlocked,
            &[
                ("title", achievement.title.to_string()),
                ("description", achievement.description.to_string()),
            ],
        )
    }

    pub fn save_failed(&self, record: &SubmissionRecord) -> Notification {
        self.notification(
            MsgCategory::SaveFailed,
            &[("platform", record.platform.display_name().to_string())],
        )
    }

    pub fn config_missing(&self) -> Notification {
        self.notification(MsgCategory::ConfigMissing, &[])
    }

    pub fn repository_ready(&self, repo: &str) -> Notification {
        self.notification(
            MsgCategory::RepositoryReady,
            &[("repo", repo.to_string())],
        )
    }

    pub fn daily_reminder(&self, streak: u32) -> Notification {
        if streak == 0 {
            return self.notification(MsgCategory::DailyReminderNoStreak, &[]);
        }
        self.notification(
            MsgCategory::DailyReminder,
            &[("streak", streak.to_string())],
        )
    }

    pub fn repo_check_failed(&self, repo: &str) -> Notification {
        self.notification(
            MsgCategory::RepoCheckFailed,
            &[("repo", repo.to_string())],
        )
    }
}
