use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;
use serde_json::json;
use shared::{
    parse_day, AchievementSet, DailyBucket, DifficultyCounters, EventOutcome, StatsReport,
    StreakState, SubmissionRecord, SubmissionStats,
};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::store::{keys, Store};

/// Serializes every read-compute-write cycle over the statistics keys.
pub struct Aggregator {
    store: Arc<Store>,
    lock: Mutex<()>,
}

impl Aggregator {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> anyhow::Result<SubmissionStats> {
        let store = &self.store;
        let last_push_date: String = store.get_or_default(keys::LAST_PUSH_DATE).await?;
        let unlocked: Vec<String> = store.get_or_default(keys::UNLOCKED_ACHIEVEMENTS).await?;

        let mut stats = SubmissionStats {
            daily_submissions: store
                .get_or_default::<Vec<DailyBucket>>(keys::DAILY_SUBMISSIONS)
                .await?,
            total_solved: store.get_or_default(keys::TOTAL_SOLVED).await?,
            solved: DifficultyCounters {
                easy: store.get_or_default(keys::EASY).await?,
                medium: store.get_or_default(keys::MEDIUM).await?,
                hard: store.get_or_default(keys::HARD).await?,
            },
            streak: StreakState {
                current_streak: store.get_or_default(keys::STREAK).await?,
                longest_streak: store.get_or_default(keys::LONGEST_STREAK).await?,
                last_contribution_date: parse_day(&last_push_date),
            },
            unlocked_achievements: unlocked.into_iter().collect::<AchievementSet>(),
            solved_problems: store
                .get_or_default::<BTreeSet<String>>(keys::SOLVED_PROBLEMS)
                .await?,
        };
        stats.normalize();
        Ok(stats)
    }

    async fn save(&self, stats: &SubmissionStats) -> anyhow::Result<()> {
        let report = StatsReport::from(stats);
        self.store
            .set_many(vec![
                (keys::DAILY_SUBMISSIONS, json!(report.daily_submissions)),
                (keys::TOTAL_SOLVED, json!(report.total_solved)),
                (keys::EASY, json!(report.easy)),
                (keys::MEDIUM, json!(report.medium)),
                (keys::HARD, json!(report.hard)),
                (keys::STREAK, json!(report.streak)),
                (keys::LONGEST_STREAK, json!(report.longest_streak)),
                (keys::LAST_PUSH_DATE, json!(report.last_push_date)),
                (
                    keys::UNLOCKED_ACHIEVEMENTS,
                    json!(report.unlocked_achievements),
                ),
                (keys::SOLVED_PROBLEMS, json!(stats.solved_problems)),
            ])
            .await
    }

    /// Buckets, streak and achievements are written together or not at all.
    #[instrument(skip(self, record), fields(problem = %record.problem_key()))]
    pub async fn apply_event(
        &self,
        record: &SubmissionRecord,
        date: NaiveDate,
    ) -> anyhow::Result<EventOutcome> {
        let _guard = self.lock.lock().await;

        let mut stats = self.load().await?;
        let outcome = stats.apply_event(record, date);
        self.save(&stats).await?;

        debug!(
            "Applied event: streak {} (changed: {}), total solved {}",
            stats.streak.current_streak, outcome.streak_changed, stats.total_solved
        );
        Ok(outcome)
    }

    pub async fn stats(&self) -> anyhow::Result<SubmissionStats> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    pub async fn report(&self) -> anyhow::Result<StatsReport> {
        Ok(StatsReport::from(&self.stats().await?))
    }
}
