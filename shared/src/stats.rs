use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub submission_count: u32,
    #[serde(default)]
    pub problems: DifficultyCounters,
}

impl DailyBucket {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            submission_count: 0,
            problems: DifficultyCounters::default(),
        }
    }
}

/// Everything derived from accepted submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStats {
    /// Sorted by date, at most one bucket per date.
    pub daily_submissions: Vec<DailyBucket>,
    pub total_solved: u32,
    pub solved: DifficultyCounters,
    pub streak: StreakState,
    pub unlocked_achievements: AchievementSet,
    pub solved_problems: BTreeSet<ProblemKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub streak_changed: bool,
    pub current_streak: u32,
    pub new_problem: bool,
    pub newly_unlocked: Vec<&'static Achievement>,
}

impl SubmissionStats {
    /// Folds one accepted submission made on `date` into the statistics.
    pub fn apply_event(&mut self, record: &SubmissionRecord, date: NaiveDate) -> EventOutcome {
        let bucket = self.bucket_mut(date);
        bucket.submission_count += 1;
        if let Some(difficulty) = record.difficulty {
            bucket.problems.increment(difficulty);
        }

        let new_problem = self.solved_problems.insert(record.problem_key());
        if new_problem {
            self.total_solved += 1;
            if let Some(difficulty) = record.difficulty {
                self.solved.increment(difficulty);
            }
        }

        let streak_changed = self.streak.record(date);
        let newly_unlocked = self.unlock_achievements();
        self.prune(date);

        EventOutcome {
            streak_changed,
            current_streak: self.streak.current_streak,
            new_problem,
            newly_unlocked,
        }
    }

    pub fn bucket(&self, date: NaiveDate) -> Option<&DailyBucket> {
        self.daily_submissions
            .binary_search_by_key(&date, |bucket| bucket.date)
            .ok()
            .map(|index| &self.daily_submissions[index])
    }

    fn bucket_mut(&mut self, date: NaiveDate) -> &mut DailyBucket {
        let index = match self
            .daily_submissions
            .binary_search_by_key(&date, |bucket| bucket.date)
        {
            Ok(index) => index,
            Err(index) => {
                self.daily_submissions.insert(index, DailyBucket::new(date));
                index
            }
        };
        &mut self.daily_submissions[index]
    }

    fn unlock_achievements(&mut self) -> Vec<&'static Achievement> {
        let achieved: Vec<_> = ACHIEVEMENTS
            .iter()
            .filter(|achievement| achievement.criteria.is_achieved(self))
            .collect();

        achieved
            .into_iter()
            .filter(|achievement| self.unlocked_achievements.unlock(achievement.id))
            .collect()
    }

    /// Drops buckets older than the retention window ending at `reference`.
    pub fn prune(&mut self, reference: NaiveDate) {
        if let Some(cutoff) = retention_cutoff(reference) {
            self.daily_submissions.retain(|bucket| bucket.date >= cutoff);
        }
    }

    /// Keeps the bucket invariants when the collection came from storage.
    pub fn normalize(&mut self) {
        self.daily_submissions.sort_by_key(|bucket| bucket.date);
        self.daily_submissions.dedup_by(|later, earlier| {
            if later.date != earlier.date {
                return false;
            }
            earlier.submission_count += later.submission_count;
            earlier.problems.easy += later.problems.easy;
            earlier.problems.medium += later.problems.medium;
            earlier.problems.hard += later.problems.hard;
            true
        });
    }
}

/// What the dashboard reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub daily_submissions: Vec<DailyBucket>,
    pub total_solved: u32,
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
    pub streak: u32,
    pub longest_streak: u32,
    pub last_push_date: DayString,
    pub unlocked_achievements: Vec<String>,
}

impl From<&SubmissionStats> for StatsReport {
    fn from(stats: &SubmissionStats) -> Self {
        Self {
            daily_submissions: stats.daily_submissions.clone(),
            total_solved: stats.total_solved,
            easy: stats.solved.easy,
            medium: stats.solved.medium,
            hard: stats.solved.hard,
            streak: stats.streak.current_streak,
            longest_streak: stats.streak.longest_streak,
            last_push_date: stats.streak.last_push_date(),
            unlocked_achievements: stats
                .unlocked_achievements
                .iter()
                .map(str::to_string)
                .collect(),
        }
    }
}
