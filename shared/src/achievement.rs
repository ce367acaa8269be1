use std::collections::BTreeSet;

use super::*;

pub type AchievementId = &'static str;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementCriteria {
    TotalSolved(u32),
    HardSolved(u32),
    CurrentStreak(u32),
}

impl AchievementCriteria {
    pub const fn is_achieved(&self, stats: &SubmissionStats) -> bool {
        match self {
            Self::TotalSolved(value) => stats.total_solved >= *value,
            Self::HardSolved(value) => stats.solved.hard >= *value,
            Self::CurrentStreak(value) => stats.streak.current_streak >= *value,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: AchievementId,
    pub title: &'static str,
    pub description: &'static str,
    pub criteria: AchievementCriteria,
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first-solve",
        title: "First Blood",
        description: "Solve your first problem",
        criteria: AchievementCriteria::TotalSolved(1),
    },
    Achievement {
        id: "ten-solved",
        title: "Warming Up",
        description: "Solve 10 problems",
        criteria: AchievementCriteria::TotalSolved(10),
    },
    Achievement {
        id: "fifty-solved",
        title: "Problem Crusher",
        description: "Solve 50 problems",
        criteria: AchievementCriteria::TotalSolved(50),
    },
    Achievement {
        id: "century",
        title: "Centurion",
        description: "Solve 100 problems",
        criteria: AchievementCriteria::TotalSolved(100),
    },
    Achievement {
        id: "hard-hitter",
        title: "Hard Hitter",
        description: "Solve 10 hard problems",
        criteria: AchievementCriteria::HardSolved(10),
    },
    Achievement {
        id: "streak-3",
        title: "On a Roll",
        description: "Keep a 3 day streak",
        criteria: AchievementCriteria::CurrentStreak(3),
    },
    Achievement {
        id: "streak-7",
        title: "Week Warrior",
        description: "Keep a 7 day streak",
        criteria: AchievementCriteria::CurrentStreak(7),
    },
    Achievement {
        id: "streak-30",
        title: "Monthly Master",
        description: "Keep a 30 day streak",
        criteria: AchievementCriteria::CurrentStreak(30),
    },
    Achievement {
        id: "streak-100",
        title: "Unstoppable",
        description: "Keep a 100 day streak",
        criteria: AchievementCriteria::CurrentStreak(100),
    },
];

pub fn find_achievement(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|achievement| achievement.id == id)
}

/// Unlocked achievement ids. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementSet(BTreeSet<String>);

impl AchievementSet {
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Returns `true` if `id` was not unlocked before.
    pub fn unlock(&mut self, id: &str) -> bool {
        self.0.insert(id.to_string())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromIterator<String> for AchievementSet {
    fn from_iter<T: IntoIterator<Item = String>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
