use serde::{Deserialize, Serialize};

mod achievement;
mod calendar;
mod message;
mod stats;
mod streak;
mod submission;

#[cfg(feature = "client")]
pub mod telegram;

pub use achievement::*;
pub use calendar::*;
pub use message::*;
pub use stats::*;
pub use streak::*;
pub use submission::*;

pub type ProblemKey = String;

/// Per-difficulty counters, used both for a single day and for the lifetime totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyCounters {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl DifficultyCounters {
    pub fn increment(&mut self, difficulty: Difficulty) {
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Hard => self.hard += 1,
        }
    }

    pub const fn get(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    pub const fn total(&self) -> u32 {
        self.easy + self.medium + self.hard
    }
}
