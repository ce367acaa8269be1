use chrono::NaiveDate;

use super::*;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakState {
    pub current_streak: u32,
    pub longest_streak: u32,
    #[serde(default)]
    pub last_contribution_date: Option<NaiveDate>,
}

impl StreakState {
    /// Counts a contribution made on `date`.
    ///
    /// Returns `false` when the streak fields were left untouched: a second
    /// contribution on the same day, or one dated before the last recorded day.
    pub fn record(&mut self, date: NaiveDate) -> bool {
        match self.last_contribution_date {
            Some(last) if last >= date => return false,
            Some(last) if previous_day(date) == Some(last) => self.current_streak += 1,
            _ => self.current_streak = 1,
        }

        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_contribution_date = Some(date);
        true
    }

    /// The streak is still alive when the last contribution was today or yesterday.
    pub fn is_alive(&self, today: NaiveDate) -> bool {
        match self.last_contribution_date {
            Some(last) => last == today || previous_day(today) == Some(last),
            None => false,
        }
    }

    pub fn contributed_on(&self, date: NaiveDate) -> bool {
        self.last_contribution_date == Some(date)
    }

    pub fn last_push_date(&self) -> DayString {
        self.last_contribution_date
            .map(day_string)
            .unwrap_or_default()
    }
}
