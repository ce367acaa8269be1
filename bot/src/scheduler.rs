use std::time::Duration;

use shared::day_string;
use tracing::{debug, error, info, instrument, warn};

use crate::{events::Context, store::keys};

pub struct Scheduler {
    context: Context,
    reminder_interval: Duration,
    repo_check_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Skipped,
    Passed,
    Failed,
}

impl Scheduler {
    pub fn new(context: Context, reminder_interval: Duration, repo_check_interval: Duration) -> Self {
        Self {
            context,
            reminder_interval,
            repo_check_interval,
        }
    }

    pub async fn run(self) {
        tracing::warn!("Starting scheduled checks...");
        let mut reminder = tokio::time::interval(self.reminder_interval);
        let mut repo_check = tokio::time::interval(self.repo_check_interval);

        loop {
            tokio::select! {
                _ = reminder.tick() => {
                    if let Err(e) = self.daily_reminder().await {
                        error!("Daily reminder failed: {e}");
                    }
                }
                _ = repo_check.tick() => {
                    self.repo_check().await;
                }
            }
        }
    }

    /// Reminds at most once per day, and only while nothing was solved today.
    #[instrument(skip(self))]
    pub async fn daily_reminder(&self) -> anyhow::Result<bool> {
        let context = &self.context;
        if !context.notifications_enabled().await {
            return Ok(false);
        }

        let today = (context.today)();
        let stats = context.aggregator.stats().await?;
        if stats.streak.contributed_on(today) {
            debug!("Already contributed today");
            return Ok(false);
        }

        let today = day_string(today);
        let last_reminder: Option<String> = context.store.get(keys::LAST_REMINDER_DATE).await?;
        if last_reminder.as_deref() == Some(today.as_str()) {
            return Ok(false);
        }
        context.store.set(keys::LAST_REMINDER_DATE, &today).await?;

        let streak = if stats.streak.is_alive((context.today)()) {
            stats.streak.current_streak
        } else {
            0
        };
        info!("Sending daily reminder");
        context
            .notifier
            .send(context.notifier.messages.daily_reminder(streak));
        Ok(true)
    }

    /// Verifies the configured repository is still writable.
    #[instrument(skip(self))]
    pub async fn repo_check(&self) -> CheckOutcome {
        let context = &self.context;
        if !context.repo_check_enabled().await {
            return CheckOutcome::Skipped;
        }

        let client = match context.slot.current().await {
            Ok(client) => client,
            Err(_) => {
                debug!("Repository client not configured, skipping check");
                return CheckOutcome::Skipped;
            }
        };

        match client.verify_access().await {
            Ok(()) => CheckOutcome::Passed,
            Err(e) => {
                warn!("Repository check failed: {e}");
                let repo = client.target().full_name();
                context
                    .notify(context.notifier.messages.repo_check_failed(&repo))
                    .await;
                CheckOutcome::Failed
            }
        }
    }
}
