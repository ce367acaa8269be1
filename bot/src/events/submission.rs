use shared::SubmissionRecord;
use tracing::{debug, error, info, instrument, warn};

use crate::api::RepoErrorCode;

use super::{recent::Fingerprint, *};

impl Context {
    /// Persists the solution, then folds it into the statistics.
    #[instrument(skip(self, record), fields(platform = %record.platform, problem = %record.problem_id))]
    pub async fn new_submission(&self, record: SubmissionRecord) -> Response {
        if !record.is_complete() {
            warn!("Dropping incomplete submission");
            return Response::failure("submission is missing the problem id or the code");
        }

        let fingerprint = Fingerprint::from(&record);
        if !self.recent.claim(&fingerprint) {
            debug!("Duplicate submission, already handled");
            self.prometheus.record_duplicate();
            return Response::ok();
        }

        let client = match self.slot.current().await {
            Ok(client) => client,
            Err(e) => {
                warn!("Cannot save submission: {e}");
                self.recent.release(&fingerprint);
                self.notify(self.notifier.messages.config_missing()).await;
                return Response::failure(e.to_string());
            }
        };

        let saved = client
            .save_solution(
                record.platform,
                &record.problem_id,
                &record.code,
                &record.language,
            )
            .await;
        let outcome = match saved {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to save {}: {e}", record.problem_key());
                self.recent.release(&fingerprint);
                self.prometheus.record_submission(record.platform, false);
                let notification = match e.code {
                    RepoErrorCode::InitError | RepoErrorCode::AuthRequired => {
                        self.notifier.messages.config_missing()
                    }
                    _ => self.notifier.messages.save_failed(&record),
                };
                self.notify(notification).await;
                return Response::failure(e.to_string());
            }
        };
        info!("Saved {}", outcome.path());
        self.prometheus.record_submission(record.platform, true);

        let date = (self.today)();
        let applied = match self.aggregator.apply_event(&record, date).await {
            Ok(applied) => {
                for achievement in &applied.newly_unlocked {
                    info!("Unlocked achievement {}", achievement.id);
                }
                Some(applied)
            }
            Err(e) => {
                error!(
                    "Failed to update statistics for {}, the event is lost: {e}",
                    record.problem_key()
                );
                None
            }
        };

        let messages = &self.notifier.messages;
        self.notify(messages.solution_saved(
            &record,
            outcome.path(),
            applied.as_ref().map(|applied| applied.current_streak),
        ))
        .await;
        for achievement in applied.iter().flat_map(|applied| &applied.newly_unlocked) {
            self.notify(messages.achievement_unlocked(achievement)).await;
        }

        Response::ok()
    }
}
