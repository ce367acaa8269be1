use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::NaiveDate;
use shared::{parse_day, Difficulty, Message, Platform, SetupMode, SubmissionRecord};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    api::{memory::MemoryRepository, RepoError, RepositoryClient, RepositoryTarget, RetryPolicy},
    events::{ClientFactory, Context},
    messages::{MessageLoader, Notification},
    notifier::Notifier,
    scheduler::{CheckOutcome, Scheduler},
    store::{keys, Store},
};

struct Harness {
    context: Context,
    api: Arc<MemoryRepository>,
    notifications: UnboundedReceiver<Notification>,
    day: Arc<Mutex<NaiveDate>>,
    dir: TempDir,
}

impl Harness {
    async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(dir.path().join("store.json")).await.unwrap());
        let api = Arc::new(MemoryRepository::with_repository("octocat", "solutions"));

        let factory_api = api.clone();
        let factory: ClientFactory = Arc::new(move |target: RepositoryTarget| {
            RepositoryClient::new(
                target,
                factory_api.clone(),
                RetryPolicy {
                    timeout: Duration::from_secs(5),
                    max_retries: 0,
                    initial_backoff: Duration::from_millis(1),
                },
            )
        });

        let messages = Arc::new(MessageLoader::bundled().unwrap());
        let (notifier, notifications) = Notifier::new(messages, None).with_listener();

        let day = Arc::new(Mutex::new(parse_day("2025-01-01").unwrap()));
        let clock = day.clone();
        let context = Context::new(store, notifier, Default::default(), factory)
            .with_clock(Arc::new(move || *clock.lock().unwrap()));

        Self {
            context,
            api,
            notifications,
            day,
            dir,
        }
    }

    async fn configured() -> Self {
        let harness = Self::new().await;
        let response = harness
            .context
            .handle(Message::GithubConfigUpdated {
                token: "token".into(),
                owner: "octocat".into(),
                repo: "solutions".into(),
            })
            .await;
        assert!(response.success);
        harness
    }

    fn set_day(&self, day: &str) {
        *self.day.lock().unwrap() = parse_day(day).unwrap();
    }

    fn titles(&mut self) -> Vec<String> {
        let mut titles = vec![];
        while let Ok(notification) = self.notifications.try_recv() {
            titles.push(notification.title);
        }
        titles
    }
}

fn submission(problem: &str, code: &str) -> Message {
    Message::NewSubmission {
        data: SubmissionRecord::new(Platform::Leetcode, problem, code.into(), "python3")
            .with_difficulty(Some(Difficulty::Easy)),
    }
}

#[tokio::test]
async fn submission_without_configuration_is_rejected() {
    let mut harness = Harness::new().await;

    let response = harness.context.handle(submission("two-sum", "pass")).await;
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("INIT_ERROR: service not initialized")
    );
    assert_eq!(harness.titles(), vec!["Setup required".to_string()]);
    assert_eq!(harness.api.calls(), 0);
}

#[tokio::test]
async fn submission_is_saved_and_counted() {
    let mut harness = Harness::configured().await;

    let response = harness.context.handle(submission("Two Sum", "pass")).await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(
        harness.api.content("octocat", "solutions", "leetcode/two-sum.py"),
        Some("pass".to_string())
    );

    let stats = harness
        .context
        .handle(Message::GetSubmissionStats)
        .await
        .stats
        .unwrap();
    assert_eq!(stats.total_solved, 1);
    assert_eq!(stats.easy, 1);
    assert_eq!(stats.streak, 1);
    assert_eq!(stats.last_push_date, "2025-01-01");
    assert_eq!(stats.daily_submissions[0].submission_count, 1);
    assert_eq!(stats.unlocked_achievements, vec!["first-solve".to_string()]);

    assert_eq!(
        harness.titles(),
        vec![
            "Solution saved".to_string(),
            "Achievement unlocked".to_string()
        ]
    );
}

#[tokio::test]
async fn repeated_detection_is_neutralized() {
    let harness = Harness::configured().await;

    for _ in 0..3 {
        let response = harness.context.handle(submission("two-sum", "pass")).await;
        assert!(response.success);
    }

    assert_eq!(harness.api.puts(), 1);
    let report = harness.context.aggregator.report().await.unwrap();
    assert_eq!(report.daily_submissions[0].submission_count, 1);
}

#[tokio::test]
async fn resubmitting_different_code_updates_the_file() {
    let harness = Harness::configured().await;

    harness.context.handle(submission("two-sum", "v1")).await;
    harness.context.handle(submission("two-sum", "v2")).await;

    assert_eq!(
        harness.api.paths("octocat", "solutions"),
        vec!["leetcode/two-sum.py".to_string()]
    );
    assert_eq!(
        harness.api.content("octocat", "solutions", "leetcode/two-sum.py"),
        Some("v2".to_string())
    );

    let report = harness.context.aggregator.report().await.unwrap();
    assert_eq!(report.total_solved, 1);
    assert_eq!(report.daily_submissions[0].submission_count, 2);
}

#[tokio::test]
async fn failed_save_is_retried_on_next_detection() {
    let mut harness = Harness::configured().await;
    harness
        .api
        .fail_next(RepoError::from_status(403, "Resource not accessible"));

    let response = harness.context.handle(submission("two-sum", "pass")).await;
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("FORBIDDEN"));
    assert_eq!(harness.titles(), vec!["Save failed".to_string()]);
    assert_eq!(harness.context.aggregator.report().await.unwrap().total_solved, 0);

    let response = harness.context.handle(submission("two-sum", "pass")).await;
    assert!(response.success);
    assert_eq!(harness.context.aggregator.report().await.unwrap().total_solved, 1);
}

#[tokio::test]
async fn saved_submission_survives_a_storage_failure() {
    let mut harness = Harness::configured().await;
    std::fs::create_dir(harness.dir.path().join("store.json.tmp")).unwrap();

    let response = harness.context.handle(submission("two-sum", "pass")).await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(
        harness.api.content("octocat", "solutions", "leetcode/two-sum.py"),
        Some("pass".to_string())
    );

    // The statistics of this event are lost as a whole
    let report = harness.context.aggregator.report().await.unwrap();
    assert_eq!(report.total_solved, 0);
    assert_eq!(report.streak, 0);
    assert!(report.daily_submissions.is_empty());
    assert!(report.unlocked_achievements.is_empty());
    assert_eq!(harness.titles(), vec!["Solution saved".to_string()]);
}

#[tokio::test]
async fn streak_follows_the_calendar() {
    let harness = Harness::configured().await;

    for (day, problem) in [
        ("2025-01-01", "a"),
        ("2025-01-02", "b"),
        ("2025-01-02", "c"),
        ("2025-01-05", "d"),
    ] {
        harness.set_day(day);
        assert!(harness.context.handle(submission(problem, "x")).await.success);
    }

    let report = harness.context.aggregator.report().await.unwrap();
    assert_eq!(report.streak, 1);
    assert_eq!(report.longest_streak, 2);
    assert_eq!(report.total_solved, 4);
    assert_eq!(report.daily_submissions.len(), 3);
}

#[tokio::test]
async fn reconfiguration_replaces_the_client() {
    let harness = Harness::configured().await;
    let before = harness.context.slot.current().await.unwrap();

    harness
        .context
        .handle(Message::GithubConfigUpdated {
            token: "token".into(),
            owner: "octocat".into(),
            repo: "other".into(),
        })
        .await;
    let after = harness.context.slot.current().await.unwrap();
    assert_eq!(before.target().repo, "solutions");
    assert_eq!(after.target().repo, "other");
    assert_eq!(
        harness
            .context
            .store
            .get::<String>(keys::GITHUB_REPO)
            .await
            .unwrap(),
        Some("other".to_string())
    );

    // An empty token is acknowledged but leaves the service uninitialized
    let response = harness
        .context
        .handle(Message::GithubConfigUpdated {
            token: "".into(),
            owner: "octocat".into(),
            repo: "other".into(),
        })
        .await;
    assert!(response.success);
    assert!(!harness.context.slot.is_initialized().await);
}

#[tokio::test]
async fn restore_prefers_stored_configuration() {
    let harness = Harness::new().await;
    harness
        .context
        .store
        .set(keys::GITHUB_REPO, &"stored")
        .await
        .unwrap();

    harness
        .context
        .restore(&RepositoryTarget::new("token", "octocat", "from-env"))
        .await
        .unwrap();
    let client = harness.context.slot.current().await.unwrap();
    assert_eq!(client.target().repo, "stored");
    assert_eq!(client.target().owner, "octocat");
}

#[tokio::test]
async fn setup_repository_creates_structure_and_retargets() {
    let mut harness = Harness::new().await;
    harness
        .context
        .handle(Message::GithubConfigUpdated {
            token: "token".into(),
            owner: "".into(),
            repo: "".into(),
        })
        .await;

    let response = harness
        .context
        .handle(Message::SetupRepository {
            name: "practice".into(),
            mode: SetupMode::New,
        })
        .await;
    assert!(response.success, "{:?}", response.error);
    assert_eq!(
        harness.api.paths("octocat", "practice"),
        vec![
            "codechef/README.md".to_string(),
            "codeforces/README.md".to_string(),
            "leetcode/README.md".to_string(),
        ]
    );
    assert_eq!(harness.titles(), vec!["Repository ready".to_string()]);

    let client = harness.context.slot.current().await.unwrap();
    assert_eq!(client.target().full_name(), "octocat/practice");

    assert!(harness.context.handle(submission("two-sum", "x")).await.success);
    assert!(harness
        .api
        .content("octocat", "practice", "leetcode/two-sum.py")
        .is_some());
}

#[tokio::test]
async fn setup_existing_repository_requires_write_access() {
    let harness = Harness::configured().await;
    harness.api.add_repository("octocat", "read-only", false);

    let response = harness
        .context
        .handle(Message::SetupRepository {
            name: "read-only".into(),
            mode: SetupMode::Existing,
        })
        .await;
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("PERMISSION_ERROR"));
}

#[tokio::test]
async fn disabled_notifications_stay_quiet() {
    let mut harness = Harness::configured().await;
    let response = harness
        .context
        .handle(Message::UpdateSettings {
            notifications: Some(false),
            repo_check: None,
        })
        .await;
    assert!(response.success);

    assert!(harness.context.handle(submission("two-sum", "x")).await.success);
    assert!(harness.titles().is_empty());
    assert!(harness.context.repo_check_enabled().await);
}

#[tokio::test]
async fn daily_reminder_fires_once_per_day() {
    let mut harness = Harness::configured().await;
    let scheduler = Scheduler::new(
        harness.context.clone(),
        Duration::from_secs(60),
        Duration::from_secs(60),
    );

    harness.context.handle(submission("two-sum", "x")).await;
    harness.titles();
    assert!(!scheduler.daily_reminder().await.unwrap());

    harness.set_day("2025-01-02");
    assert!(scheduler.daily_reminder().await.unwrap());
    assert!(!scheduler.daily_reminder().await.unwrap());
    assert_eq!(harness.titles(), vec!["Daily reminder".to_string()]);
}

#[tokio::test]
async fn repo_check_reports_lost_access() {
    let mut harness = Harness::configured().await;
    let scheduler = Scheduler::new(
        harness.context.clone(),
        Duration::from_secs(60),
        Duration::from_secs(60),
    );
    assert_eq!(scheduler.repo_check().await, CheckOutcome::Passed);

    harness
        .api
        .fail_next(RepoError::from_status(401, "Bad credentials"));
    assert_eq!(scheduler.repo_check().await, CheckOutcome::Failed);
    assert_eq!(
        harness.titles(),
        vec!["Repository check failed".to_string()]
    );

    harness
        .context
        .handle(Message::UpdateSettings {
            notifications: None,
            repo_check: Some(false),
        })
        .await;
    assert_eq!(scheduler.repo_check().await, CheckOutcome::Skipped);
}
