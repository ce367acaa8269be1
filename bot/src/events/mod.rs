use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use shared::{Message, Response};
use tracing::{info, instrument};

use crate::{
    aggregator::Aggregator,
    api::{
        prometheus::{MessageKind, PrometheusClient},
        RepoError, RepositoryClient, RepositoryTarget,
    },
    notifier::Notifier,
    slot::ServiceSlot,
    store::Store,
};

use self::recent::RecentSubmissions;

pub(crate) mod common;
pub mod recent;
pub mod settings;
pub mod stats;
pub mod submission;

/// Builds a repository client for freshly configured credentials.
pub type ClientFactory =
    Arc<dyn Fn(RepositoryTarget) -> Result<RepositoryClient, RepoError> + Send + Sync>;

pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

pub const DUPLICATE_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Everything the background side needs to answer a message. Cheap to clone.
#[derive(Clone)]
pub struct Context {
    pub store: Arc<Store>,
    pub slot: Arc<ServiceSlot>,
    pub aggregator: Arc<Aggregator>,
    pub notifier: Notifier,
    pub prometheus: Arc<PrometheusClient>,
    pub factory: ClientFactory,
    pub today: Clock,
    pub recent: Arc<RecentSubmissions>,
}

impl Context {
    pub fn new(
        store: Arc<Store>,
        notifier: Notifier,
        prometheus: Arc<PrometheusClient>,
        factory: ClientFactory,
    ) -> Self {
        Self {
            aggregator: Arc::new(Aggregator::new(store.clone())),
            store,
            slot: Default::default(),
            notifier,
            prometheus,
            factory,
            today: Arc::new(shared::today),
            recent: Arc::new(RecentSubmissions::new(DUPLICATE_WINDOW)),
        }
    }

    pub fn with_clock(mut self, today: Clock) -> Self {
        self.today = today;
        self
    }

    /// Answers one message from a page watcher. Never fails; problems are
    /// reported in the response.
    #[instrument(skip(self, message), fields(kind = message.kind()))]
    pub async fn handle(&self, message: Message) -> Response {
        let started = chrono::Utc::now();
        let kind = MessageKind::from(&message);

        let response = match message {
            Message::NewSubmission { data } => self.new_submission(data).await,
            Message::GithubConfigUpdated { token, owner, repo } => {
                self.github_config_updated(RepositoryTarget::new(token, owner, repo))
                    .await
            }
            Message::GetSubmissionStats => self.submission_stats().await,
            Message::SetupRepository { name, mode } => self.setup_repository(&name, mode).await,
            Message::UpdateSettings {
                notifications,
                repo_check,
            } => self.update_settings(notifications, repo_check).await,
        };

        if !response.success {
            info!(
                "Responding with failure: {}",
                response.error.as_deref().unwrap_or_default()
            );
        }
        self.prometheus
            .record_message(kind, response.success, started);
        response
    }
}
