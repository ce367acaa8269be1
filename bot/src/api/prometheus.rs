use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::Histogram;
use prometheus_client::registry::Registry;
use shared::{Message, Platform};

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum MessageKind {
    NewSubmission,
    GithubConfigUpdated,
    GetSubmissionStats,
    SetupRepository,
    UpdateSettings,
}

impl From<&Message> for MessageKind {
    fn from(message: &Message) -> Self {
        match message {
            Message::NewSubmission { .. } => MessageKind::NewSubmission,
            Message::GithubConfigUpdated { .. } => MessageKind::GithubConfigUpdated,
            Message::GetSubmissionStats => MessageKind::GetSubmissionStats,
            Message::SetupRepository { .. } => MessageKind::SetupRepository,
            Message::UpdateSettings { .. } => MessageKind::UpdateSettings,
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum PlatformLabel {
    Leetcode,
    Codeforces,
    Codechef,
    Unknown,
}

impl From<Platform> for PlatformLabel {
    fn from(platform: Platform) -> Self {
        match platform {
            Platform::Leetcode => PlatformLabel::Leetcode,
            Platform::Codeforces => PlatformLabel::Codeforces,
            Platform::Codechef => PlatformLabel::Codechef,
            Platform::Unknown => PlatformLabel::Unknown,
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct MessageRecord {
    pub kind: MessageKind,
    pub success: u32,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct SubmissionRecord {
    pub platform: PlatformLabel,
    pub success: u32,
}

pub struct PrometheusClient {
    registry: Registry,
    message: Family<MessageRecord, Counter>,
    message_processing_time: Family<MessageRecord, Histogram>,
    submission: Family<SubmissionRecord, Counter>,
    duplicate_submission: Counter,

    // The contents API doesn't report write quota usage, so count writes ourselves
    github_api_write_request: Counter,
}

impl Default for PrometheusClient {
    fn default() -> Self {
        let mut registry = Registry::default();
        let message = Family::default();
        let submission = Family::default();
        let duplicate_submission = Counter::default();
        let github_api_write_request = Counter::default();
        let message_processing_time: Family<MessageRecord, Histogram> =
            Family::new_with_constructor(|| {
                Histogram::new(
                    [0.05, 0.1, 0.25, 0.5, 1., 2.5, 5., 10., 30., f64::INFINITY].into_iter(),
                )
            });

        registry.register(
            "github_api_write_requests",
            "Total github write requests since start",
            github_api_write_request.clone(),
        );
        registry.register("bot_message", "Handled router messages", message.clone());
        registry.register(
            "bot_message_processing_time",
            "Processing time for router messages",
            message_processing_time.clone(),
        );
        registry.register(
            "bot_submission",
            "Accepted submissions forwarded for saving",
            submission.clone(),
        );
        registry.register(
            "bot_duplicate_submission",
            "Submissions dropped as duplicates",
            duplicate_submission.clone(),
        );

        Self {
            registry,
            message,
            message_processing_time,
            submission,
            duplicate_submission,
            github_api_write_request,
        }
    }
}

impl PrometheusClient {
    pub fn record_message(
        &self,
        kind: MessageKind,
        success: bool,
        started: chrono::DateTime<chrono::Utc>,
    ) {
        let record = MessageRecord {
            kind,
            success: success as u32,
        };
        self.message.get_or_create(&record).inc();

        let elapsed = chrono::Utc::now() - started;
        self.message_processing_time
            .get_or_create(&record)
            .observe(elapsed.num_milliseconds() as f64 / 1000.0);
    }

    pub fn record_submission(&self, platform: Platform, success: bool) {
        self.submission
            .get_or_create(&SubmissionRecord {
                platform: platform.into(),
                success: success as u32,
            })
            .inc();
    }

    pub fn record_duplicate(&self) {
        self.duplicate_submission.inc();
    }

    pub fn add_write_request(&self) {
        self.github_api_write_request.inc();
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let mut body = String::new();
        encode(&mut body, &self.registry)?;
        Ok(body)
    }
}
