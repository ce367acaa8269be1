use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupMode {
    /// Create the repository, adopting it if it already exists.
    #[default]
    New,
    /// Use a repository that is expected to exist already.
    Existing,
}

/// Messages sent from a page watcher to the background service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    NewSubmission {
        data: SubmissionRecord,
    },
    GithubConfigUpdated {
        token: String,
        owner: String,
        repo: String,
    },
    GetSubmissionStats,
    SetupRepository {
        name: String,
        #[serde(default)]
        mode: SetupMode,
    },
    UpdateSettings {
        #[serde(default)]
        notifications: Option<bool>,
        #[serde(default, rename = "repoCheck")]
        repo_check: Option<bool>,
    },
}

impl Message {
    pub const fn kind(&self) -> &'static str {
        match self {
            Message::NewSubmission { .. } => "NEW_SUBMISSION",
            Message::GithubConfigUpdated { .. } => "GITHUB_CONFIG_UPDATED",
            Message::GetSubmissionStats => "GET_SUBMISSION_STATS",
            Message::SetupRepository { .. } => "SETUP_REPOSITORY",
            Message::UpdateSettings { .. } => "UPDATE_SETTINGS",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsReport>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            stats: None,
        }
    }

    pub fn with_stats(stats: StatsReport) -> Self {
        Self {
            success: true,
            error: None,
            stats: Some(stats),
        }
    }
}
