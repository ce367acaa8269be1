use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub mod client;
pub mod errors;
#[cfg(test)]
pub(crate) mod memory;
pub mod prometheus;

pub use client::*;
pub use errors::*;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepositoryPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRepository {
    pub name: String,
    pub full_name: String,
    pub owner: RepositoryOwner,
    #[serde(default)]
    pub permissions: Option<RepositoryPermissions>,
}

impl RemoteRepository {
    /// Repositories fetched without permission details are assumed writable;
    /// the write itself will fail loudly if they are not.
    pub fn can_push(&self) -> bool {
        self.permissions
            .as_ref()
            .map_or(true, |permissions| permissions.push || permissions.admin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutFileRequest {
    pub message: String,
    /// Base64 encoded file content.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRepositoryRequest<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub private: bool,
    pub auto_init: bool,
}

/// The slice of the hosted repository API the sync pipeline relies on.
#[async_trait]
pub trait RepositoryApi: Send + Sync {
    async fn current_user(&self) -> Result<String, RepoError>;

    async fn create_repository(
        &self,
        request: &CreateRepositoryRequest<'_>,
    ) -> Result<RemoteRepository, RepoError>;

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RemoteRepository, RepoError>;

    /// `Ok(None)` when the path does not exist.
    async fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<RemoteFile>, RepoError>;

    async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<RemoteFile, RepoError>;
}

#[derive(Clone)]
pub struct GithubClient {
    octocrab: octocrab::Octocrab,
    prometheus: Arc<prometheus::PrometheusClient>,
}

#[derive(Deserialize)]
struct PutFileResponse {
    content: RemoteFile,
}

#[derive(Deserialize)]
struct CurrentUser {
    login: String,
}

impl GithubClient {
    pub fn new(
        github_token: String,
        prometheus: Arc<prometheus::PrometheusClient>,
    ) -> Result<Self, RepoError> {
        let octocrab = octocrab::Octocrab::builder()
            .personal_token(github_token)
            .build()
            .map_err(|e| RepoError::new(RepoErrorCode::InitError, e.to_string()))?;

        Ok(Self {
            octocrab,
            prometheus,
        })
    }
}

#[async_trait]
impl RepositoryApi for GithubClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<String, RepoError> {
        let user: CurrentUser = self.octocrab.get("/user", None::<&()>).await?;
        Ok(user.login)
    }

    #[instrument(skip(self, request), fields(name = request.name))]
    async fn create_repository(
        &self,
        request: &CreateRepositoryRequest<'_>,
    ) -> Result<RemoteRepository, RepoError> {
        self.prometheus.add_write_request();
        Ok(self.octocrab.post("/user/repos", Some(request)).await?)
    }

    #[instrument(skip(self))]
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RemoteRepository, RepoError> {
        Ok(self
            .octocrab
            .get(format!("/repos/{owner}/{repo}"), None::<&()>)
            .await?)
    }

    #[instrument(skip(self))]
    async fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<RemoteFile>, RepoError> {
        let result: Result<RemoteFile, RepoError> = self
            .octocrab
            .get(format!("/repos/{owner}/{repo}/contents/{path}"), None::<&()>)
            .await
            .map_err(Into::into);

        match result {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.code == RepoErrorCode::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, request), fields(update = request.sha.is_some()))]
    async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<RemoteFile, RepoError> {
        self.prometheus.add_write_request();
        let response: PutFileResponse = self
            .octocrab
            .put(
                format!("/repos/{owner}/{repo}/contents/{path}"),
                Some(request),
            )
            .await?;
        Ok(response.content)
    }
}
