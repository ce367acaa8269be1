use std::{fmt, future::Future, sync::Arc, time::Duration};

use base64::Engine;
use shared::{solution_path, Platform, SetupMode};
use tracing::{debug, info, instrument, warn};

use super::*;

const REPOSITORY_DESCRIPTION: &str = "Accepted solutions, synced automatically";

/// Where solutions are written to. The token never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct RepositoryTarget {
    pub token: String,
    pub owner: String,
    pub repo: String,
}

impl fmt::Debug for RepositoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryTarget")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .finish()
    }
}

impl RepositoryTarget {
    pub fn new(token: impl Into<String>, owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn require_repository(&self) -> Result<(), RepoError> {
        if self.owner.trim().is_empty() || self.repo.trim().is_empty() {
            return Err(RepoError::new(
                RepoErrorCode::InitError,
                "repository owner and name must be configured",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` under a timeout, retrying transient failures with
    /// exponential backoff.
    pub async fn run<T, F, Fut>(&self, name: &str, operation: F) -> Result<T, RepoError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RepoError>>,
    {
        let mut delay = self.initial_backoff;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match tokio::time::timeout(self.timeout, operation()).await {
                Ok(result) => result,
                Err(_) => Err(RepoError::timeout(name)),
            };

            match result {
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    warn!(
                        "{name} failed (attempt {attempt}/{}): {e}. Retrying in {delay:?}",
                        self.max_retries + 1
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                result => return result,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created { path: String },
    Updated { path: String },
}

impl SaveOutcome {
    pub fn path(&self) -> &str {
        match self {
            SaveOutcome::Created { path } | SaveOutcome::Updated { path } => path,
        }
    }
}

pub struct RepositoryClient {
    target: RepositoryTarget,
    api: Arc<dyn RepositoryApi>,
    retry: RetryPolicy,
}

impl fmt::Debug for RepositoryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryClient")
            .field("target", &self.target)
            .finish()
    }
}

pub fn encode_content(content: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(content)
}

impl RepositoryClient {
    pub fn new(
        target: RepositoryTarget,
        api: Arc<dyn RepositoryApi>,
        retry: RetryPolicy,
    ) -> Result<Self, RepoError> {
        if target.token.trim().is_empty() {
            return Err(RepoError::new(
                RepoErrorCode::AuthRequired,
                "a GitHub token is required",
            ));
        }

        Ok(Self { target, api, retry })
    }

    pub fn github(
        target: RepositoryTarget,
        prometheus: Arc<prometheus::PrometheusClient>,
        retry: RetryPolicy,
    ) -> Result<Self, RepoError> {
        if target.token.trim().is_empty() {
            return Err(RepoError::new(
                RepoErrorCode::AuthRequired,
                "a GitHub token is required",
            ));
        }
        let api = GithubClient::new(target.token.clone(), prometheus)?;
        Self::new(target, Arc::new(api), retry)
    }

    pub fn target(&self) -> &RepositoryTarget {
        &self.target
    }

    /// Same credentials, different repository.
    pub fn retarget(&self, owner: &str, repo: &str) -> Self {
        Self {
            target: RepositoryTarget::new(self.target.token.clone(), owner, repo),
            api: self.api.clone(),
            retry: self.retry,
        }
    }

    /// Makes sure `name` exists and is writable, then creates the per-platform
    /// folders that are missing. Safe to run repeatedly.
    #[instrument(skip(self), fields(target = %self.target.full_name()))]
    pub async fn ensure_structure(
        &self,
        name: &str,
        mode: SetupMode,
    ) -> Result<RemoteRepository, RepoError> {
        if name.trim().is_empty() {
            return Err(RepoError::new(
                RepoErrorCode::ValidationFailed,
                "repository name must not be empty",
            ));
        }

        let repository = match mode {
            SetupMode::New => self.create_or_adopt(name).await?,
            SetupMode::Existing => self.adopt_existing(name).await?,
        };

        for platform in Platform::TRACKED {
            self.ensure_folder(&repository, platform).await?;
        }

        info!("Repository {} is ready", repository.full_name);
        Ok(repository)
    }

    async fn create_or_adopt(&self, name: &str) -> Result<RemoteRepository, RepoError> {
        let request = CreateRepositoryRequest {
            name,
            description: REPOSITORY_DESCRIPTION,
            private: false,
            auto_init: true,
        };

        let created = self
            .retry
            .run("create repository", || self.api.create_repository(&request))
            .await;

        match created {
            Ok(repository) => {
                info!("Created repository {}", repository.full_name);
                Ok(repository)
            }
            Err(e) if e.is_already_exists() => {
                debug!("Repository {name} already exists, adopting it");
                let owner = self
                    .retry
                    .run("get user", || self.api.current_user())
                    .await?;
                let repository = self
                    .retry
                    .run("get repository", || self.api.get_repository(&owner, name))
                    .await
                    .map_err(|e| e.with_code(RepoErrorCode::RepoExists))?;
                Self::require_push(repository)
            }
            Err(e) if e.code == RepoErrorCode::Unauthorized => Err(e),
            Err(e) => Err(e.with_code(RepoErrorCode::RepoCreateError)),
        }
    }

    async fn adopt_existing(&self, name: &str) -> Result<RemoteRepository, RepoError> {
        let owner = if self.target.owner.trim().is_empty() {
            self.retry
                .run("get user", || self.api.current_user())
                .await?
        } else {
            self.target.owner.clone()
        };

        let repository = self
            .retry
            .run("get repository", || self.api.get_repository(&owner, name))
            .await
            .map_err(|e| match e.code {
                RepoErrorCode::Unauthorized => e,
                _ => e.with_code(RepoErrorCode::RepoAccessError),
            })?;
        Self::require_push(repository)
    }

    fn require_push(repository: RemoteRepository) -> Result<RemoteRepository, RepoError> {
        if repository.can_push() {
            Ok(repository)
        } else {
            Err(RepoError::new(
                RepoErrorCode::PermissionError,
                format!("no write access to {}", repository.full_name),
            ))
        }
    }

    async fn ensure_folder(
        &self,
        repository: &RemoteRepository,
        platform: Platform,
    ) -> Result<(), RepoError> {
        let owner = &repository.owner.login;
        let repo = &repository.name;
        let path = &format!("{platform}/README.md");

        let created = self
            .retry
            .run("create placeholder", || async move {
                if self.api.get_file(owner, repo, path).await?.is_some() {
                    return Ok::<_, RepoError>(false);
                }
                let request = PutFileRequest {
                    message: format!("Add {} folder", platform.display_name()),
                    content: encode_content(&format!(
                        "# {} solutions\n\nAccepted submissions land here automatically.\n",
                        platform.display_name()
                    )),
                    sha: None,
                };
                self.api.put_file(owner, repo, path, &request).await?;
                Ok(true)
            })
            .await?;
        if created {
            debug!("Created {path}");
        }
        Ok(())
    }

    /// Writes the solution to `{platform}/{problem}.{ext}`, updating the file in
    /// place when it already exists.
    #[instrument(skip(self, code), fields(target = %self.target.full_name()))]
    pub async fn save_solution(
        &self,
        platform: Platform,
        problem_id: &str,
        code: &str,
        language: &str,
    ) -> Result<SaveOutcome, RepoError> {
        self.target.require_repository()?;
        if problem_id.trim().is_empty() || code.trim().is_empty() {
            return Err(RepoError::new(
                RepoErrorCode::ValidationFailed,
                "problem id and code must not be empty",
            ));
        }

        let owner = &self.target.owner;
        let repo = &self.target.repo;
        let path = &solution_path(platform, problem_id, language);

        // The sha is read again on every attempt: a timed out write may still
        // have landed, and the retry then has to update it.
        self.retry
            .run("save solution", || async move {
                let existing = self.api.get_file(owner, repo, path).await?;
                let verb = if existing.is_some() { "Update" } else { "Add" };
                let request = PutFileRequest {
                    message: format!("{verb} {} solution: {problem_id}", platform.display_name()),
                    content: encode_content(code),
                    sha: existing.as_ref().map(|file| file.sha.clone()),
                };
                self.api.put_file(owner, repo, path, &request).await?;

                Ok::<_, RepoError>(match existing {
                    Some(_) => SaveOutcome::Updated { path: path.clone() },
                    None => SaveOutcome::Created { path: path.clone() },
                })
            })
            .await
    }

    /// Checks that the configured repository is reachable and writable.
    #[instrument(skip(self), fields(target = %self.target.full_name()))]
    pub async fn verify_access(&self) -> Result<(), RepoError> {
        self.target.require_repository()?;
        let repository = self
            .retry
            .run("get repository", || {
                self.api
                    .get_repository(&self.target.owner, &self.target.repo)
            })
            .await?;
        Self::require_push(repository).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryRepository;
    use super::*;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(5),
            max_retries: 2,
            initial_backoff: Duration::from_millis(1),
        }
    }

    fn client(api: Arc<MemoryRepository>) -> RepositoryClient {
        RepositoryClient::new(
            RepositoryTarget::new("token", "octocat", "solutions"),
            api,
            fast_retry(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_twice_updates_in_place() {
        let api = Arc::new(MemoryRepository::with_repository("octocat", "solutions"));
        let client = client(api.clone());

        let first = client
            .save_solution(Platform::Leetcode, "two-sum", "print(1)", "python3")
            .await
            .unwrap();
        let second = client
            .save_solution(Platform::Leetcode, "two-sum", "print(2)", "python3")
            .await
            .unwrap();

        assert_eq!(
            first,
            SaveOutcome::Created {
                path: "leetcode/two-sum.py".into()
            }
        );
        assert_eq!(
            second,
            SaveOutcome::Updated {
                path: "leetcode/two-sum.py".into()
            }
        );
        assert_eq!(
            api.paths("octocat", "solutions"),
            vec!["leetcode/two-sum.py".to_string()]
        );
        assert_eq!(
            api.content("octocat", "solutions", "leetcode/two-sum.py"),
            Some("print(2)".to_string())
        );
    }

    #[tokio::test]
    async fn save_sanitizes_problem_id() {
        let api = Arc::new(MemoryRepository::with_repository("octocat", "solutions"));
        let outcome = client(api)
            .save_solution(Platform::Codeforces, "Two Sum! (Easy)", "x", "GNU C++17")
            .await
            .unwrap();
        assert_eq!(outcome.path(), "codeforces/two-sum-easy.cpp");
    }

    #[tokio::test]
    async fn missing_token_is_auth_required() {
        let api = Arc::new(MemoryRepository::default());
        let err = RepositoryClient::new(
            RepositoryTarget::new("", "octocat", "solutions"),
            api,
            fast_retry(),
        )
        .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::AuthRequired);
    }

    #[tokio::test]
    async fn missing_target_fails_before_network() {
        let api = Arc::new(MemoryRepository::default());
        let client = RepositoryClient::new(
            RepositoryTarget::new("token", "", ""),
            api.clone(),
            fast_retry(),
        )
        .unwrap();
        let err = client
            .save_solution(Platform::Leetcode, "two-sum", "x", "rust")
            .await
            .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::InitError);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let api = Arc::new(MemoryRepository::with_repository("octocat", "solutions"));
        api.fail_next(RepoError::from_status(502, "bad gateway"));
        api.fail_next(RepoError::from_status(503, "unavailable"));

        let outcome = client(api.clone())
            .save_solution(Platform::Leetcode, "two-sum", "x", "rust")
            .await
            .unwrap();
        assert_eq!(outcome.path(), "leetcode/two-sum.rs");
    }

    /// Stores the first write, then hangs past the client's timeout.
    struct SlowFirstWrite {
        inner: Arc<MemoryRepository>,
        stalled: std::sync::atomic::AtomicBool,
    }

    #[async_trait::async_trait]
    impl RepositoryApi for SlowFirstWrite {
        async fn current_user(&self) -> Result<String, RepoError> {
            self.inner.current_user().await
        }

        async fn create_repository(
            &self,
            request: &CreateRepositoryRequest<'_>,
        ) -> Result<RemoteRepository, RepoError> {
            self.inner.create_repository(request).await
        }

        async fn get_repository(
            &self,
            owner: &str,
            repo: &str,
        ) -> Result<RemoteRepository, RepoError> {
            self.inner.get_repository(owner, repo).await
        }

        async fn get_file(
            &self,
            owner: &str,
            repo: &str,
            path: &str,
        ) -> Result<Option<RemoteFile>, RepoError> {
            self.inner.get_file(owner, repo, path).await
        }

        async fn put_file(
            &self,
            owner: &str,
            repo: &str,
            path: &str,
            request: &PutFileRequest,
        ) -> Result<RemoteFile, RepoError> {
            let file = self.inner.put_file(owner, repo, path, request).await?;
            if !self.stalled.swap(true, std::sync::atomic::Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
            Ok(file)
        }
    }

    #[tokio::test]
    async fn write_that_lands_after_timeout_is_not_an_error() {
        let memory = Arc::new(MemoryRepository::with_repository("octocat", "solutions"));
        let api = Arc::new(SlowFirstWrite {
            inner: memory.clone(),
            stalled: Default::default(),
        });
        let client = RepositoryClient::new(
            RepositoryTarget::new("token", "octocat", "solutions"),
            api,
            RetryPolicy {
                timeout: Duration::from_millis(50),
                max_retries: 2,
                initial_backoff: Duration::from_millis(1),
            },
        )
        .unwrap();

        let outcome = client
            .save_solution(Platform::Leetcode, "two-sum", "pass", "python3")
            .await
            .unwrap();
        assert_eq!(
            outcome,
            SaveOutcome::Updated {
                path: "leetcode/two-sum.py".into()
            }
        );
        assert_eq!(
            memory.paths("octocat", "solutions"),
            vec!["leetcode/two-sum.py".to_string()]
        );
        assert_eq!(
            memory.content("octocat", "solutions", "leetcode/two-sum.py"),
            Some("pass".to_string())
        );
        assert_eq!(memory.puts(), 2);
    }

    #[tokio::test]
    async fn auth_failures_are_not_retried() {
        let api = Arc::new(MemoryRepository::with_repository("octocat", "solutions"));
        api.fail_next(RepoError::from_status(401, "Bad credentials"));

        let err = client(api.clone())
            .save_solution(Platform::Leetcode, "two-sum", "x", "rust")
            .await
            .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::Unauthorized);
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn ensure_structure_creates_folders_once() {
        let api = Arc::new(MemoryRepository::default());
        let client = client(api.clone());

        let repository = client
            .ensure_structure("solutions", SetupMode::New)
            .await
            .unwrap();
        assert_eq!(repository.full_name, "octocat/solutions");

        // Second run adopts the existing repository and adds nothing.
        client
            .ensure_structure("solutions", SetupMode::New)
            .await
            .unwrap();

        assert_eq!(
            api.paths("octocat", "solutions"),
            vec![
                "codechef/README.md".to_string(),
                "codeforces/README.md".to_string(),
                "leetcode/README.md".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn adopting_read_only_repository_is_permission_error() {
        let api = Arc::new(MemoryRepository::default());
        api.add_repository("octocat", "solutions", false);

        let err = client(api.clone())
            .ensure_structure("solutions", SetupMode::New)
            .await
            .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::PermissionError);

        let err = client(api)
            .ensure_structure("solutions", SetupMode::Existing)
            .await
            .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::PermissionError);
    }

    #[tokio::test]
    async fn existing_mode_requires_the_repository() {
        let api = Arc::new(MemoryRepository::default());
        let err = client(api)
            .ensure_structure("missing", SetupMode::Existing)
            .await
            .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::RepoAccessError);
    }

    #[tokio::test]
    async fn create_failure_is_repo_create_error() {
        let api = Arc::new(MemoryRepository::default());
        api.fail_next(RepoError::from_status(403, "Resource not accessible"));
        let err = client(api)
            .ensure_structure("solutions", SetupMode::New)
            .await
            .unwrap_err();
        assert_eq!(err.code, RepoErrorCode::RepoCreateError);
    }

    #[tokio::test]
    async fn verify_access_does_not_write() {
        let api = Arc::new(MemoryRepository::default());
        api.add_repository("octocat", "solutions", true);
        client(api.clone()).verify_access().await.unwrap();
        assert!(api.paths("octocat", "solutions").is_empty());

        let api = Arc::new(MemoryRepository::default());
        api.add_repository("octocat", "solutions", false);
        let err = client(api).verify_access().await.unwrap_err();
        assert_eq!(err.code, RepoErrorCode::PermissionError);
    }

    #[test]
    fn debug_redacts_token() {
        let target = RepositoryTarget::new("ghp_secret", "octocat", "solutions");
        let debug = format!("{target:?}");
        assert!(!debug.contains("ghp_secret"));
        assert!(debug.contains("octocat"));
    }
}
