//! In-process stand-in for the hosted repository API, used by the tests.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use base64::Engine;

use super::*;

struct StoredFile {
    sha: String,
    content: String,
}

struct StoredRepository {
    push: bool,
    files: BTreeMap<String, StoredFile>,
}

struct State {
    user: String,
    repositories: BTreeMap<(String, String), StoredRepository>,
    failures: VecDeque<RepoError>,
    calls: usize,
    puts: usize,
    next_sha: u64,
}

pub struct MemoryRepository {
    state: Mutex<State>,
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                user: "octocat".to_string(),
                repositories: BTreeMap::new(),
                failures: VecDeque::new(),
                calls: 0,
                puts: 0,
                next_sha: 0,
            }),
        }
    }
}

fn key(owner: &str, repo: &str) -> (String, String) {
    (owner.to_string(), repo.to_string())
}

fn remote(owner: &str, repo: &str, push: bool) -> RemoteRepository {
    RemoteRepository {
        name: repo.to_string(),
        full_name: format!("{owner}/{repo}"),
        owner: RepositoryOwner {
            login: owner.to_string(),
        },
        permissions: Some(RepositoryPermissions { admin: false, push }),
    }
}

impl MemoryRepository {
    pub fn with_repository(owner: &str, repo: &str) -> Self {
        let api = Self::default();
        api.add_repository(owner, repo, true);
        api
    }

    pub fn add_repository(&self, owner: &str, repo: &str, push: bool) {
        let mut state = self.state.lock().unwrap();
        state.repositories.insert(
            key(owner, repo),
            StoredRepository {
                push,
                files: BTreeMap::new(),
            },
        );
    }

    /// Queues an error returned by the next call, whatever it is.
    pub fn fail_next(&self, error: RepoError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    pub fn paths(&self, owner: &str, repo: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .repositories
            .get(&key(owner, repo))
            .map(|r| r.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn content(&self, owner: &str, repo: &str, path: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .repositories
            .get(&key(owner, repo))?
            .files
            .get(path)
            .map(|file| file.content.clone())
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn puts(&self) -> usize {
        self.state.lock().unwrap().puts
    }

    fn begin(&self) -> Result<std::sync::MutexGuard<'_, State>, RepoError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

#[async_trait]
impl RepositoryApi for MemoryRepository {
    async fn current_user(&self) -> Result<String, RepoError> {
        Ok(self.begin()?.user.clone())
    }

    async fn create_repository(
        &self,
        request: &CreateRepositoryRequest<'_>,
    ) -> Result<RemoteRepository, RepoError> {
        let mut state = self.begin()?;
        let owner = state.user.clone();
        let id = key(&owner, request.name);
        if state.repositories.contains_key(&id) {
            return Err(RepoError::from_status(
                422,
                "Repository creation failed. (name already exists on this account)",
            ));
        }
        state.repositories.insert(
            id,
            StoredRepository {
                push: true,
                files: BTreeMap::new(),
            },
        );
        Ok(remote(&owner, request.name, true))
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<RemoteRepository, RepoError> {
        let state = self.begin()?;
        state
            .repositories
            .get(&key(owner, repo))
            .map(|r| remote(owner, repo, r.push))
            .ok_or_else(|| RepoError::from_status(404, "Not Found"))
    }

    async fn get_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<RemoteFile>, RepoError> {
        let state = self.begin()?;
        let repository = state
            .repositories
            .get(&key(owner, repo))
            .ok_or_else(|| RepoError::from_status(404, "Not Found"))?;
        Ok(repository.files.get(path).map(|file| RemoteFile {
            path: path.to_string(),
            sha: file.sha.clone(),
        }))
    }

    async fn put_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        request: &PutFileRequest,
    ) -> Result<RemoteFile, RepoError> {
        let mut state = self.begin()?;
        state.puts += 1;
        state.next_sha += 1;
        let sha = format!("sha{}", state.next_sha);

        let content = base64::engine::general_purpose::STANDARD
            .decode(&request.content)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| RepoError::from_status(422, "content is not valid Base64"))?;

        let repository = state
            .repositories
            .get_mut(&key(owner, repo))
            .ok_or_else(|| RepoError::from_status(404, "Not Found"))?;
        if !repository.push {
            return Err(RepoError::from_status(403, "Resource not accessible"));
        }

        match (repository.files.get(path), &request.sha) {
            (Some(_), None) => {
                return Err(RepoError::from_status(
                    422,
                    "Invalid request. \"sha\" wasn't supplied.",
                ))
            }
            (Some(file), Some(sha)) if &file.sha != sha => {
                return Err(RepoError::from_status(409, "sha does not match"))
            }
            _ => {}
        }

        repository.files.insert(
            path.to_string(),
            StoredFile {
                sha: sha.clone(),
                content,
            },
        );
        Ok(RemoteFile {
            path: path.to_string(),
            sha,
        })
    }
}
