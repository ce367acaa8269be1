use serde_json::json;
use shared::SetupMode;
use tracing::{error, info, instrument};

use crate::store::keys;

use super::*;

impl Context {
    /// Stores the new credentials and rebuilds the repository client. Always
    /// acknowledged; an unusable configuration leaves the service uninitialized.
    #[instrument(skip(self, target), fields(target = %target.full_name()))]
    pub async fn github_config_updated(&self, target: RepositoryTarget) -> Response {
        let persisted = self
            .store
            .set_many(vec![
                (keys::GITHUB_TOKEN, json!(target.token)),
                (keys::GITHUB_OWNER, json!(target.owner)),
                (keys::GITHUB_REPO, json!(target.repo)),
            ])
            .await;
        if let Err(e) = persisted {
            error!("Failed to persist GitHub configuration: {e}");
        }

        self.install(target).await;
        Response::ok()
    }

    #[instrument(skip(self))]
    pub async fn setup_repository(&self, name: &str, mode: SetupMode) -> Response {
        let client = match self.slot.current().await {
            Ok(client) => client,
            Err(e) => return Response::failure(e.to_string()),
        };

        let repository = match client.ensure_structure(name, mode).await {
            Ok(repository) => repository,
            Err(e) => {
                error!("Failed to set up repository {name}: {e}");
                return Response::failure(e.to_string());
            }
        };

        let owner = repository.owner.login.clone();
        let persisted = self
            .store
            .set_many(vec![
                (keys::GITHUB_OWNER, json!(owner)),
                (keys::GITHUB_REPO, json!(repository.name)),
            ])
            .await;
        if let Err(e) = persisted {
            error!("Failed to persist repository target: {e}");
            return Response::failure(e.to_string());
        }

        self.slot
            .replace(client.retarget(&owner, &repository.name))
            .await;
        self.notify(
            self.notifier
                .messages
                .repository_ready(&repository.full_name),
        )
        .await;
        Response::ok()
    }

    #[instrument(skip(self))]
    pub async fn update_settings(
        &self,
        notifications: Option<bool>,
        repo_check: Option<bool>,
    ) -> Response {
        let entries: Vec<_> = [
            (keys::NOTIFICATIONS, notifications),
            (keys::REPO_CHECK, repo_check),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, json!(value))))
        .collect();

        if entries.is_empty() {
            return Response::ok();
        }

        match self.store.set_many(entries).await {
            Ok(()) => {
                info!("Settings updated");
                Response::ok()
            }
            Err(e) => {
                error!("Failed to update settings: {e}");
                Response::failure(e.to_string())
            }
        }
    }
}
