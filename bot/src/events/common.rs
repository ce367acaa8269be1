use tracing::{error, info, warn};

use crate::{messages::Notification, store::keys};

use super::*;

impl Context {
    pub async fn notifications_enabled(&self) -> bool {
        self.setting(keys::NOTIFICATIONS).await
    }

    pub async fn repo_check_enabled(&self) -> bool {
        self.setting(keys::REPO_CHECK).await
    }

    /// Boolean toggles default to on, also when the stored value is unreadable.
    async fn setting(&self, key: &str) -> bool {
        self.store.get_or(key, true).await.unwrap_or_else(|e| {
            error!("Failed to read setting {key}: {e}");
            true
        })
    }

    pub async fn notify(&self, notification: Notification) {
        if self.notifications_enabled().await {
            self.notifier.send(notification);
        }
    }

    /// The configured target: stored values first, then `defaults`.
    pub async fn stored_target(
        &self,
        defaults: &RepositoryTarget,
    ) -> anyhow::Result<RepositoryTarget> {
        let token: Option<String> = self.store.get(keys::GITHUB_TOKEN).await?;
        let owner: Option<String> = self.store.get(keys::GITHUB_OWNER).await?;
        let repo: Option<String> = self.store.get(keys::GITHUB_REPO).await?;

        Ok(RepositoryTarget::new(
            token.unwrap_or_else(|| defaults.token.clone()),
            owner.unwrap_or_else(|| defaults.owner.clone()),
            repo.unwrap_or_else(|| defaults.repo.clone()),
        ))
    }

    /// Fills the service slot from persisted configuration at startup.
    pub async fn restore(&self, defaults: &RepositoryTarget) -> anyhow::Result<()> {
        let target = self.stored_target(defaults).await?;
        self.install(target).await;
        Ok(())
    }

    /// Replaces the live client. Leaves the slot empty when the target is
    /// unusable, so later operations fail with "service not initialized".
    pub(crate) async fn install(&self, target: RepositoryTarget) -> bool {
        if target.token.trim().is_empty() {
            info!("No GitHub token configured, repository sync is disabled");
            self.slot.clear().await;
            return false;
        }

        match (self.factory)(target) {
            Ok(client) => {
                self.slot.replace(client).await;
                true
            }
            Err(e) => {
                warn!("Failed to initialize repository client: {e}");
                self.slot.clear().await;
                false
            }
        }
    }
}
