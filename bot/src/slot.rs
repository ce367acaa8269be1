use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::api::{RepoError, RepositoryClient};

/// Holds the one live repository client. Reconfiguration swaps in a new
/// instance; operations already running keep the `Arc` they started with.
#[derive(Default)]
pub struct ServiceSlot {
    client: RwLock<Option<Arc<RepositoryClient>>>,
}

impl ServiceSlot {
    pub async fn current(&self) -> Result<Arc<RepositoryClient>, RepoError> {
        self.client
            .read()
            .await
            .clone()
            .ok_or_else(RepoError::not_initialized)
    }

    pub async fn replace(&self, client: RepositoryClient) -> Arc<RepositoryClient> {
        let client = Arc::new(client);
        info!("Repository client now targets {}", client.target().full_name());
        *self.client.write().await = Some(client.clone());
        client
    }

    pub async fn clear(&self) {
        *self.client.write().await = None;
    }

    pub async fn is_initialized(&self) -> bool {
        self.client.read().await.is_some()
    }
}
