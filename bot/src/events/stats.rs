use tracing::error;

use super::*;

impl Context {
    pub async fn submission_stats(&self) -> Response {
        match self.aggregator.report().await {
            Ok(report) => Response::with_stats(report),
            Err(e) => {
                error!("Failed to read statistics: {e}");
                Response::failure(e.to_string())
            }
        }
    }
}
