use anyhow::Context;
use shared::{Message, Response, SubmissionRecord};
use tracing::instrument;

use crate::observer::Forwarder;

/// Hands detected submissions to the background service over HTTP.
pub struct RouterClient {
    client: reqwest::Client,
    url: String,
}

impl RouterClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn send(&self, message: &Message) -> anyhow::Result<Response> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.url))?
            .error_for_status()?
            .json::<Response>()
            .await
            .context("Malformed router response")?;
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Forwarder for RouterClient {
    #[instrument(skip(self, record), fields(problem = %record.problem_id))]
    async fn forward(&self, record: SubmissionRecord) -> anyhow::Result<()> {
        let response = self.send(&Message::NewSubmission { data: record }).await?;
        if !response.success {
            anyhow::bail!(
                "Router rejected submission: {}",
                response.error.unwrap_or_default()
            );
        }
        Ok(())
    }
}
