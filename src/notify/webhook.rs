// ABOUTME: Notifier that POSTs {"text": message} to a webhook URL.
// ABOUTME: Works with Slack-compatible incoming webhooks.

use super::{Notifier, NotifyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

pub struct WebhookNotifier {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct Payload<'a> {
    text: &'a str,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Payload { text: message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected(status));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, message: &str) {
        match self.send(message).await {
            Ok(()) => tracing::debug!("failure notification delivered"),
            Err(e) => tracing::warn!(error = %e, "failed to deliver failure notification"),
        }
    }
}
