use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::MailConfig;
use crate::notify::EmailSender;

/// HTTP mail API client (SendGrid v3 payload shape).
pub struct MailApiClient {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl MailApiClient {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            client,
        })
    }
}

#[async_trait]
impl EmailSender for MailApiClient {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.from },
            "subject": subject,
            "content": [{ "type": "text/html", "value": body }],
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("mail API request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("mail API returned {}: {}", status, error_body);
        }

        debug!(to = %to, subject = %subject, "email dispatched");
        Ok(())
    }
}
