use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::config::TwilioConfig;
use crate::notify::ChatSender;

/// WhatsApp delivery through the Twilio Messages API.
pub struct TwilioWhatsApp {
    account_sid: String,
    auth_token: String,
    from: String,
    client: reqwest::Client,
}

impl TwilioWhatsApp {
    pub fn new(config: &TwilioConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self {
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.whatsapp_from.clone(),
            client,
        })
    }
}

#[async_trait]
impl ChatSender for TwilioWhatsApp {
    async fn send(&self, to_phone: &str, text: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.account_sid
        );

        let form = [
            ("To", format!("whatsapp:{to_phone}")),
            ("From", format!("whatsapp:{}", self.from)),
            ("Body", text.to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .context("Twilio request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("Twilio returned {}: {}", status, error_body);
        }

        debug!(to = %to_phone, "whatsapp message dispatched");
        Ok(())
    }
}
