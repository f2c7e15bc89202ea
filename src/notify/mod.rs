use async_trait::async_trait;

pub mod email;
pub mod whatsapp;

pub use email::MailApiClient;
pub use whatsapp::TwilioWhatsApp;

/// Delivers one rendered message to one recipient. External-service backed;
/// failures surface as errors for the caller to log or propagate.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

#[async_trait]
pub trait ChatSender: Send + Sync {
    async fn send(&self, to_phone: &str, text: &str) -> anyhow::Result<()>;
}
