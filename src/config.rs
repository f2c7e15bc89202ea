use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    pub api_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub whatsapp_from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub news: NewsConfig,
    pub mail: MailConfig,
    pub twilio: TwilioConfig,
    pub otp_ttl_minutes: i64,
    pub digest_cron: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "merapaper".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "merapaper-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 7),
        };
        let news = NewsConfig {
            api_key: std::env::var("NEWS_API_KEY")?,
            base_url: std::env::var("NEWS_API_BASE")
                .unwrap_or_else(|_| "https://newsdata.io/api/1".into()),
        };
        let mail = MailConfig {
            api_url: std::env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.sendgrid.com/v3/mail/send".into()),
            api_key: std::env::var("MAIL_API_KEY")?,
            from: std::env::var("MAIL_FROM")?,
        };
        let twilio = TwilioConfig {
            account_sid: std::env::var("TWILIO_ACCOUNT_SID").unwrap_or_default(),
            auth_token: std::env::var("TWILIO_AUTH_TOKEN").unwrap_or_default(),
            whatsapp_from: std::env::var("TWILIO_WHATSAPP_FROM").unwrap_or_default(),
        };
        let otp_ttl_minutes = std::env::var("OTP_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(5);
        // tokio-cron-scheduler syntax: six fields, seconds first. Default 09:00 daily.
        let digest_cron = std::env::var("DIGEST_CRON").unwrap_or_else(|_| "0 0 9 * * *".into());
        Ok(Self {
            database_url,
            jwt,
            news,
            mail,
            twilio,
            otp_ttl_minutes,
            digest_cron,
        })
    }
}
