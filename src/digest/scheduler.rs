use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

use crate::auth::dto::DeliveryMethod;
use crate::auth::repo::User;
use crate::digest::render::{render_html, render_text};
use crate::news::provider::fetch_for_user;
use crate::state::AppState;

const DIGEST_LIMIT: usize = 10;
const DIGEST_SUBJECT: &str = "Your Daily News Summary";

/// Start the daily digest job on the configured cron expression. The
/// returned scheduler must be kept alive for the jobs to keep firing.
pub async fn start_scheduler(state: AppState) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let cron = state.config.digest_cron.clone();
    let job_state = state.clone();
    let digest_job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let state = job_state.clone();
        Box::pin(async move {
            if let Err(e) = run_daily_digest(&state).await {
                tracing::error!(error = %e, "daily digest run failed");
            }
        })
    })?;

    scheduler.add(digest_job).await?;
    scheduler.start().await?;

    info!(cron = %cron, "digest scheduler started");
    Ok(scheduler)
}

/// One digest run: every opted-in user, sequentially. Only the subscriber
/// query can fail the run; everything per-user is logged and skipped.
pub async fn run_daily_digest(state: &AppState) -> anyhow::Result<()> {
    let users = User::list_daily_subscribers(&state.db).await?;
    if users.is_empty() {
        info!("no daily subscribers");
        return Ok(());
    }

    info!(subscribers = users.len(), "sending daily digests");
    let outcome = run_for_users(state, &users).await;
    info!(
        sent = outcome.sent,
        failed = outcome.failed,
        skipped = outcome.skipped,
        "daily digest run complete"
    );
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunOutcome {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub async fn run_for_users(state: &AppState, users: &[User]) -> RunOutcome {
    let mut outcome = RunOutcome::default();
    for user in users {
        match deliver_to_user(state, user).await {
            Ok(Delivery::Sent) => outcome.sent += 1,
            Ok(Delivery::Skipped) => outcome.skipped += 1,
            Err(e) => {
                outcome.failed += 1;
                warn!(email = %user.email, error = %e, "digest delivery failed");
            }
        }
    }
    outcome
}

enum Delivery {
    Sent,
    Skipped,
}

async fn deliver_to_user(state: &AppState, user: &User) -> anyhow::Result<Delivery> {
    let articles = fetch_for_user(state.news.as_ref(), user, DIGEST_LIMIT).await?;
    if articles.is_empty() {
        debug!(email = %user.email, "no articles, skipping digest");
        return Ok(Delivery::Skipped);
    }

    match DeliveryMethod::parse(&user.delivery_method) {
        Some(DeliveryMethod::Email) => {
            let html = render_html(&user.name, &articles);
            state.email.send(&user.email, DIGEST_SUBJECT, &html).await?;
            info!(email = %user.email, "digest sent via email");
            Ok(Delivery::Sent)
        }
        Some(DeliveryMethod::Whatsapp) => match user.phone_number.as_deref() {
            Some(phone) => {
                let text = render_text(&user.name, &articles);
                state.chat.send(phone, &text).await?;
                info!(email = %user.email, "digest sent via whatsapp");
                Ok(Delivery::Sent)
            }
            None => {
                warn!(email = %user.email, "whatsapp delivery without phone number, skipping");
                Ok(Delivery::Skipped)
            }
        },
        None => {
            warn!(
                email = %user.email,
                delivery_method = %user.delivery_method,
                "unknown delivery method, skipping"
            );
            Ok(Delivery::Skipped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use uuid::Uuid;

    use crate::news::dto::{Article, Category, Country};
    use crate::news::provider::{NewsError, NewsProvider};
    use crate::notify::{ChatSender, EmailSender};

    fn subscriber(name: &str, country: &str, delivery: &str, phone: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "hash".into(),
            country: country.into(),
            category: "top".into(),
            notify_daily: true,
            delivery_method: delivery.into(),
            phone_number: phone.map(|p| p.to_string()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn article() -> Article {
        Article {
            title: "Headline".into(),
            summary: "Summary.".into(),
            url: "https://example.com/headline".into(),
            image_url: None,
            published_at: None,
            source: None,
            category: Category::Top,
            country: Country::In,
        }
    }

    /// Fails for one country so a single user's provider call can be broken.
    struct FlakyProvider {
        fail_for: Country,
    }

    #[async_trait]
    impl NewsProvider for FlakyProvider {
        async fn fetch(
            &self,
            _category: Category,
            country: Country,
            _limit: usize,
        ) -> Result<Vec<Article>, NewsError> {
            if country == self.fail_for {
                return Err(NewsError::Upstream(anyhow::anyhow!("provider down")));
            }
            Ok(vec![article()])
        }
    }

    #[derive(Clone, Default)]
    struct RecordingEmail {
        sent_to: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EmailSender for RecordingEmail {
        async fn send(&self, to: &str, _subject: &str, _body: &str) -> anyhow::Result<()> {
            self.sent_to.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingChat {
        sent_to: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl ChatSender for RecordingChat {
        async fn send(&self, to_phone: &str, _text: &str) -> anyhow::Result<()> {
            self.sent_to.lock().unwrap().push(to_phone.to_string());
            Ok(())
        }
    }

    fn test_state(
        news: Arc<dyn NewsProvider>,
        email: RecordingEmail,
        chat: RecordingChat,
    ) -> AppState {
        let base = AppState::fake();
        AppState::from_parts(
            base.db.clone(),
            base.config.clone(),
            news,
            Arc::new(email),
            Arc::new(chat),
        )
    }

    #[tokio::test]
    async fn one_failing_user_does_not_abort_the_run() {
        let email = RecordingEmail::default();
        let chat = RecordingChat::default();
        let state = test_state(
            Arc::new(FlakyProvider {
                fail_for: Country::Us,
            }),
            email.clone(),
            chat.clone(),
        );

        let users = vec![
            subscriber("Asha", "in", "email", None),
            subscriber("Ben", "us", "email", None),
            subscriber("Carla", "gb", "email", None),
        ];

        let outcome = run_for_users(&state, &users).await;
        assert_eq!(outcome.sent, 2);
        assert_eq!(outcome.failed, 1);

        let recorded = email.sent_to.lock().unwrap();
        assert_eq!(
            *recorded,
            vec!["asha@example.com".to_string(), "carla@example.com".to_string()]
        );
    }

    #[tokio::test]
    async fn delivery_method_routes_to_matching_sender() {
        let email = RecordingEmail::default();
        let chat = RecordingChat::default();
        let state = test_state(
            Arc::new(FlakyProvider {
                fail_for: Country::Us,
            }),
            email.clone(),
            chat.clone(),
        );

        let users = vec![
            subscriber("Asha", "in", "email", None),
            subscriber("Dev", "in", "whatsapp", Some("+911234567890")),
        ];

        let outcome = run_for_users(&state, &users).await;
        assert_eq!(outcome.sent, 2);
        assert_eq!(email.sent_to.lock().unwrap().len(), 1);
        assert_eq!(
            *chat.sent_to.lock().unwrap(),
            vec!["+911234567890".to_string()]
        );
    }

    #[tokio::test]
    async fn whatsapp_without_phone_is_skipped_not_failed() {
        let email = RecordingEmail::default();
        let chat = RecordingChat::default();
        let state = test_state(
            Arc::new(FlakyProvider {
                fail_for: Country::Us,
            }),
            email.clone(),
            chat.clone(),
        );

        let users = vec![subscriber("Dev", "in", "whatsapp", None)];

        let outcome = run_for_users(&state, &users).await;
        assert_eq!(
            outcome,
            RunOutcome {
                sent: 0,
                failed: 0,
                skipped: 1
            }
        );
        assert!(chat.sent_to.lock().unwrap().is_empty());
    }
}
